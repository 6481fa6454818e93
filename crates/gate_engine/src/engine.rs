use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use gate_logging::gate_debug;
use thiserror::Error;

use crate::bridge::Bridge;
use crate::heartbeat::HeartbeatTimer;
use crate::worker::ChannelEventSink;
use crate::{EngineEvent, HeartbeatRequest, ScrapeRequest};

enum EngineCommand {
    Activate { license_key: String },
    Validate,
    StartHeartbeat { period: Duration },
    StopHeartbeat,
    SendHeartbeat(HeartbeatRequest),
    StartScrape(ScrapeRequest),
    StopScrape,
}

/// The engine thread has exited, so the command was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine thread is not running")]
pub struct EngineStopped;

/// Command side of the engine thread. Dropping it shuts the thread down.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Starts the engine thread and its tokio runtime.
    pub fn spawn(bridge: Bridge) -> io::Result<(Self, mpsc::Receiver<EngineEvent>)> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let bridge = Arc::new(bridge);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("gate-engine".to_string())
            .spawn(move || {
                let mut heartbeat: Option<HeartbeatTimer> = None;
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::StartHeartbeat { period } => {
                            let tx = event_tx.clone();
                            heartbeat = Some(HeartbeatTimer::spawn_on(
                                runtime.handle(),
                                period,
                                move || {
                                    let _ = tx.send(EngineEvent::HeartbeatDue);
                                },
                            ));
                        }
                        EngineCommand::StopHeartbeat => {
                            if let Some(timer) = heartbeat.take() {
                                timer.cancel();
                            }
                        }
                        command => {
                            let bridge = Arc::clone(&bridge);
                            let event_tx = event_tx.clone();
                            runtime.spawn(async move {
                                handle_command(bridge.as_ref(), command, event_tx).await;
                            });
                        }
                    }
                }
                gate_debug!("engine: command channel closed, shutting down");
                drop(heartbeat);
                runtime.shutdown_timeout(Duration::from_secs(1));
            })?;

        Ok((Self { cmd_tx }, event_rx))
    }

    pub fn activate(&self, license_key: impl Into<String>) -> Result<(), EngineStopped> {
        self.send(EngineCommand::Activate {
            license_key: license_key.into(),
        })
    }

    pub fn validate(&self) -> Result<(), EngineStopped> {
        self.send(EngineCommand::Validate)
    }

    /// Replaces any running heartbeat timer.
    pub fn start_heartbeat(&self, period: Duration) -> Result<(), EngineStopped> {
        self.send(EngineCommand::StartHeartbeat { period })
    }

    pub fn stop_heartbeat(&self) -> Result<(), EngineStopped> {
        self.send(EngineCommand::StopHeartbeat)
    }

    pub fn send_heartbeat(&self, request: HeartbeatRequest) -> Result<(), EngineStopped> {
        self.send(EngineCommand::SendHeartbeat(request))
    }

    pub fn start_scrape(&self, request: ScrapeRequest) -> Result<(), EngineStopped> {
        self.send(EngineCommand::StartScrape(request))
    }

    pub fn stop_scrape(&self) -> Result<(), EngineStopped> {
        self.send(EngineCommand::StopScrape)
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineStopped> {
        self.cmd_tx.send(command).map_err(|_| EngineStopped)
    }
}

async fn handle_command(bridge: &Bridge, command: EngineCommand, event_tx: mpsc::Sender<EngineEvent>) {
    match command {
        EngineCommand::Activate { license_key } => {
            let result = bridge.activate(&license_key).await;
            let _ = event_tx.send(EngineEvent::Activated(result));
        }
        EngineCommand::Validate => {
            let result = bridge.validate().await;
            let _ = event_tx.send(EngineEvent::Validated(result));
        }
        EngineCommand::SendHeartbeat(request) => {
            let result = bridge.heartbeat(&request).await;
            let _ = event_tx.send(EngineEvent::HeartbeatSent(result));
        }
        EngineCommand::StartScrape(request) => {
            let sink = Arc::new(ChannelEventSink::held(event_tx.clone()));
            let result = bridge.start_scrape(request, sink.clone()).await;
            let _ = event_tx.send(EngineEvent::ScrapeStarted(result));
            sink.release();
        }
        EngineCommand::StopScrape => {
            let response = bridge.stop_scrape().await;
            let _ = event_tx.send(EngineEvent::ScrapeStopped(response));
        }
        EngineCommand::StartHeartbeat { .. } | EngineCommand::StopHeartbeat => {}
    }
}
