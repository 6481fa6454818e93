use std::io;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use gate_core::IDLE_STATUS;
use gate_logging::{gate_debug, gate_info, gate_warn};
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdout, Command};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;

use crate::settings::WorkerCommand;
use crate::types::lenient;
use crate::{EngineEvent, ScrapeRequest, WorkerItem, WorkerProgress};

/// Environment variable carrying the JSON-encoded [`ScrapeRequest`] to the child.
pub const PARAMS_ENV: &str = "HARVEST_SCRAPE_PARAMS";
pub const STOPPED_STATUS: &str = "stopped";
pub const ERROR_STATUS: &str = "error";

const MAX_LINE_BYTES: usize = 256 * 1024;

/// Receives worker events in emission order.
pub trait EventSink: Send + Sync {
    fn on_progress(&self, progress: WorkerProgress);
    fn on_item(&self, item: WorkerItem);
    fn on_status(&self, status: &str);
}

/// Forwards worker events to the engine event channel.
///
/// A sink created with [`ChannelEventSink::held`] buffers events until
/// [`ChannelEventSink::release`], so a start reply can be delivered before
/// anything the job emitted while starting.
pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
    held: Mutex<Option<Vec<EngineEvent>>>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            tx,
            held: Mutex::new(None),
        }
    }

    pub fn held(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            tx,
            held: Mutex::new(Some(Vec::new())),
        }
    }

    /// Flushes buffered events and switches to pass-through.
    pub fn release(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(buffered) = held.take() {
            for event in buffered {
                let _ = self.tx.send(event);
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        match held.as_mut() {
            Some(buffered) => buffered.push(event),
            None => {
                let _ = self.tx.send(event);
            }
        }
    }
}

impl EventSink for ChannelEventSink {
    fn on_progress(&self, progress: WorkerProgress) {
        self.emit(EngineEvent::Progress(progress));
    }

    fn on_item(&self, item: WorkerItem) {
        self.emit(EngineEvent::Item(item));
    }

    fn on_status(&self, status: &str) {
        self.emit(EngineEvent::Status(status.to_string()));
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("a collection job is already running")]
    AlreadyRunning,
    #[error("no worker command configured")]
    NotConfigured,
    #[error("failed to launch worker: {0}")]
    Spawn(#[source] io::Error),
    #[error("worker has no output stream")]
    NoOutput,
    #[error("could not encode job parameters: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The background collection job.
#[async_trait::async_trait]
pub trait ScrapeWorker: Send + Sync {
    /// Launches a job; `sink` receives its events until the job ends.
    async fn start(&self, request: ScrapeRequest, sink: Arc<dyn EventSink>) -> Result<(), WorkerError>;

    /// Best-effort cancellation. Succeeds when nothing is running.
    async fn stop(&self) -> Result<(), WorkerError>;
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WorkerLine {
    Progress(WorkerProgress),
    Item(WorkerItem),
    Status {
        #[serde(default, deserialize_with = "lenient::text")]
        status: String,
    },
}

#[derive(Debug)]
enum JobEnd {
    Finished,
    Cancelled,
    Failed(String),
}

#[derive(Debug)]
struct RunningJob {
    generation: u64,
    cancel_token: CancellationToken,
}

/// Runs the worker as a child process that prints one JSON object per line.
///
/// Every job ends with an `"idle"` status, preceded by `"stopped"` after a
/// cancel or `"error"` after a failure. A job owns the running slot until its
/// `"idle"` has been emitted, so a new job never sees an older job's events.
/// Anything the child writes to stderr is logged.
pub struct ProcessWorker {
    command: Option<WorkerCommand>,
    running: Arc<Mutex<Option<RunningJob>>>,
    generation: AtomicU64,
}

impl ProcessWorker {
    pub fn new(command: Option<WorkerCommand>) -> Self {
        Self {
            command,
            running: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn spawn_child(
        command: &WorkerCommand,
        request: &ScrapeRequest,
    ) -> Result<(Child, ChildStdout), WorkerError> {
        let params = serde_json::to_string(request)?;
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .env(PARAMS_ENV, params)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::Spawn)?;
        let stdout = child.stdout.take().ok_or(WorkerError::NoOutput)?;
        Ok((child, stdout))
    }
}

#[async_trait::async_trait]
impl ScrapeWorker for ProcessWorker {
    async fn start(&self, request: ScrapeRequest, sink: Arc<dyn EventSink>) -> Result<(), WorkerError> {
        let command = self.command.as_ref().ok_or(WorkerError::NotConfigured)?;

        let mut slot = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(WorkerError::AlreadyRunning);
        }

        let (mut child, stdout) = Self::spawn_child(command, &request)?;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(generation, stderr));
        }
        let cancel_token = CancellationToken::new();
        *slot = Some(RunningJob {
            generation,
            cancel_token: cancel_token.clone(),
        });
        drop(slot);

        gate_info!(
            "worker: job {generation} started for keyword '{}'",
            request.keyword
        );
        let running = Arc::clone(&self.running);
        tokio::spawn(async move {
            let end = drive_job(child, stdout, sink.as_ref(), &cancel_token).await;
            match &end {
                JobEnd::Finished => gate_info!("worker: job {generation} finished"),
                JobEnd::Cancelled => {
                    gate_info!("worker: job {generation} cancelled");
                    sink.on_status(STOPPED_STATUS);
                }
                JobEnd::Failed(reason) => {
                    gate_warn!("worker: job {generation} failed: {reason}");
                    sink.on_status(ERROR_STATUS);
                }
            }

            let mut slot = running.lock().unwrap_or_else(PoisonError::into_inner);
            sink.on_status(IDLE_STATUS);
            if slot.as_ref().map(|job| job.generation) == Some(generation) {
                *slot = None;
            }
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), WorkerError> {
        let slot = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(job) => {
                gate_debug!("worker: cancelling job {}", job.generation);
                job.cancel_token.cancel();
            }
            None => gate_debug!("worker: stop requested with no job running"),
        }
        Ok(())
    }
}

async fn drive_job(
    mut child: Child,
    stdout: ChildStdout,
    sink: &dyn EventSink,
    cancel_token: &CancellationToken,
) -> JobEnd {
    let mut lines = FramedRead::new(stdout, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                if let Err(err) = child.kill().await {
                    gate_warn!("worker: kill failed: {err}");
                }
                return JobEnd::Cancelled;
            }
            line = lines.next() => match line {
                Some(Ok(line)) => dispatch_line(&line, sink),
                Some(Err(err)) => {
                    let _ = child.kill().await;
                    return JobEnd::Failed(err.to_string());
                }
                None => {
                    return match child.wait().await {
                        Ok(status) if status.success() => JobEnd::Finished,
                        Ok(status) => JobEnd::Failed(format!("exited with {status}")),
                        Err(err) => JobEnd::Failed(err.to_string()),
                    };
                }
            }
        }
    }
}

fn dispatch_line(line: &str, sink: &dyn EventSink) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return;
    }
    match serde_json::from_str::<WorkerLine>(trimmed) {
        Ok(WorkerLine::Progress(progress)) => sink.on_progress(progress),
        Ok(WorkerLine::Item(item)) => sink.on_item(item),
        Ok(WorkerLine::Status { status }) => sink.on_status(&status),
        Err(err) if err.is_syntax() || err.is_eof() => {
            gate_debug!("worker: plain output: {trimmed}");
        }
        Err(err) => gate_warn!("worker: dropping undecodable record ({err}): {trimmed}"),
    }
}

async fn log_stderr<R: AsyncRead + Unpin>(generation: u64, stderr: R) {
    let mut lines = FramedRead::new(stderr, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    while let Some(line) = lines.next().await {
        match line {
            Ok(line) if line.trim().is_empty() => {}
            Ok(line) => gate_warn!("worker: job {generation} stderr: {}", line.trim_end()),
            Err(err) => {
                gate_warn!("worker: job {generation} stderr unreadable: {err}");
                // Keep draining so the child never blocks on a full pipe.
                let mut rest = lines.into_inner();
                let _ = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await;
                return;
            }
        }
    }
}
