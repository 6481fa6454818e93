use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gate_core::{
    ActivateReply, Effect, Msg, ProgressSnapshot, ResultItem, ScrapeParameters, SessionCredentials,
    StartReply, StopReply, ValidateReply,
};
use gate_engine::{
    ActivateResponse, ApiError, ControlResponse, EngineEvent, EngineHandle, EngineStopped,
    HeartbeatRequest, ScrapeRequest, ValidateResponse, WorkerItem, WorkerProgress,
    STATUS_NO_EXPORT_DIR, STATUS_NO_KEY, STATUS_OK,
};
use gate_logging::{gate_debug, gate_info, gate_warn, mask_secret};

use super::app::AppEvent;
use super::persistence;
use super::ui::render;

/// Executes core effects against the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    app_tx: mpsc::Sender<AppEvent>,
    heartbeat_period: Duration,
    state_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        events: mpsc::Receiver<EngineEvent>,
        app_tx: mpsc::Sender<AppEvent>,
        heartbeat_period: Duration,
        state_dir: PathBuf,
    ) -> Self {
        spawn_event_loop(events, app_tx.clone());
        Self {
            engine,
            app_tx,
            heartbeat_period,
            state_dir,
        }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            let reply_if_undelivered = undelivered_reply(&effect);
            if let Err(err) = self.dispatch(effect) {
                gate_warn!("Effect dropped: {err}");
                if let Some(reply) = reply_if_undelivered {
                    let _ = self.app_tx.send(AppEvent::Msg(reply(err.to_string())));
                }
            }
        }
    }

    pub fn shutdown(&self) {
        if let Err(err) = self.engine.stop_heartbeat() {
            gate_debug!("Heartbeat not stopped: {err}");
        }
    }

    fn dispatch(&self, effect: Effect) -> Result<(), EngineStopped> {
        match effect {
            Effect::Activate { license_key } => {
                gate_info!("Activate key={}", mask_secret(&license_key));
                self.engine.activate(license_key)
            }
            Effect::Validate => self.engine.validate(),
            Effect::StartHeartbeat => self.engine.start_heartbeat(self.heartbeat_period),
            Effect::SendHeartbeat(payload) => {
                gate_debug!(
                    "Heartbeat license_id={} token={}",
                    payload.license_id,
                    mask_secret(&payload.session_token)
                );
                self.engine.send_heartbeat(HeartbeatRequest {
                    license_id: payload.license_id,
                    machine_hash: payload.machine_hash,
                    session_token: payload.session_token,
                })
            }
            Effect::StartScrape(parameters) => {
                gate_info!("StartScrape keyword={}", parameters.keyword);
                self.engine.start_scrape(scrape_request(&parameters))
            }
            Effect::StopScrape => self.engine.stop_scrape(),
            Effect::PersistParameters(parameters) => {
                persistence::save_parameters(&self.state_dir, &parameters);
                Ok(())
            }
            Effect::Notify(notice) => {
                println!("{}", render::format_notice(&notice));
                Ok(())
            }
        }
    }
}

/// Failure reply for user-initiated commands; background commands are only logged.
fn undelivered_reply(effect: &Effect) -> Option<fn(String) -> Msg> {
    match effect {
        Effect::Activate { .. } => Some(|message| Msg::ActivateResponse {
            result: Err(message),
            received_at: Utc::now(),
        }),
        Effect::StartScrape(_) => Some(|message| Msg::StartResponse(Err(message))),
        Effect::StopScrape => Some(|message| Msg::StopResponse(Err(message))),
        _ => None,
    }
}

fn spawn_event_loop(events: mpsc::Receiver<EngineEvent>, app_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        while let Ok(event) = events.recv() {
            if app_tx.send(AppEvent::Msg(map_event(event))).is_err() {
                break;
            }
        }
    });
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Activated(result) => Msg::ActivateResponse {
            result: map_activate(result),
            received_at: Utc::now(),
        },
        EngineEvent::Validated(result) => Msg::ValidateResponse {
            result: map_validate(result),
            received_at: Utc::now(),
        },
        EngineEvent::HeartbeatDue => Msg::HeartbeatTick,
        EngineEvent::HeartbeatSent(result) => Msg::HeartbeatSent(result.map_err(|e| e.to_string())),
        EngineEvent::ScrapeStarted(result) => {
            Msg::StartResponse(result.map(map_start).map_err(|err| err.to_string()))
        }
        EngineEvent::ScrapeStopped(response) => Msg::StopResponse(Ok(map_stop(response))),
        EngineEvent::Progress(progress) => Msg::WorkerProgress(map_progress(progress)),
        EngineEvent::Item(item) => Msg::WorkerItem(map_item(item)),
        EngineEvent::Status(status) => Msg::WorkerStatus(status),
    }
}

fn scrape_request(parameters: &ScrapeParameters) -> ScrapeRequest {
    ScrapeRequest {
        keyword: parameters.keyword.clone(),
        price: parameters.price_floor,
        pinned: parameters.min_pinned,
        reviews: parameters.min_reviews,
        export_dir: parameters.export_dir.clone(),
    }
}

fn message_or_status(message: Option<String>, status: String) -> String {
    message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(status)
}

fn map_activate(result: Result<ActivateResponse, ApiError>) -> Result<ActivateReply, String> {
    let response = result.map_err(|err| err.to_string())?;
    let reply = match response.status.as_str() {
        STATUS_OK => match response.license_id {
            Some(license_id) => ActivateReply::Ok {
                license_id,
                expires_at: response.expires_at.as_deref().and_then(parse_timestamp),
            },
            None => ActivateReply::Error("activation answer has no license id".to_string()),
        },
        "INVALID" => ActivateReply::Invalid,
        "BOUND_OTHER" => ActivateReply::BoundToOtherDevice,
        _ => ActivateReply::Error(message_or_status(response.message, response.status)),
    };
    Ok(reply)
}

fn map_validate(result: Result<ValidateResponse, ApiError>) -> Result<ValidateReply, String> {
    let response = result.map_err(|err| err.to_string())?;
    let reply = match response.status.as_str() {
        STATUS_OK => match (response.license_id, response.session_token) {
            (Some(license_id), Some(session_token)) => ValidateReply::Ok {
                credentials: SessionCredentials {
                    license_id,
                    session_token,
                },
                expires_at: response.expires_at.as_deref().and_then(parse_timestamp),
            },
            _ => ValidateReply::Other("OK without session credentials".to_string()),
        },
        "EXPIRED" => ValidateReply::Expired,
        _ => ValidateReply::Other(response.status),
    };
    Ok(reply)
}

fn map_start(response: ControlResponse) -> StartReply {
    match response.status.as_str() {
        STATUS_OK => StartReply::Ok,
        STATUS_NO_KEY => StartReply::NoKey,
        STATUS_NO_EXPORT_DIR => StartReply::NoExportDirectory,
        _ => StartReply::Error(message_or_status(response.message, response.status)),
    }
}

fn map_stop(response: ControlResponse) -> StopReply {
    match response.status.as_str() {
        STATUS_OK => StopReply::Ok,
        _ => StopReply::Other(message_or_status(response.message, response.status)),
    }
}

fn map_progress(progress: WorkerProgress) -> ProgressSnapshot {
    ProgressSnapshot {
        visited: progress.visited,
        collected: progress.collected,
        filtered: progress.filtered,
        avg_price: progress.avg_price,
        avg_pinned: progress.avg_pinned,
        output_file: progress.output_file.filter(|path| !path.is_empty()),
    }
}

fn map_item(item: WorkerItem) -> ResultItem {
    ResultItem {
        title: item.title,
        price: item.price,
        pinned_count: item.pinned,
        review_count: item.reviews,
        url: item.url,
    }
}

/// Accepts RFC 3339, a naive date-time or a bare date; naive values are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    gate_warn!("Ignoring unparseable expiry timestamp {raw:?}");
    None
}
