use chrono::{DateTime, Utc};
use gate_logging::{gate_debug, gate_info, gate_warn};

use crate::view_model::short_title;
use crate::{
    ActivateReply, ActivationState, AppState, Effect, HeartbeatPayload, JobState, Msg, Notice,
    ProgressSnapshot, ResultItem, ScrapeParameters, StartBlocked, StartReply, StopReply,
    ValidateReply, IDLE_STATUS,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Initialized {
            identity,
            saved_parameters,
        } => {
            gate_info!("Initialized with device identity {}", identity);
            state.set_identity(identity);
            if let Some(parameters) = saved_parameters {
                state.set_parameters(parameters);
            }
            vec![Effect::Validate, Effect::StartHeartbeat]
        }
        Msg::ActivateClicked(raw_key) => {
            let license_key = raw_key.trim().to_string();
            if license_key.is_empty() {
                vec![Effect::Notify(Notice::LicenseKeyRequired)]
            } else {
                vec![
                    Effect::Notify(Notice::Activating),
                    Effect::Activate { license_key },
                ]
            }
        }
        Msg::ActivateResponse {
            result,
            received_at,
        } => on_activate_response(&mut state, result, received_at),
        Msg::ValidateResponse {
            result,
            received_at,
        } => {
            on_validate_response(&mut state, result, received_at);
            Vec::new()
        }
        Msg::HeartbeatTick => heartbeat_effects(&state),
        Msg::HeartbeatSent(result) => {
            match result {
                Ok(()) => gate_debug!("Heartbeat delivered"),
                Err(message) => gate_warn!("Heartbeat failed: {}", message),
            }
            Vec::new()
        }
        Msg::StartClicked(parameters) => on_start_clicked(&mut state, parameters),
        Msg::StartResponse(result) => on_start_response(&mut state, result),
        Msg::StopClicked => vec![Effect::StopScrape],
        Msg::StopResponse(result) => on_stop_response(&mut state, result),
        Msg::WorkerProgress(snapshot) => {
            on_progress(&mut state, snapshot);
            Vec::new()
        }
        Msg::WorkerItem(item) => {
            on_item(&mut state, item);
            Vec::new()
        }
        Msg::WorkerStatus(status) => on_status(&mut state, &status),
        Msg::ClearResultsClicked => {
            state.clear_results();
            Vec::new()
        }
        Msg::ExportLocationRequested => {
            let notice = match state.metrics().output_file.as_deref() {
                Some(path) if !path.is_empty() => Notice::ExportLocation(path.to_string()),
                _ => Notice::NoExportFile,
            };
            vec![Effect::Notify(notice)]
        }
        Msg::Log(line) => {
            state.append_activity(line);
            Vec::new()
        }
    };

    (state, effects)
}

fn on_activate_response(
    state: &mut AppState,
    result: Result<ActivateReply, String>,
    received_at: DateTime<Utc>,
) -> Vec<Effect> {
    let reply = match result {
        Ok(reply) => reply,
        Err(message) => {
            gate_warn!("Activation request failed: {}", message);
            return vec![Effect::Notify(Notice::ActivationFailed(message))];
        }
    };

    match reply {
        ActivateReply::Ok {
            license_id,
            expires_at,
        } => {
            let license = state.license_mut();
            let activation = license.apply_activation(license_id.clone(), expires_at, received_at);
            gate_info!(
                "License {} activated, state {:?}, expires {:?}",
                license_id,
                activation,
                expires_at
            );
            let notice = match activation {
                ActivationState::Activated => Notice::Activated {
                    remaining_days: license.remaining_days(),
                },
                _ => Notice::LicenseExpired,
            };
            // Activation carries no session token; validation fetches the pair.
            vec![Effect::Notify(notice), Effect::Validate]
        }
        ActivateReply::Invalid => vec![Effect::Notify(Notice::InvalidLicenseKey)],
        ActivateReply::BoundToOtherDevice => vec![Effect::Notify(Notice::LicenseBoundElsewhere)],
        ActivateReply::Error(message) => {
            gate_warn!("Activation rejected with error: {}", message);
            vec![Effect::Notify(Notice::ActivationError(message))]
        }
    }
}

fn on_validate_response(
    state: &mut AppState,
    result: Result<ValidateReply, String>,
    received_at: DateTime<Utc>,
) {
    match result {
        Ok(ValidateReply::Ok {
            credentials,
            expires_at,
        }) => {
            let license_id = credentials.license_id.clone();
            let activation =
                state
                    .license_mut()
                    .apply_validation(credentials, expires_at, received_at);
            gate_info!(
                "License {} validated, state {:?}, expires {:?}",
                license_id,
                activation,
                expires_at
            );
        }
        Ok(ValidateReply::Expired) => {
            gate_info!("License reported expired");
            state.license_mut().mark_expired();
        }
        Ok(ValidateReply::Other(status)) => {
            gate_info!("License validation returned status {}; state unchanged", status);
        }
        Err(message) => {
            gate_warn!("License validation failed: {}; state unchanged", message);
        }
    }
}

fn heartbeat_effects(state: &AppState) -> Vec<Effect> {
    match (state.license().credentials(), state.identity()) {
        (Some(credentials), Some(identity)) => vec![Effect::SendHeartbeat(HeartbeatPayload {
            license_id: credentials.license_id.clone(),
            machine_hash: identity.to_string(),
            session_token: credentials.session_token.clone(),
        })],
        _ => {
            gate_debug!("Heartbeat skipped: no session");
            Vec::new()
        }
    }
}

fn on_start_clicked(state: &mut AppState, parameters: ScrapeParameters) -> Vec<Effect> {
    if state.job() == JobState::Running || state.start_pending() {
        gate_debug!("Start ignored: job already running or starting");
        return Vec::new();
    }
    if !state.license().is_activated() {
        return vec![Effect::Notify(Notice::StartBlocked(StartBlocked::NotActivated))];
    }
    if let Some(blocked) = parameters.missing_field() {
        return vec![Effect::Notify(Notice::StartBlocked(blocked))];
    }

    let parameters = parameters.normalized();
    state.set_parameters(parameters.clone());
    state.set_start_pending(true);
    vec![
        Effect::PersistParameters(parameters.clone()),
        Effect::Notify(Notice::Starting),
        Effect::StartScrape(parameters),
    ]
}

fn on_start_response(state: &mut AppState, result: Result<StartReply, String>) -> Vec<Effect> {
    state.set_start_pending(false);
    let notice = match result {
        Ok(StartReply::Ok) => {
            if state.set_job(JobState::Running) {
                gate_info!("Collection job running");
            }
            Notice::Started
        }
        Ok(StartReply::NoKey) => Notice::NoLicenseKey,
        Ok(StartReply::NoExportDirectory) => Notice::NoExportDirectory,
        Ok(StartReply::Error(message)) => {
            gate_warn!("Start rejected with error: {}", message);
            Notice::StartError(message)
        }
        Err(message) => {
            gate_warn!("Start request failed: {}", message);
            Notice::StartFailed(message)
        }
    };
    vec![Effect::Notify(notice)]
}

fn on_stop_response(state: &mut AppState, result: Result<StopReply, String>) -> Vec<Effect> {
    let was_running = state.job() == JobState::Running;
    match result {
        Ok(StopReply::Ok) => {
            if state.set_job(JobState::Idle) {
                gate_info!("Collection job stopped");
                vec![Effect::Notify(Notice::Stopped)]
            } else {
                gate_debug!("Stop acknowledged while already idle");
                Vec::new()
            }
        }
        Ok(StopReply::Other(status)) if was_running => {
            gate_warn!("Stop refused with status {}", status);
            vec![Effect::Notify(Notice::StopFailed)]
        }
        Err(message) if was_running => {
            gate_warn!("Stop request failed: {}", message);
            vec![Effect::Notify(Notice::StopFailed)]
        }
        Ok(StopReply::Other(status)) => {
            gate_debug!("Stop returned {} while idle", status);
            Vec::new()
        }
        Err(message) => {
            gate_debug!("Stop failed while idle: {}", message);
            Vec::new()
        }
    }
}

fn on_progress(state: &mut AppState, snapshot: ProgressSnapshot) {
    let line = format!(
        "visited:{} | collected:{} | filtered:{}",
        snapshot.visited, snapshot.collected, snapshot.filtered
    );
    state.replace_metrics(snapshot);
    state.append_activity(line);
}

fn on_item(state: &mut AppState, item: ResultItem) {
    let line = format!(
        "{} | ¥{} | pinned:{} | reviews:{}",
        short_title(&item.title),
        item.price,
        item.pinned_count,
        item.review_count
    );
    state.push_item(item);
    state.append_activity(line);
}

fn on_status(state: &mut AppState, status: &str) -> Vec<Effect> {
    if status == IDLE_STATUS {
        state.append_activity("Idle…");
        // Only a Running job completes; repeated idle reports are absorbed.
        if state.set_job(JobState::Idle) {
            gate_info!("Collection job finished");
            return vec![Effect::Notify(Notice::Completed)];
        }
        return Vec::new();
    }
    state.append_activity(format!("Status: {status}"));
    Vec::new()
}
