use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};

use anyhow::Context;
use gate_core::{update, AppState, Msg};
use gate_engine::{
    current_signals, ensure_output_dir, Bridge, ClientSettings, EngineHandle, IdentityCache,
    IdentityResolver, LicenseStore, MachineIdSource, ProcessWorker, ReqwestLicenseApi,
    WorkerCommand,
};
use gate_logging::{gate_info, gate_warn};

use super::console::{self, Form};
use super::effects::EffectRunner;
use super::logging;
use super::persistence;
use super::ui::render;

/// Inputs of the dispatch loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Msg(Msg),
    ShowStatus,
    ShowIdentity,
    Quit,
}

const CONSENT_TEXT: &str = "\
harvest_gate collects public listing data on your behalf and contacts the
license server to validate this device. Type 'yes' to accept and continue.";

pub fn run_app() -> anyhow::Result<()> {
    logging::initialize_from_env();

    let settings = ClientSettings::from_env();
    ensure_output_dir(&settings.state_dir)
        .with_context(|| format!("state directory {:?}", settings.state_dir))?;

    let mut ui_state = persistence::load_ui_state(&settings.state_dir);
    if !ui_state.consent_accepted() {
        if !ask_consent()? {
            println!("Consent declined, exiting.");
            return Ok(());
        }
        ui_state.accept_consent();
        persistence::save_ui_state(&settings.state_dir, &ui_state);
    }

    let identity = IdentityResolver::new(
        Box::new(MachineIdSource::default()),
        settings.salt.clone(),
        IdentityCache::new(settings.state_dir.clone()),
        current_signals(),
    )
    .resolve();
    let saved_parameters = ui_state.parameters();

    let api = ReqwestLicenseApi::new(&settings).context("license server address")?;
    let worker_command = WorkerCommand::from_env();
    if worker_command.is_none() {
        gate_warn!("HARVEST_WORKER_CMD is not set; collection jobs cannot start");
    }
    let bridge = Bridge::new(
        Arc::new(api),
        Arc::new(ProcessWorker::new(worker_command)),
        LicenseStore::new(settings.state_dir.clone()),
        identity.as_str(),
        settings.app_version.clone(),
    );
    let (engine, engine_events) = EngineHandle::spawn(bridge).context("engine thread")?;

    let (app_tx, app_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(
        engine,
        engine_events,
        app_tx.clone(),
        settings.heartbeat_period,
        settings.state_dir.clone(),
    );

    gate_info!("harvest_gate started, device {identity}");
    println!("harvest_gate ready. Type 'help' for commands.");
    console::spawn_input(Form::new(saved_parameters.clone()), app_tx.clone());
    let _ = app_tx.send(AppEvent::Msg(Msg::Initialized {
        identity,
        saved_parameters,
    }));

    dispatch_loop(app_rx, &runner);

    runner.shutdown();
    gate_info!("harvest_gate exiting");
    Ok(())
}

fn dispatch_loop(app_rx: mpsc::Receiver<AppEvent>, runner: &EffectRunner) {
    let mut state = AppState::new();
    let mut shown_activity: Vec<String> = Vec::new();
    let mut shown_summary = String::new();

    while let Ok(event) = app_rx.recv() {
        match event {
            AppEvent::Msg(msg) => {
                let (next, effects) = update(std::mem::take(&mut state), msg);
                state = next;
                runner.run(effects);

                if state.consume_dirty() {
                    let view = state.view();
                    for line in render::new_activity(&shown_activity, &view.activity) {
                        println!("  > {line}");
                    }
                    shown_activity = view.activity.clone();

                    let summary = render::summary_line(&view);
                    if summary != shown_summary {
                        println!("{summary}");
                        shown_summary = summary;
                    }
                }
            }
            AppEvent::ShowStatus => {
                for line in render::render_status(&state.view()) {
                    println!("{line}");
                }
            }
            AppEvent::ShowIdentity => match state.identity() {
                Some(identity) => println!("Device identifier: {identity}"),
                None => println!("Device identifier not resolved yet"),
            },
            AppEvent::Quit => break,
        }
    }
}

fn ask_consent() -> anyhow::Result<bool> {
    println!("{CONSENT_TEXT}");
    print!("> ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_consent(&answer))
}

fn is_consent(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "yes" | "y")
}
