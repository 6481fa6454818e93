mod common;

use gate_core::{
    update, AppState, Effect, JobState, Msg, Notice, ProgressSnapshot, ResultItem, StartBlocked,
    StartReply, StopReply,
};

use common::{activated, init_logging, initialized, notices, parameters};

fn running() -> AppState {
    let (state, _) = update(activated(), Msg::StartClicked(parameters("shoes", "/out")));
    let (mut state, _) = update(state, Msg::StartResponse(Ok(StartReply::Ok)));
    assert_eq!(state.job(), JobState::Running);
    state.consume_dirty();
    state
}

fn item(title: &str) -> ResultItem {
    ResultItem {
        title: title.to_string(),
        price: 9.5,
        pinned_count: 100,
        review_count: 3,
        url: None,
    }
}

#[test]
fn start_while_unactivated_is_blocked_before_any_io() {
    init_logging();
    let (state, effects) = update(initialized(), Msg::StartClicked(parameters("shoes", "/out")));

    assert_eq!(state.job(), JobState::Idle);
    assert_eq!(
        effects,
        vec![Effect::Notify(Notice::StartBlocked(StartBlocked::NotActivated))]
    );
}

#[test]
fn repeated_blocked_starts_never_reach_the_worker() {
    init_logging();
    let mut state = initialized();
    for keyword in ["shoes", "", "hats"] {
        let (next, effects) = update(state, Msg::StartClicked(parameters(keyword, "/out")));
        assert!(effects
            .iter()
            .all(|effect| !matches!(effect, Effect::StartScrape(_))));
        assert_eq!(next.job(), JobState::Idle);
        state = next;
    }
}

#[test]
fn activation_is_checked_before_parameters() {
    init_logging();
    let (_state, effects) = update(initialized(), Msg::StartClicked(parameters("", "")));

    assert_eq!(
        notices(&effects),
        vec![Notice::StartBlocked(StartBlocked::NotActivated)]
    );
}

#[test]
fn missing_keyword_is_checked_before_export_dir() {
    init_logging();
    let (state, effects) = update(activated(), Msg::StartClicked(parameters("  ", "")));
    assert_eq!(
        notices(&effects),
        vec![Notice::StartBlocked(StartBlocked::MissingKeyword)]
    );
    assert_eq!(state.job(), JobState::Idle);

    let (_state, effects) = update(state, Msg::StartClicked(parameters("shoes", " ")));
    assert_eq!(
        notices(&effects),
        vec![Notice::StartBlocked(StartBlocked::MissingExportDirectory)]
    );
}

#[test]
fn valid_start_persists_and_requests_worker() {
    init_logging();
    let (state, effects) = update(
        activated(),
        Msg::StartClicked(parameters(" shoes ", "/out")),
    );
    let expected = parameters("shoes", "/out");

    assert_eq!(
        effects,
        vec![
            Effect::PersistParameters(expected.clone()),
            Effect::Notify(Notice::Starting),
            Effect::StartScrape(expected.clone()),
        ]
    );
    // Still idle until the worker confirms.
    assert_eq!(state.job(), JobState::Idle);
    assert!(state.view().start_pending);
    assert_eq!(state.parameters(), Some(&expected));
}

#[test]
fn double_click_while_starting_is_ignored() {
    init_logging();
    let (state, _effects) = update(activated(), Msg::StartClicked(parameters("shoes", "/out")));
    let (_state, effects) = update(state, Msg::StartClicked(parameters("shoes", "/out")));

    assert!(effects.is_empty());
}

#[test]
fn worker_ok_moves_to_running() {
    init_logging();
    let (state, _effects) = update(activated(), Msg::StartClicked(parameters("shoes", "/out")));
    let (state, effects) = update(state, Msg::StartResponse(Ok(StartReply::Ok)));

    assert_eq!(state.job(), JobState::Running);
    assert!(!state.view().start_pending);
    assert_eq!(effects, vec![Effect::Notify(Notice::Started)]);
}

#[test]
fn worker_rejections_stay_idle() {
    init_logging();
    for (reply, notice) in [
        (Ok(StartReply::NoKey), Notice::NoLicenseKey),
        (Ok(StartReply::NoExportDirectory), Notice::NoExportDirectory),
        (
            Ok(StartReply::Error("busy".to_string())),
            Notice::StartError("busy".to_string()),
        ),
        (
            Err("bridge down".to_string()),
            Notice::StartFailed("bridge down".to_string()),
        ),
    ] {
        let (state, _effects) =
            update(activated(), Msg::StartClicked(parameters("shoes", "/out")));
        let (state, effects) = update(state, Msg::StartResponse(reply));
        assert_eq!(state.job(), JobState::Idle);
        assert!(!state.view().start_pending);
        assert_eq!(effects, vec![Effect::Notify(notice)]);
    }
}

#[test]
fn start_while_running_has_no_effects() {
    init_logging();
    let (state, effects) = update(running(), Msg::StartClicked(parameters("shoes", "/out")));

    assert!(effects.is_empty());
    assert_eq!(state.job(), JobState::Running);
}

#[test]
fn stop_is_always_forwarded_and_ok_moves_to_idle() {
    init_logging();
    let (state, effects) = update(running(), Msg::StopClicked);
    assert_eq!(effects, vec![Effect::StopScrape]);

    let (state, effects) = update(state, Msg::StopResponse(Ok(StopReply::Ok)));
    assert_eq!(state.job(), JobState::Idle);
    assert_eq!(effects, vec![Effect::Notify(Notice::Stopped)]);
}

#[test]
fn stop_while_idle_is_silent() {
    init_logging();
    let mut before = activated();
    before.consume_dirty();

    let (state, effects) = update(before.clone(), Msg::StopClicked);
    assert_eq!(effects, vec![Effect::StopScrape]);

    for reply in [
        Ok(StopReply::Ok),
        Ok(StopReply::Other("NOT_RUNNING".to_string())),
        Err("gone".to_string()),
    ] {
        let (mut after, effects) = update(state.clone(), Msg::StopResponse(reply));
        assert!(effects.is_empty());
        assert_eq!(after.view(), before.view());
        assert!(!after.consume_dirty());
    }
}

#[test]
fn failed_stop_while_running_keeps_running() {
    init_logging();
    let (state, effects) = update(running(), Msg::StopResponse(Err("timeout".to_string())));

    assert_eq!(state.job(), JobState::Running);
    assert_eq!(effects, vec![Effect::Notify(Notice::StopFailed)]);
}

#[test]
fn idle_status_completes_exactly_once() {
    init_logging();
    let (state, first) = update(running(), Msg::WorkerStatus("idle".to_string()));
    let (state, second) = update(state, Msg::WorkerStatus("idle".to_string()));

    assert_eq!(state.job(), JobState::Idle);
    assert_eq!(notices(&first), vec![Notice::Completed]);
    assert!(second.is_empty());
    assert_eq!(state.view().activity, vec!["Idle…", "Idle…"]);
}

#[test]
fn late_events_after_stop_update_views_but_not_state() {
    init_logging();
    let (state, _effects) = update(running(), Msg::StopResponse(Ok(StopReply::Ok)));
    let (state, _effects) = update(
        state,
        Msg::WorkerProgress(ProgressSnapshot {
            visited: 4,
            collected: 2,
            ..ProgressSnapshot::default()
        }),
    );
    let (state, effects) = update(state, Msg::WorkerItem(item("late")));

    assert!(effects.is_empty());
    assert_eq!(state.job(), JobState::Idle);
    let view = state.view();
    assert_eq!(view.compact.len(), 1);
    assert_eq!(view.metrics.collected, 2);
}

#[test]
fn non_idle_status_is_only_logged() {
    init_logging();
    let (state, effects) = update(running(), Msg::WorkerStatus("error".to_string()));

    assert!(effects.is_empty());
    assert_eq!(state.job(), JobState::Running);
    assert_eq!(state.view().activity, vec!["Status: error"]);
}
