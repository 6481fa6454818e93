//! Shared fixtures for core update tests.

use std::sync::Once;

use chrono::{DateTime, Duration, TimeZone, Utc};
use gate_core::{
    update, AppState, DeviceIdentity, Effect, LicenseId, Msg, ScrapeParameters, SessionCredentials,
    ValidateReply,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(gate_logging::initialize_for_tests);
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn identity() -> DeviceIdentity {
    DeviceIdentity::new("MC-0badcafe")
}

pub fn initialized() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::Initialized {
            identity: identity(),
            saved_parameters: None,
        },
    );
    state
}

/// Initialized state with a validated session that expires in 30 days.
#[allow(dead_code)]
pub fn activated() -> AppState {
    let (mut state, _) = update(
        initialized(),
        Msg::ValidateResponse {
            result: Ok(ValidateReply::Ok {
                credentials: SessionCredentials {
                    license_id: LicenseId::from(7),
                    session_token: "sess-token-7".to_string(),
                },
                expires_at: Some(now() + Duration::days(30)),
            }),
            received_at: now(),
        },
    );
    state.consume_dirty();
    state
}

#[allow(dead_code)]
pub fn parameters(keyword: &str, export_dir: &str) -> ScrapeParameters {
    ScrapeParameters {
        keyword: keyword.to_string(),
        export_dir: export_dir.to_string(),
        ..ScrapeParameters::default()
    }
}

#[allow(dead_code)]
pub fn notices(effects: &[Effect]) -> Vec<gate_core::Notice> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Notify(notice) => Some(notice.clone()),
            _ => None,
        })
        .collect()
}
