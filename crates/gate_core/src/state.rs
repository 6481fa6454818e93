use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bounded::BoundedView;
use crate::view_model::{AppViewModel, CompactCard, DetailRow, MetricsView};

/// License identifier issued by the authority, kept in whatever JSON form it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LicenseId {
    Number(i64),
    Text(String),
}

impl fmt::Display for LicenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseId::Number(id) => write!(f, "{id}"),
            LicenseId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for LicenseId {
    fn from(id: i64) -> Self {
        LicenseId::Number(id)
    }
}

impl From<&str> for LicenseId {
    fn from(id: &str) -> Self {
        LicenseId::Text(id.to_string())
    }
}

pub const COMPACT_VIEW_CAPACITY: usize = 50;
pub const DETAILED_VIEW_CAPACITY: usize = 200;
pub const ACTIVITY_LOG_CAPACITY: usize = 150;
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

/// Worker status value that signals natural completion.
pub const IDLE_STATUS: &str = "idle";

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    #[default]
    Unactivated,
    Activated,
    Expired,
}

/// License id and session token; the authority always issues them together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub license_id: LicenseId,
    pub session_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LicenseSession {
    activation: ActivationState,
    credentials: Option<SessionCredentials>,
    expires_at: Option<DateTime<Utc>>,
    remaining_days: Option<i64>,
}

impl LicenseSession {
    pub fn activation(&self) -> ActivationState {
        self.activation
    }

    pub fn is_activated(&self) -> bool {
        self.activation == ActivationState::Activated
    }

    pub fn credentials(&self) -> Option<&SessionCredentials> {
        self.credentials.as_ref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whole days left as last displayed; `None` until an expiry is known.
    pub fn remaining_days(&self) -> Option<i64> {
        self.remaining_days
    }

    /// Applies a successful activation. Returns the resulting state.
    pub(crate) fn apply_activation(
        &mut self,
        license_id: LicenseId,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ActivationState {
        if self
            .credentials
            .as_ref()
            .is_some_and(|creds| creds.license_id != license_id)
        {
            // Token belongs to a different license; it must not be heartbeated.
            self.credentials = None;
        }
        self.apply_expiry(expires_at, now)
    }

    /// Applies a successful validation. Returns the resulting state.
    pub(crate) fn apply_validation(
        &mut self,
        credentials: SessionCredentials,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ActivationState {
        let state = self.apply_expiry(expires_at, now);
        self.credentials = match state {
            ActivationState::Activated => Some(credentials),
            _ => None,
        };
        state
    }

    pub(crate) fn mark_expired(&mut self) {
        self.activation = ActivationState::Expired;
        self.credentials = None;
        self.remaining_days = Some(0);
    }

    fn apply_expiry(
        &mut self,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ActivationState {
        self.expires_at = expires_at;
        match expires_at {
            Some(at) if at <= now => {
                self.mark_expired();
            }
            Some(at) => {
                self.activation = ActivationState::Activated;
                self.remaining_days = Some(remaining_days(at, now).max(0));
            }
            None => {
                self.activation = ActivationState::Activated;
                self.remaining_days = None;
            }
        }
        self.activation
    }
}

/// Whole days between `now` and `expires_at`, floored (negative once past).
pub fn remaining_days(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_milliseconds().div_euclid(MS_PER_DAY)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrapeParameters {
    pub keyword: String,
    pub price_floor: f64,
    pub min_pinned: u32,
    pub min_reviews: u32,
    pub export_dir: String,
}

/// Local reason a start request never reached the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartBlocked {
    NotActivated,
    MissingKeyword,
    MissingExportDirectory,
}

impl ScrapeParameters {
    /// Trims text fields and clamps negative thresholds to zero.
    pub fn normalized(mut self) -> Self {
        self.keyword = self.keyword.trim().to_string();
        self.export_dir = self.export_dir.trim().to_string();
        if !self.price_floor.is_finite() || self.price_floor < 0.0 {
            self.price_floor = 0.0;
        }
        self
    }

    /// First missing required field, checked keyword before export directory.
    pub fn missing_field(&self) -> Option<StartBlocked> {
        if self.keyword.trim().is_empty() {
            return Some(StartBlocked::MissingKeyword);
        }
        if self.export_dir.trim().is_empty() {
            return Some(StartBlocked::MissingExportDirectory);
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressSnapshot {
    pub visited: u64,
    pub collected: u64,
    pub filtered: u64,
    pub avg_price: Option<f64>,
    pub avg_pinned: Option<f64>,
    pub output_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub title: String,
    pub price: f64,
    pub pinned_count: u64,
    pub review_count: u64,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    identity: Option<DeviceIdentity>,
    license: LicenseSession,
    job: JobState,
    start_pending: bool,
    parameters: Option<ScrapeParameters>,
    metrics: ProgressSnapshot,
    collected_badge: u64,
    compact: BoundedView<CompactCard>,
    detailed: BoundedView<DetailRow>,
    activity: BoundedView<String>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            identity: None,
            license: LicenseSession::default(),
            job: JobState::Idle,
            start_pending: false,
            parameters: None,
            metrics: ProgressSnapshot::default(),
            collected_badge: 0,
            compact: BoundedView::with_capacity(COMPACT_VIEW_CAPACITY),
            detailed: BoundedView::with_capacity(DETAILED_VIEW_CAPACITY),
            activity: BoundedView::with_capacity(ACTIVITY_LOG_CAPACITY),
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.identity.as_ref()
    }

    pub fn license(&self) -> &LicenseSession {
        &self.license
    }

    pub fn job(&self) -> JobState {
        self.job
    }

    pub fn parameters(&self) -> Option<&ScrapeParameters> {
        self.parameters.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            identity: self.identity.as_ref().map(|id| id.to_string()),
            activation: self.license.activation(),
            license_id: self.license.credentials().map(|creds| creds.license_id.clone()),
            remaining_days: self.license.remaining_days(),
            job: self.job,
            start_pending: self.start_pending,
            parameters: self.parameters.clone(),
            metrics: MetricsView::from_snapshot(&self.metrics),
            collected_badge: self.collected_badge,
            compact: self.compact.to_vec(),
            detailed: self.detailed.to_vec(),
            activity: self.activity.to_vec(),
            activity_scroll_to: self.activity.len().checked_sub(1),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_identity(&mut self, identity: DeviceIdentity) {
        self.identity = Some(identity);
        self.mark_dirty();
    }

    pub(crate) fn set_parameters(&mut self, parameters: ScrapeParameters) {
        self.parameters = Some(parameters);
        self.mark_dirty();
    }

    pub(crate) fn license_mut(&mut self) -> &mut LicenseSession {
        self.dirty = true;
        &mut self.license
    }

    pub(crate) fn start_pending(&self) -> bool {
        self.start_pending
    }

    pub(crate) fn set_start_pending(&mut self, pending: bool) {
        self.start_pending = pending;
        self.mark_dirty();
    }

    /// Returns `true` when the job state actually changed.
    pub(crate) fn set_job(&mut self, job: JobState) -> bool {
        if self.job == job {
            return false;
        }
        self.job = job;
        self.mark_dirty();
        true
    }

    pub(crate) fn metrics(&self) -> &ProgressSnapshot {
        &self.metrics
    }

    pub(crate) fn replace_metrics(&mut self, snapshot: ProgressSnapshot) {
        self.metrics = snapshot;
        self.mark_dirty();
    }

    pub(crate) fn push_item(&mut self, item: ResultItem) {
        let card = CompactCard::from_item(self.compact.len() + 1, &item);
        self.compact.push_newest_first(card);
        self.detailed.push_newest_first(DetailRow::from_item(item));
        self.collected_badge = self.metrics.collected;
        self.mark_dirty();
    }

    pub(crate) fn clear_results(&mut self) {
        self.compact.clear();
        self.detailed.clear();
        self.mark_dirty();
    }

    pub(crate) fn append_activity(&mut self, line: impl Into<String>) {
        self.activity.push_newest_last(line.into());
        self.mark_dirty();
    }
}
