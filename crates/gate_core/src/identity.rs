use crate::DeviceIdentity;

/// Marker placed in front of every locally derived identity.
pub const FALLBACK_IDENTITY_PREFIX: &str = "MC-";

/// Environment signals folded into a fallback device identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentSignals {
    /// Client agent string, e.g. `harvest_gate/0.1.0 (linux; x86_64)`.
    pub agent: String,
    pub display_width: Option<u32>,
    pub display_height: Option<u32>,
    /// Minutes to add to local time to reach UTC (UTC+8 is `-480`).
    pub timezone_offset_minutes: i32,
}

impl EnvironmentSignals {
    fn fingerprint_source(&self) -> String {
        // Missing or zero dimensions contribute nothing to the fingerprint.
        let dimension = |value: Option<u32>| match value {
            Some(v) if v > 0 => v.to_string(),
            _ => String::new(),
        };
        format!(
            "{}{}{}{}",
            self.agent,
            dimension(self.display_width),
            dimension(self.display_height),
            self.timezone_offset_minutes
        )
    }
}

/// Derives a deterministic identity from environment signals.
///
/// The same signals always produce the same token: `MC-` followed by at least
/// eight lowercase hex digits.
pub fn derive_fallback_identity(signals: &EnvironmentSignals) -> DeviceIdentity {
    let hash = fold_hash(&signals.fingerprint_source());
    let magnitude = i64::from(hash).unsigned_abs();
    DeviceIdentity::new(format!("{FALLBACK_IDENTITY_PREFIX}{magnitude:08x}"))
}

/// 32-bit `h * 31 + unit` over UTF-16 code units with wrapping arithmetic.
fn fold_hash(source: &str) -> i32 {
    source.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_shl(5)
            .wrapping_sub(h)
            .wrapping_add(i32::from(unit))
    })
}
