use chrono::Duration;

/// Ledger tuning knobs.
///
/// Constructed in code; callers that want env-driven configuration can build
/// one from whatever source they use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// How long without an outward movement before stock counts as stale.
    pub stale_window: Duration,
    /// Bounded retry attempts on `Conflict` at the caller boundary.
    pub retry_attempts: u32,
}

impl LedgerConfig {
    pub fn with_stale_window_days(days: i64) -> Self {
        Self {
            stale_window: Duration::days(days),
            ..Self::default()
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            stale_window: Duration::days(90),
            retry_attempts: 3,
        }
    }
}
