use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Derived stock-health flags.
///
/// Flags are a pure function of the component's current state and the clock;
/// they are cached on the component at mutation time and recomputable on
/// demand for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockFlags {
    pub is_low_stock: bool,
    pub is_stale: bool,
}

impl StockFlags {
    /// Compute flags from current state.
    ///
    /// - `is_low_stock`: at or below the critical-low threshold. A threshold
    ///   of 0 means only an empty bin counts as low. `quantity == 0` is the
    ///   out-of-stock sub-case and always counts as low.
    /// - `is_stale`: no outward movement for at least `stale_window`.
    pub fn compute(
        quantity: u32,
        critical_low_threshold: u32,
        last_outward_at: DateTime<Utc>,
        now: DateTime<Utc>,
        stale_window: Duration,
    ) -> Self {
        Self {
            is_low_stock: quantity <= critical_low_threshold,
            is_stale: now.signed_duration_since(last_outward_at) >= stale_window,
        }
    }

    /// Whether an empty bin should escalate priority (out of stock).
    pub fn is_out_of_stock(quantity: u32) -> bool {
        quantity == 0
    }
}
