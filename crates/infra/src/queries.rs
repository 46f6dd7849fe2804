//! Read-side queries for dashboards and listings.
//!
//! These recompute flags through the pure stock computer against the
//! caller's clock; they never replay history and never block writers.

use chrono::{DateTime, Utc};

use labstock_core::{ComponentId, DomainError, DomainResult};
use labstock_ledger::{Component, LedgerConfig};

use crate::inventory_store::{HistoryFilter, HistoryPage, InventoryStore};

/// Current state plus one page of audit history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentWithHistory {
    pub component: Component,
    pub history: HistoryPage,
}

/// Component detail view: record + first history page.
pub fn get_component_with_history<S: InventoryStore>(
    store: &S,
    id: ComponentId,
    filter: &HistoryFilter,
) -> DomainResult<ComponentWithHistory> {
    let component = store.get(id)?.ok_or(DomainError::NotFound)?;
    let history = store.history(id, filter)?;
    Ok(ComponentWithHistory { component, history })
}

/// Components at or below their critical-low threshold.
pub fn list_low_stock<S: InventoryStore>(
    store: &S,
    now: DateTime<Utc>,
    config: &LedgerConfig,
) -> DomainResult<Vec<Component>> {
    Ok(store
        .list()?
        .into_iter()
        .filter(|c| c.flags_at(now, config).is_low_stock)
        .collect())
}

/// Components with no outward movement for at least the stale window.
pub fn list_stale<S: InventoryStore>(
    store: &S,
    now: DateTime<Utc>,
    config: &LedgerConfig,
) -> DomainResult<Vec<Component>> {
    Ok(store
        .list()?
        .into_iter()
        .filter(|c| c.flags_at(now, config).is_stale)
        .collect())
}
