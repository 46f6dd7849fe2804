//! Ledger operation pipeline (application-level orchestration).
//!
//! The engine orchestrates the full mutation lifecycle against the
//! inventory store:
//!
//! ```text
//! Operation
//!   ↓
//! 1. Load current component record
//!   ↓
//! 2. Check the actor's capability for the operation kind
//!   ↓
//! 3. Decide (pure domain logic, produces one ledger entry)
//!   ↓
//! 4. Commit record + entry atomically (optimistic version check)
//!   ↓
//! 5. Recompute flags, hand transitions to the notification trigger
//! ```
//!
//! The engine never swallows errors and performs no partial commit: step 4
//! is a single store commit. A `Conflict` from step 4 means a concurrent
//! writer won the race; retrying is the caller's decision (see
//! [`apply_with_retry`]).
//!
//! Notification creation runs after the commit. A trigger failure cannot
//! un-commit the operation, so it is logged and the committed result is
//! returned; the feed is a best-effort side channel and a missed edge is
//! caught by the next transition or sweep.

use chrono::{DateTime, Utc};

use labstock_auth::Actor;
use labstock_core::{ComponentId, DomainError, DomainResult, ExpectedVersion};
use labstock_ledger::{
    verify_and_replay, Component, ComponentDraft, ComponentUpdate, InventoryOperation,
    LedgerConfig, LedgerEntry, StockFlags,
};
use labstock_notify::{Notification, NotificationStore, NotificationTrigger};

use crate::inventory_store::InventoryStore;

/// Reusable execution engine for ledger operations.
///
/// Generic over the store and notification-store implementations so tests
/// run against the in-memory pair and production can swap in durable
/// backends without touching domain code.
#[derive(Debug)]
pub struct LedgerEngine<S, N> {
    store: S,
    trigger: NotificationTrigger<N>,
    config: LedgerConfig,
}

impl<S, N> LedgerEngine<S, N>
where
    S: InventoryStore,
    N: NotificationStore,
{
    pub fn new(store: S, notifications: N, config: LedgerConfig) -> Self {
        Self {
            store,
            trigger: NotificationTrigger::new(notifications),
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a component with its `created` audit entry.
    ///
    /// A component created at or below its threshold is already a low-stock
    /// edge, so the trigger runs here too.
    pub fn create_component(
        &self,
        draft: ComponentDraft,
        actor: Actor,
    ) -> DomainResult<(Component, LedgerEntry)> {
        let now = Utc::now();
        let (component, entry) = Component::create(draft, actor.id, now, &self.config)?;
        let stored = self.store.create(component.clone(), entry)?;
        tracing::info!(
            "component {} created with quantity {}",
            component.id(),
            component.quantity()
        );

        self.notify(&component, StockFlags::default(), component.flags(), now);
        Ok((component, stored.entry))
    }

    /// Apply one inward/outward/adjust operation.
    pub fn apply_operation(
        &self,
        component_id: ComponentId,
        operation: &InventoryOperation,
        actor: Actor,
    ) -> DomainResult<(Component, LedgerEntry)> {
        authorize(actor, operation)?;

        let now = Utc::now();
        let current = self
            .store
            .get(component_id)?
            .ok_or(DomainError::NotFound)?;
        let previous_flags = current.flags();
        let expected = ExpectedVersion::Exact(current.version());

        let entry = current.handle(operation, actor.id, now)?;
        let mut next = current;
        next.apply(&entry, &self.config);

        let stored = self.store.commit(next.clone(), entry, expected)?;
        tracing::info!(
            "{} committed for component {} ({} -> {})",
            stored.entry.action.as_str(),
            component_id,
            stored.entry.previous_quantity,
            stored.entry.new_quantity
        );

        self.notify(&next, previous_flags, next.flags(), now);
        Ok((next, stored.entry))
    }

    /// Update descriptive fields and/or the critical-low threshold.
    pub fn update_component(
        &self,
        component_id: ComponentId,
        changes: &ComponentUpdate,
        actor: Actor,
    ) -> DomainResult<(Component, LedgerEntry)> {
        let now = Utc::now();
        let current = self
            .store
            .get(component_id)?
            .ok_or(DomainError::NotFound)?;
        let previous_flags = current.flags();
        let expected = ExpectedVersion::Exact(current.version());

        let (next, entry) = current.update(changes, actor.id, now, &self.config)?;
        let stored = self.store.commit(next.clone(), entry, expected)?;

        // A threshold change can cross the low-stock boundary on its own.
        self.notify(&next, previous_flags, next.flags(), now);
        Ok((next, stored.entry))
    }

    /// Delete a component: append the tombstone, drop it from the live set.
    pub fn delete_component(
        &self,
        component_id: ComponentId,
        reason: &str,
        actor: Actor,
    ) -> DomainResult<LedgerEntry> {
        let now = Utc::now();
        let current = self
            .store
            .get(component_id)?
            .ok_or(DomainError::NotFound)?;
        let expected = ExpectedVersion::Exact(current.version());

        let tombstone = current.tombstone(reason, actor.id, now)?;
        let stored = self.store.remove(component_id, tombstone, expected)?;
        tracing::info!("component {component_id} deleted");
        Ok(stored.entry)
    }

    /// Recompute time-dependent flags for every live component.
    ///
    /// This is the scheduled-sweep entry point: `is_stale` moves with the
    /// clock, not with mutations, so only a sweep can observe its false→true
    /// edge. Components whose version moved mid-sweep are skipped; the next
    /// sweep catches them.
    pub fn run_stale_sweep(&self, now: DateTime<Utc>) -> DomainResult<Vec<Notification>> {
        let mut created = Vec::new();

        for component in self.store.list()? {
            let previous = component.flags();
            let current = component.flags_at(now, &self.config);
            if current == previous {
                continue;
            }

            match self.store.update_flags(
                component.id(),
                current,
                now,
                ExpectedVersion::Exact(component.version()),
            ) {
                Ok(()) => {}
                Err(DomainError::Conflict(_)) | Err(DomainError::NotFound) => continue,
                Err(e) => return Err(e),
            }

            created.extend(self.trigger.on_state_change(&component, previous, current, now)?);
        }

        Ok(created)
    }

    /// Verify a component's audit trail against its stored quantity.
    ///
    /// Replays the full stream; any broken chain or mismatch surfaces as a
    /// `Validation` error naming the offending entry.
    pub fn verify_audit_trail(&self, component_id: ComponentId) -> DomainResult<u32> {
        let component = self
            .store
            .get(component_id)?
            .ok_or(DomainError::NotFound)?;
        let stream = self.store.stream(component_id)?;
        let entries: Vec<LedgerEntry> = stream.into_iter().map(|s| s.entry).collect();
        verify_and_replay(&entries, component.quantity())
    }

    fn notify(
        &self,
        component: &Component,
        previous: StockFlags,
        current: StockFlags,
        now: DateTime<Utc>,
    ) {
        if let Err(e) = self.trigger.on_state_change(component, previous, current, now) {
            tracing::warn!(
                "notification trigger failed for component {}: {e}",
                component.id()
            );
        }
    }
}

fn authorize(actor: Actor, operation: &InventoryOperation) -> DomainResult<()> {
    let allowed = match operation {
        InventoryOperation::Inward(_) => actor.role.can_inward(),
        InventoryOperation::Outward(_) => actor.role.can_outward(),
        InventoryOperation::Adjust(_) => actor.role.can_adjust(),
    };
    if allowed {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}

/// Caller-boundary retry for optimistic conflicts.
///
/// Retries only `Conflict`, up to the configured bound; every other failure
/// surfaces immediately. The engine itself never retries.
pub fn apply_with_retry<S, N>(
    engine: &LedgerEngine<S, N>,
    component_id: ComponentId,
    operation: &InventoryOperation,
    actor: Actor,
) -> DomainResult<(Component, LedgerEntry)>
where
    S: InventoryStore,
    N: NotificationStore,
{
    let attempts = engine.config().retry_attempts.max(1);
    let mut last = None;

    for attempt in 1..=attempts {
        match engine.apply_operation(component_id, operation, actor) {
            Err(e @ DomainError::Conflict(_)) => {
                tracing::warn!(
                    "conflict applying {} to component {component_id} (attempt {attempt}/{attempts})",
                    operation.action().as_str()
                );
                last = Some(e);
            }
            other => return other,
        }
    }

    Err(last.unwrap_or_else(|| DomainError::conflict("retries exhausted")))
}
