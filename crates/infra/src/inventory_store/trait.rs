use serde::{Deserialize, Serialize};
use std::sync::Arc;

use labstock_core::{ComponentId, DomainResult, ExpectedVersion};
use labstock_ledger::{Component, LedgerAction, LedgerEntry, StockFlags};

use chrono::{DateTime, Utc};

/// A ledger entry persisted in a component's audit stream (assigned a
/// sequence number).
///
/// Sequence numbers are assigned by the store during commit and are:
/// - **Monotonically increasing** per component (no gaps, no duplicates)
/// - **Immutable** once assigned
///
/// They double as the component's version token and as the history
/// pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Position in the component's stream (1-based).
    pub sequence_number: u64,
    pub entry: LedgerEntry,
}

/// Filter for history listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Restrict to one action kind.
    pub action: Option<LedgerAction>,
    /// Pagination cursor: only entries with a smaller sequence number are
    /// returned. `None` starts from the newest entry.
    pub before_sequence: Option<u64>,
    pub limit: usize,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            action: None,
            before_sequence: None,
            limit: 50,
        }
    }
}

/// One reverse-chronological page of a component's audit stream.
///
/// `next_cursor` is `Some` when older entries remain; feeding it back as
/// `before_sequence` restarts the listing exactly where this page ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    pub entries: Vec<StoredEntry>,
    pub next_cursor: Option<u64>,
}

/// Durable keyed store for components and their append-only audit streams.
///
/// ## Commit semantics
///
/// `create` / `commit` / `remove` each write the component record **and**
/// append exactly one ledger entry as one indivisible unit. Implementations
/// must make the pair atomic with respect to concurrent commits on the same
/// component — a single critical section in memory, a single transaction on
/// a SQL backend. There is no partial commit to roll back.
///
/// ## Optimistic concurrency
///
/// A component's `version` equals the number of entries in its stream.
/// `commit`/`remove`/`update_flags` take the version the caller observed;
/// a mismatch at write time fails with `Conflict` and must leave the store
/// untouched. Different components never contend.
///
/// ## Append-only
///
/// Entries are never updated or deleted. Component deletion appends a
/// tombstone entry and removes the record from the live set; the stream
/// stays readable through `history`/`stream`.
///
/// ## Reads
///
/// `get`/`list`/`history` are snapshot reads: never blocked by in-flight
/// commits, free to observe pre- or post-mutation state.
pub trait InventoryStore: Send + Sync {
    /// Insert a new component with its `created` entry. Fails with
    /// `Conflict` if the id already has a stream (ids are never reused,
    /// including after deletion).
    fn create(&self, component: Component, entry: LedgerEntry) -> DomainResult<StoredEntry>;

    /// Replace the component record and append one entry, atomically,
    /// subject to the version check.
    fn commit(
        &self,
        component: Component,
        entry: LedgerEntry,
        expected: ExpectedVersion,
    ) -> DomainResult<StoredEntry>;

    /// Refresh the cached derived flags without appending an entry or
    /// bumping the version (flags are derived state, not audited history).
    fn update_flags(
        &self,
        id: ComponentId,
        flags: StockFlags,
        now: DateTime<Utc>,
        expected: ExpectedVersion,
    ) -> DomainResult<()>;

    /// Append the tombstone entry and drop the component from the live set.
    fn remove(
        &self,
        id: ComponentId,
        tombstone: LedgerEntry,
        expected: ExpectedVersion,
    ) -> DomainResult<StoredEntry>;

    /// Live component by id.
    fn get(&self, id: ComponentId) -> DomainResult<Option<Component>>;

    /// All live components.
    fn list(&self) -> DomainResult<Vec<Component>>;

    /// Full audit stream in ascending sequence order (verification and
    /// rebuild support). Works for deleted components too.
    fn stream(&self, id: ComponentId) -> DomainResult<Vec<StoredEntry>>;

    /// Reverse-chronological page of the audit stream.
    fn history(&self, id: ComponentId, filter: &HistoryFilter) -> DomainResult<HistoryPage>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn create(&self, component: Component, entry: LedgerEntry) -> DomainResult<StoredEntry> {
        (**self).create(component, entry)
    }

    fn commit(
        &self,
        component: Component,
        entry: LedgerEntry,
        expected: ExpectedVersion,
    ) -> DomainResult<StoredEntry> {
        (**self).commit(component, entry, expected)
    }

    fn update_flags(
        &self,
        id: ComponentId,
        flags: StockFlags,
        now: DateTime<Utc>,
        expected: ExpectedVersion,
    ) -> DomainResult<()> {
        (**self).update_flags(id, flags, now, expected)
    }

    fn remove(
        &self,
        id: ComponentId,
        tombstone: LedgerEntry,
        expected: ExpectedVersion,
    ) -> DomainResult<StoredEntry> {
        (**self).remove(id, tombstone, expected)
    }

    fn get(&self, id: ComponentId) -> DomainResult<Option<Component>> {
        (**self).get(id)
    }

    fn list(&self) -> DomainResult<Vec<Component>> {
        (**self).list()
    }

    fn stream(&self, id: ComponentId) -> DomainResult<Vec<StoredEntry>> {
        (**self).stream(id)
    }

    fn history(&self, id: ComponentId, filter: &HistoryFilter) -> DomainResult<HistoryPage> {
        (**self).history(id, filter)
    }
}
