use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use labstock_core::{ComponentId, DomainError, DomainResult, ExpectedVersion};
use labstock_ledger::{Component, LedgerEntry, StockFlags};

use super::r#trait::{HistoryFilter, HistoryPage, InventoryStore, StoredEntry};

/// In-memory inventory store.
///
/// One lock guards both the live records and the audit streams, so every
/// commit (record write + entry append) is a single critical section.
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    live: HashMap<ComponentId, Component>,
    /// Streams survive deletion; tombstones land here too.
    streams: HashMap<ComponentId, Vec<StoredEntry>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::conflict("inventory store lock poisoned")
}

fn current_version(stream: &[StoredEntry]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

/// Defensive checks shared by every write path.
fn validate_append(component_id: ComponentId, entry: &LedgerEntry) -> DomainResult<()> {
    if entry.component_id != component_id {
        return Err(DomainError::validation(
            "entry component_id does not match the component being committed",
        ));
    }
    if !entry.is_balanced() {
        return Err(DomainError::validation(
            "entry quantities are not balanced (new != previous + changed)",
        ));
    }
    Ok(())
}

impl InventoryStore for InMemoryInventoryStore {
    fn create(&self, component: Component, entry: LedgerEntry) -> DomainResult<StoredEntry> {
        validate_append(component.id(), &entry)?;

        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        if inner.streams.contains_key(&component.id()) {
            return Err(DomainError::conflict("component id already has a stream"));
        }

        let stored = StoredEntry {
            sequence_number: 1,
            entry,
        };
        inner
            .streams
            .insert(component.id(), vec![stored.clone()]);
        inner.live.insert(component.id(), component);
        Ok(stored)
    }

    fn commit(
        &self,
        component: Component,
        entry: LedgerEntry,
        expected: ExpectedVersion,
    ) -> DomainResult<StoredEntry> {
        validate_append(component.id(), &entry)?;

        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        let inner = &mut *guard;
        let id = component.id();
        if !inner.live.contains_key(&id) {
            return Err(DomainError::NotFound);
        }

        let stream = inner.streams.entry(id).or_default();
        expected.check(current_version(stream))?;

        let stored = StoredEntry {
            sequence_number: current_version(stream) + 1,
            entry,
        };
        stream.push(stored.clone());
        inner.live.insert(id, component);
        Ok(stored)
    }

    fn update_flags(
        &self,
        id: ComponentId,
        flags: StockFlags,
        now: DateTime<Utc>,
        expected: ExpectedVersion,
    ) -> DomainResult<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let component = inner.live.get_mut(&id).ok_or(DomainError::NotFound)?;
        expected.check(component.version())?;
        component.refresh_flags(flags, now);
        Ok(())
    }

    fn remove(
        &self,
        id: ComponentId,
        tombstone: LedgerEntry,
        expected: ExpectedVersion,
    ) -> DomainResult<StoredEntry> {
        validate_append(id, &tombstone)?;

        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        let inner = &mut *guard;
        if !inner.live.contains_key(&id) {
            return Err(DomainError::NotFound);
        }

        let stream = inner.streams.entry(id).or_default();
        expected.check(current_version(stream))?;

        let stored = StoredEntry {
            sequence_number: current_version(stream) + 1,
            entry: tombstone,
        };
        stream.push(stored.clone());
        inner.live.remove(&id);
        Ok(stored)
    }

    fn get(&self, id: ComponentId) -> DomainResult<Option<Component>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.live.get(&id).cloned())
    }

    fn list(&self) -> DomainResult<Vec<Component>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let mut components: Vec<_> = inner.live.values().cloned().collect();
        components.sort_by_key(|c| (c.created_at(), *c.id().as_uuid()));
        Ok(components)
    }

    fn stream(&self, id: ComponentId) -> DomainResult<Vec<StoredEntry>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        inner
            .streams
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    fn history(&self, id: ComponentId, filter: &HistoryFilter) -> DomainResult<HistoryPage> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let stream = inner.streams.get(&id).ok_or(DomainError::NotFound)?;

        let mut matching = stream
            .iter()
            .rev()
            .filter(|e| {
                filter
                    .before_sequence
                    .is_none_or(|cursor| e.sequence_number < cursor)
            })
            .filter(|e| filter.action.is_none_or(|action| e.entry.action == action));

        let entries: Vec<StoredEntry> = matching.by_ref().take(filter.limit).cloned().collect();
        let next_cursor = if matching.next().is_some() {
            entries.last().map(|e| e.sequence_number)
        } else {
            None
        };

        Ok(HistoryPage {
            entries,
            next_cursor,
        })
    }
}
