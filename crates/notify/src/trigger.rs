use chrono::{DateTime, Utc};

use labstock_core::DomainResult;
use labstock_ledger::{Component, StockFlags};

use crate::notification::{Notification, NotificationKind, Priority};
use crate::store::NotificationStore;

/// Edge-triggered notification creation.
///
/// Fires only on a flag's false→true transition, never on every mutation
/// that leaves it true. Before creating, it checks the feed for an open
/// (unread, undeleted) notification of the same kind for the component and
/// skips the duplicate.
///
/// The check-then-create pair is a race window: two writers crossing the
/// same threshold concurrently can each pass the check and publish, so the
/// dedup rule is "at most one extra duplicate under rare races", not a hard
/// exclusion.
#[derive(Debug)]
pub struct NotificationTrigger<S> {
    store: S,
}

impl<S> NotificationTrigger<S>
where
    S: NotificationStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// React to a flag transition after a committed mutation or sweep.
    ///
    /// Returns the notifications actually created (empty on no transition
    /// or when dedup suppressed them).
    pub fn on_state_change(
        &self,
        component: &Component,
        previous: StockFlags,
        current: StockFlags,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Notification>> {
        let mut created = Vec::new();

        if !previous.is_low_stock && current.is_low_stock {
            if let Some(n) = self.low_stock(component, now)? {
                created.push(n);
            }
        }

        if !previous.is_stale && current.is_stale {
            if let Some(n) = self.stale_stock(component, now)? {
                created.push(n);
            }
        }

        Ok(created)
    }

    fn low_stock(
        &self,
        component: &Component,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Notification>> {
        if self
            .store
            .find_open(component.id(), NotificationKind::LowStock)?
            .is_some()
        {
            tracing::debug!(
                "suppressing duplicate low_stock notification for component {}",
                component.id()
            );
            return Ok(None);
        }

        let out_of_stock = StockFlags::is_out_of_stock(component.quantity());
        let (priority, title) = if out_of_stock {
            (Priority::Critical, format!("Out of stock: {}", component.name()))
        } else {
            (Priority::High, format!("Low stock: {}", component.name()))
        };
        let message = format!(
            "{} ({}) is down to {} on hand (critical-low threshold {})",
            component.name(),
            component.part_number(),
            component.quantity(),
            component.critical_low_threshold(),
        );

        let notification = self.store.publish(Notification::new(
            NotificationKind::LowStock,
            priority,
            title,
            message,
            Some(component.id()),
            now,
        ))?;
        tracing::info!(
            "low_stock notification created for component {} (quantity {})",
            component.id(),
            component.quantity()
        );
        Ok(Some(notification))
    }

    fn stale_stock(
        &self,
        component: &Component,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Notification>> {
        if self
            .store
            .find_open(component.id(), NotificationKind::StaleStock)?
            .is_some()
        {
            return Ok(None);
        }

        let idle_days = now
            .signed_duration_since(component.last_outward_at())
            .num_days();
        let notification = self.store.publish(Notification::new(
            NotificationKind::StaleStock,
            Priority::Medium,
            format!("Stale stock: {}", component.name()),
            format!(
                "{} ({}) has had no outward movement for {} days",
                component.name(),
                component.part_number(),
                idle_days,
            ),
            Some(component.id()),
            now,
        ))?;
        tracing::info!(
            "stale_stock notification created for component {}",
            component.id()
        );
        Ok(Some(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryNotificationStore;
    use labstock_core::{ActorId, ComponentId};
    use labstock_ledger::{ComponentDraft, LedgerConfig};
    use std::sync::Arc;

    fn component(quantity: u32, threshold: u32) -> Component {
        Component::create(
            ComponentDraft {
                id: ComponentId::new(),
                name: "ESP32 DevKit".to_string(),
                part_number: "ESP32-WROOM-32".to_string(),
                location_bin: Some("B1".to_string()),
                quantity,
                critical_low_threshold: threshold,
            },
            ActorId::new(),
            Utc::now(),
            &LedgerConfig::default(),
        )
        .unwrap()
        .0
    }

    fn flags(low: bool, stale: bool) -> StockFlags {
        StockFlags {
            is_low_stock: low,
            is_stale: stale,
        }
    }

    fn setup() -> (NotificationTrigger<Arc<InMemoryNotificationStore>>, Arc<InMemoryNotificationStore>) {
        let store = Arc::new(InMemoryNotificationStore::new());
        (NotificationTrigger::new(store.clone()), store)
    }

    #[test]
    fn fires_once_on_low_stock_edge() {
        let (trigger, store) = setup();
        let c = component(4, 5);

        let created = trigger
            .on_state_change(&c, flags(false, false), flags(true, false), Utc::now())
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].kind, NotificationKind::LowStock);
        assert_eq!(created[0].priority, Priority::High);

        // Level-triggered calls (still true) create nothing.
        let created = trigger
            .on_state_change(&c, flags(true, false), flags(true, false), Utc::now())
            .unwrap();
        assert!(created.is_empty());
        assert_eq!(store.list(10).unwrap().len(), 1);
    }

    #[test]
    fn empty_bin_escalates_to_critical() {
        let (trigger, _store) = setup();
        let c = component(0, 5);

        let created = trigger
            .on_state_change(&c, flags(false, false), flags(true, false), Utc::now())
            .unwrap();
        assert_eq!(created[0].priority, Priority::Critical);
        assert!(created[0].title.starts_with("Out of stock"));
    }

    #[test]
    fn open_notification_suppresses_duplicate_edge() {
        let (trigger, store) = setup();
        let c = component(4, 5);

        trigger
            .on_state_change(&c, flags(false, false), flags(true, false), Utc::now())
            .unwrap();
        // Flag cleared and re-crossed while the first is still unread.
        let created = trigger
            .on_state_change(&c, flags(false, false), flags(true, false), Utc::now())
            .unwrap();
        assert!(created.is_empty());
        assert_eq!(store.list(10).unwrap().len(), 1);
    }

    #[test]
    fn read_notification_allows_a_new_edge_to_fire() {
        let (trigger, store) = setup();
        let c = component(4, 5);

        let first = trigger
            .on_state_change(&c, flags(false, false), flags(true, false), Utc::now())
            .unwrap();
        store.mark_read(first[0].id, ActorId::new()).unwrap();

        let created = trigger
            .on_state_change(&c, flags(false, false), flags(true, false), Utc::now())
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(store.list(10).unwrap().len(), 2);
    }

    #[test]
    fn stale_edge_fires_medium_priority() {
        let (trigger, _store) = setup();
        let c = component(50, 5);

        let created = trigger
            .on_state_change(&c, flags(false, false), flags(false, true), Utc::now())
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].kind, NotificationKind::StaleStock);
        assert_eq!(created[0].priority, Priority::Medium);
    }
}
