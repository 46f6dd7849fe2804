use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use labstock_core::{ActorId, ComponentId, DomainError, DomainResult, NotificationId};

use crate::notification::{Notification, NotificationKind};

/// Pull-based notification feed.
///
/// `publish` is the only way a notification comes into existence; the
/// trigger and external event sources both go through it. Content is never
/// updated afterwards — the mutations are read-marking and deletion.
///
/// Reads are point-in-time snapshots; they are never blocked by concurrent
/// publishes and carry no read-your-writes promise across sessions.
pub trait NotificationStore: Send + Sync {
    /// Append a notification to the feed.
    fn publish(&self, notification: Notification) -> DomainResult<Notification>;

    /// Newest-first page of the feed.
    fn list(&self, limit: usize) -> DomainResult<Vec<Notification>>;

    /// How many feed items this actor has not read yet.
    fn unread_count(&self, actor: ActorId) -> DomainResult<usize>;

    /// Record that `actor` has read the notification.
    fn mark_read(&self, id: NotificationId, actor: ActorId) -> DomainResult<()>;

    /// Mark everything read for `actor`; returns how many were newly marked.
    fn mark_all_read(&self, actor: ActorId) -> DomainResult<usize>;

    /// Remove a notification (explicit user action).
    fn delete(&self, id: NotificationId) -> DomainResult<()>;

    /// The open (unread-by-everyone, undeleted) notification of `kind` for a
    /// component, if any. This is the dedup query the trigger runs before
    /// creating a new one.
    fn find_open(
        &self,
        component_id: ComponentId,
        kind: NotificationKind,
    ) -> DomainResult<Option<Notification>>;
}

impl<S> NotificationStore for Arc<S>
where
    S: NotificationStore + ?Sized,
{
    fn publish(&self, notification: Notification) -> DomainResult<Notification> {
        (**self).publish(notification)
    }

    fn list(&self, limit: usize) -> DomainResult<Vec<Notification>> {
        (**self).list(limit)
    }

    fn unread_count(&self, actor: ActorId) -> DomainResult<usize> {
        (**self).unread_count(actor)
    }

    fn mark_read(&self, id: NotificationId, actor: ActorId) -> DomainResult<()> {
        (**self).mark_read(id, actor)
    }

    fn mark_all_read(&self, actor: ActorId) -> DomainResult<usize> {
        (**self).mark_all_read(actor)
    }

    fn delete(&self, id: NotificationId) -> DomainResult<()> {
        (**self).delete(id)
    }

    fn find_open(
        &self,
        component_id: ComponentId,
        kind: NotificationKind,
    ) -> DomainResult<Option<Notification>> {
        (**self).find_open(component_id, kind)
    }
}

/// In-memory notification feed.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    inner: RwLock<Feed>,
}

#[derive(Debug, Default)]
struct Feed {
    /// Creation order; listing reverses it.
    order: Vec<NotificationId>,
    items: HashMap<NotificationId, Notification>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::conflict("notification store lock poisoned")
}

impl NotificationStore for InMemoryNotificationStore {
    fn publish(&self, notification: Notification) -> DomainResult<Notification> {
        let mut feed = self.inner.write().map_err(|_| poisoned())?;
        feed.order.push(notification.id);
        feed.items.insert(notification.id, notification.clone());
        Ok(notification)
    }

    fn list(&self, limit: usize) -> DomainResult<Vec<Notification>> {
        let feed = self.inner.read().map_err(|_| poisoned())?;
        Ok(feed
            .order
            .iter()
            .rev()
            .filter_map(|id| feed.items.get(id))
            .take(limit)
            .cloned()
            .collect())
    }

    fn unread_count(&self, actor: ActorId) -> DomainResult<usize> {
        let feed = self.inner.read().map_err(|_| poisoned())?;
        Ok(feed
            .items
            .values()
            .filter(|n| !n.is_read_by(actor))
            .count())
    }

    fn mark_read(&self, id: NotificationId, actor: ActorId) -> DomainResult<()> {
        let mut feed = self.inner.write().map_err(|_| poisoned())?;
        let notification = feed.items.get_mut(&id).ok_or(DomainError::NotFound)?;
        notification.read_by.insert(actor);
        Ok(())
    }

    fn mark_all_read(&self, actor: ActorId) -> DomainResult<usize> {
        let mut feed = self.inner.write().map_err(|_| poisoned())?;
        let mut marked = 0;
        for notification in feed.items.values_mut() {
            if notification.read_by.insert(actor) {
                marked += 1;
            }
        }
        Ok(marked)
    }

    fn delete(&self, id: NotificationId) -> DomainResult<()> {
        let mut feed = self.inner.write().map_err(|_| poisoned())?;
        if feed.items.remove(&id).is_none() {
            return Err(DomainError::NotFound);
        }
        feed.order.retain(|other| *other != id);
        Ok(())
    }

    fn find_open(
        &self,
        component_id: ComponentId,
        kind: NotificationKind,
    ) -> DomainResult<Option<Notification>> {
        let feed = self.inner.read().map_err(|_| poisoned())?;
        Ok(feed
            .items
            .values()
            .find(|n| n.component_id == Some(component_id) && n.kind == kind && n.is_open())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Priority;
    use chrono::Utc;

    fn sample(kind: NotificationKind, component_id: Option<ComponentId>) -> Notification {
        Notification::new(
            kind,
            Priority::Medium,
            "title",
            "message",
            component_id,
            Utc::now(),
        )
    }

    #[test]
    fn list_is_newest_first_and_bounded() {
        let store = InMemoryNotificationStore::new();
        let a = store.publish(sample(NotificationKind::System, None)).unwrap();
        let b = store.publish(sample(NotificationKind::System, None)).unwrap();
        let c = store.publish(sample(NotificationKind::System, None)).unwrap();

        let page = store.list(2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, c.id);
        assert_eq!(page[1].id, b.id);
        assert_eq!(store.list(10).unwrap().last().unwrap().id, a.id);
    }

    #[test]
    fn unread_count_is_per_actor() {
        let store = InMemoryNotificationStore::new();
        let n = store.publish(sample(NotificationKind::System, None)).unwrap();
        // External event sources publish through the same feed.
        store
            .publish(sample(NotificationKind::InventoryUpdate, Some(ComponentId::new())))
            .unwrap();

        let alice = ActorId::new();
        let bob = ActorId::new();

        store.mark_read(n.id, alice).unwrap();
        assert_eq!(store.unread_count(alice).unwrap(), 1);
        assert_eq!(store.unread_count(bob).unwrap(), 2);

        assert_eq!(store.mark_all_read(bob).unwrap(), 2);
        assert_eq!(store.unread_count(bob).unwrap(), 0);
        // Marking again is a no-op.
        assert_eq!(store.mark_all_read(bob).unwrap(), 0);
    }

    #[test]
    fn find_open_ignores_read_and_deleted_items() {
        let store = InMemoryNotificationStore::new();
        let component_id = ComponentId::new();
        let n = store
            .publish(sample(NotificationKind::LowStock, Some(component_id)))
            .unwrap();

        assert!(store
            .find_open(component_id, NotificationKind::LowStock)
            .unwrap()
            .is_some());

        store.mark_read(n.id, ActorId::new()).unwrap();
        assert!(store
            .find_open(component_id, NotificationKind::LowStock)
            .unwrap()
            .is_none());

        let n2 = store
            .publish(sample(NotificationKind::LowStock, Some(component_id)))
            .unwrap();
        store.delete(n2.id).unwrap();
        assert!(store
            .find_open(component_id, NotificationKind::LowStock)
            .unwrap()
            .is_none());
    }

    #[test]
    fn delete_missing_notification_is_not_found() {
        let store = InMemoryNotificationStore::new();
        assert_eq!(
            store.delete(NotificationId::new()).unwrap_err(),
            DomainError::NotFound
        );
    }
}
