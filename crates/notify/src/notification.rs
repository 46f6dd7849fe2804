use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use labstock_core::{ActorId, ComponentId, NotificationId};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    StaleStock,
    System,
    InventoryUpdate,
}

/// How urgently the feed should surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// One feed item.
///
/// Content is immutable after creation; the only mutations are read-marking
/// (adds an actor to `read_by`) and explicit deletion in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub component_id: Option<ComponentId>,
    /// Multi-reader read state: which actors have seen this.
    pub read_by: HashSet<ActorId>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
        component_id: Option<ComponentId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            priority,
            title: title.into(),
            message: message.into(),
            component_id,
            read_by: HashSet::new(),
            created_at: now,
        }
    }

    pub fn is_read_by(&self, actor: ActorId) -> bool {
        self.read_by.contains(&actor)
    }

    /// Open = not yet read by anyone. The dedup rule keys on this.
    pub fn is_open(&self) -> bool {
        self.read_by.is_empty()
    }
}
