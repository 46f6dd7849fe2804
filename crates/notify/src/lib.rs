//! Notification feed: model, store contract, and the edge-triggered
//! stock-transition trigger.
//!
//! Delivery is pull-based; poll cadence is a caller concern.

pub mod notification;
pub mod store;
pub mod trigger;

pub use notification::{Notification, NotificationKind, Priority};
pub use store::{InMemoryNotificationStore, NotificationStore};
pub use trigger::NotificationTrigger;
