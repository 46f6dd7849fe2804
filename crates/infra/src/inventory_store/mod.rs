//! Inventory store boundary.
//!
//! This module defines the infrastructure-facing abstraction for the
//! component record and its append-only audit stream without making any
//! storage assumptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryInventoryStore;
pub use r#trait::{HistoryFilter, HistoryPage, InventoryStore, StoredEntry};
