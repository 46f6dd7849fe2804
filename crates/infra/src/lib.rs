//! Infrastructure layer: the inventory store boundary, the ledger engine,
//! and read-side queries.

pub mod engine;
pub mod inventory_store;
pub mod queries;


pub use engine::{apply_with_retry, LedgerEngine};
pub use inventory_store::{
    HistoryFilter, HistoryPage, InMemoryInventoryStore, InventoryStore, StoredEntry,
};
pub use queries::{get_component_with_history, list_low_stock, list_stale, ComponentWithHistory};
