//! Inventory ledger domain module.
//!
//! This crate contains the business rules for the inventory ledger,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage): the `Component` record, the three quantity mutations
//! (inward/outward/adjust), the immutable `LedgerEntry` audit record, and
//! the derived stock-health flags.

pub mod component;
pub mod config;
pub mod entry;
pub mod operation;
pub mod stock;

pub use component::{Component, ComponentDraft, ComponentUpdate};
pub use config::LedgerConfig;
pub use entry::{verify_and_replay, LedgerAction, LedgerEntry, SupplierInfo};
pub use operation::{AdjustStock, InventoryOperation, InwardStock, OutwardStock};
pub use stock::StockFlags;
