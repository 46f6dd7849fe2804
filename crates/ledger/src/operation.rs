use serde::{Deserialize, Serialize};

use crate::entry::{LedgerAction, SupplierInfo};

/// Operation: add stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InwardStock {
    pub quantity: u32,
    pub reason: String,
    pub notes: Option<String>,
    pub batch_id: Option<String>,
    pub supplier_info: Option<SupplierInfo>,
}

/// Operation: remove stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutwardStock {
    pub quantity: u32,
    pub reason: String,
    pub notes: Option<String>,
    pub project_name: Option<String>,
}

/// Operation: set the exact quantity (physical-count correction).
///
/// The target is absolute and may move the quantity in either direction;
/// this is the only operation disconnected from the current stock level,
/// which is why its reason is as mandatory as everyone else's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub quantity: u32,
    pub reason: String,
    pub notes: Option<String>,
}

/// The three quantity mutations a caller can request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InventoryOperation {
    Inward(InwardStock),
    Outward(OutwardStock),
    Adjust(AdjustStock),
}

impl InventoryOperation {
    /// The ledger action this operation records on success.
    pub fn action(&self) -> LedgerAction {
        match self {
            InventoryOperation::Inward(_) => LedgerAction::Inward,
            InventoryOperation::Outward(_) => LedgerAction::Outward,
            InventoryOperation::Adjust(_) => LedgerAction::Adjustment,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            InventoryOperation::Inward(op) => &op.reason,
            InventoryOperation::Outward(op) => &op.reason,
            InventoryOperation::Adjust(op) => &op.reason,
        }
    }
}
