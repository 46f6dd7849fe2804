use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use labstock_core::{ActorId, ComponentId, DomainError, DomainResult, EntryId};

/// What a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerAction {
    Inward,
    Outward,
    Adjustment,
    Created,
    Updated,
    Deleted,
}

impl LedgerAction {
    /// Stable action name as persisted/listed (e.g. filter values).
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerAction::Inward => "inward",
            LedgerAction::Outward => "outward",
            LedgerAction::Adjustment => "adjustment",
            LedgerAction::Created => "created",
            LedgerAction::Updated => "updated",
            LedgerAction::Deleted => "deleted",
        }
    }
}

/// Purchase provenance captured on inward movements.
///
/// All sub-fields are optional; an all-empty value is normalized away before
/// it reaches an entry. `unit_cost_cents` is the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub name: Option<String>,
    pub invoice_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub unit_cost_cents: Option<i64>,
}

impl SupplierInfo {
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().is_none_or(str::is_empty)
            && self.invoice_number.as_deref().is_none_or(str::is_empty)
            && self.purchase_date.is_none()
            && self.unit_cost_cents.is_none()
    }
}

/// One audit record of a quantity mutation (immutable once created).
///
/// Entries are the source of truth for a component's quantity: replaying a
/// component's entries in order reproduces the stored quantity exactly. The
/// stored `Component.quantity` is a cache of that fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub component_id: ComponentId,
    pub action: LedgerAction,

    pub previous_quantity: u32,
    pub new_quantity: u32,
    /// Signed delta: `new_quantity - previous_quantity`.
    pub quantity_changed: i64,

    pub reason: String,
    pub project_name: Option<String>,
    pub notes: Option<String>,
    pub batch_id: Option<String>,
    pub supplier_info: Option<SupplierInfo>,

    pub actor_id: ActorId,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Whether the entry's quantities are internally consistent.
    pub fn is_balanced(&self) -> bool {
        i64::from(self.new_quantity) - i64::from(self.previous_quantity) == self.quantity_changed
    }
}

/// Replay a component's entries and verify the log against a claimed final
/// quantity.
///
/// The fold starts at 0 (creation entries carry the initial quantity as
/// their delta) and checks, per entry, that the recorded `previous_quantity`
/// matches the running value and that the entry is balanced. Any mismatch
/// means the log was tampered with or an append was lost.
pub fn verify_and_replay(entries: &[LedgerEntry], expected_quantity: u32) -> DomainResult<u32> {
    let mut quantity: u32 = 0;

    for entry in entries {
        if !entry.is_balanced() {
            return Err(DomainError::validation(format!(
                "unbalanced ledger entry {} ({} -> {}, changed {})",
                entry.id, entry.previous_quantity, entry.new_quantity, entry.quantity_changed
            )));
        }
        if entry.previous_quantity != quantity {
            return Err(DomainError::validation(format!(
                "ledger entry {} does not chain: expected previous_quantity {}, found {}",
                entry.id, quantity, entry.previous_quantity
            )));
        }
        quantity = entry.new_quantity;
    }

    if quantity != expected_quantity {
        return Err(DomainError::validation(format!(
            "replayed quantity {quantity} does not match stored quantity {expected_quantity}"
        )));
    }

    Ok(quantity)
}
