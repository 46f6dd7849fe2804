use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use labstock_core::{ActorId, ComponentId, DomainError, DomainResult, EntryId};

use crate::config::LedgerConfig;
use crate::entry::{LedgerAction, LedgerEntry, SupplierInfo};
use crate::operation::InventoryOperation;
use crate::stock::StockFlags;

const CREATE_REASON: &str = "component created";
const DEFAULT_UPDATE_REASON: &str = "component details updated";

/// Input for creating a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDraft {
    pub id: ComponentId,
    pub name: String,
    pub part_number: String,
    pub location_bin: Option<String>,
    pub quantity: u32,
    pub critical_low_threshold: u32,
}

/// Partial update of a component's descriptive fields and threshold.
///
/// Quantity is absent on purpose: quantity only moves through ledger
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComponentUpdate {
    pub name: Option<String>,
    pub part_number: Option<String>,
    pub location_bin: Option<String>,
    pub critical_low_threshold: Option<u32>,
    pub reason: Option<String>,
}

impl ComponentUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.part_number.is_none()
            && self.location_bin.is_none()
            && self.critical_low_threshold.is_none()
    }
}

/// A tracked inventory component.
///
/// The quantity field is a cache of the fold over the component's ledger
/// entries; the ledger is the source of truth. Writes go exclusively
/// through the ledger engine, which is why the fields are private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    id: ComponentId,
    name: String,
    part_number: String,
    location_bin: Option<String>,

    quantity: u32,
    critical_low_threshold: u32,

    last_outward_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    /// Derived once per mutation; recomputable on demand.
    flags: StockFlags,

    /// Count of committed ledger entries (optimistic concurrency token).
    version: u64,
}

impl Component {
    /// Create a component together with its `created` ledger entry.
    pub fn create(
        draft: ComponentDraft,
        actor_id: ActorId,
        now: DateTime<Utc>,
        config: &LedgerConfig,
    ) -> DomainResult<(Self, LedgerEntry)> {
        if draft.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if draft.part_number.trim().is_empty() {
            return Err(DomainError::validation("part_number cannot be empty"));
        }

        let flags = StockFlags::compute(
            draft.quantity,
            draft.critical_low_threshold,
            now,
            now,
            config.stale_window,
        );

        let component = Self {
            id: draft.id,
            name: draft.name,
            part_number: draft.part_number,
            location_bin: draft.location_bin,
            quantity: draft.quantity,
            critical_low_threshold: draft.critical_low_threshold,
            last_outward_at: now,
            created_at: now,
            updated_at: now,
            flags,
            version: 1,
        };

        let entry = LedgerEntry {
            id: EntryId::new(),
            component_id: component.id,
            action: LedgerAction::Created,
            previous_quantity: 0,
            new_quantity: component.quantity,
            quantity_changed: i64::from(component.quantity),
            reason: CREATE_REASON.to_string(),
            project_name: None,
            notes: None,
            batch_id: None,
            supplier_info: None,
            actor_id,
            created_at: now,
        };

        Ok((component, entry))
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn part_number(&self) -> &str {
        &self.part_number
    }

    pub fn location_bin(&self) -> Option<&str> {
        self.location_bin.as_deref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn critical_low_threshold(&self) -> u32 {
        self.critical_low_threshold
    }

    pub fn last_outward_at(&self) -> DateTime<Utc> {
        self.last_outward_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Flags as cached at the last mutation (or sweep).
    pub fn flags(&self) -> StockFlags {
        self.flags
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Recompute flags against a given clock without touching state.
    pub fn flags_at(&self, now: DateTime<Utc>, config: &LedgerConfig) -> StockFlags {
        StockFlags::compute(
            self.quantity,
            self.critical_low_threshold,
            self.last_outward_at,
            now,
            config.stale_window,
        )
    }

    /// Decide the ledger entry for a quantity mutation.
    ///
    /// Pure: validates the operation against current state and produces the
    /// audit record. State evolution is done through [`Component::apply`].
    pub fn handle(
        &self,
        operation: &InventoryOperation,
        actor_id: ActorId,
        now: DateTime<Utc>,
    ) -> DomainResult<LedgerEntry> {
        if operation.reason().trim().is_empty() {
            return Err(DomainError::validation("reason cannot be empty"));
        }

        let (new_quantity, project_name, notes, batch_id, supplier_info) = match operation {
            InventoryOperation::Inward(op) => {
                if op.quantity == 0 {
                    return Err(DomainError::validation(
                        "inward quantity must be a positive integer",
                    ));
                }
                let new = self.quantity.checked_add(op.quantity).ok_or_else(|| {
                    DomainError::validation("inward quantity overflows stock counter")
                })?;
                (
                    new,
                    None,
                    op.notes.clone(),
                    op.batch_id.clone(),
                    normalize_supplier(op.supplier_info.clone()),
                )
            }
            InventoryOperation::Outward(op) => {
                if op.quantity == 0 {
                    return Err(DomainError::validation(
                        "outward quantity must be a positive integer",
                    ));
                }
                if op.quantity > self.quantity {
                    return Err(DomainError::insufficient_stock(self.quantity, op.quantity));
                }
                (
                    self.quantity - op.quantity,
                    op.project_name.clone(),
                    op.notes.clone(),
                    None,
                    None,
                )
            }
            InventoryOperation::Adjust(op) => (op.quantity, None, op.notes.clone(), None, None),
        };

        Ok(LedgerEntry {
            id: EntryId::new(),
            component_id: self.id,
            action: operation.action(),
            previous_quantity: self.quantity,
            new_quantity,
            quantity_changed: i64::from(new_quantity) - i64::from(self.quantity),
            reason: operation.reason().trim().to_string(),
            project_name,
            notes,
            batch_id,
            supplier_info,
            actor_id,
            created_at: now,
        })
    }

    /// Evolve state from a committed quantity-mutation entry.
    ///
    /// `last_outward_at` only moves forward, and only on outward entries.
    pub fn apply(&mut self, entry: &LedgerEntry, config: &LedgerConfig) {
        self.quantity = entry.new_quantity;
        if entry.action == LedgerAction::Outward && entry.created_at > self.last_outward_at {
            self.last_outward_at = entry.created_at;
        }
        self.updated_at = entry.created_at;
        self.version += 1;
        self.flags = self.flags_at(entry.created_at, config);
    }

    /// Decide the next state and `updated` entry for a descriptive update.
    ///
    /// Quantity is untouched; the entry records the change with a zero delta
    /// so the audit trail stays complete.
    pub fn update(
        &self,
        changes: &ComponentUpdate,
        actor_id: ActorId,
        now: DateTime<Utc>,
        config: &LedgerConfig,
    ) -> DomainResult<(Self, LedgerEntry)> {
        if changes.is_empty() {
            return Err(DomainError::validation("update contains no changes"));
        }
        if let Some(name) = &changes.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }
        if let Some(part_number) = &changes.part_number {
            if part_number.trim().is_empty() {
                return Err(DomainError::validation("part_number cannot be empty"));
            }
        }
        let reason = changes
            .reason
            .clone()
            .unwrap_or_else(|| DEFAULT_UPDATE_REASON.to_string());
        if reason.trim().is_empty() {
            return Err(DomainError::validation("reason cannot be empty"));
        }

        let mut next = self.clone();
        if let Some(name) = &changes.name {
            next.name = name.clone();
        }
        if let Some(part_number) = &changes.part_number {
            next.part_number = part_number.clone();
        }
        if let Some(location_bin) = &changes.location_bin {
            next.location_bin = Some(location_bin.clone());
        }
        if let Some(threshold) = changes.critical_low_threshold {
            next.critical_low_threshold = threshold;
        }
        next.updated_at = now;
        next.version += 1;
        // Threshold changes can move the low-stock flag without a quantity
        // mutation, so flags are refreshed here too.
        next.flags = next.flags_at(now, config);

        let entry = LedgerEntry {
            id: EntryId::new(),
            component_id: self.id,
            action: LedgerAction::Updated,
            previous_quantity: self.quantity,
            new_quantity: self.quantity,
            quantity_changed: 0,
            reason,
            project_name: None,
            notes: None,
            batch_id: None,
            supplier_info: None,
            actor_id,
            created_at: now,
        };

        Ok((next, entry))
    }

    /// Decide the tombstone entry for component deletion.
    ///
    /// Prior entries are never physically removed; deletion is one more
    /// append.
    pub fn tombstone(
        &self,
        reason: &str,
        actor_id: ActorId,
        now: DateTime<Utc>,
    ) -> DomainResult<LedgerEntry> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("reason cannot be empty"));
        }

        Ok(LedgerEntry {
            id: EntryId::new(),
            component_id: self.id,
            action: LedgerAction::Deleted,
            previous_quantity: self.quantity,
            new_quantity: self.quantity,
            quantity_changed: 0,
            reason: reason.trim().to_string(),
            project_name: None,
            notes: None,
            batch_id: None,
            supplier_info: None,
            actor_id,
            created_at: now,
        })
    }

    /// Replace cached flags (stale sweep). Does not bump the version: flags
    /// are derived state, not an audited mutation.
    pub fn refresh_flags(&mut self, flags: StockFlags, now: DateTime<Utc>) {
        self.flags = flags;
        self.updated_at = now;
    }
}

fn normalize_supplier(info: Option<SupplierInfo>) -> Option<SupplierInfo> {
    info.filter(|i| !i.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::verify_and_replay;
    use crate::operation::{AdjustStock, InwardStock, OutwardStock};
    use proptest::prelude::*;

    fn test_actor() -> ActorId {
        ActorId::new()
    }

    fn test_config() -> LedgerConfig {
        LedgerConfig::default()
    }

    fn test_draft(quantity: u32, threshold: u32) -> ComponentDraft {
        ComponentDraft {
            id: ComponentId::new(),
            name: "10k resistor".to_string(),
            part_number: "RES-10K-0805".to_string(),
            location_bin: Some("A3".to_string()),
            quantity,
            critical_low_threshold: threshold,
        }
    }

    fn created(quantity: u32, threshold: u32) -> Component {
        Component::create(test_draft(quantity, threshold), test_actor(), Utc::now(), &test_config())
            .unwrap()
            .0
    }

    fn inward(quantity: u32) -> InventoryOperation {
        InventoryOperation::Inward(InwardStock {
            quantity,
            reason: "new purchase".to_string(),
            notes: None,
            batch_id: None,
            supplier_info: None,
        })
    }

    fn outward(quantity: u32) -> InventoryOperation {
        InventoryOperation::Outward(OutwardStock {
            quantity,
            reason: "used in project".to_string(),
            notes: None,
            project_name: None,
        })
    }

    fn adjust(quantity: u32) -> InventoryOperation {
        InventoryOperation::Adjust(AdjustStock {
            quantity,
            reason: "physical count correction".to_string(),
            notes: None,
        })
    }

    #[test]
    fn create_emits_created_entry_with_initial_quantity() {
        let (component, entry) =
            Component::create(test_draft(10, 5), test_actor(), Utc::now(), &test_config()).unwrap();

        assert_eq!(component.quantity(), 10);
        assert_eq!(component.version(), 1);
        assert_eq!(entry.action, LedgerAction::Created);
        assert_eq!(entry.previous_quantity, 0);
        assert_eq!(entry.new_quantity, 10);
        assert_eq!(entry.quantity_changed, 10);
        assert!(entry.is_balanced());
    }

    #[test]
    fn create_rejects_blank_name() {
        let mut draft = test_draft(0, 0);
        draft.name = "   ".to_string();
        let err = Component::create(draft, test_actor(), Utc::now(), &test_config()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn inward_adds_and_records_delta() {
        let component = created(10, 5);
        let entry = component.handle(&inward(20), test_actor(), Utc::now()).unwrap();

        assert_eq!(entry.action, LedgerAction::Inward);
        assert_eq!(entry.previous_quantity, 10);
        assert_eq!(entry.new_quantity, 30);
        assert_eq!(entry.quantity_changed, 20);
    }

    #[test]
    fn inward_rejects_zero_quantity() {
        let component = created(10, 5);
        let err = component.handle(&inward(0), test_actor(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn outward_exceeding_on_hand_reports_available_quantity() {
        let component = created(5, 2);
        let err = component.handle(&outward(8), test_actor(), Utc::now()).unwrap_err();

        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 5,
                requested: 8
            }
        );
    }

    #[test]
    fn outward_moves_last_outward_at_forward_only() {
        let mut component = created(10, 2);
        let before = component.last_outward_at();

        let now = Utc::now() + chrono::Duration::hours(1);
        let entry = component.handle(&outward(3), test_actor(), now).unwrap();
        component.apply(&entry, &test_config());
        assert_eq!(component.last_outward_at(), now);
        assert!(component.last_outward_at() > before);

        // An inward entry must not move it.
        let later = now + chrono::Duration::hours(1);
        let entry = component.handle(&inward(1), test_actor(), later).unwrap();
        component.apply(&entry, &test_config());
        assert_eq!(component.last_outward_at(), now);
    }

    #[test]
    fn adjust_sets_absolute_target_in_both_directions() {
        let mut component = created(10, 5);

        let entry = component.handle(&adjust(42), test_actor(), Utc::now()).unwrap();
        component.apply(&entry, &test_config());
        assert_eq!(component.quantity(), 42);
        assert_eq!(entry.quantity_changed, 32);

        let entry = component.handle(&adjust(0), test_actor(), Utc::now()).unwrap();
        assert_eq!(entry.quantity_changed, -42);
        component.apply(&entry, &test_config());
        assert_eq!(component.quantity(), 0);
        assert!(component.flags().is_low_stock);
    }

    #[test]
    fn blank_reason_is_rejected_for_every_kind() {
        let component = created(10, 5);
        for op in [
            InventoryOperation::Inward(InwardStock {
                quantity: 1,
                reason: " ".to_string(),
                notes: None,
                batch_id: None,
                supplier_info: None,
            }),
            InventoryOperation::Outward(OutwardStock {
                quantity: 1,
                reason: String::new(),
                notes: None,
                project_name: None,
            }),
            InventoryOperation::Adjust(AdjustStock {
                quantity: 1,
                reason: "\t".to_string(),
                notes: None,
            }),
        ] {
            let err = component.handle(&op, test_actor(), Utc::now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[test]
    fn empty_supplier_info_is_dropped_from_the_entry() {
        let component = created(10, 5);
        let op = InventoryOperation::Inward(InwardStock {
            quantity: 5,
            reason: "restock".to_string(),
            notes: None,
            batch_id: Some("BATCH-2024-001".to_string()),
            supplier_info: Some(SupplierInfo::default()),
        });

        let entry = component.handle(&op, test_actor(), Utc::now()).unwrap();
        assert!(entry.supplier_info.is_none());
        assert_eq!(entry.batch_id.as_deref(), Some("BATCH-2024-001"));
    }

    #[test]
    fn update_refreshes_low_stock_flag_on_threshold_change() {
        let component = created(10, 5);
        assert!(!component.flags().is_low_stock);

        let changes = ComponentUpdate {
            critical_low_threshold: Some(10),
            ..ComponentUpdate::default()
        };
        let (next, entry) = component
            .update(&changes, test_actor(), Utc::now(), &test_config())
            .unwrap();

        assert!(next.flags().is_low_stock);
        assert_eq!(entry.action, LedgerAction::Updated);
        assert_eq!(entry.quantity_changed, 0);
    }

    #[test]
    fn update_with_no_changes_is_rejected() {
        let component = created(10, 5);
        let err = component
            .update(&ComponentUpdate::default(), test_actor(), Utc::now(), &test_config())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn tombstone_preserves_quantity_and_requires_reason() {
        let component = created(7, 2);
        let entry = component
            .tombstone("decommissioned", test_actor(), Utc::now())
            .unwrap();
        assert_eq!(entry.action, LedgerAction::Deleted);
        assert_eq!(entry.previous_quantity, 7);
        assert_eq!(entry.new_quantity, 7);
        assert_eq!(entry.quantity_changed, 0);

        assert!(component.tombstone("  ", test_actor(), Utc::now()).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any sequence of valid operations, replaying the
        /// produced entry log from the created entry reproduces the stored
        /// quantity exactly.
        #[test]
        fn ledger_replay_reproduces_stored_quantity(
            initial in 0u32..1_000,
            ops in prop::collection::vec((0u8..3, 1u32..500), 1..40)
        ) {
            let config = test_config();
            let actor = test_actor();
            let (mut component, created_entry) =
                Component::create(test_draft(initial, 5), actor, Utc::now(), &config).unwrap();

            let mut log = vec![created_entry];
            for (kind, quantity) in ops {
                let op = match kind {
                    0 => inward(quantity),
                    1 => outward(quantity),
                    _ => adjust(quantity),
                };
                match component.handle(&op, actor, Utc::now()) {
                    Ok(entry) => {
                        component.apply(&entry, &config);
                        log.push(entry);
                    }
                    // Rejected operations must leave no trace in the log.
                    Err(DomainError::InsufficientStock { available, .. }) => {
                        prop_assert_eq!(available, component.quantity());
                    }
                    Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
                }
            }

            let replayed = verify_and_replay(&log, component.quantity()).unwrap();
            prop_assert_eq!(replayed, component.quantity());
        }
    }
}
