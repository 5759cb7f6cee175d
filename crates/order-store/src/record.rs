//! Persisted shape of a repair order.

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentMethodId, SalesPersonId, StoreId, TechnicianId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Child collections written alongside the order row, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChildTable {
    Damages,
    PhoneConditions,
    PhoneEquipments,
    Photos,
    Costs,
}

impl ChildTable {
    /// All child tables in the order they are written.
    pub const ALL: [ChildTable; 5] = [
        ChildTable::Damages,
        ChildTable::PhoneConditions,
        ChildTable::PhoneEquipments,
        ChildTable::Photos,
        ChildTable::Costs,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            ChildTable::Damages => "repair_order_damages",
            ChildTable::PhoneConditions => "repair_order_phone_conditions",
            ChildTable::PhoneEquipments => "repair_order_phone_equipments",
            ChildTable::Photos => "repair_order_photos",
            ChildTable::Costs => "repair_order_costs",
        }
    }
}

impl std::fmt::Display for ChildTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Phone unlock information as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasscodeRecord {
    pub value: String,
    pub is_pattern_locked: bool,
}

/// Down payment taken when the order was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownPaymentRecord {
    pub amount: i64,
    pub payment_method_id: PaymentMethodId,
}

/// One cost line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRecord {
    pub id: Uuid,
    pub amount: i64,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A repair order with all of its child collections.
///
/// Written in one transaction by [`crate::RepairOrderStore::create_repair_order`]
/// and read back whole by [`crate::RepairOrderStore::find_repair_order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOrderRecord {
    pub id: OrderId,
    pub store_id: StoreId,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub contact_phone_number: String,
    pub phone_type: String,
    pub color: String,
    pub sales_person_id: SalesPersonId,
    pub technician_id: TechnicianId,
    pub imei: Option<String>,
    pub parts_not_checked_yet: Option<String>,
    pub passcode: Option<PasscodeRecord>,
    pub down_payment: Option<DownPaymentRecord>,
    pub damages: Vec<String>,
    pub phone_conditions: Vec<String>,
    pub phone_equipments: Vec<String>,
    pub photos: Vec<String>,
    pub costs: Vec<CostRecord>,
}

impl RepairOrderRecord {
    /// Number of rows a child table receives for this order.
    pub fn child_len(&self, table: ChildTable) -> usize {
        match table {
            ChildTable::Damages => self.damages.len(),
            ChildTable::PhoneConditions => self.phone_conditions.len(),
            ChildTable::PhoneEquipments => self.phone_equipments.len(),
            ChildTable::Photos => self.photos.len(),
            ChildTable::Costs => self.costs.len(),
        }
    }
}
