//! Repair order commands.

use common::{DamageTypeId, PaymentMethodId, PhoneConditionId, PhoneEquipmentId, SalesPersonId, TechnicianId};
use serde::{Deserialize, Serialize};

/// Request to create a repair order.
///
/// Every ID is resolved against the actor's store; nothing in here is
/// trusted until the service has validated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRepairOrder {
    pub customer_name: String,
    pub contact_phone_number: String,
    pub phone_type: String,
    pub color: String,

    #[serde(rename = "sales_id", alias = "sales_person_id")]
    pub sales_person_id: SalesPersonId,
    pub technician_id: TechnicianId,

    /// Must be greater than zero.
    pub initial_cost: i64,

    /// At least one damage type.
    pub damage_types: Vec<DamageTypeId>,
    #[serde(default)]
    pub phone_conditions: Vec<PhoneConditionId>,
    #[serde(default)]
    pub phone_equipments: Vec<PhoneEquipmentId>,

    /// At least one photo URL.
    pub photos: Vec<String>,

    #[serde(default)]
    pub imei: Option<String>,
    #[serde(default)]
    pub parts_not_checked_yet: Option<String>,
    #[serde(default)]
    pub passcode: Option<PasscodeInput>,
    #[serde(default)]
    pub down_payment: Option<DownPaymentInput>,
}

/// Unlock code of the customer's phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasscodeInput {
    pub value: String,
    #[serde(default)]
    pub is_pattern_locked: bool,
}

/// Amount paid up front and how it was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownPaymentInput {
    pub amount: i64,
    #[serde(rename = "method", alias = "payment_method_id")]
    pub payment_method_id: PaymentMethodId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_minimal_request() {
        let sales = SalesPersonId::new();
        let technician = TechnicianId::new();
        let damage = DamageTypeId::new();
        let json = serde_json::json!({
            "customer_name": "Siti",
            "contact_phone_number": "081234567890",
            "phone_type": "iPhone 12",
            "color": "Blue",
            "sales_id": sales,
            "technician_id": technician,
            "initial_cost": 250000,
            "damage_types": [damage],
            "photos": ["https://cdn.example.com/a.jpg"],
        });

        let cmd: CreateRepairOrder = serde_json::from_value(json).unwrap();
        assert_eq!(cmd.sales_person_id, sales);
        assert_eq!(cmd.damage_types, vec![damage]);
        assert!(cmd.phone_conditions.is_empty());
        assert!(cmd.passcode.is_none());
        assert!(cmd.down_payment.is_none());
    }

    #[test]
    fn test_decode_optional_attributes() {
        let method = PaymentMethodId::new();
        let json = serde_json::json!({
            "customer_name": "Siti",
            "contact_phone_number": "081234567890",
            "phone_type": "iPhone 12",
            "color": "Blue",
            "sales_id": SalesPersonId::new(),
            "technician_id": TechnicianId::new(),
            "initial_cost": 100,
            "damage_types": [DamageTypeId::new()],
            "photos": ["https://cdn.example.com/a.jpg"],
            "imei": "356938035643809",
            "passcode": { "value": "2580", "is_pattern_locked": true },
            "down_payment": { "amount": 50, "method": method },
        });

        let cmd: CreateRepairOrder = serde_json::from_value(json).unwrap();
        assert_eq!(cmd.imei.as_deref(), Some("356938035643809"));
        assert!(cmd.passcode.unwrap().is_pattern_locked);
        assert_eq!(
            cmd.down_payment,
            Some(DownPaymentInput {
                amount: 50,
                payment_method_id: method
            })
        );
    }
}
