//! Value objects for the repair order domain.

use chrono::{DateTime, Utc};
use common::PaymentMethodId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Defect, OrderError, require_non_empty};

/// Amount of money in the store's smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub fn new(amount: i64) -> Self {
        Self(amount)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

/// One cost line of an order.
///
/// The initial cost is recorded when the order is received and carries no
/// reason; every later cost must explain itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCost {
    id: Uuid,
    amount: Money,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl OrderCost {
    /// Creates the initial cost of an order.
    pub fn initial(amount: Money, created_at: DateTime<Utc>) -> Result<Self, OrderError> {
        if amount.is_zero() {
            return Err(OrderError::invalid("initial_cost", Defect::Zero));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            amount,
            reason: None,
            created_at,
        })
    }

    /// Creates a cost added after the order was received. Negative amounts
    /// are allowed (discounts, refunds of parts).
    pub fn additional(
        amount: Money,
        reason: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if amount.is_zero() {
            return Err(OrderError::invalid("cost", Defect::Zero));
        }
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(OrderError::invalid("cost", Defect::MissingReason));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            amount,
            reason: Some(reason),
            created_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_initial(&self) -> bool {
        self.reason.is_none()
    }
}

/// A payment made towards an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayment {
    amount: Money,
    payment_method_id: PaymentMethodId,
}

impl OrderPayment {
    pub fn new(amount: Money, payment_method_id: PaymentMethodId) -> Result<Self, OrderError> {
        if !amount.is_positive() {
            return Err(OrderError::invalid("down_payment", Defect::NotPositive));
        }
        Ok(Self {
            amount,
            payment_method_id,
        })
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn payment_method_id(&self) -> PaymentMethodId {
        self.payment_method_id
    }
}

/// How the customer's phone is unlocked. No lock at all is represented by
/// the absence of this value on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PhoneSecurity {
    Passcode(String),
    /// Pattern lock, written as the sequence of grid points (1-9).
    Pattern(String),
}

impl PhoneSecurity {
    pub fn new(value: impl Into<String>, is_pattern_locked: bool) -> Result<Self, OrderError> {
        let value = value.into();
        if is_pattern_locked {
            Self::pattern(value)
        } else {
            Self::passcode(value)
        }
    }

    pub fn passcode(value: impl Into<String>) -> Result<Self, OrderError> {
        let value = value.into();
        require_non_empty("passcode", &value)?;
        Ok(PhoneSecurity::Passcode(value))
    }

    pub fn pattern(value: impl Into<String>) -> Result<Self, OrderError> {
        let value = value.into();
        require_non_empty("pattern", &value)?;
        if !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(OrderError::invalid("pattern", Defect::NotDigits));
        }
        Ok(PhoneSecurity::Pattern(value))
    }

    pub fn value(&self) -> &str {
        match self {
            PhoneSecurity::Passcode(v) | PhoneSecurity::Pattern(v) => v,
        }
    }

    pub fn is_pattern_locked(&self) -> bool {
        matches!(self, PhoneSecurity::Pattern(_))
    }
}

/// Declares a non-empty, name-like value object.
macro_rules! named_value {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, OrderError> {
                let value = value.into();
                require_non_empty($field, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

named_value!(
    /// A damage the customer reported, by damage type name.
    Damage,
    "damage"
);
named_value!(
    /// Condition the phone was received in.
    PhoneCondition,
    "phone_condition"
);
named_value!(
    /// Accessory handed over with the phone.
    PhoneEquipment,
    "phone_equipment"
);
named_value!(
    /// URL of a photo taken at reception.
    OrderPhoto,
    "photo"
);
