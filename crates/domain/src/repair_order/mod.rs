//! Repair order aggregate and the creation pipeline around it.

mod aggregate;
mod commands;
mod integrity;
mod phone;
mod service;
mod slug;
mod state;
mod value_objects;

pub use aggregate::{NewOrder, Order, OrderOptions};
pub use commands::{CreateRepairOrder, DownPaymentInput, PasscodeInput};
pub use integrity::ReferenceChecker;
pub use phone::{PhoneNumber, PhoneRegion};
pub use service::{CreatedRepairOrder, RepairOrderService};
pub use slug::{MAX_SLUG_ATTEMPTS, RandomSlugGenerator, Slug};
pub use state::OrderStatus;
pub use value_objects::{
    Damage, Money, OrderCost, OrderPayment, OrderPhoto, PhoneCondition, PhoneEquipment,
    PhoneSecurity,
};

use thiserror::Error;

/// What is wrong with a rejected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defect {
    Empty,
    NotDigits,
    NotPositive,
    Zero,
    ExceedsInitialCost,
    MissingReason,
    Malformed,
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Defect::Empty => "must not be empty",
            Defect::NotDigits => "must contain only digits",
            Defect::NotPositive => "must be greater than zero",
            Defect::Zero => "must not be zero",
            Defect::ExceedsInitialCost => "exceeds initial cost",
            Defect::MissingReason => "requires a reason",
            Defect::Malformed => "is malformed",
        };
        f.write_str(msg)
    }
}

/// Errors that can occur while building or amending an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// A supplied value violates an invariant.
    #[error("{} {defect}", field.replace('_', " "))]
    InvalidInput { field: &'static str, defect: Defect },

    /// A set-once attribute was assigned a second time.
    #[error("{} is already set", field.replace('_', " "))]
    AlreadySet { field: &'static str },
}

impl OrderError {
    pub(crate) fn invalid(field: &'static str, defect: Defect) -> Self {
        OrderError::InvalidInput { field, defect }
    }
}

/// Rejects empty or whitespace-only strings.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), OrderError> {
    if value.trim().is_empty() {
        return Err(OrderError::invalid(field, Defect::Empty));
    }
    Ok(())
}
