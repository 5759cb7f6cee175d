//! Domain error types.

use common::StoreId;
use order_store::StoreError;
use thiserror::Error;

use crate::repair_order::OrderError;

/// A foreign entity an order refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Technician,
    SalesPerson,
    PaymentMethod,
    DamageTypes,
    PhoneConditions,
    PhoneEquipments,
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Reference::Technician => "technician does not exist",
            Reference::SalesPerson => "sales person does not exist",
            Reference::PaymentMethod => "payment method does not exist",
            Reference::DamageTypes => "one or more damage types do not exist",
            Reference::PhoneConditions => "one or more phone conditions do not exist",
            Reference::PhoneEquipments => "one or more phone equipments do not exist",
        };
        f.write_str(msg)
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The order or one of its values violates an invariant.
    #[error("{0}")]
    Order(#[from] OrderError),

    /// A referenced entity is absent from the caller's store.
    #[error("{0}")]
    ReferenceNotFound(Reference),

    /// No authenticated actor accompanied the request.
    #[error("Unauthorized")]
    Unauthorized,

    /// Every generated slug collided with an existing one.
    #[error("Slug generation exhausted after {attempts} attempts in store {store_id}")]
    SlugGenerationExhausted { store_id: StoreId, attempts: usize },

    /// An error occurred in the repair-order store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// True for errors caused by the request itself rather than by the
    /// system. `AlreadySet` is a caller bug and counts as a system error.
    pub fn is_client_error(&self) -> bool {
        match self {
            DomainError::Order(OrderError::InvalidInput { .. })
            | DomainError::ReferenceNotFound(_)
            | DomainError::Unauthorized => true,
            DomainError::Order(OrderError::AlreadySet { .. })
            | DomainError::SlugGenerationExhausted { .. }
            | DomainError::Store(_) => false,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Order(OrderError::InvalidInput { .. }) => "invalid_input",
            DomainError::Order(OrderError::AlreadySet { .. }) => "already_set",
            DomainError::ReferenceNotFound(_) => "reference_not_found",
            DomainError::Unauthorized => "unauthorized",
            DomainError::SlugGenerationExhausted { .. } => "slug_exhausted",
            DomainError::Store(_) => "store",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair_order::Defect;

    #[test]
    fn reference_messages_are_client_facing() {
        let err = DomainError::ReferenceNotFound(Reference::DamageTypes);
        assert_eq!(err.to_string(), "one or more damage types do not exist");
        assert!(err.is_client_error());
    }

    #[test]
    fn already_set_is_not_a_client_error() {
        let err = DomainError::from(OrderError::AlreadySet { field: "imei" });
        assert!(!err.is_client_error());
        assert_eq!(err.kind(), "already_set");
    }

    #[test]
    fn invalid_input_is_a_client_error() {
        let err = DomainError::from(OrderError::InvalidInput {
            field: "customer_name",
            defect: Defect::Empty,
        });
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "customer name must not be empty");
    }

    #[test]
    fn store_failures_are_operational() {
        let err = DomainError::from(StoreError::Unavailable("down".to_string()));
        assert!(!err.is_client_error());
        assert_eq!(err.kind(), "store");
    }
}
