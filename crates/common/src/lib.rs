//! Shared types for the repair-order system.

pub mod actor;
pub mod types;

pub use actor::{Actor, ActorRole, ParseRoleError};
pub use types::{
    DamageTypeId, OrderId, PaymentMethodId, PhoneConditionId, PhoneEquipmentId, SalesPersonId,
    StoreId, TechnicianId, UserId,
};
