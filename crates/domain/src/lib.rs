//! Domain layer for the repair-order system.
//!
//! This crate provides:
//! - Value objects and the `Order` aggregate with its creation invariants
//! - Store-unique slug generation
//! - Tenant-scoped referential integrity checks
//! - `RepairOrderService`, which turns a creation request into a persisted order

pub mod error;
pub mod provider;
pub mod repair_order;

pub use error::{DomainError, Reference};
pub use provider::{
    FixedClock, OrderSlugProvider, PathLocationProvider, ResourceLocationProvider, SystemClock,
    TimeProvider,
};
pub use repair_order::{
    CreateRepairOrder, CreatedRepairOrder, Damage, Defect, DownPaymentInput, MAX_SLUG_ATTEMPTS,
    Money, NewOrder, Order, OrderCost, OrderError, OrderOptions, OrderPayment, OrderPhoto,
    OrderStatus, PasscodeInput, PhoneCondition, PhoneEquipment, PhoneNumber, PhoneRegion,
    PhoneSecurity, RandomSlugGenerator, ReferenceChecker, RepairOrderService, Slug,
};
