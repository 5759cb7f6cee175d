//! Persistence for repair orders.
//!
//! The [`RepairOrderStore`] trait is the only thing the domain layer sees;
//! [`PostgresRepairOrderStore`] is the production adapter and
//! [`InMemoryRepairOrderStore`] backs tests and database-less runs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryRepairOrderStore;
pub use postgres::PostgresRepairOrderStore;
pub use record::{ChildTable, CostRecord, DownPaymentRecord, PasscodeRecord, RepairOrderRecord};
pub use store::RepairOrderStore;
