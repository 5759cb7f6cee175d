use async_trait::async_trait;
use common::{
    DamageTypeId, OrderId, PaymentMethodId, PhoneConditionId, PhoneEquipmentId, SalesPersonId,
    StoreId, TechnicianId,
};

use crate::{RepairOrderRecord, Result};

/// Core trait for repair-order persistence.
///
/// Every read is scoped to a store: an entity that exists under another
/// store is reported exactly like one that does not exist at all.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RepairOrderStore: Send + Sync {
    /// Persists an order and all of its child collections.
    ///
    /// The write is atomic - either the order row and every child row are
    /// committed, or nothing is. Fails with `SlugConflict` if the slug is
    /// already used in the order's store.
    async fn create_repair_order(&self, order: &RepairOrderRecord) -> Result<()>;

    /// Loads an order with its child collections.
    async fn find_repair_order(
        &self,
        store_id: StoreId,
        order_id: OrderId,
    ) -> Result<Option<RepairOrderRecord>>;

    /// Returns true if an order in the store already uses the slug.
    async fn is_slug_taken(&self, store_id: StoreId, slug: &str) -> Result<bool>;

    /// Resolves damage type IDs to names. IDs that do not resolve are
    /// silently skipped, so the result may be shorter than the input.
    async fn get_damage_names_by_ids(
        &self,
        store_id: StoreId,
        ids: &[DamageTypeId],
    ) -> Result<Vec<String>>;

    /// Resolves phone condition IDs to names. Same contract as
    /// [`RepairOrderStore::get_damage_names_by_ids`].
    async fn get_phone_condition_names_by_ids(
        &self,
        store_id: StoreId,
        ids: &[PhoneConditionId],
    ) -> Result<Vec<String>>;

    /// Resolves phone equipment IDs to names. Same contract as
    /// [`RepairOrderStore::get_damage_names_by_ids`].
    async fn get_phone_equipment_names_by_ids(
        &self,
        store_id: StoreId,
        ids: &[PhoneEquipmentId],
    ) -> Result<Vec<String>>;

    async fn does_technician_exist(&self, store_id: StoreId, id: TechnicianId) -> Result<bool>;

    async fn does_sales_person_exist(&self, store_id: StoreId, id: SalesPersonId) -> Result<bool>;

    async fn does_payment_method_exist(
        &self,
        store_id: StoreId,
        id: PaymentMethodId,
    ) -> Result<bool>;
}
