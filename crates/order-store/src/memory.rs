use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{
    DamageTypeId, OrderId, PaymentMethodId, PhoneConditionId, PhoneEquipmentId, SalesPersonId,
    StoreId, TechnicianId,
};
use tokio::sync::RwLock;

use crate::{ChildTable, RepairOrderRecord, RepairOrderStore, Result, StoreError};

#[derive(Debug, Default)]
struct Lookups {
    technicians: HashMap<TechnicianId, StoreId>,
    sales_people: HashMap<SalesPersonId, StoreId>,
    payment_methods: HashMap<PaymentMethodId, StoreId>,
    damage_types: HashMap<DamageTypeId, (StoreId, String)>,
    phone_conditions: HashMap<PhoneConditionId, (StoreId, String)>,
    phone_equipments: HashMap<PhoneEquipmentId, (StoreId, String)>,
}

/// In-memory repair-order store for testing.
///
/// Mirrors the PostgreSQL adapter: store-scoped lookups, a store-scoped
/// slug uniqueness check, and all-or-nothing order writes. A child table can
/// be configured to fail so callers can observe the rollback behaviour.
#[derive(Clone, Default)]
pub struct InMemoryRepairOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, RepairOrderRecord>>>,
    lookups: Arc<RwLock<Lookups>>,
    fail_on: Arc<RwLock<Option<ChildTable>>>,
    short_write_on: Arc<RwLock<Option<ChildTable>>>,
    unavailable: Arc<RwLock<bool>>,
    create_calls: Arc<AtomicUsize>,
}

impl InMemoryRepairOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns how many times `create_repair_order` was invoked, including
    /// failed attempts.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write to `table` fail.
    pub async fn set_fail_on(&self, table: Option<ChildTable>) {
        *self.fail_on.write().await = table;
    }

    /// Makes every subsequent write to `table` report one row fewer than it
    /// was given, as a bulk insert that silently dropped a row would.
    pub async fn set_short_write_on(&self, table: Option<ChildTable>) {
        *self.short_write_on.write().await = table;
    }

    /// Makes every operation fail with `StoreError::Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    pub async fn add_technician(&self, store_id: StoreId, id: TechnicianId) {
        self.lookups.write().await.technicians.insert(id, store_id);
    }

    pub async fn add_sales_person(&self, store_id: StoreId, id: SalesPersonId) {
        self.lookups.write().await.sales_people.insert(id, store_id);
    }

    pub async fn add_payment_method(&self, store_id: StoreId, id: PaymentMethodId) {
        self.lookups
            .write()
            .await
            .payment_methods
            .insert(id, store_id);
    }

    pub async fn add_damage_type(&self, store_id: StoreId, id: DamageTypeId, name: &str) {
        self.lookups
            .write()
            .await
            .damage_types
            .insert(id, (store_id, name.to_string()));
    }

    pub async fn add_phone_condition(&self, store_id: StoreId, id: PhoneConditionId, name: &str) {
        self.lookups
            .write()
            .await
            .phone_conditions
            .insert(id, (store_id, name.to_string()));
    }

    pub async fn add_phone_equipment(&self, store_id: StoreId, id: PhoneEquipmentId, name: &str) {
        self.lookups
            .write()
            .await
            .phone_equipments
            .insert(id, (store_id, name.to_string()));
    }

    async fn ensure_available(&self) -> Result<()> {
        if *self.unavailable.read().await {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

fn names_in_store<K: Eq + std::hash::Hash>(
    table: &HashMap<K, (StoreId, String)>,
    store_id: StoreId,
    ids: &[K],
) -> Vec<String> {
    ids.iter()
        .filter_map(|id| table.get(id))
        .filter(|(owner, _)| *owner == store_id)
        .map(|(_, name)| name.clone())
        .collect()
}

#[async_trait]
impl RepairOrderStore for InMemoryRepairOrderStore {
    async fn create_repair_order(&self, order: &RepairOrderRecord) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_available().await?;

        let fail_on = *self.fail_on.read().await;
        let short_write_on = *self.short_write_on.read().await;
        let mut orders = self.orders.write().await;

        if orders
            .values()
            .any(|o| o.store_id == order.store_id && o.slug == order.slug)
        {
            return Err(StoreError::SlugConflict {
                store_id: order.store_id,
                slug: order.slug.clone(),
            });
        }

        // Nothing is visible until every child collection has been accepted.
        for table in ChildTable::ALL {
            if fail_on == Some(table) && order.child_len(table) > 0 {
                return Err(StoreError::Unavailable(format!("write to {table} failed")));
            }
            let expected = order.child_len(table) as u64;
            if short_write_on == Some(table) && expected > 0 {
                return Err(StoreError::RowCountMismatch {
                    table,
                    expected,
                    actual: expected - 1,
                });
            }
        }

        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_repair_order(
        &self,
        store_id: StoreId,
        order_id: OrderId,
    ) -> Result<Option<RepairOrderRecord>> {
        self.ensure_available().await?;
        let orders = self.orders.read().await;
        Ok(orders
            .get(&order_id)
            .filter(|o| o.store_id == store_id)
            .cloned())
    }

    async fn is_slug_taken(&self, store_id: StoreId, slug: &str) -> Result<bool> {
        self.ensure_available().await?;
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .any(|o| o.store_id == store_id && o.slug == slug))
    }

    async fn get_damage_names_by_ids(
        &self,
        store_id: StoreId,
        ids: &[DamageTypeId],
    ) -> Result<Vec<String>> {
        self.ensure_available().await?;
        let lookups = self.lookups.read().await;
        Ok(names_in_store(&lookups.damage_types, store_id, ids))
    }

    async fn get_phone_condition_names_by_ids(
        &self,
        store_id: StoreId,
        ids: &[PhoneConditionId],
    ) -> Result<Vec<String>> {
        self.ensure_available().await?;
        let lookups = self.lookups.read().await;
        Ok(names_in_store(&lookups.phone_conditions, store_id, ids))
    }

    async fn get_phone_equipment_names_by_ids(
        &self,
        store_id: StoreId,
        ids: &[PhoneEquipmentId],
    ) -> Result<Vec<String>> {
        self.ensure_available().await?;
        let lookups = self.lookups.read().await;
        Ok(names_in_store(&lookups.phone_equipments, store_id, ids))
    }

    async fn does_technician_exist(&self, store_id: StoreId, id: TechnicianId) -> Result<bool> {
        self.ensure_available().await?;
        let lookups = self.lookups.read().await;
        Ok(lookups.technicians.get(&id) == Some(&store_id))
    }

    async fn does_sales_person_exist(&self, store_id: StoreId, id: SalesPersonId) -> Result<bool> {
        self.ensure_available().await?;
        let lookups = self.lookups.read().await;
        Ok(lookups.sales_people.get(&id) == Some(&store_id))
    }

    async fn does_payment_method_exist(
        &self,
        store_id: StoreId,
        id: PaymentMethodId,
    ) -> Result<bool> {
        self.ensure_available().await?;
        let lookups = self.lookups.read().await;
        Ok(lookups.payment_methods.get(&id) == Some(&store_id))
    }
}
