//! Store-scoped referential integrity checks.

use std::collections::HashSet;
use std::hash::Hash;

use common::{
    DamageTypeId, PaymentMethodId, PhoneConditionId, PhoneEquipmentId, SalesPersonId, StoreId,
    TechnicianId,
};
use order_store::RepairOrderStore;

use crate::error::{DomainError, Reference};

/// Verifies that the entities an order refers to exist in the caller's
/// store.
///
/// "Not found" and "belongs to another store" are indistinguishable here;
/// both surface as [`DomainError::ReferenceNotFound`]. Store failures are
/// passed through as [`DomainError::Store`].
#[derive(Clone)]
pub struct ReferenceChecker<S> {
    store: S,
}

impl<S: RepairOrderStore> ReferenceChecker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Checks the single-valued references in a fixed order: technician,
    /// then sales person, then payment method (only when given). The first
    /// missing one is reported.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_references(
        &self,
        store_id: StoreId,
        technician_id: TechnicianId,
        sales_person_id: SalesPersonId,
        payment_method_id: Option<PaymentMethodId>,
    ) -> Result<(), DomainError> {
        if !self
            .store
            .does_technician_exist(store_id, technician_id)
            .await?
        {
            return Err(DomainError::ReferenceNotFound(Reference::Technician));
        }

        if !self
            .store
            .does_sales_person_exist(store_id, sales_person_id)
            .await?
        {
            return Err(DomainError::ReferenceNotFound(Reference::SalesPerson));
        }

        if let Some(payment_method_id) = payment_method_id
            && !self
                .store
                .does_payment_method_exist(store_id, payment_method_id)
                .await?
        {
            return Err(DomainError::ReferenceNotFound(Reference::PaymentMethod));
        }

        Ok(())
    }

    /// Resolves damage type IDs to names, all or nothing.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn resolve_damages(
        &self,
        store_id: StoreId,
        ids: &[DamageTypeId],
    ) -> Result<Vec<String>, DomainError> {
        let ids = dedup(ids);
        let names = self.store.get_damage_names_by_ids(store_id, &ids).await?;
        complete(names, ids.len(), Reference::DamageTypes)
    }

    /// Resolves phone condition IDs to names, all or nothing.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn resolve_phone_conditions(
        &self,
        store_id: StoreId,
        ids: &[PhoneConditionId],
    ) -> Result<Vec<String>, DomainError> {
        let ids = dedup(ids);
        let names = self
            .store
            .get_phone_condition_names_by_ids(store_id, &ids)
            .await?;
        complete(names, ids.len(), Reference::PhoneConditions)
    }

    /// Resolves phone equipment IDs to names, all or nothing.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn resolve_phone_equipments(
        &self,
        store_id: StoreId,
        ids: &[PhoneEquipmentId],
    ) -> Result<Vec<String>, DomainError> {
        let ids = dedup(ids);
        let names = self
            .store
            .get_phone_equipment_names_by_ids(store_id, &ids)
            .await?;
        complete(names, ids.len(), Reference::PhoneEquipments)
    }
}

/// Drops repeated IDs, keeping the first occurrence of each.
fn dedup<T: Copy + Eq + Hash>(ids: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn complete(
    names: Vec<String>,
    requested: usize,
    reference: Reference,
) -> Result<Vec<String>, DomainError> {
    if names.len() < requested {
        return Err(DomainError::ReferenceNotFound(reference));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use order_store::{InMemoryRepairOrderStore, StoreError};

    use super::*;

    struct Fixture {
        store: InMemoryRepairOrderStore,
        checker: ReferenceChecker<InMemoryRepairOrderStore>,
        store_id: StoreId,
        technician: TechnicianId,
        sales: SalesPersonId,
        method: PaymentMethodId,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryRepairOrderStore::new();
        let store_id = StoreId::new();
        let technician = TechnicianId::new();
        let sales = SalesPersonId::new();
        let method = PaymentMethodId::new();
        store.add_technician(store_id, technician).await;
        store.add_sales_person(store_id, sales).await;
        store.add_payment_method(store_id, method).await;

        Fixture {
            checker: ReferenceChecker::new(store.clone()),
            store,
            store_id,
            technician,
            sales,
            method,
        }
    }

    #[tokio::test]
    async fn test_all_references_present() {
        let f = fixture().await;
        f.checker
            .ensure_references(f.store_id, f.technician, f.sales, Some(f.method))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_technician_is_reported_first() {
        let f = fixture().await;
        let result = f
            .checker
            .ensure_references(
                f.store_id,
                TechnicianId::new(),
                SalesPersonId::new(),
                Some(PaymentMethodId::new()),
            )
            .await;
        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound(Reference::Technician))
        ));
    }

    #[tokio::test]
    async fn test_sales_person_before_payment_method() {
        let f = fixture().await;
        let result = f
            .checker
            .ensure_references(
                f.store_id,
                f.technician,
                SalesPersonId::new(),
                Some(PaymentMethodId::new()),
            )
            .await;
        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound(Reference::SalesPerson))
        ));

        let result = f
            .checker
            .ensure_references(f.store_id, f.technician, f.sales, Some(PaymentMethodId::new()))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound(Reference::PaymentMethod))
        ));
    }

    #[tokio::test]
    async fn test_payment_method_skipped_without_down_payment() {
        let f = fixture().await;
        f.checker
            .ensure_references(f.store_id, f.technician, f.sales, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reference_from_other_store_is_missing() {
        let f = fixture().await;
        let other = StoreId::new();
        let result = f
            .checker
            .ensure_references(other, f.technician, f.sales, None)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound(Reference::Technician))
        ));
    }

    #[tokio::test]
    async fn test_resolve_damages_all_or_nothing() {
        let f = fixture().await;
        let known = DamageTypeId::new();
        f.store
            .add_damage_type(f.store_id, known, "Cracked screen")
            .await;

        let names = f.checker.resolve_damages(f.store_id, &[known]).await.unwrap();
        assert_eq!(names, vec!["Cracked screen".to_string()]);

        let result = f
            .checker
            .resolve_damages(f.store_id, &[known, DamageTypeId::new()])
            .await;
        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound(Reference::DamageTypes))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_ids_resolve_once() {
        let f = fixture().await;
        let case = PhoneEquipmentId::new();
        f.store.add_phone_equipment(f.store_id, case, "Case").await;

        let names = f
            .checker
            .resolve_phone_equipments(f.store_id, &[case, case])
            .await
            .unwrap();
        assert_eq!(names, vec!["Case".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_lists_resolve_to_nothing() {
        let f = fixture().await;
        let names = f
            .checker
            .resolve_phone_conditions(f.store_id, &[])
            .await
            .unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_condition_from_other_store_is_missing() {
        let f = fixture().await;
        let scratched = PhoneConditionId::new();
        f.store
            .add_phone_condition(StoreId::new(), scratched, "Scratched")
            .await;

        let result = f
            .checker
            .resolve_phone_conditions(f.store_id, &[scratched])
            .await;
        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound(Reference::PhoneConditions))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_missing_reference() {
        let f = fixture().await;
        f.store.set_unavailable(true).await;

        let result = f
            .checker
            .ensure_references(f.store_id, f.technician, f.sales, None)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Store(StoreError::Unavailable(_)))
        ));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
