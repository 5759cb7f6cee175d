//! Repair order creation pipeline.

use std::time::Instant;

use common::{Actor, OrderId};
use order_store::{RepairOrderRecord, RepairOrderStore, StoreError};

use super::{
    CreateRepairOrder, Defect, Money, NewOrder, Order, OrderError, OrderOptions, OrderPayment,
    PhoneNumber, PhoneRegion, PhoneSecurity, RandomSlugGenerator, ReferenceChecker, Slug,
    require_non_empty,
};
use crate::error::DomainError;
use crate::provider::{
    OrderSlugProvider, PathLocationProvider, ResourceLocationProvider, SystemClock, TimeProvider,
};

/// How often persistence is retried with a fresh slug after the store
/// reported a slug conflict.
const SLUG_CONFLICT_RETRIES: usize = 3;

/// Outcome of a successful creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRepairOrder {
    pub id: OrderId,
    pub slug: Slug,
    /// Where the new order can be fetched, e.g. `/repair-orders/{id}`.
    pub location: String,
}

/// Turns creation requests into persisted orders.
///
/// Every step fails fast: the first error is returned and no later step
/// runs, so nothing is written unless the whole request is valid.
pub struct RepairOrderService<
    S,
    G = RandomSlugGenerator<S>,
    T = SystemClock,
    L = PathLocationProvider,
> {
    store: S,
    checker: ReferenceChecker<S>,
    slugs: G,
    clock: T,
    locations: L,
    region: PhoneRegion,
}

impl<S: RepairOrderStore + Clone> RepairOrderService<S> {
    /// Creates a service with random slugs, the system clock and locations
    /// relative to the server root.
    pub fn new(store: S) -> Self {
        Self::with_providers(
            store.clone(),
            RandomSlugGenerator::new(store),
            SystemClock,
            PathLocationProvider::default(),
        )
    }
}

impl<S, G, T, L> RepairOrderService<S, G, T, L>
where
    S: RepairOrderStore + Clone,
    G: OrderSlugProvider,
    T: TimeProvider,
    L: ResourceLocationProvider,
{
    pub fn with_providers(store: S, slugs: G, clock: T, locations: L) -> Self {
        Self {
            checker: ReferenceChecker::new(store.clone()),
            store,
            slugs,
            clock,
            locations,
            region: PhoneRegion::default(),
        }
    }

    /// Region used to read phone numbers written in national format.
    pub fn with_region(mut self, region: PhoneRegion) -> Self {
        self.region = region;
        self
    }

    /// Validates, persists and locates a new repair order for the actor's
    /// store.
    #[tracing::instrument(skip(self, actor, cmd), fields(store_id = tracing::field::Empty))]
    pub async fn create_repair_order(
        &self,
        actor: Option<&Actor>,
        cmd: CreateRepairOrder,
    ) -> Result<CreatedRepairOrder, DomainError> {
        let started = Instant::now();
        let result = self.create(actor, cmd).await;
        metrics::histogram!("repair_order_create_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(created) => {
                metrics::counter!("repair_orders_created_total").increment(1);
                tracing::info!(order_id = %created.id, slug = %created.slug, "repair order created");
            }
            Err(err) => {
                metrics::counter!("repair_order_create_failures_total", "kind" => err.kind())
                    .increment(1);
                if err.is_client_error() {
                    tracing::debug!(error = %err, "repair order rejected");
                } else {
                    tracing::error!(error = ?err, "failed to create repair order");
                }
            }
        }

        result
    }

    async fn create(
        &self,
        actor: Option<&Actor>,
        cmd: CreateRepairOrder,
    ) -> Result<CreatedRepairOrder, DomainError> {
        let actor = actor.ok_or(DomainError::Unauthorized)?;
        let store_id = actor.store_id;
        tracing::Span::current().record("store_id", tracing::field::display(store_id));

        let contact_number = PhoneNumber::parse(&cmd.contact_phone_number, self.region)?;

        if cmd.initial_cost <= 0 {
            return Err(OrderError::invalid("initial_cost", Defect::NotPositive).into());
        }
        if cmd.damage_types.is_empty() {
            return Err(OrderError::invalid("damages", Defect::Empty).into());
        }
        if cmd.photos.is_empty() {
            return Err(OrderError::invalid("photos", Defect::Empty).into());
        }

        let slug = self.slugs.generate(store_id).await?;

        let options = build_options(&cmd)?;

        self.checker
            .ensure_references(
                store_id,
                cmd.technician_id,
                cmd.sales_person_id,
                cmd.down_payment.map(|p| p.payment_method_id),
            )
            .await?;

        let damages = self
            .checker
            .resolve_damages(store_id, &cmd.damage_types)
            .await?;
        let phone_conditions = self
            .checker
            .resolve_phone_conditions(store_id, &cmd.phone_conditions)
            .await?;
        let phone_equipments = self
            .checker
            .resolve_phone_equipments(store_id, &cmd.phone_equipments)
            .await?;

        let new = NewOrder {
            created_at: self.clock.now(),
            slug,
            store_id,
            customer_name: cmd.customer_name,
            contact_number,
            phone_type: cmd.phone_type,
            color: cmd.color,
            sales_person_id: cmd.sales_person_id,
            technician_id: cmd.technician_id,
            initial_cost: Money::new(cmd.initial_cost),
            damages,
            phone_conditions,
            phone_equipments,
            photos: cmd.photos,
            options,
        };
        let order = self.persist(new).await?;

        Ok(CreatedRepairOrder {
            id: order.id(),
            slug: order.slug().clone(),
            location: self.locations.repair_order(order.id()),
        })
    }

    /// Builds and stores the order. A slug conflict means another request
    /// took the slug between the check and the insert; the order is rebuilt
    /// with a new slug and written again.
    async fn persist(&self, mut new: NewOrder) -> Result<Order, DomainError> {
        let mut retries = 0;
        loop {
            let order = Order::new(new.clone())?;
            match self
                .store
                .create_repair_order(&RepairOrderRecord::from(&order))
                .await
            {
                Ok(()) => return Ok(order),
                Err(StoreError::SlugConflict { slug, .. }) if retries < SLUG_CONFLICT_RETRIES => {
                    retries += 1;
                    metrics::counter!("repair_order_slug_collisions_total").increment(1);
                    tracing::warn!(%slug, retries, "slug taken at insert, regenerating");
                    new.slug = self.slugs.generate(new.store_id).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Loads an order of the actor's store. Orders of other stores are
    /// reported as absent.
    #[tracing::instrument(skip(self, actor))]
    pub async fn get_repair_order(
        &self,
        actor: Option<&Actor>,
        id: OrderId,
    ) -> Result<Option<RepairOrderRecord>, DomainError> {
        let actor = actor.ok_or(DomainError::Unauthorized)?;
        Ok(self.store.find_repair_order(actor.store_id, id).await?)
    }
}

/// Validates the optional attributes of a request one by one.
fn build_options(cmd: &CreateRepairOrder) -> Result<OrderOptions, OrderError> {
    let mut options = OrderOptions::default();

    if let Some(imei) = &cmd.imei {
        require_non_empty("imei", imei)?;
        options.imei = Some(imei.clone());
    }
    if let Some(parts) = &cmd.parts_not_checked_yet {
        require_non_empty("parts_not_checked_yet", parts)?;
        options.parts_not_checked_yet = Some(parts.clone());
    }
    if let Some(passcode) = &cmd.passcode {
        options.security = Some(PhoneSecurity::new(
            passcode.value.as_str(),
            passcode.is_pattern_locked,
        )?);
    }
    if let Some(payment) = cmd.down_payment {
        options.down_payment = Some(OrderPayment::new(
            Money::new(payment.amount),
            payment.payment_method_id,
        )?);
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use common::{ActorRole, DamageTypeId, SalesPersonId, StoreId, TechnicianId, UserId};
    use order_store::InMemoryRepairOrderStore;

    use super::*;
    use crate::error::Reference;
    use crate::provider::FixedClock;

    /// Hands out slugs in order without consulting the store.
    struct ScriptedSlugs(Mutex<Vec<&'static str>>);

    impl ScriptedSlugs {
        fn new(slugs: &[&'static str]) -> Self {
            Self(Mutex::new(slugs.to_vec()))
        }
    }

    #[async_trait]
    impl OrderSlugProvider for ScriptedSlugs {
        async fn generate(&self, _store_id: StoreId) -> Result<Slug, DomainError> {
            let next = self.0.lock().unwrap().remove(0);
            Ok(Slug::parse(next)?)
        }
    }

    struct Fixture {
        store: InMemoryRepairOrderStore,
        actor: Actor,
        cmd: CreateRepairOrder,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryRepairOrderStore::new();
        let store_id = StoreId::new();
        let technician = TechnicianId::new();
        let sales = SalesPersonId::new();
        let damage = DamageTypeId::new();
        store.add_technician(store_id, technician).await;
        store.add_sales_person(store_id, sales).await;
        store.add_damage_type(store_id, damage, "Cracked screen").await;

        Fixture {
            store,
            actor: Actor::new(UserId::new(), store_id, ActorRole::Employee),
            cmd: CreateRepairOrder {
                customer_name: "Budi".to_string(),
                contact_phone_number: "0812 3456 7890".to_string(),
                phone_type: "Pixel 7".to_string(),
                color: "White".to_string(),
                sales_person_id: sales,
                technician_id: technician,
                initial_cost: 100,
                damage_types: vec![damage],
                phone_conditions: vec![],
                phone_equipments: vec![],
                photos: vec!["https://cdn.example.com/1.jpg".to_string()],
                imei: None,
                parts_not_checked_yet: None,
                passcode: None,
                down_payment: None,
            },
        }
    }

    fn service(
        store: &InMemoryRepairOrderStore,
        slugs: &[&'static str],
    ) -> RepairOrderService<InMemoryRepairOrderStore, ScriptedSlugs, FixedClock> {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        RepairOrderService::with_providers(
            store.clone(),
            ScriptedSlugs::new(slugs),
            FixedClock(at),
            PathLocationProvider::default(),
        )
    }

    #[tokio::test]
    async fn test_create_returns_location() {
        let f = fixture().await;
        let service = service(&f.store, &["R100-10000-1000"]);

        let created = service
            .create_repair_order(Some(&f.actor), f.cmd)
            .await
            .unwrap();

        assert_eq!(created.location, format!("/repair-orders/{}", created.id));
        assert_eq!(created.slug.as_str(), "R100-10000-1000");

        let stored = service
            .get_repair_order(Some(&f.actor), created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.contact_phone_number, "+6281234567890");
        assert_eq!(stored.damages, vec!["Cracked screen".to_string()]);
        assert_eq!(
            stored.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_actor_is_unauthorized() {
        let f = fixture().await;
        let service = service(&f.store, &["R100-10000-1000"]);

        let result = service.create_repair_order(None, f.cmd).await;
        assert!(matches!(result, Err(DomainError::Unauthorized)));
        assert_eq!(f.store.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_non_positive_initial_cost_is_rejected() {
        let mut f = fixture().await;
        f.cmd.initial_cost = -5;
        let service = service(&f.store, &["R100-10000-1000"]);

        let result = service.create_repair_order(Some(&f.actor), f.cmd).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InvalidInput {
                field: "initial_cost",
                defect: Defect::NotPositive
            }))
        ));
    }

    #[tokio::test]
    async fn test_slug_conflict_on_insert_is_retried() {
        let f = fixture().await;
        let service = service(&f.store, &["R100-10000-1000", "R100-10000-1000", "R200-20000-2000"]);

        let first = service
            .create_repair_order(Some(&f.actor), f.cmd.clone())
            .await
            .unwrap();
        let second = service
            .create_repair_order(Some(&f.actor), f.cmd)
            .await
            .unwrap();

        assert_eq!(first.slug.as_str(), "R100-10000-1000");
        assert_eq!(second.slug.as_str(), "R200-20000-2000");
        assert_eq!(f.store.create_calls(), 3);
        assert_eq!(f.store.order_count().await, 2);
    }

    #[tokio::test]
    async fn test_slug_conflict_gives_up_after_retries() {
        let f = fixture().await;
        let taken = "R100-10000-1000";
        let service = service(&f.store, &[taken; 6]);
        service
            .create_repair_order(Some(&f.actor), f.cmd.clone())
            .await
            .unwrap();

        let result = service.create_repair_order(Some(&f.actor), f.cmd).await;
        assert!(matches!(
            result,
            Err(DomainError::Store(StoreError::SlugConflict { .. }))
        ));
        assert_eq!(f.store.create_calls(), 1 + 1 + SLUG_CONFLICT_RETRIES);
    }

    #[tokio::test]
    async fn test_reference_failure_never_reaches_persistence() {
        let mut f = fixture().await;
        f.cmd.technician_id = TechnicianId::new();
        let service = service(&f.store, &["R100-10000-1000"]);

        let result = service.create_repair_order(Some(&f.actor), f.cmd).await;
        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound(Reference::Technician))
        ));
        assert_eq!(f.store.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_optional_attribute_is_rejected() {
        let mut f = fixture().await;
        f.cmd.parts_not_checked_yet = Some("".to_string());
        let service = service(&f.store, &["R100-10000-1000"]);

        let result = service.create_repair_order(Some(&f.actor), f.cmd).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InvalidInput {
                field: "parts_not_checked_yet",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_other_store_cannot_read_order() {
        let f = fixture().await;
        let service = service(&f.store, &["R100-10000-1000"]);
        let created = service
            .create_repair_order(Some(&f.actor), f.cmd)
            .await
            .unwrap();

        let stranger = Actor::new(UserId::new(), StoreId::new(), ActorRole::Owner);
        let found = service
            .get_repair_order(Some(&stranger), created.id)
            .await
            .unwrap();
        assert!(found.is_none());

        let result = service.get_repair_order(None, created.id).await;
        assert!(matches!(result, Err(DomainError::Unauthorized)));
    }
}
