//! Customer-facing order slugs.

use async_trait::async_trait;
use common::StoreId;
use order_store::RepairOrderStore;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{Defect, OrderError};
use crate::error::DomainError;
use crate::provider::OrderSlugProvider;

/// How many slugs are tried before generation gives up.
pub const MAX_SLUG_ATTEMPTS: usize = 20;

/// Segment widths of `R{3}-{5}-{4}`.
const SEGMENTS: [usize; 3] = [3, 5, 4];

/// A short, store-unique order reference such as `R123-45678-9012`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validates an existing slug.
    pub fn parse(value: &str) -> Result<Self, OrderError> {
        if value.trim().is_empty() {
            return Err(OrderError::invalid("slug", Defect::Empty));
        }

        let body = value
            .strip_prefix('R')
            .ok_or(OrderError::invalid("slug", Defect::Malformed))?;
        let parts: Vec<&str> = body.split('-').collect();
        let well_formed = parts.len() == SEGMENTS.len()
            && parts
                .iter()
                .zip(SEGMENTS)
                .all(|(part, width)| part.len() == width && part.bytes().all(|b| b.is_ascii_digit()));

        if !well_formed {
            return Err(OrderError::invalid("slug", Defect::Malformed));
        }
        Ok(Self(value.to_string()))
    }

    /// Draws a slug from `rng`. Each segment is uniform over the numbers of
    /// its width without a leading zero.
    pub fn random<R: RngCore>(rng: &mut R) -> Self {
        let [a, b, c] = SEGMENTS.map(|width| {
            let low = 10u32.pow(width as u32 - 1);
            rng.gen_range(low..low * 10)
        });
        Self(format!("R{a}-{b}-{c}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = OrderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Slug::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

/// Generates random slugs and checks them against the store.
///
/// The check and the later insert are separate round trips, so two
/// concurrent requests can still pick the same slug; the store's unique
/// constraint catches that case.
#[derive(Clone)]
pub struct RandomSlugGenerator<S, R = OsRng> {
    store: S,
    rng: R,
    max_attempts: usize,
}

impl<S: RepairOrderStore> RandomSlugGenerator<S> {
    /// Creates a generator backed by the operating system's CSPRNG.
    pub fn new(store: S) -> Self {
        Self {
            store,
            rng: OsRng,
            max_attempts: MAX_SLUG_ATTEMPTS,
        }
    }
}

impl<S: RepairOrderStore, R: RngCore + Clone + Send + Sync> RandomSlugGenerator<S, R> {
    /// Uses `rng` instead of the OS generator. Each `generate` call starts
    /// from a fresh clone of it, so a seeded generator repeats its sequence.
    pub fn with_rng(store: S, rng: R, max_attempts: usize) -> Self {
        Self {
            store,
            rng,
            max_attempts,
        }
    }
}

#[async_trait]
impl<S, R> OrderSlugProvider for RandomSlugGenerator<S, R>
where
    S: RepairOrderStore,
    R: RngCore + Clone + Send + Sync,
{
    #[tracing::instrument(skip(self))]
    async fn generate(&self, store_id: StoreId) -> Result<Slug, DomainError> {
        let mut rng = self.rng.clone();

        for attempt in 1..=self.max_attempts {
            let slug = Slug::random(&mut rng);
            if !self.store.is_slug_taken(store_id, slug.as_str()).await? {
                return Ok(slug);
            }
            metrics::counter!("repair_order_slug_collisions_total").increment(1);
            tracing::warn!(attempt, slug = %slug, "generated slug already taken");
        }

        Err(DomainError::SlugGenerationExhausted {
            store_id,
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use order_store::{InMemoryRepairOrderStore, StoreError};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    use super::*;

    fn matches_format(slug: &str) -> bool {
        Slug::parse(slug).is_ok()
    }

    #[test]
    fn random_slugs_have_the_expected_shape() {
        let mut rng = OsRng;
        for _ in 0..500 {
            let slug = Slug::random(&mut rng);
            assert!(matches_format(slug.as_str()), "bad slug {slug}");
            assert_eq!(slug.as_str().len(), 15);
        }
    }

    #[test]
    fn random_slugs_do_not_repeat() {
        let mut rng = OsRng;
        let slugs: HashSet<Slug> = (0..1000).map(|_| Slug::random(&mut rng)).collect();
        assert_eq!(slugs.len(), 1000);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(Slug::parse("R123-45678-9012").is_ok());
        assert_eq!(
            Slug::parse(""),
            Err(OrderError::invalid("slug", Defect::Empty))
        );
        for bad in [
            "123-45678-9012",
            "R12-45678-9012",
            "R123-4567-9012",
            "R123-45678-901a",
            "R123-45678-9012-1",
            "r123-45678-9012",
        ] {
            assert_eq!(
                Slug::parse(bad),
                Err(OrderError::invalid("slug", Defect::Malformed)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn serde_validates_slugs() {
        let slug: Slug = serde_json::from_str("\"R123-45678-9012\"").unwrap();
        assert_eq!(slug.as_str(), "R123-45678-9012");
        assert!(serde_json::from_str::<Slug>("\"nope\"").is_err());
    }

    #[tokio::test]
    async fn generate_returns_unused_slug() {
        let generator = RandomSlugGenerator::new(InMemoryRepairOrderStore::new());
        let slug = generator.generate(StoreId::new()).await.unwrap();
        assert!(matches_format(slug.as_str()));
    }

    #[tokio::test]
    async fn generate_retries_after_collision() {
        let store = InMemoryRepairOrderStore::new();
        let store_id = StoreId::new();
        let seeded = StdRng::seed_from_u64(7);
        let generator = RandomSlugGenerator::with_rng(store.clone(), seeded.clone(), 5);

        let first = Slug::random(&mut seeded.clone());
        let mut record = crate::repair_order::aggregate::tests::sample_record(store_id);
        record.slug = first.to_string();
        store.create_repair_order(&record).await.unwrap();

        let slug = generator.generate(store_id).await.unwrap();
        assert_ne!(slug, first);
    }

    #[tokio::test]
    async fn generate_gives_up_after_max_attempts() {
        let store = InMemoryRepairOrderStore::new();
        let store_id = StoreId::new();
        // A constant source produces the same slug every time.
        let constant = StepRng::new(0, 0);
        let taken = Slug::random(&mut constant.clone());
        let mut record = crate::repair_order::aggregate::tests::sample_record(store_id);
        record.slug = taken.to_string();
        store.create_repair_order(&record).await.unwrap();

        let generator = RandomSlugGenerator::with_rng(store, constant, MAX_SLUG_ATTEMPTS);
        let result = generator.generate(store_id).await;

        assert!(matches!(
            result,
            Err(DomainError::SlugGenerationExhausted { attempts: MAX_SLUG_ATTEMPTS, .. })
        ));
    }

    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let store = InMemoryRepairOrderStore::new();
        store.set_unavailable(true).await;
        let generator = RandomSlugGenerator::new(store);

        let result = generator.generate(StoreId::new()).await;
        assert!(matches!(
            result,
            Err(DomainError::Store(StoreError::Unavailable(_)))
        ));
    }
}
