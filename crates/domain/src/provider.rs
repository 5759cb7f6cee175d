//! Collaborators injected into the order creation pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, StoreId};

use crate::error::DomainError;
use crate::repair_order::Slug;

/// Source of the current time.
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeProvider for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl TimeProvider for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Produces a slug that is not yet used in a store.
#[async_trait]
pub trait OrderSlugProvider: Send + Sync {
    async fn generate(&self, store_id: StoreId) -> Result<Slug, DomainError>;
}

/// Builds the location of a created resource.
pub trait ResourceLocationProvider: Send + Sync {
    fn repair_order(&self, id: OrderId) -> String;
}

/// Locations relative to a base path, e.g. `/api/repair-orders/{id}`.
#[derive(Debug, Clone, Default)]
pub struct PathLocationProvider {
    base: String,
}

impl PathLocationProvider {
    /// `base` is prepended verbatim; trailing slashes are dropped.
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

impl ResourceLocationProvider for PathLocationProvider {
    fn repair_order(&self, id: OrderId) -> String {
        format!("{}/repair-orders/{}", self.base, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_without_base() {
        let id = OrderId::new();
        let location = PathLocationProvider::default().repair_order(id);
        assert_eq!(location, format!("/repair-orders/{id}"));
    }

    #[test]
    fn location_with_base_trims_trailing_slash() {
        let id = OrderId::new();
        let location = PathLocationProvider::new("/api/").repair_order(id);
        assert_eq!(location, format!("/api/repair-orders/{id}"));
    }

    #[test]
    fn fixed_clock_is_frozen() {
        let at = Utc::now();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
    }
}
