//! Authenticated actor extraction.
//!
//! Sessions are handled upstream; the proxy in front of this service
//! forwards the authenticated user as trusted headers. The middleware turns
//! them into an [`Actor`] request extension, and handlers read it back with
//! [`CurrentActor`].

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use common::{Actor, ActorRole, StoreId, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const STORE_ID_HEADER: &str = "x-store-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Attaches the actor to the request if all identity headers are present
/// and well formed. Requests without one pass through unchanged; the
/// handlers decide whether an actor is required.
pub async fn extract_actor(mut request: Request, next: Next) -> Response {
    if let Some(actor) = actor_from_headers(request.headers()) {
        request.extensions_mut().insert(actor);
    }
    next.run(request).await
}

fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let user_id = header(USER_ID_HEADER)?;
    let store_id = header(STORE_ID_HEADER)?;
    let role = header(USER_ROLE_HEADER)?;

    match (
        user_id.trim().parse::<UserId>(),
        store_id.trim().parse::<StoreId>(),
        role.parse::<ActorRole>(),
    ) {
        (Ok(user_id), Ok(store_id), Ok(role)) => Some(Actor::new(user_id, store_id, role)),
        _ => {
            tracing::debug!("ignoring malformed identity headers");
            None
        }
    }
}

/// The actor attached by [`extract_actor`], if any.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Option<Actor>);

impl CurrentActor {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentActor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentActor(parts.extensions.get::<Actor>().copied()))
    }
}
