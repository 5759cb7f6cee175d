//! The authenticated actor behind a request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{StoreId, UserId};

/// Role granted to an actor inside their store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Owner,
    Admin,
    Employee,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Owner => "owner",
            ActorRole::Admin => "admin",
            ActorRole::Employee => "employee",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown actor role: {0}")]
pub struct ParseRoleError(String);

impl std::str::FromStr for ActorRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(ActorRole::Owner),
            "admin" => Ok(ActorRole::Admin),
            "employee" => Ok(ActorRole::Employee),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// Authenticated user together with the store they act for.
///
/// Produced by the session layer; everything downstream scopes its reads and
/// writes to `store_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub store_id: StoreId,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(user_id: UserId, store_id: StoreId, role: ActorRole) -> Self {
        Self {
            user_id,
            store_id,
            role,
        }
    }
}
