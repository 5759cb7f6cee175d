use common::StoreId;
use thiserror::Error;

use crate::ChildTable;

/// Errors that can occur when interacting with the repair-order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A bulk insert reported a different number of affected rows than
    /// values it was given. The surrounding transaction is rolled back.
    #[error("Row count mismatch in {table}: expected {expected}, affected {actual}")]
    RowCountMismatch {
        table: ChildTable,
        expected: u64,
        actual: u64,
    },

    /// Another order in the same store already uses this slug.
    #[error("Slug {slug} is already used in store {store_id}")]
    SlugConflict { store_id: StoreId, slug: String },

    /// The backing store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
