/// Database access layer
///
/// This module provides:
/// - Repository functions for users, posts, comments (plain SQL over `PgPool`)
/// - The `BlogStore` seam the services talk to, and its PostgreSQL implementation
/// - Schema migrations
pub mod comment_repo;
pub mod post_repo;
pub mod store;
pub mod user_repo;

pub use store::{BlogStore, PgBlogStore};

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage failures, classified enough for the services to pick an `AppError`
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {}", .constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation { constraint: Option<String> },

    #[error("foreign key constraint violated: {}", .constraint.as_deref().unwrap_or("unknown"))]
    ForeignKeyViolation { constraint: Option<String> },

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().map(str::to_string);
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return StoreError::UniqueViolation { constraint },
                Some(FOREIGN_KEY_VIOLATION) => {
                    return StoreError::ForeignKeyViolation { constraint }
                }
                _ => {}
            }
        }

        StoreError::Database(err)
    }
}

/// Apply the bundled schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}
