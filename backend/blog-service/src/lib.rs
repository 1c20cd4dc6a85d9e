/// Blog Service Library
///
/// Server-side data access for a blog: users, posts and comments. Each action
/// validates its input, runs one logical query or write through an injected
/// store, and after a successful write revalidates the home page.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers over the actions
/// - `models`: rows, enriched read views and write payloads
/// - `services`: `BlogActions`, the read and write actions
/// - `db`: repositories, the `BlogStore` seam and migrations
/// - `cache`: read-through query cache with stale-while-revalidate
/// - `error`: error types and HTTP mapping
/// - `config`: configuration management
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::BlogActions;
