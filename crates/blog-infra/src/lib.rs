//! # Blog Infrastructure
//!
//! Concrete implementations of the ports defined in `blog-core`.
//! This crate contains the database, in-memory store, mail and rate limiting
//! integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `smtp` - SMTP delivery via lettre
//! - `rate-limit` - Rate limiting via governor

pub mod database;
pub mod fixtures;
pub mod mail;
pub mod memory;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use database::{DatabaseConfig, DatabaseConnections};
pub use fixtures::{FixtureError, Fixtures};
pub use mail::{ConsoleMailer, InMemoryMailer};
pub use memory::InMemoryBlogStore;

#[cfg(feature = "smtp")]
pub use mail::{SmtpConfig, SmtpMailer};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

#[cfg(feature = "postgres")]
pub use database::{PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository};
