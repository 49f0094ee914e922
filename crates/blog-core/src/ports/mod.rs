//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod mailer;
mod rate_limit;
mod repository;

pub use mailer::{Mailer, OutgoingMail};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{CommentRepository, PostRepository, TagRepository};
