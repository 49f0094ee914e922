//! Domain entities - the core business objects.

mod comment;
mod post;
mod tag;

pub use comment::Comment;
pub use post::{Post, PostStatus, PublishDay};
pub use tag::Tag;
