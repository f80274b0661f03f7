//! Domain entities - the core business objects.

mod comment;
mod post;
mod profile;
mod user;

pub use comment::{Comment, CommentDetails};
pub use post::{Pagination, Post, PostCondition, PostDetails};
pub use profile::Profile;
pub use user::User;
