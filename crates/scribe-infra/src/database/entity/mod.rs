//! SeaORM entities mirroring the schema created by the `migration` crate.

pub mod comment;
pub mod favorite;
pub mod follow;
pub mod post;
pub mod profile;
pub mod user;
