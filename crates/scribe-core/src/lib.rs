//! # Scribe Core
//!
//! The domain layer: entities, ports and the service layer.
//! This crate has no infrastructure dependencies; storage, hashing and token
//! signing are reached only through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
pub use services::{AuthService, PostService, UserService};
