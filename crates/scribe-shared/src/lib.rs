//! # Scribe Shared
//!
//! Wire types shared by the service layer and the HTTP surface.

pub mod dto;
pub mod projection;
pub mod response;

pub use response::ErrorResponse;
