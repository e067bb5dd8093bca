//! Carts

pub mod errors;
pub mod models;
pub mod quantity;
pub(crate) mod repositories;
pub mod service;

pub use errors::CartsServiceError;
pub use service::*;
