//! Storefront Domain Concerns

pub mod carts;
pub mod orders;
pub mod products;

use crate::uuids::TypedUuid;

/// Marker type for user identifiers.
///
/// Users are managed outside this crate; carts and orders only carry an
/// opaque reference to them.
#[derive(Debug)]
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;
