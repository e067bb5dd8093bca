//! Storefront domain and persistence modules.
//!
//! Catalog, cart and order-placement services over either PostgreSQL or an
//! in-memory store. The service traits in [`domain`] are the only interface
//! the rest of a deployment depends on.

pub mod context;
pub mod database;
pub mod domain;
pub mod memory;
pub mod uuids;

#[cfg(test)]
mod test;
