//! In-memory storage backend.
//!
//! Implements the same service traits as the PostgreSQL backend against a
//! single process-local table set. Useful as the catalog/cart store for
//! tests and demos; a writer lock over the whole store gives order
//! placement the same all-or-nothing behaviour a database transaction
//! provides.

mod carts;
mod orders;
mod products;
mod store;

pub use carts::MemoryCartsService;
pub use orders::MemoryOrdersService;
pub use products::MemoryProductsService;
pub use store::MemoryStore;
