//! Order Repositories

mod lines;
mod orders;

pub(crate) use lines::{LockedLine, PgOrderLinesRepository};
pub(crate) use orders::PgOrdersRepository;
