//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::products::models::ProductUuid;

/// Orders service error variants.
#[derive(Debug, Error)]
pub enum OrdersServiceError {
    /// Checkout attempted on a cart with no lines.
    #[error("cannot place an order from an empty cart")]
    EmptyCart,

    /// A line's quantity exceeded the product's stock at placement time.
    /// The whole placement is rolled back; nothing is persisted.
    #[error("insufficient stock for product {product}: {available} available")]
    InsufficientStock {
        product: ProductUuid,
        available: u64,
    },

    /// The order total does not fit in the amount range.
    #[error("amount exceeds the representable range")]
    AmountOverflow,

    /// Order or cart was not found.
    #[error("order not found")]
    NotFound,

    /// Order already exists.
    #[error("order already exists")]
    AlreadyExists,

    /// Referenced related row does not exist.
    #[error("related resource not found")]
    InvalidReference,

    /// Required data was missing.
    #[error("missing required data")]
    MissingRequiredData,

    /// Provided data failed validation.
    #[error("invalid data")]
    InvalidData,

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
