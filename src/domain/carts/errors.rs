//! Carts service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::carts::models::InvalidSessionKey;

/// Carts service error variants.
#[derive(Debug, Error)]
pub enum CartsServiceError {
    /// Cart already exists for this owner.
    #[error("cart already exists")]
    AlreadyExists,

    /// Cart, line or referenced product was not found.
    #[error("cart or product not found")]
    NotFound,

    /// Adding the requested quantity would exceed the product's stock.
    /// `available` is the largest quantity that can still be added.
    #[error("insufficient stock: only {available} more available")]
    InsufficientStock { available: u64 },

    /// A subtotal or total does not fit in the amount range.
    #[error("amount exceeds the representable range")]
    AmountOverflow,

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

impl From<Error> for CartsServiceError {
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

impl From<InvalidSessionKey> for CartsServiceError {
    fn from(_: InvalidSessionKey) -> Self {
        Self::InvalidData
    }
}
