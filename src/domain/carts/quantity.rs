//! Quantity reconciliation rules.
//!
//! The pure decisions behind [`add_item`] and [`set_quantity`], shared by
//! every storage backend so both enforce identical stock arithmetic.
//!
//! [`add_item`]: super::service::CartsService::add_item
//! [`set_quantity`]: super::service::CartsService::set_quantity

/// Resolve the new line quantity for an additive add.
///
/// `requested` is coerced to at least 1. Fails when the combined quantity
/// would exceed `stock`; the error value is the largest quantity that could
/// still be added on top of `existing`.
///
/// # Errors
///
/// Returns `Err(available)` when `existing + requested > stock`.
pub fn add_quantity(existing: u64, requested: u64, stock: u64) -> Result<u64, u64> {
    let requested = requested.max(1);

    match existing.checked_add(requested) {
        Some(combined) if combined <= stock => Ok(combined),
        _ => Err(stock.saturating_sub(existing)),
    }
}

/// Outcome of clamping a requested quantity against available stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clamp {
    /// The quantity the line should be set to; `0` means remove the line.
    pub quantity: u64,
    /// Whether the request was reduced to fit the stock count.
    pub clamped: bool,
}

/// Resolve an in-place quantity update.
///
/// Unlike [`add_quantity`] an excessive request is not an error: it is
/// clamped down to `stock`. Non-positive requests resolve to removal.
#[must_use]
pub fn clamp_to_stock(requested: i64, stock: u64) -> Clamp {
    let Ok(requested) = u64::try_from(requested) else {
        return Clamp {
            quantity: 0,
            clamped: false,
        };
    };

    if requested > stock {
        Clamp {
            quantity: stock,
            clamped: true,
        }
    } else {
        Clamp {
            quantity: requested,
            clamped: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_accumulates_within_stock() {
        assert_eq!(add_quantity(3, 2, 10), Ok(5));
    }

    #[test]
    fn add_into_empty_line() {
        assert_eq!(add_quantity(0, 25, 25), Ok(25));
    }

    #[test]
    fn add_zero_is_coerced_to_one() {
        assert_eq!(add_quantity(4, 0, 10), Ok(5));
    }

    #[test]
    fn add_beyond_stock_reports_available_remainder() {
        assert_eq!(add_quantity(0, 30, 25), Err(25));
        assert_eq!(add_quantity(25, 1, 25), Err(0));
        assert_eq!(add_quantity(20, 10, 25), Err(5));
    }

    #[test]
    fn add_overflow_is_treated_as_out_of_stock() {
        assert_eq!(add_quantity(u64::MAX, 1, u64::MAX), Err(0));
    }

    #[test]
    fn clamp_within_stock_is_untouched() {
        assert_eq!(
            clamp_to_stock(5, 10),
            Clamp {
                quantity: 5,
                clamped: false
            }
        );
    }

    #[test]
    fn clamp_reduces_excess_to_stock() {
        assert_eq!(
            clamp_to_stock(30, 25),
            Clamp {
                quantity: 25,
                clamped: true
            }
        );
    }

    #[test]
    fn clamp_zero_or_negative_means_removal() {
        assert_eq!(clamp_to_stock(0, 10).quantity, 0);
        assert_eq!(clamp_to_stock(-3, 10).quantity, 0);
        assert!(!clamp_to_stock(-3, 10).clamped, "removal is not a clamp");
    }

    #[test]
    fn clamp_against_zero_stock_removes_the_line() {
        let clamp = clamp_to_stock(5, 0);

        assert_eq!(clamp.quantity, 0);
        assert!(clamp.clamped, "request above stock must report clamping");
    }
}
