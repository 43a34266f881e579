//! Fixed-scale decimal money arithmetic.
//!
//! Monetary values are persisted and compared at scale 2; intermediate
//! interpolation runs at scale 8. Rounding is half-up everywhere, never
//! binary floating point.

use rust_decimal::{Decimal, RoundingStrategy};

/// Scale of persisted monetary values.
pub const MONEY_SCALE: u32 = 2;

/// Interim scale for linear interpolation fractions.
pub const INTERP_SCALE: u32 = 8;

/// Round half-up to `scale` decimal places.
pub fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Round half-up and force the representation to exactly `scale` places,
/// so `0` becomes `0.00` and `10050` becomes `10050.00`.
pub fn with_scale(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = round_half_up(value, scale);
    rounded.rescale(scale);
    rounded
}

/// A zero amount at the given scale.
pub fn zero(scale: u32) -> Decimal {
    with_scale(Decimal::ZERO, scale)
}

/// Canonical scale-2 text form used for storage columns.
pub fn to_storage(value: Decimal) -> String {
    with_scale(value, MONEY_SCALE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(0.125), 2), dec!(0.13));
        assert_eq!(round_half_up(dec!(0.124), 2), dec!(0.12));
        assert_eq!(round_half_up(dec!(2.005), 2), dec!(2.01));
    }

    #[test]
    fn test_with_scale_pads_zeros() {
        assert_eq!(with_scale(dec!(10050), 2).to_string(), "10050.00");
        assert_eq!(with_scale(dec!(0), 2).to_string(), "0.00");
        assert_eq!(with_scale(dec!(1.5), 2).to_string(), "1.50");
    }

    #[test]
    fn test_to_storage_is_scale_two() {
        assert_eq!(to_storage(dec!(10000)), "10000.00");
        assert_eq!(to_storage(dec!(50.005)), "50.01");
    }
}
