//! Common rounding functions for PAYE calculations.
//!
//! Every monetary value in the engine passes through one of these helpers so
//! that the rounding mode used at each step is explicit and shared.

use rust_decimal::{Decimal, RoundingStrategy};

/// Scale of the intermediate banker's-rounding stage in [`round_prorated`].
const PRORATION_INTERMEDIATE_DP: u32 = 10;

/// Scale prorated band values are held at.
const PRORATION_DP: u32 = 4;

/// Rounds a prorated band value.
///
/// The value is first rounded to 10 decimal places using half-to-even, then
/// truncated to 4 decimal places. The first stage turns division artifacts
/// such as `1.99999999995` into `2.0000000000` before truncation.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use paye_core::calculations::common::round_prorated;
///
/// assert_eq!(round_prorated(dec!(1.99999999995)), dec!(2.0000));
/// assert_eq!(round_prorated(dec!(1.23455)), dec!(1.2345));
/// assert_eq!(round_prorated(dec!(3141.66666666666666)), dec!(3141.6666));
/// ```
pub fn round_prorated(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(PRORATION_INTERMEDIATE_DP, RoundingStrategy::MidpointNearestEven)
        .round_dp_with_strategy(PRORATION_DP, RoundingStrategy::ToZero)
}

/// Drops any pence, leaving whole pounds (truncation toward zero).
///
/// ```
/// use rust_decimal_macros::dec;
/// use paye_core::calculations::common::truncate_to_pounds;
///
/// assert_eq!(truncate_to_pounds(dec!(1951.75)), dec!(1951));
/// assert_eq!(truncate_to_pounds(dec!(-1096.50)), dec!(-1096));
/// ```
pub fn truncate_to_pounds(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::ToZero)
}

/// Rounds up to the next whole pound.
pub fn round_up_to_pounds(value: Decimal) -> Decimal {
    value.ceil()
}

/// Truncates to whole pence.
///
/// ```
/// use rust_decimal_macros::dec;
/// use paye_core::calculations::common::truncate_to_pence;
///
/// assert_eq!(truncate_to_pence(dec!(1352.06666)), dec!(1352.06));
/// ```
pub fn truncate_to_pence(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Rounds away from zero to whole pence.
pub fn round_up_to_pence(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::AwayFromZero)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_prorated tests
    // =========================================================================

    #[test]
    fn round_prorated_rescues_division_artifacts() {
        let result = round_prorated(dec!(1.99999999995));

        assert_eq!(result, dec!(2.0000));
    }

    #[test]
    fn round_prorated_half_even_tie_rounds_to_even_digit() {
        // 11th digit is a 5 tie and the 10th digit (8) is even, so it stays.
        let result = round_prorated(dec!(1.99999999985));

        assert_eq!(result, dec!(1.9999));
    }

    #[test]
    fn round_prorated_truncates_at_four_places() {
        let result = round_prorated(dec!(1.23455));

        assert_eq!(result, dec!(1.2345));
    }

    #[test]
    fn round_prorated_does_not_round_up_at_fourth_place() {
        let result = round_prorated(dec!(628.33339999));

        assert_eq!(result, dec!(628.3333));
    }

    #[test]
    fn round_prorated_handles_twelfth_of_a_year() {
        let twelfth = Decimal::ONE / Decimal::from(12);

        let result = round_prorated(dec!(37700) * twelfth * Decimal::from(12));

        assert_eq!(result, dec!(37700.0000));
    }

    #[test]
    fn round_prorated_preserves_exact_values() {
        assert_eq!(round_prorated(dec!(18850)), dec!(18850));
        assert_eq!(round_prorated(dec!(0)), dec!(0));
    }

    // =========================================================================
    // pounds / pence tests
    // =========================================================================

    #[test]
    fn truncate_to_pounds_drops_pence() {
        assert_eq!(truncate_to_pounds(dec!(2000.99)), dec!(2000));
        assert_eq!(truncate_to_pounds(dec!(0.99)), dec!(0));
    }

    #[test]
    fn round_up_to_pounds_moves_to_next_pound() {
        assert_eq!(round_up_to_pounds(dec!(3141.6666)), dec!(3142));
        assert_eq!(round_up_to_pounds(dec!(3142)), dec!(3142));
    }

    #[test]
    fn truncate_to_pence_drops_fractions_of_a_penny() {
        assert_eq!(truncate_to_pence(dec!(235.200015)), dec!(235.20));
        assert_eq!(truncate_to_pence(dec!(-219.409)), dec!(-219.40));
    }

    #[test]
    fn round_up_to_pence_rounds_away_from_zero() {
        assert_eq!(round_up_to_pence(dec!(241.903846)), dec!(241.91));
        assert_eq!(round_up_to_pence(dec!(-417.416666)), dec!(-417.42));
        assert_eq!(round_up_to_pence(dec!(1048.25)), dec!(1048.25));
    }
}
