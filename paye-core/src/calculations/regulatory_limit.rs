//! The PAYE regulatory limit.
//!
//! Tax deducted in a single period may not exceed 50% of the period's taxable
//! pay less benefits in kind. Anything over the limit is carried forward and
//! retried in later periods; the caller threads the carried amount from one
//! period's result into the next period's input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::truncate_to_pence;

/// Outcome of applying the regulatory limit to one period's tax due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulatoryLimitOutcome {
    /// Tax to deduct this period.
    pub tax_due: Decimal,
    /// Tax that could not be deducted and is carried to the next period.
    pub tax_unpaid_due_to_limit: Decimal,
    /// Whether the limit capped the deduction.
    pub limit_applied: bool,
}

/// Maximum deduction allowed in a period; never negative.
///
/// ```
/// use rust_decimal_macros::dec;
/// use paye_core::calculations::maximum_payable;
///
/// assert_eq!(maximum_payable(dec!(100.00), dec!(0.00)), dec!(50.00));
/// assert_eq!(maximum_payable(dec!(100.01), dec!(0.00)), dec!(50.00));
/// assert_eq!(maximum_payable(dec!(100.00), dec!(300.00)), dec!(0.00));
/// ```
pub fn maximum_payable(
    taxable_pay_in_period: Decimal,
    benefits_in_kind_in_period: Decimal,
) -> Decimal {
    let limit = truncate_to_pence((taxable_pay_in_period - benefits_in_kind_in_period) / Decimal::TWO);
    limit.max(Decimal::ZERO)
}

/// Caps `pre_limit_due` at the regulatory limit and collects any tax carried
/// forward from earlier periods while headroom remains.
///
/// If `pre_limit_due` alone is over the limit, its excess replaces the
/// carried amount.
///
/// Refunds (negative amounts) are never limited and leave the carried amount
/// untouched.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use paye_core::calculations::apply_regulatory_limit;
///
/// let outcome = apply_regulatory_limit(dec!(80.00), dec!(100.00), dec!(0.00), dec!(0.00));
///
/// assert_eq!(outcome.tax_due, dec!(50.00));
/// assert_eq!(outcome.tax_unpaid_due_to_limit, dec!(30.00));
/// assert!(outcome.limit_applied);
/// ```
pub fn apply_regulatory_limit(
    pre_limit_due: Decimal,
    taxable_pay_in_period: Decimal,
    benefits_in_kind_in_period: Decimal,
    tax_unpaid_carried_forward: Decimal,
) -> RegulatoryLimitOutcome {
    if pre_limit_due < Decimal::ZERO {
        return RegulatoryLimitOutcome {
            tax_due: pre_limit_due,
            tax_unpaid_due_to_limit: tax_unpaid_carried_forward,
            limit_applied: false,
        };
    }

    let max_payable = maximum_payable(taxable_pay_in_period, benefits_in_kind_in_period);

    if pre_limit_due > max_payable {
        let unpaid = pre_limit_due - max_payable;
        debug!(
            pre_limit_due = %pre_limit_due,
            max_payable = %max_payable,
            unpaid = %unpaid,
            "tax due exceeds regulatory limit"
        );
        return RegulatoryLimitOutcome {
            tax_due: max_payable,
            tax_unpaid_due_to_limit: unpaid,
            limit_applied: true,
        };
    }

    if tax_unpaid_carried_forward > Decimal::ZERO {
        let candidate = pre_limit_due + tax_unpaid_carried_forward;
        let tax_due = candidate.min(max_payable);
        let unpaid = candidate - tax_due;
        debug!(
            carried_forward = %tax_unpaid_carried_forward,
            collected = %(tax_due - pre_limit_due),
            unpaid = %unpaid,
            "collecting tax carried forward by regulatory limit"
        );
        return RegulatoryLimitOutcome {
            tax_due,
            tax_unpaid_due_to_limit: unpaid,
            limit_applied: unpaid > Decimal::ZERO,
        };
    }

    RegulatoryLimitOutcome {
        tax_due: pre_limit_due,
        tax_unpaid_due_to_limit: Decimal::ZERO,
        limit_applied: false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn within_limit_passes_through() {
        let outcome = apply_regulatory_limit(dec!(40.00), dec!(100.00), dec!(0.00), dec!(0.00));

        assert_eq!(
            outcome,
            RegulatoryLimitOutcome {
                tax_due: dec!(40.00),
                tax_unpaid_due_to_limit: dec!(0.00),
                limit_applied: false,
            }
        );
    }

    #[test]
    fn exactly_at_limit_is_not_capped() {
        let outcome = apply_regulatory_limit(dec!(50.00), dec!(100.00), dec!(0.00), dec!(0.00));

        assert_eq!(outcome.tax_due, dec!(50.00));
        assert!(!outcome.limit_applied);
    }

    #[test]
    fn above_limit_is_capped_and_excess_carried() {
        let outcome = apply_regulatory_limit(dec!(80.00), dec!(100.00), dec!(0.00), dec!(0.00));

        assert_eq!(outcome.tax_due, dec!(50.00));
        assert_eq!(outcome.tax_unpaid_due_to_limit, dec!(30.00));
        assert!(outcome.limit_applied);
    }

    #[test]
    fn benefits_in_kind_reduce_the_limit() {
        let outcome = apply_regulatory_limit(dec!(80.00), dec!(200.00), dec!(60.00), dec!(0.00));

        assert_eq!(outcome.tax_due, dec!(70.00));
        assert_eq!(outcome.tax_unpaid_due_to_limit, dec!(10.00));
    }

    #[test]
    fn refunds_are_not_limited() {
        let outcome = apply_regulatory_limit(dec!(-500.00), dec!(100.00), dec!(0.00), dec!(25.00));

        assert_eq!(outcome.tax_due, dec!(-500.00));
        assert_eq!(outcome.tax_unpaid_due_to_limit, dec!(25.00));
        assert!(!outcome.limit_applied);
    }

    #[test]
    fn carried_forward_is_collected_when_headroom_allows() {
        let outcome = apply_regulatory_limit(dec!(390.20), dec!(3000.00), dec!(0.00), dec!(53.40));

        assert_eq!(outcome.tax_due, dec!(443.60));
        assert_eq!(outcome.tax_unpaid_due_to_limit, dec!(0.00));
        assert!(!outcome.limit_applied);
    }

    #[test]
    fn carried_forward_is_partly_collected_up_to_limit() {
        let outcome = apply_regulatory_limit(dec!(40.00), dec!(100.00), dec!(0.00), dec!(30.00));

        assert_eq!(outcome.tax_due, dec!(50.00));
        assert_eq!(outcome.tax_unpaid_due_to_limit, dec!(20.00));
        assert!(outcome.limit_applied);
    }

    #[test]
    fn new_excess_replaces_existing_carry_forward() {
        let outcome = apply_regulatory_limit(dec!(80.00), dec!(100.00), dec!(0.00), dec!(30.00));

        assert_eq!(outcome.tax_due, dec!(50.00));
        assert_eq!(outcome.tax_unpaid_due_to_limit, dec!(30.00));
        assert!(outcome.limit_applied);
    }

    #[test]
    fn no_pay_means_no_deduction() {
        let outcome = apply_regulatory_limit(dec!(10.00), dec!(0.00), dec!(0.00), dec!(0.00));

        assert_eq!(outcome.tax_due, dec!(0.00));
        assert_eq!(outcome.tax_unpaid_due_to_limit, dec!(10.00));
    }

    #[test]
    fn due_never_exceeds_half_of_pay_less_benefits() {
        for pay in [dec!(0), dec!(99.99), dec!(100), dec!(1234.56), dec!(5000)] {
            for bik in [dec!(0), dec!(50), dec!(800)] {
                for due in [dec!(0), dec!(10), dec!(600), dec!(4000)] {
                    let outcome = apply_regulatory_limit(due, pay, bik, dec!(15));
                    assert!(
                        outcome.tax_due <= ((pay - bik) / Decimal::TWO).max(Decimal::ZERO),
                        "pay {pay} bik {bik} due {due} gave {}",
                        outcome.tax_due
                    );
                }
            }
        }
    }
}
