use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PayFrequency, TaxCode, TaxRegime, TaxYear};

/// Outcome of one [`TaxCalculator::calculate`](super::TaxCalculator::calculate)
/// call, with the figures needed to audit how the tax due was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculationResult {
    pub tax_year: TaxYear,
    pub regime: TaxRegime,
    pub pay_frequency: PayFrequency,
    pub tax_period: u32,

    pub tax_code: TaxCode,

    /// Pay the bands were applied to, after tax-free pay. Year-to-date for
    /// cumulative codes, this period only for non-cumulative codes.
    pub taxable_salary_after_allowance: Decimal,

    /// Tax-free pay used in the calculation (negative for K codes).
    pub tax_free_pay_to_end_of_period: Decimal,

    /// Taxable salary in earlier periods of the tax year.
    pub taxable_salary_ytd: Decimal,

    /// Tax paid in earlier periods of the tax year.
    pub tax_paid_ytd: Decimal,

    /// Tax due for this period before the regulatory limit.
    pub tax_due_before_regulatory_limit: Decimal,

    /// Tax to deduct this period. Negative values are refunds.
    pub tax_due: Decimal,

    /// Tax the regulatory limit prevented collecting, to be carried into the
    /// next period's calculation.
    pub tax_unpaid_due_to_regulatory_limit: Decimal,

    /// Whether the regulatory limit capped this period's deduction.
    pub regulatory_limit_applied: bool,

    /// Index of the highest band reached; `None` for NT.
    pub highest_band_index: Option<usize>,

    /// Income taxed at the highest band reached.
    pub income_at_highest_band: Decimal,

    /// Tax on the income at the highest band reached.
    pub tax_at_highest_band: Decimal,
}

impl TaxCalculationResult {
    pub fn is_refund(&self) -> bool {
        self.tax_due < Decimal::ZERO
    }
}
