//! PAYE income tax calculation for a single pay period.
//!
//! A [`TaxCalculator`] is bound to one tax year, regime, pay frequency and
//! tax period. It prorates the annual bands once on construction and can
//! then be asked for the tax due on any number of employees' pay.
//!
//! # Calculation paths
//!
//! | Tax code                    | Path                                      |
//! |-----------------------------|-------------------------------------------|
//! | `NT`                        | no tax; cumulative codes refund YTD tax   |
//! | `BR`, `D0`-`D3`             | flat rate of a single band                |
//! | allowance codes, `W1`/`M1`  | period-1 bands against this period's pay  |
//! | allowance codes             | prorated bands against year-to-date pay   |
//!
//! Every path finishes by applying the regulatory limit.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rust_decimal_macros::dec;
//! use paye_core::calculations::{TaxCalculationInput, TaxCalculator};
//! use paye_core::{BandDefinition, BandSet, PayFrequency, TaxRegime, TaxYear};
//!
//! let bands = BandSet::new(
//!     TaxYear(2024),
//!     TaxRegime::EnglandAndNorthernIreland,
//!     vec![
//!         BandDefinition::new("Basic rate", dec!(0.20), Some(dec!(37700)), false),
//!         BandDefinition::new("Higher rate", dec!(0.40), Some(dec!(125140)), false),
//!         BandDefinition::new("Additional rate", dec!(0.45), None, true),
//!     ],
//! )
//! .unwrap();
//!
//! let calculator = TaxCalculator::new(
//!     TaxYear(2024),
//!     TaxRegime::EnglandAndNorthernIreland,
//!     Arc::new(bands),
//!     PayFrequency::Monthly,
//!     1,
//! )
//! .unwrap();
//!
//! let input = TaxCalculationInput::new("1257L".parse().unwrap(), dec!(3000.00));
//! let result = calculator.calculate(&input).unwrap();
//!
//! assert_eq!(result.taxable_salary_after_allowance, dec!(1951));
//! assert_eq!(result.tax_due, dec!(390.20));
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::{truncate_to_pence, truncate_to_pounds};
use crate::calculations::period_bands::{BandBasis, PeriodBandSet};
use crate::calculations::regulatory_limit::apply_regulatory_limit;
use crate::calculations::result::TaxCalculationResult;
use crate::{BandSet, BandSetError, PayFrequency, TaxCode, TaxRegime, TaxTreatment, TaxYear};

/// Errors that can occur while constructing a calculator or calculating tax.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxCalculationError {
    /// The caller supplied arguments the calculator cannot accept, such as a
    /// tax code for another regime or a tax period outside the year.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Reference data does not support the requested calculation, such as a
    /// fixed code whose band does not exist for this regime and year.
    #[error("inconsistent reference data: {0}")]
    InconsistentData(String),

    /// The band set is empty or malformed.
    #[error("invalid reference data: {0}")]
    InvalidReferenceData(String),
}

impl From<BandSetError> for TaxCalculationError {
    fn from(err: BandSetError) -> Self {
        TaxCalculationError::InvalidReferenceData(err.to_string())
    }
}

/// Figures for one period's PAYE calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculationInput {
    /// Taxable pay in this period, including benefits in kind.
    pub total_taxable_salary_in_period: Decimal,

    /// Benefits in kind payrolled in this period.
    pub benefits_in_kind_in_period: Decimal,

    pub tax_code: TaxCode,

    /// Taxable pay in earlier periods of this tax year.
    pub taxable_salary_ytd: Decimal,

    /// Tax paid in earlier periods of this tax year.
    pub tax_paid_ytd: Decimal,

    /// Tax the regulatory limit left uncollected in the previous period.
    pub tax_unpaid_due_to_regulatory_limit: Decimal,
}

impl TaxCalculationInput {
    /// Input for a first payment of the year: no benefits in kind and no
    /// year-to-date figures.
    pub fn new(
        tax_code: TaxCode,
        total_taxable_salary_in_period: Decimal,
    ) -> Self {
        Self {
            total_taxable_salary_in_period,
            benefits_in_kind_in_period: Decimal::ZERO,
            tax_code,
            taxable_salary_ytd: Decimal::ZERO,
            tax_paid_ytd: Decimal::ZERO,
            tax_unpaid_due_to_regulatory_limit: Decimal::ZERO,
        }
    }
}

/// The closed set of ways a tax code can be operated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalculationPath {
    NoTax,
    FixedRate(usize),
    NonCumulative,
    Cumulative,
}

/// Tax due before the regulatory limit, with the band it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PreLimitTax {
    taxable_salary: Decimal,
    tax_free_pay: Decimal,
    tax_due: Decimal,
    band_index: Option<usize>,
    income_at_band: Decimal,
    tax_at_band: Decimal,
}

/// Tax on an amount of pay read from the period bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BandedTax {
    band_index: usize,
    income_at_band: Decimal,
    tax_at_band: Decimal,
    total: Decimal,
}

/// Band index a fixed-rate treatment taxes at in a regime's band set.
///
/// Scottish band sets start with a starter rate below the basic rate, so
/// every fixed code sits one band higher.
pub fn fixed_code_band_index(
    regime: TaxRegime,
    treatment: TaxTreatment,
) -> Option<usize> {
    let index = match treatment {
        TaxTreatment::BR => 0,
        TaxTreatment::D0 => 1,
        TaxTreatment::D1 => 2,
        TaxTreatment::D2 => 3,
        TaxTreatment::D3 => 4,
        _ => return None,
    };
    match regime {
        TaxRegime::Scotland => Some(index + 1),
        TaxRegime::EnglandAndNorthernIreland | TaxRegime::Wales => Some(index),
    }
}

/// PAYE calculator for one tax year, regime, pay frequency and period.
#[derive(Debug, Clone)]
pub struct TaxCalculator {
    tax_year: TaxYear,
    regime: TaxRegime,
    pay_frequency: PayFrequency,
    tax_period: u32,
    periods_in_year: u32,
    bands: Arc<BandSet>,
    period_bands: PeriodBandSet,
}

impl TaxCalculator {
    /// Creates a calculator and prorates `bands` to `tax_period`.
    ///
    /// # Errors
    ///
    /// * [`TaxCalculationError::Argument`] if `tax_period` is outside
    ///   `1..=periods_in_year` for `pay_frequency`.
    /// * [`TaxCalculationError::InconsistentData`] if `bands` belongs to a
    ///   different tax year or regime.
    pub fn new(
        tax_year: TaxYear,
        regime: TaxRegime,
        bands: Arc<BandSet>,
        pay_frequency: PayFrequency,
        tax_period: u32,
    ) -> Result<Self, TaxCalculationError> {
        let periods_in_year = pay_frequency.periods_in_year();
        if tax_period == 0 || tax_period > periods_in_year {
            return Err(TaxCalculationError::Argument(format!(
                "tax period {tax_period} is outside 1..={periods_in_year} for {pay_frequency} pay"
            )));
        }
        if bands.tax_year() != tax_year || bands.regime() != regime {
            return Err(TaxCalculationError::InconsistentData(format!(
                "bands for {} {} cannot be used for {regime} {tax_year}",
                bands.regime(),
                bands.tax_year()
            )));
        }

        let period_bands = PeriodBandSet::new(&bands, pay_frequency, tax_period);

        Ok(Self {
            tax_year,
            regime,
            pay_frequency,
            tax_period,
            periods_in_year,
            bands,
            period_bands,
        })
    }

    pub fn tax_year(&self) -> TaxYear {
        self.tax_year
    }

    pub fn regime(&self) -> TaxRegime {
        self.regime
    }

    pub fn pay_frequency(&self) -> PayFrequency {
        self.pay_frequency
    }

    pub fn tax_period(&self) -> u32 {
        self.tax_period
    }

    pub fn periods_in_year(&self) -> u32 {
        self.periods_in_year
    }

    pub fn bands(&self) -> &BandSet {
        &self.bands
    }

    pub fn period_bands(&self) -> &PeriodBandSet {
        &self.period_bands
    }

    /// Calculates the tax due for this period.
    ///
    /// # Errors
    ///
    /// * [`TaxCalculationError::Argument`] if the tax code belongs to another
    ///   regime (NT codes are accepted from any regime).
    /// * [`TaxCalculationError::InconsistentData`] if a fixed code maps to a
    ///   band this band set does not have.
    /// * [`TaxCalculationError::InvalidReferenceData`] if no band can be
    ///   selected.
    pub fn calculate(
        &self,
        input: &TaxCalculationInput,
    ) -> Result<TaxCalculationResult, TaxCalculationError> {
        let code = &input.tax_code;
        if code.treatment() != TaxTreatment::NT && code.regime() != self.regime {
            warn!(
                tax_code = %code,
                calculator_regime = %self.regime,
                "tax code regime does not match calculator"
            );
            return Err(TaxCalculationError::Argument(format!(
                "tax code {code} is for {} but this calculator is for {}",
                code.regime(),
                self.regime
            )));
        }

        let pre_limit = match self.path_for(code)? {
            CalculationPath::NoTax => self.no_tax(input),
            CalculationPath::FixedRate(band_index) => self.fixed_rate(input, band_index)?,
            CalculationPath::NonCumulative => self.non_cumulative(input)?,
            CalculationPath::Cumulative => self.cumulative(input)?,
        };

        let limit = apply_regulatory_limit(
            pre_limit.tax_due,
            input.total_taxable_salary_in_period,
            input.benefits_in_kind_in_period,
            input.tax_unpaid_due_to_regulatory_limit,
        );

        debug!(
            tax_code = %code,
            period = self.tax_period,
            band = ?pre_limit.band_index,
            pre_limit_due = %pre_limit.tax_due,
            tax_due = %limit.tax_due,
            "calculated PAYE"
        );

        Ok(TaxCalculationResult {
            tax_year: self.tax_year,
            regime: self.regime,
            pay_frequency: self.pay_frequency,
            tax_period: self.tax_period,
            tax_code: code.clone(),
            taxable_salary_after_allowance: pre_limit.taxable_salary,
            tax_free_pay_to_end_of_period: pre_limit.tax_free_pay,
            taxable_salary_ytd: input.taxable_salary_ytd,
            tax_paid_ytd: input.tax_paid_ytd,
            tax_due_before_regulatory_limit: pre_limit.tax_due,
            tax_due: limit.tax_due,
            tax_unpaid_due_to_regulatory_limit: limit.tax_unpaid_due_to_limit,
            regulatory_limit_applied: limit.limit_applied,
            highest_band_index: pre_limit.band_index,
            income_at_highest_band: pre_limit.income_at_band,
            tax_at_highest_band: pre_limit.tax_at_band,
        })
    }

    fn path_for(
        &self,
        code: &TaxCode,
    ) -> Result<CalculationPath, TaxCalculationError> {
        if code.treatment() == TaxTreatment::NT {
            return Ok(CalculationPath::NoTax);
        }
        if code.is_fixed_code() {
            let index = fixed_code_band_index(self.regime, code.treatment()).ok_or_else(|| {
                TaxCalculationError::InconsistentData(format!(
                    "no fixed band for tax code {code}"
                ))
            })?;
            return Ok(CalculationPath::FixedRate(index));
        }
        if code.is_non_cumulative() {
            Ok(CalculationPath::NonCumulative)
        } else {
            Ok(CalculationPath::Cumulative)
        }
    }

    /// NT: nothing is taxed. A cumulative NT code refunds everything
    /// collected so far this year.
    fn no_tax(
        &self,
        input: &TaxCalculationInput,
    ) -> PreLimitTax {
        let tax_due = if input.tax_code.is_non_cumulative() {
            Decimal::ZERO
        } else {
            Decimal::ZERO - input.tax_paid_ytd
        };
        PreLimitTax {
            taxable_salary: Decimal::ZERO,
            tax_free_pay: Decimal::ZERO,
            tax_due,
            band_index: None,
            income_at_band: Decimal::ZERO,
            tax_at_band: Decimal::ZERO,
        }
    }

    /// BR and D codes: every pound is taxed at one band's rate.
    fn fixed_rate(
        &self,
        input: &TaxCalculationInput,
        band_index: usize,
    ) -> Result<PreLimitTax, TaxCalculationError> {
        let band = self.period_bands.get(band_index).ok_or_else(|| {
            TaxCalculationError::InconsistentData(format!(
                "tax code {} needs band {band_index} but {} {} has {} bands",
                input.tax_code,
                self.regime,
                self.tax_year,
                self.period_bands.len()
            ))
        })?;

        let non_cumulative = input.tax_code.is_non_cumulative();
        let taxable_salary = if non_cumulative {
            truncate_to_pounds(input.total_taxable_salary_in_period)
        } else {
            truncate_to_pounds(input.taxable_salary_ytd + input.total_taxable_salary_in_period)
        };
        let tax = truncate_to_pence(taxable_salary * band.rate());
        let tax_due = if non_cumulative {
            tax
        } else {
            tax - input.tax_paid_ytd
        };

        Ok(PreLimitTax {
            taxable_salary,
            tax_free_pay: Decimal::ZERO,
            tax_due,
            band_index: Some(band_index),
            income_at_band: taxable_salary,
            tax_at_band: tax,
        })
    }

    /// Week 1 / month 1 basis: this period's pay against period-1 bands,
    /// ignoring year-to-date figures.
    fn non_cumulative(
        &self,
        input: &TaxCalculationInput,
    ) -> Result<PreLimitTax, TaxCalculationError> {
        let tax_free_pay = input
            .tax_code
            .tax_free_pay_for_period(1, self.periods_in_year);
        let taxable_salary = input.total_taxable_salary_in_period - tax_free_pay;

        let banded = self.banded_tax(taxable_salary, BandBasis::Period1)?;
        let tax_due = truncate_to_pence(banded.total).max(Decimal::ZERO);

        Ok(PreLimitTax {
            taxable_salary,
            tax_free_pay,
            tax_due,
            band_index: Some(banded.band_index),
            income_at_band: banded.income_at_band,
            tax_at_band: truncate_to_pence(banded.tax_at_band),
        })
    }

    /// Cumulative basis: year-to-date pay against prorated bands, less tax
    /// already paid this year.
    fn cumulative(
        &self,
        input: &TaxCalculationInput,
    ) -> Result<PreLimitTax, TaxCalculationError> {
        let tax_free_pay = input
            .tax_code
            .tax_free_pay_for_period(self.tax_period, self.periods_in_year);
        let total_taxable_ytd = input.total_taxable_salary_in_period + input.taxable_salary_ytd;
        let taxable_salary = truncate_to_pounds(total_taxable_ytd - tax_free_pay);

        let banded = self.banded_tax(taxable_salary, BandBasis::Cumulative)?;
        let mut tax_due_ytd = truncate_to_pence(banded.total);

        // Only refund past the allowance if the employee has paid more than it.
        if tax_due_ytd < Decimal::ZERO && input.tax_paid_ytd <= tax_free_pay {
            debug!(
                tax_due_ytd = %tax_due_ytd,
                tax_paid_ytd = %input.tax_paid_ytd,
                tax_free_pay = %tax_free_pay,
                "suppressing negative year-to-date tax"
            );
            tax_due_ytd = Decimal::ZERO;
        }

        Ok(PreLimitTax {
            taxable_salary,
            tax_free_pay,
            tax_due: tax_due_ytd - input.tax_paid_ytd,
            band_index: Some(banded.band_index),
            income_at_band: banded.income_at_band,
            tax_at_band: truncate_to_pence(banded.tax_at_band),
        })
    }

    fn banded_tax(
        &self,
        taxable: Decimal,
        basis: BandBasis,
    ) -> Result<BandedTax, TaxCalculationError> {
        let band = self.period_bands.find_band(taxable, basis).ok_or_else(|| {
            TaxCalculationError::InvalidReferenceData(format!(
                "no band in {} {} covers taxable pay {taxable}",
                self.regime, self.tax_year
            ))
        })?;

        let (below_bandwidth, below_tax) = match self.period_bands.below(band) {
            Some(below) => {
                let bandwidth = basis.bandwidth(below).ok_or_else(|| {
                    TaxCalculationError::InvalidReferenceData(format!(
                        "band {} below the selected band is unbounded",
                        below.entry_index()
                    ))
                })?;
                (bandwidth, basis.tax(below))
            }
            None => (Decimal::ZERO, Decimal::ZERO),
        };

        let income_at_band = truncate_to_pounds(taxable) - below_bandwidth;
        let tax_at_band = income_at_band * band.rate();

        Ok(BandedTax {
            band_index: band.entry_index(),
            income_at_band,
            tax_at_band,
            total: below_tax + tax_at_band,
        })
    }
}
