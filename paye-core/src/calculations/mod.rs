//! PAYE tax calculation.
//!
//! Annual bands are prorated to a pay period by [`PeriodBandSet`], a
//! [`TaxCalculator`] works out the tax due for one employee's pay, and the
//! regulatory limit caps what can be deducted in a single period.

pub mod common;
mod period_bands;
mod regulatory_limit;
mod result;
mod tax_calculator;

pub use period_bands::{BandBasis, PeriodBandEntry, PeriodBandSet};
pub use regulatory_limit::{RegulatoryLimitOutcome, apply_regulatory_limit, maximum_payable};
pub use result::TaxCalculationResult;
pub use tax_calculator::{
    TaxCalculationError, TaxCalculationInput, TaxCalculator, fixed_code_band_index,
};
