//! Annual bands prorated to a pay period.
//!
//! Cumulative codes compare year-to-date pay against thresholds scaled by
//! `period / periods_in_year`. Non-cumulative codes treat every period as
//! period 1, so each entry also carries the single-period figures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{round_prorated, round_up_to_pounds};
use crate::{BandEntry, BandSet, PayFrequency};

/// A band rescaled for one pay frequency and tax period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBandEntry {
    entry_index: usize,
    description: String,
    rate: Decimal,
    is_top_band: bool,
    cumulative_bandwidth: Option<Decimal>,
    cumulative_tax: Decimal,
    tax_for_band: Decimal,
    period1_cumulative_bandwidth: Option<Decimal>,
    period1_cumulative_tax: Decimal,
    below: Option<usize>,
}

impl PeriodBandEntry {
    fn prorate(
        annual: &BandEntry,
        entry_index: usize,
        below: Option<usize>,
        period_factor: Decimal,
        periods_in_year: Decimal,
    ) -> Self {
        Self {
            entry_index,
            description: annual.description().to_string(),
            rate: annual.rate(),
            is_top_band: annual.is_top_band(),
            cumulative_bandwidth: annual
                .cumulative_bandwidth()
                .map(|value| round_prorated(value * period_factor)),
            cumulative_tax: round_prorated(annual.cumulative_tax() * period_factor),
            tax_for_band: round_prorated(annual.tax_for_band() * period_factor),
            period1_cumulative_bandwidth: annual
                .cumulative_bandwidth()
                .map(|value| round_prorated(value / periods_in_year)),
            period1_cumulative_tax: round_prorated(annual.cumulative_tax() / periods_in_year),
            below,
        }
    }

    /// Position of this entry in its set, starting at zero.
    pub fn entry_index(&self) -> usize {
        self.entry_index
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn is_top_band(&self) -> bool {
        self.is_top_band
    }

    pub fn cumulative_bandwidth(&self) -> Option<Decimal> {
        self.cumulative_bandwidth
    }

    pub fn cumulative_tax(&self) -> Decimal {
        self.cumulative_tax
    }

    pub fn tax_for_band(&self) -> Decimal {
        self.tax_for_band
    }

    pub fn period1_cumulative_bandwidth(&self) -> Option<Decimal> {
        self.period1_cumulative_bandwidth
    }

    pub fn period1_cumulative_tax(&self) -> Decimal {
        self.period1_cumulative_tax
    }

    pub fn below(&self) -> Option<usize> {
        self.below
    }
}

/// Which pair of prorated figures a lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandBasis {
    /// Year-to-date thresholds for the current period.
    Cumulative,
    /// Single-period thresholds, independent of the current period.
    Period1,
}

impl BandBasis {
    pub fn bandwidth(
        &self,
        entry: &PeriodBandEntry,
    ) -> Option<Decimal> {
        match self {
            Self::Cumulative => entry.cumulative_bandwidth,
            Self::Period1 => entry.period1_cumulative_bandwidth,
        }
    }

    pub fn tax(
        &self,
        entry: &PeriodBandEntry,
    ) -> Decimal {
        match self {
            Self::Cumulative => entry.cumulative_tax,
            Self::Period1 => entry.period1_cumulative_tax,
        }
    }
}

/// Every band of a [`BandSet`] prorated to one pay frequency and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBandSet {
    pay_frequency: PayFrequency,
    tax_period: u32,
    entries: Vec<PeriodBandEntry>,
}

impl PeriodBandSet {
    /// Prorates `bands` to `tax_period` of a year paid at `pay_frequency`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use paye_core::calculations::PeriodBandSet;
    /// use paye_core::{BandDefinition, BandSet, PayFrequency, TaxRegime, TaxYear};
    ///
    /// let bands = BandSet::new(
    ///     TaxYear(2024),
    ///     TaxRegime::EnglandAndNorthernIreland,
    ///     vec![
    ///         BandDefinition::new("Basic", dec!(0.20), Some(dec!(37700)), false),
    ///         BandDefinition::new("Additional", dec!(0.45), None, true),
    ///     ],
    /// )
    /// .unwrap();
    ///
    /// let period_bands = PeriodBandSet::new(&bands, PayFrequency::Monthly, 6);
    ///
    /// assert_eq!(period_bands.entries()[0].cumulative_bandwidth(), Some(dec!(18850)));
    /// assert_eq!(period_bands.entries()[0].period1_cumulative_bandwidth(), Some(dec!(3141.6666)));
    /// ```
    pub fn new(
        bands: &BandSet,
        pay_frequency: PayFrequency,
        tax_period: u32,
    ) -> Self {
        let periods_in_year = Decimal::from(pay_frequency.periods_in_year());
        let period_factor = Decimal::from(tax_period) / periods_in_year;

        let mut entries: Vec<PeriodBandEntry> = Vec::with_capacity(bands.len());
        for (index, annual) in bands.entries().iter().enumerate() {
            let below = entries.last().map(|previous| previous.entry_index);
            entries.push(PeriodBandEntry::prorate(
                annual,
                index,
                below,
                period_factor,
                periods_in_year,
            ));
        }

        Self {
            pay_frequency,
            tax_period,
            entries,
        }
    }

    pub fn pay_frequency(&self) -> PayFrequency {
        self.pay_frequency
    }

    pub fn tax_period(&self) -> u32 {
        self.tax_period
    }

    pub fn entries(&self) -> &[PeriodBandEntry] {
        &self.entries
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<&PeriodBandEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry immediately below `entry`, if any.
    pub fn below(
        &self,
        entry: &PeriodBandEntry,
    ) -> Option<&PeriodBandEntry> {
        entry.below.and_then(|index| self.entries.get(index))
    }

    /// First band whose threshold, rounded up to the pound, covers
    /// `taxable`; otherwise the top band. `None` only if the set has no top
    /// band.
    pub fn find_band(
        &self,
        taxable: Decimal,
        basis: BandBasis,
    ) -> Option<&PeriodBandEntry> {
        self.entries
            .iter()
            .find(|entry| {
                basis
                    .bandwidth(entry)
                    .is_some_and(|threshold| round_up_to_pounds(threshold) >= taxable)
            })
            .or_else(|| self.entries.iter().find(|entry| entry.is_top_band))
    }
}
