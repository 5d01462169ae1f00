//! Annual income tax bands.
//!
//! A [`BandSet`] owns the bands for one regime in one tax year. Each
//! [`BandEntry`] refers to the band immediately below it by index into the
//! owning set, so the chain can only ever point downwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{TaxRegime, TaxYear};

/// Errors raised when reference data does not form a valid band lattice.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BandSetError {
    #[error("band set for {regime} {tax_year} has no bands")]
    Empty { tax_year: TaxYear, regime: TaxRegime },

    #[error("last band must be flagged as the top band")]
    MissingTopBand,

    #[error("band {0} is flagged as the top band but is not the last band")]
    MisplacedTopBand(usize),

    #[error("band {0} is not the top band but has no cumulative bandwidth")]
    UnboundedBand(usize),

    #[error("band {index} cumulative bandwidth {value} is below the band beneath it")]
    DecreasingBandwidth { index: usize, value: Decimal },

    #[error("band {index} rate {rate} must be between 0 and 1")]
    InvalidRate { index: usize, rate: Decimal },
}

/// One band as supplied by reference data, before any derived values exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandDefinition {
    pub description: String,
    pub rate: Decimal,
    /// Upper threshold of this band and all bands below it.
    /// `None` means unbounded, which only the top band may be.
    pub cumulative_bandwidth: Option<Decimal>,
    pub is_top_band: bool,
}

impl BandDefinition {
    pub fn new(
        description: impl Into<String>,
        rate: Decimal,
        cumulative_bandwidth: Option<Decimal>,
        is_top_band: bool,
    ) -> Self {
        Self {
            description: description.into(),
            rate,
            cumulative_bandwidth,
            is_top_band,
        }
    }
}

/// A full-year tax band with its derived bandwidth and tax figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandEntry {
    description: String,
    rate: Decimal,
    cumulative_bandwidth: Option<Decimal>,
    bandwidth: Option<Decimal>,
    tax_for_band: Decimal,
    cumulative_tax: Decimal,
    is_top_band: bool,
    below: Option<usize>,
}

impl BandEntry {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn cumulative_bandwidth(&self) -> Option<Decimal> {
        self.cumulative_bandwidth
    }

    /// Width of this band alone. `None` for an unbounded top band.
    pub fn bandwidth(&self) -> Option<Decimal> {
        self.bandwidth
    }

    pub fn tax_for_band(&self) -> Decimal {
        self.tax_for_band
    }

    /// Tax due on the full width of this band and every band below it.
    ///
    /// Always zero for the top band; lookups only ever read this value from
    /// the band beneath the one selected.
    pub fn cumulative_tax(&self) -> Decimal {
        self.cumulative_tax
    }

    pub fn is_top_band(&self) -> bool {
        self.is_top_band
    }

    /// Index of the band immediately below this one in the owning set.
    pub fn below(&self) -> Option<usize> {
        self.below
    }
}

/// Ordered, validated bands for one regime in one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSet {
    tax_year: TaxYear,
    regime: TaxRegime,
    entries: Vec<BandEntry>,
}

impl BandSet {
    /// Builds a band set from reference data, deriving each band's
    /// bandwidth and cumulative tax.
    ///
    /// # Errors
    ///
    /// Returns [`BandSetError`] if the definitions are empty, the top band is
    /// missing or not last, a lower band is unbounded, thresholds decrease or
    /// a rate falls outside `[0, 1]`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use paye_core::{BandDefinition, BandSet, TaxRegime, TaxYear};
    ///
    /// let bands = BandSet::new(
    ///     TaxYear(2024),
    ///     TaxRegime::EnglandAndNorthernIreland,
    ///     vec![
    ///         BandDefinition::new("Basic", dec!(0.20), Some(dec!(37700)), false),
    ///         BandDefinition::new("Higher", dec!(0.40), Some(dec!(125140)), false),
    ///         BandDefinition::new("Additional", dec!(0.45), None, true),
    ///     ],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(bands.entries()[1].bandwidth(), Some(dec!(87440)));
    /// assert_eq!(bands.entries()[1].cumulative_tax(), dec!(42516));
    /// assert_eq!(bands.entries()[2].cumulative_tax(), dec!(0));
    /// ```
    pub fn new(
        tax_year: TaxYear,
        regime: TaxRegime,
        definitions: Vec<BandDefinition>,
    ) -> Result<Self, BandSetError> {
        Self::validate(tax_year, regime, &definitions)?;

        let mut entries: Vec<BandEntry> = Vec::with_capacity(definitions.len());
        let mut running_tax = Decimal::ZERO;

        for (index, definition) in definitions.into_iter().enumerate() {
            let below = index.checked_sub(1);
            let below_bandwidth = below
                .and_then(|i| entries[i].cumulative_bandwidth)
                .unwrap_or(Decimal::ZERO);

            let bandwidth = definition
                .cumulative_bandwidth
                .map(|cumulative| cumulative - below_bandwidth);
            let tax_for_band = bandwidth.map_or(Decimal::ZERO, |width| width * definition.rate);

            running_tax += tax_for_band;
            let cumulative_tax = if definition.is_top_band {
                Decimal::ZERO
            } else {
                running_tax
            };

            entries.push(BandEntry {
                description: definition.description,
                rate: definition.rate,
                cumulative_bandwidth: definition.cumulative_bandwidth,
                bandwidth,
                tax_for_band,
                cumulative_tax,
                is_top_band: definition.is_top_band,
                below,
            });
        }

        Ok(Self {
            tax_year,
            regime,
            entries,
        })
    }

    fn validate(
        tax_year: TaxYear,
        regime: TaxRegime,
        definitions: &[BandDefinition],
    ) -> Result<(), BandSetError> {
        let Some(last) = definitions.last() else {
            return Err(BandSetError::Empty { tax_year, regime });
        };
        if !last.is_top_band {
            return Err(BandSetError::MissingTopBand);
        }

        let last_index = definitions.len() - 1;
        let mut previous = Decimal::ZERO;

        for (index, definition) in definitions.iter().enumerate() {
            if definition.rate < Decimal::ZERO || definition.rate > Decimal::ONE {
                return Err(BandSetError::InvalidRate {
                    index,
                    rate: definition.rate,
                });
            }
            if definition.is_top_band && index != last_index {
                return Err(BandSetError::MisplacedTopBand(index));
            }
            match definition.cumulative_bandwidth {
                Some(value) if value < previous => {
                    return Err(BandSetError::DecreasingBandwidth { index, value });
                }
                Some(value) => previous = value,
                None if !definition.is_top_band => {
                    return Err(BandSetError::UnboundedBand(index));
                }
                None => {}
            }
        }

        Ok(())
    }

    pub fn tax_year(&self) -> TaxYear {
        self.tax_year
    }

    pub fn regime(&self) -> TaxRegime {
        self.regime
    }

    pub fn entries(&self) -> &[BandEntry] {
        &self.entries
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<&BandEntry> {
        self.entries.get(index)
    }

    /// Number of bands. Never zero for a constructed set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn england_2024() -> Vec<BandDefinition> {
        vec![
            BandDefinition::new("Basic rate", dec!(0.20), Some(dec!(37700)), false),
            BandDefinition::new("Higher rate", dec!(0.40), Some(dec!(125140)), false),
            BandDefinition::new("Additional rate", dec!(0.45), None, true),
        ]
    }

    fn build(definitions: Vec<BandDefinition>) -> Result<BandSet, BandSetError> {
        BandSet::new(
            TaxYear(2024),
            TaxRegime::EnglandAndNorthernIreland,
            definitions,
        )
    }

    // =========================================================================
    // derived values
    // =========================================================================

    #[test]
    fn first_band_bandwidth_is_its_threshold() {
        let bands = build(england_2024()).unwrap();

        let basic = &bands.entries()[0];
        assert_eq!(basic.bandwidth(), Some(dec!(37700)));
        assert_eq!(basic.tax_for_band(), dec!(7540.00));
        assert_eq!(basic.cumulative_tax(), dec!(7540.00));
        assert_eq!(basic.below(), None);
    }

    #[test]
    fn later_bands_accumulate_from_below() {
        let bands = build(england_2024()).unwrap();

        let higher = &bands.entries()[1];
        assert_eq!(higher.bandwidth(), Some(dec!(87440)));
        assert_eq!(higher.tax_for_band(), dec!(34976.00));
        assert_eq!(higher.cumulative_tax(), dec!(42516.00));
        assert_eq!(higher.below(), Some(0));
    }

    #[test]
    fn unbounded_top_band_has_zero_cumulative_tax() {
        let bands = build(england_2024()).unwrap();

        let top = &bands.entries()[2];
        assert!(top.is_top_band());
        assert_eq!(top.cumulative_bandwidth(), None);
        assert_eq!(top.bandwidth(), None);
        assert_eq!(top.tax_for_band(), dec!(0));
        assert_eq!(top.cumulative_tax(), dec!(0));
        assert_eq!(top.below(), Some(1));
    }

    #[test]
    fn bounded_top_band_keeps_bandwidth_but_not_cumulative_tax() {
        let mut definitions = england_2024();
        definitions[2].cumulative_bandwidth = Some(dec!(200000));

        let bands = build(definitions).unwrap();

        let top = &bands.entries()[2];
        assert_eq!(top.cumulative_bandwidth(), Some(dec!(200000)));
        assert_eq!(top.bandwidth(), Some(dec!(74860)));
        assert_eq!(top.tax_for_band(), dec!(33687.00));
        assert_eq!(top.cumulative_tax(), dec!(0));
    }

    #[test]
    fn single_top_band_is_valid() {
        let bands = build(vec![BandDefinition::new("Flat", dec!(0.20), None, true)]).unwrap();

        assert_eq!(bands.len(), 1);
        assert_eq!(bands.entries()[0].below(), None);
    }

    #[test]
    fn cumulative_tax_is_non_decreasing_below_top() {
        let bands = build(england_2024()).unwrap();

        let below_top: Vec<Decimal> = bands
            .entries()
            .iter()
            .filter(|e| !e.is_top_band())
            .map(|e| e.cumulative_tax())
            .collect();
        assert!(below_top.windows(2).all(|w| w[0] <= w[1]));
    }

    // =========================================================================
    // validation
    // =========================================================================

    #[test]
    fn empty_definitions_are_rejected() {
        assert_eq!(
            build(vec![]),
            Err(BandSetError::Empty {
                tax_year: TaxYear(2024),
                regime: TaxRegime::EnglandAndNorthernIreland,
            })
        );
    }

    #[test]
    fn missing_top_band_is_rejected() {
        let mut definitions = england_2024();
        definitions[2].is_top_band = false;

        assert_eq!(build(definitions), Err(BandSetError::MissingTopBand));
    }

    #[test]
    fn top_band_before_last_is_rejected() {
        let mut definitions = england_2024();
        definitions[1].is_top_band = true;

        assert_eq!(build(definitions), Err(BandSetError::MisplacedTopBand(1)));
    }

    #[test]
    fn unbounded_lower_band_is_rejected() {
        let mut definitions = england_2024();
        definitions[0].cumulative_bandwidth = None;

        assert_eq!(build(definitions), Err(BandSetError::UnboundedBand(0)));
    }

    #[test]
    fn decreasing_threshold_is_rejected() {
        let mut definitions = england_2024();
        definitions[1].cumulative_bandwidth = Some(dec!(30000));

        assert_eq!(
            build(definitions),
            Err(BandSetError::DecreasingBandwidth {
                index: 1,
                value: dec!(30000),
            })
        );
    }

    #[test]
    fn rate_above_one_is_rejected() {
        let mut definitions = england_2024();
        definitions[0].rate = dec!(1.5);

        assert_eq!(
            build(definitions),
            Err(BandSetError::InvalidRate {
                index: 0,
                rate: dec!(1.5),
            })
        );
    }
}
