use std::collections::BTreeMap;
use std::io::Read;

use paye_core::{BandDefinition, BandSet, BandSetError, TaxRegime, TaxYear};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::repository::InMemoryBandRepository;

/// Errors that can occur when loading band data.
#[derive(Debug, Error)]
pub enum BandLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown regime '{0}'")]
    UnknownRegime(String),

    #[error("Invalid bands for {regime} {tax_year}: {source}")]
    InvalidBandSet {
        tax_year: TaxYear,
        regime: TaxRegime,
        #[source]
        source: BandSetError,
    },
}

impl From<csv::Error> for BandLoaderError {
    fn from(err: csv::Error) -> Self {
        BandLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the bands CSV file.
///
/// - `tax_year`: the calendar year the tax year starts in (2024 for 2024/25)
/// - `regime`: `E` (England & NI), `S` (Scotland) or `C` (Wales)
/// - `description`: band name, e.g. "Higher rate"
/// - `rate`: the band's rate as a decimal (e.g. 0.40 for 40%)
/// - `cumulative_bandwidth`: annual upper threshold (empty for the top band)
/// - `is_top_band`: `true` for the last, unbounded band
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BandRecord {
    pub tax_year: i32,
    pub regime: String,
    pub description: String,
    pub rate: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub cumulative_bandwidth: Option<Decimal>,
    pub is_top_band: bool,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for band data from CSV files.
pub struct BandLoader;

impl BandLoader {
    /// Parse band records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BandRecord>, BandLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BandRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Build a repository from parsed records.
    ///
    /// Records are grouped by (tax_year, regime). Bands keep the order they
    /// appear in within each group, and every group must form a valid
    /// [`BandSet`].
    pub fn load(records: &[BandRecord]) -> Result<InMemoryBandRepository, BandLoaderError> {
        let mut groups: BTreeMap<(TaxYear, TaxRegime), Vec<BandDefinition>> = BTreeMap::new();

        for record in records {
            let regime = TaxRegime::parse(&record.regime)
                .ok_or_else(|| BandLoaderError::UnknownRegime(record.regime.clone()))?;
            groups
                .entry((TaxYear(record.tax_year), regime))
                .or_default()
                .push(BandDefinition::new(
                    record.description.clone(),
                    record.rate,
                    record.cumulative_bandwidth,
                    record.is_top_band,
                ));
        }

        let mut repository = InMemoryBandRepository::new();
        for ((tax_year, regime), definitions) in groups {
            debug!(
                tax_year = %tax_year,
                regime = %regime,
                bands = definitions.len(),
                "building band set"
            );
            let band_set = BandSet::new(tax_year, regime, definitions).map_err(|source| {
                BandLoaderError::InvalidBandSet {
                    tax_year,
                    regime,
                    source,
                }
            })?;
            repository.insert(band_set);
        }

        Ok(repository)
    }
}
