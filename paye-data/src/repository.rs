use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use paye_core::{BandRepository, BandSet, RepositoryError, TaxRegime, TaxYear};

/// Band sets held in memory, keyed by tax year and regime.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBandRepository {
    band_sets: BTreeMap<(TaxYear, TaxRegime), Arc<BandSet>>,
}

impl InMemoryBandRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `band_set`, returning any set it replaced for the same tax
    /// year and regime.
    pub fn insert(
        &mut self,
        band_set: BandSet,
    ) -> Option<Arc<BandSet>> {
        let key = (band_set.tax_year(), band_set.regime());
        self.band_sets.insert(key, Arc::new(band_set))
    }

    pub fn len(&self) -> usize {
        self.band_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.band_sets.is_empty()
    }
}

#[async_trait]
impl BandRepository for InMemoryBandRepository {
    async fn get_band_set(
        &self,
        tax_year: TaxYear,
        regime: TaxRegime,
    ) -> Result<Arc<BandSet>, RepositoryError> {
        self.band_sets
            .get(&(tax_year, regime))
            .cloned()
            .ok_or(RepositoryError::NotFound { tax_year, regime })
    }

    async fn list_tax_years(&self) -> Result<Vec<TaxYear>, RepositoryError> {
        let mut years: Vec<TaxYear> = self.band_sets.keys().map(|(year, _)| *year).collect();
        years.dedup();
        Ok(years)
    }
}
