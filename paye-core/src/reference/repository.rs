use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{BandSet, TaxRegime, TaxYear};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("no bands for {regime} {tax_year}")]
    NotFound { tax_year: TaxYear, regime: TaxRegime },
}

/// Source of annual band sets.
#[async_trait]
pub trait BandRepository: Send + Sync {
    async fn get_band_set(
        &self,
        tax_year: TaxYear,
        regime: TaxRegime,
    ) -> Result<Arc<BandSet>, RepositoryError>;

    /// Every tax year with at least one band set, ascending.
    async fn list_tax_years(&self) -> Result<Vec<TaxYear>, RepositoryError>;
}
