use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use super::repository::{BandRepository, RepositoryError};
use crate::calculations::{TaxCalculationError, TaxCalculator};
use crate::models::{PayFrequency, TaxRegime, TaxYear};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FactoryError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Calculation(#[from] TaxCalculationError),
}

/// Builds [`TaxCalculator`]s from a [`BandRepository`].
///
/// The factory owns the only async step in the engine: fetching the band
/// set. Once a calculator is built it needs no further I/O and can be
/// shared across threads.
#[derive(Clone)]
pub struct CalculatorFactory {
    repository: Arc<dyn BandRepository>,
}

impl CalculatorFactory {
    pub fn new(repository: Arc<dyn BandRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &dyn BandRepository {
        self.repository.as_ref()
    }

    /// Builds a calculator for the tax year containing `pay_date`.
    ///
    /// # Errors
    /// * [`FactoryError::Repository`] if there are no bands for the
    ///   resolved tax year and `regime`.
    /// * [`FactoryError::Calculation`] if `tax_period` is out of range for
    ///   `pay_frequency`.
    pub async fn create(
        &self,
        regime: TaxRegime,
        pay_date: NaiveDate,
        pay_frequency: PayFrequency,
        tax_period: u32,
    ) -> Result<TaxCalculator, FactoryError> {
        let tax_year = TaxYear::from_date(pay_date);
        self.create_for_year(tax_year, regime, pay_frequency, tax_period)
            .await
    }

    /// Builds a calculator for an explicit tax year.
    pub async fn create_for_year(
        &self,
        tax_year: TaxYear,
        regime: TaxRegime,
        pay_frequency: PayFrequency,
        tax_period: u32,
    ) -> Result<TaxCalculator, FactoryError> {
        debug!(
            tax_year = %tax_year,
            regime = %regime,
            frequency = %pay_frequency,
            period = tax_period,
            "creating tax calculator"
        );
        let bands = self.repository.get_band_set(tax_year, regime).await?;
        let calculator = TaxCalculator::new(tax_year, regime, bands, pay_frequency, tax_period)?;
        Ok(calculator)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{BandDefinition, BandSet};

    // ── stub repository ──────────────────────────────────────────────────
    struct StubRepository {
        band_sets: HashMap<(TaxYear, TaxRegime), Arc<BandSet>>,
        calls: AtomicUsize,
    }

    impl StubRepository {
        fn with_england(tax_year: TaxYear) -> Self {
            let bands = BandSet::new(
                tax_year,
                TaxRegime::EnglandAndNorthernIreland,
                vec![
                    BandDefinition::new("Basic rate", dec!(0.20), Some(dec!(37700)), false),
                    BandDefinition::new("Higher rate", dec!(0.40), Some(dec!(125140)), false),
                    BandDefinition::new("Additional rate", dec!(0.45), None, true),
                ],
            )
            .unwrap();

            let mut band_sets = HashMap::new();
            band_sets.insert(
                (tax_year, TaxRegime::EnglandAndNorthernIreland),
                Arc::new(bands),
            );
            Self {
                band_sets,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BandRepository for StubRepository {
        async fn get_band_set(
            &self,
            tax_year: TaxYear,
            regime: TaxRegime,
        ) -> Result<Arc<BandSet>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.band_sets
                .get(&(tax_year, regime))
                .cloned()
                .ok_or(RepositoryError::NotFound { tax_year, regime })
        }

        async fn list_tax_years(&self) -> Result<Vec<TaxYear>, RepositoryError> {
            let mut years: Vec<TaxYear> = self.band_sets.keys().map(|(year, _)| *year).collect();
            years.sort();
            years.dedup();
            Ok(years)
        }
    }

    fn date(
        year: i32,
        month: u32,
        day: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // ── successful creation ──────────────────────────────────────────────
    #[tokio::test]
    async fn create_resolves_tax_year_from_pay_date() {
        let factory = CalculatorFactory::new(Arc::new(StubRepository::with_england(TaxYear(2024))));

        let calculator = factory
            .create(
                TaxRegime::EnglandAndNorthernIreland,
                date(2024, 9, 30),
                PayFrequency::Monthly,
                6,
            )
            .await
            .unwrap();

        assert_eq!(calculator.tax_year(), TaxYear(2024));
        assert_eq!(calculator.tax_period(), 6);
        assert_eq!(calculator.periods_in_year(), 12);
    }

    #[tokio::test]
    async fn early_april_pay_date_belongs_to_previous_year() {
        let factory = CalculatorFactory::new(Arc::new(StubRepository::with_england(TaxYear(2024))));

        let calculator = factory
            .create(
                TaxRegime::EnglandAndNorthernIreland,
                date(2025, 4, 5),
                PayFrequency::Monthly,
                12,
            )
            .await
            .unwrap();

        assert_eq!(calculator.tax_year(), TaxYear(2024));
    }

    #[tokio::test]
    async fn create_fetches_bands_once_per_calculator() {
        let repository = Arc::new(StubRepository::with_england(TaxYear(2024)));
        let factory = CalculatorFactory::new(repository.clone());

        factory
            .create_for_year(
                TaxYear(2024),
                TaxRegime::EnglandAndNorthernIreland,
                PayFrequency::Weekly,
                1,
            )
            .await
            .unwrap();

        assert_eq!(repository.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repository_lists_available_years() {
        let factory = CalculatorFactory::new(Arc::new(StubRepository::with_england(TaxYear(2024))));

        let years = factory.repository().list_tax_years().await.unwrap();

        assert_eq!(years, vec![TaxYear(2024)]);
    }

    // ── errors ───────────────────────────────────────────────────────────
    #[tokio::test]
    async fn missing_bands_surface_repository_error() {
        let factory = CalculatorFactory::new(Arc::new(StubRepository::with_england(TaxYear(2024))));

        let result = factory
            .create(TaxRegime::Scotland, date(2024, 5, 1), PayFrequency::Monthly, 1)
            .await;

        assert_eq!(
            result.err(),
            Some(FactoryError::Repository(RepositoryError::NotFound {
                tax_year: TaxYear(2024),
                regime: TaxRegime::Scotland,
            }))
        );
    }

    #[tokio::test]
    async fn out_of_range_period_surfaces_calculation_error() {
        let factory = CalculatorFactory::new(Arc::new(StubRepository::with_england(TaxYear(2024))));

        let result = factory
            .create(
                TaxRegime::EnglandAndNorthernIreland,
                date(2024, 5, 1),
                PayFrequency::Fortnightly,
                27,
            )
            .await;

        assert!(matches!(
            result,
            Err(FactoryError::Calculation(TaxCalculationError::Argument(_)))
        ));
    }
}
