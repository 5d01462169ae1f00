pub mod calculations;
pub mod models;
pub mod reference;

pub use calculations::{TaxCalculationError, TaxCalculationInput, TaxCalculationResult, TaxCalculator};
pub use models::*;
pub use reference::{BandRepository, CalculatorFactory, FactoryError, RepositoryError};
