pub mod factory;
pub mod repository;

pub use factory::{CalculatorFactory, FactoryError};
pub use repository::{BandRepository, RepositoryError};
