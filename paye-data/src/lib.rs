//! Band reference data for the PAYE engine: CSV loading and an in-memory
//! [`BandRepository`](paye_core::BandRepository).

mod loader;
mod repository;

pub use loader::{BandLoader, BandLoaderError, BandRecord};
pub use repository::InMemoryBandRepository;
