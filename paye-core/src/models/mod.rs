mod band;
mod pay_frequency;
mod tax_code;
mod tax_regime;
mod tax_year;

pub use band::{BandDefinition, BandEntry, BandSet, BandSetError};
pub use pay_frequency::PayFrequency;
pub use tax_code::{TaxCode, TaxCodeError, TaxTreatment};
pub use tax_regime::TaxRegime;
pub use tax_year::TaxYear;
