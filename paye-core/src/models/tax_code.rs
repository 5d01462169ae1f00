//! Structured PAYE tax codes.
//!
//! A [`TaxCode`] carries everything the calculator needs from a code string:
//! its treatment, regime, whether it is operated cumulatively, and the
//! allowance it encodes.
//!
//! | Form            | Treatment | Allowance                       |
//! |-----------------|-----------|---------------------------------|
//! | `1257L`         | L         | `1257 × 10 + 9`                 |
//! | `1383M`, `1131N`| M, N      | as L (marriage allowance)       |
//! | `1257T`         | T         | as L                            |
//! | `K475`          | K         | `-(475 × 10 + 9)`               |
//! | `0T`            | 0T        | none                            |
//! | `BR`, `D0`-`D3` | fixed     | none; flat rate from band set   |
//! | `NT`            | NT        | no tax deducted                 |
//!
//! A leading `S` or `C` selects the Scottish or Welsh regime. A trailing
//! `W1`, `M1` or `X` marks the code as non-cumulative.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TaxRegime;
use crate::calculations::common::round_up_to_pence;

static TAX_CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<regime>[SC])?(?:(?P<fixed>BR|D[0-3]|NT|0T)|(?P<number>\d{1,4})(?P<suffix>[LMNT])|K(?P<k_number>\d{1,4}))(?:\s*/?\s*(?P<basis>W1|M1|X))?$",
    )
    .expect("tax code pattern is valid")
});

/// Errors produced when parsing a tax code string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxCodeError {
    #[error("tax code is empty")]
    Empty,

    #[error("'{0}' is not a recognised tax code")]
    Unrecognised(String),
}

/// How a tax code is operated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxTreatment {
    L,
    M,
    N,
    T,
    K,
    ZeroT,
    BR,
    D0,
    D1,
    D2,
    D3,
    NT,
}

impl TaxTreatment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L => "L",
            Self::M => "M",
            Self::N => "N",
            Self::T => "T",
            Self::K => "K",
            Self::ZeroT => "0T",
            Self::BR => "BR",
            Self::D0 => "D0",
            Self::D1 => "D1",
            Self::D2 => "D2",
            Self::D3 => "D3",
            Self::NT => "NT",
        }
    }

    /// Fixed codes carry no allowance and tax at a single flat rate (or not
    /// at all, for NT).
    pub fn is_fixed(&self) -> bool {
        matches!(
            self,
            Self::BR | Self::D0 | Self::D1 | Self::D2 | Self::D3 | Self::NT
        )
    }

    fn from_fixed(s: &str) -> Option<Self> {
        match s {
            "BR" => Some(Self::BR),
            "D0" => Some(Self::D0),
            "D1" => Some(Self::D1),
            "D2" => Some(Self::D2),
            "D3" => Some(Self::D3),
            "NT" => Some(Self::NT),
            "0T" => Some(Self::ZeroT),
            _ => None,
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "L" => Some(Self::L),
            "M" => Some(Self::M),
            "N" => Some(Self::N),
            "T" => Some(Self::T),
            _ => None,
        }
    }
}

/// A parsed tax code.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use paye_core::{TaxCode, TaxRegime, TaxTreatment};
///
/// let code: TaxCode = "S1257L M1".parse().unwrap();
///
/// assert_eq!(code.treatment(), TaxTreatment::L);
/// assert_eq!(code.regime(), TaxRegime::Scotland);
/// assert!(code.is_non_cumulative());
/// assert_eq!(code.tax_free_pay_for_period(1, 12), dec!(1048.25));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxCode {
    treatment: TaxTreatment,
    regime: TaxRegime,
    code_number: Option<u32>,
    non_cumulative: bool,
}

impl TaxCode {
    /// Builds a code from its parts. `code_number` is ignored for treatments
    /// that carry no allowance.
    pub fn new(
        treatment: TaxTreatment,
        regime: TaxRegime,
        code_number: Option<u32>,
        non_cumulative: bool,
    ) -> Self {
        let code_number = match treatment {
            TaxTreatment::L
            | TaxTreatment::M
            | TaxTreatment::N
            | TaxTreatment::T
            | TaxTreatment::K => code_number,
            _ => None,
        };
        Self {
            treatment,
            regime,
            code_number,
            non_cumulative,
        }
    }

    pub fn treatment(&self) -> TaxTreatment {
        self.treatment
    }

    pub fn regime(&self) -> TaxRegime {
        self.regime
    }

    pub fn code_number(&self) -> Option<u32> {
        self.code_number
    }

    pub fn is_fixed_code(&self) -> bool {
        self.treatment.is_fixed()
    }

    pub fn is_non_cumulative(&self) -> bool {
        self.non_cumulative
    }

    pub fn is_k_code(&self) -> bool {
        self.treatment == TaxTreatment::K
    }

    /// Annual allowance encoded by the code; negative for K codes.
    pub fn annual_allowance(&self) -> Decimal {
        let Some(number) = self.code_number else {
            return Decimal::ZERO;
        };
        let allowance = Decimal::from(number) * Decimal::TEN + Decimal::from(9);
        if self.is_k_code() {
            -allowance
        } else {
            allowance
        }
    }

    /// Tax-free pay from the start of the tax year to the end of `period`.
    ///
    /// The per-period amount is the annual allowance spread evenly over the
    /// year, rounded away from zero to the penny. K codes yield a negative
    /// value (additional taxable pay).
    pub fn tax_free_pay_for_period(
        &self,
        period: u32,
        periods_in_year: u32,
    ) -> Decimal {
        let annual = self.annual_allowance();
        if annual.is_zero() || periods_in_year == 0 {
            return Decimal::ZERO;
        }
        let per_period = round_up_to_pence(annual / Decimal::from(periods_in_year));
        per_period * Decimal::from(period)
    }
}

impl FromStr for TaxCode {
    type Err = TaxCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase();
        if normalised.is_empty() {
            return Err(TaxCodeError::Empty);
        }

        let unrecognised = || TaxCodeError::Unrecognised(s.trim().to_string());
        let captures = TAX_CODE_PATTERN
            .captures(&normalised)
            .ok_or_else(unrecognised)?;

        let regime = match captures.name("regime").map(|m| m.as_str()) {
            Some("S") => TaxRegime::Scotland,
            Some("C") => TaxRegime::Wales,
            _ => TaxRegime::EnglandAndNorthernIreland,
        };
        let non_cumulative = captures.name("basis").is_some();

        let (treatment, code_number) = if let Some(fixed) = captures.name("fixed") {
            (
                TaxTreatment::from_fixed(fixed.as_str()).ok_or_else(unrecognised)?,
                None,
            )
        } else if let Some(k_number) = captures.name("k_number") {
            let number = k_number.as_str().parse().map_err(|_| unrecognised())?;
            (TaxTreatment::K, Some(number))
        } else {
            let suffix = captures.name("suffix").ok_or_else(unrecognised)?;
            let number = captures
                .name("number")
                .ok_or_else(unrecognised)?
                .as_str()
                .parse()
                .map_err(|_| unrecognised())?;
            (
                TaxTreatment::from_suffix(suffix.as_str()).ok_or_else(unrecognised)?,
                Some(number),
            )
        };

        Ok(TaxCode::new(treatment, regime, code_number, non_cumulative))
    }
}

impl fmt::Display for TaxCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.regime {
            TaxRegime::Scotland => f.write_str("S")?,
            TaxRegime::Wales => f.write_str("C")?,
            TaxRegime::EnglandAndNorthernIreland => {}
        }
        match (self.treatment, self.code_number) {
            (TaxTreatment::K, Some(number)) => write!(f, "K{number}")?,
            (treatment, Some(number)) => write!(f, "{number}{}", treatment.as_str())?,
            (treatment, None) => f.write_str(treatment.as_str())?,
        }
        if self.non_cumulative {
            f.write_str(" X")?;
        }
        Ok(())
    }
}
