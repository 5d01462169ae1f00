use std::fmt;

use serde::{Deserialize, Serialize};

/// Country-specific income tax regime a band set or tax code applies to.
///
/// Wales shares the England & Northern Ireland rates today but carries its
/// own band set so the two can diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaxRegime {
    EnglandAndNorthernIreland,
    Scotland,
    Wales,
}

impl TaxRegime {
    /// Short code used in reference data files. Matches the tax code prefix
    /// for Scotland (`S`) and Wales (`C`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnglandAndNorthernIreland => "E",
            Self::Scotland => "S",
            Self::Wales => "C",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "E" | "ENI" | "ENGLAND" => Some(Self::EnglandAndNorthernIreland),
            "S" | "SCOTLAND" => Some(Self::Scotland),
            "C" | "W" | "WALES" => Some(Self::Wales),
            _ => None,
        }
    }

    pub fn all() -> &'static [TaxRegime] {
        &[
            TaxRegime::EnglandAndNorthernIreland,
            TaxRegime::Scotland,
            TaxRegime::Wales,
        ]
    }
}

impl fmt::Display for TaxRegime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::EnglandAndNorthernIreland => "England & Northern Ireland",
            Self::Scotland => "Scotland",
            Self::Wales => "Wales",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_round_trips_short_codes() {
        for regime in TaxRegime::all() {
            assert_eq!(TaxRegime::parse(regime.as_str()), Some(*regime));
        }
    }

    #[test]
    fn parse_accepts_names_case_insensitively() {
        assert_eq!(TaxRegime::parse("scotland"), Some(TaxRegime::Scotland));
        assert_eq!(TaxRegime::parse(" Wales "), Some(TaxRegime::Wales));
        assert_eq!(
            TaxRegime::parse("eni"),
            Some(TaxRegime::EnglandAndNorthernIreland)
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(TaxRegime::parse("X"), None);
        assert_eq!(TaxRegime::parse(""), None);
    }
}
