use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayFrequency {
    Weekly,
    Fortnightly,
    FourWeekly,
    Monthly,
    Quarterly,
    BiAnnually,
    Annually,
}

impl PayFrequency {
    /// Number of standard tax periods in a tax year at this frequency.
    pub fn periods_in_year(&self) -> u32 {
        match self {
            Self::Weekly => 52,
            Self::Fortnightly => 26,
            Self::FourWeekly => 13,
            Self::Monthly => 12,
            Self::Quarterly => 4,
            Self::BiAnnually => 2,
            Self::Annually => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Fortnightly => "fortnightly",
            Self::FourWeekly => "four-weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::BiAnnually => "bi-annually",
            Self::Annually => "annually",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "w" => Some(Self::Weekly),
            "fortnightly" | "2w" => Some(Self::Fortnightly),
            "four-weekly" | "fourweekly" | "4w" => Some(Self::FourWeekly),
            "monthly" | "m" => Some(Self::Monthly),
            "quarterly" | "q" => Some(Self::Quarterly),
            "bi-annually" | "biannually" => Some(Self::BiAnnually),
            "annually" | "yearly" | "a" => Some(Self::Annually),
            _ => None,
        }
    }
}

impl fmt::Display for PayFrequency {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
