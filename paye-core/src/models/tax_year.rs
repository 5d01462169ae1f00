use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// UK tax year, identified by the calendar year in which it starts.
///
/// `TaxYear(2024)` is the 2024/25 tax year, running 6 April 2024 to
/// 5 April 2025.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Tax year containing `date`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use paye_core::TaxYear;
    ///
    /// let before = NaiveDate::from_ymd_opt(2025, 4, 5).unwrap();
    /// let after = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
    ///
    /// assert_eq!(TaxYear::from_date(before), TaxYear(2024));
    /// assert_eq!(TaxYear::from_date(after), TaxYear(2025));
    /// ```
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        if (date.month(), date.day()) >= (4, 6) {
            TaxYear(year)
        } else {
            TaxYear(year - 1)
        }
    }

    /// First day of the tax year (6 April).
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 4, 6)
    }

    /// Last day of the tax year (5 April of the following year).
    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0 + 1, 4, 5)
    }
}

impl fmt::Display for TaxYear {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{:02}", self.0, (self.0 + 1) % 100)
    }
}
