//! Calendar months used to select expenses, incomes and budgets.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, de};
use time::{Date, Month, OffsetDateTime, UtcOffset};

use crate::Error;

/// A calendar month, written as "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: Month,
}

impl MonthKey {
    /// Create a month key if `year` is a four digit year and `month` is between 1 and 12.
    pub fn new(year: i32, month: u8) -> Option<Self> {
        if !(1..=9999).contains(&year) {
            return None;
        }

        let month = Month::try_from(month).ok()?;

        Some(Self { year, month })
    }

    /// The month that contains `date`.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month in the timezone with `local_offset`.
    pub fn current(local_offset: UtcOffset) -> Self {
        Self::from_date(OffsetDateTime::now_utc().to_offset(local_offset).date())
    }

    /// Parse `raw_month`, or fall back to the current month if it is missing or malformed.
    pub fn parse_or_current(raw_month: Option<&str>, local_offset: UtcOffset) -> Self {
        match raw_month.map(str::parse::<MonthKey>) {
            Some(Ok(month)) => month,
            Some(Err(error)) => {
                tracing::debug!("Falling back to the current month: {error}");
                Self::current(local_offset)
            }
            None => Self::current(local_offset),
        }
    }

    /// The year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the year.
    pub fn month(&self) -> Month {
        self.month
    }

    /// Whether `date` falls within this month.
    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The month before this one, or `None` before January of year 1.
    pub fn previous(&self) -> Option<Self> {
        match self.month {
            Month::January => Self::new(self.year - 1, u8::from(Month::December)),
            month => Self::new(self.year, u8::from(month.previous())),
        }
    }

    /// The month after this one, or `None` after December 9999.
    pub fn next(&self) -> Option<Self> {
        match self.month {
            Month::December => Self::new(self.year + 1, u8::from(Month::January)),
            month => Self::new(self.year, u8::from(month.next())),
        }
    }

    /// A human readable label, e.g. "March 2025".
    pub fn label(&self) -> String {
        format!("{} {}", self.month, self.year)
    }
}

/// The query string for pages that show one month at a time, e.g. "?mes=2025-03".
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// The month to show. Missing or malformed values select the current month.
    pub mes: Option<String>,
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(raw_month: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(raw_month.to_owned());

        let (year, month) = raw_month.trim().split_once('-').ok_or_else(invalid)?;

        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;

        MonthKey::new(year, month).ok_or_else(invalid)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_month = String::deserialize(deserializer)?;
        raw_month.parse().map_err(de::Error::custom)
    }
}

impl rusqlite::ToSql for MonthKey {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.to_string()))
    }
}

impl rusqlite::types::FromSql for MonthKey {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let raw_month = value.as_str()?;

        raw_month
            .parse()
            .map_err(|error| rusqlite::types::FromSqlError::Other(Box::new(error)))
    }
}
