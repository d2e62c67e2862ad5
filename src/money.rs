//! Fixed-point money amounts.
//!
//! Amounts are stored in the database as an integer number of cents so that
//! `SUM()` in SQL stays exact, and are kept as [Decimal] in Rust code.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub, SubAssign},
    str::FromStr,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::Error;

/// The number of decimal places kept for an amount of money.
const CENT_SCALE: u32 = 2;

/// An amount of money with exactly two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] Decimal);

impl Amount {
    /// Zero dollars.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create an amount from a decimal, rounding to the nearest cent.
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Create an amount from an integer number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, CENT_SCALE))
    }

    /// The amount as an integer number of cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount does not fit into 64 bits once
    /// converted to cents.
    pub fn as_cents(&self) -> Result<i64, std::num::TryFromIntError> {
        let mut value = self.0;
        value.rescale(CENT_SCALE);

        i64::try_from(value.mantissa())
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Parse an amount typed by a user.
    ///
    /// The input uses `.` as the thousands separator and `,` as the decimal
    /// separator, e.g. "1.500" is fifteen hundred and "1.234,56" is one
    /// thousand two hundred and thirty-four dollars and fifty-six cents.
    /// Surrounding whitespace and a leading `$` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if the text is not a number or has more
    /// than two decimal places.
    pub fn parse_localized(raw_amount: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidAmount(raw_amount.to_owned());

        let trimmed = raw_amount.trim();
        let (sign, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => ("-", rest.trim_start()),
            None => ("", trimmed),
        };
        let digits = digits.strip_prefix('$').unwrap_or(digits).trim_start();

        if digits.is_empty()
            || !digits
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        {
            return Err(invalid());
        }

        let mut parts = digits.split(',');
        let whole = parts.next().unwrap_or_default().replace('.', "");
        let fraction = parts.next();

        if parts.next().is_some() || whole.is_empty() {
            return Err(invalid());
        }

        let normalized = match fraction {
            Some(fraction) if fraction.is_empty() || fraction.contains('.') => {
                return Err(invalid());
            }
            Some(fraction) => format!("{sign}{whole}.{fraction}"),
            None => format!("{sign}{whole}"),
        };

        let value = Decimal::from_str(&normalized)
            .map_err(|_| invalid())?
            .normalize();

        if value.scale() > CENT_SCALE {
            return Err(invalid());
        }

        Ok(Self::new(value))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |total, amount| total + amount)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let cents = self
            .as_cents()
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;

        Ok(ToSqlOutput::from(cents))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Amount::from_cents)
    }
}


#[cfg(test)]
mod amount_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;

    use crate::money::Amount;

    #[test]
    fn converts_to_and_from_cents() {
        let amount = Amount::new(dec!(1234.56));

        assert_eq!(amount.as_cents(), Ok(123456));
        assert_eq!(Amount::from_cents(123456), amount);
    }

    #[test]
    fn rounds_to_nearest_cent() {
        assert_eq!(Amount::new(dec!(0.005)), Amount::new(dec!(0.01)));
        assert_eq!(Amount::new(dec!(-0.005)), Amount::new(dec!(-0.01)));
    }

    #[test]
    fn sums_exactly() {
        let total: Amount = [dec!(0.1), dec!(0.2), dec!(0.3)]
            .into_iter()
            .map(Amount::new)
            .sum();

        assert_eq!(total, Amount::new(dec!(0.6)));
    }

    #[test]
    fn stored_as_integer_cents() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute("CREATE TABLE money (amount INTEGER NOT NULL)", ())
            .unwrap();
        connection
            .execute(
                "INSERT INTO money (amount) VALUES (?1), (?2)",
                (Amount::new(dec!(0.1)), Amount::new(dec!(0.2))),
            )
            .unwrap();

        let raw_total: i64 = connection
            .query_row("SELECT SUM(amount) FROM money", [], |row| row.get(0))
            .unwrap();
        let total: Amount = connection
            .query_row("SELECT SUM(amount) FROM money", [], |row| row.get(0))
            .unwrap();

        assert_eq!(raw_total, 30);
        assert_eq!(total, Amount::new(dec!(0.3)));
    }

    #[test]
    fn serializes_as_json_number() {
        let json = serde_json::to_string(&Amount::new(dec!(1500.25))).unwrap();

        assert_eq!(json, "1500.25");
    }
}
