//! Parsing for the fields shared by the expense, income, budget and savings forms.
//!
//! Form values arrive as optional strings, where empty inputs have already
//! been turned into `None` by [axum_extra::extract::Form].

use rust_decimal::Decimal;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, category::CategoryId, money::Amount};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The largest amount accepted from a form, one billion dollars.
///
/// Amounts are summed as cents in 64-bit integers, this leaves room for
/// about ninety million rows at the maximum before a sum can overflow.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Get the value of a required field, treating whitespace as missing.
pub fn required(value: Option<&str>, field_name: &'static str) -> Result<String, Error> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_owned()),
        _ => Err(Error::MissingField(field_name)),
    }
}

/// Parse a localized amount, e.g. "1.234,56", that must be greater than zero
/// and at most [MAX_AMOUNT].
pub fn parse_positive_amount(raw_amount: &str) -> Result<Amount, Error> {
    let amount = Amount::parse_localized(raw_amount)?;

    if !amount.is_positive() {
        Err(Error::NonPositiveAmount)
    } else if amount.as_decimal() > MAX_AMOUNT {
        Err(Error::InvalidAmount(raw_amount.to_owned()))
    } else {
        Ok(amount)
    }
}

/// Parse a "YYYY-MM-DD" date.
pub fn parse_date(raw_date: &str) -> Result<Date, Error> {
    Date::parse(raw_date.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate(raw_date.to_owned()))
}

/// Parse a category ID.
///
/// This only checks the ID is a number, not that the category exists.
pub fn parse_category_id(raw_category_id: &str) -> Result<CategoryId, Error> {
    raw_category_id
        .trim()
        .parse()
        .map_err(|_| Error::InvalidCategory(raw_category_id.to_owned()))
}

/// Interpret an HTML checkbox value, which is only sent when the box is ticked.
pub fn is_checked(value: Option<&str>) -> bool {
    value.is_some_and(|value| matches!(value, "on" | "true" | "1"))
}
