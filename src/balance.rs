//! Computes a user's available balance from their recorded incomes and expenses.

use rusqlite::Connection;

use crate::{Error, UserID, money::Amount};

/// The sums of a user's incomes and expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    /// The sum of every income the user has recorded.
    pub income: Amount,
    /// The sum of every expense the user has recorded.
    pub expenses: Amount,
}

impl Totals {
    /// The money the user has left to spend.
    pub fn balance(&self) -> Amount {
        self.income - self.expenses
    }
}

/// Get the sums of all of the incomes and expenses for `user_id`.
///
/// A user with no transactions has zero income and zero expenses.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_totals(user_id: UserID, connection: &Connection) -> Result<Totals, Error> {
    connection
        .query_row(
            "SELECT
                (SELECT COALESCE(SUM(amount), 0) FROM income WHERE user_id = :user_id),
                (SELECT COALESCE(SUM(amount), 0) FROM expense WHERE user_id = :user_id)",
            &[(":user_id", &user_id.as_i64())],
            |row| {
                Ok(Totals {
                    income: row.get(0)?,
                    expenses: row.get(1)?,
                })
            },
        )
        .map_err(Error::from)
}

/// Get the available balance for `user_id`: total income minus total expenses.
///
/// The balance is always computed from the stored rows.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_balance(user_id: UserID, connection: &Connection) -> Result<Amount, Error> {
    get_totals(user_id, connection).map(|totals| totals.balance())
}
