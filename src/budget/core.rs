//! Monthly category budgets and the spend recorded against them.

use rusqlite::{Connection, Row, params};

use crate::{
    Error, UserID,
    category::CategoryId,
    db::{fetch_all, fetch_one},
    money::Amount,
    month::MonthKey,
};

/// The database ID of a budget.
pub type BudgetId = i64;

/// How much of a budget has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetStatus {
    /// The most the user wants to spend on the category in the month.
    pub ceiling: Amount,
    /// What the user has already spent on the category in the month.
    pub accumulated: Amount,
}

impl BudgetStatus {
    /// What is left to spend. Negative when the budget has been overspent.
    pub fn remaining(&self) -> Amount {
        self.ceiling - self.accumulated
    }

    /// Whether spending `amount` more would go over the ceiling.
    pub fn would_exceed(&self, amount: Amount) -> bool {
        self.remaining() < amount
    }
}

/// A budget with its category details for display.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    pub id: BudgetId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub category_color: String,
    pub category_icon: String,
    pub month: MonthKey,
    pub status: BudgetStatus,
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES expense_category(id) ON DELETE CASCADE,
            month TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            UNIQUE (user_id, category_id, month)
        )",
        (),
    )?;

    Ok(())
}

/// The sum of the expenses of `user_id` in `category_id` during `month`.
const ACCUMULATED_SPEND_SQL: &str = "SELECT COALESCE(SUM(e.amount), 0) FROM expense e
    WHERE e.user_id = b.user_id
    AND e.category_id = b.category_id
    AND substr(e.date, 1, 7) = b.month";

/// Get the budget for a category in a month and how much of it has been spent.
///
/// Returns `None` if the user has not set a budget for the category and month,
/// in which case there is no limit on spending.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_budget_status(
    user_id: UserID,
    category_id: CategoryId,
    month: MonthKey,
    connection: &Connection,
) -> Result<Option<BudgetStatus>, Error> {
    fetch_one(
        connection,
        &format!(
            "SELECT b.amount, ({ACCUMULATED_SPEND_SQL}) FROM budget b
            WHERE b.user_id = ?1 AND b.category_id = ?2 AND b.month = ?3"
        ),
        params![user_id.as_i64(), category_id, month],
        |row| {
            Ok(BudgetStatus {
                ceiling: row.get(0)?,
                accumulated: row.get(1)?,
            })
        },
    )
}

/// Set the ceiling of the budget for a category in a month, creating the
/// budget if it does not exist.
///
/// # Errors
///
/// Returns:
/// - [Error::NonPositiveAmount] if `ceiling` is zero or less.
/// - [Error::InvalidForeignKey] if `category_id` is not an expense category.
/// - [Error::SqlError] if there was some other SQL error.
pub fn set_budget(
    user_id: UserID,
    category_id: CategoryId,
    month: MonthKey,
    ceiling: Amount,
    connection: &Connection,
) -> Result<BudgetId, Error> {
    if !ceiling.is_positive() {
        return Err(Error::NonPositiveAmount);
    }

    connection
        .query_row(
            "INSERT INTO budget (user_id, category_id, month, amount) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (user_id, category_id, month) DO UPDATE SET amount = excluded.amount
            RETURNING id",
            params![user_id.as_i64(), category_id, month, ceiling],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

fn map_summary_row(row: &Row) -> Result<BudgetSummary, rusqlite::Error> {
    Ok(BudgetSummary {
        id: row.get(0)?,
        category_id: row.get(1)?,
        category_name: row.get(2)?,
        category_color: row.get(3)?,
        category_icon: row.get(4)?,
        month: row.get(5)?,
        status: BudgetStatus {
            ceiling: row.get(6)?,
            accumulated: row.get(7)?,
        },
    })
}

/// Get the budgets of `user_id` for `month` ordered by category name.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_budgets_for_month(
    user_id: UserID,
    month: MonthKey,
    connection: &Connection,
) -> Result<Vec<BudgetSummary>, Error> {
    fetch_all(
        connection,
        &format!(
            "SELECT b.id, b.category_id, c.name, c.color, c.icon, b.month, b.amount,
                ({ACCUMULATED_SPEND_SQL})
            FROM budget b
            INNER JOIN expense_category c ON c.id = b.category_id
            WHERE b.user_id = ?1 AND b.month = ?2
            ORDER BY c.name ASC"
        ),
        params![user_id.as_i64(), month],
        map_summary_row,
    )
}

/// Delete one of the budgets of `user_id`.
///
/// # Errors
///
/// Returns [Error::BudgetNotFound] if the budget does not exist or belongs to
/// another user.
pub fn delete_budget(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        params![budget_id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::BudgetNotFound)
    } else {
        Ok(())
    }
}
