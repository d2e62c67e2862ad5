//! Savings goals: a target amount the user is saving towards.
//!
//! Goals are tracked separately from incomes and expenses, contributions do
//! not change the user's balance.

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    Error, UserID,
    db::{execute_write, fetch_all, fetch_one},
    fields::{parse_date, parse_positive_amount, required},
    money::Amount,
};

/// The database ID of a savings goal.
pub type SavingsGoalId = i64;

/// Something the user is saving towards.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsGoal {
    pub id: SavingsGoalId,
    pub name: String,
    pub target: Amount,
    pub accumulated: Amount,
    pub start_date: Date,
    pub target_date: Option<Date>,
    pub completed: bool,
}

impl SavingsGoal {
    /// How far along the goal is as a percentage between 0 and 100.
    pub fn progress_percent(&self) -> u8 {
        if !self.target.is_positive() {
            return 0;
        }

        let percent = self.accumulated.as_decimal() * Decimal::ONE_HUNDRED
            / self.target.as_decimal();

        percent
            .floor()
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            .try_into()
            .unwrap_or_default()
    }
}

/// The form data for creating a savings goal.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SavingsGoalForm {
    pub name: Option<String>,
    /// A localized amount, e.g. "10.000".
    pub target: Option<String>,
    /// An optional "YYYY-MM-DD" date to reach the goal by.
    pub target_date: Option<String>,
}

/// The form data for adding money to a savings goal.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ContributionForm {
    pub amount: Option<String>,
}

pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            target INTEGER NOT NULL CHECK (target > 0),
            accumulated INTEGER NOT NULL DEFAULT 0,
            start_date TEXT NOT NULL,
            target_date TEXT,
            completed INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        name: row.get(1)?,
        target: row.get(2)?,
        accumulated: row.get(3)?,
        start_date: row.get(4)?,
        target_date: row.get(5)?,
        completed: row.get(6)?,
    })
}

/// Create a savings goal for `user_id` starting on `today`.
///
/// # Errors
///
/// Returns a field error if the name or target is missing, the target is not
/// a positive amount, or the target date is malformed or before `today`.
pub fn create_savings_goal(
    user_id: UserID,
    form: &SavingsGoalForm,
    today: Date,
    connection: &mut Connection,
) -> Result<SavingsGoal, Error> {
    let name = required(form.name.as_deref(), "name")?;
    let target = parse_positive_amount(&required(form.target.as_deref(), "target")?)?;
    let target_date = match form.target_date.as_deref().map(str::trim) {
        Some(raw_date) if !raw_date.is_empty() => Some(parse_date(raw_date)?),
        _ => None,
    };

    if let Some(date) = target_date.filter(|date| *date < today) {
        return Err(Error::InvalidDate(date.to_string()));
    }

    let id = execute_write(
        connection,
        "INSERT INTO savings_goal (user_id, name, target, start_date, target_date)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id.as_i64(), name, target, today, target_date],
    )?;

    Ok(SavingsGoal {
        id,
        name,
        target,
        accumulated: Amount::ZERO,
        start_date: today,
        target_date,
        completed: false,
    })
}

/// Add `amount` to a savings goal of `user_id`, marking the goal completed
/// once the target has been reached.
///
/// # Errors
///
/// Returns [Error::NonPositiveAmount] for an amount of zero or less, or
/// [Error::SavingsGoalNotFound] if the goal does not exist or belongs to
/// another user.
pub fn add_contribution(
    user_id: UserID,
    goal_id: SavingsGoalId,
    amount: Amount,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    if !amount.is_positive() {
        return Err(Error::NonPositiveAmount);
    }

    fetch_one(
        connection,
        "UPDATE savings_goal
        SET accumulated = accumulated + ?1,
            completed = (accumulated + ?1 >= target)
        WHERE id = ?2 AND user_id = ?3
        RETURNING id, name, target, accumulated, start_date, target_date, completed",
        params![amount, goal_id, user_id.as_i64()],
        map_row,
    )?
    .ok_or(Error::SavingsGoalNotFound)
}

/// Get the savings goals of `user_id`, unfinished goals first.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_savings_goals(user_id: UserID, connection: &Connection) -> Result<Vec<SavingsGoal>, Error> {
    fetch_all(
        connection,
        "SELECT id, name, target, accumulated, start_date, target_date, completed
        FROM savings_goal
        WHERE user_id = ?1
        ORDER BY completed ASC, target_date IS NULL, target_date ASC, id ASC",
        params![user_id.as_i64()],
        map_row,
    )
}

/// Delete a savings goal of `user_id`.
///
/// # Errors
///
/// Returns [Error::SavingsGoalNotFound] if the goal does not exist or belongs
/// to another user.
pub fn delete_savings_goal(
    user_id: UserID,
    goal_id: SavingsGoalId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_goal WHERE id = ?1 AND user_id = ?2",
        params![goal_id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::SavingsGoalNotFound)
    } else {
        Ok(())
    }
}
