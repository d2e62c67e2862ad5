//! The expense table and the queries for reading and writing expenses.

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::Date;

use crate::{
    Error, UserID,
    category::CategoryId,
    db::{fetch_all, fetch_one},
    money::Amount,
    month::MonthKey,
};

/// The database ID of an expense.
pub type ExpenseId = i64;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// An expense as it is stored in the database.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: ExpenseId,
    pub user_id: UserID,
    pub category_id: Option<CategoryId>,
    /// A short description of what the money was spent on, e.g. "Rent".
    pub concept: String,
    pub amount: Amount,
    pub date: Date,
    pub description: String,
    /// Whether the expense is non-discretionary, e.g. rent or groceries.
    pub essential: bool,
}

/// An expense with the details of its category for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseListing {
    pub id: ExpenseId,
    pub concept: String,
    pub amount: Amount,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub category_icon: Option<String>,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub description: String,
    pub essential: bool,
}

/// The fields written when an expense is created or edited.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub category_id: CategoryId,
    pub concept: String,
    pub amount: Amount,
    pub date: Date,
    pub description: String,
    pub essential: bool,
}

/// Create the expense table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER REFERENCES expense_category(id) ON DELETE SET NULL,
            concept TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            essential INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date)",
        (),
    )?;

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        concept: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        description: row.get(6)?,
        essential: row.get(7)?,
    })
}

fn map_listing_row(row: &Row) -> Result<ExpenseListing, rusqlite::Error> {
    Ok(ExpenseListing {
        id: row.get(0)?,
        concept: row.get(1)?,
        amount: row.get(2)?,
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        category_color: row.get(5)?,
        category_icon: row.get(6)?,
        date: row.get(7)?,
        description: row.get(8)?,
        essential: row.get(9)?,
    })
}

/// Get an expense that belongs to `user_id`.
///
/// # Errors
///
/// Returns [Error::ExpenseNotFound] if the expense does not exist or belongs
/// to another user.
pub fn get_expense(
    user_id: UserID,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<Expense, Error> {
    fetch_one(
        connection,
        "SELECT id, user_id, category_id, concept, amount, date, description, essential
        FROM expense WHERE id = ?1 AND user_id = ?2",
        params![expense_id, user_id.as_i64()],
        map_expense_row,
    )?
    .ok_or(Error::ExpenseNotFound)
}

/// Insert an expense and return its ID.
///
/// Callers are expected to have checked the expense against the user's
/// balance and budget.
pub(super) fn insert_expense(
    user_id: UserID,
    expense: &NewExpense,
    connection: &Connection,
) -> Result<ExpenseId, Error> {
    connection.execute(
        "INSERT INTO expense (user_id, category_id, concept, amount, date, description, essential)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id.as_i64(),
            expense.category_id,
            expense.concept,
            expense.amount,
            expense.date,
            expense.description,
            expense.essential,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

/// Overwrite the fields of an expense owned by `user_id`.
pub(super) fn update_expense(
    user_id: UserID,
    expense_id: ExpenseId,
    expense: &NewExpense,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE expense
        SET category_id = ?1, concept = ?2, amount = ?3, date = ?4, description = ?5, essential = ?6
        WHERE id = ?7 AND user_id = ?8",
        params![
            expense.category_id,
            expense.concept,
            expense.amount,
            expense.date,
            expense.description,
            expense.essential,
            expense_id,
            user_id.as_i64(),
        ],
    )?;

    if rows_affected == 0 {
        Err(Error::ExpenseNotFound)
    } else {
        Ok(())
    }
}

/// Delete an expense owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::ExpenseNotFound] if the expense does not exist or belongs
/// to another user, in which case nothing is deleted.
pub fn delete_expense(
    user_id: UserID,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        params![expense_id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::ExpenseNotFound)
    } else {
        Ok(())
    }
}

/// Get the expenses of `user_id` in `month`, newest first.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_expenses_for_month(
    user_id: UserID,
    month: MonthKey,
    connection: &Connection,
) -> Result<Vec<ExpenseListing>, Error> {
    fetch_all(
        connection,
        "SELECT e.id, e.concept, e.amount, e.category_id, c.name, c.color, c.icon,
            e.date, e.description, e.essential
        FROM expense e
        LEFT JOIN expense_category c ON c.id = e.category_id
        WHERE e.user_id = ?1 AND substr(e.date, 1, 7) = ?2
        ORDER BY e.date DESC, e.id DESC",
        params![user_id.as_i64(), month],
        map_listing_row,
    )
}

/// Get the sum of the expenses of `user_id`, optionally limited to `month`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_expense_total(
    user_id: UserID,
    month: Option<MonthKey>,
    connection: &Connection,
) -> Result<Amount, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM expense
            WHERE user_id = ?1 AND (?2 IS NULL OR substr(date, 1, 7) = ?2)",
            params![user_id.as_i64(), month],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod expense_query_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        expense::core::{
            NewExpense, delete_expense, get_expense, get_expense_total, get_expenses_for_month,
            insert_expense, update_expense,
        },
        money::Amount,
        month::MonthKey,
        test_utils::{
            count_rows, expense_category_id, get_test_connection, insert_test_expense,
            insert_test_user,
        },
    };

    fn rent(category_id: i64) -> NewExpense {
        NewExpense {
            category_id,
            concept: "Rent".to_owned(),
            amount: Amount::new(dec!(450.50)),
            date: date!(2025 - 03 - 01),
            description: "March".to_owned(),
            essential: true,
        }
    }

    #[test]
    fn inserted_expense_can_be_read_back() {
        let (connection, user_id) = get_test_connection();
        let housing = expense_category_id(&connection, "Housing");
        let new_expense = rent(housing);

        let id = insert_expense(user_id, &new_expense, &connection).unwrap();
        let expense = get_expense(user_id, id, &connection).unwrap();

        assert_eq!(expense.category_id, Some(housing));
        assert_eq!(expense.concept, "Rent");
        assert_eq!(expense.amount, Amount::new(dec!(450.50)));
        assert_eq!(expense.date, date!(2025 - 03 - 01));
        assert_eq!(expense.description, "March");
        assert!(expense.essential);
    }

    #[test]
    fn get_expense_hides_other_users_expenses() {
        let (connection, user_id) = get_test_connection();
        let other_user_id = insert_test_user(&connection, "other@example.com");
        let id = insert_test_expense(&connection, user_id, None, Amount::new(dec!(5)), date!(2025 - 03 - 01));

        assert_eq!(
            get_expense(other_user_id, id, &connection),
            Err(Error::ExpenseNotFound)
        );
    }

    #[test]
    fn update_checks_owner() {
        let (connection, user_id) = get_test_connection();
        let housing = expense_category_id(&connection, "Housing");
        let other_user_id = insert_test_user(&connection, "other@example.com");
        let id = insert_expense(user_id, &rent(housing), &connection).unwrap();
        let mut changed = rent(housing);
        changed.concept = "Mortgage".to_owned();

        assert_eq!(
            update_expense(other_user_id, id, &changed, &connection),
            Err(Error::ExpenseNotFound)
        );
        assert_eq!(get_expense(user_id, id, &connection).unwrap().concept, "Rent");
    }

    #[test]
    fn delete_checks_owner() {
        let (connection, user_id) = get_test_connection();
        let other_user_id = insert_test_user(&connection, "other@example.com");
        let id = insert_test_expense(&connection, user_id, None, Amount::new(dec!(5)), date!(2025 - 03 - 01));

        assert_eq!(
            delete_expense(other_user_id, id, &connection),
            Err(Error::ExpenseNotFound)
        );
        assert_eq!(count_rows(&connection, "expense"), 1);

        assert_eq!(delete_expense(user_id, id, &connection), Ok(()));
        assert_eq!(count_rows(&connection, "expense"), 0);
    }

    #[test]
    fn lists_expenses_in_month_newest_first() {
        let (connection, user_id) = get_test_connection();
        let food = expense_category_id(&connection, "Groceries");
        let first = insert_test_expense(&connection, user_id, Some(food), Amount::new(dec!(1)), date!(2025 - 03 - 01));
        let second = insert_test_expense(&connection, user_id, None, Amount::new(dec!(2)), date!(2025 - 03 - 31));
        insert_test_expense(&connection, user_id, None, Amount::new(dec!(3)), date!(2025 - 04 - 01));

        let expenses = get_expenses_for_month(user_id, MonthKey::new(2025, 3).unwrap(), &connection)
            .unwrap();

        let ids: Vec<_> = expenses.iter().map(|expense| expense.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(expenses[1].category_name.as_deref(), Some("Groceries"));
        assert_eq!(expenses[0].category_name, None);
    }

    #[test]
    fn totals_for_month_and_overall() {
        let (connection, user_id) = get_test_connection();
        insert_test_expense(&connection, user_id, None, Amount::new(dec!(10.25)), date!(2025 - 03 - 01));
        insert_test_expense(&connection, user_id, None, Amount::new(dec!(4.75)), date!(2025 - 03 - 15));
        insert_test_expense(&connection, user_id, None, Amount::new(dec!(100)), date!(2025 - 04 - 01));

        assert_eq!(
            get_expense_total(user_id, Some(MonthKey::new(2025, 3).unwrap()), &connection),
            Ok(Amount::new(dec!(15)))
        );
        assert_eq!(
            get_expense_total(user_id, None, &connection),
            Ok(Amount::new(dec!(115)))
        );
    }
}
