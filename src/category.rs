//! Expense and income categories.
//!
//! Categories are reference data that is seeded when the database is
//! initialized and shared by all users.

use rusqlite::{Connection, Row, params};
use serde::Serialize;

use crate::{
    Error,
    db::{fetch_all, fetch_one},
};

/// The database ID of a category.
pub type CategoryId = i64;

/// The name shown for a category that cannot be found.
pub const DEFAULT_CATEGORY_NAME: &str = "Category";

/// A category for grouping expenses or incomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name, e.g. "Groceries".
    pub name: String,
    /// A CSS color used for the category badge.
    pub color: String,
    /// A short symbol shown next to the name.
    pub icon: String,
}

const DEFAULT_EXPENSE_CATEGORIES: [(&str, &str, &str); 8] = [
    ("Groceries", "#16a34a", "🛒"),
    ("Housing", "#2563eb", "🏠"),
    ("Transport", "#ca8a04", "🚌"),
    ("Utilities", "#0891b2", "💡"),
    ("Health", "#dc2626", "⚕"),
    ("Education", "#7c3aed", "📚"),
    ("Entertainment", "#db2777", "🎬"),
    ("Other", "#6b7280", "•"),
];

const DEFAULT_INCOME_CATEGORIES: [(&str, &str, &str); 4] = [
    ("Salary", "#16a34a", "💼"),
    ("Freelance", "#2563eb", "🧾"),
    ("Investments", "#ca8a04", "📈"),
    ("Other", "#6b7280", "•"),
];

/// Create the expense and income category tables.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_category_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for table in ["expense_category", "income_category"] {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    color TEXT NOT NULL,
                    icon TEXT NOT NULL
                )"
            ),
            (),
        )?;
    }

    Ok(())
}

/// Add the default categories, skipping any that already exist.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn seed_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO expense_category (name, color, icon) VALUES (?1, ?2, ?3)",
    )?;
    for (name, color, icon) in DEFAULT_EXPENSE_CATEGORIES {
        statement.execute(params![name, color, icon])?;
    }

    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO income_category (name, color, icon) VALUES (?1, ?2, ?3)",
    )?;
    for (name, color, icon) in DEFAULT_INCOME_CATEGORIES {
        statement.execute(params![name, color, icon])?;
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        icon: row.get(3)?,
    })
}

/// Get all expense categories ordered by name.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_expense_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    fetch_all(
        connection,
        "SELECT id, name, color, icon FROM expense_category ORDER BY name ASC",
        [],
        map_row,
    )
}

/// Get all income categories ordered by name.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_income_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    fetch_all(
        connection,
        "SELECT id, name, color, icon FROM income_category ORDER BY name ASC",
        [],
        map_row,
    )
}

/// Get the expense category with `category_id`, or `None` if there is no such category.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_expense_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    fetch_one(
        connection,
        "SELECT id, name, color, icon FROM expense_category WHERE id = ?1",
        [category_id],
        map_row,
    )
}

/// Get the income category with `category_id`, or `None` if there is no such category.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_income_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    fetch_one(
        connection,
        "SELECT id, name, color, icon FROM income_category WHERE id = ?1",
        [category_id],
        map_row,
    )
}

/// Get the display name of an expense category.
///
/// Falls back to [DEFAULT_CATEGORY_NAME] when the category does not exist or
/// cannot be read, so callers always have something to show.
pub fn get_expense_category_name(category_id: CategoryId, connection: &Connection) -> String {
    match get_expense_category(category_id, connection) {
        Ok(Some(category)) => category.name,
        Ok(None) => DEFAULT_CATEGORY_NAME.to_owned(),
        Err(error) => {
            tracing::warn!("Could not get the name of category {category_id}: {error}");
            DEFAULT_CATEGORY_NAME.to_owned()
        }
    }
}
