use std::sync::{Arc, Mutex};

use rusqlite::{Connection, params};
use time::Date;

use crate::{
    UserID, category::CategoryId, db::initialize, month::MonthKey, money::Amount,
};

/// An initialized in-memory database with one registered user.
pub(crate) fn get_test_connection() -> (Connection, UserID) {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    let user_id = insert_test_user(&connection, "test@example.com");

    (connection, user_id)
}

/// Like [get_test_connection], but wrapped for handler state.
pub(crate) fn get_shared_test_connection() -> (Arc<Mutex<Connection>>, UserID) {
    let (connection, user_id) = get_test_connection();

    (Arc::new(Mutex::new(connection)), user_id)
}

pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> UserID {
    connection
        .execute(
            "INSERT INTO user (name, email, password, role, created_at)
            VALUES ('Test', ?1, 'hunter2', 'user', '2025-01-01 00:00:00.0+00:00')",
            [email],
        )
        .expect("Could not create test user");

    UserID::new(connection.last_insert_rowid())
}

/// The ID of the seeded expense category called `name`.
#[track_caller]
pub(crate) fn expense_category_id(connection: &Connection, name: &str) -> CategoryId {
    connection
        .query_row(
            "SELECT id FROM expense_category WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .unwrap_or_else(|error| panic!("No expense category named {name}: {error}"))
}

/// The ID of the seeded income category called `name`.
#[track_caller]
pub(crate) fn income_category_id(connection: &Connection, name: &str) -> CategoryId {
    connection
        .query_row(
            "SELECT id FROM income_category WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .unwrap_or_else(|error| panic!("No income category named {name}: {error}"))
}

pub(crate) fn insert_test_income(
    connection: &Connection,
    user_id: UserID,
    amount: Amount,
    date: Date,
) -> i64 {
    connection
        .execute(
            "INSERT INTO income (user_id, category_id, concept, amount, date, description)
            VALUES (?1, NULL, 'Pay', ?2, ?3, '')",
            params![user_id.as_i64(), amount, date],
        )
        .expect("Could not insert test income");

    connection.last_insert_rowid()
}

pub(crate) fn insert_test_expense(
    connection: &Connection,
    user_id: UserID,
    category_id: Option<CategoryId>,
    amount: Amount,
    date: Date,
) -> i64 {
    connection
        .execute(
            "INSERT INTO expense (user_id, category_id, concept, amount, date, description, essential)
            VALUES (?1, ?2, 'Test expense', ?3, ?4, '', 0)",
            params![user_id.as_i64(), category_id, amount, date],
        )
        .expect("Could not insert test expense");

    connection.last_insert_rowid()
}

pub(crate) fn insert_test_budget(
    connection: &Connection,
    user_id: UserID,
    category_id: CategoryId,
    month: MonthKey,
    ceiling: Amount,
) -> i64 {
    connection
        .execute(
            "INSERT INTO budget (user_id, category_id, month, amount) VALUES (?1, ?2, ?3, ?4)",
            params![user_id.as_i64(), category_id, month, ceiling],
        )
        .expect("Could not insert test budget");

    connection.last_insert_rowid()
}

#[track_caller]
pub(crate) fn count_rows(connection: &Connection, table: &str) -> i64 {
    connection
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .expect("Could not count rows")
}
