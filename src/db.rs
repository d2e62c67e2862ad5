//! The query executor: opening the SQLite database, running parameterized
//! statements and wrapping work in transactions.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use rusqlite::{
    Connection, OptionalExtension, Params, Row, Transaction, TransactionBehavior,
};

use crate::{
    Error,
    budget::create_budget_table,
    category::{create_category_tables, seed_categories},
    expense::create_expense_table,
    income::create_income_table,
    savings::create_savings_goal_table,
    user::create_user_table,
};

/// Open the database at `path`.
///
/// Queries wait up to `busy_timeout` for another connection to release its
/// lock before failing with a "database is locked" error.
///
/// # Errors
/// Returns an error if the file cannot be opened as an SQLite database.
pub fn open_connection(path: &Path, busy_timeout: Duration) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    connection.busy_timeout(busy_timeout)?;

    Ok(connection)
}

/// Create the application tables if they do not exist and add the default
/// categories.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_tables(&transaction)?;
    create_expense_table(&transaction)?;
    create_income_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_savings_goal_table(&transaction)?;
    seed_categories(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the lock for the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Run `f` inside an IMMEDIATE transaction.
///
/// The write lock is taken when the transaction begins, so reads made by `f`
/// cannot be invalidated by another writer before `f` writes. The transaction
/// is committed if `f` returns `Ok`, otherwise it is rolled back and the error
/// from `f` is returned.
///
/// # Errors
/// Returns the error from `f`, or an SQL error if the transaction could not be
/// started or committed.
pub fn in_transaction<T, F>(connection: &mut Connection, f: F) -> Result<T, Error>
where
    F: FnOnce(&Transaction) -> Result<T, Error>,
{
    let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Dropping the transaction without committing rolls it back.
    let value = f(&transaction)?;
    transaction.commit()?;

    Ok(value)
}

/// Run a single write statement in its own transaction and return the ID of
/// the last inserted row.
///
/// # Errors
/// Returns an error if the statement fails, in which case nothing is written.
pub fn execute_write<P: Params>(
    connection: &mut Connection,
    sql: &str,
    params: P,
) -> Result<i64, Error> {
    in_transaction(connection, |transaction| {
        transaction.execute(sql, params)?;

        Ok(transaction.last_insert_rowid())
    })
}

/// Run a query and map every returned row with `map_row`.
///
/// # Errors
/// Returns an error if the query fails or a row cannot be mapped.
pub fn fetch_all<T, P, F>(
    connection: &Connection,
    sql: &str,
    params: P,
    map_row: F,
) -> Result<Vec<T>, Error>
where
    P: Params,
    F: FnMut(&Row) -> Result<T, rusqlite::Error>,
{
    connection
        .prepare(sql)?
        .query_map(params, map_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Run a query and map the first returned row with `map_row`, or return
/// `None` if the query returned no rows.
///
/// # Errors
/// Returns an error if the query fails or the row cannot be mapped.
pub fn fetch_one<T, P, F>(
    connection: &Connection,
    sql: &str,
    params: P,
    map_row: F,
) -> Result<Option<T>, Error>
where
    P: Params,
    F: FnOnce(&Row) -> Result<T, rusqlite::Error>,
{
    connection
        .query_row(sql, params, map_row)
        .optional()
        .map_err(Error::from)
}


#[cfg(test)]
mod query_executor_tests {
    use rusqlite::{Connection, params};

    use crate::{
        Error,
        db::{execute_write, fetch_all, fetch_one, in_transaction},
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute(
                "CREATE TABLE item (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
                (),
            )
            .unwrap();
        connection
    }

    fn count_items(connection: &Connection) -> i64 {
        connection
            .query_row("SELECT COUNT(id) FROM item", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn execute_write_returns_generated_id() {
        let mut connection = get_test_connection();

        let first = execute_write(&mut connection, "INSERT INTO item (name) VALUES (?1)", ["a"])
            .unwrap();
        let second = execute_write(&mut connection, "INSERT INTO item (name) VALUES (?1)", ["b"])
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn execute_write_writes_nothing_on_failure() {
        let mut connection = get_test_connection();
        execute_write(&mut connection, "INSERT INTO item (name) VALUES (?1)", ["a"]).unwrap();

        let result = execute_write(&mut connection, "INSERT INTO item (name) VALUES (?1)", ["a"]);

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
        assert_eq!(count_items(&connection), 1);
    }

    #[test]
    fn fetch_all_maps_every_row() {
        let mut connection = get_test_connection();
        for name in ["a", "b", "c"] {
            execute_write(&mut connection, "INSERT INTO item (name) VALUES (?1)", [name]).unwrap();
        }

        let names: Vec<String> = fetch_all(
            &connection,
            "SELECT name FROM item WHERE id > ?1 ORDER BY id",
            params![1],
            |row| row.get(0),
        )
        .unwrap();

        assert_eq!(names, vec!["b".to_owned(), "c".to_owned()]);
    }

    #[test]
    fn fetch_one_returns_none_for_no_rows() {
        let connection = get_test_connection();

        let name: Option<String> = fetch_one(
            &connection,
            "SELECT name FROM item WHERE id = ?1",
            params![42],
            |row| row.get(0),
        )
        .unwrap();

        assert_eq!(name, None);
    }

    #[test]
    fn in_transaction_rolls_back_on_error() {
        let mut connection = get_test_connection();

        let result: Result<(), Error> = in_transaction(&mut connection, |transaction| {
            transaction.execute("INSERT INTO item (name) VALUES ('a')", ())?;
            Err(Error::NonPositiveAmount)
        });

        assert_eq!(result, Err(Error::NonPositiveAmount));
        assert_eq!(count_items(&connection), 0);
    }

    #[test]
    fn in_transaction_commits_on_success() {
        let mut connection = get_test_connection();

        in_transaction(&mut connection, |transaction| {
            transaction.execute("INSERT INTO item (name) VALUES ('a')", ())?;
            transaction.execute("INSERT INTO item (name) VALUES ('b')", ())?;
            Ok(())
        })
        .unwrap();

        assert_eq!(count_items(&connection), 2);
    }
}

#[cfg(test)]
mod immediate_transaction_tests {
    use std::{path::Path, sync::mpsc, thread, time::Duration};

    use rusqlite::{Connection, ErrorCode};

    use crate::{
        Error,
        db::{in_transaction, open_connection},
    };

    fn open_with_table(path: &Path, busy_timeout: Duration) -> Connection {
        let connection = open_connection(path, busy_timeout).unwrap();
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS spend (id INTEGER PRIMARY KEY, amount INTEGER NOT NULL)",
                (),
            )
            .unwrap();
        connection
    }

    fn total_spend(connection: &Connection) -> i64 {
        connection
            .query_row("SELECT COALESCE(SUM(amount), 0) FROM spend", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn second_writer_is_busy_while_first_holds_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgetbook.db");
        let mut first = open_with_table(&path, Duration::from_millis(50));
        let mut second = open_with_table(&path, Duration::from_millis(50));

        let result = in_transaction(&mut first, |transaction| {
            let blocked = in_transaction(&mut second, |_| Ok(()));

            match blocked {
                Err(Error::SqlError(rusqlite::Error::SqliteFailure(error, _))) => {
                    assert_eq!(error.code, ErrorCode::DatabaseBusy);
                }
                other => panic!("want a busy error, got {other:?}"),
            }

            transaction.execute("INSERT INTO spend (amount) VALUES (100)", ())?;
            Ok(())
        });

        assert_eq!(result, Ok(()));
        assert_eq!(total_spend(&second), 100);
    }

    #[test]
    fn waiting_writer_sees_the_first_writers_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgetbook.db");
        let mut first = open_with_table(&path, Duration::from_secs(5));
        let mut second = open_with_table(&path, Duration::from_secs(5));
        let (locked_sender, locked_receiver) = mpsc::channel();

        let first_writer = thread::spawn(move || {
            in_transaction(&mut first, |transaction| {
                let spent: i64 = transaction
                    .query_row("SELECT COALESCE(SUM(amount), 0) FROM spend", [], |row| row.get(0))?;
                locked_sender.send(()).unwrap();
                thread::sleep(Duration::from_millis(100));

                if spent + 80 <= 100 {
                    transaction.execute("INSERT INTO spend (amount) VALUES (80)", ())?;
                }
                Ok(())
            })
        });

        locked_receiver.recv().unwrap();
        let second_result = in_transaction(&mut second, |transaction| {
            let spent: i64 = transaction
                .query_row("SELECT COALESCE(SUM(amount), 0) FROM spend", [], |row| row.get(0))?;

            if spent + 80 <= 100 {
                transaction.execute("INSERT INTO spend (amount) VALUES (80)", ())?;
                Ok(true)
            } else {
                Ok(false)
            }
        });

        assert_eq!(first_writer.join().unwrap(), Ok(()));
        assert_eq!(second_result, Ok(false), "second writer should see the first insert");
        assert_eq!(total_spend(&second), 80);
    }
}
