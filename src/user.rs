//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Manages the app. The first registered user is an admin.
    Admin,
    /// Manages their own finances.
    User,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(FromSqlError::Other(
                format!("unknown role \"{other}\"").into(),
            )),
        }
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name to greet the user with.
    pub name: String,
    /// The email address the user logs in with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// What the user is allowed to do.
    pub role: Role,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user')),
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// The first user to be created is made an admin, everyone after that is a
/// regular user.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyName] if `name` is empty or only whitespace.
/// - [Error::DuplicateEmail] if a user has already registered with `email`.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    name: &str,
    email: &EmailAddress,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    let role = if count_users(connection)? == 0 {
        Role::Admin
    } else {
        Role::User
    };
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (name, email, password, role, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            name,
            email.as_str(),
            password_hash.as_ref(),
            role,
            created_at,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name: name.to_owned(),
        email: email.clone(),
        password_hash,
        role,
        created_at,
    })
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;
    let email = EmailAddress::from_str(&raw_email).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        name: row.get(1)?,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        role: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Get the user who registered with `email`.
///
/// Email addresses are compared case-insensitively.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has registered with `email`, or
/// [Error::SqlError] if an SQL related error occurred.
pub fn get_user_by_email(email: &str, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(
            "SELECT id, name, email, password, role, created_at FROM user
            WHERE email = :email COLLATE NOCASE",
        )?
        .query_row(&[(":email", &email.trim())], map_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))?;

    usize::try_from(count)
        .map_err(|_| Error::SqlError(rusqlite::Error::IntegralValueOutOfRange(0, count)))
}
