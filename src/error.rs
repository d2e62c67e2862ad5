//! Defines the app level error type and conversions to rendered HTML pages, alerts and JSON.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    alert::Alert, html::format_currency_rounded, internal_server_error::InternalServerError,
    money::Amount, not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token cookie could not be decoded or has expired.
    #[error("the auth token is invalid or has expired")]
    InvalidToken,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is not a valid email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A user has already registered with the email address.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// An empty string was given where a name is required.
    #[error("name cannot be empty")]
    EmptyName,

    /// A required form field was missing or empty.
    #[error("the field \"{0}\" is required")]
    MissingField(&'static str),

    /// The amount could not be parsed as a number of dollars and cents.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// An amount of zero or less was given where a positive amount is required.
    #[error("the amount must be greater than zero")]
    NonPositiveAmount,

    /// The date could not be parsed as a "YYYY-MM-DD" date.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The month could not be parsed as a "YYYY-MM" month.
    #[error("\"{0}\" is not a valid month")]
    InvalidMonth(String),

    /// The category ID is not a number or does not refer to a category.
    #[error("\"{0}\" is not a valid category")]
    InvalidCategory(String),

    /// The expense costs more than the money the user has available.
    #[error("cannot spend more than the available balance of {balance}")]
    InsufficientFunds {
        /// The user's balance when the expense was checked.
        balance: Amount,
    },

    /// The expense costs more than the budget left for its category this month.
    #[error("cannot spend more than the remaining budget of {remaining} for {category}")]
    BudgetExceeded {
        /// The display name of the expense category.
        category: String,
        /// The budget left for the category this month.
        remaining: Amount,
    },

    /// The expense does not exist or belongs to another user.
    #[error("the expense could not be found")]
    ExpenseNotFound,

    /// The income does not exist or belongs to another user.
    #[error("the income could not be found")]
    IncomeNotFound,

    /// The budget does not exist or belongs to another user.
    #[error("the budget could not be found")]
    BudgetNotFound,

    /// The savings goal does not exist or belongs to another user.
    #[error("the savings goal could not be found")]
    SavingsGoalNotFound,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A query referenced a row that does not exist, e.g. an unknown category.
    #[error("a referenced row does not exist")]
    InvalidForeignKey,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::InvalidForeignKey
            }
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound
            | Error::ExpenseNotFound
            | Error::IncomeNotFound
            | Error::BudgetNotFound
            | Error::SavingsGoalNotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// The HTTP status code and the short and long user facing descriptions of the error.
    fn describe(&self) -> (StatusCode, String, String) {
        match self {
            Error::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                "Missing required field".to_owned(),
                format!("Please fill in the {field} field."),
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                "Invalid amount".to_owned(),
                format!(
                    "\"{amount}\" is not a valid amount. Use \".\" to separate thousands and \
                    \",\" for cents, e.g. 1.234,56, and enter at most 1.000.000.000."
                ),
            ),
            Error::NonPositiveAmount => (
                StatusCode::BAD_REQUEST,
                "Invalid amount".to_owned(),
                "The amount must be greater than zero.".to_owned(),
            ),
            Error::InvalidDate(date) => (
                StatusCode::BAD_REQUEST,
                "Invalid date".to_owned(),
                format!("\"{date}\" is not a valid date. Use the format YYYY-MM-DD."),
            ),
            Error::InvalidMonth(month) => (
                StatusCode::BAD_REQUEST,
                "Invalid month".to_owned(),
                format!("\"{month}\" is not a valid month. Use the format YYYY-MM."),
            ),
            Error::InvalidCategory(category) => (
                StatusCode::BAD_REQUEST,
                "Invalid category".to_owned(),
                format!("Could not find a category with the ID \"{category}\"."),
            ),
            Error::InvalidForeignKey => (
                StatusCode::BAD_REQUEST,
                "Invalid category".to_owned(),
                "The selected category does not exist.".to_owned(),
            ),
            Error::EmptyName => (
                StatusCode::BAD_REQUEST,
                "Missing name".to_owned(),
                "The name cannot be empty.".to_owned(),
            ),
            Error::InsufficientFunds { balance } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Insufficient funds".to_owned(),
                format!(
                    "You cannot spend more than your available balance. Current balance: {}",
                    format_currency_rounded(*balance)
                ),
            ),
            Error::BudgetExceeded {
                category,
                remaining,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Budget exceeded".to_owned(),
                format!(
                    "You cannot spend more than the budget assigned to {category}. \
                    Remaining budget: {}",
                    format_currency_rounded(*remaining)
                ),
            ),
            Error::ExpenseNotFound => (
                StatusCode::NOT_FOUND,
                "Expense not found".to_owned(),
                "The expense could not be found. \
                Try refreshing the page to see if the expense has already been deleted."
                    .to_owned(),
            ),
            Error::IncomeNotFound => (
                StatusCode::NOT_FOUND,
                "Income not found".to_owned(),
                "The income could not be found. \
                Try refreshing the page to see if the income has already been deleted."
                    .to_owned(),
            ),
            Error::BudgetNotFound => (
                StatusCode::NOT_FOUND,
                "Budget not found".to_owned(),
                "The budget could not be found. \
                Try refreshing the page to see if the budget has already been deleted."
                    .to_owned(),
            ),
            Error::SavingsGoalNotFound => (
                StatusCode::NOT_FOUND,
                "Savings goal not found".to_owned(),
                "The savings goal could not be found. \
                Try refreshing the page to see if the goal has already been deleted."
                    .to_owned(),
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings".to_owned(),
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong".to_owned(),
                "An unexpected error occurred, check the server logs for more details.".to_owned(),
            ),
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, message, details) = self.describe();

        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status_code, Alert::Error { message, details }.into_html()).into_response()
    }

    /// Convert the error into an HTTP response with a JSON body of the form
    /// `{"success": false, "error": "..."}`.
    pub fn into_json_response(self) -> Response {
        let (status_code, message, _) = self.describe();

        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (
            status_code,
            Json(json!({ "success": false, "error": message })),
        )
            .into_response()
    }
}
