//! A JSON listing of the expenses in a month for scripts and AJAX callers.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::UtcOffset;

use crate::{
    AppState, Error, UserID, db::lock_connection, expense::core::get_expenses_for_month,
    month::MonthKey, timezone::local_offset_or_error,
};

/// The state needed for the expenses API.
#[derive(Debug, Clone)]
pub struct ExpensesApiState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpensesApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The month to list, e.g. `?month=3&year=2025`.
///
/// Missing or non-numeric values default to the current month and year.
#[derive(Debug, Default, Deserialize)]
pub struct ExpensesQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

impl ExpensesQuery {
    fn month_key(&self, local_offset: UtcOffset) -> Result<MonthKey, Error> {
        let current = MonthKey::current(local_offset);
        let month = self
            .month
            .as_deref()
            .and_then(|month| month.trim().parse::<u8>().ok())
            .unwrap_or(u8::from(current.month()));
        let year = self
            .year
            .as_deref()
            .and_then(|year| year.trim().parse::<i32>().ok())
            .unwrap_or(current.year());

        MonthKey::new(year, month).ok_or_else(|| Error::InvalidMonth(format!("{year}-{month}")))
    }
}

/// A route handler that lists the user's expenses in a month as JSON.
pub async fn get_expenses_api(
    State(state): State<ExpensesApiState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExpensesQuery>,
) -> Response {
    let month = match local_offset_or_error(&state.local_timezone)
        .and_then(|local_offset| query.month_key(local_offset))
    {
        Ok(month) => month,
        Err(error) => return error.into_json_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_json_response(),
    };

    match get_expenses_for_month(user_id, month, &connection) {
        Ok(expenses) => Json(expenses).into_response(),
        Err(error) => {
            tracing::error!("could not get expenses for {month}: {error}");
            error.into_json_response()
        }
    }
}
