//! Defines the endpoint for recording a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, UserID,
    db::lock_connection,
    endpoints::{self, with_month},
    expense::{form::ExpenseForm, record::record_expense},
    month::MonthKey,
    timezone::local_offset_or_error,
};

/// The state needed to create or edit an expense.
#[derive(Debug, Clone)]
pub struct ExpenseEndpointState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Expenses are checked against the budgets of the current month in this timezone.
    pub local_timezone: String,
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for recording an expense.
///
/// Redirects to the expenses page for the month of the expense on success,
/// otherwise responds with an alert explaining why the expense was rejected.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseEndpointState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let local_offset = match local_offset_or_error(&state.local_timezone) {
        Ok(offset) => offset,
        Err(error) => return error.into_alert_response(),
    };

    let mut connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    match record_expense(
        user_id,
        &form,
        MonthKey::current(local_offset),
        &mut connection,
    ) {
        Ok(expense) => {
            tracing::debug!("Created expense {} for user {user_id}", expense.id);

            (
                HxRedirect(with_month(
                    endpoints::EXPENSES_VIEW,
                    MonthKey::from_date(expense.date),
                )),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
