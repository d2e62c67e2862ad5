//! Defines the endpoint for recording an income.

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
    income::core::{IncomeForm, record_income},
    month::MonthKey,
};

/// The state needed to record an income.
#[derive(Debug, Clone)]
pub struct CreateIncomeState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateIncomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for recording an income, redirects to the incomes page
/// for the month of the income on success.
pub async fn create_income_endpoint(
    State(state): State<CreateIncomeState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<IncomeForm>,
) -> Response {
    let mut connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    match record_income(user_id, &form, &mut connection) {
        Ok((income_id, income)) => {
            tracing::debug!("Created income {income_id} for user {user_id}");

            (
                HxRedirect(with_month(
                    endpoints::INCOMES_VIEW,
                    MonthKey::from_date(income.date),
                )),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
