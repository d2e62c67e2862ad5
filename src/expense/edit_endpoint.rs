//! Defines the endpoint for editing an expense.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{
    UserID,
    db::lock_connection,
    endpoints::{self, with_month},
    expense::{
        core::ExpenseId, create_endpoint::ExpenseEndpointState, form::ExpenseForm,
        record::edit_expense,
    },
    month::MonthKey,
    timezone::local_offset_or_error,
};

/// A route handler for editing an expense, redirects to the expenses page
/// for the month of the edited expense on success.
pub async fn edit_expense_endpoint(
    State(state): State<ExpenseEndpointState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
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

    match edit_expense(
        user_id,
        expense_id,
        &form,
        MonthKey::current(local_offset),
        &mut connection,
    ) {
        Ok(expense) => (
            HxRedirect(with_month(
                endpoints::EXPENSES_VIEW,
                MonthKey::from_date(expense.date),
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("Could not edit expense {expense_id} for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}
