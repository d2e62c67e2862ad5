//! Defines the endpoint for deleting an expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, UserID,
    db::lock_connection,
    expense::core::{ExpenseId, delete_expense},
};

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an expense.
///
/// Responds with `{"success": true}`, or `{"success": false, "error": "..."}`
/// and a 404 status if the expense does not exist or belongs to another user.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_json_response(),
    };

    match delete_expense(user_id, expense_id, &connection) {
        Ok(()) => {
            tracing::debug!("Deleted expense {expense_id} for user {user_id}");
            Json(json!({ "success": true })).into_response()
        }
        Err(error) => error.into_json_response(),
    }
}
