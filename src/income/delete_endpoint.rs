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
    income::core::{IncomeId, delete_income},
};

/// The state needed to delete an income.
#[derive(Debug, Clone)]
pub struct DeleteIncomeState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteIncomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an income, responds with `{"success": true}`
/// or a JSON error.
pub async fn delete_income_endpoint(
    State(state): State<DeleteIncomeState>,
    Extension(user_id): Extension<UserID>,
    Path(income_id): Path<IncomeId>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_json_response(),
    };

    match delete_income(user_id, income_id, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(error) => error.into_json_response(),
    }
}
