use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, UserID,
    alert::Alert,
    db::lock_connection,
    savings::core::{SavingsGoalId, delete_savings_goal},
};

/// The state needed to delete a savings goal.
#[derive(Debug, Clone)]
pub struct DeleteSavingsGoalState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteSavingsGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a savings goal, responds with an alert.
pub async fn delete_savings_goal_endpoint(
    State(state): State<DeleteSavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<SavingsGoalId>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    match delete_savings_goal(user_id, goal_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Savings goal deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::warn!("Could not delete savings goal {goal_id} for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_savings_goal_endpoint_tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        savings::{
            core::{SavingsGoalForm, create_savings_goal},
            delete_endpoint::{DeleteSavingsGoalState, delete_savings_goal_endpoint},
        },
        test_utils::{count_rows, get_shared_test_connection, insert_test_user},
    };

    fn insert_goal(connection: &mut rusqlite::Connection, user_id: crate::UserID) -> i64 {
        let form = SavingsGoalForm {
            name: Some("Car".to_owned()),
            target: Some("5.000".to_owned()),
            target_date: None,
        };

        create_savings_goal(user_id, &form, date!(2025 - 01 - 01), connection)
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn deletes_own_goal() {
        let (db_connection, user_id) = get_shared_test_connection();
        let goal_id = insert_goal(&mut db_connection.lock().unwrap(), user_id);
        let state = DeleteSavingsGoalState {
            db_connection: db_connection.clone(),
        };

        let response =
            delete_savings_goal_endpoint(State(state), Extension(user_id), Path(goal_id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(count_rows(&db_connection.lock().unwrap(), "savings_goal"), 0);
    }

    #[tokio::test]
    async fn other_users_goal_is_not_found() {
        let (db_connection, user_id) = get_shared_test_connection();
        let (goal_id, other_user_id) = {
            let mut connection = db_connection.lock().unwrap();
            (
                insert_goal(&mut connection, user_id),
                insert_test_user(&connection, "other@example.com"),
            )
        };
        let state = DeleteSavingsGoalState {
            db_connection: db_connection.clone(),
        };

        let response =
            delete_savings_goal_endpoint(State(state), Extension(other_user_id), Path(goal_id))
                .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(count_rows(&db_connection.lock().unwrap(), "savings_goal"), 1);
    }
}
