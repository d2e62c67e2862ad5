//! Defines the endpoints for creating and contributing to savings goals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserID,
    db::lock_connection,
    endpoints,
    fields::{parse_positive_amount, required},
    savings::core::{
        ContributionForm, SavingsGoalForm, SavingsGoalId, add_contribution, create_savings_goal,
    },
    timezone::local_offset_or_error,
};

/// The state needed to create or update a savings goal.
#[derive(Debug, Clone)]
pub struct SavingsEndpointState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SavingsEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn redirect_to_savings() -> Response {
    (
        HxRedirect(endpoints::SAVINGS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for creating a savings goal that starts today.
pub async fn create_savings_goal_endpoint(
    State(state): State<SavingsEndpointState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<SavingsGoalForm>,
) -> Response {
    let local_offset = match local_offset_or_error(&state.local_timezone) {
        Ok(offset) => offset,
        Err(error) => return error.into_alert_response(),
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let mut connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    match create_savings_goal(user_id, &form, today, &mut connection) {
        Ok(goal) => {
            tracing::debug!("Created savings goal {} for user {user_id}", goal.id);
            redirect_to_savings()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for adding money to a savings goal.
pub async fn contribute_endpoint(
    State(state): State<SavingsEndpointState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<SavingsGoalId>,
    Form(form): Form<ContributionForm>,
) -> Response {
    let amount = match required(form.amount.as_deref(), "amount")
        .and_then(|raw_amount| parse_positive_amount(&raw_amount))
    {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    match add_contribution(user_id, goal_id, amount, &connection) {
        Ok(goal) => {
            if goal.completed {
                tracing::info!("User {user_id} completed savings goal {goal_id}");
            }
            redirect_to_savings()
        }
        Err(error @ Error::SavingsGoalNotFound) => {
            tracing::warn!("User {user_id} tried to contribute to missing goal {goal_id}");
            error.into_alert_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
