//! Defines the endpoint for setting the budget of a category for a month.

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
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    budget::core::set_budget,
    category::CategoryId,
    db::lock_connection,
    endpoints::{self, with_month},
    fields::{parse_category_id, parse_positive_amount, required},
    money::Amount,
    month::MonthKey,
};

/// The state needed to set a budget.
#[derive(Debug, Clone)]
pub struct SetBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SetBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for setting a budget.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetForm {
    pub category_id: Option<String>,
    /// The month as "YYYY-MM".
    pub month: Option<String>,
    /// The ceiling as a localized amount, e.g. "1.500".
    pub amount: Option<String>,
}

impl BudgetForm {
    fn parse(&self) -> Result<(CategoryId, MonthKey, Amount), Error> {
        let category_id = parse_category_id(&required(self.category_id.as_deref(), "category")?)?;
        let month: MonthKey = required(self.month.as_deref(), "month")?.parse()?;
        let ceiling = parse_positive_amount(&required(self.amount.as_deref(), "amount")?)?;

        Ok((category_id, month, ceiling))
    }
}

/// A route handler for creating or updating a budget, redirects to the
/// budgets page for the budget's month on success.
pub async fn set_budget_endpoint(
    State(state): State<SetBudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let (category_id, month, ceiling) = match form.parse() {
        Ok(fields) => fields,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    match set_budget(user_id, category_id, month, ceiling, &connection) {
        Ok(budget_id) => {
            tracing::debug!("Set budget {budget_id} for {month} to {ceiling}");

            (
                HxRedirect(with_month(endpoints::BUDGETS_VIEW, month)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not set budget with {form:?}: {error}");
            error.into_alert_response()
        }
    }
}
