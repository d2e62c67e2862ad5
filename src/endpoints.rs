//! The route URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}', use [format_endpoint].

use crate::month::MonthKey;

/// The root route which redirects to the expenses page.
pub const ROOT: &str = "/";
/// The page listing a month of expenses with the user's balance.
pub const EXPENSES_VIEW: &str = "/expenses";
/// The page for editing an existing expense.
pub const EDIT_EXPENSE_VIEW: &str = "/expenses/{expense_id}/edit";
/// The page listing a month of incomes.
pub const INCOMES_VIEW: &str = "/incomes";
/// The page listing a month of category budgets.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page listing savings goals.
pub const SAVINGS_VIEW: &str = "/savings";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to create and list expenses.
pub const EXPENSES_API: &str = "/api/expenses";
/// The route to edit or delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to create incomes.
pub const INCOMES_API: &str = "/api/incomes";
/// The route to delete a single income.
pub const INCOME: &str = "/api/incomes/{income_id}";
/// The route to set a budget.
pub const BUDGETS_API: &str = "/api/budgets";
/// The route to delete a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to create savings goals.
pub const SAVINGS_API: &str = "/api/savings";
/// The route to delete a single savings goal.
pub const SAVINGS_GOAL: &str = "/api/savings/{goal_id}";
/// The route to add money to a savings goal.
pub const SAVINGS_CONTRIBUTIONS: &str = "/api/savings/{goal_id}/contributions";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, e.g. in
/// '/api/expenses/{expense_id}', '{expense_id}' is the parameter.
/// Only the first parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the original `endpoint_path` is returned.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

/// Add the month selector query to a page URL, e.g. "/expenses?mes=2025-03".
pub fn with_month(view_path: &str, month: MonthKey) -> String {
    format!("{view_path}?mes={month}")
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::{endpoints, month::MonthKey};

    use super::{format_endpoint, with_month};

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::EXPENSES_VIEW,
            endpoints::EDIT_EXPENSE_VIEW,
            endpoints::INCOMES_VIEW,
            endpoints::BUDGETS_VIEW,
            endpoints::SAVINGS_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::EXPENSES_API,
            endpoints::EXPENSE,
            endpoints::INCOMES_API,
            endpoints::INCOME,
            endpoints::BUDGETS_API,
            endpoints::BUDGET,
            endpoints::SAVINGS_API,
            endpoints::SAVINGS_GOAL,
            endpoints::SAVINGS_CONTRIBUTIONS,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/api/expenses/{expense_id}", 1);

        assert_eq!(formatted_path, "/api/expenses/1");
        assert_endpoint_is_valid_uri(&formatted_path);
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::SAVINGS_CONTRIBUTIONS, 7);

        assert_eq!(formatted_path, "/api/savings/7/contributions");
        assert_endpoint_is_valid_uri(&formatted_path);
    }

    #[test]
    fn adds_month_query() {
        let month = MonthKey::new(2025, 3).unwrap();

        let url = with_month(endpoints::EXPENSES_VIEW, month);

        assert_eq!(url, "/expenses?mes=2025-03");
        assert_endpoint_is_valid_uri(&url);
    }
}
