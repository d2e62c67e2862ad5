//! The app's routes and the auth guard protecting each group of them.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, auth_guard_json, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_user,
    },
    budget::{delete_budget_endpoint, get_budgets_page, set_budget_endpoint},
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, edit_expense_endpoint,
        get_edit_expense_page, get_expenses_api, get_expenses_page,
    },
    income::{create_income_endpoint, delete_income_endpoint, get_incomes_page},
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    savings::{
        contribute_endpoint, create_savings_goal_endpoint, delete_savings_goal_endpoint,
        get_savings_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::EDIT_EXPENSE_VIEW, get(get_edit_expense_page))
        .route(endpoints::INCOMES_VIEW, get(get_incomes_page))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::SAVINGS_VIEW, get(get_savings_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // Forms submitted by htmx need an HX-Redirect to reach the log-in page.
    let htmx_routes = Router::new()
        .route(endpoints::EXPENSES_API, post(create_expense_endpoint))
        .route(endpoints::EXPENSE, put(edit_expense_endpoint))
        .route(endpoints::INCOMES_API, post(create_income_endpoint))
        .route(endpoints::BUDGETS_API, post(set_budget_endpoint))
        .route(endpoints::BUDGET, delete(delete_budget_endpoint))
        .route(endpoints::SAVINGS_API, post(create_savings_goal_endpoint))
        .route(endpoints::SAVINGS_GOAL, delete(delete_savings_goal_endpoint))
        .route(endpoints::SAVINGS_CONTRIBUTIONS, post(contribute_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    let json_routes = Router::new()
        .route(endpoints::EXPENSES_API, get(get_expenses_api))
        .route(endpoints::EXPENSE, delete(delete_expense_endpoint))
        .route(endpoints::INCOME, delete(delete_income_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_json));

    page_routes
        .merge(htmx_routes)
        .merge(json_routes)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the expenses page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::EXPENSES_VIEW)
}
