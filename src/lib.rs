//! Budgetbook is a web app for keeping a personal budget.
//!
//! Users record their incomes and expenses, set monthly spending limits per
//! category and save towards goals. An expense is only accepted if the user
//! can afford it and it fits within the budget for its category.
//!
//! This library provides the HTTP server that serves the HTML pages, the
//! htmx endpoints and a small JSON API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod balance;
mod budget;
mod category;
pub mod config;
mod db;
mod endpoints;
mod error;
mod expense;
mod fields;
mod html;
mod income;
mod internal_server_error;
mod logging;
mod money;
mod month;
mod navigation;
mod not_found;
mod password;
mod routing;
mod savings;
mod timezone;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::{initialize as initialize_db, open_connection};
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{Role, User, UserID, count_users, create_user, get_user_by_email};

/// Waits for ctrl+c or the terminate signal, whichever comes first, and then
/// tells the server behind `handle` to shut down gracefully.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for ctrl+c: {error}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}
