//! The log-in page and the handler for log-in requests.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        cookie::{invalidate_auth_cookie, set_auth_cookie},
        redirect::normalize_redirect_url,
    },
    db::lock_connection,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, LINK_STYLE, base, loading_spinner,
        log_in_register, password_input, text_input,
    },
    internal_server_error::internal_server_error_redirect,
    user::get_user_by_email,
};

/// How long the session lasts if the user ticks "remember me".
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";

fn log_in_form(email: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (text_input("email", "Email", "email", email, None))
            (password_input("", 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    class=(FORM_CHECKBOX_STYLE);

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) class=(LINK_STYLE) { "Register here" }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>) -> Option<String> {
    let raw_url = raw_url?;
    let redirect_url = normalize_redirect_url(raw_url);

    if redirect_url.is_none() {
        tracing::warn!("Ignoring unsafe redirect URL {raw_url}");
    }

    redirect_url
}

/// The page to return to after logging in.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref());
    let form = log_in_form("", None, redirect_url.as_deref());

    base("Log In", &log_in_register("Log in to your account", &form))
    .into_response()
}

/// The state needed to log in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a session lasts without activity.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data entered in the log-in form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogInForm {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Any value means the checkbox was ticked.
    pub remember_me: Option<String>,
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests.
///
/// Sets the auth cookie and redirects to the requested page, or the expenses
/// page, on success. Otherwise responds with the form and an error message.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(form): Form<LogInForm>,
) -> Response {
    let redirect_url = parse_redirect_url(form.redirect_url.as_deref());
    let redirect_url = redirect_url.as_deref();
    let email = form.email.as_deref().unwrap_or_default().trim();
    let password = form.password.as_deref().unwrap_or_default();

    let user = {
        let connection = match lock_connection(&state.db_connection) {
            Ok(connection) => connection,
            Err(error) => return error.into_alert_response(),
        };

        get_user_by_email(email, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return log_in_form(email, Some(INVALID_CREDENTIALS_ERROR_MSG), redirect_url)
                .into_response();
        }
        Err(error) => {
            tracing::error!("Could not look up user by email: {error}");
            return log_in_form(
                email,
                Some("An internal error occurred. Please try again later."),
                redirect_url,
            )
            .into_response();
        }
    };

    match user.password_hash.verify(password) {
        Ok(true) => {}
        Ok(false) => {
            return log_in_form(email, Some(INVALID_CREDENTIALS_ERROR_MSG), redirect_url)
                .into_response();
        }
        Err(error) => {
            tracing::error!("Could not verify password for user {}: {error}", user.id);
            return log_in_form(
                email,
                Some("An internal error occurred. Please try again later."),
                redirect_url,
            )
            .into_response();
        }
    }

    let cookie_duration = if form.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    match set_auth_cookie(jar.clone(), user.id, cookie_duration) {
        Ok(jar) => {
            tracing::info!("User {} logged in", user.id);
            (
                StatusCode::SEE_OTHER,
                HxRedirect(redirect_url.unwrap_or(endpoints::EXPENSES_VIEW).to_owned()),
                jar,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not set auth cookie: {error}");
            (invalidate_auth_cookie(jar), internal_server_error_redirect()).into_response()
        }
    }
}
