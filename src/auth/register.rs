//! The registration page and the handler that creates new users.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use email_address::EmailAddress;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::cookie::set_auth_cookie,
    db::lock_connection,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        loading_spinner, log_in_register, password_input, text_input,
    },
    user::create_user,
};

/// The client side minimum password length, the server checks strength with
/// zxcvbn on top of this.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

/// The error messages shown next to each field of the registration form.
#[derive(Debug, Default)]
struct FieldErrors<'a> {
    name: Option<&'a str>,
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn confirm_password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE) { "Confirm Password" }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(PASSWORD_INPUT_MIN_LENGTH)
                autofocus[error_message.is_some()];

            @if let Some(error_message) = error_message {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn registration_form(name: &str, email: &str, errors: FieldErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("name", "Name", "text", name, errors.name))
            (text_input("email", "Email", "email", email, errors.email))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(errors.confirm_password))

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Log in here" }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form("", "", FieldErrors::default());

    base("Register", &log_in_register("Create an account", &form)).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a session lasts without activity.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data entered in the registration form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Create a user from the registration form and log them in.
///
/// Invalid input is answered with the form and a message next to the field
/// that needs fixing.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let name = form.name.as_deref().unwrap_or_default().trim();
    let raw_email = form.email.as_deref().unwrap_or_default().trim();
    let password = form.password.as_deref().unwrap_or_default();
    let confirm_password = form.confirm_password.as_deref().unwrap_or_default();

    if name.is_empty() {
        return registration_form(name, raw_email, FieldErrors {
            name: Some("Please enter your name."),
            ..Default::default()
        })
        .into_response();
    }

    let email = match EmailAddress::from_str(raw_email) {
        Ok(email) => email,
        Err(error) => {
            tracing::debug!("Rejected email {raw_email}: {error}");
            let message = Error::InvalidEmail(raw_email.to_owned()).to_string();
            return registration_form(name, raw_email, FieldErrors {
                email: Some(&message),
                ..Default::default()
            })
            .into_response();
        }
    };

    let validated_password = match ValidatedPassword::new(password, &[name, raw_email]) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            return registration_form(name, raw_email, FieldErrors {
                password: Some(&message),
                ..Default::default()
            })
            .into_response();
        }
    };

    if password != confirm_password {
        return registration_form(name, raw_email, FieldErrors {
            confirm_password: Some("Passwords do not match"),
            ..Default::default()
        })
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("Could not hash password: {error}");
            return error.into_alert_response();
        }
    };

    let user = match lock_connection(&state.db_connection)
        .and_then(|connection| create_user(name, &email, password_hash, &connection))
    {
        Ok(user) => user,
        Err(Error::DuplicateEmail) => {
            return registration_form(name, raw_email, FieldErrors {
                email: Some("An account with this email already exists, log in instead."),
                ..Default::default()
            })
            .into_response();
        }
        Err(error) => {
            tracing::error!("Could not create user: {error}");
            return error.into_alert_response();
        }
    };

    tracing::info!("Registered user {} with role {:?}", user.id, user.role);

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not set auth cookie: {error}");
            (
                HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod register_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_extra::extract::cookie::Key;
    use axum_test::TestServer;
    use sha2::{Digest, Sha512};

    use crate::{
        auth::{
            cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
            register::{RegistrationState, get_register_page, register_user},
        },
        endpoints,
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_valid_html, count_rows,
            get_shared_test_connection, must_get_form, parse_html_document,
        },
        user::{Role, get_user_by_email},
    };

    const STRONG_PASSWORD: &str = "correct horse battery staple envelope";

    fn get_test_server() -> (TestServer, RegistrationState) {
        let (db_connection, _) = get_shared_test_connection();
        let state = RegistrationState {
            cookie_key: Key::from(&Sha512::digest("registration test")),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection,
        };
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(state.clone());

        (
            TestServer::new(app),
            state,
        )
    }

    #[tokio::test]
    async fn register_page_has_form() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
    }

    #[tokio::test]
    async fn registers_user_and_logs_in() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("name", "Bob"),
                ("email", "bob@example.com"),
                ("password", STRONG_PASSWORD),
                ("confirm_password", STRONG_PASSWORD),
            ])
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("hx-redirect"), endpoints::EXPENSES_VIEW);
        response.cookie(COOKIE_TOKEN);
        let user = get_user_by_email("bob@example.com", &state.db_connection.lock().unwrap())
            .unwrap();
        assert_eq!(user.name, "Bob");
        // The test connection already has a user, so Bob is not the first.
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn rejects_invalid_email() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("name", "Bob"),
                ("email", "not an email"),
                ("password", STRONG_PASSWORD),
                ("confirm_password", STRONG_PASSWORD),
            ])
            .await;

        response.assert_status_ok();
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_none());
        assert_eq!(count_rows(&state.db_connection.lock().unwrap(), "user"), 1);
    }

    #[tokio::test]
    async fn rejects_weak_password() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("name", "Bob"),
                ("email", "bob@example.com"),
                ("password", "password"),
                ("confirm_password", "password"),
            ])
            .await;

        response.assert_status_ok();
        response.assert_text_contains("password is too weak");
        assert_eq!(count_rows(&state.db_connection.lock().unwrap(), "user"), 1);
    }

    #[tokio::test]
    async fn rejects_mismatched_passwords() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("name", "Bob"),
                ("email", "bob@example.com"),
                ("password", STRONG_PASSWORD),
                ("confirm_password", "correct horse battery staple"),
            ])
            .await;

        response.assert_status_ok();
        response.assert_text_contains("Passwords do not match");
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("name", "Bob"),
                ("email", "TEST@example.com"),
                ("password", STRONG_PASSWORD),
                ("confirm_password", STRONG_PASSWORD),
            ])
            .await;

        response.assert_status_ok();
        response.assert_text_contains("already exists");
        assert_eq!(count_rows(&state.db_connection.lock().unwrap(), "user"), 1);
    }
}
