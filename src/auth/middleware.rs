//! Middleware that requires a valid session before running the route handler.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use serde_json::json;
use time::Duration;

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::log_in_url_for_request,
    },
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a session lasts without activity.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Runs the request if it carries a valid session, otherwise responds with
/// `reject(log_in_url)`.
///
/// The [crate::UserID] of the session is inserted into the request
/// extensions, and the session is extended on the way out.
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    reject: impl Fn(String) -> Response,
) -> Response {
    let log_in_url = log_in_url_for_request(&request);

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::<Key>::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not read cookie jar: {error:?}");
            return reject(log_in_url);
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("Rejected request to {}: {error}", parts.uri.path());
            return reject(log_in_url);
        }
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(extended_jar) => extended_jar,
        Err(error) => {
            tracing::error!("Could not extend session for user {user_id}: {error}");
            jar
        }
    };

    let (mut parts, body) = response.into_parts();
    for cookie in jar.into_response().headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, cookie.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Guards HTML pages, unauthenticated requests are redirected to the log-in
/// page.
///
/// Route handlers can take `Extension(user_id): Extension<UserID>` to get the
/// logged in user.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |log_in_url| {
        Redirect::to(&log_in_url).into_response()
    })
    .await
}

/// Guards routes called by htmx, unauthenticated requests get an
/// `HX-Redirect` to the log-in page.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |log_in_url| {
        (HxRedirect(log_in_url), StatusCode::OK).into_response()
    })
    .await
}

/// Guards JSON routes, unauthenticated requests get a `401` JSON error.
pub async fn auth_guard_json(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Not logged in" })),
        )
            .into_response()
    })
    .await
}
