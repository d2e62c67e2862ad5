//! Where to send the user after they log in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// The prefix shared by the htmx and JSON routes.
const API_PREFIX: &str = "/api";

/// Only local paths are followed, and never back to the log-in page.
fn is_local_path(path_and_query: &str) -> bool {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return false;
    }

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW
}

/// Reduce `raw_url` to a local path and query, or `None` if it points
/// somewhere it is not safe to redirect to.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();

    is_local_path(path_and_query).then(|| path_and_query.to_owned())
}

/// The page htmx made the request from, which is where the user should land
/// after logging back in.
fn current_page_of_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        return None;
    }

    let current_url = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())?;
    // htmx sends the absolute URL, only the path and query are kept.
    let path_and_query = current_url.parse::<Uri>().ok()?.path_and_query()?.as_str().to_owned();

    if is_local_path(&path_and_query) {
        Some(path_and_query)
    } else {
        tracing::warn!("Ignoring unsafe HX-Current-URL {current_url}");
        None
    }
}

/// The log-in page URL with `target` as the page to return to.
pub fn log_in_url_with_redirect(target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", target)]) {
        Ok(query) => format!("{}?{query}", endpoints::LOG_IN_VIEW),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

/// The log-in page URL for an unauthenticated `request`.
///
/// Page requests return to the requested page, API requests return to the
/// page they were made from. Anything else returns to the expenses page.
pub fn log_in_url_for_request(request: &Request) -> String {
    let target = if request.uri().path().starts_with(API_PREFIX) {
        current_page_of_hx_request(request)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    log_in_url_with_redirect(target.as_deref().unwrap_or(endpoints::EXPENSES_VIEW))
}
