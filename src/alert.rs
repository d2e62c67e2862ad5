//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element defined in [crate::html::base].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// An alert message to display to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An operation succeeded and there is nothing more to say about it.
    SuccessSimple { message: String },
    /// An operation failed.
    Error { message: String, details: String },
}

impl Alert {
    /// Render the alert as HTML.
    pub fn into_html(self) -> Markup {
        let (message, details, container_style, icon) = match self {
            Alert::SuccessSimple { message } => (message, String::new(), SUCCESS_STYLE, "✓"),
            Alert::Error { message, details } => (message, details, ERROR_STYLE, "!"),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div role="alert" class=(container_style)
                {
                    span class="font-bold me-2" { (icon) }

                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1 text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="ms-2 font-bold"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        (StatusCode::OK, self.into_html()).into_response()
    }
}

const SUCCESS_STYLE: &str = "flex items-start p-4 rounded-lg shadow text-green-800 \
    bg-green-50 border border-green-300 dark:bg-gray-800 dark:text-green-400 \
    dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start p-4 rounded-lg shadow text-red-800 \
    bg-red-50 border border-red-300 dark:bg-gray-800 dark:text-red-400 \
    dark:border-red-800";
