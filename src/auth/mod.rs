//! Cookie based sessions, log-in, log-out and registration.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod register;
mod token;

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;
pub use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx, auth_guard_json};
pub use register::{get_register_page, register_user};
