//! Savings goals and the contributions made towards them.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod savings_page;

pub use core::create_savings_goal_table;
pub use create_endpoint::{contribute_endpoint, create_savings_goal_endpoint};
pub use delete_endpoint::delete_savings_goal_endpoint;
pub use savings_page::get_savings_page;
