mod budgets_page;
mod core;
mod delete_endpoint;
mod set_endpoint;

pub use budgets_page::get_budgets_page;
pub use core::{create_budget_table, get_budget_status};
pub use delete_endpoint::delete_budget_endpoint;
pub use set_endpoint::set_budget_endpoint;
