mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod expenses_page;
mod form;
mod json_api;
mod record;

pub use core::create_expense_table;
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use edit_endpoint::edit_expense_endpoint;
pub use edit_page::get_edit_expense_page;
pub use expenses_page::get_expenses_page;
pub use json_api::get_expenses_api;
