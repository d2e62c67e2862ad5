#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use db::{
    count_rows, expense_category_id, get_shared_test_connection, get_test_connection,
    income_category_id, insert_test_budget, insert_test_expense, insert_test_income,
    insert_test_user,
};
pub(crate) use form::{
    assert_form_input, assert_form_input_with_value, assert_hx_endpoint, must_get_form,
};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment};
pub(crate) use http::{assert_hx_redirect, parse_json_body};
