use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, UserID,
    category::{Category, get_expense_categories},
    db::lock_connection,
    endpoints::{self, format_endpoint, with_month},
    expense::{
        core::{Expense, ExpenseId, get_expense},
        form::{FormTarget, expense_form},
    },
    html::{FORM_CONTAINER_STYLE, LINK_STYLE, base},
    month::MonthKey,
    navigation::NavBar,
    timezone::local_offset_or_error,
};

/// The state needed for the edit expense page.
#[derive(Debug, Clone)]
pub struct EditExpensePageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing an expense.
///
/// Responds with the 404 page if the expense does not belong to the user.
pub async fn get_edit_expense_page(
    State(state): State<EditExpensePageState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let expense = get_expense(user_id, expense_id, &connection)?;
    let categories = get_expense_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get expense categories: {error}"))?;
    let max_date = OffsetDateTime::now_utc().to_offset(local_offset).date();

    Ok(edit_expense_view(&expense, &categories, max_date).into_response())
}

fn edit_expense_view(expense: &Expense, categories: &[Category], max_date: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_EXPENSE_VIEW).into_html();
    let edit_url = format_endpoint(endpoints::EXPENSE, expense.id);
    let back_url = with_month(endpoints::EXPENSES_VIEW, MonthKey::from_date(expense.date));
    let form = expense_form(
        FormTarget::Edit(&edit_url),
        categories,
        Some(expense),
        // Allow keeping a date that is later than today.
        max_date.max(expense.date),
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full flex justify-between items-end mb-4"
            {
                h1 class="text-xl font-bold" { "Edit Expense" }
                a href=(back_url) class=(LINK_STYLE) { "Back" }
            }

            (form)
        }
    };

    base("Edit Expense", &content)
}
