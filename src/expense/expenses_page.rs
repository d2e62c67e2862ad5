//! Displays the expenses for a month with the user's balance and totals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, UserID,
    balance::get_balance,
    category::{Category, get_expense_categories},
    db::lock_connection,
    endpoints::{self, format_endpoint},
    expense::{
        core::{ExpenseListing, get_expense_total, get_expenses_for_month},
        form::{FormTarget, expense_form},
    },
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, category_badge, delete_button, format_currency, month_navigation,
    },
    money::Amount,
    month::{MonthKey, MonthQuery},
    navigation::NavBar,
    timezone::local_offset_or_error,
};

/// The state needed for the expenses page.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The figures shown above the expenses table.
#[derive(Debug, PartialEq)]
struct ExpenseSummary {
    balance: Amount,
    month_total: Amount,
    overall_total: Amount,
    count: usize,
}

/// Renders the expenses page for the month in the `mes` query parameter.
pub async fn get_expenses_page(
    State(state): State<ExpensesPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let month = MonthKey::parse_or_current(query.mes.as_deref(), local_offset);
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = lock_connection(&state.db_connection)?;

    let expenses = get_expenses_for_month(user_id, month, &connection)
        .inspect_err(|error| tracing::error!("could not get expenses for {month}: {error}"))?;
    let summary = ExpenseSummary {
        balance: get_balance(user_id, &connection)?,
        month_total: get_expense_total(user_id, Some(month), &connection)?,
        overall_total: get_expense_total(user_id, None, &connection)?,
        count: expenses.len(),
    };
    let categories = get_expense_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get expense categories: {error}"))?;

    Ok(expenses_view(month, today, &summary, &expenses, &categories).into_response())
}

fn summary_card(label: &str, value: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            p class="text-xs uppercase text-gray-500 dark:text-gray-400" { (label) }
            p class="text-lg font-semibold tabular-nums" { (value) }
        }
    }
}

fn expenses_view(
    month: MonthKey,
    today: Date,
    summary: &ExpenseSummary,
    expenses: &[ExpenseListing],
    categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();
    let form = expense_form(
        FormTarget::Create(endpoints::EXPENSES_API),
        categories,
        None,
        today,
    );

    let table_row = |expense: &ExpenseListing| {
        html! {
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (expense.date) }
                th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                {
                    (expense.concept)
                    @if expense.essential {
                        span class="ms-2 text-xs text-blue-600 dark:text-blue-400" { "Essential" }
                    }
                    @if !expense.description.is_empty() {
                        p class="text-xs font-normal text-gray-500" { (expense.description) }
                    }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    (category_badge(
                        expense.category_name.as_deref(),
                        expense.category_color.as_deref(),
                        expense.category_icon.as_deref(),
                    ))
                }
                td class="px-6 py-4 text-right tabular-nums" { (format_currency(expense.amount)) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        a
                            href=(format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id))
                            class=(LINK_STYLE)
                        {
                            "Edit"
                        }

                        (delete_button(
                            &format_endpoint(endpoints::EXPENSE, expense.id),
                            &format!(
                                "Are you sure you want to delete the expense '{}'? This cannot be undone.",
                                expense.concept
                            ),
                            "closest tr",
                        ))
                    }
                }
            }
        }
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Expenses" }

                div class="grid grid-cols-2 lg:grid-cols-4 gap-4" data-summary="true"
                {
                    (summary_card("Balance", &format_currency(summary.balance)))
                    (summary_card("This month", &format_currency(summary.month_total)))
                    (summary_card("All time", &format_currency(summary.overall_total)))
                    (summary_card("Expenses this month", &summary.count.to_string()))
                }

                (month_navigation(endpoints::EXPENSES_VIEW, month))

                div class="w-full overflow-x-auto"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Concept" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for expense in expenses {
                                (table_row(expense))
                            }

                            @if expenses.is_empty() {
                                tr
                                {
                                    td colspan="5" class="px-6 py-4 text-center"
                                    {
                                        "No expenses recorded in " (month.label()) "."
                                    }
                                }
                            }
                        }
                    }
                }

                section class="w-full max-w-md"
                {
                    h2 class="text-lg font-semibold mb-2" { "Add an expense" }
                    (form)
                }
            }
        }
    };

    base("Expenses", &content)
}

#[cfg(test)]
mod expenses_page_tests {
    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        endpoints,
        expense::expenses_page::{ExpensesPageState, get_expenses_page},
        money::Amount,
        month::MonthQuery,
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_valid_html, expense_category_id,
            get_shared_test_connection, insert_test_expense, insert_test_income, must_get_form,
            parse_html_document,
        },
    };

    fn summary_values(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("[data-summary] p.text-lg").unwrap())
            .map(|value| value.text().collect())
            .collect()
    }

    #[tokio::test]
    async fn shows_month_expenses_and_totals() {
        let (db_connection, user_id) = get_shared_test_connection();
        {
            let connection = db_connection.lock().unwrap();
            let food = expense_category_id(&connection, "Groceries");
            insert_test_income(&connection, user_id, Amount::new(dec!(2000)), date!(2025 - 03 - 01));
            insert_test_expense(&connection, user_id, Some(food), Amount::new(dec!(150)), date!(2025 - 03 - 03));
            insert_test_expense(&connection, user_id, None, Amount::new(dec!(50)), date!(2025 - 03 - 20));
            insert_test_expense(&connection, user_id, None, Amount::new(dec!(300)), date!(2025 - 02 - 20));
        }
        let state = ExpensesPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection,
        };
        let query = MonthQuery {
            mes: Some("2025-03".to_owned()),
        };

        let response = get_expenses_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            summary_values(&html),
            vec!["$1,500.00", "$200.00", "$500.00", "2"]
        );
        let rows = html.select(&Selector::parse("tbody tr").unwrap()).count();
        assert_eq!(rows, 2);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::EXPENSES_API, "hx-post");
        assert_form_input(&form, "concept", "text");
        assert_form_input(&form, "amount", "text");
        assert_form_input(&form, "date", "date");
    }

    #[tokio::test]
    async fn malformed_month_falls_back_to_current_month() {
        let (db_connection, user_id) = get_shared_test_connection();
        let state = ExpensesPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection,
        };
        let query = MonthQuery {
            mes: Some("not-a-month".to_owned()),
        };

        let response = get_expenses_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        let text = html
            .select(&Selector::parse("tbody").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(text.contains("No expenses recorded"), "got {text:?}");
    }
}
