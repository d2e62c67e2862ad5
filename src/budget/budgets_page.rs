//! Displays the budgets for a month and how much of each has been spent.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    budget::core::{BudgetSummary, get_budgets_for_month},
    category::{Category, get_expense_categories},
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, category_badge, category_select,
        delete_button, format_currency, month_navigation, submit_button,
    },
    month::{MonthKey, MonthQuery},
    navigation::NavBar,
    timezone::local_offset_or_error,
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the budgets page for the month in the `mes` query parameter.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let month = MonthKey::parse_or_current(query.mes.as_deref(), local_offset);

    let connection = lock_connection(&state.db_connection)?;

    let budgets = get_budgets_for_month(user_id, month, &connection)
        .inspect_err(|error| tracing::error!("could not get budgets for {month}: {error}"))?;
    let categories = get_expense_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get expense categories: {error}"))?;

    Ok(budgets_view(month, &budgets, &categories).into_response())
}

fn budgets_view(month: MonthKey, budgets: &[BudgetSummary], categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let table_row = |budget: &BudgetSummary| {
        let remaining = budget.status.remaining();
        let remaining_style = if remaining.is_positive() {
            "px-6 py-4 text-right"
        } else {
            "px-6 py-4 text-right text-red-600 dark:text-red-400"
        };

        html! {
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    (category_badge(
                        Some(&budget.category_name),
                        Some(&budget.category_color),
                        Some(&budget.category_icon),
                    ))
                }
                td class="px-6 py-4 text-right" { (format_currency(budget.status.ceiling)) }
                td class="px-6 py-4 text-right" { (format_currency(budget.status.accumulated)) }
                td class=(remaining_style) { (format_currency(remaining)) }
                td class=(TABLE_CELL_STYLE)
                {
                    (delete_button(
                        &format_endpoint(endpoints::BUDGET, budget.id),
                        &format!(
                            "Are you sure you want to delete the budget for {}?",
                            budget.category_name
                        ),
                        "closest tr",
                    ))
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
                h1 class="text-xl font-bold" { "Budgets" }

                (month_navigation(endpoints::BUDGETS_VIEW, month))

                div class="w-full overflow-x-auto"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Budget" }
                                th scope="col" class="px-6 py-3 text-right" { "Spent" }
                                th scope="col" class="px-6 py-3 text-right" { "Remaining" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for budget in budgets {
                                (table_row(budget))
                            }

                            @if budgets.is_empty() {
                                tr
                                {
                                    td colspan="5" class="px-6 py-4 text-center"
                                    {
                                        "No budgets set for " (month.label()) "."
                                    }
                                }
                            }
                        }
                    }
                }

                (set_budget_form(month, categories))
            }
        }
    };

    base("Budgets", &content)
}

fn set_budget_form(month: MonthKey, categories: &[Category]) -> Markup {
    html! {
        form
            hx-post=(endpoints::BUDGETS_API)
            hx-target-error="#alert-container"
            class="w-full max-w-md space-y-4"
        {
            h2 class="text-lg font-semibold" { "Set a budget" }

            (category_select(categories, None, true))

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                input
                    type="month"
                    name="month"
                    id="month"
                    required
                    value=(month)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                input
                    type="text"
                    name="amount"
                    id="amount"
                    inputmode="decimal"
                    placeholder="1.500"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (submit_button("Save Budget"))
        }
    }
}

#[cfg(test)]
mod budgets_page_tests {
    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        budget::{
            budgets_page::{BudgetsPageState, get_budgets_page},
            core::set_budget,
        },
        endpoints,
        money::Amount,
        month::{MonthKey, MonthQuery},
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_valid_html, expense_category_id,
            get_shared_test_connection, insert_test_expense, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn shows_budgets_for_requested_month() {
        let (db_connection, user_id) = get_shared_test_connection();
        {
            let connection = db_connection.lock().unwrap();
            let food = expense_category_id(&connection, "Groceries");
            set_budget(user_id, food, MonthKey::new(2025, 3).unwrap(), Amount::new(dec!(300)), &connection)
                .unwrap();
            set_budget(user_id, food, MonthKey::new(2025, 4).unwrap(), Amount::new(dec!(999)), &connection)
                .unwrap();
            insert_test_expense(&connection, user_id, Some(food), Amount::new(dec!(250)), date!(2025 - 03 - 10));
        }
        let state = BudgetsPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection,
        };
        let query = MonthQuery {
            mes: Some("2025-03".to_owned()),
        };

        let response = get_budgets_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let rows: Vec<String> = html
            .select(&Selector::parse("tbody tr").unwrap())
            .map(|row| row.text().collect::<String>())
            .collect();
        assert_eq!(rows.len(), 1, "want one budget row, got {rows:?}");
        assert!(rows[0].contains("Groceries"), "got {:?}", rows[0]);
        assert!(rows[0].contains("$300.00"), "got {:?}", rows[0]);
        assert!(rows[0].contains("$250.00"), "got {:?}", rows[0]);
        assert!(rows[0].contains("$50.00"), "got {:?}", rows[0]);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::BUDGETS_API, "hx-post");
        assert_form_input(&form, "month", "month");
        assert_form_input(&form, "amount", "text");
    }

    #[tokio::test]
    async fn shows_empty_message_without_budgets() {
        let (db_connection, user_id) = get_shared_test_connection();
        let state = BudgetsPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection,
        };

        let response = get_budgets_page(State(state), Extension(user_id), Query(MonthQuery::default()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let text = html
            .select(&Selector::parse("tbody").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(text.contains("No budgets set"), "got {text:?}");
    }
}
