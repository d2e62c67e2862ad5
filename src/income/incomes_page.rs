//! Displays the incomes for a month and the form for recording an income.

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
    category::{Category, get_income_categories},
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, category_badge,
        category_select, delete_button, format_currency, month_navigation, submit_button,
    },
    income::core::{IncomeListing, get_income_total_for_month, get_incomes_for_month},
    money::Amount,
    month::{MonthKey, MonthQuery},
    navigation::NavBar,
    timezone::local_offset_or_error,
};

/// The state needed for the incomes page.
#[derive(Debug, Clone)]
pub struct IncomesPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for IncomesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the incomes page for the month in the `mes` query parameter.
pub async fn get_incomes_page(
    State(state): State<IncomesPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let month = MonthKey::parse_or_current(query.mes.as_deref(), local_offset);
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = lock_connection(&state.db_connection)?;

    let incomes = get_incomes_for_month(user_id, month, &connection)
        .inspect_err(|error| tracing::error!("could not get incomes for {month}: {error}"))?;
    let month_total = get_income_total_for_month(user_id, month, &connection)?;
    let balance = get_balance(user_id, &connection)?;
    let categories = get_income_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get income categories: {error}"))?;

    Ok(incomes_view(month, today, balance, month_total, &incomes, &categories).into_response())
}

fn incomes_view(
    month: MonthKey,
    today: Date,
    balance: Amount,
    month_total: Amount,
    incomes: &[IncomeListing],
    categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::INCOMES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Incomes" }

                div class="grid grid-cols-2 gap-4" data-summary="true"
                {
                    div class=(CARD_STYLE)
                    {
                        p class="text-xs uppercase text-gray-500 dark:text-gray-400" { "Balance" }
                        p class="text-lg font-semibold tabular-nums" { (format_currency(balance)) }
                    }
                    div class=(CARD_STYLE)
                    {
                        p class="text-xs uppercase text-gray-500 dark:text-gray-400" { "This month" }
                        p class="text-lg font-semibold tabular-nums" { (format_currency(month_total)) }
                    }
                }

                (month_navigation(endpoints::INCOMES_VIEW, month))

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
                            @for income in incomes {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (income.date) }
                                    th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                                    {
                                        (income.concept)
                                        @if !income.description.is_empty() {
                                            p class="text-xs font-normal text-gray-500" { (income.description) }
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (category_badge(
                                            income.category_name.as_deref(),
                                            income.category_color.as_deref(),
                                            income.category_icon.as_deref(),
                                        ))
                                    }
                                    td class="px-6 py-4 text-right tabular-nums" { (format_currency(income.amount)) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (delete_button(
                                            &format_endpoint(endpoints::INCOME, income.id),
                                            &format!("Are you sure you want to delete the income '{}'?", income.concept),
                                            "closest tr",
                                        ))
                                    }
                                }
                            }

                            @if incomes.is_empty() {
                                tr
                                {
                                    td colspan="5" class="px-6 py-4 text-center"
                                    {
                                        "No incomes recorded in " (month.label()) "."
                                    }
                                }
                            }
                        }
                    }
                }

                section class="w-full max-w-md"
                {
                    h2 class="text-lg font-semibold mb-2" { "Add an income" }
                    (income_form(categories, today))
                }
            }
        }
    };

    base("Incomes", &content)
}

fn income_form(categories: &[Category], today: Date) -> Markup {
    html! {
        form
            hx-post=(endpoints::INCOMES_API)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div
            {
                label for="concept" class=(FORM_LABEL_STYLE) { "Concept" }
                input
                    type="text"
                    name="concept"
                    id="concept"
                    placeholder="Salary"
                    required
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
                    placeholder="1.234,56"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (category_select(categories, None, true))

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    type="date"
                    name="date"
                    id="date"
                    required
                    value=(today)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                textarea name="description" id="description" rows="2" class=(FORM_TEXT_INPUT_STYLE) {}
            }

            (submit_button("Add Income"))
        }
    }
}
