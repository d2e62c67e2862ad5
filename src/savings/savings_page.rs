//! Displays the savings goals with their progress and the forms for creating
//! goals and adding contributions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, UserID,
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, delete_button, format_currency, submit_button,
    },
    navigation::NavBar,
    savings::core::{SavingsGoal, get_savings_goals},
    timezone::local_offset_or_error,
};

/// The state needed for the savings page.
#[derive(Debug, Clone)]
pub struct SavingsPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SavingsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the savings goals of the user.
pub async fn get_savings_page(
    State(state): State<SavingsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = lock_connection(&state.db_connection)?;
    let goals = get_savings_goals(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get savings goals: {error}"))?;

    Ok(savings_view(&goals, today).into_response())
}

fn savings_view(goals: &[SavingsGoal], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::SAVINGS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Savings" }

                @if goals.is_empty() {
                    p { "You have not set any savings goals yet." }
                }

                div class="grid gap-4 md:grid-cols-2"
                {
                    @for goal in goals {
                        (goal_card(goal))
                    }
                }

                section class="w-full max-w-md"
                {
                    h2 class="text-lg font-semibold mb-2" { "New savings goal" }
                    (goal_form(today))
                }
            }
        }
    };

    base("Savings", &content)
}

fn goal_card(goal: &SavingsGoal) -> Markup {
    let progress = goal.progress_percent();
    let bar_color = if goal.completed {
        "bg-green-500"
    } else {
        "bg-blue-500"
    };

    html! {
        article class=(CARD_STYLE) data-goal-id=(goal.id)
        {
            div class="flex justify-between items-start"
            {
                h3 class="font-semibold" { (goal.name) }
                (delete_button(
                    &format_endpoint(endpoints::SAVINGS_GOAL, goal.id),
                    &format!("Are you sure you want to delete the goal '{}'?", goal.name),
                    "closest article",
                ))
            }

            p class="text-sm tabular-nums"
            {
                (format_currency(goal.accumulated)) " of " (format_currency(goal.target))
            }

            div class="w-full h-2 my-2 rounded bg-gray-200 dark:bg-gray-700"
            {
                div class={ "h-2 rounded " (bar_color) } style={ "width: " (progress) "%" } {}
            }

            p class="text-xs text-gray-500 dark:text-gray-400"
            {
                "Started " (goal.start_date)
                @if let Some(target_date) = goal.target_date {
                    ", target " (target_date)
                }
            }

            @if goal.completed {
                p class="text-sm font-semibold text-green-600" data-completed="true" { "Goal reached!" }
            } @else {
                form
                    hx-post=(format_endpoint(endpoints::SAVINGS_CONTRIBUTIONS, goal.id))
                    hx-target-error="#alert-container"
                    class="flex gap-2 mt-2"
                {
                    input
                        type="text"
                        name="amount"
                        inputmode="decimal"
                        placeholder="100"
                        required
                        aria-label="Contribution amount"
                        class=(FORM_TEXT_INPUT_STYLE);
                    button type="submit" class={ "w-auto! " (BUTTON_PRIMARY_STYLE) } { "Add" }
                }
            }
        }
    }
}

fn goal_form(today: Date) -> Markup {
    html! {
        form
            hx-post=(endpoints::SAVINGS_API)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }
                input
                    type="text"
                    name="name"
                    id="name"
                    placeholder="Holiday"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="target" class=(FORM_LABEL_STYLE) { "Target" }
                input
                    type="text"
                    name="target"
                    id="target"
                    inputmode="decimal"
                    placeholder="5.000"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="target_date" class=(FORM_LABEL_STYLE) { "Target date (optional)" }
                input
                    type="date"
                    name="target_date"
                    id="target_date"
                    min=(today)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (submit_button("Create Goal"))
        }
    }
}

#[cfg(test)]
mod savings_page_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        endpoints::{self, format_endpoint},
        money::Amount,
        savings::{
            core::{SavingsGoalForm, add_contribution, create_savings_goal},
            savings_page::{SavingsPageState, get_savings_page},
        },
        test_utils::{assert_valid_html, get_shared_test_connection, parse_html_document},
    };

    #[tokio::test]
    async fn shows_goals_with_contribution_forms() {
        let (db_connection, user_id) = get_shared_test_connection();
        let (open_goal, completed_goal) = {
            let mut connection = db_connection.lock().unwrap();
            let form = SavingsGoalForm {
                name: Some("Bike".to_owned()),
                target: Some("100".to_owned()),
                target_date: None,
            };
            let open_goal =
                create_savings_goal(user_id, &form, date!(2025 - 01 - 01), &mut connection).unwrap();
            let completed_goal =
                create_savings_goal(user_id, &form, date!(2025 - 01 - 01), &mut connection).unwrap();
            add_contribution(user_id, completed_goal.id, Amount::new(dec!(100)), &connection)
                .unwrap();
            (open_goal, completed_goal)
        };
        let state = SavingsPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection,
        };

        let response = get_savings_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(html.select(&Selector::parse("article").unwrap()).count(), 2);

        let contribution_forms: Vec<String> = html
            .select(&Selector::parse("article form").unwrap())
            .filter_map(|form| form.value().attr("hx-post").map(str::to_owned))
            .collect();
        assert_eq!(
            contribution_forms,
            vec![format_endpoint(endpoints::SAVINGS_CONTRIBUTIONS, open_goal.id)]
        );

        let completed_selector =
            Selector::parse(&format!("article[data-goal-id=\"{}\"] [data-completed]", completed_goal.id))
                .unwrap();
        assert_eq!(html.select(&completed_selector).count(), 1);
    }
}
