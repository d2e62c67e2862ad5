//! The form for creating and editing expenses.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    category::Category,
    expense::core::{Expense, NewExpense},
    fields::{is_checked, parse_category_id, parse_date, parse_positive_amount, required},
    html::{FORM_CHECKBOX_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, category_select, submit_button},
};

/// The raw form data for an expense.
///
/// Every field is optional so that missing fields are reported as validation
/// errors instead of being rejected by the extractor.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExpenseForm {
    pub concept: Option<String>,
    /// A localized amount, e.g. "1.234,56".
    pub amount: Option<String>,
    pub category_id: Option<String>,
    /// The date as "YYYY-MM-DD".
    pub date: Option<String>,
    /// Only sent when the checkbox is ticked.
    pub essential: Option<String>,
    pub description: Option<String>,
}

impl ExpenseForm {
    /// Check that the required fields are present and well formed.
    ///
    /// # Errors
    ///
    /// Returns the first field error found: [Error::MissingField],
    /// [Error::InvalidAmount], [Error::NonPositiveAmount],
    /// [Error::InvalidCategory] or [Error::InvalidDate].
    pub fn validate(&self) -> Result<NewExpense, Error> {
        let concept = required(self.concept.as_deref(), "concept")?;
        let raw_amount = required(self.amount.as_deref(), "amount")?;
        let raw_category_id = required(self.category_id.as_deref(), "category")?;
        let raw_date = required(self.date.as_deref(), "date")?;

        Ok(NewExpense {
            concept,
            amount: parse_positive_amount(&raw_amount)?,
            category_id: parse_category_id(&raw_category_id)?,
            date: parse_date(&raw_date)?,
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_owned(),
            essential: is_checked(self.essential.as_deref()),
        })
    }
}

/// Where the expense form sends its data.
pub enum FormTarget<'a> {
    /// POST a new expense to the endpoint.
    Create(&'a str),
    /// PUT the changes to an existing expense to the endpoint.
    Edit(&'a str),
}

/// Render the expense form, pre-filled with `expense` when editing.
pub fn expense_form(
    target: FormTarget,
    categories: &[Category],
    expense: Option<&Expense>,
    max_date: Date,
) -> Markup {
    let (hx_post, hx_put, button_text) = match target {
        FormTarget::Create(endpoint) => (Some(endpoint), None, "Add Expense"),
        FormTarget::Edit(endpoint) => (None, Some(endpoint), "Save Changes"),
    };
    let concept = expense.map(|expense| expense.concept.as_str()).unwrap_or_default();
    let amount = expense
        .map(|expense| expense.amount.to_string().replace('.', ","))
        .unwrap_or_default();
    let date = expense.map(|expense| expense.date).unwrap_or(max_date);
    let description = expense
        .map(|expense| expense.description.as_str())
        .unwrap_or_default();
    let essential = expense.is_some_and(|expense| expense.essential);

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
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
                    placeholder="Rent"
                    required
                    value=(concept)
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
                    value=(amount)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (category_select(categories, expense.and_then(|expense| expense.category_id), true))

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    type="date"
                    name="date"
                    id="date"
                    required
                    value=(date)
                    max=(max_date)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                textarea
                    name="description"
                    id="description"
                    rows="2"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (description)
                }
            }

            div class="flex items-center gap-2"
            {
                input
                    type="checkbox"
                    name="essential"
                    id="essential"
                    checked[essential]
                    class=(FORM_CHECKBOX_STYLE);
                label for="essential" class="text-sm" { "Essential" }
            }

            (submit_button(button_text))
        }
    }
}

#[cfg(test)]
mod expense_form_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        expense::{core::NewExpense, form::ExpenseForm},
        money::Amount,
    };

    fn valid_form() -> ExpenseForm {
        ExpenseForm {
            concept: Some("Rent".to_owned()),
            amount: Some("1.234,56".to_owned()),
            category_id: Some("2".to_owned()),
            date: Some("2025-03-01".to_owned()),
            essential: Some("on".to_owned()),
            description: Some("  March rent ".to_owned()),
        }
    }

    #[test]
    fn validates_complete_form() {
        assert_eq!(
            valid_form().validate(),
            Ok(NewExpense {
                category_id: 2,
                concept: "Rent".to_owned(),
                amount: Amount::new(dec!(1234.56)),
                date: date!(2025 - 03 - 01),
                description: "March rent".to_owned(),
                essential: true,
            })
        );
    }

    #[test]
    fn optional_fields_default() {
        let form = ExpenseForm {
            essential: None,
            description: None,
            ..valid_form()
        };

        let expense = form.validate().unwrap();

        assert!(!expense.essential);
        assert_eq!(expense.description, "");
    }

    #[test]
    fn reports_missing_fields() {
        for (form, field) in [
            (ExpenseForm { concept: None, ..valid_form() }, "concept"),
            (ExpenseForm { amount: Some(" ".to_owned()), ..valid_form() }, "amount"),
            (ExpenseForm { category_id: None, ..valid_form() }, "category"),
            (ExpenseForm { date: None, ..valid_form() }, "date"),
        ] {
            assert_eq!(form.validate(), Err(Error::MissingField(field)));
        }
    }

    #[test]
    fn rejects_non_positive_amount() {
        let form = ExpenseForm {
            amount: Some("0".to_owned()),
            ..valid_form()
        };

        assert_eq!(form.validate(), Err(Error::NonPositiveAmount));
    }

    #[test]
    fn rejects_malformed_values() {
        let form = ExpenseForm {
            category_id: Some("food".to_owned()),
            ..valid_form()
        };
        assert_eq!(form.validate(), Err(Error::InvalidCategory("food".to_owned())));

        let form = ExpenseForm {
            date: Some("01/03/2025".to_owned()),
            ..valid_form()
        };
        assert_eq!(form.validate(), Err(Error::InvalidDate("01/03/2025".to_owned())));
    }
}
