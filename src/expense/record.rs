//! Accepts or rejects new and edited expenses.
//!
//! An expense moves through these states before it is written:
//!
//! 1. [ExpenseForm] is received.
//! 2. [NewExpense]: the fields are present and well formed.
//! 3. [Funded]: the user's balance covers the amount.
//! 4. [WithinBudget]: the amount fits in the budget left for its category in
//!    the current month, or there is no budget for the category.
//! 5. The expense is inserted or updated.
//!
//! Any step may reject the expense, in which case nothing is written. The
//! balance and budget checks and the write happen in one IMMEDIATE
//! transaction so two submissions cannot both spend the same money.

use rusqlite::{Connection, Transaction};

use crate::{
    Error, UserID,
    balance::get_balance,
    budget::get_budget_status,
    category::{get_expense_category, get_expense_category_name},
    db::in_transaction,
    expense::{
        core::{Expense, ExpenseId, NewExpense, get_expense, insert_expense, update_expense},
        form::ExpenseForm,
    },
    month::MonthKey,
};

/// An expense the user has enough money for.
#[derive(Debug)]
struct Funded(NewExpense);

/// An expense the user has enough money and budget for.
#[derive(Debug)]
struct WithinBudget(NewExpense);

/// Validate and store a new expense for `user_id`.
///
/// `budget_month` is the month whose budget the expense is checked against,
/// normally the current month in the user's timezone.
///
/// # Errors
///
/// Returns:
/// - a field error from [ExpenseForm::validate], or [Error::InvalidCategory]
///   if the category does not exist,
/// - [Error::InsufficientFunds] if the amount is more than the user's balance,
/// - [Error::BudgetExceeded] if the amount is more than the budget left,
/// - [Error::SqlError] if a query failed.
pub fn record_expense(
    user_id: UserID,
    form: &ExpenseForm,
    budget_month: MonthKey,
    connection: &mut Connection,
) -> Result<Expense, Error> {
    let expense = form.validate()?;

    in_transaction(connection, |transaction| {
        check_category_exists(&expense, transaction)?;
        let funded = check_balance(user_id, expense, None, transaction)?;
        let within_budget = check_budget(user_id, funded, None, budget_month, transaction)?;

        let expense_id = insert_expense(user_id, &within_budget.0, transaction)?;

        get_expense(user_id, expense_id, transaction)
    })
}

/// Validate and apply changes to an existing expense of `user_id`.
///
/// The expense being replaced does not count against the new values: its
/// old amount is available to spend again, and it is removed from the budget
/// spend if it was counted there.
///
/// # Errors
///
/// Returns [Error::ExpenseNotFound] if the expense does not exist or belongs
/// to another user, before any field is looked at. Otherwise returns the same
/// errors as [record_expense].
pub fn edit_expense(
    user_id: UserID,
    expense_id: ExpenseId,
    form: &ExpenseForm,
    budget_month: MonthKey,
    connection: &mut Connection,
) -> Result<Expense, Error> {
    in_transaction(connection, |transaction| {
        let existing = get_expense(user_id, expense_id, transaction)?;
        let expense = form.validate()?;

        check_category_exists(&expense, transaction)?;
        let funded = check_balance(user_id, expense, Some(&existing), transaction)?;
        let within_budget =
            check_budget(user_id, funded, Some(&existing), budget_month, transaction)?;

        update_expense(user_id, expense_id, &within_budget.0, transaction)?;

        get_expense(user_id, expense_id, transaction)
    })
}

fn check_category_exists(expense: &NewExpense, transaction: &Transaction) -> Result<(), Error> {
    match get_expense_category(expense.category_id, transaction)? {
        Some(_) => Ok(()),
        None => Err(Error::InvalidCategory(expense.category_id.to_string())),
    }
}

fn check_balance(
    user_id: UserID,
    expense: NewExpense,
    replaced: Option<&Expense>,
    transaction: &Transaction,
) -> Result<Funded, Error> {
    let mut balance = get_balance(user_id, transaction)?;

    if let Some(replaced) = replaced {
        balance += replaced.amount;
    }

    if expense.amount > balance {
        tracing::info!(
            "Rejected expense of {} for user {user_id}: balance is {balance}",
            expense.amount
        );
        return Err(Error::InsufficientFunds { balance });
    }

    Ok(Funded(expense))
}

fn check_budget(
    user_id: UserID,
    Funded(expense): Funded,
    replaced: Option<&Expense>,
    budget_month: MonthKey,
    transaction: &Transaction,
) -> Result<WithinBudget, Error> {
    let Some(mut status) =
        get_budget_status(user_id, expense.category_id, budget_month, transaction)?
    else {
        return Ok(WithinBudget(expense));
    };

    let counted_in_budget = replaced.filter(|replaced| {
        replaced.category_id == Some(expense.category_id) && budget_month.contains(replaced.date)
    });

    if let Some(replaced) = counted_in_budget {
        status.accumulated -= replaced.amount;
    }

    if status.would_exceed(expense.amount) {
        let remaining = status.remaining();
        tracing::info!(
            "Rejected expense of {} for user {user_id}: {remaining} left in the budget",
            expense.amount
        );

        return Err(Error::BudgetExceeded {
            category: get_expense_category_name(expense.category_id, transaction),
            remaining,
        });
    }

    Ok(WithinBudget(expense))
}
