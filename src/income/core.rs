//! The income table, the income form and the queries for incomes.

use rusqlite::{Connection, Row, params};
use serde::Deserialize;
use time::Date;

use crate::{
    Error, UserID,
    category::{CategoryId, get_income_category},
    db::{fetch_all, in_transaction},
    fields::{parse_category_id, parse_date, parse_positive_amount, required},
    money::Amount,
    month::MonthKey,
};

/// The database ID of an income.
pub type IncomeId = i64;

/// An income with the details of its category for display.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeListing {
    pub id: IncomeId,
    pub concept: String,
    pub amount: Amount,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub category_icon: Option<String>,
    pub date: Date,
    pub description: String,
}

/// The raw form data for an income.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IncomeForm {
    pub concept: Option<String>,
    /// A localized amount, e.g. "1.234,56".
    pub amount: Option<String>,
    pub category_id: Option<String>,
    /// The date as "YYYY-MM-DD".
    pub date: Option<String>,
    pub description: Option<String>,
}

/// The fields of an income that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncome {
    pub category_id: CategoryId,
    pub concept: String,
    pub amount: Amount,
    pub date: Date,
    pub description: String,
}

impl IncomeForm {
    /// Check that the required fields are present and well formed.
    ///
    /// # Errors
    ///
    /// Returns the first field error found.
    pub fn validate(&self) -> Result<NewIncome, Error> {
        let concept = required(self.concept.as_deref(), "concept")?;
        let raw_amount = required(self.amount.as_deref(), "amount")?;
        let raw_category_id = required(self.category_id.as_deref(), "category")?;
        let raw_date = required(self.date.as_deref(), "date")?;

        Ok(NewIncome {
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
        })
    }
}

/// Create the income table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_income_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS income (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER REFERENCES income_category(id) ON DELETE SET NULL,
            concept TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_income_user_date ON income(user_id, date)",
        (),
    )?;

    Ok(())
}

/// Validate and store an income for `user_id`.
///
/// Incomes are not checked against the balance or budgets.
///
/// # Errors
///
/// Returns a field error from [IncomeForm::validate],
/// [Error::InvalidCategory] if the category does not exist, or
/// [Error::SqlError] if the insert failed.
pub fn record_income(
    user_id: UserID,
    form: &IncomeForm,
    connection: &mut Connection,
) -> Result<(IncomeId, NewIncome), Error> {
    let income = form.validate()?;

    in_transaction(connection, |transaction| {
        if get_income_category(income.category_id, transaction)?.is_none() {
            return Err(Error::InvalidCategory(income.category_id.to_string()));
        }

        transaction.execute(
            "INSERT INTO income (user_id, category_id, concept, amount, date, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id.as_i64(),
                income.category_id,
                income.concept,
                income.amount,
                income.date,
                income.description,
            ],
        )?;

        Ok(transaction.last_insert_rowid())
    })
    .map(|income_id| (income_id, income))
}

fn map_listing_row(row: &Row) -> Result<IncomeListing, rusqlite::Error> {
    Ok(IncomeListing {
        id: row.get(0)?,
        concept: row.get(1)?,
        amount: row.get(2)?,
        category_name: row.get(3)?,
        category_color: row.get(4)?,
        category_icon: row.get(5)?,
        date: row.get(6)?,
        description: row.get(7)?,
    })
}

/// Get the incomes of `user_id` in `month`, newest first.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_incomes_for_month(
    user_id: UserID,
    month: MonthKey,
    connection: &Connection,
) -> Result<Vec<IncomeListing>, Error> {
    fetch_all(
        connection,
        "SELECT i.id, i.concept, i.amount, c.name, c.color, c.icon, i.date, i.description
        FROM income i
        LEFT JOIN income_category c ON c.id = i.category_id
        WHERE i.user_id = ?1 AND substr(i.date, 1, 7) = ?2
        ORDER BY i.date DESC, i.id DESC",
        params![user_id.as_i64(), month],
        map_listing_row,
    )
}

/// Get the sum of the incomes of `user_id` in `month`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_income_total_for_month(
    user_id: UserID,
    month: MonthKey,
    connection: &Connection,
) -> Result<Amount, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM income
            WHERE user_id = ?1 AND substr(date, 1, 7) = ?2",
            params![user_id.as_i64(), month],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Delete an income owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::IncomeNotFound] if the income does not exist or belongs to
/// another user, in which case nothing is deleted.
pub fn delete_income(
    user_id: UserID,
    income_id: IncomeId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM income WHERE id = ?1 AND user_id = ?2",
        params![income_id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::IncomeNotFound)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod record_income_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        balance::get_balance,
        income::core::{IncomeForm, delete_income, get_incomes_for_month, record_income},
        money::Amount,
        month::MonthKey,
        test_utils::{count_rows, get_test_connection, income_category_id, insert_test_user},
    };

    fn salary_form(connection: &rusqlite::Connection) -> IncomeForm {
        IncomeForm {
            concept: Some("March salary".to_owned()),
            amount: Some("2.500,75".to_owned()),
            category_id: Some(income_category_id(connection, "Salary").to_string()),
            date: Some("2025-03-25".to_owned()),
            description: None,
        }
    }

    #[test]
    fn records_income_without_balance_check() {
        let (mut connection, user_id) = get_test_connection();
        let form = salary_form(&connection);

        let (_, income) = record_income(user_id, &form, &mut connection).unwrap();

        assert_eq!(income.amount, Amount::new(dec!(2500.75)));
        assert_eq!(income.date, date!(2025 - 03 - 25));
        assert_eq!(get_balance(user_id, &connection), Ok(Amount::new(dec!(2500.75))));
    }

    #[test]
    fn rejects_missing_concept() {
        let (mut connection, user_id) = get_test_connection();
        let form = IncomeForm {
            concept: None,
            ..salary_form(&connection)
        };

        assert_eq!(
            record_income(user_id, &form, &mut connection),
            Err(Error::MissingField("concept"))
        );
        assert_eq!(count_rows(&connection, "income"), 0);
    }

    #[test]
    fn rejects_amount_too_large_to_store() {
        let (mut connection, user_id) = get_test_connection();
        let form = IncomeForm {
            amount: Some("100.000.000.000.000.000".to_owned()),
            ..salary_form(&connection)
        };

        assert_eq!(
            record_income(user_id, &form, &mut connection),
            Err(Error::InvalidAmount("100.000.000.000.000.000".to_owned()))
        );
        assert_eq!(count_rows(&connection, "income"), 0);
    }

    #[test]
    fn largest_incomes_keep_balance_readable() {
        let (mut connection, user_id) = get_test_connection();
        let form = IncomeForm {
            amount: Some("1.000.000.000".to_owned()),
            ..salary_form(&connection)
        };

        record_income(user_id, &form, &mut connection).unwrap();
        record_income(user_id, &form, &mut connection).unwrap();

        assert_eq!(
            get_balance(user_id, &connection),
            Ok(Amount::new(dec!(2000000000)))
        );
    }

    #[test]
    fn rejects_unknown_category() {
        let (mut connection, user_id) = get_test_connection();
        let form = IncomeForm {
            category_id: Some("999".to_owned()),
            ..salary_form(&connection)
        };

        assert_eq!(
            record_income(user_id, &form, &mut connection),
            Err(Error::InvalidCategory("999".to_owned()))
        );
        assert_eq!(count_rows(&connection, "income"), 0);
    }

    #[test]
    fn lists_incomes_for_month() {
        let (mut connection, user_id) = get_test_connection();
        let form = salary_form(&connection);
        record_income(user_id, &form, &mut connection).unwrap();
        let april = IncomeForm {
            date: Some("2025-04-25".to_owned()),
            ..salary_form(&connection)
        };
        record_income(user_id, &april, &mut connection).unwrap();

        let incomes =
            get_incomes_for_month(user_id, MonthKey::new(2025, 3).unwrap(), &connection).unwrap();

        assert_eq!(incomes.len(), 1);
        assert_eq!(incomes[0].category_name.as_deref(), Some("Salary"));
    }

    #[test]
    fn delete_checks_owner() {
        let (mut connection, user_id) = get_test_connection();
        let form = salary_form(&connection);
        let (income_id, _) = record_income(user_id, &form, &mut connection).unwrap();
        let other_user_id = insert_test_user(&connection, "other@example.com");

        assert_eq!(
            delete_income(other_user_id, income_id, &connection),
            Err(Error::IncomeNotFound)
        );
        assert_eq!(delete_income(user_id, income_id, &connection), Ok(()));
        assert_eq!(count_rows(&connection, "income"), 0);
    }
}
