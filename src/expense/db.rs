//! Database operations for expenses.

use std::collections::HashMap;

use rusqlite::{Connection, Row, types::Type};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    Category, Error,
    expense::{Expense, ExpenseId, NewExpense, format_date, parse_date},
};

/// Initialize the expense table and its date index.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expenses (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            category TEXT NOT NULL,
            createdAt TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);",
    )?;

    Ok(())
}

/// Write an expense, replacing any stored expense with the same ID.
///
/// `created_at` is recorded as the time the expense was stored.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDate] if a date cannot be formatted,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_or_replace_expense(
    expense: &NewExpense,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Expense, Error> {
    let date = format_date(expense.date)?;
    let created_at_text = created_at
        .format(&Rfc3339)
        .map_err(|error| Error::InvalidDate(error.to_string()))?;

    connection.execute(
        "INSERT OR REPLACE INTO expenses (id, title, amount, date, category, createdAt)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            expense.id.as_ref(),
            &expense.title,
            expense.amount,
            date,
            expense.category.name(),
            created_at_text,
        ),
    )?;

    Ok(Expense {
        id: expense.id.clone(),
        title: expense.title.clone(),
        amount: expense.amount,
        date: expense.date,
        category: expense.category.clone(),
        created_at,
    })
}

/// Retrieve all expenses, most recent date first.
///
/// Expenses with the same date are ordered by when they were last written,
/// most recent first.
pub fn get_all_expenses(connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, title, amount, date, category, createdAt FROM expenses
             ORDER BY date DESC, rowid DESC",
        )?
        .query_map([], map_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the title, amount, date and category of the expense with the
/// same ID as `expense`. The `createdAt` column is left alone.
///
/// Returns the number of rows changed, which is zero if no expense has that ID.
pub fn update_expense(expense: &NewExpense, connection: &Connection) -> Result<usize, Error> {
    let date = format_date(expense.date)?;

    let rows_affected = connection.execute(
        "UPDATE expenses SET title = ?1, amount = ?2, date = ?3, category = ?4 WHERE id = ?5",
        (
            &expense.title,
            expense.amount,
            date,
            expense.category.name(),
            expense.id.as_ref(),
        ),
    )?;

    Ok(rows_affected)
}

/// Delete an expense by ID. Deleting an ID that is not stored is not an error.
pub fn delete_expense(id: &ExpenseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM expenses WHERE id = ?1", [id.as_ref()])?;

    if rows_affected == 0 {
        tracing::debug!("no expense with ID {id} to delete");
    }

    Ok(())
}

/// Delete every expense.
pub fn delete_all_expenses(connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM expenses", [])?;
    tracing::debug!("deleted {rows_affected} expenses");

    Ok(())
}

/// The sum of all expense amounts, zero if there are none.
pub fn sum_amounts(connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row("SELECT COALESCE(SUM(amount), 0.0) FROM expenses", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// The sum of expense amounts for each category that has at least one expense.
pub fn sum_amounts_by_category(connection: &Connection) -> Result<HashMap<Category, f64>, Error> {
    connection
        .prepare("SELECT category, SUM(amount) FROM expenses GROUP BY category")?
        .query_map([], |row| {
            let raw_category: String = row.get(0)?;
            let total: f64 = row.get(1)?;

            Ok((Category::from(raw_category), total))
        })?
        .map(|maybe_total| maybe_total.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let raw_id: String = row.get(0)?;
    let title = row.get(1)?;
    let amount = row.get(2)?;

    let raw_date: String = row.get(3)?;
    let date = parse_date(&raw_date)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

    let raw_category: String = row.get(4)?;

    let raw_created_at: String = row.get(5)?;
    let created_at = OffsetDateTime::parse(&raw_created_at, &Rfc3339)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error)))?;

    Ok(Expense {
        id: ExpenseId::from(raw_id),
        title,
        amount,
        date,
        category: Category::from(raw_category),
        created_at,
    })
}
