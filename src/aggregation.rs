//! Totals derived from expenses that are already in memory.
//!
//! These mirror the store's aggregate queries so that views can compute their
//! figures from the list they hold without querying the database again.

use std::collections::HashMap;

use time::Date;

use crate::{Category, Expense};

/// The sum of the amounts of `expenses`.
pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// The sum of the amounts of `expenses` dated in the same calendar month and
/// year as `reference`.
///
/// Dates are compared by their local calendar fields, no timezone conversion
/// is made.
pub fn monthly_total(expenses: &[Expense], reference: Date) -> f64 {
    expenses
        .iter()
        .filter(|expense| {
            expense.date.year() == reference.year() && expense.date.month() == reference.month()
        })
        .map(|expense| expense.amount)
        .sum()
}

/// The sum of the amounts of `expenses` for each category.
///
/// Only categories with at least one expense are included.
pub fn totals_by_category(expenses: &[Expense]) -> HashMap<Category, f64> {
    let mut totals = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }

    totals
}
