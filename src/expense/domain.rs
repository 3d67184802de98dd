//! Core expense domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{Category, Error, expense::date::iso_date};

/// The caller supplied, unique identifier of an expense.
///
/// Any unique string is valid. New expenses recorded through the app use
/// [ExpenseId::from_timestamp].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    /// Wrap an existing identifier.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// Create an identifier from the number of milliseconds between the Unix
    /// epoch and `timestamp`.
    pub fn from_timestamp(timestamp: OffsetDateTime) -> Self {
        let milliseconds = timestamp.unix_timestamp_nanos() / 1_000_000;
        Self(milliseconds.to_string())
    }
}

impl AsRef<str> for ExpenseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExpenseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for ExpenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An expense as supplied by the caller, i.e. everything but the time it was
/// stored.
///
/// The store does not validate these fields, see [ExpenseBuilder::finalise]
/// for the checks callers are expected to make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    /// The unique ID of the expense.
    pub id: ExpenseId,
    /// What the money was spent on, e.g. "Coffee".
    pub title: String,
    /// How much was spent. Always positive for validated expenses.
    pub amount: f64,
    /// When the money was spent, in local time.
    #[serde(with = "iso_date")]
    pub date: PrimitiveDateTime,
    /// The category of the expense.
    pub category: Category,
}

/// An expense that has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The unique ID of the expense.
    pub id: ExpenseId,
    /// What the money was spent on, e.g. "Coffee".
    pub title: String,
    /// How much was spent.
    pub amount: f64,
    /// When the money was spent, in local time.
    #[serde(with = "iso_date")]
    pub date: PrimitiveDateTime,
    /// The category of the expense.
    pub category: Category,
    /// When the expense was last written to the store.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Expense {
    /// Start building a new, validated expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(
        title: &str,
        amount: f64,
        date: PrimitiveDateTime,
        category: Category,
    ) -> ExpenseBuilder {
        ExpenseBuilder {
            id: None,
            title: title.to_owned(),
            amount,
            date,
            category,
        }
    }
}

impl From<Expense> for NewExpense {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            title: expense.title,
            amount: expense.amount,
            date: expense.date,
            category: expense.category,
        }
    }
}

/// A builder for creating validated [NewExpense] instances.
///
/// # Examples
///
/// ```
/// use expense_tracker::{Category, Expense, ExpenseId};
/// use time::{OffsetDateTime, macros::datetime};
///
/// let expense = Expense::build(" Coffee ", 4.5, datetime!(2024-05-01 8:00), Category::Food)
///     .id(ExpenseId::new("1"))
///     .finalise(OffsetDateTime::now_utc())
///     .unwrap();
///
/// assert_eq!(expense.title, "Coffee");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseBuilder {
    /// The ID to use. Defaults to one derived from the time the expense is finalised.
    pub id: Option<ExpenseId>,
    /// The title, trimmed when finalised. Must not be empty after trimming.
    pub title: String,
    /// The amount. Must be a finite number greater than zero.
    pub amount: f64,
    /// When the money was spent.
    pub date: PrimitiveDateTime,
    /// The category of the expense.
    pub category: Category,
}

impl ExpenseBuilder {
    /// Set the ID of the expense.
    pub fn id(mut self, id: ExpenseId) -> Self {
        self.id = Some(id);
        self
    }

    /// Validate the fields and create the expense.
    ///
    /// If no ID was set, one is derived from `now` with [ExpenseId::from_timestamp].
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyTitle] if the title is empty or only whitespace,
    /// - or [Error::InvalidAmount] if the amount is not a finite number greater than zero.
    pub fn finalise(self, now: OffsetDateTime) -> Result<NewExpense, Error> {
        let title = self.title.trim();

        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        Ok(NewExpense {
            id: self.id.unwrap_or_else(|| ExpenseId::from_timestamp(now)),
            title: title.to_owned(),
            amount: self.amount,
            date: self.date,
            category: self.category,
        })
    }
}
