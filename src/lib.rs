//! A personal expense tracker backed by a local SQLite database.
//!
//! This library provides the parts of the app with a correctness contract:
//! - [ExpenseStore] persists expenses and answers aggregate queries,
//! - the functions in [aggregation] derive totals from expenses in memory,
//! - [ExpenseLedger] holds the list shown to the user and keeps it in step
//!   with the store.
//!
//! Everything visual is left to the presentation layer that calls into it.

#![warn(missing_docs)]

pub mod aggregation;
mod category;
mod config;
mod error;
mod expense;
mod ledger;
mod logging;
mod store;

pub use category::{Category, CategoryStyle};
pub use config::{
    DATABASE_FILENAME, DEFAULT_TIMEZONE, DatabaseLocation, StoreConfig, default_database_path,
};
pub use error::{Degrade, Error};
pub use expense::{Expense, ExpenseBuilder, ExpenseId, NewExpense, format_date, parse_date};
pub use ledger::ExpenseLedger;
pub use logging::init_logging;
pub use store::ExpenseStore;
