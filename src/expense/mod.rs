//! Expense records and the database queries that store them.

mod date;
mod db;
mod domain;

pub use date::{format_date, parse_date};
pub use domain::{Expense, ExpenseBuilder, ExpenseId, NewExpense};

pub(crate) use db::{
    create_expense_table, delete_all_expenses, delete_expense, get_all_expenses,
    insert_or_replace_expense, sum_amounts, sum_amounts_by_category, update_expense,
};
