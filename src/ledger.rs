//! The in-memory list of expenses shown to the user.
//!
//! Changes are applied to the list straight away and then confirmed against
//! the store. If the store rejects a change, the list is reloaded from the
//! store so that it never shows anything that was not saved.

use std::{collections::HashMap, sync::Arc};

use time::{Date, OffsetDateTime};

use crate::{
    Category, Error, Expense, ExpenseId, ExpenseStore, NewExpense,
    aggregation::{monthly_total, total, totals_by_category},
};

enum Change<'a> {
    Add(&'a NewExpense),
    Delete(&'a ExpenseId),
    Clear,
}

/// A snapshot of the stored expenses, most recent date first, with the
/// figures derived from it.
#[derive(Debug)]
pub struct ExpenseLedger {
    store: Arc<ExpenseStore>,
    expenses: Vec<Expense>,
}

impl ExpenseLedger {
    /// Create a ledger for `store` and load its expenses.
    ///
    /// # Errors
    /// Returns an error if the expenses cannot be read from the store.
    pub fn load(store: Arc<ExpenseStore>) -> Result<Self, Error> {
        let mut ledger = Self::empty(store);
        ledger.reload()?;

        Ok(ledger)
    }

    /// Create a ledger for `store` without reading anything from it.
    pub fn empty(store: Arc<ExpenseStore>) -> Self {
        Self {
            store,
            expenses: Vec::new(),
        }
    }

    /// Replace the snapshot with the expenses currently in the store.
    ///
    /// The snapshot is left unchanged if the store cannot be read.
    ///
    /// # Errors
    /// Returns an error if the expenses cannot be read from the store.
    pub fn reload(&mut self) -> Result<(), Error> {
        self.expenses = self.store.list_all()?;

        Ok(())
    }

    /// Record `expense`, replacing any expense with the same ID.
    ///
    /// # Errors
    /// Returns the store's error if the expense could not be saved, in which
    /// case the snapshot has been reloaded from the store.
    pub fn add(&mut self, expense: NewExpense) -> Result<Expense, Error> {
        let stored = self.apply(Change::Add(&expense), |store| {
            store.insert_or_replace(&expense)
        })?;
        self.replace_tentative(stored.clone());

        Ok(stored)
    }

    /// Delete the expense with `id`.
    ///
    /// # Errors
    /// Returns the store's error if the expense could not be deleted, in which
    /// case the snapshot has been reloaded from the store.
    pub fn delete(&mut self, id: &ExpenseId) -> Result<(), Error> {
        self.apply(Change::Delete(id), |store| store.delete_by_id(id))
    }

    /// Delete every expense.
    ///
    /// # Errors
    /// Returns the store's error if the expenses could not be deleted, in which
    /// case the snapshot has been reloaded from the store.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.apply(Change::Clear, ExpenseStore::delete_all)
    }

    /// The expenses in the snapshot, most recent date first.
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// The sum of all expense amounts in the snapshot.
    pub fn total(&self) -> f64 {
        total(&self.expenses)
    }

    /// The sum of the amounts of expenses in the same month as `reference`.
    pub fn monthly_total(&self, reference: Date) -> f64 {
        monthly_total(&self.expenses, reference)
    }

    /// The sum of the amounts of expenses dated this month in the store's timezone.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezone] if the store's timezone is not valid.
    pub fn current_month_total(&self) -> Result<f64, Error> {
        let today = self.store.config().local_now()?.date();

        Ok(self.monthly_total(today))
    }

    /// The sum of expense amounts in the snapshot for each category.
    pub fn totals_by_category(&self) -> HashMap<Category, f64> {
        totals_by_category(&self.expenses)
    }

    /// Apply `change` to the snapshot, then `confirm` it with the store.
    ///
    /// If the store rejects the change and cannot be read either, the
    /// snapshot is left empty.
    fn apply<T>(
        &mut self,
        change: Change<'_>,
        confirm: impl FnOnce(&ExpenseStore) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.apply_tentatively(change);

        let result = confirm(&*self.store);

        if let Err(error) = &result {
            tracing::warn!("store rejected change, reloading expenses: {error}");

            if let Err(reload_error) = self.reload() {
                tracing::error!("could not reload expenses, clearing snapshot: {reload_error}");
                self.expenses.clear();
            }
        }

        result
    }

    fn apply_tentatively(&mut self, change: Change<'_>) {
        match change {
            Change::Add(expense) => {
                self.expenses.retain(|stored| stored.id != expense.id);

                let tentative = Expense {
                    id: expense.id.clone(),
                    title: expense.title.clone(),
                    amount: expense.amount,
                    date: expense.date,
                    category: expense.category.clone(),
                    created_at: OffsetDateTime::now_utc(),
                };
                let position = self
                    .expenses
                    .iter()
                    .position(|stored| stored.date <= tentative.date)
                    .unwrap_or(self.expenses.len());

                self.expenses.insert(position, tentative);
            }
            Change::Delete(id) => self.expenses.retain(|stored| &stored.id != id),
            Change::Clear => self.expenses.clear(),
        }
    }

    fn replace_tentative(&mut self, stored: Expense) {
        if let Some(tentative) = self
            .expenses
            .iter_mut()
            .find(|expense| expense.id == stored.id)
        {
            *tentative = stored;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use time::{
        PrimitiveDateTime,
        macros::{date, datetime},
    };

    use crate::{
        Category, Error, ExpenseId, ExpenseLedger, ExpenseStore, NewExpense, StoreConfig,
    };

    const BLOCK_WRITES: &str = "
        CREATE TRIGGER block_insert BEFORE INSERT ON expenses
        BEGIN SELECT RAISE(ABORT, 'read only'); END;
        CREATE TRIGGER block_delete BEFORE DELETE ON expenses
        BEGIN SELECT RAISE(ABORT, 'read only'); END;";

    fn new_expense(id: &str, amount: f64, date: PrimitiveDateTime, category: Category) -> NewExpense {
        NewExpense {
            id: ExpenseId::new(id),
            title: format!("Expense {id}"),
            amount,
            date,
            category,
        }
    }

    fn get_test_store() -> Arc<ExpenseStore> {
        Arc::new(ExpenseStore::new(StoreConfig::in_memory()))
    }

    fn block_writes(store: &ExpenseStore) {
        store
            .with_connection(|connection| {
                connection
                    .execute_batch(BLOCK_WRITES)
                    .map_err(Error::SqlError)
            })
            .expect("Could not create triggers");
    }

    fn ids(ledger: &ExpenseLedger) -> Vec<&str> {
        ledger
            .expenses()
            .iter()
            .map(|expense| expense.id.as_ref())
            .collect()
    }

    #[test]
    fn load_reads_existing_expenses() {
        let store = get_test_store();
        store
            .insert_or_replace(&new_expense("1", 5.0, datetime!(2024-05-01 0:00), Category::Food))
            .unwrap();

        let ledger = ExpenseLedger::load(store).unwrap();

        assert_eq!(ids(&ledger), vec!["1"]);
    }

    #[test]
    fn add_keeps_date_order_and_matches_store() {
        let store = get_test_store();
        let mut ledger = ExpenseLedger::load(store.clone()).unwrap();

        ledger
            .add(new_expense("jan", 1.0, datetime!(2024-01-01 0:00), Category::Other))
            .unwrap();
        ledger
            .add(new_expense("mar", 3.0, datetime!(2024-03-01 0:00), Category::Other))
            .unwrap();
        ledger
            .add(new_expense("feb", 2.0, datetime!(2024-02-01 0:00), Category::Other))
            .unwrap();

        assert_eq!(ids(&ledger), vec!["mar", "feb", "jan"]);
        assert_eq!(ledger.expenses(), store.list_all().unwrap().as_slice());
    }

    #[test]
    fn add_returns_stored_expense_and_replaces_same_id() {
        let store = get_test_store();
        let mut ledger = ExpenseLedger::empty(store.clone());
        ledger
            .add(new_expense("1", 5.0, datetime!(2024-05-01 0:00), Category::Food))
            .unwrap();

        let stored = ledger
            .add(new_expense("1", 8.0, datetime!(2024-05-02 0:00), Category::Food))
            .unwrap();

        assert_eq!(ledger.expenses(), &[stored.clone()]);
        assert_eq!(store.list_all().unwrap(), vec![stored]);
    }

    #[test]
    fn delete_removes_from_snapshot_and_store() {
        let store = get_test_store();
        let mut ledger = ExpenseLedger::empty(store.clone());
        ledger
            .add(new_expense("1", 5.0, datetime!(2024-05-01 0:00), Category::Food))
            .unwrap();
        ledger
            .add(new_expense("2", 7.0, datetime!(2024-05-02 0:00), Category::Bills))
            .unwrap();

        ledger.delete(&ExpenseId::new("1")).unwrap();

        assert_eq!(ids(&ledger), vec!["2"]);
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn clear_empties_snapshot_and_store() {
        let store = get_test_store();
        let mut ledger = ExpenseLedger::empty(store.clone());
        ledger
            .add(new_expense("1", 5.0, datetime!(2024-05-01 0:00), Category::Food))
            .unwrap();

        ledger.clear().unwrap();

        assert!(ledger.expenses().is_empty());
        assert_eq!(store.sum_all(), Ok(0.0));
    }

    #[test]
    fn failed_delete_restores_expense_from_store() {
        let store = get_test_store();
        let mut ledger = ExpenseLedger::empty(store.clone());
        ledger
            .add(new_expense("1", 5.0, datetime!(2024-05-01 0:00), Category::Food))
            .unwrap();
        block_writes(&store);

        let result = ledger.delete(&ExpenseId::new("1"));

        assert!(matches!(result, Err(Error::SqlError(_))));
        assert_eq!(ids(&ledger), vec!["1"]);
    }

    #[test]
    fn failed_add_is_discarded() {
        let store = get_test_store();
        let mut ledger = ExpenseLedger::empty(store.clone());
        ledger
            .add(new_expense("1", 5.0, datetime!(2024-05-01 0:00), Category::Food))
            .unwrap();
        block_writes(&store);

        let result = ledger.add(new_expense("2", 9.0, datetime!(2024-05-03 0:00), Category::Food));

        assert!(result.is_err());
        assert_eq!(ids(&ledger), vec!["1"]);
        assert_eq!(ledger.total(), 5.0);
    }

    #[test]
    fn failed_clear_restores_everything() {
        let store = get_test_store();
        let mut ledger = ExpenseLedger::empty(store.clone());
        ledger
            .add(new_expense("1", 5.0, datetime!(2024-05-01 0:00), Category::Food))
            .unwrap();
        ledger
            .add(new_expense("2", 6.0, datetime!(2024-05-02 0:00), Category::Health))
            .unwrap();
        block_writes(&store);

        assert!(ledger.clear().is_err());
        assert_eq!(ids(&ledger), vec!["2", "1"]);
    }

    #[test]
    fn failed_change_with_unreadable_store_empties_snapshot() {
        let store = get_test_store();
        let mut ledger = ExpenseLedger::empty(store.clone());
        ledger
            .add(new_expense("1", 5.0, datetime!(2024-05-01 0:00), Category::Food))
            .unwrap();
        store
            .with_connection(|connection| {
                connection
                    .execute(
                        "INSERT INTO expenses (id, title, amount, date, category, createdAt)
                        VALUES ('2', 'Broken', 1.0, 'not-a-date', 'Food', '2024-05-01T00:00:00Z')",
                        (),
                    )
                    .map_err(Error::SqlError)
            })
            .unwrap();
        block_writes(&store);

        let result = ledger.delete(&ExpenseId::new("1"));

        assert!(matches!(result, Err(Error::SqlError(_))));
        assert!(store.list_all().is_err());
        assert!(ledger.expenses().is_empty());
        assert_eq!(ledger.total(), 0.0);
    }

    #[test]
    fn derived_figures_follow_snapshot() {
        let store = get_test_store();
        let mut ledger = ExpenseLedger::empty(store);
        ledger
            .add(new_expense("1", 50.0, datetime!(2024-05-01 0:00), Category::Food))
            .unwrap();
        ledger
            .add(new_expense("2", 20.0, datetime!(2024-05-02 0:00), Category::Transport))
            .unwrap();
        ledger
            .add(new_expense("3", 10.0, datetime!(2024-04-30 0:00), Category::Food))
            .unwrap();

        assert_eq!(ledger.total(), 80.0);
        assert_eq!(ledger.monthly_total(date!(2024 - 05 - 15)), 70.0);
        assert_eq!(
            ledger.totals_by_category(),
            HashMap::from([(Category::Food, 60.0), (Category::Transport, 20.0)])
        );
    }

    #[test]
    fn current_month_total_counts_expenses_dated_now() {
        let store = get_test_store();
        let now = store.config().local_now().unwrap();
        let mut ledger = ExpenseLedger::empty(store);
        ledger
            .add(new_expense(
                "now",
                12.0,
                PrimitiveDateTime::new(now.date(), now.time()),
                Category::Other,
            ))
            .unwrap();

        assert_eq!(ledger.current_month_total(), Ok(12.0));
    }
}
