//! Implements the SQLite backed expense store.

use std::{collections::HashMap, fs, sync::Mutex};

use rusqlite::Connection;

use crate::{
    Category, Error,
    config::{DatabaseLocation, StoreConfig},
    expense::{
        Expense, ExpenseId, NewExpense, create_expense_table, delete_all_expenses,
        delete_expense, get_all_expenses, insert_or_replace_expense, sum_amounts,
        sum_amounts_by_category, update_expense,
    },
};

/// Stores expenses in a SQLite database.
///
/// Create one store at start up and share it (e.g. behind an
/// [Arc](std::sync::Arc)) with everything that reads or writes expenses.
/// The database is opened the first time it is needed, either by an explicit
/// call to [ExpenseStore::initialize] or by any other operation.
///
/// Every operation reports failures as an [Error] instead of panicking.
/// Callers that would rather fall back to an empty list, a zero sum or a
/// `false` flag can use [Degrade](crate::Degrade).
#[derive(Debug)]
pub struct ExpenseStore {
    config: StoreConfig,
    connection: Mutex<Option<Connection>>,
}

impl ExpenseStore {
    /// Create a store for the database described by `config`.
    ///
    /// No files are touched until the store is first used.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
        }
    }

    /// The settings the store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open the database, creating the file and the expense table if needed.
    ///
    /// Calling this on a store that is already open does nothing.
    ///
    /// # Errors
    /// Returns an [Error::StorageInit] if the database cannot be opened or the
    /// table cannot be created. The next operation will try again.
    pub fn initialize(&self) -> Result<(), Error> {
        self.with_connection(|_| Ok(()))
    }

    /// Write `expense`, replacing any stored expense with the same ID.
    ///
    /// The stored expense is stamped with the current local time as its `createdAt`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidTimezone] if the configured timezone is not valid,
    /// - [Error::StorageInit] if the database cannot be opened,
    /// - or [Error::SqlError] if the write fails.
    pub fn insert_or_replace(&self, expense: &NewExpense) -> Result<Expense, Error> {
        let created_at = self.config.local_now()?;

        self.with_connection(|connection| {
            insert_or_replace_expense(expense, created_at, connection)
        })
    }

    /// Retrieve all expenses, most recent date first.
    ///
    /// # Errors
    /// Returns an [Error::StorageInit] if the database cannot be opened, or an
    /// [Error::SqlError] if the query fails.
    pub fn list_all(&self) -> Result<Vec<Expense>, Error> {
        self.with_connection(get_all_expenses)
    }

    /// Delete the expense with `id`. Succeeds if there is no such expense.
    ///
    /// # Errors
    /// Returns an [Error::StorageInit] if the database cannot be opened, or an
    /// [Error::SqlError] if the delete fails.
    pub fn delete_by_id(&self, id: &ExpenseId) -> Result<(), Error> {
        self.with_connection(|connection| delete_expense(id, connection))
    }

    /// Delete every expense.
    ///
    /// # Errors
    /// Returns an [Error::StorageInit] if the database cannot be opened, or an
    /// [Error::SqlError] if the delete fails.
    pub fn delete_all(&self) -> Result<(), Error> {
        self.with_connection(delete_all_expenses)
    }

    /// Overwrite the title, amount, date and category of the stored expense
    /// with the same ID as `expense`.
    ///
    /// Returns the number of expenses changed, zero if no expense has that ID.
    ///
    /// # Errors
    /// Returns an [Error::StorageInit] if the database cannot be opened, or an
    /// [Error::SqlError] if the update fails.
    pub fn update(&self, expense: &NewExpense) -> Result<usize, Error> {
        self.with_connection(|connection| update_expense(expense, connection))
    }

    /// The sum of all expense amounts, zero if there are none.
    ///
    /// # Errors
    /// Returns an [Error::StorageInit] if the database cannot be opened, or an
    /// [Error::SqlError] if the query fails.
    pub fn sum_all(&self) -> Result<f64, Error> {
        self.with_connection(sum_amounts)
    }

    /// The sum of expense amounts for each category with at least one expense.
    ///
    /// # Errors
    /// Returns an [Error::StorageInit] if the database cannot be opened, or an
    /// [Error::SqlError] if the query fails.
    pub fn sum_by_category(&self) -> Result<HashMap<Category, f64>, Error> {
        self.with_connection(sum_amounts_by_category)
    }

    /// Run `operation` with the open connection, opening it first if needed.
    pub(crate) fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let connection = match guard.take() {
            Some(connection) => connection,
            None => open_database(&self.config.database).inspect_err(|error| {
                tracing::error!("could not open expense database: {error}");
            })?,
        };
        let connection = guard.insert(connection);

        operation(connection)
    }
}

fn open_database(location: &DatabaseLocation) -> Result<Connection, Error> {
    let connection = match location {
        DatabaseLocation::File(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|error| {
                    Error::StorageInit(format!("could not create {}: {error}", parent.display()))
                })?;
            }

            let connection = Connection::open(path).map_err(|error| {
                Error::StorageInit(format!("could not open {}: {error}", path.display()))
            })?;
            tracing::debug!("Opened expense database at {}", path.display());

            connection
        }
        DatabaseLocation::InMemory => Connection::open_in_memory()
            .map_err(|error| Error::StorageInit(error.to_string()))?,
    };

    create_expense_table(&connection)
        .map_err(|error| Error::StorageInit(format!("could not create expense table: {error}")))?;

    Ok(connection)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        io,
        sync::{Arc, Mutex},
    };

    use time::macros::datetime;

    use crate::{
        Category, Degrade, Error, ExpenseId, ExpenseStore, NewExpense,
        config::{DatabaseLocation, StoreConfig},
    };

    fn coffee() -> NewExpense {
        NewExpense {
            id: ExpenseId::new("1"),
            title: "Coffee".to_owned(),
            amount: 50.0,
            date: datetime!(2024-05-01 0:00),
            category: Category::Food,
        }
    }

    fn bus() -> NewExpense {
        NewExpense {
            id: ExpenseId::new("2"),
            title: "Bus".to_owned(),
            amount: 20.0,
            date: datetime!(2024-05-02 0:00),
            category: Category::Transport,
        }
    }

    fn broken_store() -> (tempfile::TempDir, ExpenseStore) {
        let dir = tempfile::tempdir().unwrap();
        let not_a_directory = dir.path().join("file");
        std::fs::write(&not_a_directory, "").unwrap();

        let store = ExpenseStore::new(StoreConfig::new(
            DatabaseLocation::File(not_a_directory.join("expenses.db")),
            "Etc/UTC",
        ));

        (dir, store)
    }

    #[test]
    fn operations_initialize_lazily() {
        let store = ExpenseStore::new(StoreConfig::in_memory());

        assert_eq!(store.list_all(), Ok(vec![]));
        assert_eq!(store.sum_all(), Ok(0.0));
    }

    #[test]
    fn initialize_is_idempotent() {
        let store = ExpenseStore::new(StoreConfig::in_memory());
        store.insert_or_replace(&coffee()).unwrap();

        store.initialize().unwrap();
        store.initialize().unwrap();

        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn end_to_end_scenario() {
        let store = ExpenseStore::new(StoreConfig::in_memory());
        store.insert_or_replace(&coffee()).unwrap();
        store.insert_or_replace(&bus()).unwrap();

        let listed: Vec<NewExpense> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(NewExpense::from)
            .collect();

        assert_eq!(store.sum_all(), Ok(70.0));
        assert_eq!(
            store.sum_by_category(),
            Ok(HashMap::from([
                (Category::Food, 50.0),
                (Category::Transport, 20.0)
            ]))
        );
        assert_eq!(listed, vec![bus(), coffee()]);
    }

    #[test]
    fn insert_sets_created_at_to_now() {
        let store = ExpenseStore::new(StoreConfig::in_memory());
        let before = store.config().local_now().unwrap();

        let stored = store.insert_or_replace(&coffee()).unwrap();

        let after = store.config().local_now().unwrap();
        assert!(before <= stored.created_at && stored.created_at <= after);
    }

    #[test]
    fn update_and_delete_through_store() {
        let store = ExpenseStore::new(StoreConfig::in_memory());
        store.insert_or_replace(&coffee()).unwrap();
        let mut changed = coffee();
        changed.title = "Flat white".to_owned();

        assert_eq!(store.update(&changed), Ok(1));
        assert_eq!(store.update(&bus()), Ok(0));
        assert_eq!(store.list_all().unwrap()[0].title, "Flat white");

        store.delete_by_id(&changed.id).unwrap();
        assert_eq!(store.delete_by_id(&changed.id), Ok(()));
        assert_eq!(store.list_all(), Ok(vec![]));
    }

    #[test]
    fn data_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(
            DatabaseLocation::File(dir.path().join("nested").join("expenses.db")),
            "Pacific/Auckland",
        );

        let stored = ExpenseStore::new(config.clone())
            .insert_or_replace(&coffee())
            .unwrap();

        let reopened = ExpenseStore::new(config);
        assert_eq!(reopened.list_all(), Ok(vec![stored]));
    }

    #[test]
    fn unopenable_database_reports_storage_init_failure() {
        let (_dir, store) = broken_store();

        assert!(matches!(store.initialize(), Err(Error::StorageInit(_))));
        assert!(matches!(store.list_all(), Err(Error::StorageInit(_))));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn storage_init_failure_is_logged() {
        let (_dir, store) = broken_store();
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || store.list_all());

        assert!(matches!(result, Err(Error::StorageInit(_))));
        let logs = logs.contents();
        assert!(logs.contains("ERROR"), "got logs: {logs}");
        assert!(logs.contains("could not open expense database"), "got logs: {logs}");
    }

    #[test]
    fn unopenable_database_degrades_to_defaults() {
        let (_dir, store) = broken_store();

        assert!(!store.insert_or_replace(&coffee()).succeeded("insert"));
        assert!(!store.delete_all().succeeded("delete all"));
        assert_eq!(store.list_all().or_logged_default("list"), vec![]);
        assert_eq!(store.sum_all().or_logged_default("sum"), 0.0);
        assert_eq!(
            store.sum_by_category().or_logged_default("sum by category"),
            HashMap::new()
        );
    }

    #[test]
    fn invalid_timezone_fails_insert_without_writing() {
        let store = ExpenseStore::new(StoreConfig::new(DatabaseLocation::InMemory, "Nowhere/Land"));

        assert_eq!(
            store.insert_or_replace(&coffee()),
            Err(Error::InvalidTimezone("Nowhere/Land".to_owned()))
        );
        assert_eq!(store.list_all(), Ok(vec![]));
    }
}
