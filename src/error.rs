//! Defines the crate level error type and the helpers for degrading failures
//! into benign defaults.

/// The errors that may occur when recording or reading expenses.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The database file could not be opened or created, or the expense table
    /// could not be defined.
    ///
    /// The store stays unopened and the next operation will try to open it
    /// again.
    #[error("could not initialize the expense database: {0}")]
    StorageInit(String),

    /// No application data directory could be found for the current user.
    #[error("could not find an application data directory for the database")]
    DataDirectoryUnavailable,

    /// An empty string (or only whitespace) was used as an expense title.
    #[error("expense title cannot be empty")]
    EmptyTitle,

    /// An amount that is zero, negative, or not a finite number was used for
    /// an expense.
    #[error("{0} is not a valid expense amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// A date could not be converted to or from its stored text form.
    #[error("invalid expense date: {0}")]
    InvalidDate(String),

    /// The configured timezone is not a valid, canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

/// Converts a failed store operation into the benign default the original
/// app fell back on, logging the failure instead of handing it to the caller.
///
/// Use this where a caller must never be interrupted by a storage failure,
/// e.g. a view that would rather show an empty list than an error.
pub trait Degrade<T> {
    /// Return the value, or log the error and return `T::default()`
    /// (an empty list, a zero sum, ...).
    fn or_logged_default(self, operation: &str) -> T
    where
        T: Default;

    /// Return `true` if the operation succeeded, otherwise log the error and
    /// return `false`.
    fn succeeded(self, operation: &str) -> bool;
}

impl<T> Degrade<T> for Result<T, Error> {
    fn or_logged_default(self, operation: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(error) => {
                tracing::error!("{operation} failed, falling back to a default value: {error}");
                T::default()
            }
        }
    }

    fn succeeded(self, operation: &str) -> bool {
        match self {
            Ok(_) => true,
            Err(error) => {
                tracing::error!("{operation} failed: {error}");
                false
            }
        }
    }
}
