//! Configuration for where the expense database lives and which timezone
//! "local time" refers to.

use std::path::PathBuf;

use directories::ProjectDirs;
use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// The file name of the expense database inside the application data directory.
pub const DATABASE_FILENAME: &str = "expenses.db";

/// The timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

const APPLICATION_NAME: &str = "expense-tracker";

/// Where the SQLite database is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A database file on disk. Missing parent directories are created when
    /// the store is initialized.
    File(PathBuf),
    /// A private, in-memory database that is lost when the store is dropped.
    InMemory,
}

/// Settings for an [ExpenseStore](crate::ExpenseStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Where the database is kept.
    pub database: DatabaseLocation,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Used for the `createdAt` timestamps and for deciding what "this month" is.
    pub local_timezone: String,
}

impl StoreConfig {
    /// Create a config for a database at `database`.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    pub fn new(database: DatabaseLocation, local_timezone: &str) -> Self {
        Self {
            database,
            local_timezone: local_timezone.to_owned(),
        }
    }

    /// Create a config for the database at the fixed application data path.
    ///
    /// # Errors
    /// Returns an [Error::DataDirectoryUnavailable] if the platform has no
    /// data directory for the current user.
    pub fn at_default_location(local_timezone: &str) -> Result<Self, Error> {
        Ok(Self::new(
            DatabaseLocation::File(default_database_path()?),
            local_timezone,
        ))
    }

    /// Create a config for an in-memory database in UTC.
    pub fn in_memory() -> Self {
        Self::new(DatabaseLocation::InMemory, DEFAULT_TIMEZONE)
    }

    /// The UTC offset of the configured timezone right now.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezone] if the timezone name is not recognised.
    pub fn local_offset(&self) -> Result<UtcOffset, Error> {
        get_local_offset(&self.local_timezone)
            .ok_or_else(|| Error::InvalidTimezone(self.local_timezone.clone()))
    }

    /// The current date and time in the configured timezone.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezone] if the timezone name is not recognised.
    pub fn local_now(&self) -> Result<OffsetDateTime, Error> {
        Ok(OffsetDateTime::now_utc().to_offset(self.local_offset()?))
    }
}

/// The fixed path of the expense database in the user's application data directory,
/// e.g. `~/.local/share/expense-tracker/expenses.db` on Linux.
///
/// # Errors
/// Returns an [Error::DataDirectoryUnavailable] if no home directory can be found.
pub fn default_database_path() -> Result<PathBuf, Error> {
    ProjectDirs::from("", "", APPLICATION_NAME)
        .map(|dirs| dirs.data_dir().join(DATABASE_FILENAME))
        .ok_or(Error::DataDirectoryUnavailable)
}

fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}
