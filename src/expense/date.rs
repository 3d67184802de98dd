//! The ISO-8601 text form expense dates are stored in.
//!
//! Dates are written with a fixed-width nanosecond fraction so that sorting
//! the text sorts the dates.

use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

const WRITE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]");

const READ_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

const READ_FORMAT_WITHOUT_SUBSECONDS: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Format an expense date as ISO-8601 local date-time text,
/// e.g. `2024-05-01T08:30:00.000000000`.
///
/// # Errors
/// Returns an [Error::InvalidDate] if the date cannot be formatted.
pub fn format_date(date: PrimitiveDateTime) -> Result<String, Error> {
    date.format(WRITE_FORMAT)
        .map_err(|error| Error::InvalidDate(error.to_string()))
}

/// Parse ISO-8601 local date-time text, with or without a fractional second.
///
/// # Errors
/// Returns an [Error::InvalidDate] if `text` is not a local date-time.
pub fn parse_date(text: &str) -> Result<PrimitiveDateTime, Error> {
    PrimitiveDateTime::parse(text, READ_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(text, READ_FORMAT_WITHOUT_SUBSECONDS))
        .map_err(|error| Error::InvalidDate(format!("\"{text}\": {error}")))
}

/// Serde adapter that (de)serializes a [PrimitiveDateTime] in the stored text form.
pub(crate) mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
    use time::PrimitiveDateTime;

    use super::{format_date, parse_date};

    pub fn serialize<S: Serializer>(
        date: &PrimitiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = format_date(*date).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<PrimitiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_date(&text).map_err(D::Error::custom)
    }
}
