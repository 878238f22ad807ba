//! Field checks run before anything reaches the store.

use chrono::{Datelike, NaiveDate};
use tracker_api::v1::{Priority, Status};

use crate::error::{ErrorKind, TodoError};

pub const NAME_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const REFLECTION_MEMO_MAX_LEN: usize = 2000;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_name(name: &str) -> Result<(), TodoError> {
    if name.is_empty() {
        return Err(TodoError::new(ErrorKind::NameRequired, "name must not be empty"));
    }

    validate_len("name", name, NAME_MAX_LEN)
}

pub fn validate_estimated_time(seconds: i32) -> Result<(), TodoError> {
    if seconds <= 0 {
        return Err(TodoError::validation(format!(
            "estimatedTimeSec must be positive, got {seconds}"
        )));
    }

    Ok(())
}

pub fn validate_actual_time(seconds: i32) -> Result<(), TodoError> {
    if seconds < 0 {
        return Err(TodoError::validation(format!(
            "actualTimeSec must not be negative, got {seconds}"
        )));
    }

    Ok(())
}

/// Length is counted in characters, not bytes.
pub fn validate_len(field: &str, value: &str, max: usize) -> Result<(), TodoError> {
    let len = value.chars().count();
    if len > max {
        return Err(TodoError::validation(format!(
            "{field} must be at most {max} characters, got {len}"
        )));
    }

    Ok(())
}

pub fn validate_priority(value: &str) -> Result<Priority, TodoError> {
    value
        .parse()
        .map_err(|err| TodoError::new(ErrorKind::PriorityInvalid, format!("{err}")))
}

pub fn validate_status(value: &str) -> Result<Status, TodoError> {
    value
        .parse()
        .map_err(|err| TodoError::new(ErrorKind::StatusInvalid, format!("{err}")))
}

/// Parses a `YYYY-MM-DD` date.
///
/// The empty string and the zero date `0001-01-01` mean "no date" and yield
/// `None`. Anything else that isn't a plain calendar date, including a value
/// with a time of day, is rejected.
pub fn parse_due_date(value: &str) -> Result<Option<NaiveDate>, TodoError> {
    if value.is_empty() {
        return Ok(None);
    }

    let invalid = |reason: &dyn std::fmt::Display| {
        TodoError::validation(format!("invalid dueDate {value:?}, expected YYYY-MM-DD: {reason}"))
    };

    // chrono alone accepts one-digit fields, padding and signed years
    if !has_date_shape(value) {
        return Err(invalid(&"wrong shape"));
    }
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|err| invalid(&err))?;

    if (date.year(), date.month(), date.day()) == (1, 1, 1) {
        return Ok(None);
    }

    Ok(Some(date))
}

fn has_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
