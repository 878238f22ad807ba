use std::fmt;

use crate::store::StoreError;

/// Every way a todo operation can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NameRequired,
    ValidationFailed,
    PriorityInvalid,
    StatusInvalid,
    ConstraintViolation,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::NotFound => "todo not found",
            ErrorKind::NameRequired => "name is required",
            ErrorKind::ValidationFailed => "validation failed",
            ErrorKind::PriorityInvalid => "invalid priority value",
            ErrorKind::StatusInvalid => "invalid status value",
            ErrorKind::ConstraintViolation => "constraint violation",
            ErrorKind::Internal => "internal error",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TodoError {
    pub kind: ErrorKind,
    pub message: String,
}

impl TodoError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(id: i32) -> Self {
        Self::new(ErrorKind::NotFound, format!("no todo with id {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<StoreError> for TodoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => TodoError::not_found(id),
            StoreError::Constraint(message) => {
                TodoError::new(ErrorKind::ConstraintViolation, message)
            }
            err => TodoError::new(ErrorKind::Internal, err.to_string()),
        }
    }
}
