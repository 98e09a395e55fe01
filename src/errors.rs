use std::result::Result as StdResult;

use thiserror::Error;

/// Error type shared by the period, reconciliation, and reporting layers.
#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid period kind: {0}")]
    InvalidPeriodKind(String),
    #[error("Custom period required for CUSTOM report type")]
    MissingCustomPeriod,
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

pub type Result<T> = StdResult<T, ExpenseError>;

/// Coarse classification used by request layers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    UpstreamFailure,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidInput => 400,
            ErrorKind::UpstreamFailure => 500,
        }
    }
}

impl ExpenseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExpenseError::NotFound(_) => ErrorKind::NotFound,
            ExpenseError::Conflict(_) => ErrorKind::Conflict,
            ExpenseError::InvalidInput(_)
            | ExpenseError::InvalidPeriodKind(_)
            | ExpenseError::MissingCustomPeriod => ErrorKind::InvalidInput,
            ExpenseError::Upstream(_) => ErrorKind::UpstreamFailure,
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ExpenseError::NotFound(format!("{} {} not found", entity, id))
    }

    /// Arithmetic on stored amounts left the decimal range.
    pub(crate) fn overflow(context: &str) -> Self {
        ExpenseError::InvalidInput(format!("amount overflow while {}", context))
    }
}

impl From<std::io::Error> for ExpenseError {
    fn from(err: std::io::Error) -> Self {
        ExpenseError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for ExpenseError {
    fn from(err: serde_json::Error) -> Self {
        ExpenseError::Upstream(err.to_string())
    }
}
