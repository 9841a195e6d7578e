// File: ./src/error.rs
use thiserror::Error;

/// Errors surfaced by the pack pipeline boundary.
///
/// Missing planning data is never an error: extractors resolve it to empty
/// structures. Delivery problems are reported in a `DeliveryReport` instead.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid date '{0}': expected an existing date in YYYY-MM-DD format")]
    InvalidDate(String),

    #[error("day count {days} is out of range (1..={max})")]
    InvalidDayCount { days: u32, max: u32 },

    #[error("unknown emergency scenario '{0}'")]
    UnknownScenario(String),

    #[error("planning store error: {0:#}")]
    Store(anyhow::Error),

    #[error("failed to render document: {0}")]
    Render(String),
}

impl PackError {
    /// True for request validation failures (the caller sent bad input).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PackError::InvalidDate(_)
                | PackError::InvalidDayCount { .. }
                | PackError::UnknownScenario(_)
        )
    }
}

pub type PackResult<T> = Result<T, PackError>;
