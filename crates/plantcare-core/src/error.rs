use thiserror::Error;

use crate::schedule::ScheduleError;

/// Errors returned by [`crate::store::PlantStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed required input.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    InvalidDate(#[from] ScheduleError),

    #[error("plant {0} not found")]
    NotFound(i64),

    /// The underlying database failed. Never retried.
    #[error("{0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl StoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidDate(_))
    }
}
