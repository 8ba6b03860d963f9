use thiserror::Error;

use crate::repository::RepositoryError;

/// Errors the scoring and geometry core can report. Everything else
/// (empty results, provider outages) is a normal outcome.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CoreError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("coordinate outside the supported region: {0}")]
    OutOfRegion(String),
    #[error("parking lot {0} not found")]
    LotNotFound(String),
    #[error("lot status repository error: {0}")]
    Repository(#[from] RepositoryError),
}
