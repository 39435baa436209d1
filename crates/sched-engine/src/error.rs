use sched_core::RuleError;
use sched_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Repeat rule or date rejected by the evaluator.
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("{0}")]
    Validation(String),

    #[error("task not found: {0}")]
    NotFound(String),

    /// Persisted data the service cannot work with.
    #[error("invalid task state: {0}")]
    InvalidState(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Store(other),
        }
    }
}

impl ServiceError {
    /// Whether the caller sent something we reject, as opposed to a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Rule(_) | Self::Validation(_) | Self::NotFound(_) | Self::Conflict(_)
        )
    }
}
