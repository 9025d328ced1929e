use thiserror::Error;

/// Failure taxonomy shared by every core operation.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input. Never retried automatically.
    #[error("Validation: {0}")]
    Validation(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// The lot exists but every spot in it is occupied.
    #[error("No available spots in lot {0}")]
    NotAvailable(i32),

    /// An invariant would be violated (duplicate active reservation,
    /// occupied-spot deletion, lost allocation race).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The acting user does not own the resource.
    #[error("Forbidden: {0}")]
    Authorization(String),

    /// Operation on an already-closed reservation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Short stable label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::NotAvailable(_) => "not_available",
            Self::Conflict(_) => "conflict",
            Self::Authorization(_) => "authorization",
            Self::InvalidState(_) => "invalid_state",
            Self::Storage(_) => "storage",
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
