use rankinai_core::Platform;
use rankinai_db::DbError;
use thiserror::Error;

/// Failures from the persistence seam.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    /// The store did not answer within the configured bound.
    #[error("store operation timed out")]
    Timeout,
    /// Failure from a non-Postgres backend.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Typed failures of the caller-facing scan operations.
///
/// A reply that does not mention the product is not an error; it is a
/// completed scan with `is_cited = false`.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Raised before any external call; nothing was debited.
    #[error("insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i32, available: i32 },

    /// The assistant failed, timed out or is not configured. Any reserved
    /// credit has been refunded.
    #[error("{platform} is unavailable: {reason}")]
    ProviderUnavailable { platform: Platform, reason: String },

    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("shop {0} not found")]
    ShopNotFound(i64),

    /// A store read or write failed. Any reserved credit has been refunded.
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[source] StoreError),

    #[error("optimization {0} not found")]
    OptimizationNotFound(i64),

    #[error("optimization {0} was already applied")]
    OptimizationAlreadyApplied(i64),
}

impl ScanError {
    /// Stable machine-readable code for API envelopes.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::InsufficientCredits { .. } => "insufficient_credits",
            ScanError::ProviderUnavailable { .. } => "provider_unavailable",
            ScanError::ProductNotFound(_)
            | ScanError::ShopNotFound(_)
            | ScanError::OptimizationNotFound(_) => "not_found",
            ScanError::OptimizationAlreadyApplied(_) => "conflict",
            ScanError::PersistenceFailure(_) => "internal_error",
        }
    }
}

impl From<StoreError> for ScanError {
    fn from(err: StoreError) -> Self {
        ScanError::PersistenceFailure(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_group_not_found_variants() {
        assert_eq!(ScanError::ProductNotFound(1).code(), "not_found");
        assert_eq!(ScanError::ShopNotFound(1).code(), "not_found");
        assert_eq!(ScanError::OptimizationNotFound(1).code(), "not_found");
    }

    #[test]
    fn store_errors_become_persistence_failures() {
        let err = ScanError::from(StoreError::Timeout);
        assert!(matches!(err, ScanError::PersistenceFailure(StoreError::Timeout)));
        assert_eq!(err.code(), "internal_error");
    }

    #[test]
    fn insufficient_credits_message_names_both_amounts() {
        let err = ScanError::InsufficientCredits {
            required: 1,
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "insufficient credits: 1 required, 0 available"
        );
    }
}
