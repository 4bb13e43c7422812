//! Manager error taxonomy.

use thiserror::Error;

use crate::connector::ConnectorError;
use crate::store::StoreError;

/// Errors returned by the job and resource managers.
#[derive(Debug, Error)]
pub enum CloudError {
    /// Resource or job absent, foreign to the tenant, or soft-deleted.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request, or one referencing a nonexistent related entity.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No provider account or location can host the resource.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// No connector is registered for the resolved provider type.
    #[error("no connector registered for provider type '{0}'")]
    ConnectorUnavailable(String),

    /// The connector call failed, or the provider job ended failed or cancelled.
    #[error("provider operation failed: {0}")]
    ProviderOperationFailed(String),

    /// Duplicate name within the tenant scope.
    #[error("conflict: {0}")]
    ResourceConflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ConnectorError> for CloudError {
    fn from(e: ConnectorError) -> Self {
        CloudError::ProviderOperationFailed(e.to_string())
    }
}

/// Result type for manager operations.
pub type Result<T> = std::result::Result<T, CloudError>;
