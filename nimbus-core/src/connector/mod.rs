//! Provider connector contract.
//!
//! A connector speaks to one provider type. Every mutating call returns a
//! [`ProviderJob`]; managers classify it into a [`Submission`] and never
//! inspect the raw state again.

mod mock;

pub use mock::{MockBehavior, MockConnector, MockOperation};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{CloudError, Result};
use crate::model::{VolumeCreate, VolumeImageCreate, VolumeImageState, VolumeState, timestamp};

/// Provider-side job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderJobState {
    Running,
    Success,
    Failed,
    Cancelled,
}

/// Provider's answer to a submitted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderJob {
    pub provider_job_id: String,
    pub state: ProviderJobState,
    /// Provider-assigned id of the resource the job acts on.
    pub target_provider_id: String,
    pub status_message: Option<String>,
    pub time_of_status_change: String,
}

impl ProviderJob {
    pub fn new(
        provider_job_id: impl Into<String>,
        target_provider_id: impl Into<String>,
        state: ProviderJobState,
    ) -> Self {
        Self {
            provider_job_id: provider_job_id.into(),
            state,
            target_provider_id: target_provider_id.into(),
            status_message: None,
            time_of_status_change: timestamp(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }
}

/// Outcome of a connector call that the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Finished within the call.
    Immediate(ProviderJob),
    /// Still running; completion arrives out of band.
    Pending(ProviderJob),
}

impl Submission {
    /// Classify a provider job. Failed and cancelled jobs become
    /// `ProviderOperationFailed` carrying the provider's message.
    pub fn classify(job: ProviderJob) -> Result<Self> {
        match job.state {
            ProviderJobState::Success => Ok(Submission::Immediate(job)),
            ProviderJobState::Running => Ok(Submission::Pending(job)),
            ProviderJobState::Failed | ProviderJobState::Cancelled => {
                let message = job.status_message.unwrap_or_else(|| {
                    format!(
                        "provider job {} ended {:?}",
                        job.provider_job_id, job.state
                    )
                });
                Err(CloudError::ProviderOperationFailed(message))
            }
        }
    }

    pub fn provider_job(&self) -> &ProviderJob {
        match self {
            Submission::Immediate(job) | Submission::Pending(job) => job,
        }
    }
}

/// Errors raised by connector calls.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("provider resource not found: {0}")]
    NotFound(String),

    #[error("provider rejected request: {0}")]
    Rejected(String),

    #[error("provider unreachable: {0}")]
    Unreachable(String),
}

pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;

#[async_trait]
pub trait VolumeConnector: Send + Sync {
    async fn create_volume(&self, create: &VolumeCreate) -> ConnectorResult<ProviderJob>;

    async fn delete_volume(&self, provider_id: &str) -> ConnectorResult<ProviderJob>;

    /// Authoritative state of a provider volume.
    async fn volume_state(&self, provider_id: &str) -> ConnectorResult<VolumeState>;
}

#[async_trait]
pub trait VolumeImageConnector: Send + Sync {
    async fn create_volume_image(&self, create: &VolumeImageCreate)
    -> ConnectorResult<ProviderJob>;

    /// Snapshot an existing provider volume into a new image.
    async fn create_volume_snapshot(
        &self,
        volume_provider_id: &str,
        create: &VolumeImageCreate,
    ) -> ConnectorResult<ProviderJob>;

    async fn delete_volume_image(&self, provider_id: &str) -> ConnectorResult<ProviderJob>;

    async fn volume_image_state(&self, provider_id: &str) -> ConnectorResult<VolumeImageState>;
}

/// Read back a provider job by id.
#[async_trait]
pub trait ProviderJobTracker: Send + Sync {
    async fn job_status(&self, provider_job_id: &str) -> ConnectorResult<ProviderJob>;
}

/// Everything a provider type implements.
pub trait CloudConnector: VolumeConnector + VolumeImageConnector + ProviderJobTracker {
    fn provider_type(&self) -> &str;
}

/// Maps a provider type to its connector.
pub trait ConnectorResolver: Send + Sync {
    /// `ConnectorUnavailable` when nothing is registered for `provider_type`.
    fn resolve(&self, provider_type: &str) -> Result<Arc<dyn CloudConnector>>;
}

/// Connectors registered at startup, keyed by provider type.
#[derive(Default, Clone)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn CloudConnector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector, replacing any previous one for its provider type.
    pub fn register(&mut self, connector: Arc<dyn CloudConnector>) {
        self.connectors
            .insert(connector.provider_type().to_string(), connector);
    }

    pub fn with(mut self, connector: Arc<dyn CloudConnector>) -> Self {
        self.register(connector);
        self
    }

    pub fn provider_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl ConnectorResolver for ConnectorRegistry {
    fn resolve(&self, provider_type: &str) -> Result<Arc<dyn CloudConnector>> {
        self.connectors
            .get(provider_type)
            .cloned()
            .ok_or_else(|| CloudError::ConnectorUnavailable(provider_type.to_string()))
    }
}
