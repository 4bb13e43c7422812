//! In-process provider simulation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    CloudConnector, ConnectorError, ConnectorResult, ProviderJob, ProviderJobState,
    ProviderJobTracker, VolumeConnector, VolumeImageConnector,
};
use crate::model::{VolumeCreate, VolumeImageCreate, VolumeImageState, VolumeState, timestamp};

/// Operations whose outcome can be scripted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    CreateVolume,
    DeleteVolume,
    CreateVolumeImage,
    CreateVolumeSnapshot,
    DeleteVolumeImage,
}

impl MockOperation {
    fn is_delete(self) -> bool {
        matches!(self, MockOperation::DeleteVolume | MockOperation::DeleteVolumeImage)
    }

    fn is_volume(self) -> bool {
        matches!(self, MockOperation::CreateVolume | MockOperation::DeleteVolume)
    }
}

/// How a scripted operation answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    /// Finish within the call.
    #[default]
    Immediate,
    /// Return a running job.
    Pending,
    /// Return a failed job.
    Fail,
    /// Return a cancelled job.
    Cancel,
}

struct MockJob {
    job: ProviderJob,
    operation: MockOperation,
    started: Instant,
}

#[derive(Default)]
struct MockState {
    behaviors: HashMap<MockOperation, MockBehavior>,
    jobs: HashMap<String, MockJob>,
    volumes: HashMap<String, VolumeState>,
    images: HashMap<String, VolumeImageState>,
    next_id: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    /// Resource state once `operation` has ended in `state`.
    fn settle(&mut self, operation: MockOperation, target: &str, state: ProviderJobState) {
        let (volume, image) = match (state, operation.is_delete()) {
            (ProviderJobState::Running, _) => return,
            (ProviderJobState::Success, false) => (VolumeState::Available, VolumeImageState::Available),
            (ProviderJobState::Success, true) => (VolumeState::Deleted, VolumeImageState::Deleted),
            _ => (VolumeState::Error, VolumeImageState::Error),
        };
        if operation.is_volume() {
            self.volumes.insert(target.to_string(), volume);
        } else {
            self.images.insert(target.to_string(), image);
        }
    }

    /// Start an operation on `target` and answer per the scripted behavior.
    fn submit(&mut self, operation: MockOperation, target: String) -> ProviderJob {
        let behavior = self.behaviors.get(&operation).copied().unwrap_or_default();
        let provider_job_id = self.next_id("job");

        let job = match behavior {
            MockBehavior::Immediate => {
                ProviderJob::new(&provider_job_id, &target, ProviderJobState::Success)
            }
            MockBehavior::Pending => {
                if operation.is_volume() {
                    let transitional = if operation.is_delete() {
                        VolumeState::Deleting
                    } else {
                        VolumeState::Creating
                    };
                    self.volumes.insert(target.clone(), transitional);
                } else {
                    let transitional = if operation.is_delete() {
                        VolumeImageState::Deleting
                    } else {
                        VolumeImageState::Creating
                    };
                    self.images.insert(target.clone(), transitional);
                }
                ProviderJob::new(&provider_job_id, &target, ProviderJobState::Running)
            }
            MockBehavior::Fail => {
                ProviderJob::new(&provider_job_id, &target, ProviderJobState::Failed)
                    .with_message(format!("simulated failure of {:?}", operation))
            }
            MockBehavior::Cancel => {
                ProviderJob::new(&provider_job_id, &target, ProviderJobState::Cancelled)
                    .with_message(format!("{:?} cancelled by provider", operation))
            }
        };

        // Synchronous failures never touch provider state
        if job.state == ProviderJobState::Success {
            self.settle(operation, &target, job.state);
        }

        debug!(
            provider_job_id = %job.provider_job_id,
            target = %target,
            state = ?job.state,
            "Mock provider accepted {:?}",
            operation
        );

        self.jobs.insert(
            provider_job_id,
            MockJob {
                job: job.clone(),
                operation,
                started: Instant::now(),
            },
        );
        job
    }

    fn finish(&mut self, provider_job_id: &str, state: ProviderJobState) -> bool {
        let Some(entry) = self.jobs.get_mut(provider_job_id) else {
            return false;
        };
        if entry.job.state != ProviderJobState::Running || state == ProviderJobState::Running {
            return false;
        }
        entry.job.state = state;
        entry.job.time_of_status_change = timestamp();
        if state != ProviderJobState::Success {
            entry.job.status_message = Some(format!("simulated {:?}", state).to_lowercase());
        }
        let operation = entry.operation;
        let target = entry.job.target_provider_id.clone();
        self.settle(operation, &target, state);
        true
    }
}

/// Provider connector that keeps all state in memory.
///
/// Operations answer `Immediate` unless scripted otherwise with
/// [`MockConnector::set_behavior`]. Pending jobs stay running until
/// [`MockConnector::complete_job`] is called, or until the configured
/// latency has elapsed, at which point the next status read reports success.
pub struct MockConnector {
    provider_type: String,
    latency: Option<Duration>,
    state: Mutex<MockState>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::with_provider_type("mock")
    }

    pub fn with_provider_type(provider_type: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            latency: None,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Auto-complete pending jobs once `latency` has passed.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn set_behavior(&self, operation: MockOperation, behavior: MockBehavior) {
        self.state.lock().await.behaviors.insert(operation, behavior);
    }

    /// End a running provider job. Returns false if the job is unknown or
    /// no longer running.
    pub async fn complete_job(&self, provider_job_id: &str, state: ProviderJobState) -> bool {
        self.state.lock().await.finish(provider_job_id, state)
    }

    /// Force the reported state of a provider volume.
    pub async fn set_volume_state(&self, provider_id: &str, state: VolumeState) {
        self.state
            .lock()
            .await
            .volumes
            .insert(provider_id.to_string(), state);
    }

    /// Ids of the jobs still running, oldest first.
    pub async fn running_jobs(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut running: Vec<&MockJob> = state
            .jobs
            .values()
            .filter(|j| j.job.state == ProviderJobState::Running)
            .collect();
        running.sort_by_key(|j| j.started);
        running
            .into_iter()
            .map(|j| j.job.provider_job_id.clone())
            .collect()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VolumeConnector for MockConnector {
    async fn create_volume(&self, create: &VolumeCreate) -> ConnectorResult<ProviderJob> {
        if create.config.capacity_kb == 0 {
            return Err(ConnectorError::Rejected("capacity must be positive".into()));
        }
        let mut state = self.state.lock().await;
        let provider_id = state.next_id("vol");
        Ok(state.submit(MockOperation::CreateVolume, provider_id))
    }

    async fn delete_volume(&self, provider_id: &str) -> ConnectorResult<ProviderJob> {
        let mut state = self.state.lock().await;
        if !state.volumes.contains_key(provider_id) {
            return Err(ConnectorError::NotFound(provider_id.to_string()));
        }
        Ok(state.submit(MockOperation::DeleteVolume, provider_id.to_string()))
    }

    async fn volume_state(&self, provider_id: &str) -> ConnectorResult<VolumeState> {
        self.state
            .lock()
            .await
            .volumes
            .get(provider_id)
            .copied()
            .ok_or_else(|| ConnectorError::NotFound(provider_id.to_string()))
    }
}

#[async_trait]
impl VolumeImageConnector for MockConnector {
    async fn create_volume_image(
        &self,
        _create: &VolumeImageCreate,
    ) -> ConnectorResult<ProviderJob> {
        let mut state = self.state.lock().await;
        let provider_id = state.next_id("img");
        Ok(state.submit(MockOperation::CreateVolumeImage, provider_id))
    }

    async fn create_volume_snapshot(
        &self,
        volume_provider_id: &str,
        _create: &VolumeImageCreate,
    ) -> ConnectorResult<ProviderJob> {
        let mut state = self.state.lock().await;
        if !state.volumes.contains_key(volume_provider_id) {
            return Err(ConnectorError::NotFound(volume_provider_id.to_string()));
        }
        let provider_id = state.next_id("snap");
        Ok(state.submit(MockOperation::CreateVolumeSnapshot, provider_id))
    }

    async fn delete_volume_image(&self, provider_id: &str) -> ConnectorResult<ProviderJob> {
        let mut state = self.state.lock().await;
        if !state.images.contains_key(provider_id) {
            return Err(ConnectorError::NotFound(provider_id.to_string()));
        }
        Ok(state.submit(MockOperation::DeleteVolumeImage, provider_id.to_string()))
    }

    async fn volume_image_state(&self, provider_id: &str) -> ConnectorResult<VolumeImageState> {
        self.state
            .lock()
            .await
            .images
            .get(provider_id)
            .copied()
            .ok_or_else(|| ConnectorError::NotFound(provider_id.to_string()))
    }
}

#[async_trait]
impl ProviderJobTracker for MockConnector {
    async fn job_status(&self, provider_job_id: &str) -> ConnectorResult<ProviderJob> {
        let mut state = self.state.lock().await;

        let expired = match (self.latency, state.jobs.get(provider_job_id)) {
            (_, None) => return Err(ConnectorError::NotFound(provider_job_id.to_string())),
            (Some(latency), Some(entry)) => {
                entry.job.state == ProviderJobState::Running && entry.started.elapsed() >= latency
            }
            (None, Some(_)) => false,
        };
        if expired {
            state.finish(provider_job_id, ProviderJobState::Success);
        }

        state
            .jobs
            .get(provider_job_id)
            .map(|entry| entry.job.clone())
            .ok_or_else(|| ConnectorError::NotFound(provider_job_id.to_string()))
    }
}

impl CloudConnector for MockConnector {
    fn provider_type(&self) -> &str {
        &self.provider_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VolumeConfig;

    fn volume_create() -> VolumeCreate {
        VolumeCreate {
            config: VolumeConfig {
                capacity_kb: 1024,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_immediate_create() {
        let connector = MockConnector::new();
        let job = connector.create_volume(&volume_create()).await.unwrap();
        assert_eq!(job.state, ProviderJobState::Success);
        assert_eq!(
            connector.volume_state(&job.target_provider_id).await.unwrap(),
            VolumeState::Available
        );
    }

    #[tokio::test]
    async fn test_pending_then_complete() {
        let connector = MockConnector::new();
        connector
            .set_behavior(MockOperation::CreateVolume, MockBehavior::Pending)
            .await;

        let job = connector.create_volume(&volume_create()).await.unwrap();
        assert_eq!(job.state, ProviderJobState::Running);
        assert_eq!(connector.running_jobs().await, vec![job.provider_job_id.clone()]);

        assert!(
            connector
                .complete_job(&job.provider_job_id, ProviderJobState::Success)
                .await
        );
        // Second completion is refused
        assert!(
            !connector
                .complete_job(&job.provider_job_id, ProviderJobState::Failed)
                .await
        );

        let status = connector.job_status(&job.provider_job_id).await.unwrap();
        assert_eq!(status.state, ProviderJobState::Success);
        assert_eq!(
            connector.volume_state(&job.target_provider_id).await.unwrap(),
            VolumeState::Available
        );
    }

    #[tokio::test]
    async fn test_latency_completes_on_read() {
        let connector = MockConnector::new().with_latency(Duration::from_millis(0));
        connector
            .set_behavior(MockOperation::CreateVolumeImage, MockBehavior::Pending)
            .await;

        let job = connector
            .create_volume_image(&VolumeImageCreate::default())
            .await
            .unwrap();
        let status = connector.job_status(&job.provider_job_id).await.unwrap();
        assert_eq!(status.state, ProviderJobState::Success);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_no_resource() {
        let connector = MockConnector::new();
        connector
            .set_behavior(MockOperation::CreateVolume, MockBehavior::Fail)
            .await;

        let job = connector.create_volume(&volume_create()).await.unwrap();
        assert_eq!(job.state, ProviderJobState::Failed);
        assert!(job.status_message.is_some());
        assert!(connector.volume_state(&job.target_provider_id).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let connector = MockConnector::new();
        assert!(matches!(
            connector.delete_volume("vol-404").await,
            Err(ConnectorError::NotFound(_))
        ));
        assert!(matches!(
            connector.job_status("job-404").await,
            Err(ConnectorError::NotFound(_))
        ));
    }
}
