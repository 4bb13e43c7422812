//! Fixtures for manager tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::cloud::Cloud;
use crate::completion::{ChannelNotifier, CompletionDispatcher};
use crate::connector::{
    CloudConnector, ConnectorRegistry, ConnectorResult, MockConnector, ProviderJob,
    ProviderJobTracker, VolumeConnector, VolumeImageConnector,
};
use crate::manager::ManagerContext;
use crate::model::{VolumeConfig, VolumeCreate, VolumeImageCreate, VolumeImageState, VolumeState};
use crate::placement::{ProviderAccount, StaticPlacement};
use crate::store::{DataStore, MemoryStore};
use crate::volume::VolumeManager;
use crate::volume_image::VolumeImageManager;

pub(crate) struct Harness {
    pub mock: Arc<MockConnector>,
    pub reaper: Arc<JobReaper>,
    pub ctx: ManagerContext,
    pub volumes: VolumeManager,
    pub images: VolumeImageManager,
    pub dispatcher: Arc<CompletionDispatcher>,
    armed: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl Harness {
    /// Accounts: `lab` (mock, zone-a) first, then `cloud` (openstack, no
    /// connector registered).
    pub fn new() -> Self {
        let (notifier, rx) = ChannelNotifier::new();
        Self::build(notifier, rx)
    }

    /// Every `arm` call fails.
    pub fn with_closed_notifier() -> Self {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        let (_, spare) = mpsc::unbounded_channel();
        Self::build(notifier, spare)
    }

    fn build(notifier: ChannelNotifier, rx: mpsc::UnboundedReceiver<String>) -> Self {
        let mock = Arc::new(MockConnector::new());
        let store: Arc<dyn DataStore> = Arc::new(MemoryStore::new());
        let reaper = Arc::new(JobReaper {
            inner: mock.clone(),
            store: store.clone(),
            victim: Mutex::new(None),
        });
        let placement = StaticPlacement::new(vec![
            ProviderAccount::new("lab", "mock", &["zone-a"]),
            ProviderAccount::new("cloud", "openstack", &["eu-1"]),
        ]);
        let connectors = ConnectorRegistry::new().with(reaper.clone());
        let ctx = ManagerContext::new(
            store,
            Arc::new(placement),
            Arc::new(connectors),
            Arc::new(notifier),
        );
        let cloud = Cloud::new(ctx.clone());

        Self {
            mock,
            reaper,
            ctx,
            volumes: cloud.volumes,
            images: cloud.images,
            dispatcher: cloud.dispatcher,
            armed: Mutex::new(rx),
        }
    }

    /// Provider job ids armed since the last call.
    pub async fn armed(&self) -> Vec<String> {
        let mut rx = self.armed.lock().await;
        let mut ids = Vec::new();
        while let Ok(id) = rx.try_recv() {
            ids.push(id);
        }
        ids
    }
}

/// The mock connector, plus the ability to delete a job from the store
/// while a provider submission is in flight.
pub(crate) struct JobReaper {
    inner: Arc<MockConnector>,
    store: Arc<dyn DataStore>,
    victim: Mutex<Option<String>>,
}

impl JobReaper {
    /// Delete `job_id` during the next create, snapshot or delete call.
    pub async fn reap_on_next_submission(&self, job_id: &str) {
        *self.victim.lock().await = Some(job_id.to_string());
    }

    async fn reap(&self) {
        if let Some(id) = self.victim.lock().await.take() {
            assert!(self.store.delete_job(&id).await.unwrap());
        }
    }
}

#[async_trait]
impl VolumeConnector for JobReaper {
    async fn create_volume(&self, create: &VolumeCreate) -> ConnectorResult<ProviderJob> {
        self.reap().await;
        self.inner.create_volume(create).await
    }

    async fn delete_volume(&self, provider_id: &str) -> ConnectorResult<ProviderJob> {
        self.reap().await;
        self.inner.delete_volume(provider_id).await
    }

    async fn volume_state(&self, provider_id: &str) -> ConnectorResult<VolumeState> {
        self.inner.volume_state(provider_id).await
    }
}

#[async_trait]
impl VolumeImageConnector for JobReaper {
    async fn create_volume_image(
        &self,
        create: &VolumeImageCreate,
    ) -> ConnectorResult<ProviderJob> {
        self.reap().await;
        self.inner.create_volume_image(create).await
    }

    async fn create_volume_snapshot(
        &self,
        volume_provider_id: &str,
        create: &VolumeImageCreate,
    ) -> ConnectorResult<ProviderJob> {
        self.reap().await;
        self.inner
            .create_volume_snapshot(volume_provider_id, create)
            .await
    }

    async fn delete_volume_image(&self, provider_id: &str) -> ConnectorResult<ProviderJob> {
        self.reap().await;
        self.inner.delete_volume_image(provider_id).await
    }

    async fn volume_image_state(&self, provider_id: &str) -> ConnectorResult<VolumeImageState> {
        self.inner.volume_image_state(provider_id).await
    }
}

#[async_trait]
impl ProviderJobTracker for JobReaper {
    async fn job_status(&self, provider_job_id: &str) -> ConnectorResult<ProviderJob> {
        self.inner.job_status(provider_job_id).await
    }
}

impl CloudConnector for JobReaper {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }
}

pub(crate) fn volume_create(name: &str) -> VolumeCreate {
    VolumeCreate {
        name: Some(name.to_string()),
        config: VolumeConfig {
            capacity_kb: 1024 * 1024,
            ..Default::default()
        },
        ..Default::default()
    }
}
