//! DataStore trait definitions.
//!
//! Managers receive an `Arc<dyn DataStore>` and never reach for a global
//! handle. Every method is one atomic write or read against the engine.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::model::{
    Job, Volume, VolumeConfiguration, VolumeImage, VolumeTemplate, VolumeVolumeImage,
};

use super::error::Result;
use super::event::Event;

/// Store trait for job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &Job) -> Result<()>;

    async fn get_job(&self, id: &str) -> Result<Option<Job>>;

    /// Find a job by the provider job id it tracks.
    async fn get_job_by_provider_id(&self, provider_job_id: &str) -> Result<Option<Job>>;

    /// List jobs, optionally restricted to one tenant, oldest first.
    async fn list_jobs(&self, tenant_id: Option<&str>) -> Result<Vec<Job>>;

    /// Replace a stored job. Fails with `NotFound` if it does not exist.
    async fn update_job(&self, job: &Job) -> Result<()>;

    async fn delete_job(&self, id: &str) -> Result<bool>;
}

/// Store trait for volumes.
#[async_trait]
pub trait VolumeStore: Send + Sync {
    async fn insert_volume(&self, volume: &Volume) -> Result<()>;

    async fn get_volume(&self, id: &str) -> Result<Option<Volume>>;

    /// Find the live volume carrying a provider-assigned id.
    ///
    /// When `account_id` is given only that account is searched. A
    /// non-deleted record wins over deleted ones, newest first.
    async fn get_volume_by_provider_id(
        &self,
        account_id: Option<&str>,
        provider_id: &str,
    ) -> Result<Option<Volume>>;

    /// List a tenant's volumes, including deleted ones.
    async fn list_volumes(&self, tenant_id: &str) -> Result<Vec<Volume>>;

    async fn update_volume(&self, volume: &Volume) -> Result<()>;

    async fn delete_volume(&self, id: &str) -> Result<bool>;
}

/// Store trait for volume images and the snapshot links pointing at them.
#[async_trait]
pub trait VolumeImageStore: Send + Sync {
    async fn insert_volume_image(&self, image: &VolumeImage) -> Result<()>;

    async fn get_volume_image(&self, id: &str) -> Result<Option<VolumeImage>>;

    /// Same lookup rules as [`VolumeStore::get_volume_by_provider_id`].
    async fn get_volume_image_by_provider_id(
        &self,
        account_id: Option<&str>,
        provider_id: &str,
    ) -> Result<Option<VolumeImage>>;

    async fn list_volume_images(&self, tenant_id: &str) -> Result<Vec<VolumeImage>>;

    async fn update_volume_image(&self, image: &VolumeImage) -> Result<()>;

    async fn delete_volume_image(&self, id: &str) -> Result<bool>;

    async fn get_snapshot_link(&self, id: &str) -> Result<Option<VolumeVolumeImage>>;

    /// The link whose image is `volume_image_id`, if any.
    async fn get_snapshot_link_by_image(
        &self,
        volume_image_id: &str,
    ) -> Result<Option<VolumeVolumeImage>>;

    /// A volume's image collection, oldest first.
    async fn list_snapshot_links(&self, volume_id: &str) -> Result<Vec<VolumeVolumeImage>>;

    async fn update_snapshot_link(&self, link: &VolumeVolumeImage) -> Result<()>;

    async fn delete_snapshot_link(&self, id: &str) -> Result<bool>;
}

/// Resource half of a write committed together with the job recording it.
#[derive(Debug, Clone, Copy)]
pub enum ResourceWrite<'a> {
    InsertVolume(&'a Volume),
    UpdateVolume(&'a Volume),
    InsertVolumeImage(&'a VolumeImage),
    UpdateVolumeImage(&'a VolumeImage),
    /// A snapshot image and the link adding it to its volume.
    InsertSnapshot(&'a VolumeImage, &'a VolumeVolumeImage),
    /// Drop a link from a volume's images. The image is kept.
    RemoveSnapshotLink(&'a VolumeVolumeImage),
}

/// Store trait for submissions: a resource change and its job, or neither.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Apply `write` and insert `job` as one atomic write.
    ///
    /// The job's parent is checked inside the same write. A missing parent
    /// fails with `NotFound` and leaves every record untouched, as does any
    /// other failure.
    async fn commit_with_job(&self, write: ResourceWrite<'_>, job: &Job) -> Result<()>;
}

/// Store trait for volume configurations and templates.
///
/// Names are unique per tenant; inserting or renaming onto a taken name
/// fails with `Conflict`.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn insert_volume_configuration(&self, config: &VolumeConfiguration) -> Result<()>;

    async fn get_volume_configuration(&self, id: &str) -> Result<Option<VolumeConfiguration>>;

    async fn get_volume_configuration_by_name(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> Result<Option<VolumeConfiguration>>;

    async fn list_volume_configurations(&self, tenant_id: &str)
    -> Result<Vec<VolumeConfiguration>>;

    async fn update_volume_configuration(&self, config: &VolumeConfiguration) -> Result<()>;

    async fn delete_volume_configuration(&self, id: &str) -> Result<bool>;

    async fn insert_volume_template(&self, template: &VolumeTemplate) -> Result<()>;

    async fn get_volume_template(&self, id: &str) -> Result<Option<VolumeTemplate>>;

    async fn get_volume_template_by_name(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> Result<Option<VolumeTemplate>>;

    async fn list_volume_templates(&self, tenant_id: &str) -> Result<Vec<VolumeTemplate>>;

    async fn update_volume_template(&self, template: &VolumeTemplate) -> Result<()>;

    async fn delete_volume_template(&self, id: &str) -> Result<bool>;
}

/// Composite data store trait combining all domain stores.
pub trait DataStore:
    JobStore + VolumeStore + VolumeImageStore + SubmissionStore + TemplateStore + Send + Sync
{
    /// Subscribe to change events.
    fn subscribe(&self) -> broadcast::Receiver<Event>;
}
