//! Volume images, snapshots of volumes, and the links between them.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::completion::{CompletionOutcome, JobReconciler};
use crate::connector::{CloudConnector, ProviderJobState, Submission};
use crate::error::{CloudError, Result};
use crate::manager::{ManagerContext, finish_job, provider_verdict};
use crate::model::{
    AttributeUpdate, Job, JobAction, JobBuilder, JobState, Placement, ResourceKind, ResourceRef,
    SnapshotState, VolumeImage, VolumeImageCreate, VolumeImageState, VolumeState,
    VolumeVolumeImage, timestamp,
};
use crate::store::ResourceWrite;

#[derive(Clone)]
pub struct VolumeImageManager {
    ctx: ManagerContext,
}

impl VolumeImageManager {
    pub fn new(ctx: ManagerContext) -> Self {
        Self { ctx }
    }

    /// Build the image record for an accepted submission.
    async fn image_for(
        &self,
        connector: &dyn CloudConnector,
        submission: &Submission,
        tenant_id: &str,
        create: &VolumeImageCreate,
        placement: Placement,
    ) -> Result<VolumeImage> {
        let provider_id = submission.provider_job().target_provider_id.clone();
        let image = match submission {
            Submission::Immediate(_) => {
                let state = connector.volume_image_state(&provider_id).await?;
                let mut image =
                    VolumeImage::new(tenant_id.to_string(), create, placement, provider_id, state);
                image.created = Some(timestamp());
                image
            }
            Submission::Pending(_) => VolumeImage::new(
                tenant_id.to_string(),
                create,
                placement,
                provider_id,
                VolumeImageState::Creating,
            ),
        };
        Ok(image)
    }

    /// Create an image from `image_location`, placed like any new resource.
    pub async fn create_volume_image(
        &self,
        tenant_id: &str,
        create: VolumeImageCreate,
        parent_job_id: Option<&str>,
    ) -> Result<Job> {
        self.ctx.check_parent(parent_job_id).await?;

        let placement = self.ctx.placement.place(tenant_id, &create.properties).await?;
        let connector = self.ctx.connector(&placement.provider_type)?;

        let submission = Submission::classify(connector.create_volume_image(&create).await?)?;
        let image = self
            .image_for(connector.as_ref(), &submission, tenant_id, &create, placement)
            .await?;

        let builder = JobBuilder::new(ResourceRef::volume_image(&image), JobAction::Create)
            .tenant(tenant_id)
            .description(format!("create volume image {}", image.id))
            .affected(vec![ResourceRef::volume_image(&image)])
            .parent(parent_job_id.map(String::from));
        let job = self
            .ctx
            .record_submission(
                ResourceWrite::InsertVolumeImage(&image),
                builder,
                submission.provider_job(),
            )
            .await?;

        info!(
            image_id = %image.id,
            state = image.state.as_str(),
            "Submitted volume image create"
        );
        Ok(job)
    }

    /// Snapshot a volume into a new image linked into the volume's images.
    ///
    /// The image lives where the volume lives; placement is not consulted.
    pub async fn create_volume_snapshot(
        &self,
        tenant_id: &str,
        volume_id: &str,
        create: VolumeImageCreate,
        parent_job_id: Option<&str>,
    ) -> Result<Job> {
        let volume = self
            .ctx
            .store
            .get_volume(volume_id)
            .await?
            .filter(|v| v.tenant_id == tenant_id && v.state != VolumeState::Deleted)
            .ok_or_else(|| CloudError::NotFound(format!("volume {}", volume_id)))?;
        if volume.state != VolumeState::Available {
            return Err(CloudError::InvalidRequest(format!(
                "volume {} is {}, not available",
                volume_id,
                volume.state.as_str()
            )));
        }
        let volume_provider_id = volume.provider_assigned_id.clone().ok_or_else(|| {
            CloudError::InvalidRequest(format!("volume {} has no provider id", volume_id))
        })?;
        self.ctx.check_parent(parent_job_id).await?;

        let placement = volume.placement.clone();
        let connector = self.ctx.connector(&placement.provider_type)?;

        let submission = Submission::classify(
            connector
                .create_volume_snapshot(&volume_provider_id, &create)
                .await?,
        )?;
        let image = self
            .image_for(connector.as_ref(), &submission, tenant_id, &create, placement)
            .await?;

        let mut link = VolumeVolumeImage::snapshotting(volume.id.clone(), image.id.clone());
        if let Submission::Immediate(_) = submission {
            link.state = SnapshotState::Available;
            link.created = Some(timestamp());
        }

        let builder = JobBuilder::new(ResourceRef::volume_image(&image), JobAction::Create)
            .tenant(tenant_id)
            .description(format!("snapshot volume {}", volume.id))
            .affected(vec![
                ResourceRef::volume_image(&image),
                ResourceRef::volume(&volume),
            ])
            .parent(parent_job_id.map(String::from));
        let job = self
            .ctx
            .record_submission(
                ResourceWrite::InsertSnapshot(&image, &link),
                builder,
                submission.provider_job(),
            )
            .await?;

        info!(
            volume_id = %volume.id,
            image_id = %image.id,
            link_state = link.state.as_str(),
            "Submitted volume snapshot"
        );
        Ok(job)
    }

    /// A live image owned by the tenant.
    pub async fn get_volume_image(&self, tenant_id: &str, id: &str) -> Result<VolumeImage> {
        self.ctx
            .store
            .get_volume_image(id)
            .await?
            .filter(|i| i.tenant_id == tenant_id && i.state != VolumeImageState::Deleted)
            .ok_or_else(|| CloudError::NotFound(format!("volume image {}", id)))
    }

    pub async fn list_volume_images(&self, tenant_id: &str) -> Result<Vec<VolumeImage>> {
        let images = self.ctx.store.list_volume_images(tenant_id).await?;
        Ok(images
            .into_iter()
            .filter(|i| i.state != VolumeImageState::Deleted)
            .collect())
    }

    pub async fn update_volume_image_attributes(
        &self,
        tenant_id: &str,
        id: &str,
        update: AttributeUpdate,
    ) -> Result<Job> {
        let mut image = self.get_volume_image(tenant_id, id).await?;
        if update.apply(&mut image.name, &mut image.description, &mut image.properties) {
            image.updated = Some(timestamp());
        }

        self.ctx
            .jobs
            .create_with(
                ResourceWrite::UpdateVolumeImage(&image),
                JobBuilder::new(ResourceRef::volume_image(&image), JobAction::Update)
                    .tenant(tenant_id)
                    .description(format!("update volume image {}", image.id))
                    .state(JobState::Success),
            )
            .await
    }

    pub async fn delete_volume_image(
        &self,
        tenant_id: &str,
        id: &str,
        parent_job_id: Option<&str>,
    ) -> Result<Job> {
        let mut image = self.get_volume_image(tenant_id, id).await?;
        self.ctx.check_parent(parent_job_id).await?;

        let provider_id = image.provider_assigned_id.clone().ok_or_else(|| {
            CloudError::InvalidRequest(format!("volume image {} has no provider id", id))
        })?;
        let connector = self.ctx.connector(&image.placement.provider_type)?;

        let submission =
            Submission::classify(connector.delete_volume_image(&provider_id).await?)?;
        image.state = match submission {
            Submission::Immediate(_) => VolumeImageState::Deleted,
            Submission::Pending(_) => VolumeImageState::Deleting,
        };
        image.updated = Some(timestamp());

        // Snapshot links pointing at the image stay in the volume's images
        let builder = JobBuilder::new(ResourceRef::volume_image(&image), JobAction::Delete)
            .tenant(tenant_id)
            .description(format!("delete volume image {}", image.id))
            .parent(parent_job_id.map(String::from));
        let job = self
            .ctx
            .record_submission(
                ResourceWrite::UpdateVolumeImage(&image),
                builder,
                submission.provider_job(),
            )
            .await?;

        info!(
            image_id = %image.id,
            state = image.state.as_str(),
            "Submitted volume image delete"
        );
        Ok(job)
    }

    // === Snapshot links ===

    async fn owned_volume(&self, tenant_id: &str, volume_id: &str) -> Result<()> {
        self.ctx
            .store
            .get_volume(volume_id)
            .await?
            .filter(|v| v.tenant_id == tenant_id && v.state != VolumeState::Deleted)
            .map(|_| ())
            .ok_or_else(|| CloudError::NotFound(format!("volume {}", volume_id)))
    }

    /// The images collection of a volume.
    pub async fn list_snapshot_links(
        &self,
        tenant_id: &str,
        volume_id: &str,
    ) -> Result<Vec<VolumeVolumeImage>> {
        self.owned_volume(tenant_id, volume_id).await?;
        Ok(self.ctx.store.list_snapshot_links(volume_id).await?)
    }

    /// One entry of a volume's images collection.
    pub async fn get_snapshot_link(
        &self,
        tenant_id: &str,
        volume_id: &str,
        link_id: &str,
    ) -> Result<VolumeVolumeImage> {
        self.owned_volume(tenant_id, volume_id).await?;
        self.ctx
            .store
            .get_snapshot_link(link_id)
            .await?
            .filter(|l| l.volume_id == volume_id)
            .ok_or_else(|| {
                CloudError::NotFound(format!("image {} of volume {}", link_id, volume_id))
            })
    }

    pub async fn update_snapshot_link(
        &self,
        tenant_id: &str,
        volume_id: &str,
        link_id: &str,
        update: AttributeUpdate,
    ) -> Result<VolumeVolumeImage> {
        let mut link = self.get_snapshot_link(tenant_id, volume_id, link_id).await?;
        if update.apply(&mut link.name, &mut link.description, &mut link.properties) {
            link.updated = Some(timestamp());
            self.ctx.store.update_snapshot_link(&link).await?;
        }
        Ok(link)
    }

    /// Remove an entry from a volume's images. The image itself survives.
    pub async fn remove_snapshot_link(
        &self,
        tenant_id: &str,
        volume_id: &str,
        link_id: &str,
    ) -> Result<Job> {
        let link = self.get_snapshot_link(tenant_id, volume_id, link_id).await?;

        let target = match self.ctx.store.get_volume_image(&link.volume_image_id).await? {
            Some(image) => ResourceRef::volume_image(&image),
            None => ResourceRef {
                kind: ResourceKind::VolumeImage,
                id: link.volume_image_id.clone(),
                provider_assigned_id: None,
                account_id: None,
            },
        };
        let job = self
            .ctx
            .jobs
            .create_with(
                ResourceWrite::RemoveSnapshotLink(&link),
                JobBuilder::new(target, JobAction::Delete)
                    .tenant(tenant_id)
                    .description(format!("remove image link {} from volume {}", link.id, volume_id))
                    .state(JobState::Success),
            )
            .await?;

        info!(link_id = %link.id, volume_id = %volume_id, "Removed image from volume");
        Ok(job)
    }
}

#[async_trait]
impl JobReconciler for VolumeImageManager {
    fn kind(&self) -> ResourceKind {
        ResourceKind::VolumeImage
    }

    async fn reconcile(&self, job: Job) -> Result<CompletionOutcome> {
        let target = &job.target_resource;
        let Some(provider_id) = target.provider_assigned_id.as_deref() else {
            warn!(job_id = %job.id, "Job target has no provider id");
            return Ok(CompletionOutcome::NotApplied);
        };
        let Some(mut image) = self
            .ctx
            .store
            .get_volume_image_by_provider_id(target.account_id.as_deref(), provider_id)
            .await?
        else {
            warn!(job_id = %job.id, provider_id = %provider_id, "No volume image for completed job");
            return Ok(CompletionOutcome::NotApplied);
        };

        if job.action == JobAction::Update {
            warn!(job_id = %job.id, "Update jobs complete locally");
            return Ok(CompletionOutcome::NotApplied);
        }

        let connector = self.ctx.connector(&image.placement.provider_type)?;
        let Some(verdict) = provider_verdict(connector.as_ref(), &job).await? else {
            return Ok(CompletionOutcome::Pending);
        };

        let (next, link_state) = match (job.action, verdict.state) {
            (JobAction::Create, ProviderJobState::Success) => {
                let state = connector.volume_image_state(provider_id).await?;
                if image.created.is_none() {
                    image.created = Some(timestamp());
                }
                (state, Some(SnapshotState::Available))
            }
            (JobAction::Create, _) => (VolumeImageState::Error, Some(SnapshotState::Error)),
            (_, ProviderJobState::Success) => (VolumeImageState::Deleted, None),
            _ => (VolumeImageState::Error, None),
        };

        if image.state != next {
            info!(
                image_id = %image.id,
                from = image.state.as_str(),
                to = next.as_str(),
                "Volume image state changed"
            );
            image.state = next;
            image.updated = Some(timestamp());
            self.ctx.store.update_volume_image(&image).await?;
        }

        if let Some(link_state) = link_state {
            if let Some(mut link) = self.ctx.store.get_snapshot_link_by_image(&image.id).await? {
                if link.state != link_state {
                    link.state = link_state;
                    link.updated = Some(timestamp());
                    if link_state == SnapshotState::Available && link.created.is_none() {
                        link.created = Some(timestamp());
                    }
                    self.ctx.store.update_snapshot_link(&link).await?;
                }
            }
        }

        finish_job(&self.ctx.jobs, job, &verdict).await
    }
}
