//! Volume lifecycle: submission to the provider and completion.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::completion::{CompletionOutcome, JobReconciler};
use crate::connector::{ProviderJobState, Submission};
use crate::error::{CloudError, Result};
use crate::manager::{ManagerContext, finish_job, provider_verdict};
use crate::model::{
    AttributeUpdate, Job, JobAction, JobBuilder, JobState, ResourceKind, ResourceRef, Volume,
    VolumeCreate, VolumeFromTemplate, VolumeState, timestamp,
};
use crate::store::ResourceWrite;
use crate::template::TemplateManager;

#[derive(Clone)]
pub struct VolumeManager {
    ctx: ManagerContext,
    templates: TemplateManager,
}

impl VolumeManager {
    pub fn new(ctx: ManagerContext) -> Self {
        Self {
            templates: TemplateManager::new(ctx.store.clone()),
            ctx,
        }
    }

    /// Provision a volume.
    ///
    /// Returns the job recording the operation: `Success` if the provider
    /// finished within the call, `Running` otherwise. A provider-side failure
    /// persists nothing.
    pub async fn create_volume(
        &self,
        tenant_id: &str,
        create: VolumeCreate,
        parent_job_id: Option<&str>,
    ) -> Result<Job> {
        if create.config.capacity_kb == 0 {
            return Err(CloudError::InvalidRequest(
                "capacity_kb must be positive".to_string(),
            ));
        }
        self.ctx.check_parent(parent_job_id).await?;

        let placement = self.ctx.placement.place(tenant_id, &create.properties).await?;
        let connector = self.ctx.connector(&placement.provider_type)?;

        let submission = Submission::classify(connector.create_volume(&create).await?)?;
        let provider_job = submission.provider_job();
        let provider_id = provider_job.target_provider_id.clone();

        let volume = match &submission {
            Submission::Immediate(_) => {
                let state = connector.volume_state(&provider_id).await?;
                let mut volume =
                    Volume::new(tenant_id.to_string(), &create, placement, provider_id, state);
                volume.created = Some(timestamp());
                volume
            }
            Submission::Pending(_) => Volume::new(
                tenant_id.to_string(),
                &create,
                placement,
                provider_id,
                VolumeState::Creating,
            ),
        };

        let builder = JobBuilder::new(ResourceRef::volume(&volume), JobAction::Create)
            .tenant(tenant_id)
            .description(format!("create volume {}", volume.id))
            .affected(vec![ResourceRef::volume(&volume)])
            .parent(parent_job_id.map(String::from));
        let job = self
            .ctx
            .record_submission(ResourceWrite::InsertVolume(&volume), builder, provider_job)
            .await?;

        info!(
            volume_id = %volume.id,
            provider_id = ?volume.provider_assigned_id,
            state = volume.state.as_str(),
            "Submitted volume create"
        );
        Ok(job)
    }

    /// Provision a volume from a stored template and its configuration.
    pub async fn create_volume_from_template(
        &self,
        tenant_id: &str,
        request: VolumeFromTemplate,
        parent_job_id: Option<&str>,
    ) -> Result<Job> {
        let (template, config) = self
            .templates
            .resolve_template(tenant_id, &request.template_id)
            .await?;

        let mut properties = template.properties;
        properties.extend(request.properties);

        let create = VolumeCreate {
            name: request.name.or(template.name),
            description: request.description.or(template.description),
            properties,
            config: config.config,
        };
        self.create_volume(tenant_id, create, parent_job_id).await
    }

    /// A live volume owned by the tenant.
    pub async fn get_volume(&self, tenant_id: &str, id: &str) -> Result<Volume> {
        self.ctx
            .store
            .get_volume(id)
            .await?
            .filter(|v| v.tenant_id == tenant_id && v.state != VolumeState::Deleted)
            .ok_or_else(|| CloudError::NotFound(format!("volume {}", id)))
    }

    pub async fn list_volumes(&self, tenant_id: &str) -> Result<Vec<Volume>> {
        let volumes = self.ctx.store.list_volumes(tenant_id).await?;
        Ok(volumes
            .into_iter()
            .filter(|v| v.state != VolumeState::Deleted)
            .collect())
    }

    /// Change name, description or properties. Local only; the returned
    /// job is already `Success`.
    pub async fn update_volume_attributes(
        &self,
        tenant_id: &str,
        id: &str,
        update: AttributeUpdate,
    ) -> Result<Job> {
        let mut volume = self.get_volume(tenant_id, id).await?;
        if update.apply(
            &mut volume.name,
            &mut volume.description,
            &mut volume.properties,
        ) {
            volume.updated = Some(timestamp());
        }

        self.ctx
            .jobs
            .create_with(
                ResourceWrite::UpdateVolume(&volume),
                JobBuilder::new(ResourceRef::volume(&volume), JobAction::Update)
                    .tenant(tenant_id)
                    .description(format!("update volume {}", volume.id))
                    .state(JobState::Success),
            )
            .await
    }

    /// Delete a volume at its provider.
    ///
    /// A synchronous provider failure leaves the volume untouched.
    pub async fn delete_volume(
        &self,
        tenant_id: &str,
        id: &str,
        parent_job_id: Option<&str>,
    ) -> Result<Job> {
        let mut volume = self.get_volume(tenant_id, id).await?;
        self.ctx.check_parent(parent_job_id).await?;

        let provider_id = volume.provider_assigned_id.clone().ok_or_else(|| {
            CloudError::InvalidRequest(format!("volume {} has no provider id", id))
        })?;
        let connector = self.ctx.connector(&volume.placement.provider_type)?;

        let submission = Submission::classify(connector.delete_volume(&provider_id).await?)?;
        volume.state = match submission {
            Submission::Immediate(_) => VolumeState::Deleted,
            Submission::Pending(_) => VolumeState::Deleting,
        };
        volume.updated = Some(timestamp());

        let builder = JobBuilder::new(ResourceRef::volume(&volume), JobAction::Delete)
            .tenant(tenant_id)
            .description(format!("delete volume {}", volume.id))
            .parent(parent_job_id.map(String::from));
        let job = self
            .ctx
            .record_submission(
                ResourceWrite::UpdateVolume(&volume),
                builder,
                submission.provider_job(),
            )
            .await?;

        info!(
            volume_id = %volume.id,
            state = volume.state.as_str(),
            "Submitted volume delete"
        );
        Ok(job)
    }

    pub fn templates(&self) -> &TemplateManager {
        &self.templates
    }
}

#[async_trait]
impl JobReconciler for VolumeManager {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Volume
    }

    async fn reconcile(&self, job: Job) -> Result<CompletionOutcome> {
        let target = &job.target_resource;
        let Some(provider_id) = target.provider_assigned_id.as_deref() else {
            warn!(job_id = %job.id, "Job target has no provider id");
            return Ok(CompletionOutcome::NotApplied);
        };
        let Some(mut volume) = self
            .ctx
            .store
            .get_volume_by_provider_id(target.account_id.as_deref(), provider_id)
            .await?
        else {
            warn!(job_id = %job.id, provider_id = %provider_id, "No volume for completed job");
            return Ok(CompletionOutcome::NotApplied);
        };

        if job.action == JobAction::Update {
            warn!(job_id = %job.id, "Update jobs complete locally");
            return Ok(CompletionOutcome::NotApplied);
        }

        let connector = self.ctx.connector(&volume.placement.provider_type)?;
        let Some(verdict) = provider_verdict(connector.as_ref(), &job).await? else {
            return Ok(CompletionOutcome::Pending);
        };

        let next = match (job.action, verdict.state) {
            (JobAction::Create, ProviderJobState::Success) => {
                let state = connector.volume_state(provider_id).await?;
                if volume.created.is_none() {
                    volume.created = Some(timestamp());
                }
                state
            }
            (JobAction::Delete, ProviderJobState::Success) => VolumeState::Deleted,
            _ => VolumeState::Error,
        };

        if volume.state != next {
            info!(
                volume_id = %volume.id,
                from = volume.state.as_str(),
                to = next.as_str(),
                "Volume state changed"
            );
            volume.state = next;
            volume.updated = Some(timestamp());
            self.ctx.store.update_volume(&volume).await?;
        }

        finish_job(&self.ctx.jobs, job, &verdict).await
    }
}
