//! Job bookkeeping shared by every resource manager.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{CloudError, Result};
use crate::model::{Job, JobAction, JobBuilder, ResourceRef};
use crate::store::{DataStore, ResourceWrite, StoreError};

/// CRUD over jobs. Knows nothing about resource kinds.
#[derive(Clone)]
pub struct JobManager {
    store: Arc<dyn DataStore>,
}

impl JobManager {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Record a new running job against `target`.
    pub async fn create(
        &self,
        target: ResourceRef,
        action: JobAction,
        parent_job_id: Option<&str>,
    ) -> Result<Job> {
        self.create_job(JobBuilder::new(target, action).parent(parent_job_id.map(String::from)))
            .await
    }

    /// Persist a job assembled by the caller.
    ///
    /// Fails with `NotFound` if the builder names a parent that does not exist.
    pub async fn create_job(&self, builder: JobBuilder) -> Result<Job> {
        if let Some(parent_id) = builder.parent_job_id() {
            if self.store.get_job(parent_id).await?.is_none() {
                return Err(CloudError::NotFound(format!("parent job {}", parent_id)));
            }
        }

        let job = builder.build();
        self.store.insert_job(&job).await?;

        info!(
            job_id = %job.id,
            action = %job.action,
            target = %job.target_resource.id,
            state = job.state.as_str(),
            "Created job"
        );
        Ok(job)
    }

    /// Persist a job together with the resource change it records.
    ///
    /// Both land or neither does. A parent named by the builder is checked
    /// inside the same write, so a parent deleted mid-operation leaves the
    /// resource as it was.
    pub async fn create_with(&self, write: ResourceWrite<'_>, builder: JobBuilder) -> Result<Job> {
        let job = builder.build();
        self.store
            .commit_with_job(write, &job)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(what) => CloudError::NotFound(what),
                e => e.into(),
            })?;

        info!(
            job_id = %job.id,
            action = %job.action,
            target = %job.target_resource.id,
            state = job.state.as_str(),
            "Created job"
        );
        Ok(job)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Job> {
        self.store
            .get_job(id)
            .await?
            .ok_or_else(|| CloudError::NotFound(format!("job {}", id)))
    }

    /// Tenant-scoped read: jobs of other tenants read as absent.
    pub async fn get_for_tenant(&self, tenant_id: &str, id: &str) -> Result<Job> {
        let job = self.get_by_id(id).await?;
        if job.tenant_id.as_deref() != Some(tenant_id) {
            return Err(CloudError::NotFound(format!("job {}", id)));
        }
        Ok(job)
    }

    pub async fn find_by_provider_id(&self, provider_job_id: &str) -> Result<Option<Job>> {
        Ok(self.store.get_job_by_provider_id(provider_job_id).await?)
    }

    pub async fn list(&self, tenant_id: Option<&str>) -> Result<Vec<Job>> {
        Ok(self.store.list_jobs(tenant_id).await?)
    }

    /// Direct children of a job, oldest first.
    pub async fn children(&self, parent_job_id: &str) -> Result<Vec<Job>> {
        let jobs = self.store.list_jobs(None).await?;
        Ok(jobs
            .into_iter()
            .filter(|j| j.parent_job_id.as_deref() == Some(parent_job_id))
            .collect())
    }

    /// Persist `job` and return the stored copy.
    ///
    /// A job that is already terminal keeps its state: an update that
    /// would move it is rejected with `InvalidRequest`.
    pub async fn update(&self, job: &Job) -> Result<Job> {
        let stored = self.get_by_id(&job.id).await?;
        if stored.state.is_terminal() && stored.state != job.state {
            return Err(CloudError::InvalidRequest(format!(
                "job {} is already {}",
                job.id,
                stored.state.as_str()
            )));
        }

        self.store.update_job(job).await?;
        debug!(job_id = %job.id, state = job.state.as_str(), "Updated job");
        self.get_by_id(&job.id).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete_job(id).await? {
            return Err(CloudError::NotFound(format!("job {}", id)));
        }
        info!(job_id = %id, "Deleted job");
        Ok(())
    }
}
