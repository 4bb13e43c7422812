//! Collaborators shared by the resource managers.

use std::sync::Arc;

use tracing::warn;

use crate::completion::{CompletionNotifier, CompletionOutcome};
use crate::connector::{CloudConnector, ConnectorResolver, ProviderJob, ProviderJobState};
use crate::error::{CloudError, Result};
use crate::job::JobManager;
use crate::model::{Job, JobBuilder};
use crate::placement::PlacementResolver;
use crate::store::{DataStore, ResourceWrite};

/// Everything a resource manager talks to. Cheap to clone.
#[derive(Clone)]
pub struct ManagerContext {
    pub store: Arc<dyn DataStore>,
    pub jobs: JobManager,
    pub placement: Arc<dyn PlacementResolver>,
    pub connectors: Arc<dyn ConnectorResolver>,
    pub notifier: Arc<dyn CompletionNotifier>,
}

impl ManagerContext {
    pub fn new(
        store: Arc<dyn DataStore>,
        placement: Arc<dyn PlacementResolver>,
        connectors: Arc<dyn ConnectorResolver>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            jobs: JobManager::new(store.clone()),
            store,
            placement,
            connectors,
            notifier,
        }
    }

    pub(crate) fn connector(&self, provider_type: &str) -> Result<Arc<dyn CloudConnector>> {
        self.connectors.resolve(provider_type)
    }

    /// Reject an unknown parent before anything reaches the provider.
    pub(crate) async fn check_parent(&self, parent_job_id: Option<&str>) -> Result<()> {
        if let Some(parent) = parent_job_id {
            self.jobs.get_by_id(parent).await?;
        }
        Ok(())
    }

    /// Arm the completion path. Failure is logged only: the job is already
    /// persisted and can still be completed over HTTP.
    pub(crate) async fn arm(&self, job: &Job) {
        let Some(provider_job_id) = job.provider_assigned_id.as_deref() else {
            return;
        };
        if let Err(e) = self.notifier.arm(provider_job_id).await {
            warn!(
                job_id = %job.id,
                provider_job_id = %provider_job_id,
                "Failed to arm completion: {}",
                e
            );
        }
    }

    /// Persist an accepted submission, resource and job together, and arm
    /// the job when it is still pending.
    pub(crate) async fn record_submission(
        &self,
        write: ResourceWrite<'_>,
        builder: JobBuilder,
        provider_job: &ProviderJob,
    ) -> Result<Job> {
        let job = self
            .jobs
            .create_with(write, builder.provider_job(provider_job))
            .await?;
        if job.state == crate::model::JobState::Running {
            self.arm(&job).await;
        }
        Ok(job)
    }
}

/// Read the provider's verdict on a job. `None` while it is still running.
pub(crate) async fn provider_verdict(
    connector: &dyn CloudConnector,
    job: &Job,
) -> Result<Option<ProviderJob>> {
    let provider_job_id = job
        .provider_assigned_id
        .as_deref()
        .ok_or_else(|| CloudError::InvalidRequest(format!("job {} has no provider job", job.id)))?;

    let verdict = connector.job_status(provider_job_id).await?;
    if verdict.state == ProviderJobState::Running {
        return Ok(None);
    }
    Ok(Some(verdict))
}

/// Move a running job to the provider's terminal state and persist it.
pub(crate) async fn finish_job(
    jobs: &JobManager,
    mut job: Job,
    verdict: &ProviderJob,
) -> Result<CompletionOutcome> {
    let state = verdict.state.into();
    if !job.finish(
        state,
        verdict.status_message.clone(),
        Some(verdict.time_of_status_change.clone()),
    ) {
        return Ok(CompletionOutcome::AlreadyApplied { state: job.state });
    }
    let job = jobs.update(&job).await?;
    Ok(CompletionOutcome::Applied { state: job.state })
}
