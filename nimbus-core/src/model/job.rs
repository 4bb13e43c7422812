use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ResourceRef, timestamp};
use crate::connector::{ProviderJob, ProviderJobState};

/// Lifecycle state of a job. Anything but `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Success,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Running => "running",
            JobState::Success => "success",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl From<ProviderJobState> for JobState {
    fn from(state: ProviderJobState) -> Self {
        match state {
            ProviderJobState::Running => JobState::Running,
            ProviderJobState::Success => JobState::Success,
            ProviderJobState::Failed => JobState::Failed,
            ProviderJobState::Cancelled => JobState::Cancelled,
        }
    }
}

/// Operation a job records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    Create,
    Delete,
    Update,
}

impl std::fmt::Display for JobAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobAction::Create => write!(f, "create"),
            JobAction::Delete => write!(f, "delete"),
            JobAction::Update => write!(f, "update"),
        }
    }
}

/// Persisted record of one submitted operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub tenant_id: Option<String>,
    pub description: Option<String>,
    pub action: JobAction,
    pub target_resource: ResourceRef,
    pub affected_resources: Vec<ResourceRef>,
    pub state: JobState,
    /// Provider job id; the completion correlation key.
    pub provider_assigned_id: Option<String>,
    pub status_message: Option<String>,
    pub created: String,
    pub time_of_status_change: Option<String>,
    pub parent_job_id: Option<String>,
}

impl Job {
    /// Move a running job to a terminal state.
    ///
    /// Returns false and leaves the job untouched if it is already terminal
    /// or if `state` is `Running`.
    pub fn finish(
        &mut self,
        state: JobState,
        status_message: Option<String>,
        time_of_status_change: Option<String>,
    ) -> bool {
        if self.state.is_terminal() || !state.is_terminal() {
            return false;
        }
        self.state = state;
        if status_message.is_some() {
            self.status_message = status_message;
        }
        self.time_of_status_change = Some(time_of_status_change.unwrap_or_else(timestamp));
        true
    }
}

/// Builder for new jobs. The id and creation time are assigned on `build`.
pub struct JobBuilder {
    target: ResourceRef,
    action: JobAction,
    tenant_id: Option<String>,
    description: Option<String>,
    affected: Vec<ResourceRef>,
    state: JobState,
    provider_assigned_id: Option<String>,
    status_message: Option<String>,
    time_of_status_change: Option<String>,
    parent_job_id: Option<String>,
}

impl JobBuilder {
    pub fn new(target: ResourceRef, action: JobAction) -> Self {
        Self {
            target,
            action,
            tenant_id: None,
            description: None,
            affected: Vec::new(),
            state: JobState::Running,
            provider_assigned_id: None,
            status_message: None,
            time_of_status_change: None,
            parent_job_id: None,
        }
    }

    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn affected(mut self, resources: Vec<ResourceRef>) -> Self {
        self.affected = resources;
        self
    }

    pub fn state(mut self, state: JobState) -> Self {
        self.state = state;
        self
    }

    pub fn parent(mut self, parent_job_id: Option<String>) -> Self {
        self.parent_job_id = parent_job_id;
        self
    }

    /// Copy correlation id, state, message and status time from a provider job.
    pub fn provider_job(mut self, provider_job: &ProviderJob) -> Self {
        self.provider_assigned_id = Some(provider_job.provider_job_id.clone());
        self.state = provider_job.state.into();
        self.status_message = provider_job.status_message.clone();
        self.time_of_status_change = Some(provider_job.time_of_status_change.clone());
        self
    }

    pub(crate) fn parent_job_id(&self) -> Option<&str> {
        self.parent_job_id.as_deref()
    }

    pub fn build(self) -> Job {
        Job {
            id: Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id,
            description: self.description,
            action: self.action,
            target_resource: self.target,
            affected_resources: self.affected,
            state: self.state,
            provider_assigned_id: self.provider_assigned_id,
            status_message: self.status_message,
            created: timestamp(),
            time_of_status_change: self.time_of_status_change,
            parent_job_id: self.parent_job_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceKind;

    fn target() -> ResourceRef {
        ResourceRef {
            kind: ResourceKind::Volume,
            id: "vol-1".to_string(),
            provider_assigned_id: Some("p-vol-1".to_string()),
            account_id: Some("acct".to_string()),
        }
    }

    #[test]
    fn test_finish_is_monotonic() {
        let mut job = JobBuilder::new(target(), JobAction::Create).build();
        assert_eq!(job.state, JobState::Running);

        assert!(job.finish(JobState::Failed, Some("boom".to_string()), None));
        assert_eq!(job.state, JobState::Failed);
        assert!(job.time_of_status_change.is_some());

        // Terminal jobs never move again
        assert!(!job.finish(JobState::Success, None, None));
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.status_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_finish_rejects_running() {
        let mut job = JobBuilder::new(target(), JobAction::Delete).build();
        assert!(!job.finish(JobState::Running, None, None));
        assert!(job.time_of_status_change.is_none());
    }

    #[test]
    fn test_builder_copies_provider_job() {
        let provider_job = ProviderJob {
            provider_job_id: "pj-7".to_string(),
            state: ProviderJobState::Running,
            target_provider_id: "p-vol-1".to_string(),
            status_message: None,
            time_of_status_change: "2024-01-01T00:00:00Z".to_string(),
        };
        let job = JobBuilder::new(target(), JobAction::Create)
            .tenant("tenant-a")
            .provider_job(&provider_job)
            .build();

        assert_eq!(job.provider_assigned_id.as_deref(), Some("pj-7"));
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.tenant_id.as_deref(), Some("tenant-a"));
        assert_eq!(
            job.time_of_status_change.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }
}
