use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use nimbus_core::CompletionOutcome;
use nimbus_core::model::{Job, JobState, ResourceRef};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use super::{ApiError, AppState};

/// Resource a job acts on
#[derive(Serialize, ToSchema)]
pub struct ResourceRefResponse {
    /// volume or volume_image
    pub kind: String,
    pub id: String,
    pub provider_assigned_id: Option<String>,
    pub account_id: Option<String>,
}

impl From<ResourceRef> for ResourceRefResponse {
    fn from(r: ResourceRef) -> Self {
        Self {
            kind: r.kind.to_string(),
            id: r.id,
            provider_assigned_id: r.provider_assigned_id,
            account_id: r.account_id,
        }
    }
}

/// Job resource
#[derive(Serialize, ToSchema)]
pub struct JobResponse {
    pub id: String,
    pub tenant_id: Option<String>,
    pub description: Option<String>,
    /// create, delete or update
    pub action: String,
    pub target_resource: ResourceRefResponse,
    pub affected_resources: Vec<ResourceRefResponse>,
    /// running, success, failed or cancelled
    pub state: String,
    pub provider_assigned_id: Option<String>,
    pub status_message: Option<String>,
    pub created: String,
    pub time_of_status_change: Option<String>,
    pub parent_job_id: Option<String>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            tenant_id: job.tenant_id,
            description: job.description,
            action: job.action.to_string(),
            target_resource: job.target_resource.into(),
            affected_resources: job
                .affected_resources
                .into_iter()
                .map(Into::into)
                .collect(),
            state: job.state.as_str().to_string(),
            provider_assigned_id: job.provider_assigned_id,
            status_message: job.status_message,
            created: job.created,
            time_of_status_change: job.time_of_status_change,
            parent_job_id: job.parent_job_id,
        }
    }
}

/// 202 while the provider is still working, 200 once the job is terminal.
pub(super) fn job_reply(job: Job) -> (StatusCode, Json<JobResponse>) {
    let status = if job.state == JobState::Running {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    (status, Json(job.into()))
}

/// List the tenant's jobs
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/jobs",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID")
    ),
    responses(
        (status = 200, description = "List of jobs", body = Vec<JobResponse>)
    ),
    tag = "jobs"
)]
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Vec<JobResponse>>, ApiError> {
    let jobs = state.cloud.jobs.list(Some(&tenant_id)).await?;
    Ok(Json(jobs.into_iter().map(Into::into).collect()))
}

/// Get a job by ID
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/jobs/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found", body = JobResponse),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state.cloud.jobs.get_for_tenant(&tenant_id, &id).await?;
    Ok(Json(job.into()))
}

/// List the direct children of a job
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/jobs/{id}/children",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Parent job ID")
    ),
    responses(
        (status = 200, description = "Child jobs", body = Vec<JobResponse>),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn list_child_jobs(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<Vec<JobResponse>>, ApiError> {
    let parent = state.cloud.jobs.get_for_tenant(&tenant_id, &id).await?;
    let children = state.cloud.jobs.children(&parent.id).await?;
    Ok(Json(children.into_iter().map(Into::into).collect()))
}

/// Result of a completion notification
#[derive(Serialize, ToSchema)]
pub struct CompletionResponse {
    /// applied, already_applied, pending or not_applied
    pub outcome: String,
    /// Job state, when the job was found terminal
    pub state: Option<String>,
}

impl From<CompletionOutcome> for CompletionResponse {
    fn from(outcome: CompletionOutcome) -> Self {
        let (outcome, state) = match outcome {
            CompletionOutcome::Applied { state } => ("applied", Some(state)),
            CompletionOutcome::AlreadyApplied { state } => ("already_applied", Some(state)),
            CompletionOutcome::Pending => ("pending", None),
            CompletionOutcome::NotApplied => ("not_applied", None),
        };
        Self {
            outcome: outcome.to_string(),
            state: state.map(|s| s.as_str().to_string()),
        }
    }
}

/// Deliver a provider job completion
///
/// Safe to repeat: a duplicate notification is acknowledged without
/// changing anything. Unknown provider job ids are acknowledged too.
#[utoipa::path(
    post,
    path = "/v1/notifications/jobs/{provider_job_id}",
    params(
        ("provider_job_id" = String, Path, description = "Job ID assigned by the provider")
    ),
    responses(
        (status = 200, description = "Notification processed", body = CompletionResponse)
    ),
    tag = "notifications"
)]
pub async fn notify_job_completion(
    State(state): State<Arc<AppState>>,
    Path(provider_job_id): Path<String>,
) -> Json<CompletionResponse> {
    let outcome = state.cloud.dispatcher.complete(&provider_job_id).await;
    info!(provider_job_id = %provider_job_id, outcome = ?outcome, "Completion notification");
    Json(outcome.into())
}
