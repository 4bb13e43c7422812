use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nimbus_core::model::{Volume, VolumeConfig, VolumeCreate, VolumeFromTemplate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use super::jobs::job_reply;
use super::{
    ApiError, AppState, JobResponse, ParentJobQuery, PlacementResponse, UpdateAttributesRequest,
};

/// Request to create a volume
#[derive(Deserialize, ToSchema)]
pub struct CreateVolumeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Free-form properties, also used as placement hints
    /// (provider, account, location)
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// Capacity in KB, must be positive
    pub capacity_kb: u64,
    /// Filesystem or image format
    pub format: Option<String>,
    /// Provider-specific volume type
    pub volume_type: Option<String>,
}

impl From<CreateVolumeRequest> for VolumeCreate {
    fn from(req: CreateVolumeRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            properties: req.properties,
            config: VolumeConfig {
                format: req.format,
                capacity_kb: req.capacity_kb,
                volume_type: req.volume_type,
            },
        }
    }
}

/// Request to create a volume from a stored template
#[derive(Deserialize, ToSchema)]
pub struct CreateVolumeFromTemplateRequest {
    pub template_id: String,
    /// Overrides the template's name
    pub name: Option<String>,
    /// Overrides the template's description
    pub description: Option<String>,
    /// Merged over the template's properties
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl From<CreateVolumeFromTemplateRequest> for VolumeFromTemplate {
    fn from(req: CreateVolumeFromTemplateRequest) -> Self {
        Self {
            template_id: req.template_id,
            name: req.name,
            description: req.description,
            properties: req.properties,
        }
    }
}

/// Volume resource
#[derive(Serialize, ToSchema)]
pub struct VolumeResponse {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: HashMap<String, String>,
    pub placement: PlacementResponse,
    pub provider_assigned_id: Option<String>,
    /// creating, available, deleting, deleted or error
    pub state: String,
    pub capacity_kb: u64,
    pub volume_type: Option<String>,
    pub bootable: bool,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl From<Volume> for VolumeResponse {
    fn from(v: Volume) -> Self {
        Self {
            id: v.id,
            tenant_id: v.tenant_id,
            name: v.name,
            description: v.description,
            properties: v.properties,
            placement: v.placement.into(),
            provider_assigned_id: v.provider_assigned_id,
            state: v.state.as_str().to_string(),
            capacity_kb: v.capacity_kb,
            volume_type: v.volume_type,
            bootable: v.bootable,
            created: v.created,
            updated: v.updated,
        }
    }
}

/// Create a volume
#[utoipa::path(
    post,
    path = "/v1/tenants/{tenant_id}/volumes",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("parent_job_id" = Option<String>, Query, description = "Parent job ID")
    ),
    request_body = CreateVolumeRequest,
    responses(
        (status = 200, description = "Volume created", body = JobResponse),
        (status = 202, description = "Volume creation submitted", body = JobResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 502, description = "Provider operation failed", body = ApiError),
        (status = 503, description = "No provider can host the volume", body = ApiError)
    ),
    tag = "volumes"
)]
pub async fn create_volume(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ParentJobQuery>,
    Json(req): Json<CreateVolumeRequest>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job = state
        .cloud
        .volumes
        .create_volume(&tenant_id, req.into(), query.parent_job_id.as_deref())
        .await?;
    Ok(job_reply(job))
}

/// Create a volume from a template
#[utoipa::path(
    post,
    path = "/v1/tenants/{tenant_id}/volumes/from-template",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("parent_job_id" = Option<String>, Query, description = "Parent job ID")
    ),
    request_body = CreateVolumeFromTemplateRequest,
    responses(
        (status = 200, description = "Volume created", body = JobResponse),
        (status = 202, description = "Volume creation submitted", body = JobResponse),
        (status = 404, description = "Template not found", body = ApiError),
        (status = 503, description = "No provider can host the volume", body = ApiError)
    ),
    tag = "volumes"
)]
pub async fn create_volume_from_template(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ParentJobQuery>,
    Json(req): Json<CreateVolumeFromTemplateRequest>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job = state
        .cloud
        .volumes
        .create_volume_from_template(&tenant_id, req.into(), query.parent_job_id.as_deref())
        .await?;
    Ok(job_reply(job))
}

/// List the tenant's volumes
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volumes",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID")
    ),
    responses(
        (status = 200, description = "List of volumes", body = Vec<VolumeResponse>)
    ),
    tag = "volumes"
)]
pub async fn list_volumes(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Vec<VolumeResponse>>, ApiError> {
    let volumes = state.cloud.volumes.list_volumes(&tenant_id).await?;
    Ok(Json(volumes.into_iter().map(Into::into).collect()))
}

/// Get a volume by ID
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volumes/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Volume ID")
    ),
    responses(
        (status = 200, description = "Volume found", body = VolumeResponse),
        (status = 404, description = "Volume not found", body = ApiError)
    ),
    tag = "volumes"
)]
pub async fn get_volume(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<VolumeResponse>, ApiError> {
    let volume = state.cloud.volumes.get_volume(&tenant_id, &id).await?;
    Ok(Json(volume.into()))
}

/// Update a volume's name, description or properties
#[utoipa::path(
    patch,
    path = "/v1/tenants/{tenant_id}/volumes/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Volume ID")
    ),
    request_body = UpdateAttributesRequest,
    responses(
        (status = 200, description = "Volume updated", body = JobResponse),
        (status = 404, description = "Volume not found", body = ApiError)
    ),
    tag = "volumes"
)]
pub async fn update_volume(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateAttributesRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state
        .cloud
        .volumes
        .update_volume_attributes(&tenant_id, &id, req.into())
        .await?;
    Ok(Json(job.into()))
}

/// Delete a volume
#[utoipa::path(
    delete,
    path = "/v1/tenants/{tenant_id}/volumes/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Volume ID"),
        ("parent_job_id" = Option<String>, Query, description = "Parent job ID")
    ),
    responses(
        (status = 200, description = "Volume deleted", body = JobResponse),
        (status = 202, description = "Volume deletion submitted", body = JobResponse),
        (status = 404, description = "Volume not found", body = ApiError),
        (status = 502, description = "Provider operation failed", body = ApiError)
    ),
    tag = "volumes"
)]
pub async fn delete_volume(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
    Query(query): Query<ParentJobQuery>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job = state
        .cloud
        .volumes
        .delete_volume(&tenant_id, &id, query.parent_job_id.as_deref())
        .await?;
    Ok(job_reply(job))
}
