use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nimbus_core::model::{VolumeImage, VolumeImageCreate, VolumeVolumeImage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use super::jobs::job_reply;
use super::{
    ApiError, AppState, JobResponse, ParentJobQuery, PlacementResponse, UpdateAttributesRequest,
};

/// Request to create a volume image, or to snapshot a volume into one
#[derive(Deserialize, ToSchema)]
pub struct CreateVolumeImageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// Source of the image content; ignored for snapshots
    pub image_location: Option<String>,
    #[serde(default)]
    pub bootable: bool,
}

impl From<CreateVolumeImageRequest> for VolumeImageCreate {
    fn from(req: CreateVolumeImageRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            properties: req.properties,
            image_location: req.image_location,
            bootable: req.bootable,
        }
    }
}

/// Volume image resource
#[derive(Serialize, ToSchema)]
pub struct VolumeImageResponse {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: HashMap<String, String>,
    pub placement: PlacementResponse,
    pub provider_assigned_id: Option<String>,
    /// creating, available, deleting, deleted or error
    pub state: String,
    pub image_location: Option<String>,
    pub bootable: bool,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl From<VolumeImage> for VolumeImageResponse {
    fn from(i: VolumeImage) -> Self {
        Self {
            id: i.id,
            tenant_id: i.tenant_id,
            name: i.name,
            description: i.description,
            properties: i.properties,
            placement: i.placement.into(),
            provider_assigned_id: i.provider_assigned_id,
            state: i.state.as_str().to_string(),
            image_location: i.image_location,
            bootable: i.bootable,
            created: i.created,
            updated: i.updated,
        }
    }
}

/// Entry of a volume's images collection
#[derive(Serialize, ToSchema)]
pub struct VolumeSnapshotResponse {
    pub id: String,
    pub volume_id: String,
    pub volume_image_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: HashMap<String, String>,
    /// snapshotting, available or error
    pub state: String,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl From<VolumeVolumeImage> for VolumeSnapshotResponse {
    fn from(l: VolumeVolumeImage) -> Self {
        Self {
            id: l.id,
            volume_id: l.volume_id,
            volume_image_id: l.volume_image_id,
            name: l.name,
            description: l.description,
            properties: l.properties,
            state: l.state.as_str().to_string(),
            created: l.created,
            updated: l.updated,
        }
    }
}

/// Create a volume image
#[utoipa::path(
    post,
    path = "/v1/tenants/{tenant_id}/volume-images",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("parent_job_id" = Option<String>, Query, description = "Parent job ID")
    ),
    request_body = CreateVolumeImageRequest,
    responses(
        (status = 200, description = "Image created", body = JobResponse),
        (status = 202, description = "Image creation submitted", body = JobResponse),
        (status = 502, description = "Provider operation failed", body = ApiError),
        (status = 503, description = "No provider can host the image", body = ApiError)
    ),
    tag = "volume-images"
)]
pub async fn create_volume_image(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ParentJobQuery>,
    Json(req): Json<CreateVolumeImageRequest>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job = state
        .cloud
        .images
        .create_volume_image(&tenant_id, req.into(), query.parent_job_id.as_deref())
        .await?;
    Ok(job_reply(job))
}

/// List the tenant's volume images
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volume-images",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID")
    ),
    responses(
        (status = 200, description = "List of images", body = Vec<VolumeImageResponse>)
    ),
    tag = "volume-images"
)]
pub async fn list_volume_images(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Vec<VolumeImageResponse>>, ApiError> {
    let images = state.cloud.images.list_volume_images(&tenant_id).await?;
    Ok(Json(images.into_iter().map(Into::into).collect()))
}

/// Get a volume image by ID
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volume-images/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image found", body = VolumeImageResponse),
        (status = 404, description = "Image not found", body = ApiError)
    ),
    tag = "volume-images"
)]
pub async fn get_volume_image(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<VolumeImageResponse>, ApiError> {
    let image = state.cloud.images.get_volume_image(&tenant_id, &id).await?;
    Ok(Json(image.into()))
}

/// Update a volume image's name, description or properties
#[utoipa::path(
    patch,
    path = "/v1/tenants/{tenant_id}/volume-images/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Image ID")
    ),
    request_body = UpdateAttributesRequest,
    responses(
        (status = 200, description = "Image updated", body = JobResponse),
        (status = 404, description = "Image not found", body = ApiError)
    ),
    tag = "volume-images"
)]
pub async fn update_volume_image(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateAttributesRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state
        .cloud
        .images
        .update_volume_image_attributes(&tenant_id, &id, req.into())
        .await?;
    Ok(Json(job.into()))
}

/// Delete a volume image
#[utoipa::path(
    delete,
    path = "/v1/tenants/{tenant_id}/volume-images/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Image ID"),
        ("parent_job_id" = Option<String>, Query, description = "Parent job ID")
    ),
    responses(
        (status = 200, description = "Image deleted", body = JobResponse),
        (status = 202, description = "Image deletion submitted", body = JobResponse),
        (status = 404, description = "Image not found", body = ApiError)
    ),
    tag = "volume-images"
)]
pub async fn delete_volume_image(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
    Query(query): Query<ParentJobQuery>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job = state
        .cloud
        .images
        .delete_volume_image(&tenant_id, &id, query.parent_job_id.as_deref())
        .await?;
    Ok(job_reply(job))
}

/// Snapshot a volume into a new image
#[utoipa::path(
    post,
    path = "/v1/tenants/{tenant_id}/volumes/{id}/images",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Volume ID"),
        ("parent_job_id" = Option<String>, Query, description = "Parent job ID")
    ),
    request_body = CreateVolumeImageRequest,
    responses(
        (status = 200, description = "Snapshot created", body = JobResponse),
        (status = 202, description = "Snapshot submitted", body = JobResponse),
        (status = 400, description = "Volume is not available", body = ApiError),
        (status = 404, description = "Volume not found", body = ApiError)
    ),
    tag = "volume-images"
)]
pub async fn create_volume_snapshot(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
    Query(query): Query<ParentJobQuery>,
    Json(req): Json<CreateVolumeImageRequest>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job = state
        .cloud
        .images
        .create_volume_snapshot(&tenant_id, &id, req.into(), query.parent_job_id.as_deref())
        .await?;
    Ok(job_reply(job))
}

/// List a volume's images
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volumes/{id}/images",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Volume ID")
    ),
    responses(
        (status = 200, description = "Images of the volume", body = Vec<VolumeSnapshotResponse>),
        (status = 404, description = "Volume not found", body = ApiError)
    ),
    tag = "volume-images"
)]
pub async fn list_volume_snapshots(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<Vec<VolumeSnapshotResponse>>, ApiError> {
    let links = state.cloud.images.list_snapshot_links(&tenant_id, &id).await?;
    Ok(Json(links.into_iter().map(Into::into).collect()))
}

/// Get one entry of a volume's images
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volumes/{id}/images/{link_id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Volume ID"),
        ("link_id" = String, Path, description = "Entry ID")
    ),
    responses(
        (status = 200, description = "Entry found", body = VolumeSnapshotResponse),
        (status = 404, description = "Volume or entry not found", body = ApiError)
    ),
    tag = "volume-images"
)]
pub async fn get_volume_snapshot(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id, link_id)): Path<(String, String, String)>,
) -> Result<Json<VolumeSnapshotResponse>, ApiError> {
    let link = state
        .cloud
        .images
        .get_snapshot_link(&tenant_id, &id, &link_id)
        .await?;
    Ok(Json(link.into()))
}

/// Update an entry of a volume's images
#[utoipa::path(
    patch,
    path = "/v1/tenants/{tenant_id}/volumes/{id}/images/{link_id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Volume ID"),
        ("link_id" = String, Path, description = "Entry ID")
    ),
    request_body = UpdateAttributesRequest,
    responses(
        (status = 200, description = "Entry updated", body = VolumeSnapshotResponse),
        (status = 404, description = "Volume or entry not found", body = ApiError)
    ),
    tag = "volume-images"
)]
pub async fn update_volume_snapshot(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id, link_id)): Path<(String, String, String)>,
    Json(req): Json<UpdateAttributesRequest>,
) -> Result<Json<VolumeSnapshotResponse>, ApiError> {
    let link = state
        .cloud
        .images
        .update_snapshot_link(&tenant_id, &id, &link_id, req.into())
        .await?;
    Ok(Json(link.into()))
}

/// Remove an entry from a volume's images; the image itself is kept
#[utoipa::path(
    delete,
    path = "/v1/tenants/{tenant_id}/volumes/{id}/images/{link_id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Volume ID"),
        ("link_id" = String, Path, description = "Entry ID")
    ),
    responses(
        (status = 200, description = "Entry removed", body = JobResponse),
        (status = 404, description = "Volume or entry not found", body = ApiError)
    ),
    tag = "volume-images"
)]
pub async fn remove_volume_snapshot(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id, link_id)): Path<(String, String, String)>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state
        .cloud
        .images
        .remove_snapshot_link(&tenant_id, &id, &link_id)
        .await?;
    Ok(Json(job.into()))
}
