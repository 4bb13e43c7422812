use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use nimbus_core::model::{
    AttributeUpdate, VolumeConfig, VolumeConfiguration, VolumeConfigurationCreate,
    VolumeConfigurationUpdate, VolumeTemplate, VolumeTemplateCreate, VolumeTemplateUpdate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use super::{ApiError, AppState};

// === Volume configurations ===

/// Request to store a volume configuration
#[derive(Deserialize, ToSchema)]
pub struct CreateVolumeConfigRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    pub format: Option<String>,
    /// Capacity in KB, must be positive
    pub capacity_kb: u64,
    pub volume_type: Option<String>,
}

impl From<CreateVolumeConfigRequest> for VolumeConfigurationCreate {
    fn from(req: CreateVolumeConfigRequest) -> Self {
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

/// Partial update of a volume configuration
#[derive(Deserialize, ToSchema)]
pub struct UpdateVolumeConfigRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Option<HashMap<String, String>>,
    pub format: Option<String>,
    pub capacity_kb: Option<u64>,
    pub volume_type: Option<String>,
}

impl From<UpdateVolumeConfigRequest> for VolumeConfigurationUpdate {
    fn from(req: UpdateVolumeConfigRequest) -> Self {
        Self {
            attributes: AttributeUpdate {
                name: req.name,
                description: req.description,
                properties: req.properties,
            },
            format: req.format,
            capacity_kb: req.capacity_kb,
            volume_type: req.volume_type,
        }
    }
}

/// Volume configuration resource
#[derive(Serialize, ToSchema)]
pub struct VolumeConfigResponse {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: HashMap<String, String>,
    pub format: Option<String>,
    pub capacity_kb: u64,
    pub volume_type: Option<String>,
    pub created: String,
    pub updated: Option<String>,
}

impl From<VolumeConfiguration> for VolumeConfigResponse {
    fn from(c: VolumeConfiguration) -> Self {
        Self {
            id: c.id,
            tenant_id: c.tenant_id,
            name: c.name,
            description: c.description,
            properties: c.properties,
            format: c.config.format,
            capacity_kb: c.config.capacity_kb,
            volume_type: c.config.volume_type,
            created: c.created,
            updated: c.updated,
        }
    }
}

/// Store a volume configuration
#[utoipa::path(
    post,
    path = "/v1/tenants/{tenant_id}/volume-configs",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID")
    ),
    request_body = CreateVolumeConfigRequest,
    responses(
        (status = 201, description = "Configuration stored", body = VolumeConfigResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 409, description = "Name already in use", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn create_volume_config(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Json(req): Json<CreateVolumeConfigRequest>,
) -> Result<(StatusCode, Json<VolumeConfigResponse>), ApiError> {
    let config = state
        .cloud
        .templates
        .create_configuration(&tenant_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(config.into())))
}

/// List the tenant's volume configurations
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volume-configs",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID")
    ),
    responses(
        (status = 200, description = "List of configurations", body = Vec<VolumeConfigResponse>)
    ),
    tag = "templates"
)]
pub async fn list_volume_configs(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Vec<VolumeConfigResponse>>, ApiError> {
    let configs = state.cloud.templates.list_configurations(&tenant_id).await?;
    Ok(Json(configs.into_iter().map(Into::into).collect()))
}

/// Get a volume configuration by ID
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volume-configs/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Configuration ID")
    ),
    responses(
        (status = 200, description = "Configuration found", body = VolumeConfigResponse),
        (status = 404, description = "Configuration not found", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn get_volume_config(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<VolumeConfigResponse>, ApiError> {
    let config = state
        .cloud
        .templates
        .get_configuration(&tenant_id, &id)
        .await?;
    Ok(Json(config.into()))
}

/// Update a volume configuration
#[utoipa::path(
    patch,
    path = "/v1/tenants/{tenant_id}/volume-configs/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Configuration ID")
    ),
    request_body = UpdateVolumeConfigRequest,
    responses(
        (status = 200, description = "Configuration updated", body = VolumeConfigResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Configuration not found", body = ApiError),
        (status = 409, description = "Name already in use", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn update_volume_config(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateVolumeConfigRequest>,
) -> Result<Json<VolumeConfigResponse>, ApiError> {
    let config = state
        .cloud
        .templates
        .update_configuration(&tenant_id, &id, req.into())
        .await?;
    Ok(Json(config.into()))
}

/// Delete a volume configuration
#[utoipa::path(
    delete,
    path = "/v1/tenants/{tenant_id}/volume-configs/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Configuration ID")
    ),
    responses(
        (status = 204, description = "Configuration deleted"),
        (status = 404, description = "Configuration not found", body = ApiError),
        (status = 409, description = "Configuration still used by a template", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn delete_volume_config(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .cloud
        .templates
        .delete_configuration(&tenant_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// === Volume templates ===

/// Request to store a volume template
#[derive(Deserialize, ToSchema)]
pub struct CreateVolumeTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// Configuration the template points at
    pub volume_config_id: String,
}

impl From<CreateVolumeTemplateRequest> for VolumeTemplateCreate {
    fn from(req: CreateVolumeTemplateRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            properties: req.properties,
            volume_config_id: req.volume_config_id,
        }
    }
}

/// Partial update of a volume template
#[derive(Deserialize, ToSchema)]
pub struct UpdateVolumeTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Option<HashMap<String, String>>,
    pub volume_config_id: Option<String>,
}

impl From<UpdateVolumeTemplateRequest> for VolumeTemplateUpdate {
    fn from(req: UpdateVolumeTemplateRequest) -> Self {
        Self {
            attributes: AttributeUpdate {
                name: req.name,
                description: req.description,
                properties: req.properties,
            },
            volume_config_id: req.volume_config_id,
        }
    }
}

/// Volume template resource
#[derive(Serialize, ToSchema)]
pub struct VolumeTemplateResponse {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: HashMap<String, String>,
    pub volume_config_id: String,
    pub created: String,
    pub updated: Option<String>,
}

impl From<VolumeTemplate> for VolumeTemplateResponse {
    fn from(t: VolumeTemplate) -> Self {
        Self {
            id: t.id,
            tenant_id: t.tenant_id,
            name: t.name,
            description: t.description,
            properties: t.properties,
            volume_config_id: t.volume_config_id,
            created: t.created,
            updated: t.updated,
        }
    }
}

/// Store a volume template
#[utoipa::path(
    post,
    path = "/v1/tenants/{tenant_id}/volume-templates",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID")
    ),
    request_body = CreateVolumeTemplateRequest,
    responses(
        (status = 201, description = "Template stored", body = VolumeTemplateResponse),
        (status = 400, description = "Unknown configuration", body = ApiError),
        (status = 409, description = "Name already in use", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn create_volume_template(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Json(req): Json<CreateVolumeTemplateRequest>,
) -> Result<(StatusCode, Json<VolumeTemplateResponse>), ApiError> {
    let template = state
        .cloud
        .templates
        .create_template(&tenant_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(template.into())))
}

/// List the tenant's volume templates
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volume-templates",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID")
    ),
    responses(
        (status = 200, description = "List of templates", body = Vec<VolumeTemplateResponse>)
    ),
    tag = "templates"
)]
pub async fn list_volume_templates(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Vec<VolumeTemplateResponse>>, ApiError> {
    let templates = state.cloud.templates.list_templates(&tenant_id).await?;
    Ok(Json(templates.into_iter().map(Into::into).collect()))
}

/// Get a volume template by ID
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}/volume-templates/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template found", body = VolumeTemplateResponse),
        (status = 404, description = "Template not found", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn get_volume_template(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<VolumeTemplateResponse>, ApiError> {
    let template = state.cloud.templates.get_template(&tenant_id, &id).await?;
    Ok(Json(template.into()))
}

/// Update a volume template
#[utoipa::path(
    patch,
    path = "/v1/tenants/{tenant_id}/volume-templates/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Template ID")
    ),
    request_body = UpdateVolumeTemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = VolumeTemplateResponse),
        (status = 400, description = "Unknown configuration", body = ApiError),
        (status = 404, description = "Template not found", body = ApiError),
        (status = 409, description = "Name already in use", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn update_volume_template(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateVolumeTemplateRequest>,
) -> Result<Json<VolumeTemplateResponse>, ApiError> {
    let template = state
        .cloud
        .templates
        .update_template(&tenant_id, &id, req.into())
        .await?;
    Ok(Json(template.into()))
}

/// Delete a volume template
#[utoipa::path(
    delete,
    path = "/v1/tenants/{tenant_id}/volume-templates/{id}",
    params(
        ("tenant_id" = String, Path, description = "Tenant ID"),
        ("id" = String, Path, description = "Template ID")
    ),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 404, description = "Template not found", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn delete_volume_template(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .cloud
        .templates
        .delete_template(&tenant_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
