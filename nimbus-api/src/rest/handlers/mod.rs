mod images;
mod jobs;
mod templates;
mod volumes;

use axum::{Json, http::StatusCode, response::IntoResponse};
use nimbus_core::store::StoreError;
use nimbus_core::{Cloud, CloudError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use images::*;
pub use jobs::*;
pub use templates::*;
pub use volumes::*;

/// Shared application state
pub struct AppState {
    pub cloud: Cloud,
}

/// API error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub code: u32,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            404 => StatusCode::NOT_FOUND,
            409 => StatusCode::CONFLICT,
            400 => StatusCode::BAD_REQUEST,
            502 => StatusCode::BAD_GATEWAY,
            503 => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl From<CloudError> for ApiError {
    fn from(e: CloudError) -> Self {
        let code = match &e {
            CloudError::NotFound(_) => 404,
            CloudError::InvalidRequest(_) => 400,
            CloudError::ResourceConflict(_) => 409,
            CloudError::ProviderUnavailable(_) | CloudError::ConnectorUnavailable(_) => 503,
            CloudError::ProviderOperationFailed(_) => 502,
            CloudError::Store(StoreError::NotFound(_)) => 404,
            CloudError::Store(StoreError::Conflict(_)) => 409,
            CloudError::Store(StoreError::Internal(_)) => 500,
        };
        ApiError {
            error: e.to_string(),
            code,
        }
    }
}

/// Parent job query accepted by every job-producing operation
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ParentJobQuery {
    /// Job this operation is a step of
    pub parent_job_id: Option<String>,
}

/// Name, description and properties; absent fields are left untouched
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAttributesRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Option<std::collections::HashMap<String, String>>,
}

impl From<UpdateAttributesRequest> for nimbus_core::model::AttributeUpdate {
    fn from(req: UpdateAttributesRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            properties: req.properties,
        }
    }
}

/// Placement of a provider-backed resource
#[derive(Serialize, ToSchema)]
pub struct PlacementResponse {
    pub account_id: String,
    pub provider_type: String,
    pub location: String,
}

impl From<nimbus_core::model::Placement> for PlacementResponse {
    fn from(p: nimbus_core::model::Placement) -> Self {
        Self {
            account_id: p.account_id,
            provider_type: p.provider_type,
            location: p.location,
        }
    }
}

/// Version information
#[derive(Serialize, ToSchema)]
pub struct VersionInfo {
    pub version: String,
}

/// Get service version
#[utoipa::path(
    get,
    path = "/v1/version",
    responses(
        (status = 200, description = "Service version", body = VersionInfo)
    ),
    tag = "system"
)]
pub async fn get_version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
