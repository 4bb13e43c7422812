use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{self, AppState};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "nimbus API Server",
        version = "0.1.0",
        description = "REST API for provider-backed volumes, volume images and the jobs that track them. Operations on a provider return a job; completions arrive later through the notification endpoint or the internal listener.",
        license(name = "MIT")
    ),
    tags(
        (name = "system", description = "System information"),
        (name = "volumes", description = "Volume lifecycle"),
        (name = "volume-images", description = "Volume images and volume snapshots"),
        (name = "templates", description = "Volume configurations and templates"),
        (name = "jobs", description = "Job queries"),
        (name = "notifications", description = "Provider job completion callbacks")
    ),
    paths(
        handlers::get_version,
        // Volumes
        handlers::create_volume,
        handlers::create_volume_from_template,
        handlers::list_volumes,
        handlers::get_volume,
        handlers::update_volume,
        handlers::delete_volume,
        // Volume images
        handlers::create_volume_image,
        handlers::list_volume_images,
        handlers::get_volume_image,
        handlers::update_volume_image,
        handlers::delete_volume_image,
        // Snapshots
        handlers::create_volume_snapshot,
        handlers::list_volume_snapshots,
        handlers::get_volume_snapshot,
        handlers::update_volume_snapshot,
        handlers::remove_volume_snapshot,
        // Configurations & templates
        handlers::create_volume_config,
        handlers::list_volume_configs,
        handlers::get_volume_config,
        handlers::update_volume_config,
        handlers::delete_volume_config,
        handlers::create_volume_template,
        handlers::list_volume_templates,
        handlers::get_volume_template,
        handlers::update_volume_template,
        handlers::delete_volume_template,
        // Jobs
        handlers::list_jobs,
        handlers::get_job,
        handlers::list_child_jobs,
        handlers::notify_job_completion,
    ),
    components(schemas(
        handlers::VersionInfo,
        handlers::ApiError,
        handlers::ParentJobQuery,
        handlers::UpdateAttributesRequest,
        handlers::PlacementResponse,
        handlers::CreateVolumeRequest,
        handlers::CreateVolumeFromTemplateRequest,
        handlers::VolumeResponse,
        handlers::CreateVolumeImageRequest,
        handlers::VolumeImageResponse,
        handlers::VolumeSnapshotResponse,
        handlers::CreateVolumeConfigRequest,
        handlers::UpdateVolumeConfigRequest,
        handlers::VolumeConfigResponse,
        handlers::CreateVolumeTemplateRequest,
        handlers::UpdateVolumeTemplateRequest,
        handlers::VolumeTemplateResponse,
        handlers::ResourceRefResponse,
        handlers::JobResponse,
        handlers::CompletionResponse,
    ))
)]
pub struct ApiDoc;

pub fn create_router(state: Arc<AppState>) -> Router {
    let global_routes = Router::new()
        .route("/version", get(handlers::get_version))
        .route(
            "/notifications/jobs/{provider_job_id}",
            post(handlers::notify_job_completion),
        );

    // Tenant-scoped routes: /v1/tenants/{tenant_id}/...
    let tenant_routes = Router::new()
        // Volumes
        .route(
            "/volumes",
            get(handlers::list_volumes).post(handlers::create_volume),
        )
        .route(
            "/volumes/from-template",
            post(handlers::create_volume_from_template),
        )
        .route(
            "/volumes/{id}",
            get(handlers::get_volume)
                .patch(handlers::update_volume)
                .delete(handlers::delete_volume),
        )
        .route(
            "/volumes/{id}/images",
            get(handlers::list_volume_snapshots).post(handlers::create_volume_snapshot),
        )
        .route(
            "/volumes/{id}/images/{link_id}",
            get(handlers::get_volume_snapshot)
                .patch(handlers::update_volume_snapshot)
                .delete(handlers::remove_volume_snapshot),
        )
        // Volume images
        .route(
            "/volume-images",
            get(handlers::list_volume_images).post(handlers::create_volume_image),
        )
        .route(
            "/volume-images/{id}",
            get(handlers::get_volume_image)
                .patch(handlers::update_volume_image)
                .delete(handlers::delete_volume_image),
        )
        // Configurations & templates
        .route(
            "/volume-configs",
            get(handlers::list_volume_configs).post(handlers::create_volume_config),
        )
        .route(
            "/volume-configs/{id}",
            get(handlers::get_volume_config)
                .patch(handlers::update_volume_config)
                .delete(handlers::delete_volume_config),
        )
        .route(
            "/volume-templates",
            get(handlers::list_volume_templates).post(handlers::create_volume_template),
        )
        .route(
            "/volume-templates/{id}",
            get(handlers::get_volume_template)
                .patch(handlers::update_volume_template)
                .delete(handlers::delete_volume_template),
        )
        // Jobs
        .route("/jobs", get(handlers::list_jobs))
        .route("/jobs/{id}", get(handlers::get_job))
        .route("/jobs/{id}/children", get(handlers::list_child_jobs));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/v1", global_routes)
        .nest("/v1/tenants/{tenant_id}", tenant_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
