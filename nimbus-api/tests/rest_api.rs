//! REST API integration tests for nimbus-api.
//!
//! These tests drive every endpoint against an in-memory store and the mock
//! provider, with the completion listener running.

mod common;

use nimbus_core::connector::{MockBehavior, MockOperation, ProviderJobState};
use serde_json::{Value, json};
use std::time::Duration;

const TENANT: &str = "/tenants/acme";

fn volume_body(name: &str) -> Value {
    json!({
        "name": name,
        "capacity_kb": 1048576,
        "format": "raw"
    })
}

/// Create a volume that completes immediately and return its id.
async fn create_volume(server: &common::TestServer, name: &str) -> String {
    let response = server
        .post_json(&format!("{TENANT}/volumes"), &volume_body(name))
        .await;
    assert_eq!(response.status(), 200);
    let job: Value = response.json().await.unwrap();
    assert_eq!(job["state"], "success");
    job["target_resource"]["id"].as_str().unwrap().to_string()
}

/// Poll a job until it leaves the running state.
async fn wait_for_job(server: &common::TestServer, job_id: &str) -> Value {
    for _ in 0..100 {
        let job: Value = server
            .get(&format!("{TENANT}/jobs/{job_id}"))
            .await
            .json()
            .await
            .unwrap();
        if job["state"] != "running" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {job_id} never finished");
}

// =============================================================================
// Version Endpoint
// =============================================================================

#[tokio::test]
async fn test_get_version() {
    let server = common::TestServer::spawn().await;

    let response = server.get("/version").await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body["version"].is_string());
    assert!(!body["version"].as_str().unwrap().is_empty());

    server.shutdown().await;
}

// =============================================================================
// Volume Endpoints
// =============================================================================

#[tokio::test]
async fn test_create_volume_immediate() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post_json(&format!("{TENANT}/volumes"), &volume_body("data"))
        .await;
    assert_eq!(response.status(), 200);

    let job: Value = response.json().await.unwrap();
    assert_eq!(job["action"], "create");
    assert_eq!(job["state"], "success");
    assert_eq!(job["tenant_id"], "acme");
    assert_eq!(job["target_resource"]["kind"], "volume");
    assert!(job["provider_assigned_id"].is_string());

    let volume_id = job["target_resource"]["id"].as_str().unwrap();
    assert_eq!(job["affected_resources"][0]["id"], volume_id);
    let response = server.get(&format!("{TENANT}/volumes/{volume_id}")).await;
    assert_eq!(response.status(), 200);

    let volume: Value = response.json().await.unwrap();
    assert_eq!(volume["name"], "data");
    assert_eq!(volume["state"], "available");
    assert_eq!(volume["capacity_kb"], 1048576);
    assert_eq!(volume["placement"]["account_id"], "lab");
    assert_eq!(volume["placement"]["location"], "zone-a");
    assert!(volume["created"].is_string());

    server.shutdown().await;
}

#[tokio::test]
async fn test_create_volume_placement_hint() {
    let server = common::TestServer::spawn().await;

    let body = json!({
        "name": "pinned",
        "capacity_kb": 1024,
        "properties": { "location": "zone-b" }
    });
    let response = server.post_json(&format!("{TENANT}/volumes"), &body).await;
    assert_eq!(response.status(), 200);
    let job: Value = response.json().await.unwrap();
    let volume_id = job["target_resource"]["id"].as_str().unwrap();

    let volume: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(volume["placement"]["location"], "zone-b");

    // Nothing lives in zone-c
    let body = json!({
        "capacity_kb": 1024,
        "properties": { "location": "zone-c" }
    });
    let response = server.post_json(&format!("{TENANT}/volumes"), &body).await;
    assert_eq!(response.status(), 503);

    server.shutdown().await;
}

#[tokio::test]
async fn test_create_volume_zero_capacity() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post_json(
            &format!("{TENANT}/volumes"),
            &json!({ "name": "empty", "capacity_kb": 0 }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 400);
    assert!(body["error"].is_string());

    // Nothing was recorded
    let jobs: Value = server
        .get(&format!("{TENANT}/jobs"))
        .await
        .json()
        .await
        .unwrap();
    assert!(jobs.as_array().unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_create_volume_provider_failure() {
    let server = common::TestServer::spawn().await;
    server
        .mock
        .set_behavior(MockOperation::CreateVolume, MockBehavior::Fail)
        .await;

    let response = server
        .post_json(&format!("{TENANT}/volumes"), &volume_body("doomed"))
        .await;
    assert_eq!(response.status(), 502);

    let volumes: Value = server
        .get(&format!("{TENANT}/volumes"))
        .await
        .json()
        .await
        .unwrap();
    assert!(volumes.as_array().unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_pending_create_completes_through_listener() {
    let server = common::TestServer::spawn().await;
    server
        .mock
        .set_behavior(MockOperation::CreateVolume, MockBehavior::Pending)
        .await;

    let response = server
        .post_json(&format!("{TENANT}/volumes"), &volume_body("slow"))
        .await;
    assert_eq!(response.status(), 202);

    let job: Value = response.json().await.unwrap();
    assert_eq!(job["state"], "running");
    let job_id = job["id"].as_str().unwrap();
    let provider_job_id = job["provider_assigned_id"].as_str().unwrap();
    let volume_id = job["target_resource"]["id"].as_str().unwrap();

    let volume: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(volume["state"], "creating");

    // Still running at the provider
    let response = server
        .post(&format!("/notifications/jobs/{provider_job_id}"))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "pending");

    assert!(
        server
            .mock
            .complete_job(provider_job_id, ProviderJobState::Success)
            .await
    );

    let job = wait_for_job(&server, job_id).await;
    assert_eq!(job["state"], "success");
    assert!(job["time_of_status_change"].is_string());

    let volume: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(volume["state"], "available");
    assert!(volume["created"].is_string());

    // Duplicate notification changes nothing
    let body: Value = server
        .post(&format!("/notifications/jobs/{provider_job_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["outcome"], "already_applied");
    assert_eq!(body["state"], "success");

    server.shutdown().await;
}

#[tokio::test]
async fn test_pending_create_fails() {
    let server = common::TestServer::spawn().await;
    server
        .mock
        .set_behavior(MockOperation::CreateVolume, MockBehavior::Pending)
        .await;

    let job: Value = server
        .post_json(&format!("{TENANT}/volumes"), &volume_body("flaky"))
        .await
        .json()
        .await
        .unwrap();
    let job_id = job["id"].as_str().unwrap();
    let provider_job_id = job["provider_assigned_id"].as_str().unwrap();
    let volume_id = job["target_resource"]["id"].as_str().unwrap();

    server
        .mock
        .complete_job(provider_job_id, ProviderJobState::Failed)
        .await;

    let job = wait_for_job(&server, job_id).await;
    assert_eq!(job["state"], "failed");
    assert!(job["status_message"].is_string());

    let volume: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(volume["state"], "error");

    server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_notification_is_acknowledged() {
    let server = common::TestServer::spawn().await;

    let response = server.post("/notifications/jobs/never-submitted").await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "not_applied");

    server.shutdown().await;
}

#[tokio::test]
async fn test_list_and_update_volume() {
    let server = common::TestServer::spawn().await;
    let volume_id = create_volume(&server, "data").await;
    create_volume(&server, "logs").await;

    let volumes: Value = server
        .get(&format!("{TENANT}/volumes"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(volumes.as_array().unwrap().len(), 2);

    let response = server
        .patch_json(
            &format!("{TENANT}/volumes/{volume_id}"),
            &json!({ "description": "primary data", "properties": { "team": "storage" } }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let job: Value = response.json().await.unwrap();
    assert_eq!(job["action"], "update");
    assert_eq!(job["state"], "success");

    let volume: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(volume["name"], "data");
    assert_eq!(volume["description"], "primary data");
    assert_eq!(volume["properties"]["team"], "storage");

    server.shutdown().await;
}

#[tokio::test]
async fn test_delete_volume() {
    let server = common::TestServer::spawn().await;
    let volume_id = create_volume(&server, "data").await;

    let response = server.delete(&format!("{TENANT}/volumes/{volume_id}")).await;
    assert_eq!(response.status(), 200);
    let job: Value = response.json().await.unwrap();
    assert_eq!(job["action"], "delete");
    assert_eq!(job["state"], "success");

    let response = server.get(&format!("{TENANT}/volumes/{volume_id}")).await;
    assert_eq!(response.status(), 404);

    let volumes: Value = server
        .get(&format!("{TENANT}/volumes"))
        .await
        .json()
        .await
        .unwrap();
    assert!(volumes.as_array().unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_pending_delete_volume() {
    let server = common::TestServer::spawn().await;
    let volume_id = create_volume(&server, "data").await;
    server
        .mock
        .set_behavior(MockOperation::DeleteVolume, MockBehavior::Pending)
        .await;

    let response = server.delete(&format!("{TENANT}/volumes/{volume_id}")).await;
    assert_eq!(response.status(), 202);
    let job: Value = response.json().await.unwrap();
    let job_id = job["id"].as_str().unwrap();
    let provider_job_id = job["provider_assigned_id"].as_str().unwrap();

    let volume: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(volume["state"], "deleting");

    server
        .mock
        .complete_job(provider_job_id, ProviderJobState::Success)
        .await;
    let job = wait_for_job(&server, job_id).await;
    assert_eq!(job["state"], "success");

    let response = server.get(&format!("{TENANT}/volumes/{volume_id}")).await;
    assert_eq!(response.status(), 404);

    server.shutdown().await;
}

#[tokio::test]
async fn test_volume_tenant_isolation() {
    let server = common::TestServer::spawn().await;
    let volume_id = create_volume(&server, "private").await;

    let response = server
        .get(&format!("/tenants/globex/volumes/{volume_id}"))
        .await;
    assert_eq!(response.status(), 404);

    let response = server
        .delete(&format!("/tenants/globex/volumes/{volume_id}"))
        .await;
    assert_eq!(response.status(), 404);

    let volumes: Value = server
        .get("/tenants/globex/volumes")
        .await
        .json()
        .await
        .unwrap();
    assert!(volumes.as_array().unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_get_volume_not_found() {
    let server = common::TestServer::spawn().await;

    let response = server.get(&format!("{TENANT}/volumes/nonexistent")).await;
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 404);

    server.shutdown().await;
}

// =============================================================================
// Parent Jobs
// =============================================================================

#[tokio::test]
async fn test_parent_job_links_children() {
    let server = common::TestServer::spawn().await;

    let parent: Value = server
        .post_json(&format!("{TENANT}/volumes"), &volume_body("parent"))
        .await
        .json()
        .await
        .unwrap();
    let parent_id = parent["id"].as_str().unwrap();

    let response = server
        .post_json(
            &format!("{TENANT}/volumes?parent_job_id={parent_id}"),
            &volume_body("child"),
        )
        .await;
    assert_eq!(response.status(), 200);
    let child: Value = response.json().await.unwrap();
    assert_eq!(child["parent_job_id"], parent_id);

    let children: Value = server
        .get(&format!("{TENANT}/jobs/{parent_id}/children"))
        .await
        .json()
        .await
        .unwrap();
    let children = children.as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["id"], child["id"]);

    // Unknown parent is rejected before anything reaches the provider
    let response = server
        .post_json(
            &format!("{TENANT}/volumes?parent_job_id=missing"),
            &volume_body("orphan"),
        )
        .await;
    assert_eq!(response.status(), 404);
    assert!(server.mock.running_jobs().await.is_empty());

    server.shutdown().await;
}

// =============================================================================
// Templates
// =============================================================================

#[tokio::test]
async fn test_volume_from_template() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post_json(
            &format!("{TENANT}/volume-configs"),
            &json!({ "name": "small", "capacity_kb": 2048, "format": "qcow2" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let config: Value = response.json().await.unwrap();
    let config_id = config["id"].as_str().unwrap();

    let response = server
        .post_json(
            &format!("{TENANT}/volume-templates"),
            &json!({
                "name": "web",
                "description": "web tier disk",
                "properties": { "tier": "web" },
                "volume_config_id": config_id
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let template: Value = response.json().await.unwrap();
    let template_id = template["id"].as_str().unwrap();

    let response = server
        .post_json(
            &format!("{TENANT}/volumes/from-template"),
            &json!({ "template_id": template_id, "name": "web-1" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let job: Value = response.json().await.unwrap();
    let volume_id = job["target_resource"]["id"].as_str().unwrap();

    let volume: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(volume["name"], "web-1");
    assert_eq!(volume["description"], "web tier disk");
    assert_eq!(volume["capacity_kb"], 2048);
    assert_eq!(volume["properties"]["tier"], "web");

    server.shutdown().await;
}

#[tokio::test]
async fn test_volume_config_conflicts() {
    let server = common::TestServer::spawn().await;
    let body = json!({ "name": "small", "capacity_kb": 2048 });

    let response = server
        .post_json(&format!("{TENANT}/volume-configs"), &body)
        .await;
    assert_eq!(response.status(), 201);
    let config: Value = response.json().await.unwrap();
    let config_id = config["id"].as_str().unwrap();

    let response = server
        .post_json(&format!("{TENANT}/volume-configs"), &body)
        .await;
    assert_eq!(response.status(), 409);

    // Same name is fine for another tenant
    let response = server.post_json("/tenants/globex/volume-configs", &body).await;
    assert_eq!(response.status(), 201);

    // A referenced configuration cannot be deleted
    let template: Value = server
        .post_json(
            &format!("{TENANT}/volume-templates"),
            &json!({ "name": "t", "volume_config_id": config_id }),
        )
        .await
        .json()
        .await
        .unwrap();
    let response = server
        .delete(&format!("{TENANT}/volume-configs/{config_id}"))
        .await;
    assert_eq!(response.status(), 409);

    let template_id = template["id"].as_str().unwrap();
    let response = server
        .delete(&format!("{TENANT}/volume-templates/{template_id}"))
        .await;
    assert_eq!(response.status(), 204);
    let response = server
        .delete(&format!("{TENANT}/volume-configs/{config_id}"))
        .await;
    assert_eq!(response.status(), 204);

    server.shutdown().await;
}

#[tokio::test]
async fn test_update_volume_config_and_template() {
    let server = common::TestServer::spawn().await;

    let config: Value = server
        .post_json(
            &format!("{TENANT}/volume-configs"),
            &json!({ "name": "small", "capacity_kb": 2048 }),
        )
        .await
        .json()
        .await
        .unwrap();
    let config_id = config["id"].as_str().unwrap();

    let response = server
        .patch_json(
            &format!("{TENANT}/volume-configs/{config_id}"),
            &json!({ "capacity_kb": 4096 }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let config: Value = response.json().await.unwrap();
    assert_eq!(config["capacity_kb"], 4096);
    assert_eq!(config["name"], "small");

    let response = server
        .patch_json(
            &format!("{TENANT}/volume-configs/{config_id}"),
            &json!({ "capacity_kb": 0 }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let template: Value = server
        .post_json(
            &format!("{TENANT}/volume-templates"),
            &json!({ "name": "t", "volume_config_id": config_id }),
        )
        .await
        .json()
        .await
        .unwrap();
    let template_id = template["id"].as_str().unwrap();

    let response = server
        .patch_json(
            &format!("{TENANT}/volume-templates/{template_id}"),
            &json!({ "volume_config_id": "missing" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let templates: Value = server
        .get(&format!("{TENANT}/volume-templates"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(templates.as_array().unwrap().len(), 1);
    assert_eq!(templates[0]["volume_config_id"], config_id);

    server.shutdown().await;
}

// =============================================================================
// Volume Images & Snapshots
// =============================================================================

#[tokio::test]
async fn test_volume_image_crud() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post_json(
            &format!("{TENANT}/volume-images"),
            &json!({ "name": "ubuntu", "image_location": "https://images.example/ubuntu.raw", "bootable": true }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let job: Value = response.json().await.unwrap();
    assert_eq!(job["target_resource"]["kind"], "volume_image");
    let image_id = job["target_resource"]["id"].as_str().unwrap();

    let image: Value = server
        .get(&format!("{TENANT}/volume-images/{image_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(image["name"], "ubuntu");
    assert_eq!(image["state"], "available");
    assert_eq!(image["bootable"], true);

    let response = server
        .patch_json(
            &format!("{TENANT}/volume-images/{image_id}"),
            &json!({ "name": "ubuntu-24.04" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let images: Value = server
        .get(&format!("{TENANT}/volume-images"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(images.as_array().unwrap().len(), 1);
    assert_eq!(images[0]["name"], "ubuntu-24.04");

    let response = server
        .delete(&format!("{TENANT}/volume-images/{image_id}"))
        .await;
    assert_eq!(response.status(), 200);
    let response = server
        .get(&format!("{TENANT}/volume-images/{image_id}"))
        .await;
    assert_eq!(response.status(), 404);

    server.shutdown().await;
}

#[tokio::test]
async fn test_snapshot_volume() {
    let server = common::TestServer::spawn().await;
    let volume_id = create_volume(&server, "data").await;

    let response = server
        .post_json(
            &format!("{TENANT}/volumes/{volume_id}/images"),
            &json!({ "name": "nightly" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let job: Value = response.json().await.unwrap();
    assert_eq!(job["target_resource"]["kind"], "volume_image");
    let image_id = job["target_resource"]["id"].as_str().unwrap();
    assert_eq!(job["affected_resources"][0]["id"], image_id);
    assert_eq!(job["affected_resources"][1]["id"], volume_id.as_str());

    let links: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}/images"))
        .await
        .json()
        .await
        .unwrap();
    let links = links.as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["volume_image_id"], image_id);
    assert_eq!(links[0]["state"], "available");
    let link_id = links[0]["id"].as_str().unwrap();

    let image: Value = server
        .get(&format!("{TENANT}/volume-images/{image_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(image["placement"]["account_id"], "lab");

    let response = server
        .patch_json(
            &format!("{TENANT}/volumes/{volume_id}/images/{link_id}"),
            &json!({ "name": "nightly-1" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let link: Value = response.json().await.unwrap();
    assert_eq!(link["name"], "nightly-1");

    // Removing the entry keeps the image
    let response = server
        .delete(&format!("{TENANT}/volumes/{volume_id}/images/{link_id}"))
        .await;
    assert_eq!(response.status(), 200);
    let response = server
        .get(&format!("{TENANT}/volumes/{volume_id}/images/{link_id}"))
        .await;
    assert_eq!(response.status(), 404);
    let response = server
        .get(&format!("{TENANT}/volume-images/{image_id}"))
        .await;
    assert_eq!(response.status(), 200);

    server.shutdown().await;
}

#[tokio::test]
async fn test_pending_snapshot_completes() {
    let server = common::TestServer::spawn().await;
    let volume_id = create_volume(&server, "data").await;
    server
        .mock
        .set_behavior(MockOperation::CreateVolumeSnapshot, MockBehavior::Pending)
        .await;

    let response = server
        .post_json(
            &format!("{TENANT}/volumes/{volume_id}/images"),
            &json!({ "name": "slow" }),
        )
        .await;
    assert_eq!(response.status(), 202);
    let job: Value = response.json().await.unwrap();
    let job_id = job["id"].as_str().unwrap();
    let provider_job_id = job["provider_assigned_id"].as_str().unwrap();

    let links: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}/images"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(links[0]["state"], "snapshotting");

    server
        .mock
        .complete_job(provider_job_id, ProviderJobState::Success)
        .await;
    let job = wait_for_job(&server, job_id).await;
    assert_eq!(job["state"], "success");

    let links: Value = server
        .get(&format!("{TENANT}/volumes/{volume_id}/images"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(links[0]["state"], "available");

    server.shutdown().await;
}

#[tokio::test]
async fn test_snapshot_requires_available_volume() {
    let server = common::TestServer::spawn().await;
    server
        .mock
        .set_behavior(MockOperation::CreateVolume, MockBehavior::Pending)
        .await;

    let job: Value = server
        .post_json(&format!("{TENANT}/volumes"), &volume_body("busy"))
        .await
        .json()
        .await
        .unwrap();
    let volume_id = job["target_resource"]["id"].as_str().unwrap();

    let response = server
        .post_json(
            &format!("{TENANT}/volumes/{volume_id}/images"),
            &json!({ "name": "too-early" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = server
        .post_json(
            &format!("{TENANT}/volumes/nonexistent/images"),
            &json!({ "name": "nowhere" }),
        )
        .await;
    assert_eq!(response.status(), 404);

    server.shutdown().await;
}

// =============================================================================
// Jobs
// =============================================================================

#[tokio::test]
async fn test_list_jobs_is_tenant_scoped() {
    let server = common::TestServer::spawn().await;
    create_volume(&server, "a").await;
    create_volume(&server, "b").await;

    let jobs: Value = server
        .get(&format!("{TENANT}/jobs"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(jobs.as_array().unwrap().len(), 2);
    let job_id = jobs[0]["id"].as_str().unwrap();

    let jobs: Value = server
        .get("/tenants/globex/jobs")
        .await
        .json()
        .await
        .unwrap();
    assert!(jobs.as_array().unwrap().is_empty());

    let response = server.get(&format!("/tenants/globex/jobs/{job_id}")).await;
    assert_eq!(response.status(), 404);

    server.shutdown().await;
}

#[tokio::test]
async fn test_openapi_document() {
    let server = common::TestServer::spawn().await;

    let response = server
        .client
        .get(format!("http://{}/api-docs/openapi.json", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let doc: Value = response.json().await.unwrap();
    assert!(doc["paths"]["/v1/tenants/{tenant_id}/volumes"].is_object());
    assert!(doc["paths"]["/v1/notifications/jobs/{provider_job_id}"].is_object());

    server.shutdown().await;
}
