#![allow(clippy::unwrap_used)]
// Integration tests for `VcdClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vcloud_api::{
    CreateVAppRequest, Error, EventQuery, ExecuteWorkflowRequest, TransportConfig,
    UploadBlueprintRequest, VcdClient,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, VcdClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = VcdClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

fn token(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

fn task_json(id: &str, status: &str, progress: i64) -> serde_json::Value {
    json!({ "id": id, "status": status, "progress": progress, "operation": "op" })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_installs_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-vcloud-authorization", "tok-123")
                .set_body_json(json!({ "user": "alice", "org": "acme" })),
        )
        .mount(&server)
        .await;

    let (tok, info) = client
        .login("alice", "acme", &token("secret"))
        .await
        .unwrap();

    assert_eq!(tok.expose_secret(), "tok-123");
    assert_eq!(info.user, "alice");
    assert_eq!(info.org, "acme");
    assert!(client.has_token());
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let result = client.login("alice", "acme", &token("wrong")).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_login_without_token_header_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "user": "alice", "org": "acme" })),
        )
        .mount(&server)
        .await;

    let result = client.login("alice", "acme", &token("secret")).await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_validate_token_ok() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/session"))
        .and(header("x-vcloud-authorization", "tok-abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": "bob", "org": "acme", "roles": ["admin"] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let info = client.validate_token(&token("tok-abc")).await.unwrap();
    assert_eq!(info.user, "bob");
    assert_eq!(info.roles, vec!["admin".to_owned()]);
}

#[tokio::test]
async fn test_validate_token_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.validate_token(&token("stale")).await.unwrap_err();
    assert!(err.is_auth_expired(), "got: {err:?}");
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    // Nothing listens on port 9 of localhost.
    let base = Url::parse("http://127.0.0.1:9").unwrap();
    let client = VcdClient::new(base, &TransportConfig::default()).unwrap();

    let err = client.validate_token(&token("any")).await.unwrap_err();
    assert!(err.is_transient(), "got: {err:?}");
    assert!(!err.is_auth_expired());
}

#[tokio::test]
async fn test_privileged_call_without_token() {
    let (_server, client) = setup().await;
    let result = client.list_roles("acme").await;
    assert!(matches!(result, Err(Error::MissingToken)));
}

// ── Task tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_task() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("GET"))
        .and(path("/api/tasks/task-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json("task-1", "running", 40)))
        .mount(&server)
        .await;

    let task = client.get_task("task-1").await.unwrap();
    assert_eq!(task.id, "task-1");
    assert_eq!(task.status, "running");
    assert_eq!(task.progress, Some(40));
    assert_eq!(task.error, None);
}

#[tokio::test]
async fn test_cancel_task_accepted_and_refused() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("POST"))
        .and(path("/api/tasks/ok/action/cancel"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/done/action/cancel"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    assert!(client.cancel_task("ok").await.unwrap());
    assert!(!client.cancel_task("done").await.unwrap());
}

// ── Resource tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_list_vapps() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("GET"))
        .and(path("/api/vdcs/vdc1/vapps"))
        .and(header("x-vcloud-authorization", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "web",
                "id": "urn:vapp:1",
                "status": "POWERED_ON",
                "deployed": true,
                "vms": [{ "name": "web-01", "status": "POWERED_ON", "ip": "10.0.0.5" }]
            },
            { "name": "db", "id": "urn:vapp:2" }
        ])))
        .mount(&server)
        .await;

    let vapps = client.list_vapps("vdc1").await.unwrap();
    assert_eq!(vapps.len(), 2);
    assert_eq!(vapps[0].vms[0].ip.as_deref(), Some("10.0.0.5"));
    assert!(!vapps[1].deployed);
    assert!(vapps[1].vms.is_empty());
}

#[tokio::test]
async fn test_create_vapp_returns_task() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("POST"))
        .and(path("/api/vdcs/vdc1/vapps"))
        .and(body_json(json!({
            "name": "web",
            "catalog": "public",
            "template": "ubuntu"
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(task_json("t-9", "queued", 0)))
        .mount(&server)
        .await;

    let request = CreateVAppRequest {
        name: "web".into(),
        catalog: "public".into(),
        template: "ubuntu".into(),
        vm_name: None,
        network: None,
        cpus: None,
        memory_mb: None,
    };
    let task = client.create_vapp("vdc1", &request).await.unwrap();
    assert_eq!(task.id, "t-9");
    assert_eq!(task.status, "queued");
}

#[tokio::test]
async fn test_not_found_and_api_errors() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("GET"))
        .and(path("/api/orgs/acme/vdcs/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/clusters/c1"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "message": "cluster busy", "code": "BUSY" })),
        )
        .mount(&server)
        .await;

    let err = client.get_vdc("acme", "missing").await.unwrap_err();
    assert!(err.is_not_found(), "got: {err:?}");

    let err = client.delete_cluster("c1").await.unwrap_err();
    match err {
        Error::Api {
            status, message, ..
        } => {
            assert_eq!(status, 409);
            assert_eq!(message, "cluster busy");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("GET"))
        .and(path("/api/orgs/acme/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.list_roles("acme").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}

// ── Blueprint and deployment tests ──────────────────────────────────

#[tokio::test]
async fn test_upload_blueprint_puts_plan() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    let plan = json!({ "node_templates": { "vm": { "type": "compute" } } });
    Mock::given(method("PUT"))
        .and(path("/api/blueprints/web"))
        .and(body_json(json!({ "id": "web", "plan": plan.clone() })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": "web", "created_at": "2024-01-02T10:00:00Z" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .upload_blueprint(&UploadBlueprintRequest {
            id: "web".into(),
            plan,
        })
        .await
        .unwrap();
    assert_eq!(created.id, "web");
    assert_eq!(created.created_at.as_deref(), Some("2024-01-02T10:00:00Z"));
    assert_eq!(created.plan, None);
}

#[tokio::test]
async fn test_delete_deployment_forwards_force_flag() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("DELETE"))
        .and(path("/api/deployments/d1"))
        .and(query_param("force_delete", "true"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_deployment("d1", true).await.unwrap();
}

#[tokio::test]
async fn test_deployment_defaults_missing_fields() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("GET"))
        .and(path("/api/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "d1", "blueprint_id": "web" },
            { "id": "d2", "blueprint_id": "db", "inputs": { "port": 5432 },
              "workflows": [{ "name": "install" }] }
        ])))
        .mount(&server)
        .await;

    let deployments = client.list_deployments().await.unwrap();
    assert_eq!(deployments.len(), 2);
    assert!(deployments[0].inputs.is_empty());
    assert!(deployments[0].workflows.is_empty());
    assert_eq!(deployments[1].inputs["port"], json!(5432));
    assert_eq!(deployments[1].workflows[0].name, "install");
}

#[tokio::test]
async fn test_execute_workflow_returns_task() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("POST"))
        .and(path("/api/executions"))
        .and(body_json(json!({ "deployment_id": "d1", "workflow_id": "install" })))
        .respond_with(ResponseTemplate::new(202).set_body_json(task_json("ex-1", "queued", 0)))
        .expect(1)
        .mount(&server)
        .await;

    let task = client
        .execute_workflow(&ExecuteWorkflowRequest {
            deployment_id: "d1".into(),
            workflow_id: "install".into(),
        })
        .await
        .unwrap();
    assert_eq!(task.id, "ex-1");
    assert_eq!(task.status, "queued");
}

#[tokio::test]
async fn test_cancel_execution_sends_force() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("POST"))
        .and(path("/api/executions/ex-1/cancel"))
        .and(body_json(json!({ "force": true })))
        .respond_with(ResponseTemplate::new(202).set_body_json(task_json("ex-1", "running", 50)))
        .expect(1)
        .mount(&server)
        .await;

    let task = client.cancel_execution("ex-1", true).await.unwrap();
    assert_eq!(task.progress, Some(50));
}

#[tokio::test]
async fn test_list_events_pages_by_query() {
    let (server, client) = setup().await;
    client.set_token(token("tok"));

    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(query_param("execution_id", "ex-1"))
        .and(query_param("from", "10"))
        .and(query_param("size", "5"))
        .and(query_param("include_logs", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "event_type": "workflow_started", "timestamp": "2024-01-02T10:00:00Z",
                  "message": { "text": "Starting 'install'" } }
            ],
            "total": 11
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client
        .list_events(
            "ex-1",
            EventQuery {
                from: 10,
                size: 5,
                include_logs: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 11);
    assert_eq!(page.items.len(), 1);
    assert_eq!(
        page.items[0].message.as_ref().and_then(|m| m.text.as_deref()),
        Some("Starting 'install'")
    );
}
