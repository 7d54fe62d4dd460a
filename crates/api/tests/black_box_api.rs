use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use staffsight_api::app::{self, AppServices};
use staffsight_api::config::ApiConfig;
use staffsight_assignments::{FormDefinition, FormId, FormVersionId, FormVisibility};
use staffsight_auth::{JwtClaims, PrincipalId, Role};
use staffsight_core::TenantId;
use staffsight_vault::SecretCipher;

const JWT_SECRET: &str = "black-box-secret";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = ApiConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            jwt_secret: JWT_SECRET.to_string(),
            callback_base_url: "https://app.example".to_string(),
            n8n_fallback_url: None,
        };
        let services =
            app::services::build_services_with_cipher(&config, SecretCipher::from_key([9u8; 32]))
                .expect("failed to build services");
        let router = app::build_app_with_services(JWT_SECRET, services.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug, Clone)]
struct RecordedHook {
    headers: Vec<(String, String)>,
    body: serde_json::Value,
}

type HookLog = Arc<Mutex<Vec<RecordedHook>>>;

async fn record_hook(
    State(log): State<HookLog>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    log.lock().unwrap().push(RecordedHook { headers, body });
    StatusCode::OK
}

/// A stand-in for the external workflow engine: accepts the dispatch POST
/// and records what it saw.
async fn spawn_fake_n8n() -> (String, HookLog, tokio::task::JoinHandle<()>) {
    let log: HookLog = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/hook", post(record_hook))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind fake n8n");
    let url = format!("http://{}/hook", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (url, log, handle)
}

fn mint_jwt(tenant_id: TenantId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        tenant_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn admin_jwt(tenant_id: TenantId) -> String {
    mint_jwt(tenant_id, vec![Role::staff(), Role::admin()])
}

async fn put_secret(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    key: &str,
    value: &str,
    sensitive: bool,
) {
    let response = client
        .put(format!("{base_url}/api/v1/admin/secrets"))
        .bearer_auth(token)
        .json(&json!({
            "service": "n8n",
            "key": key,
            "value": value,
            "sensitive": sensitive,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

async fn put_analysis_content(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    analysis_id: &str,
) {
    let response = client
        .put(format!("{base_url}/api/v1/analyses/{analysis_id}/content"))
        .bearer_auth(token)
        .json(&json!({
            "subject": { "employeeName": "Sam Doe", "position": "Engineer" },
            "transcripts": ["interview transcript", "   "],
            "documents": ["cv text"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn health_is_public_and_staff_routes_require_auth() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/api/v1/whoami", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let tenant = TenantId::new();
    let token = mint_jwt(tenant, vec![Role::staff()]);
    let response = client
        .get(format!("{}/api/v1/whoami", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["tenant_id"], tenant.to_string());
}

#[tokio::test]
async fn dossier_lifecycle_end_to_end() {
    let server = TestServer::spawn().await;
    let (hook_url, hook_log, _n8n) = spawn_fake_n8n().await;
    let client = reqwest::Client::new();

    let tenant = TenantId::new();
    let token = admin_jwt(tenant);
    let analysis_id = uuid::Uuid::now_v7().to_string();

    put_analysis_content(&client, &server.base_url, &token, &analysis_id).await;
    put_secret(&client, &server.base_url, &token, "webhook_url", &hook_url, false).await;
    put_secret(&client, &server.base_url, &token, "auth_header_value", "cb-secret", true).await;

    // Request a dossier job.
    let response = client
        .post(format!("{}/api/v1/analyses/{analysis_id}/dossier", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "prompt": "summarize this employee" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = response.json().await.unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();

    // A second request while the first is in flight conflicts.
    let response = client
        .post(format!("{}/api/v1/analyses/{analysis_id}/dossier", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "prompt": "again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "already_in_progress");

    // Poll: processing, startedAt stamped, not finished.
    let response = client
        .get(format!("{}/api/v1/analyses/{analysis_id}/dossier", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(summary["status"], "processing");
    assert!(!summary["started_at"].is_null());
    assert!(summary["completed_at"].is_null());

    // The workflow engine received exactly one signed request with the
    // payload envelope; blank transcripts were filtered out.
    {
        let hooks = hook_log.lock().unwrap();
        assert_eq!(hooks.len(), 1);
        let hook = &hooks[0];
        assert!(hook
            .headers
            .iter()
            .any(|(name, value)| name == "authorization" && value == "cb-secret"));
        assert_eq!(hook.body["jobId"], job_id);
        assert_eq!(hook.body["transcripts"], json!(["interview transcript"]));
        assert_eq!(hook.body["subject"]["employeeName"], "Sam Doe");
        assert_eq!(
            hook.body["callbackUrl"],
            "https://app.example/webhooks/dossier-callback"
        );
    }

    // Callback with a wrong credential is rejected.
    let response = client
        .post(format!("{}/webhooks/dossier-callback", server.base_url))
        .header("authorization", "wrong")
        .json(&json!({
            "jobId": job_id,
            "organizationId": tenant,
            "status": "completed",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The real callback completes the job.
    let response = client
        .post(format!("{}/webhooks/dossier-callback", server.base_url))
        .header("authorization", "cb-secret")
        .json(&json!({
            "jobId": job_id,
            "organizationId": tenant,
            "status": "completed",
            "resultData": { "dossier": "first version" },
            "modelUsed": "gpt-4o",
            "tokenUsage": { "prompt_tokens": 1200, "completion_tokens": 600 },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["applied"], true);

    let response = client
        .get(format!("{}/api/v1/analyses/{analysis_id}/dossier", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(summary["status"], "completed");
    assert_eq!(summary["result"]["dossier"], "first version");
    assert!(!summary["completed_at"].is_null());

    // Redelivery is a no-op and never overwrites the stored result.
    let response = client
        .post(format!("{}/webhooks/dossier-callback", server.base_url))
        .header("authorization", "cb-secret")
        .json(&json!({
            "jobId": job_id,
            "organizationId": tenant,
            "status": "failed",
            "errorMessage": "late duplicate",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["applied"], false);

    let response = client
        .get(format!("{}/api/v1/analyses/{analysis_id}/dossier", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(summary["status"], "completed");
    assert_eq!(summary["result"]["dossier"], "first version");
}

#[tokio::test]
async fn unconfigured_dispatch_fails_and_retry_creates_a_fresh_job() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let tenant = TenantId::new();
    let token = admin_jwt(tenant);
    let analysis_id = uuid::Uuid::now_v7().to_string();
    put_analysis_content(&client, &server.base_url, &token, &analysis_id).await;

    // No secrets configured: the job is created but lands in failed.
    let response = client
        .post(format!("{}/api/v1/analyses/{analysis_id}/dossier", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "prompt": "summarize" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let failed_job_id = response.json::<serde_json::Value>().await.unwrap()["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = client
        .get(format!("{}/api/v1/analyses/{analysis_id}/dossier", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(summary["status"], "failed");
    assert!(summary["error_message"]
        .as_str()
        .unwrap()
        .contains("not configured"));

    // Configure the integration, then retry the failed job.
    let (hook_url, _hook_log, _n8n) = spawn_fake_n8n().await;
    put_secret(&client, &server.base_url, &token, "webhook_url", &hook_url, false).await;
    put_secret(&client, &server.base_url, &token, "auth_header_value", "cb-secret", true).await;

    let response = client
        .post(format!("{}/api/v1/dossier-jobs/{failed_job_id}/retry", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let retried_job_id = response.json::<serde_json::Value>().await.unwrap()["job_id"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(retried_job_id, failed_job_id);

    let response = client
        .get(format!("{}/api/v1/analyses/{analysis_id}/dossier", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(summary["status"], "processing");
    assert_eq!(summary["job_id"], retried_job_id);

    // Retrying a job that is not failed conflicts.
    let response = client
        .post(format!("{}/api/v1/dossier-jobs/{retried_job_id}/retry", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "not_failed");
}

#[tokio::test]
async fn form_assignment_lifecycle_over_http() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let tenant = TenantId::new();
    let token = admin_jwt(tenant);
    let analysis_id = uuid::Uuid::now_v7().to_string();

    // Seed the form catalog (catalog administration is outside this core).
    let form = FormDefinition {
        id: FormId::new(),
        current_version: FormVersionId::new(),
        active: true,
        visibility: FormVisibility::Global,
    };
    server.services.catalog.upsert(form.clone());

    let recipient_id = uuid::Uuid::now_v7().to_string();
    let response = client
        .put(format!("{}/api/v1/employees/{recipient_id}/contact", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "email": "sam@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Create: delivered immediately, so it lands in `sent`.
    let response = client
        .post(format!("{}/api/v1/analyses/{analysis_id}/assignments", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "form_id": form.id,
            "recipient_id": recipient_id,
            "due_date": Utc::now() + ChronoDuration::days(5),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let assignment: serde_json::Value = response.json().await.unwrap();
    assert_eq!(assignment["status"], "sent");
    let assignment_id = assignment["id"].as_str().unwrap().to_string();
    let form_token = assignment["token"].as_str().unwrap().to_string();

    // Reminder bumps the count without changing status.
    let response = client
        .post(format!("{}/api/v1/assignments/{assignment_id}/remind", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reminded: serde_json::Value = response.json().await.unwrap();
    assert_eq!(reminded["reminder_count"], 1);
    assert_eq!(reminded["status"], "sent");

    // Anonymous fetch advances to opened.
    let response = client
        .get(format!("{}/forms/{form_token}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view: serde_json::Value = response.json().await.unwrap();
    assert_eq!(view["status"], "opened");

    // Anonymous submit completes it, exactly once.
    let response = client
        .post(format!("{}/forms/{form_token}", server.base_url))
        .json(&json!({ "answers": { "q1": "fine" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/forms/{form_token}", server.base_url))
        .json(&json!({ "answers": { "q1": "again" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "already_completed");

    let response = client
        .get(format!("{}/forms/{form_token}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Completed assignments reject reminders and deletion.
    let response = client
        .post(format!("{}/api/v1/assignments/{assignment_id}/remind", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .delete(format!("{}/api/v1/assignments/{assignment_id}", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "completed_immutable");

    // A recipient with no contact stays pending, and that one may be removed.
    let response = client
        .post(format!("{}/api/v1/analyses/{analysis_id}/assignments", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "form_id": form.id,
            "recipient_id": uuid::Uuid::now_v7(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let pending: serde_json::Value = response.json().await.unwrap();
    assert_eq!(pending["status"], "pending");
    let pending_id = pending["id"].as_str().unwrap();

    let response = client
        .delete(format!("{}/api/v1/assignments/{pending_id}", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Unknown tokens are a distinct outcome.
    let response = client
        .get(format!("{}/forms/not-a-real-token", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn cross_tenant_access_reads_as_absent() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let tenant_a = TenantId::new();
    let token_a = admin_jwt(tenant_a);
    let analysis_id = uuid::Uuid::now_v7().to_string();
    put_analysis_content(&client, &server.base_url, &token_a, &analysis_id).await;

    let form = FormDefinition {
        id: FormId::new(),
        current_version: FormVersionId::new(),
        active: true,
        visibility: FormVisibility::Global,
    };
    server.services.catalog.upsert(form.clone());

    let response = client
        .post(format!("{}/api/v1/analyses/{analysis_id}/assignments", server.base_url))
        .bearer_auth(&token_a)
        .json(&json!({ "form_id": form.id, "recipient_id": uuid::Uuid::now_v7() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let assignment_id = response.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Another tenant cannot see or touch any of it.
    let token_b = admin_jwt(TenantId::new());
    let response = client
        .get(format!("{}/api/v1/analyses/{analysis_id}/dossier", server.base_url))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .delete(format!("{}/api/v1/assignments/{assignment_id}", server.base_url))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn secrets_admin_is_role_gated_and_health_reports_configuration() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let tenant = TenantId::new();
    let staff_token = mint_jwt(tenant, vec![Role::staff()]);
    let admin_token = admin_jwt(tenant);

    // Staff without the admin role cannot manage secrets.
    let response = client
        .put(format!("{}/api/v1/admin/secrets", server.base_url))
        .bearer_auth(&staff_token)
        .json(&json!({ "service": "n8n", "key": "webhook_url", "value": "https://x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Health reports not_configured before any secrets exist.
    let response = client
        .get(format!("{}/api/v1/admin/integrations/n8n/health", server.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: serde_json::Value = response.json().await.unwrap();
    assert_eq!(health["webhook_url"], "not_configured");
    assert_eq!(health["auth_header_value"], "not_configured");

    put_secret(&client, &server.base_url, &admin_token, "webhook_url", "https://n8n.example/hook", false).await;
    put_secret(&client, &server.base_url, &admin_token, "auth_header_value", "cb-secret", true).await;

    let response = client
        .get(format!("{}/api/v1/admin/integrations/n8n/health", server.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let health: serde_json::Value = response.json().await.unwrap();
    assert_eq!(health["webhook_url"], "configured");
    assert_eq!(health["auth_header_value"], "configured");

    // Listings are masked; sensitive values never echo.
    let response = client
        .get(format!("{}/api/v1/admin/secrets/n8n", server.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let secrets: serde_json::Value = response.json().await.unwrap();
    let listed = secrets.as_array().unwrap();
    let url_entry = listed
        .iter()
        .find(|s| s["key"] == "webhook_url")
        .unwrap();
    assert_eq!(url_entry["masked_value"], "••••hook");
    let header_entry = listed
        .iter()
        .find(|s| s["key"] == "auth_header_value")
        .unwrap();
    assert_eq!(header_entry["masked_value"], "••••");
}
