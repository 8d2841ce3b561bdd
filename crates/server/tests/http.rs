//! In-process router tests with fake ports.
//!
//! Exercises the three endpoints end to end (extractor, handler, error
//! mapping) without any network: the identity, store, and site-host ports
//! are replaced with in-memory fakes and requests go through
//! `tower::ServiceExt::oneshot`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt;
use uuid::Uuid;

use deploy::{
    AuthError, AuthenticatedUser, DeploymentStore, GameRecord, GameStatus, HostError,
    IdentityVerifier, NewDeployment, OwnerLogin, PagesBuildState, PollBudget, SiteHost, SiteSlug,
    StoreError, UserId,
};
use publisher::Publisher;
use server::{AppState, Config};

const GOOD_TOKEN: &str = "good-token";

fn test_user_id() -> UserId {
    UserId::from_uuid(Uuid::from_u128(7))
}

struct FakeIdentity;

#[async_trait]
impl IdentityVerifier for FakeIdentity {
    async fn verify_token(&self, bearer_token: &str) -> Result<AuthenticatedUser, AuthError> {
        if bearer_token == GOOD_TOKEN {
            Ok(AuthenticatedUser {
                id: test_user_id(),
                email: Some("player@example.com".into()),
            })
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

#[derive(Default)]
struct FakeStore {
    rows: Mutex<Vec<GameRecord>>,
    next_id: AtomicI64,
}

#[async_trait]
impl DeploymentStore for FakeStore {
    async fn record_deployment(
        &self,
        deployment: &NewDeployment,
    ) -> Result<GameRecord, StoreError> {
        let record = GameRecord {
            id: deploy::GameRowId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            name: deployment.name.clone(),
            url: deployment.url.clone(),
            repo_url: deployment.repo_url.clone(),
            user_id: deployment.user_id,
            created_at: deployment.created_at,
            status: GameStatus::Active,
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn deployments_for_user(&self, user: &UserId) -> Result<Vec<GameRecord>, StoreError> {
        let mut rows: Vec<GameRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == *user)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

/// Succeeds at everything and reports the build complete immediately.
struct InstantHost;

#[async_trait]
impl SiteHost for InstantHost {
    async fn create_repository(&self, _slug: &SiteSlug) -> Result<(), HostError> {
        Ok(())
    }
    async fn put_file(&self, _slug: &SiteSlug, _path: &str, _bytes: &[u8]) -> Result<(), HostError> {
        Ok(())
    }
    async fn enable_pages(&self, _slug: &SiteSlug) -> Result<(), HostError> {
        Ok(())
    }
    async fn pages_status(&self, _slug: &SiteSlug) -> Result<PagesBuildState, HostError> {
        Ok(PagesBuildState::Built)
    }
    async fn protect_default_branch(&self, _slug: &SiteSlug) -> Result<(), HostError> {
        Ok(())
    }
    fn site_url(&self, slug: &SiteSlug) -> String {
        format!("https://player-one.github.io/{slug}")
    }
    fn repository_url(&self, slug: &SiteSlug) -> String {
        format!("https://github.com/player-one/{slug}")
    }
}

fn test_config() -> Config {
    Config {
        port: 0,
        github_token: "unused".into(),
        github_username: OwnerLogin::new("player-one").unwrap(),
        supabase_url: "http://unused.local".into(),
        supabase_anon_key: "unused".into(),
        allowed_origins: vec!["http://localhost:5173".into()],
        max_upload_bytes: 10 * 1024 * 1024,
        poll: PollBudget::new(Duration::from_millis(1), 1).unwrap(),
    }
}

fn app_with_config(config: Config) -> (axum::Router, Arc<FakeStore>) {
    let store = Arc::new(FakeStore::default());
    let state = AppState::new(
        Arc::new(FakeIdentity),
        store.clone(),
        Arc::new(Publisher::new(Arc::new(InstantHost), config.poll)),
    );
    (server::router(state, &config), store)
}

fn test_app() -> (axum::Router, Arc<FakeStore>) {
    app_with_config(test_config())
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_upload(game_name: Option<&str>, files: &[(&str, &[u8])]) -> Request<Body> {
    const BOUNDARY: &str = "gamedock-test-boundary";

    let mut body = Vec::new();
    if let Some(name) = game_name {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"gameName\"\r\n\r\n{name}\r\n"
            )
            .as_bytes(),
        );
    }
    for (file_name, contents) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(AUTHORIZATION, format!("Bearer {GOOD_TOKEN}"))
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_needs_no_auth() {
    let (app, _) = test_app();

    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn games_without_token_is_401() {
    let (app, _) = test_app();

    let response = app
        .oneshot(Request::get("/api/games").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn games_with_bad_token_is_401() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::get("/api/games")
                .header(AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid or expired token");
}

#[tokio::test]
async fn upload_publishes_and_records() {
    let (app, store) = test_app();

    let response = app
        .oneshot(multipart_upload(
            Some("Space Raiders"),
            &[("index.html", b"<html></html>"), ("main.js", b"init()")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["url"], "https://player-one.github.io/space-raiders");
    assert_eq!(body["repo"], "https://github.com/player-one/space-raiders");
    assert_eq!(body["status"], "deploying");
    assert_eq!(body["name"], "Space Raiders");

    let rows = store.deployments_for_user(&test_user_id()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name.as_str(), "Space Raiders");
}

#[tokio::test]
async fn upload_without_name_gets_a_generated_one() {
    let (app, store) = test_app();

    let response = app
        .oneshot(multipart_upload(None, &[("index.html", b"<html></html>")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let rows = store.deployments_for_user(&test_user_id()).await.unwrap();
    assert!(rows[0].name.as_str().starts_with("game-"));
}

#[tokio::test]
async fn upload_without_files_is_400() {
    let (app, _) = test_app();

    let response = app
        .oneshot(multipart_upload(Some("Space Raiders"), &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "no files uploaded");
}

#[tokio::test]
async fn upload_without_index_is_400() {
    let (app, _) = test_app();

    let response = app
        .oneshot(multipart_upload(Some("Space Raiders"), &[("main.js", b"init()")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("index.html"));
}

#[tokio::test]
async fn upload_over_the_body_limit_is_413() {
    let mut config = test_config();
    config.max_upload_bytes = 1024;
    let (app, store) = app_with_config(config);

    let big = vec![b'a'; 4096];
    let response = app
        .oneshot(multipart_upload(
            Some("Space Raiders"),
            &[("index.html", big.as_slice())],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "upload exceeds the maximum allowed size");
    assert!(store.deployments_for_user(&test_user_id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn preflight_from_allowed_origin_gets_cors_headers() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/upload")
                .header("origin", "http://localhost:5173")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}

#[tokio::test]
async fn unlisted_origin_gets_no_cors_headers() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::get("/api/health")
                .header("origin", "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn games_lists_only_the_callers_rows() {
    let (app, store) = test_app();

    store
        .record_deployment(&NewDeployment {
            name: deploy::GameName::new("mine").unwrap(),
            url: "https://player-one.github.io/mine".into(),
            repo_url: "https://github.com/player-one/mine".into(),
            user_id: test_user_id(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    store
        .record_deployment(&NewDeployment {
            name: deploy::GameName::new("theirs").unwrap(),
            url: "https://other.github.io/theirs".into(),
            repo_url: "https://github.com/other/theirs".into(),
            user_id: UserId::from_uuid(Uuid::from_u128(99)),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::get("/api/games")
                .header(AUTHORIZATION, format!("Bearer {GOOD_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let games = body["games"].as_array().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["name"], "mine");
}
