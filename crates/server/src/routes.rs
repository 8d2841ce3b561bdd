//! Request handlers for the public API.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use bundle::{GameBundle, UploadPart};
use deploy::{DeployRequestId, GameName, NewDeployment, SiteSlug};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Liveness probe; answers without touching any dependency.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/upload` — repackage the uploaded files, publish them as a new
/// site, and record the deployment.
pub async fn upload_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    // The body-limit layer surfaces through multipart as a 413-status error;
    // everything else on that path is a malformed payload.
    let malformed = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(format!("malformed multipart payload: {e}"))
        }
    };

    let mut parts: Vec<UploadPart> = Vec::new();
    let mut game_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("files") => {
                let name = field.file_name().unwrap_or_default().to_owned();
                if name.is_empty() {
                    return Err(ApiError::BadRequest(
                        "file part is missing a filename".into(),
                    ));
                }
                let bytes = field.bytes().await.map_err(malformed)?;
                parts.push(UploadPart {
                    name,
                    bytes: bytes.to_vec(),
                });
            }
            Some("gameName") => {
                game_name = Some(field.text().await.map_err(malformed)?);
            }
            _ => {}
        }
    }

    if parts.is_empty() {
        return Err(ApiError::BadRequest("no files uploaded".into()));
    }

    let name = game_name
        .filter(|n| !n.trim().is_empty())
        .and_then(GameName::new)
        .unwrap_or_else(|| GameName::generated(Utc::now().timestamp_millis()));
    let slug = SiteSlug::from_name(&name);

    let request_id = DeployRequestId::new_random();
    info!(
        %request_id,
        user = %user.id,
        game = %name,
        %slug,
        files = parts.len(),
        "upload received"
    );

    // Archive expansion is CPU-bound; keep it off the runtime workers.
    let bundle = tokio::task::spawn_blocking(move || GameBundle::from_parts(parts))
        .await
        .map_err(|e| ApiError::Internal(format!("bundle task failed: {e}")))??;

    let outcome = state.publisher.publish(&slug, &bundle).await?;

    let record = state
        .store
        .record_deployment(&NewDeployment {
            name: name.clone(),
            url: outcome.site_url.clone(),
            repo_url: outcome.repo_url.clone(),
            user_id: user.id,
            created_at: Utc::now(),
        })
        .await?;

    info!(%request_id, game = %record.name, url = %outcome.site_url, "deployment recorded");

    Ok(Json(json!({
        "message": "Game deployed successfully",
        "url": outcome.site_url,
        "repo": outcome.repo_url,
        "status": "deploying",
        "note": "The site may take a few minutes to become fully accessible.",
        "name": record.name,
    })))
}

/// `GET /api/games` — the caller's deployments, newest first.
pub async fn games_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let games = state.store.deployments_for_user(&user.id).await?;
    Ok(Json(json!({ "games": games })))
}
