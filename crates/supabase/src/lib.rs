//! GameDock Supabase infrastructure adapters.
//!
//! Two adapters over one hosted Supabase project:
//!
//! - [`SupabaseAuth`] implements [`deploy::IdentityVerifier`] against the
//!   GoTrue endpoint (`GET /auth/v1/user`), resolving a caller's bearer
//!   token to a user id.
//! - [`SupabaseStore`] implements [`deploy::DeploymentStore`] against
//!   PostgREST (`/rest/v1/games`), one row per published game.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Wire formats, header conventions (`apikey` +
//! `Authorization`), and PostgREST error-code mapping live here; the
//! `deploy` crate sees only its ports and error types.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use deploy::{
    AuthError, AuthenticatedUser, DeploymentStore, GameRecord, GameStatus, IdentityVerifier,
    NewDeployment, StoreError, UserId,
};

const APIKEY_HEADER: &str = "apikey";
const GAMES_TABLE: &str = "games";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Bearer-token verifier backed by Supabase Auth (GoTrue).
pub struct SupabaseAuth {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    /// Creates a verifier for the project at `base_url` using its anon key.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
        })
    }
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: Uuid,
    email: Option<String>,
}

#[async_trait]
impl IdentityVerifier for SupabaseAuth {
    async fn verify_token(&self, bearer_token: &str) -> Result<AuthenticatedUser, AuthError> {
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header(APIKEY_HEADER, &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {bearer_token}"))
            .send()
            .await
            .map_err(|e| AuthError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            return Err(AuthError::Transport {
                message: format!("identity endpoint answered HTTP {status}"),
            });
        }

        let user: GoTrueUser = response.json().await.map_err(|e| AuthError::Transport {
            message: e.to_string(),
        })?;

        debug!(user = %user.id, "token verified");
        Ok(AuthenticatedUser {
            id: UserId::from_uuid(user.id),
            email: user.email,
        })
    }
}

// ---------------------------------------------------------------------------
// Metadata store
// ---------------------------------------------------------------------------

/// Deployment metadata store backed by Supabase PostgREST.
pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseStore {
    /// Creates a store for the project at `base_url` using its anon key.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{GAMES_TABLE}", self.base_url)
    }
}

/// Insert payload for the `games` table. The store assigns `id`.
#[derive(Serialize)]
struct InsertGame<'a> {
    name: &'a str,
    url: &'a str,
    repo_url: &'a str,
    user_id: UserId,
    created_at: chrono::DateTime<chrono::Utc>,
    status: GameStatus,
}

/// Error body PostgREST returns alongside non-success statuses.
#[derive(Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// Maps a PostgREST failure to a domain store error, keyed on the Postgres
/// error code when one is present.
async fn store_error(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    if let Ok(parsed) = serde_json::from_str::<PostgrestError>(&body) {
        match parsed.code.as_deref() {
            Some("42P01") => return StoreError::MissingTable,
            Some("23503") => return StoreError::InvalidUserReference,
            Some("23505") => return StoreError::DuplicateName,
            _ => {
                if let Some(message) = parsed.message {
                    return StoreError::Api { status, message };
                }
            }
        }
    }

    StoreError::Api {
        status,
        message: body,
    }
}

fn store_transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport {
        message: err.to_string(),
    }
}

#[async_trait]
impl DeploymentStore for SupabaseStore {
    async fn record_deployment(
        &self,
        deployment: &NewDeployment,
    ) -> Result<GameRecord, StoreError> {
        let payload = InsertGame {
            name: deployment.name.as_str(),
            url: &deployment.url,
            repo_url: &deployment.repo_url,
            user_id: deployment.user_id,
            created_at: deployment.created_at,
            status: GameStatus::Active,
        };

        let response = self
            .http
            .post(self.table_url())
            .header(APIKEY_HEADER, &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.anon_key))
            // PostgREST echoes the inserted rows back only when asked to.
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await
            .map_err(store_transport)?;

        if !response.status().is_success() {
            return Err(store_error(response).await);
        }

        let mut rows: Vec<GameRecord> = response.json().await.map_err(store_transport)?;
        rows.pop().ok_or_else(|| StoreError::Api {
            status: StatusCode::OK.as_u16(),
            message: "insert returned no representation".into(),
        })
    }

    async fn deployments_for_user(&self, user: &UserId) -> Result<Vec<GameRecord>, StoreError> {
        let user_filter = format!("eq.{user}");
        let response = self
            .http
            .get(self.table_url())
            .header(APIKEY_HEADER, &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.anon_key))
            .query(&[
                ("select", "*"),
                ("user_id", user_filter.as_str()),
                ("order", "created_at.desc"),
            ])
            .send()
            .await
            .map_err(store_transport)?;

        if !response.status().is_success() {
            return Err(store_error(response).await);
        }

        let rows: Vec<GameRecord> = response.json().await.map_err(store_transport)?;
        debug!(user = %user, rows = rows.len(), "deployments fetched");
        Ok(rows)
    }
}
