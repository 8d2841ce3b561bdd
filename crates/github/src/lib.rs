//! GameDock GitHub infrastructure adapter.
//!
//! Implements the [`deploy::SiteHost`] trait over the GitHub REST API v3:
//! repository creation, per-file content upload, Pages enablement and build
//! status, and the default branch-protection rule.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All GitHub API details (endpoints, preview accept
//! headers, base64 content encoding, `Retry-After` handling) live here; the
//! `deploy` crate sees only [`deploy::SiteHost`] and [`deploy::HostError`].

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Response, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use deploy::{HostError, OwnerLogin, PagesBuildState, SiteHost, SiteSlug};

const GITHUB_API: &str = "https://api.github.com";
const DEFAULT_BRANCH: &str = "main";

// Pages management and branch protection are still gated behind preview
// media types on REST v3.
const PAGES_PREVIEW: &str = "application/vnd.github.switcheroo-preview+json";
const PROTECTION_PREVIEW: &str = "application/vnd.github.luke-cage-preview+json";

// Response bodies are carried into error messages; keep them loggable.
const MAX_BODY_SNIPPET: usize = 512;

/// GitHub REST client scoped to one owner account.
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    owner: OwnerLogin,
    token: String,
}

impl GitHubClient {
    /// Creates a client for `owner` authenticating with `token`.
    pub fn new(owner: OwnerLogin, token: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_api_base(owner, token, GITHUB_API)
    }

    /// Creates a client against a non-default API base URL (tests).
    pub fn with_api_base(
        owner: OwnerLogin,
        token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        // GitHub rejects requests without a User-Agent.
        let http = reqwest::Client::builder()
            .user_agent(concat!("gamedock/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            owner,
            token: token.into(),
        })
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.token)
    }

    fn repo_url_path(&self, slug: &SiteSlug, suffix: &str) -> String {
        format!("{}/repos/{}/{}{suffix}", self.api_base, self.owner, slug)
    }
}

fn transport(operation: &'static str) -> impl FnOnce(reqwest::Error) -> HostError {
    move |err| HostError::Transport {
        operation,
        message: err.to_string(),
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_BODY_SNIPPET {
        // Avoid splitting inside a UTF-8 sequence.
        let mut end = MAX_BODY_SNIPPET;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

/// Turns a non-success response into [`HostError::Api`], capturing the
/// `Retry-After` header when the host sent one.
async fn check(operation: &'static str, response: Response) -> Result<Response, HostError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);
    let message = truncate(response.text().await.unwrap_or_default());

    Err(HostError::Api {
        operation,
        status: status.as_u16(),
        message,
        retry_after,
    })
}

#[derive(Deserialize)]
struct PagesInfo {
    status: Option<String>,
}

#[async_trait]
impl SiteHost for GitHubClient {
    async fn create_repository(&self, slug: &SiteSlug) -> Result<(), HostError> {
        const OP: &str = "create repository";

        let response = self
            .http
            .post(format!("{}/user/repos", self.api_base))
            .header(AUTHORIZATION, self.auth_header())
            .json(&json!({
                "name": slug.as_str(),
                "private": false,
                "auto_init": false,
                "has_pages": true,
            }))
            .send()
            .await
            .map_err(transport(OP))?;

        check(OP, response).await?;
        debug!(%slug, "repository created");
        Ok(())
    }

    async fn put_file(&self, slug: &SiteSlug, path: &str, bytes: &[u8]) -> Result<(), HostError> {
        const OP: &str = "upload file";

        // Bundle paths may legally contain characters that are significant
        // in a request line (`#`, `?`, spaces); push each segment through
        // the URL type so it gets percent-encoded.
        let mut url = Url::parse(&self.repo_url_path(slug, "/contents"))
            .map_err(|e| HostError::Transport {
                operation: OP,
                message: e.to_string(),
            })?;
        url.path_segments_mut()
            .map_err(|()| HostError::Transport {
                operation: OP,
                message: "API base URL cannot carry path segments".into(),
            })?
            .extend(path.split('/'));

        let response = self
            .http
            .put(url)
            .header(AUTHORIZATION, self.auth_header())
            .json(&json!({
                "message": format!("Add {path}"),
                "content": BASE64.encode(bytes),
                "branch": DEFAULT_BRANCH,
            }))
            .send()
            .await
            .map_err(transport(OP))?;

        check(OP, response).await?;
        Ok(())
    }

    async fn enable_pages(&self, slug: &SiteSlug) -> Result<(), HostError> {
        const OP: &str = "enable pages";

        let response = self
            .http
            .post(self.repo_url_path(slug, "/pages"))
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, PAGES_PREVIEW)
            .json(&json!({
                "source": { "branch": DEFAULT_BRANCH },
            }))
            .send()
            .await
            .map_err(transport(OP))?;

        check(OP, response).await?;
        debug!(%slug, "pages enabled");
        Ok(())
    }

    async fn pages_status(&self, slug: &SiteSlug) -> Result<PagesBuildState, HostError> {
        const OP: &str = "pages status";

        let response = self
            .http
            .get(self.repo_url_path(slug, "/pages"))
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, PAGES_PREVIEW)
            .send()
            .await
            .map_err(transport(OP))?;

        let info: PagesInfo = check(OP, response)
            .await?
            .json()
            .await
            .map_err(transport(OP))?;

        Ok(match info.status.as_deref() {
            None => PagesBuildState::NotBuilt,
            Some("building") => PagesBuildState::Building,
            Some("built") => PagesBuildState::Built,
            Some("errored") => PagesBuildState::Errored,
            Some(_) => PagesBuildState::Unknown,
        })
    }

    async fn protect_default_branch(&self, slug: &SiteSlug) -> Result<(), HostError> {
        const OP: &str = "protect branch";

        let response = self
            .http
            .put(self.repo_url_path(slug, &format!("/branches/{DEFAULT_BRANCH}/protection")))
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, PROTECTION_PREVIEW)
            .json(&json!({
                "required_status_checks": null,
                "enforce_admins": false,
                "required_pull_request_reviews": null,
                "restrictions": null,
            }))
            .send()
            .await
            .map_err(transport(OP))?;

        check(OP, response).await?;
        Ok(())
    }

    fn site_url(&self, slug: &SiteSlug) -> String {
        format!("https://{}.github.io/{slug}", self.owner)
    }

    fn repository_url(&self, slug: &SiteSlug) -> String {
        format!("https://github.com/{}/{slug}", self.owner)
    }
}
