//! Ports implemented by infrastructure crates.
//!
//! The domain depends on these traits only; the `github` crate supplies the
//! [`SiteHost`], and the `supabase` crate supplies the [`IdentityVerifier`]
//! and [`DeploymentStore`]. Tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::errors::{AuthError, HostError, StoreError};
use crate::identifiers::{SiteSlug, UserId};
use crate::types::{AuthenticatedUser, GameRecord, NewDeployment, PagesBuildState};

/// Source-control host with static-site hosting attached to repositories.
///
/// One repository per published game; the repository name is the site slug.
/// All methods operate on the owner account the adapter was configured with.
#[async_trait]
pub trait SiteHost: Send + Sync {
    /// Creates a public, uninitialised repository named after `slug`.
    async fn create_repository(&self, slug: &SiteSlug) -> Result<(), HostError>;

    /// Uploads one file to the repository's default branch.
    ///
    /// `path` is the repository-relative path, forward-slash separated.
    async fn put_file(&self, slug: &SiteSlug, path: &str, bytes: &[u8]) -> Result<(), HostError>;

    /// Enables static-site hosting on the repository, sourced from the
    /// default branch.
    async fn enable_pages(&self, slug: &SiteSlug) -> Result<(), HostError>;

    /// Reports the current build state of the repository's hosted site.
    async fn pages_status(&self, slug: &SiteSlug) -> Result<PagesBuildState, HostError>;

    /// Applies a default (empty) protection rule to the default branch.
    async fn protect_default_branch(&self, slug: &SiteSlug) -> Result<(), HostError>;

    /// Public URL the hosted site will be served from.
    fn site_url(&self, slug: &SiteSlug) -> String;

    /// Browse URL of the backing repository.
    fn repository_url(&self, slug: &SiteSlug) -> String;
}

/// Hosted identity service that validates bearer tokens.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolves a bearer token to the user it belongs to.
    async fn verify_token(&self, bearer_token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Hosted relational store recording one row per published game.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Inserts a deployment row and returns it as stored (with the assigned id).
    async fn record_deployment(&self, deployment: &NewDeployment)
        -> Result<GameRecord, StoreError>;

    /// Returns the user's deployments, newest first.
    async fn deployments_for_user(&self, user: &UserId) -> Result<Vec<GameRecord>, StoreError>;
}
