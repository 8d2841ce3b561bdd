//! Publish orchestration for GameDock.
//!
//! [`Publisher`] sequences the [`deploy::SiteHost`] port through the steps
//! that turn a normalized [`bundle::GameBundle`] into a live site:
//!
//! 1. Create a public repository named after the site slug.
//! 2. Upload every bundle file to the default branch. Individual upload
//!    failures are logged and skipped; the host renders what arrived.
//! 3. Enable static-site hosting sourced from the default branch (fatal on
//!    failure — without it there is no site).
//! 4. Poll the hosting build state on a fixed interval with a bounded
//!    attempt count. Not reaching `Built` inside the budget is non-fatal:
//!    the host routinely finishes minutes later and the URL is already
//!    known.
//! 5. Best-effort: apply an empty protection rule to the default branch.
//!
//! ## Architectural Layer
//!
//! **Orchestration.** Sequencing and logging only; host specifics live
//! behind the [`deploy::SiteHost`] trait in the `github` crate.

use std::sync::Arc;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use bundle::GameBundle;
use deploy::{DeployOutcome, HostError, PagesBuildState, PollBudget, RetryPolicy, SiteHost, SiteSlug};

/// A publish step failed in a way that leaves no usable site.
///
/// Upload and polling problems are deliberately absent: they degrade the
/// deployment but do not abort it.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The repository could not be created; nothing to publish into.
    #[error("failed to create repository: {0}")]
    RepositoryCreation(#[source] HostError),

    /// Hosting could not be enabled on the created repository.
    #[error("failed to enable static-site hosting: {0}")]
    PagesSetup(#[source] HostError),
}

impl PublishError {
    /// Classifies this error for retry purposes, delegating to the
    /// underlying host error.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RepositoryCreation(e) | Self::PagesSetup(e) => e.retry_policy(),
        }
    }
}

/// Drives one bundle through the full publish sequence.
pub struct Publisher {
    host: Arc<dyn SiteHost>,
    poll: PollBudget,
}

impl Publisher {
    /// Creates a publisher over the given host with the given poll schedule.
    pub fn new(host: Arc<dyn SiteHost>, poll: PollBudget) -> Self {
        Self { host, poll }
    }

    /// Publishes `bundle` as a new site named `slug`.
    ///
    /// Returns the site and repository URLs. `pages_built` in the outcome
    /// records whether the hosting build was observed to finish inside the
    /// poll budget.
    pub async fn publish(
        &self,
        slug: &SiteSlug,
        bundle: &GameBundle,
    ) -> Result<DeployOutcome, PublishError> {
        info!(%slug, files = bundle.len(), "creating repository");
        self.host
            .create_repository(slug)
            .await
            .map_err(PublishError::RepositoryCreation)?;

        let mut failed = 0usize;
        for (path, bytes) in bundle.files() {
            debug!(%slug, path, size = bytes.len(), "uploading file");
            if let Err(err) = self.host.put_file(slug, path, bytes).await {
                warn!(%slug, path, error = %err, "file upload failed, continuing");
                failed += 1;
            }
        }
        if failed > 0 {
            warn!(%slug, failed, total = bundle.len(), "some files did not upload");
        }

        info!(%slug, "enabling static-site hosting");
        self.host
            .enable_pages(slug)
            .await
            .map_err(PublishError::PagesSetup)?;

        let pages_built = self.wait_for_build(slug).await;

        if let Err(err) = self.host.protect_default_branch(slug).await {
            warn!(%slug, error = %err, "branch protection not applied");
        }

        let outcome = DeployOutcome {
            site_url: self.host.site_url(slug),
            repo_url: self.host.repository_url(slug),
            pages_built,
        };
        info!(%slug, url = %outcome.site_url, pages_built, "publish complete");
        Ok(outcome)
    }

    /// Polls the hosting build state until it reaches `Built` or the budget
    /// runs out. Status-check failures count as attempts.
    async fn wait_for_build(&self, slug: &SiteSlug) -> bool {
        for attempt in 1..=self.poll.max_attempts() {
            sleep(self.poll.interval()).await;

            match self.host.pages_status(slug).await {
                Ok(PagesBuildState::Built) => {
                    info!(%slug, attempt, "hosting build complete");
                    return true;
                }
                Ok(PagesBuildState::Errored) => {
                    warn!(%slug, attempt, "host reported a failed build, still polling");
                }
                Ok(state) => {
                    debug!(%slug, attempt, ?state, "hosting build in progress");
                }
                Err(err) => {
                    warn!(%slug, attempt, error = %err, "build status check failed");
                }
            }
        }

        warn!(%slug, attempts = self.poll.max_attempts(), "build not confirmed within poll budget");
        false
    }
}
