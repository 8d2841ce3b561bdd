//! Shared value types for the GameDock deployment domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. a [`PollBudget`] interval must be
//! non-zero) and participate in domain computations.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{GameName, GameRowId, UserId};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The user resolved from a bearer token by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Provider-assigned user id.
    pub id: UserId,
    /// Email on record, when the provider returns one.
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Deployment records
// ---------------------------------------------------------------------------

/// Lifecycle status of a published game, as recorded in the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// The game is published and its row is live.
    Active,
}

/// One row of the `games` table in the deployment metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Store-assigned row id.
    pub id: GameRowId,
    /// Display name supplied at upload time.
    pub name: GameName,
    /// Public URL of the hosted site.
    pub url: String,
    /// URL of the backing repository.
    pub repo_url: String,
    /// Owning user.
    pub user_id: UserId,
    /// When the deployment was recorded.
    pub created_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: GameStatus,
}

/// The fields of a deployment about to be recorded.
///
/// The store assigns the row id and echoes the full [`GameRecord`] back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDeployment {
    /// Display name supplied at upload time.
    pub name: GameName,
    /// Public URL of the hosted site.
    pub url: String,
    /// URL of the backing repository.
    pub repo_url: String,
    /// Owning user.
    pub user_id: UserId,
    /// When the deployment completed.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// Build state of the static-site hosting for a repository, as reported by
/// the site host's status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PagesBuildState {
    /// Hosting is enabled but no build has run yet.
    NotBuilt,
    /// A build is in progress.
    Building,
    /// The site is built and being served.
    Built,
    /// The last build failed.
    Errored,
    /// The host reported a state this version does not know about.
    Unknown,
}

/// The result of a completed publish run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployOutcome {
    /// Public URL where the site is (or shortly will be) served.
    pub site_url: String,
    /// URL of the created repository.
    pub repo_url: String,
    /// Whether the hosting build was observed to reach [`PagesBuildState::Built`]
    /// within the poll budget. `false` is not a failure — the host often
    /// finishes after the window closes.
    pub pages_built: bool,
}

// ---------------------------------------------------------------------------

/// A fixed-interval, bounded-attempt polling schedule.
///
/// Used by the publisher to wait for the hosting build without waiting
/// forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    interval: Duration,
    max_attempts: u32,
}

impl PollBudget {
    /// Creates a [`PollBudget`].
    ///
    /// Returns `None` if `interval` is zero or `max_attempts` is zero.
    #[must_use]
    pub fn new(interval: Duration, max_attempts: u32) -> Option<Self> {
        if interval.is_zero() || max_attempts == 0 {
            None
        } else {
            Some(Self {
                interval,
                max_attempts,
            })
        }
    }

    /// Delay between consecutive status checks.
    pub fn interval(self) -> Duration {
        self.interval
    }

    /// Maximum number of status checks before giving up.
    pub fn max_attempts(self) -> u32 {
        self.max_attempts
    }
}
