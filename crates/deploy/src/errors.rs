//! Port error types and retry policy for the GameDock deployment domain.
//!
//! Each port in [`crate::ports`] has a dedicated error type here so the
//! signatures stay free of infrastructure detail. Component-level errors
//! (bundle validation, publish-step failures) are defined in their respective
//! crates.
//!
//! [`RetryPolicy`] is a cross-cutting concern: any error type that participates
//! in retry decisions must be able to produce a [`RetryPolicy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Returned by infrastructure error types to let callers decide whether to
/// re-invoke an operation without escalating.
///
/// - `Retryable` errors: transport failures, API timeouts, rate-limit
///   responses (429), server errors (5xx).
/// - `NonRetryable` errors: client errors (4xx), invalid tokens, constraint
///   violations in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the minimum delay before retrying (e.g.
    /// derived from a `Retry-After` response header).
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Site-host errors
// ---------------------------------------------------------------------------

/// Errors produced by [`crate::ports::SiteHost`] implementations.
///
/// Infrastructure crates fold their transport types (e.g. `reqwest::Error`)
/// into these variants so the domain never sees HTTP-client internals.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host's API answered with a non-success status.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Api {
        /// Which host operation was being performed (e.g. `"create repository"`).
        operation: &'static str,
        /// HTTP status code returned by the host.
        status: u16,
        /// Response body, truncated by the adapter to a loggable size.
        message: String,
        /// Back-off requested by the host via `Retry-After`, when present.
        retry_after: Option<Duration>,
    },

    /// The request never produced a response (connect failure, timeout,
    /// malformed body).
    #[error("transport error during {operation}: {message}")]
    Transport {
        /// Which host operation was being performed.
        operation: &'static str,
        /// Description of the underlying failure.
        message: String,
    },
}

impl HostError {
    /// Classifies this error for retry purposes.
    ///
    /// Rate-limit (429) and server (5xx) responses are retryable, honouring
    /// the host's requested back-off; other API responses are not. Transport
    /// failures are always retryable.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Api {
                status, retry_after, ..
            } if *status == 429 || *status >= 500 => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Api { .. } => RetryPolicy::NonRetryable,
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
        }
    }
}

// ---------------------------------------------------------------------------
// Identity errors
// ---------------------------------------------------------------------------

/// Errors produced by [`crate::ports::IdentityVerifier`] implementations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider rejected the bearer token.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The provider could not be reached or answered unintelligibly.
    #[error("identity provider unavailable: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },
}

impl AuthError {
    /// Classifies this error for retry purposes. A rejected token will stay
    /// rejected; provider outages may clear.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::InvalidToken => RetryPolicy::NonRetryable,
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata-store errors
// ---------------------------------------------------------------------------

/// Errors produced by [`crate::ports::DeploymentStore`] implementations.
///
/// The constraint-violation variants mirror the Postgres error codes the
/// store surfaces (`42P01`, `23503`, `23505`) so callers can answer with
/// precise messages.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `games` table does not exist in the target database.
    #[error("deployment table does not exist; create the games table first")]
    MissingTable,

    /// The recorded user id does not reference a known user.
    #[error("invalid user reference")]
    InvalidUserReference,

    /// A game with the same name already exists.
    #[error("a game with this name already exists")]
    DuplicateName,

    /// The store's API answered with an unmapped non-success status.
    #[error("store request failed with HTTP {status}: {message}")]
    Api {
        /// HTTP status code returned by the store.
        status: u16,
        /// Response body, truncated by the adapter to a loggable size.
        message: String,
    },

    /// The request never produced a response.
    #[error("store unavailable: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },
}

impl StoreError {
    /// Classifies this error for retry purposes. Constraint violations are
    /// permanent; transport failures and server errors may clear.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::MissingTable | Self::InvalidUserReference | Self::DuplicateName => {
                RetryPolicy::NonRetryable
            }
            Self::Api { status, .. } if *status == 429 || *status >= 500 => {
                RetryPolicy::Retryable { after: None }
            }
            Self::Api { .. } => RetryPolicy::NonRetryable,
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_rate_limit_is_retryable_with_backoff() {
        let err = HostError::Api {
            operation: "create repository",
            status: 429,
            message: "rate limited".into(),
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(
            err.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(30))
            }
        );
    }

    #[test]
    fn host_server_error_is_retryable() {
        let err = HostError::Api {
            operation: "enable pages",
            status: 502,
            message: "bad gateway".into(),
            retry_after: None,
        };
        assert_eq!(err.retry_policy(), RetryPolicy::Retryable { after: None });
    }

    #[test]
    fn host_client_error_is_not_retryable() {
        let err = HostError::Api {
            operation: "upload file",
            status: 422,
            message: "validation failed".into(),
            retry_after: None,
        };
        assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable);
    }

    #[test]
    fn invalid_token_is_not_retryable() {
        assert_eq!(AuthError::InvalidToken.retry_policy(), RetryPolicy::NonRetryable);
    }

    #[test]
    fn store_constraint_violations_are_not_retryable() {
        assert_eq!(StoreError::DuplicateName.retry_policy(), RetryPolicy::NonRetryable);
        assert_eq!(StoreError::MissingTable.retry_policy(), RetryPolicy::NonRetryable);
        assert_eq!(
            StoreError::Transport {
                message: "connection refused".into()
            }
            .retry_policy(),
            RetryPolicy::Retryable { after: None }
        );
    }
}
