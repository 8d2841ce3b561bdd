//! Core deployment domain for GameDock.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and cross-cutting error type used throughout the publishing pipeline.
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype domain identifiers (`SiteSlug`, `UserId`, etc.) |
//! | [`types`] | Shared value types (`GameRecord`, `DeployOutcome`, `PollBudget`, etc.) |
//! | [`errors`] | Port error types and the cross-cutting retry policy |
//! | [`ports`] | Async traits implemented by the github and supabase adapters |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{AuthError, HostError, RetryPolicy, StoreError};
pub use identifiers::{DeployRequestId, GameName, GameRowId, OwnerLogin, SiteSlug, UserId};
pub use ports::{DeploymentStore, IdentityVerifier, SiteHost};
pub use types::{
    AuthenticatedUser, DeployOutcome, GameRecord, GameStatus, NewDeployment, PagesBuildState,
    PollBudget,
};
