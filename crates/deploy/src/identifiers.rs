//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging — for example —
//! a [`GameName`] with a [`SiteSlug`] even though both are `String` under the
//! hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// The display name of an uploaded game, as supplied by the uploader.
    ///
    /// Stored verbatim in the deployment metadata store. The repository name is
    /// derived from it via [`SiteSlug::from_name`].
    GameName
}

string_id! {
    /// The account login that owns the created repositories on the site host
    /// (e.g. the GitHub username the token belongs to).
    OwnerLogin
}

impl GameName {
    /// Produces a fallback name for uploads that did not supply one:
    /// `game-<unix-millis>`.
    pub fn generated(now_millis: i64) -> Self {
        Self(format!("game-{now_millis}"))
    }
}

// ---------------------------------------------------------------------------

/// The repository / URL-safe name of a published site.
///
/// Slugs contain only `[a-z0-9-]`. They are derived from a [`GameName`] by
/// lowercasing and replacing every other character with `-`, so a slug is
/// never empty when the name is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteSlug(String);

impl SiteSlug {
    /// Creates a slug from an already-sanitized value.
    ///
    /// Returns `None` if `value` is empty or contains a character outside
    /// `[a-z0-9-]`.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() || !v.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Derives a slug from a game name: lowercase, with every character
    /// outside `[a-z0-9-]` replaced by `-`.
    pub fn from_name(name: &GameName) -> Self {
        let slug = name
            .as_str()
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        Self(slug)
    }

    /// Returns the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SiteSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed
// ---------------------------------------------------------------------------

/// Identifies an authenticated user, as assigned by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a [`UserId`] from the UUID returned by the identity provider.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a single upload/publish request.
///
/// Generated fresh for every upload; propagated through spans so all activity
/// from a single deployment can be correlated in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeployRequestId(Uuid);

impl DeployRequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`DeployRequestId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for DeployRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — integer-backed (store-assigned)
// ---------------------------------------------------------------------------

/// Identifies a row in the deployment metadata store's `games` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameRowId(i64);

impl GameRowId {
    /// Creates an identifier from the raw row id.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for GameRowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
