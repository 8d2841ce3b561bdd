//! Environment-backed runtime configuration.
//!
//! Required keys fail startup with a [`ConfigError`] rather than a panic so
//! the operator sees one clear message. Optional keys fall back to built-in
//! defaults.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use deploy::{OwnerLogin, PollBudget};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_POLL_ATTEMPTS: u32 = 30;

/// The service configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("required environment variable {name} is not set")]
    MissingVar {
        /// Name of the missing variable.
        name: &'static str,
    },

    /// An environment variable is set but cannot be used.
    #[error("environment variable {name} is invalid: {message}")]
    InvalidVar {
        /// Name of the offending variable.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the server binds on.
    pub port: u16,
    /// Token used against the site host's API.
    pub github_token: String,
    /// Account that owns the created repositories.
    pub github_username: OwnerLogin,
    /// Base URL of the Supabase project.
    pub supabase_url: String,
    /// Supabase anon key (sent as `apikey`).
    pub supabase_anon_key: String,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// Upper bound on the request body, in bytes.
    pub max_upload_bytes: usize,
    /// Schedule for polling the hosting build state.
    pub poll: PollBudget,
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_or("PORT", DEFAULT_PORT)?;
        let github_token = require("GITHUB_TOKEN")?;
        let github_username = OwnerLogin::new(require("GITHUB_USERNAME")?)
            .ok_or(ConfigError::MissingVar {
                name: "GITHUB_USERNAME",
            })?;
        let supabase_url = require("SUPABASE_URL")?;
        let supabase_anon_key = require("SUPABASE_ANON_KEY")?;

        let allowed_origins = match optional("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(|origin| origin.trim().to_owned())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => default_origins(),
        };

        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        let interval_secs = parse_or("PAGES_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let attempts = parse_or("PAGES_POLL_ATTEMPTS", DEFAULT_POLL_ATTEMPTS)?;
        let poll = PollBudget::new(Duration::from_secs(interval_secs), attempts).ok_or(
            ConfigError::InvalidVar {
                name: "PAGES_POLL_INTERVAL_SECS",
                message: "poll interval and attempt count must both be non-zero".into(),
            },
        )?;

        info!(
            port,
            owner = %github_username,
            origins = allowed_origins.len(),
            "configuration loaded"
        );

        Ok(Self {
            port,
            github_token,
            github_username,
            supabase_url,
            supabase_anon_key,
            allowed_origins,
            max_upload_bytes,
            poll,
        })
    }
}

/// Local dev origins of the frontend.
fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_owned(),
        "http://localhost:5174".to_owned(),
        "http://localhost:5175".to_owned(),
    ]
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar { name })
}

fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            name,
            message: e.to_string(),
        }),
    }
}
