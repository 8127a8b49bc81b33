// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Read once at startup. The MapMyFitness credentials and the database
//! connection string are required; everything else has a default.

use std::env;

use crate::services::mmf::DEFAULT_API_URL;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- MapMyFitness API ---
    /// OAuth1 client key
    pub mmf_api_key: String,
    /// OAuth1 client secret
    pub mmf_api_secret: String,
    /// Versioned API root, e.g. `https://api.mapmyapi.com/v7.0`
    pub mmf_api_url: String,

    // --- Storage ---
    /// sqlx connection string, e.g. `sqlite://mapmystairs.db`
    pub database_url: String,

    // --- Server ---
    /// Externally visible base URL, used for OAuth callbacks and scan links
    pub public_url: String,
    /// Server port
    pub port: u16,

    // --- Application defaults ---
    /// Organization new users are attached to
    pub default_organization_id: i64,
    /// Stairwell shown on the leaderboard when none is requested
    pub default_stairwell_id: i64,
    /// Idle lifetime of a browser session
    pub session_ttl_hours: i64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            mmf_api_key: "test_api_key".to_string(),
            mmf_api_secret: "test_api_secret".to_string(),
            mmf_api_url: DEFAULT_API_URL.to_string(),
            database_url: "sqlite::memory:".to_string(),
            public_url: "http://localhost:8080".to_string(),
            port: 8080,
            default_organization_id: 1,
            default_stairwell_id: 1,
            session_ttl_hours: 24 * 14,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            mmf_api_key: required("MMF_API_KEY")?,
            mmf_api_secret: required("MMF_API_SECRET")?,
            mmf_api_url: env::var("MMF_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            database_url: required("DATABASE_URL")?,
            public_url: env::var("PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: parse_or("PORT", 8080)?,
            default_organization_id: parse_or("DEFAULT_ORGANIZATION_ID", 1)?,
            default_stairwell_id: parse_or("DEFAULT_STAIRWELL_ID", 1)?,
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24 * 14)?,
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    /// Absolute URL for a local path.
    pub fn external_url(&self, path: &str) -> String {
        format!("{}{}", self.public_url.trim_end_matches('/'), path)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
