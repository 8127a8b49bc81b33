//! User model for storage and sessions.

use serde::{Deserialize, Serialize};

/// Local representation of a MapMyFitness user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// MapMyFitness user ID (never generated locally)
    pub id: i64,
    pub username: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// IANA zone name reported by MapMyFitness (e.g. "America/Denver")
    pub time_zone: String,
    pub organization_id: Option<i64>,
    /// Long-lived OAuth1 token credentials
    #[serde(skip_serializing)]
    pub oauth_token: String,
    #[serde(skip_serializing)]
    pub oauth_token_secret: String,
}

/// User summary kept in the browser session once authorized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub time_zone: String,
    pub organization_id: Option<i64>,
    #[serde(skip_serializing)]
    pub oauth_token: String,
    #[serde(skip_serializing)]
    pub oauth_token_secret: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            time_zone: user.time_zone.clone(),
            organization_id: user.organization_id,
            oauth_token: user.oauth_token.clone(),
            oauth_token_secret: user.oauth_token_secret.clone(),
        }
    }
}
