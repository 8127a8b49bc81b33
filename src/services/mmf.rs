// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MapMyFitness API client.
//!
//! Handles:
//! - OAuth1-signed GET/POST calls against the versioned REST API
//! - The three-legged handshake (temporary credentials, token credentials)
//! - Typed wrappers for user lookup and workout creation
//!
//! This is a thin adapter. Transport errors, non-2xx responses and
//! malformed bodies all surface as `AppError::FitnessApi`; nothing retries.

use std::collections::BTreeSet;

use oauth1_request as oauth;
use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

pub const API_VERSION: &str = "v7.0";
pub const DEFAULT_API_URL: &str = "https://api.mapmyapi.com/v7.0";

/// MapMyFitness activity type for stair climbing.
pub const STAIRS_ACTIVITY_TYPE_ID: u32 = 133;

/// Privacy option attached to posted workouts.
pub const WORKOUT_PRIVACY: &str = "/v7.0/privacy_option/1/";

/// Joules (MapMyFitness `metabolic_energy_total`) to kilocalories.
pub const JOULES_TO_KCAL: f64 = 0.000239005736;

const TEMPORARY_CREDENTIAL_PATH: &str = "/oauth/temporary_credential/";
const TOKEN_CREDENTIAL_PATH: &str = "/oauth/token_credential/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// MapMyFitness API client.
///
/// Holds the application's client credentials and, optionally, a
/// resource-owner token pair for calls made on a user's behalf.
#[derive(Clone)]
pub struct MmfClient {
    http: reqwest::Client,
    base_url: String,
    client_key: String,
    client_secret: String,
    token: Option<(String, String)>,
}

impl MmfClient {
    /// Create a client with application credentials only.
    pub fn new(client_key: &str, client_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_API_URL.to_string(),
            client_key: client_key.to_string(),
            client_secret: client_secret.to_string(),
            token: None,
        }
    }

    /// Point the client at a different API root (tests, staging).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Copy of this client that signs with a user's (or temporary) token pair.
    pub fn with_token(&self, token: &str, token_secret: &str) -> Self {
        Self {
            token: Some((token.to_string(), token_secret.to_string())),
            ..self.clone()
        }
    }

    /// Make a signed API call and decode the JSON response.
    ///
    /// `path` is relative to the versioned root; a leading `/v7.0` (as found
    /// in API `_links`) is accepted and stripped.
    pub async fn call(
        &self,
        path: &str,
        method: HttpMethod,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, AppError> {
        let mut url = self.url(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let authorization = self.authorization(method, &url, None, None);

        let request = match method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
        };
        let mut request = request
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::FitnessApi(e.to_string()))?;

        check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::FitnessApi(format!("JSON parse error: {}", e)))
    }

    /// Look up a user's profile.
    pub async fn get_user(&self, user_id: i64) -> Result<MmfUser, AppError> {
        let value = self
            .call(&format!("/user/{}/", user_id), HttpMethod::Get, &[], None)
            .await?;
        decode(value, "user")
    }

    /// Create a workout on the user's MapMyFitness account.
    pub async fn create_workout(&self, workout: &NewWorkout) -> Result<CreatedWorkout, AppError> {
        let body = serde_json::to_value(workout)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Workout encode failed: {}", e)))?;
        let value = self
            .call("/workout/", HttpMethod::Post, &[], Some(&body))
            .await?;
        decode(value, "workout")
    }

    /// First leg of the handshake: obtain temporary credentials.
    pub async fn get_temporary_credentials(
        &self,
        callback_uri: &str,
    ) -> Result<TemporaryCredentials, AppError> {
        self.credential_request(TEMPORARY_CREDENTIAL_PATH, Some(callback_uri), None)
            .await
    }

    /// Last leg of the handshake: trade the verifier for token credentials.
    ///
    /// Must be called on a client carrying the temporary token pair.
    pub async fn get_token_credentials(
        &self,
        verifier: &str,
    ) -> Result<TokenCredentials, AppError> {
        self.credential_request(TOKEN_CREDENTIAL_PATH, None, Some(verifier))
            .await
    }

    async fn credential_request<T: DeserializeOwned>(
        &self,
        path: &str,
        callback: Option<&str>,
        verifier: Option<&str>,
    ) -> Result<T, AppError> {
        let url = self.url(path)?;
        let authorization = self.authorization(HttpMethod::Post, &url, callback, verifier);

        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .header(reqwest::header::ACCEPT, "application/x-www-form-urlencoded")
            .send()
            .await
            .map_err(|e| AppError::FitnessApi(format!("Credential request failed: {}", e)))?;

        let body = check_response(response)
            .await?
            .text()
            .await
            .map_err(|e| AppError::FitnessApi(e.to_string()))?;

        parse_form(&body)
    }

    /// `Authorization` header for a request, HMAC-SHA1 signed.
    ///
    /// Query parameters on `url` are part of the signature. Bodies are JSON
    /// and never signed.
    fn authorization(
        &self,
        method: HttpMethod,
        url: &Url,
        callback: Option<&str>,
        verifier: Option<&str>,
    ) -> String {
        let client = oauth::Credentials::new(self.client_key.as_str(), self.client_secret.as_str());
        let mut builder = oauth::Builder::<_, &str, &str>::new(client, oauth::HMAC_SHA1);
        if let Some((token, token_secret)) = &self.token {
            builder.token(oauth::Credentials::new(token.as_str(), token_secret.as_str()));
        }
        builder.callback(callback).verifier(verifier);

        let params: BTreeSet<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        let mut base = url.clone();
        base.set_query(None);

        builder.authorize(
            method.as_str(),
            base.as_str(),
            &oauth::request::AssertSorted::new(params.iter().map(|(k, v)| (k, v))),
        )
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        let version_prefix = format!("/{}", API_VERSION);
        let path = path.strip_prefix(&version_prefix).unwrap_or(path);
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid API URL: {}", e)))
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %body, "MapMyFitness request failed");
    Err(AppError::FitnessApi(format!("HTTP {}: {}", status, body)))
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value, what: &str) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::FitnessApi(format!("Unexpected {} response: {}", what, e)))
}

/// Decode an `application/x-www-form-urlencoded` credential response.
pub fn parse_form<T: DeserializeOwned>(body: &str) -> Result<T, AppError> {
    serde_urlencoded::from_str(body.trim())
        .map_err(|e| AppError::FitnessApi(format!("Unexpected credential response: {}", e)))
}

// ─── Handshake Results ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemporaryCredentials {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    /// Where to send the browser so the user can approve access
    pub authorize_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenCredentials {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    pub user_id: i64,
}

// ─── User ────────────────────────────────────────────────────

/// User profile from `GET /user/{id}/`.
#[derive(Debug, Clone, Deserialize)]
pub struct MmfUser {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

// ─── Workouts ────────────────────────────────────────────────

/// Body for `POST /workout/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkout {
    pub start_datetime: String,
    pub name: String,
    pub notes: String,
    pub privacy: String,
    pub aggregates: NewWorkoutAggregates,
    pub time_series: NewWorkoutTimeSeries,
    pub start_locale_timezone: String,
    pub activity_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkoutAggregates {
    /// Seconds
    pub active_time_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkoutTimeSeries {
    /// `[offset_seconds, cumulative_steps]` samples
    pub steps: Vec<(f64, i64)>,
}

/// Response from `POST /workout/` (only the fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedWorkout {
    #[serde(rename = "_links")]
    pub links: WorkoutLinks,
    pub aggregates: CreatedWorkoutAggregates,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutLinks {
    #[serde(rename = "self")]
    pub self_links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub id: LinkId,
}

/// Link ids arrive as strings, occasionally as bare numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LinkId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedWorkoutAggregates {
    /// Seconds
    pub elapsed_time_total: f64,
    /// Joules
    #[serde(default)]
    pub metabolic_energy_total: Option<f64>,
}

impl CreatedWorkout {
    /// MapMyFitness workout id from `_links.self[0].id`.
    pub fn workout_id(&self) -> Result<i64, AppError> {
        let link = self
            .links
            .self_links
            .first()
            .ok_or_else(|| AppError::FitnessApi("Workout response has no self link".to_string()))?;

        match &link.id {
            LinkId::Number(id) => Ok(*id),
            LinkId::Text(id) => id
                .parse()
                .map_err(|_| AppError::FitnessApi(format!("Invalid workout id '{}'", id))),
        }
    }

    /// Elapsed time in whole seconds.
    pub fn time_taken_seconds(&self) -> i64 {
        self.aggregates.elapsed_time_total.max(0.0).round() as i64
    }

    /// Energy burned in kilocalories; 0 when MapMyFitness did not report it.
    pub fn energy_burned_kcal(&self) -> f64 {
        energy_to_kcal(self.aggregates.metabolic_energy_total)
    }
}

/// API reference for an activity type, e.g. `/v7.0/activity_type/133/`.
pub fn activity_type_ref(id: u32) -> String {
    format!("/{}/activity_type/{}/", API_VERSION, id)
}

/// Convert a MapMyFitness energy figure to kilocalories.
pub fn energy_to_kcal(joules: Option<f64>) -> f64 {
    (joules.unwrap_or(0.0) * JOULES_TO_KCAL).max(0.0)
}
