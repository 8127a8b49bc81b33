// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MapMyFitness OAuth1 authentication routes.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::is_local_path;
use crate::middleware::session::session_cookie;
use crate::models::{SessionUser, User};
use crate::services::mmf::TokenCredentials;
use crate::session::{Flash, PendingToken, Session, SessionId};
use crate::AppState;

/// Where users land after signing in when no `next` was given.
const DEFAULT_NEXT: &str = "/leaderboard";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route("/authorize", get(authorize))
        .route("/logout", get(logout))
}

/// Query parameters for starting the OAuth flow.
#[derive(Deserialize)]
pub struct LoginParams {
    /// Local path to return to after authorization.
    #[serde(default)]
    next: Option<String>,
}

/// Start OAuth flow - obtain temporary credentials and redirect to MapMyFitness.
async fn login(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Query(params): Query<LoginParams>,
) -> Result<Redirect> {
    let next = params.next.filter(|next| is_local_path(next));

    if state.sessions.load(&session_id.0).user.is_some() {
        return Ok(Redirect::to(next.as_deref().unwrap_or(DEFAULT_NEXT)));
    }

    let callback_uri = state.config.external_url("/authorize");
    let credentials = state.mmf.get_temporary_credentials(&callback_uri).await?;

    // Replaces any earlier pending token: only the latest login can complete.
    state.sessions.update(&session_id.0, |session| {
        session.pending_token = Some(PendingToken {
            token: credentials.oauth_token.clone(),
            token_secret: credentials.oauth_token_secret.clone(),
        });
        session.next = next;
    });

    tracing::info!(callback = %callback_uri, "Starting OAuth flow, redirecting to MapMyFitness");
    Ok(Redirect::to(&credentials.authorize_url))
}

#[derive(Deserialize)]
pub struct AuthorizeParams {
    #[serde(default)]
    oauth_token: Option<String>,
    #[serde(default)]
    oauth_verifier: Option<String>,
}

/// OAuth callback - exchange the verifier for token credentials, sign the user in.
///
/// The signed-in session gets a fresh id; the pre-login one is discarded.
async fn authorize(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Response> {
    let session = state.sessions.load(&session_id.0);

    let pending = match (&session.pending_token, params.oauth_token.as_deref()) {
        (Some(pending), Some(token)) if tokens_match(&pending.token, token) => pending.clone(),
        _ => {
            tracing::warn!("OAuth callback token does not match pending token");
            state
                .sessions
                .save(&session_id.0, Session::with_flash(Flash::error("Invalid Authorize")));
            return Ok(Redirect::to("/").into_response());
        }
    };

    let verifier = params
        .oauth_verifier
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing oauth_verifier".to_string()))?;

    let credentials = state
        .mmf
        .with_token(&pending.token, &pending.token_secret)
        .get_token_credentials(&verifier)
        .await?;

    let user = get_or_create_user(&state, &credentials).await?;

    tracing::info!(user_id = user.id, username = %user.username, "OAuth successful");

    let next = session.next.unwrap_or_else(|| DEFAULT_NEXT.to_string());
    let new_id = state.sessions.rotate(&session_id.0)?;
    state.sessions.update(&new_id, |session| {
        session.pending_token = None;
        session.next = None;
        session.user = Some(SessionUser::from(&user));
    });

    let jar = CookieJar::new().add(session_cookie(new_id, state.config.secure_cookies()));
    Ok((jar, Redirect::to(&next)).into_response())
}

/// Look up the local user for a MapMyFitness account, creating it on first
/// login. Returning users get their token credentials replaced.
async fn get_or_create_user(state: &AppState, credentials: &TokenCredentials) -> Result<User> {
    if let Some(mut user) = state.db.get_user(credentials.user_id).await? {
        state
            .db
            .update_user_tokens(
                user.id,
                &credentials.oauth_token,
                &credentials.oauth_token_secret,
            )
            .await?;
        user.oauth_token = credentials.oauth_token.clone();
        user.oauth_token_secret = credentials.oauth_token_secret.clone();
        return Ok(user);
    }

    let profile = state
        .mmf
        .with_token(&credentials.oauth_token, &credentials.oauth_token_secret)
        .get_user(credentials.user_id)
        .await?;

    let organization_id = state
        .db
        .get_organization(state.config.default_organization_id)
        .await?
        .map(|org| org.id);
    if organization_id.is_none() {
        tracing::warn!(
            organization_id = state.config.default_organization_id,
            "Default organization missing, creating user without one"
        );
    }

    let user = User {
        id: credentials.user_id,
        username: profile.username,
        email: profile.email,
        first_name: profile.first_name,
        last_name: profile.last_name,
        time_zone: profile.time_zone,
        organization_id,
        oauth_token: credentials.oauth_token.clone(),
        oauth_token_secret: credentials.oauth_token_secret.clone(),
    };
    state.db.insert_user(&user).await?;
    Ok(user)
}

/// Constant-time comparison of the callback token with the pending one.
fn tokens_match(expected: &str, actual: &str) -> bool {
    expected.as_bytes().ct_eq(actual.as_bytes()).into()
}

/// Logout - forget everything about this browser.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
) -> Redirect {
    state
        .sessions
        .save(&session_id.0, Session::with_flash(Flash::info("You were logged out")));
    Redirect::to("/")
}
