// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard route.

use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Leaderboard, SessionUser, Stairwell};
use crate::session::{Flash, SessionId};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/leaderboard", get(leaderboard))
}

#[derive(Deserialize)]
pub struct LeaderboardParams {
    /// Defaults to the configured stairwell
    #[serde(default)]
    stairwell_id: Option<i64>,
    /// Any non-empty value drops the cached leaderboard
    #[serde(default, rename = "_clear_cache")]
    clear_cache: Option<String>,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub user: SessionUser,
    pub stairwell: Stairwell,
    pub leaderboard: Arc<Leaderboard>,
    pub flashes: Vec<Flash>,
}

async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Extension(user): Extension<SessionUser>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>> {
    let stairwell_id = params
        .stairwell_id
        .unwrap_or(state.config.default_stairwell_id);
    let clear_cache = params.clear_cache.is_some_and(|v| !v.is_empty());

    let stairwell = state
        .db
        .get_stairwell(stairwell_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Stairwell {}", stairwell_id)))?;

    let leaderboard = state
        .leaderboard
        .get(&state.db, stairwell_id, clear_cache)
        .await?;

    let mut flashes = state.sessions.take_flashes(&session_id.0);
    if clear_cache {
        flashes.push(Flash::info("Leaderboard Cache Cleared!"));
    }

    Ok(Json(LeaderboardResponse {
        user,
        stairwell,
        leaderboard,
        flashes,
    }))
}
