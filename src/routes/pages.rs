// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Landing and about pages.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::session::{Flash, SessionId};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/about", get(about))
}

#[derive(Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub login_url: String,
    pub flashes: Vec<Flash>,
}

/// Landing page. Signed-in users go straight to the leaderboard.
async fn index(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
) -> Response {
    if state.sessions.load(&session_id.0).user.is_some() {
        return Redirect::to("/leaderboard").into_response();
    }

    Json(IndexResponse {
        message: "Welcome to MapMyStairs. Sign in with MapMyFitness to start climbing.".to_string(),
        login_url: "/login".to_string(),
        flashes: state.sessions.take_flashes(&session_id.0),
    })
    .into_response()
}

#[derive(Serialize)]
pub struct AboutResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

async fn about() -> Json<AboutResponse> {
    Json(AboutResponse {
        name: "MapMyStairs",
        version: env!("CARGO_PKG_VERSION"),
        description: "Time your stair climbs, log them to MapMyFitness and race your coworkers up the leaderboard.",
    })
}
