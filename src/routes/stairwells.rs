// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stairwell listing and detail routes.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Direction, Stairwell};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stairwells", get(list_stairwells))
        .route("/stairwell/{id}", get(get_stairwell))
}

#[derive(Serialize)]
pub struct StairwellListResponse {
    pub stairwells: Vec<Stairwell>,
}

async fn list_stairwells(State(state): State<Arc<AppState>>) -> Result<Json<StairwellListResponse>> {
    let stairwells = state.db.list_stairwells().await?;
    Ok(Json(StairwellListResponse { stairwells }))
}

/// Stairwell detail with the links posted at each end.
#[derive(Serialize)]
pub struct StairwellResponse {
    pub stairwell: Stairwell,
    /// Scan at the bottom
    pub up_link: String,
    /// Scan at the top
    pub down_link: String,
}

async fn get_stairwell(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<StairwellResponse>> {
    let stairwell = state
        .db
        .get_stairwell(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Stairwell {}", id)))?;

    Ok(Json(StairwellResponse {
        up_link: workout_link(&state, stairwell.id, Direction::Up),
        down_link: workout_link(&state, stairwell.id, Direction::Down),
        stairwell,
    }))
}

/// Absolute URL of the workout route for one end of a stairwell.
fn workout_link(state: &AppState, stairwell_id: i64, direction: Direction) -> String {
    state
        .config
        .external_url(&format!("/workout/{}/{}", stairwell_id, direction))
}
