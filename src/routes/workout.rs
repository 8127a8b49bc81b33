// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stair climb route: scan one end to start, the other end to finish.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Direction, SessionUser};
use crate::services::workout::{
    claim, store_workout, submit_climb, ClimbStart, ClimbStatus, ClimbView, SaveFailure, Step,
    WorkoutState,
};
use crate::session::{Flash, Session, SessionId};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/workout/{stairwell_id}/{direction}", get(workout))
}

#[derive(Deserialize)]
pub struct WorkoutParams {
    /// Any non-empty value abandons the climb in progress
    #[serde(default)]
    cancel_flag: Option<String>,
}

async fn workout(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Extension(user): Extension<SessionUser>,
    Path((stairwell_id, direction)): Path<(i64, String)>,
    Query(params): Query<WorkoutParams>,
) -> Result<Response> {
    let id = session_id.0.as_str();

    if params.cancel_flag.is_some_and(|flag| !flag.is_empty()) {
        let abandoned = state.sessions.update(id, |session| {
            session.flash(Flash::info("Stair Climb Cancelled!"));
            session.workout.take()
        });
        match abandoned {
            Some(WorkoutState::PendingSync(climb)) => tracing::warn!(
                user_id = user.id,
                stairwell_id = climb.start.stairwell_id,
                elapsed_seconds = climb.elapsed_seconds,
                "Abandoned unsynced climb"
            ),
            Some(WorkoutState::PendingStore(workout)) => tracing::warn!(
                user_id = user.id,
                remote_workout_id = workout.id,
                "Abandoned climb already on MapMyFitness"
            ),
            _ => {}
        }
        return Ok(Redirect::to("/leaderboard").into_response());
    }

    let direction: Direction = direction.parse().map_err(AppError::BadRequest)?;
    let now = Utc::now();
    let step = state
        .sessions
        .update(id, |session| claim(&mut session.workout, direction, now));

    let saved = match step {
        Step::Begin => {
            let stairwell = state
                .db
                .get_stairwell(stairwell_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Stairwell {}", stairwell_id)))?;

            let start = ClimbStart::new(&stairwell, direction, &user.time_zone, now);
            state.sessions.update(id, |session| {
                session.workout = Some(WorkoutState::Started(start.clone()));
            });

            tracing::info!(user_id = user.id, stairwell_id, direction = %direction, "Climb started");
            return Ok(Json(ClimbView::new(ClimbStatus::Started, &start, 0.0)).into_response());
        }

        Step::Refresh {
            start,
            elapsed_seconds,
        } => {
            return Ok(
                Json(ClimbView::new(ClimbStatus::InProgress, &start, elapsed_seconds))
                    .into_response(),
            )
        }

        Step::Busy => {
            return Err(AppError::Conflict(
                "Stair climb is already being saved".to_string(),
            ))
        }

        Step::Finish(climb) => {
            let mmf = state
                .mmf
                .with_token(&user.oauth_token, &user.oauth_token_secret);
            submit_climb(&mmf, &state.db, user.id, &climb).await
        }

        Step::Store(workout) => store_workout(&state.db, workout).await,
    };

    match saved {
        Ok(_) => {
            state.sessions.update(id, |session| {
                if still_claimed(session) {
                    session.workout = None;
                }
                session.flash(Flash::success("Stair Climb Saved!"));
            });
            Ok(Redirect::to("/leaderboard").into_response())
        }
        Err(SaveFailure { retry, error }) => {
            tracing::warn!(
                user_id = user.id,
                will_retry = retry.is_some(),
                error = %error,
                "Climb not saved"
            );
            state.sessions.update(id, |session| {
                if still_claimed(session) {
                    session.workout = retry;
                }
            });
            Err(error)
        }
    }
}

/// Whether the climb is still claimed by a save. A cancel while saving wins.
fn still_claimed(session: &Session) -> bool {
    matches!(session.workout, Some(WorkoutState::Saving))
}
