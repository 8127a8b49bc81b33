// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stair climb timing.
//!
//! A climb starts when the user scans one end of a stairwell and finishes
//! when they scan the other end. The state lives in the browser session:
//!
//! ```text
//! Idle ──scan──▶ Started ──scan other end──▶ Saving ──ok──▶ Idle
//!                  │  ▲                        │
//!          same end│  │          remote failed │ local failed
//!                  └──┘                ▼       ▼
//!                                PendingSync  PendingStore
//! ```
//!
//! A scan in either pending state claims the climb again (`Saving`) and
//! resumes where it stopped: `PendingSync` posts to MapMyFitness,
//! `PendingStore` only writes the local row. While a climb is `Saving` no
//! other request may touch it. Cancelling from any state returns to Idle.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::error::AppError;
use crate::models::{Direction, Stairwell, Workout};
use crate::services::mmf::{
    activity_type_ref, CreatedWorkout, MmfClient, NewWorkout, NewWorkoutAggregates,
    NewWorkoutTimeSeries, STAIRS_ACTIVITY_TYPE_ID, WORKOUT_PRIVACY,
};
use crate::time_utils::{elapsed_seconds, format_mmf_datetime, format_utc_rfc3339};

/// Recorded when a climb begins.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimbStart {
    pub started_at: DateTime<Utc>,
    pub stairwell_id: i64,
    pub stairwell_name: String,
    pub number_of_steps: i64,
    pub direction: Direction,
    /// Climber's zone, forwarded to MapMyFitness as the workout locale
    pub time_zone: String,
}

impl ClimbStart {
    pub fn new(
        stairwell: &Stairwell,
        direction: Direction,
        time_zone: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            started_at: now,
            stairwell_id: stairwell.id,
            stairwell_name: stairwell.name.clone(),
            number_of_steps: stairwell.number_of_steps,
            direction,
            time_zone: time_zone.to_string(),
        }
    }
}

/// A climb whose duration is fixed. Retries reuse `elapsed_seconds` as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedClimb {
    pub start: ClimbStart,
    pub finished_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
}

impl FinishedClimb {
    pub fn new(start: ClimbStart, finished_at: DateTime<Utc>) -> Self {
        let elapsed_seconds = elapsed_seconds(start.started_at, finished_at);
        Self {
            start,
            finished_at,
            elapsed_seconds,
        }
    }
}

/// Climb slot stored in the session. Absent means idle.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkoutState {
    Started(ClimbStart),
    /// Claimed by the request that is saving it
    Saving,
    /// Finished but not yet accepted by MapMyFitness
    PendingSync(FinishedClimb),
    /// Accepted by MapMyFitness but not yet stored locally
    PendingStore(Workout),
}

/// What a scan of `direction` should do given the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// No climb in progress: start one.
    Begin,
    /// Scanned the same end again: report progress, change nothing.
    Refresh {
        start: ClimbStart,
        elapsed_seconds: f64,
    },
    /// Submit this climb.
    Finish(FinishedClimb),
    /// Store a workout MapMyFitness already has.
    Store(Workout),
    /// Another request is saving this climb.
    Busy,
}

impl Step {
    fn saves(&self) -> bool {
        matches!(self, Step::Finish(_) | Step::Store(_))
    }
}

/// Decide the next step. Pure; the caller performs I/O.
pub fn advance(state: Option<&WorkoutState>, direction: Direction, now: DateTime<Utc>) -> Step {
    match state {
        None => Step::Begin,
        Some(WorkoutState::Started(start)) if start.direction == direction => Step::Refresh {
            start: start.clone(),
            elapsed_seconds: elapsed_seconds(start.started_at, now),
        },
        Some(WorkoutState::Started(start)) => Step::Finish(FinishedClimb::new(start.clone(), now)),
        Some(WorkoutState::Saving) => Step::Busy,
        Some(WorkoutState::PendingSync(finished)) => Step::Finish(finished.clone()),
        Some(WorkoutState::PendingStore(workout)) => Step::Store(workout.clone()),
    }
}

/// `advance`, marking the slot `Saving` when the step saves.
///
/// Run under the session lock so only one request can claim a climb.
pub fn claim(
    slot: &mut Option<WorkoutState>,
    direction: Direction,
    now: DateTime<Utc>,
) -> Step {
    let step = advance(slot.as_ref(), direction, now);
    if step.saves() {
        *slot = Some(WorkoutState::Saving);
    }
    step
}

/// Build the MapMyFitness workout body for a finished climb.
pub fn build_new_workout(climb: &FinishedClimb) -> NewWorkout {
    let start = &climb.start;
    NewWorkout {
        start_datetime: format_mmf_datetime(start.started_at),
        name: format!("walked {} {} stairs", start.direction, start.number_of_steps),
        notes: format!("climbed {}", start.stairwell_name),
        privacy: WORKOUT_PRIVACY.to_string(),
        aggregates: NewWorkoutAggregates {
            active_time_total: climb.elapsed_seconds,
        },
        time_series: NewWorkoutTimeSeries {
            steps: vec![(0.0, 0), (climb.elapsed_seconds, start.number_of_steps)],
        },
        start_locale_timezone: start.time_zone.clone(),
        activity_type: activity_type_ref(STAIRS_ACTIVITY_TYPE_ID),
    }
}

/// Local record for a workout MapMyFitness accepted.
pub fn workout_from_created(
    user_id: i64,
    climb: &FinishedClimb,
    created: &CreatedWorkout,
) -> Result<Workout, AppError> {
    Ok(Workout {
        id: created.workout_id()?,
        workout_date: climb.start.started_at,
        user_id,
        stairwell_id: climb.start.stairwell_id,
        direction: climb.start.direction,
        time_taken: created.time_taken_seconds(),
        number_of_steps: climb.start.number_of_steps,
        energy_burned: created.energy_burned_kcal(),
    })
}

/// A save that did not complete.
#[derive(Debug)]
pub struct SaveFailure {
    /// Where a later scan resumes; `None` drops the climb.
    pub retry: Option<WorkoutState>,
    pub error: AppError,
}

/// Post a finished climb to MapMyFitness and store it locally.
///
/// `mmf` must carry the climber's token credentials.
pub async fn submit_climb(
    mmf: &MmfClient,
    db: &Database,
    user_id: i64,
    climb: &FinishedClimb,
) -> Result<Workout, SaveFailure> {
    let created = mmf
        .create_workout(&build_new_workout(climb))
        .await
        .map_err(|error| SaveFailure {
            retry: Some(WorkoutState::PendingSync(climb.clone())),
            error,
        })?;

    // MapMyFitness has the workout now; posting again would duplicate it.
    let workout = workout_from_created(user_id, climb, &created).map_err(|error| {
        tracing::error!(user_id, error = %error, "Unusable workout response, dropping climb");
        SaveFailure { retry: None, error }
    })?;

    store_workout(db, workout).await
}

/// Store a workout MapMyFitness accepted.
pub async fn store_workout(db: &Database, workout: Workout) -> Result<Workout, SaveFailure> {
    if let Err(error) = db.insert_workout(&workout).await {
        tracing::error!(
            user_id = workout.user_id,
            remote_workout_id = workout.id,
            error = %error,
            "Workout saved to MapMyFitness but not stored locally"
        );
        return Err(SaveFailure {
            retry: Some(WorkoutState::PendingStore(workout)),
            error,
        });
    }

    tracing::info!(
        user_id = workout.user_id,
        workout_id = workout.id,
        stairwell_id = workout.stairwell_id,
        direction = %workout.direction,
        time_taken = workout.time_taken,
        "Stored workout"
    );
    Ok(workout)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimbStatus {
    Started,
    InProgress,
}

/// JSON view of the climb in progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimbView {
    pub status: ClimbStatus,
    pub stairwell_id: i64,
    pub stairwell_name: String,
    pub direction: Direction,
    pub number_of_steps: i64,
    pub started_at: String,
    pub elapsed_seconds: f64,
}

impl ClimbView {
    pub fn new(status: ClimbStatus, start: &ClimbStart, elapsed_seconds: f64) -> Self {
        Self {
            status,
            stairwell_id: start.stairwell_id,
            stairwell_name: start.stairwell_name.clone(),
            direction: start.direction,
            number_of_steps: start.number_of_steps,
            started_at: format_utc_rfc3339(start.started_at),
            elapsed_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn stairwell() -> Stairwell {
        Stairwell {
            id: 3,
            name: "HQ East Stairs".to_string(),
            city: Some("Denver".to_string()),
            state: Some("CO".to_string()),
            country: Some("US".to_string()),
            postal_code: None,
            number_of_floors: 10,
            number_of_steps: 180,
        }
    }

    fn start_at(direction: Direction) -> ClimbStart {
        let t0 = Utc.with_ymd_and_hms(2014, 3, 9, 17, 5, 0).unwrap();
        ClimbStart::new(&stairwell(), direction, "America/Denver", t0)
    }

    #[test]
    fn test_idle_begins() {
        assert_eq!(advance(None, Direction::Up, Utc::now()), Step::Begin);
    }

    #[test]
    fn test_same_direction_refreshes() {
        let start = start_at(Direction::Up);
        let now = start.started_at + Duration::seconds(12);
        let state = WorkoutState::Started(start.clone());

        assert_eq!(
            advance(Some(&state), Direction::Up, now),
            Step::Refresh {
                start,
                elapsed_seconds: 12.0
            }
        );
    }

    #[test]
    fn test_other_direction_finishes() {
        let start = start_at(Direction::Up);
        let now = start.started_at + Duration::milliseconds(42_250);
        let state = WorkoutState::Started(start.clone());

        match advance(Some(&state), Direction::Down, now) {
            Step::Finish(climb) => {
                assert_eq!(climb.start, start);
                assert_eq!(climb.finished_at, now);
                assert_eq!(climb.elapsed_seconds, 42.25);
            }
            other => panic!("Expected Finish, got {:?}", other),
        }
    }

    #[test]
    fn test_pending_sync_keeps_frozen_time() {
        let start = start_at(Direction::Down);
        let finished = FinishedClimb::new(start.clone(), start.started_at + Duration::seconds(30));
        let state = WorkoutState::PendingSync(finished.clone());

        // An hour later, either end of the stairwell retries the same climb
        let later = start.started_at + Duration::hours(1);
        assert_eq!(
            advance(Some(&state), Direction::Down, later),
            Step::Finish(finished.clone())
        );
        assert_eq!(
            advance(Some(&state), Direction::Up, later),
            Step::Finish(finished)
        );
    }

    #[test]
    fn test_pending_store_only_stores() {
        let start = start_at(Direction::Up);
        let climb = FinishedClimb::new(start.clone(), start.started_at + Duration::seconds(40));
        let created: CreatedWorkout = serde_json::from_value(json!({
            "_links": {"self": [{"id": "777"}]},
            "aggregates": {"elapsed_time_total": 40.0}
        }))
        .unwrap();
        let workout = workout_from_created(12, &climb, &created).unwrap();
        let state = WorkoutState::PendingStore(workout.clone());

        assert_eq!(
            advance(Some(&state), Direction::Down, Utc::now()),
            Step::Store(workout)
        );
    }

    #[test]
    fn test_claim_marks_saving() {
        let start = start_at(Direction::Up);
        let now = start.started_at + Duration::seconds(20);
        let mut slot = Some(WorkoutState::Started(start));

        assert!(matches!(
            claim(&mut slot, Direction::Down, now),
            Step::Finish(_)
        ));
        assert_eq!(slot, Some(WorkoutState::Saving));

        // A second finishing scan finds the climb taken
        assert_eq!(claim(&mut slot, Direction::Down, now), Step::Busy);
        assert_eq!(slot, Some(WorkoutState::Saving));
    }

    #[test]
    fn test_claim_leaves_refresh_and_begin_alone() {
        let start = start_at(Direction::Up);
        let mut slot = Some(WorkoutState::Started(start.clone()));
        assert!(matches!(
            claim(&mut slot, Direction::Up, start.started_at),
            Step::Refresh { .. }
        ));
        assert_eq!(slot, Some(WorkoutState::Started(start)));

        let mut idle = None;
        assert_eq!(claim(&mut idle, Direction::Up, Utc::now()), Step::Begin);
        assert_eq!(idle, None);
    }

    #[test]
    fn test_build_new_workout() {
        let start = start_at(Direction::Up);
        let climb = FinishedClimb::new(start.clone(), start.started_at + Duration::seconds(42));

        let workout = build_new_workout(&climb);
        assert_eq!(
            serde_json::to_value(&workout).unwrap(),
            json!({
                "start_datetime": "2014-03-09 17:05:00 UTC",
                "name": "walked up 180 stairs",
                "notes": "climbed HQ East Stairs",
                "privacy": "/v7.0/privacy_option/1/",
                "aggregates": {"active_time_total": 42.0},
                "time_series": {"steps": [[0.0, 0], [42.0, 180]]},
                "start_locale_timezone": "America/Denver",
                "activity_type": "/v7.0/activity_type/133/"
            })
        );
    }

    #[test]
    fn test_workout_from_created_uses_started_direction() {
        let start = start_at(Direction::Down);
        let climb = FinishedClimb::new(start.clone(), start.started_at + Duration::seconds(40));
        let created: CreatedWorkout = serde_json::from_value(json!({
            "_links": {"self": [{"id": "777"}]},
            "aggregates": {"elapsed_time_total": 40.4, "metabolic_energy_total": 418400.0}
        }))
        .unwrap();

        let workout = workout_from_created(12, &climb, &created).unwrap();
        assert_eq!(workout.id, 777);
        assert_eq!(workout.user_id, 12);
        assert_eq!(workout.stairwell_id, 3);
        assert_eq!(workout.direction, Direction::Down);
        assert_eq!(workout.time_taken, 40);
        assert_eq!(workout.number_of_steps, 180);
        assert_eq!(workout.workout_date, start.started_at);
        assert!((workout.energy_burned - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_climb_view() {
        let start = start_at(Direction::Up);
        let view = ClimbView::new(ClimbStatus::InProgress, &start, 5.5);

        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({
                "status": "in_progress",
                "stairwell_id": 3,
                "stairwell_name": "HQ East Stairs",
                "direction": "up",
                "number_of_steps": 180,
                "started_at": "2014-03-09T17:05:00Z",
                "elapsed_seconds": 5.5
            })
        );
    }
}
