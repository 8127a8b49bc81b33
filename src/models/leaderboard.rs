//! Leaderboard aggregates for a single stairwell.
//!
//! Computed from stored workouts by SQL aggregate queries and cached
//! briefly by `LeaderboardService`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Direction;

/// The single fastest workout in one direction.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FastestWorkout {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub workout_date: DateTime<Utc>,
    pub time_taken: i64,
    pub energy_burned: f64,
    pub number_of_steps: i64,
}

/// Per-user, per-direction summary row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub direction: Direction,
    pub workout_count: i64,
    pub min_time_taken: i64,
    pub total_energy_burned: f64,
    pub total_number_of_steps: i64,
}

/// Everything shown on a stairwell's leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub stairwell_id: i64,
    pub fastest_up: Option<FastestWorkout>,
    pub fastest_down: Option<FastestWorkout>,
    /// Ordered by total steps, most first
    pub entries: Vec<LeaderboardEntry>,
    pub computed_at: DateTime<Utc>,
}
