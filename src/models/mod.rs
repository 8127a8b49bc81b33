// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod leaderboard;
pub mod organization;
pub mod stairwell;
pub mod user;
pub mod workout;

pub use leaderboard::{FastestWorkout, Leaderboard, LeaderboardEntry};
pub use organization::Organization;
pub use stairwell::{NewStairwell, Stairwell};
pub use user::{SessionUser, User};
pub use workout::{Direction, Workout};
