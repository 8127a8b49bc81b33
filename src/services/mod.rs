// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod leaderboard;
pub mod mmf;
pub mod workout;

pub use leaderboard::LeaderboardService;
pub use mmf::MmfClient;
pub use workout::{ClimbStart, FinishedClimb, WorkoutState};
