// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Stairwell model.

use serde::{Deserialize, Serialize};

/// A physical staircase that users climb. Leaderboards are built per stairwell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stairwell {
    pub id: i64,
    /// Display name (e.g., "HQ East Stairs")
    pub name: String,
    pub city: Option<String>,
    /// Two-letter state code
    pub state: Option<String>,
    /// Two-letter country code
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub number_of_floors: i64,
    /// Steps from bottom to top; credited for every climb in either direction
    pub number_of_steps: i64,
}

/// Fields for creating a stairwell. The id is assigned by the database.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStairwell {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub number_of_floors: i64,
    pub number_of_steps: i64,
}
