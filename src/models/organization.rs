// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

use serde::{Deserialize, Serialize};

/// Groups users so that several organizations can keep separate
/// leaderboards, or compete against each other in a shared building.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub id: i64,
    pub name: String,
}
