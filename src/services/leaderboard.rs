// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-stairwell leaderboard with a short-lived in-memory cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;

use crate::db::Database;
use crate::error::AppError;
use crate::models::{Direction, Leaderboard};

/// How long a computed leaderboard is served before recomputing.
pub const LEADERBOARD_CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct CachedLeaderboard {
    leaderboard: Arc<Leaderboard>,
    expires_at: Instant,
}

/// Cached leaderboards keyed by stairwell id.
type LeaderboardCache = Arc<DashMap<i64, CachedLeaderboard>>;

/// Computes leaderboards from stored workouts and caches them briefly.
///
/// Concurrent misses may compute the same leaderboard twice; the last
/// writer wins. Entries are never locked across an await.
#[derive(Clone)]
pub struct LeaderboardService {
    cache: LeaderboardCache,
    ttl: Duration,
}

impl Default for LeaderboardService {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaderboardService {
    pub fn new() -> Self {
        Self::with_ttl(LEADERBOARD_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Leaderboard for a stairwell. `clear_cache` forces a recompute.
    pub async fn get(
        &self,
        db: &Database,
        stairwell_id: i64,
        clear_cache: bool,
    ) -> Result<Arc<Leaderboard>, AppError> {
        if clear_cache {
            self.invalidate(stairwell_id);
        } else if let Some(cached) = self.cached(stairwell_id) {
            return Ok(cached);
        }

        let leaderboard = Arc::new(compute(db, stairwell_id).await?);
        self.cache.insert(
            stairwell_id,
            CachedLeaderboard {
                leaderboard: leaderboard.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(leaderboard)
    }

    /// Drop the cached leaderboard for a stairwell.
    pub fn invalidate(&self, stairwell_id: i64) {
        if self.cache.remove(&stairwell_id).is_some() {
            tracing::debug!(stairwell_id, "Cleared leaderboard cache");
        }
    }

    fn cached(&self, stairwell_id: i64) -> Option<Arc<Leaderboard>> {
        self.cache
            .get(&stairwell_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.leaderboard.clone())
    }
}

async fn compute(db: &Database, stairwell_id: i64) -> Result<Leaderboard, AppError> {
    let (fastest_up, fastest_down, entries) = tokio::try_join!(
        db.fastest_workout(stairwell_id, Direction::Up),
        db.fastest_workout(stairwell_id, Direction::Down),
        db.leaderboard_entries(stairwell_id),
    )?;

    tracing::debug!(stairwell_id, entries = entries.len(), "Computed leaderboard");

    Ok(Leaderboard {
        stairwell_id,
        fastest_up,
        fastest_down,
        entries,
        computed_at: Utc::now(),
    })
}
