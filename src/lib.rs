// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! MapMyStairs: stair-climb leaderboards backed by MapMyFitness
//!
//! Users sign in with their MapMyFitness account, scan a link at one end
//! of a stairwell to start a climb and at the other end to finish it. Each
//! climb is posted to MapMyFitness as a workout and ranked on the
//! stairwell's leaderboard.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{LeaderboardService, MmfClient};
use session::SessionStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    /// Client holding application credentials only
    pub mmf: MmfClient,
    pub sessions: SessionStore,
    pub leaderboard: LeaderboardService,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let mmf = MmfClient::new(&config.mmf_api_key, &config.mmf_api_secret)
            .with_base_url(&config.mmf_api_url);
        let sessions = SessionStore::new(chrono::Duration::hours(config.session_ttl_hours));

        Self {
            config,
            db,
            mmf,
            sessions,
            leaderboard: LeaderboardService::new(),
        }
    }
}
