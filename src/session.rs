// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side browser sessions.
//!
//! The browser only holds a random session id in an HttpOnly cookie. All
//! session state (pending OAuth credentials, the logged-in user, the climb in
//! progress, flash messages) stays in process memory, typed, so nothing is
//! lost or reinterpreted between requests.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::SessionUser;
use crate::services::workout::WorkoutState;

/// Name of the session id cookie.
pub const SESSION_COOKIE: &str = "mapmystairs_session";

const SESSION_ID_BYTES: usize = 32;

/// Temporary OAuth1 credentials issued by `/login`, awaiting the callback.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingToken {
    pub token: String,
    pub token_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Info,
    Success,
    Error,
}

/// One-shot message shown on the next page the user sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Error,
            message: message.into(),
        }
    }
}

/// Everything remembered about one browser between requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Set by `/login`, consumed by `/authorize`. At most one at a time.
    pub pending_token: Option<PendingToken>,
    /// Local path to return to once authorized
    pub next: Option<String>,
    /// Present once the OAuth handshake completed
    pub user: Option<SessionUser>,
    /// Climb in progress; `None` means idle
    pub workout: Option<WorkoutState>,
    pub flashes: Vec<Flash>,
}

impl Session {
    /// A fresh session carrying only a flash message.
    pub fn with_flash(flash: Flash) -> Self {
        Self {
            flashes: vec![flash],
            ..Self::default()
        }
    }

    pub fn flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    /// Drain flash messages for display.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

/// Session id attached to each request by the session middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

struct StoredSession {
    session: Session,
    last_seen: DateTime<Utc>,
}

/// In-memory session store shared by all requests.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, StoredSession>>,
    ttl: Duration,
    rng: SystemRandom,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
            rng: SystemRandom::new(),
        }
    }

    /// Generate an unguessable session id. Nothing is stored until `save`.
    pub fn generate_id(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        Ok(hex::encode(bytes))
    }

    /// Whether `id` names a live session.
    pub fn contains(&self, id: &str) -> bool {
        self.live(id, Utc::now())
    }

    /// Snapshot of a session; unknown or expired ids yield an empty session.
    pub fn load(&self, id: &str) -> Session {
        let now = Utc::now();
        if !self.live(id, now) {
            return Session::default();
        }
        self.sessions
            .get(id)
            .map(|stored| stored.session.clone())
            .unwrap_or_default()
    }

    /// Store a session, creating it if needed.
    pub fn save(&self, id: &str, session: Session) {
        let now = Utc::now();
        if !self.sessions.contains_key(id) {
            self.sweep(now);
        }
        self.sessions.insert(
            id.to_string(),
            StoredSession {
                session,
                last_seen: now,
            },
        );
    }

    /// Modify a session in place and return the closure's result.
    ///
    /// The entry stays locked while `f` runs, so concurrent updates of one
    /// session never interleave. `f` must not touch the store.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let now = Utc::now();
        if !self.live(id, now) {
            self.sweep(now);
        }
        let mut stored = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| StoredSession {
                session: Session::default(),
                last_seen: now,
            });
        stored.last_seen = now;
        f(&mut stored.session)
    }

    /// Move a session to a fresh id and return it. The old id stops working.
    pub fn rotate(&self, id: &str) -> Result<String, AppError> {
        let new_id = self.generate_id()?;
        let session = self
            .sessions
            .remove(id)
            .map(|(_, stored)| stored.session)
            .unwrap_or_default();
        self.save(&new_id, session);
        Ok(new_id)
    }

    /// Drain pending flash messages. Sessions without any are left untouched.
    pub fn take_flashes(&self, id: &str) -> Vec<Flash> {
        if self.load(id).flashes.is_empty() {
            return Vec::new();
        }
        self.update(id, |session| session.take_flashes())
    }

    /// Forget a session entirely.
    pub fn remove(&self, id: &str) {
        self.sessions.remove(id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn live(&self, id: &str, now: DateTime<Utc>) -> bool {
        let expired = match self.sessions.get(id) {
            Some(stored) => now - stored.last_seen > self.ttl,
            None => return false,
        };
        if expired {
            tracing::debug!("Dropping expired session");
            self.sessions.remove(id);
        }
        !expired
    }

    /// Drop every session idle for longer than the TTL.
    fn sweep(&self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.sessions.retain(|_, stored| now - stored.last_seen <= ttl);
    }
}
