// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite database wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Organizations and stairwells (admin-managed, rarely mutated)
//! - Users (keyed by MapMyFitness user id)
//! - Workouts (insert-only)
//! - Leaderboard aggregate queries

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::AppError;
use crate::models::{
    Direction, FastestWorkout, LeaderboardEntry, NewStairwell, Organization, Stairwell, User,
    Workout,
};

const MAX_CONNECTIONS: u32 = 10;

/// Database client backed by an sqlx connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database at `url`, creating the file if needed.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        tracing::info!(url, "Connected to database");
        Ok(Self { pool })
    }

    /// Create a private in-memory database with the schema applied.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ─── Organization Operations ─────────────────────────────────

    pub async fn create_organization(&self, name: &str) -> Result<Organization, AppError> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name)
            VALUES (?)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(org)
    }

    pub async fn get_organization(&self, id: i64) -> Result<Option<Organization>, AppError> {
        let org = sqlx::query_as::<_, Organization>(
            "SELECT id, name FROM organizations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    // ─── Stairwell Operations ────────────────────────────────────

    pub async fn create_stairwell(&self, new: &NewStairwell) -> Result<Stairwell, AppError> {
        let stairwell = sqlx::query_as::<_, Stairwell>(
            r#"
            INSERT INTO stairwells
                (name, city, state, country, postal_code, number_of_floors, number_of_steps)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, city, state, country, postal_code,
                      number_of_floors, number_of_steps
            "#,
        )
        .bind(&new.name)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.country)
        .bind(&new.postal_code)
        .bind(new.number_of_floors)
        .bind(new.number_of_steps)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(stairwell_id = stairwell.id, name = %stairwell.name, "Created stairwell");
        Ok(stairwell)
    }

    pub async fn get_stairwell(&self, id: i64) -> Result<Option<Stairwell>, AppError> {
        let stairwell = sqlx::query_as::<_, Stairwell>(
            r#"
            SELECT id, name, city, state, country, postal_code,
                   number_of_floors, number_of_steps
            FROM stairwells
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stairwell)
    }

    pub async fn list_stairwells(&self) -> Result<Vec<Stairwell>, AppError> {
        let stairwells = sqlx::query_as::<_, Stairwell>(
            r#"
            SELECT id, name, city, state, country, postal_code,
                   number_of_floors, number_of_steps
            FROM stairwells
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stairwells)
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by MapMyFitness user id.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, first_name, last_name, time_zone,
                   organization_id, oauth_token, oauth_token_secret
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Insert a user first seen during authorization.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, username, email, first_name, last_name, time_zone,
                 organization_id, oauth_token, oauth_token_secret)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.time_zone)
        .bind(user.organization_id)
        .bind(&user.oauth_token)
        .bind(&user.oauth_token_secret)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = user.id, username = %user.username, "Created user");
        Ok(())
    }

    /// Replace a user's OAuth token credentials after re-authorization.
    pub async fn update_user_tokens(
        &self,
        id: i64,
        oauth_token: &str,
        oauth_token_secret: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET oauth_token = ?, oauth_token_secret = ? WHERE id = ?",
        )
        .bind(oauth_token)
        .bind(oauth_token_secret)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {}", id)));
        }
        Ok(())
    }

    // ─── Workout Operations ──────────────────────────────────────

    /// Store a completed workout. Workouts are never updated afterwards.
    pub async fn insert_workout(&self, workout: &Workout) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO workouts
                (id, workout_date, user_id, stairwell_id, direction,
                 time_taken, number_of_steps, energy_burned)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(workout.id)
        .bind(workout.workout_date)
        .bind(workout.user_id)
        .bind(workout.stairwell_id)
        .bind(workout.direction)
        .bind(workout.time_taken)
        .bind(workout.number_of_steps)
        .bind(workout.energy_burned)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_workout(&self, id: i64) -> Result<Option<Workout>, AppError> {
        let workout = sqlx::query_as::<_, Workout>(
            r#"
            SELECT id, workout_date, user_id, stairwell_id, direction,
                   time_taken, number_of_steps, energy_burned
            FROM workouts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(workout)
    }

    /// All workouts a user logged on a stairwell, oldest first.
    pub async fn list_workouts_for_user(
        &self,
        user_id: i64,
        stairwell_id: i64,
    ) -> Result<Vec<Workout>, AppError> {
        let workouts = sqlx::query_as::<_, Workout>(
            r#"
            SELECT id, workout_date, user_id, stairwell_id, direction,
                   time_taken, number_of_steps, energy_burned
            FROM workouts
            WHERE user_id = ? AND stairwell_id = ?
            ORDER BY workout_date, id
            "#,
        )
        .bind(user_id)
        .bind(stairwell_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(workouts)
    }

    // ─── Leaderboard Queries ─────────────────────────────────────

    /// Fastest single workout in `direction` on a stairwell.
    pub async fn fastest_workout(
        &self,
        stairwell_id: i64,
        direction: Direction,
    ) -> Result<Option<FastestWorkout>, AppError> {
        let fastest = sqlx::query_as::<_, FastestWorkout>(
            r#"
            SELECT
                u.id AS user_id, u.first_name, u.last_name,
                w.workout_date,
                w.time_taken, w.energy_burned, w.number_of_steps
            FROM workouts w
            INNER JOIN users u ON u.id = w.user_id
            WHERE w.stairwell_id = ? AND w.direction = ?
            ORDER BY w.time_taken ASC, w.workout_date ASC
            LIMIT 1
            "#,
        )
        .bind(stairwell_id)
        .bind(direction)
        .fetch_optional(&self.pool)
        .await?;
        Ok(fastest)
    }

    /// Per-user, per-direction totals on a stairwell, most steps first.
    pub async fn leaderboard_entries(
        &self,
        stairwell_id: i64,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT
                u.id AS user_id, u.first_name, u.last_name, w.direction,
                CAST(COUNT(w.id) AS INTEGER) AS workout_count,
                CAST(MIN(w.time_taken) AS INTEGER) AS min_time_taken,
                CAST(TOTAL(w.energy_burned) AS REAL) AS total_energy_burned,
                CAST(SUM(w.number_of_steps) AS INTEGER) AS total_number_of_steps
            FROM workouts w
            INNER JOIN users u ON u.id = w.user_id
            WHERE w.stairwell_id = ?
            GROUP BY u.id, u.first_name, u.last_name, w.direction
            ORDER BY SUM(w.number_of_steps) DESC, u.id ASC, w.direction ASC
            "#,
        )
        .bind(stairwell_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
