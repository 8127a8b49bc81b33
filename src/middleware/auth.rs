// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login-required middleware.

use crate::session::SessionId;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use std::sync::Arc;

/// Middleware that requires an authorized session.
///
/// Inserts the session's `SessionUser` as a request extension. Anonymous
/// requests are redirected to `/login` with the original path as `next`.
pub async fn require_login(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.sessions.load(&session_id.0).user {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            let path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            tracing::debug!(path, "Login required");
            Redirect::to(&login_url(path)).into_response()
        }
    }
}

/// `/login` URL that returns to `path` afterwards.
pub fn login_url(path: &str) -> String {
    format!("/login?next={}", urlencoding::encode(path))
}

/// Whether `next` is safe to redirect to: a local absolute path.
pub fn is_local_path(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(
            login_url("/workout/1/up?cancel_flag=1"),
            "/login?next=%2Fworkout%2F1%2Fup%3Fcancel_flag%3D1"
        );
    }

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("/leaderboard"));
        assert!(is_local_path("/workout/1/up"));
        assert!(!is_local_path("//evil.example.com/"));
        assert!(!is_local_path("/\\evil.example.com"));
        assert!(!is_local_path("https://evil.example.com/"));
        assert!(!is_local_path(""));
    }
}
