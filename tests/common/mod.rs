// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mapmystairs::config::Config;
use mapmystairs::db::Database;
use mapmystairs::models::{Direction, NewStairwell, SessionUser, Stairwell, User, Workout};
use mapmystairs::routes::create_router;
use mapmystairs::session::{Session, SESSION_COOKIE};
use mapmystairs::AppState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// MapMyFitness user id returned by the mock token exchange.
#[allow(dead_code)]
pub const MOCK_USER_ID: i64 = 4242;

/// First workout id handed out by the mock.
#[allow(dead_code)]
pub const FIRST_WORKOUT_ID: i64 = 987;

/// One request seen by the mock MapMyFitness API.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub authorization: String,
    pub body: Option<Value>,
}

/// In-process stand-in for the MapMyFitness API.
#[allow(dead_code)]
pub struct MockMmf {
    pub base_url: String,
    calls: Mutex<Vec<RecordedCall>>,
    fail_workouts: AtomicBool,
    next_workout_id: AtomicI64,
}

#[allow(dead_code)]
impl MockMmf {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.path == path)
            .collect()
    }

    /// Make `POST /workout/` answer 500 until reset.
    pub fn fail_workouts(&self, fail: bool) {
        self.fail_workouts.store(fail, Ordering::SeqCst);
    }

    fn record(&self, method: &str, path: String, headers: &HeaderMap, body: Option<Value>) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            path,
            authorization,
            body,
        });
    }
}

/// Start the mock API on an ephemeral local port.
#[allow(dead_code)]
pub async fn spawn_mock_mmf() -> Arc<MockMmf> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock MapMyFitness API");
    let addr = listener.local_addr().unwrap();

    let mock = Arc::new(MockMmf {
        base_url: format!("http://{}", addr),
        calls: Mutex::new(Vec::new()),
        fail_workouts: AtomicBool::new(false),
        next_workout_id: AtomicI64::new(FIRST_WORKOUT_ID),
    });

    let app = Router::new()
        .route("/oauth/temporary_credential/", post(temporary_credential))
        .route("/oauth/token_credential/", post(token_credential))
        .route("/user/{id}/", get(user_profile))
        .route("/workout/", post(create_workout))
        .with_state(mock.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    mock
}

async fn temporary_credential(State(mock): State<Arc<MockMmf>>, headers: HeaderMap) -> String {
    mock.record("POST", "/oauth/temporary_credential/".to_string(), &headers, None);
    "oauth_token=temp-token&oauth_token_secret=temp-secret&authorize_url=https%3A%2F%2Fwww.mapmyfitness.com%2Foauth%2Fauthorize%2F%3Foauth_token%3Dtemp-token".to_string()
}

async fn token_credential(State(mock): State<Arc<MockMmf>>, headers: HeaderMap) -> String {
    mock.record("POST", "/oauth/token_credential/".to_string(), &headers, None);
    format!(
        "oauth_token=user-token&oauth_token_secret=user-secret&user_id={}",
        MOCK_USER_ID
    )
}

async fn user_profile(
    State(mock): State<Arc<MockMmf>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Json<Value> {
    mock.record("GET", format!("/user/{}/", id), &headers, None);
    Json(json!({
        "id": id,
        "username": "stairmaster",
        "email": "sam@example.com",
        "first_name": "Sam",
        "last_name": "Steps",
        "time_zone": "America/Denver",
        "_links": {"self": [{"href": format!("/v7.0/user/{}/", id), "id": id.to_string()}]}
    }))
}

async fn create_workout(
    State(mock): State<Arc<MockMmf>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let active_time_total = body["aggregates"]["active_time_total"].clone();
    mock.record("POST", "/workout/".to_string(), &headers, Some(body));

    if mock.fail_workouts.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable").into_response();
    }

    let id = mock.next_workout_id.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::CREATED,
        Json(json!({
            "_links": {"self": [{"href": format!("/v7.0/workout/{}/", id), "id": id.to_string()}]},
            "aggregates": {
                "elapsed_time_total": active_time_total,
                "active_time_total": active_time_total,
                "metabolic_energy_total": 418400.0
            }
        })),
    )
        .into_response()
}

/// Router, shared state and the mock API behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mmf: Arc<MockMmf>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub fn session(&self, cookie: &str) -> Session {
        self.state.sessions.load(session_id(cookie))
    }
}

/// Create a test app with an in-memory database and a mock MapMyFitness API.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let mmf = spawn_mock_mmf().await;
    let config = Config {
        mmf_api_url: mmf.base_url.clone(),
        ..Config::default()
    };
    let db = Database::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let state = Arc::new(AppState::new(config, db));

    TestApp {
        router: create_router(state.clone()),
        state,
        mmf,
    }
}

#[allow(dead_code)]
pub async fn seed_stairwell(db: &Database, name: &str, number_of_steps: i64) -> Stairwell {
    db.create_stairwell(&NewStairwell {
        name: name.to_string(),
        city: Some("Denver".to_string()),
        state: Some("CO".to_string()),
        country: Some("US".to_string()),
        postal_code: Some("80202".to_string()),
        number_of_floors: 10,
        number_of_steps,
    })
    .await
    .expect("Failed to seed stairwell")
}

#[allow(dead_code)]
pub async fn seed_user(db: &Database, id: i64, first_name: &str, last_name: &str) -> User {
    let user = User {
        id,
        username: format!("{}{}", first_name.to_lowercase(), id),
        email: None,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        time_zone: "America/Denver".to_string(),
        organization_id: Some(1),
        oauth_token: format!("token-{}", id),
        oauth_token_secret: format!("secret-{}", id),
    };
    db.insert_user(&user).await.expect("Failed to seed user");
    user
}

#[allow(dead_code)]
pub fn workout(
    id: i64,
    user_id: i64,
    stairwell_id: i64,
    direction: Direction,
    time_taken: i64,
    number_of_steps: i64,
    workout_date: &str,
) -> Workout {
    Workout {
        id,
        workout_date: workout_date.parse().expect("Invalid test workout date"),
        user_id,
        stairwell_id,
        direction,
        time_taken,
        number_of_steps,
        energy_burned: 10.0,
    }
}

/// Create an authorized session for `user` and return its cookie header.
#[allow(dead_code)]
pub fn login(state: &AppState, user: &User) -> String {
    let id = state.sessions.generate_id().unwrap();
    state.sessions.save(
        &id,
        Session {
            user: Some(SessionUser::from(user)),
            ..Session::default()
        },
    );
    format!("{}={}", SESSION_COOKIE, id)
}

/// Session id from a `name=value` cookie header.
#[allow(dead_code)]
pub fn session_id(cookie: &str) -> &str {
    cookie
        .strip_prefix(&format!("{}=", SESSION_COOKIE))
        .unwrap_or(cookie)
}

/// `name=value` part of the session `Set-Cookie` header, if any.
#[allow(dead_code)]
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{}=", SESSION_COOKIE)))
        .and_then(|value| value.split(';').next())
        .map(|value| value.to_string())
}

#[allow(dead_code)]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
