// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde_json::{Value, json};

pub const TOKEN: &str = "teacher-token";

/// In-memory stand-in for the portal REST API.
#[derive(Default)]
pub struct FakeApi {
    pub roster: Mutex<HashMap<String, Vec<Value>>>,
    pub subjects: Mutex<HashMap<String, Value>>,
    pub submissions: Mutex<Vec<Value>>,

    /// Bodies received by `PUT /submissions/{id}`, in order.
    pub update_bodies: Mutex<Vec<Value>>,
    pub update_calls: AtomicUsize,
    pub last_query: Mutex<Option<HashMap<String, String>>>,

    /// When set, updates answer with this status and optional `{error}` message.
    pub fail_updates: Mutex<Option<(StatusCode, Option<String>)>>,
    pub update_delay: Mutex<Option<Duration>>,
}

impl FakeApi {
    pub fn seeded() -> Arc<Self> {
        let api = FakeApi::default();
        api.roster.lock().unwrap().insert(
            "c1".to_string(),
            vec![
                json!({ "id": "st1", "name": "Asha", "email": "asha@example.com" }),
                json!({ "id": "st2", "name": "Bilal" }),
            ],
        );
        api.subjects.lock().unwrap().insert(
            "s1".to_string(),
            json!({ "id": "s1", "name": "Operating Systems", "num_practicals": 3, "num_group_projects": 1 }),
        );
        *api.submissions.lock().unwrap() = vec![
            submission_json("a", "st1", "Practical 1"),
            submission_json("b", "st1", "Practical 2"),
            submission_json("z", "st2", "Practical 1"),
        ];
        Arc::new(api)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

pub fn submission_json(id: &str, student_id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "github_link": format!("https://github.com/{}/{}", student_id, id),
        "submitted_at": "2024-03-01T10:00:00Z",
        "status": "submitted",
        "marks": null,
        "remarks": null,
        "student_id": student_id,
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn list_students(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(class_id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    match api.roster.lock().unwrap().get(&class_id) {
        Some(students) => Json(students.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Class not found"),
    }
}

async fn get_subject(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(subject_id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    match api.subjects.lock().unwrap().get(&subject_id) {
        Some(subject) => Json(subject.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Subject not found"),
    }
}

async fn list_submissions(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    *api.last_query.lock().unwrap() = Some(query.clone());

    let (Some(student), Some(_class), Some(_subject)) =
        (query.get("student"), query.get("class"), query.get("subject"))
    else {
        return error(StatusCode::BAD_REQUEST, "student, class and subject are required");
    };
    if student == "forbidden" {
        return StatusCode::FORBIDDEN.into_response();
    }

    let rows: Vec<Value> = api
        .submissions
        .lock()
        .unwrap()
        .iter()
        .filter(|s| s["student_id"] == student.as_str())
        .cloned()
        .collect();
    Json(rows).into_response()
}

/// Stores the change and answers with a partial record: the id plus what was sent.
async fn update_submission(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    api.update_calls.fetch_add(1, Ordering::SeqCst);
    api.update_bodies.lock().unwrap().push(body.clone());

    let delay = *api.update_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let failure = api.fail_updates.lock().unwrap().clone();
    if let Some((status, message)) = failure {
        return match message {
            Some(message) => error(status, &message),
            None => status.into_response(),
        };
    }

    let mut rows = api.submissions.lock().unwrap();
    let Some(row) = rows.iter_mut().find(|s| s["id"] == id.as_str()) else {
        return error(StatusCode::NOT_FOUND, "Practical not found");
    };

    let mut patch = body.as_object().cloned().unwrap_or_default();
    for (key, value) in &patch {
        row[key.as_str()] = value.clone();
    }
    patch.insert("id".to_string(), Value::String(id));
    Json(Value::Object(patch)).into_response()
}

/// Spawns the fake API on a random port and returns its base URL.
pub async fn spawn_api(api: Arc<FakeApi>) -> String {
    let app = Router::new()
        .route("/students/{class_id}", get(list_students))
        .route("/subjects/{subject_id}", get(get_subject))
        .route("/submissions", get(list_submissions))
        .route("/submissions/{id}", put(update_submission))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}
