// libs/appointment-cell/tests/router_test.rs

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::{appointment_routes, AppointmentCellState};
use shared_database::{ClinicStore, InMemoryStore};
use shared_models::clinic::{ClinicUser, VerificationStatus};
use shared_utils::clock::{Clock, FixedClock};
use shared_utils::test_utils::{ClinicFixtures, JwtTestUtils, TestConfig, TestUser};
use video_conferencing_cell::StubVideoProvider;

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
}

struct Party {
    external: TestUser,
    record: ClinicUser,
}

struct Harness {
    store: Arc<InMemoryStore>,
    clock: Arc<FixedClock>,
    video: Arc<StubVideoProvider>,
    state: AppointmentCellState,
    secret: String,
}

impl Harness {
    fn new() -> Self {
        let config = TestConfig::default();
        let clock = Arc::new(FixedClock::new(at(8, 0)));
        let store = Arc::new(InMemoryStore::with_time_source({
            let clock = Arc::clone(&clock);
            move || clock.now()
        }));
        let video = Arc::new(StubVideoProvider::new());
        let state = AppointmentCellState::new(config.to_arc(), store.clone(), video.clone(), clock.clone());
        Self {
            store,
            clock,
            video,
            state,
            secret: config.jwt_secret,
        }
    }

    fn app(&self) -> Router {
        appointment_routes(self.state.clone())
    }

    async fn patient(&self, email: &str, credits: i64) -> Party {
        let external = TestUser::patient(email);
        let record = ClinicFixtures::patient(&external, credits);
        self.store.insert_user(record.clone()).await;
        Party { external, record }
    }

    async fn doctor(&self, email: &str) -> Party {
        let external = TestUser::doctor(email);
        let record = ClinicFixtures::doctor(&external, VerificationStatus::Verified);
        self.store.insert_user(record.clone()).await;
        Party { external, record }
    }

    fn token(&self, party: &Party) -> String {
        JwtTestUtils::create_test_token(&party.external, &self.secret, Some(1))
    }

    async fn credits(&self, party: &Party) -> i64 {
        self.store.find_user(party.record.id).await.unwrap().unwrap().credits
    }
}

async fn send(app: Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn booking(doctor: &Party, start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
    json!({
        "doctor_id": doctor.record.id,
        "start_time": start,
        "end_time": end,
        "description": "Persistent cough"
    })
}

#[tokio::test]
async fn booking_requires_a_token() {
    let harness = Harness::new();
    let doctor = harness.doctor("doc@example.com").await;

    let (status, _) = send(
        harness.app(),
        Method::POST,
        "/",
        None,
        Some(booking(&doctor, at(10, 0), at(10, 30))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn second_patient_cannot_take_an_overlapping_slot() {
    let harness = Harness::new();
    let doctor = harness.doctor("doc@example.com").await;
    let first = harness.patient("first@example.com", 5).await;
    let second = harness.patient("second@example.com", 5).await;

    let (status, body) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&first)),
        Some(booking(&doctor, at(10, 0), at(10, 30))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "SCHEDULED");
    assert_eq!(body["appointment"]["patient_description"], "Persistent cough");

    let (status, body) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&second)),
        Some(booking(&doctor, at(10, 15), at(10, 45))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This time slot is already booked");

    assert_eq!(harness.credits(&first).await, 3);
    assert_eq!(harness.credits(&second).await, 5);
    assert_eq!(harness.credits(&doctor).await, 2);
    assert_eq!(harness.video.sessions_created(), 1);
}

#[tokio::test]
async fn booking_failures_map_to_status_codes() {
    let harness = Harness::new();
    let doctor = harness.doctor("doc@example.com").await;
    let poor = harness.patient("poor@example.com", 1).await;
    let rich = harness.patient("rich@example.com", 10).await;

    let (status, _) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&poor)),
        Some(booking(&doctor, at(10, 0), at(10, 30))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&rich)),
        Some(booking(&doctor, at(10, 30), at(10, 0))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&doctor)),
        Some(booking(&doctor, at(11, 0), at(11, 30))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let stranger = json!({
        "doctor_id": Uuid::new_v4(),
        "start_time": at(11, 0),
        "end_time": at(11, 30)
    });
    let (status, _) = send(harness.app(), Method::POST, "/", Some(&harness.token(&rich)), Some(stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    harness.video.set_fail_create(true);
    let (status, _) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&rich)),
        Some(booking(&doctor, at(12, 0), at(12, 30))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(harness.credits(&rich).await, 10);
}

#[tokio::test]
async fn cancel_refunds_and_frees_the_slot() {
    let harness = Harness::new();
    let doctor = harness.doctor("doc@example.com").await;
    let patient = harness.patient("p@example.com", 5).await;
    let other = harness.patient("o@example.com", 5).await;

    let (_, body) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&patient)),
        Some(booking(&doctor, at(10, 0), at(10, 30))),
    )
    .await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        harness.app(),
        Method::POST,
        &format!("/{}/cancel", id),
        Some(&harness.token(&other)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        harness.app(),
        Method::POST,
        &format!("/{}/cancel", id),
        Some(&harness.token(&patient)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "CANCELLED");
    assert_eq!(harness.credits(&patient).await, 5);
    assert_eq!(harness.credits(&doctor).await, 0);

    let (status, _) = send(
        harness.app(),
        Method::POST,
        &format!("/{}/cancel", id),
        Some(&harness.token(&doctor)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&other)),
        Some(booking(&doctor, at(10, 0), at(10, 30))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn doctor_completes_and_annotates() {
    let harness = Harness::new();
    let doctor = harness.doctor("doc@example.com").await;
    let patient = harness.patient("p@example.com", 5).await;

    let (_, body) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&patient)),
        Some(booking(&doctor, at(10, 0), at(10, 30))),
    )
    .await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();
    let complete = format!("/{}/complete", id);

    harness.clock.set(at(10, 20));
    let (status, _) = send(harness.app(), Method::POST, &complete, Some(&harness.token(&doctor)), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    harness.clock.advance(Duration::minutes(10));
    let (status, _) = send(harness.app(), Method::POST, &complete, Some(&harness.token(&patient)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(harness.app(), Method::POST, &complete, Some(&harness.token(&doctor)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "COMPLETED");

    let (status, body) = send(
        harness.app(),
        Method::PUT,
        &format!("/{}/notes", id),
        Some(&harness.token(&doctor)),
        Some(json!({ "notes": "Prescribed rest" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["notes"], "Prescribed rest");
}

#[tokio::test]
async fn video_token_follows_the_join_window() {
    let harness = Harness::new();
    let doctor = harness.doctor("doc@example.com").await;
    let patient = harness.patient("p@example.com", 5).await;

    let (_, body) = send(
        harness.app(),
        Method::POST,
        "/",
        Some(&harness.token(&patient)),
        Some(booking(&doctor, at(10, 0), at(10, 30))),
    )
    .await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();
    let join = format!("/{}/video-token", id);

    harness.clock.set(at(9, 0));
    let (status, _) = send(harness.app(), Method::POST, &join, Some(&harness.token(&patient)), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    harness.clock.set(at(9, 35));
    let (status, body) = send(harness.app(), Method::POST, &join, Some(&harness.token(&patient)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["video_session_id"], "stub-session-1");
    assert!(body["token"].as_str().unwrap().starts_with("stub-token:stub-session-1"));

    let (status, _) = send(harness.app(), Method::POST, &join, Some(&harness.token(&doctor)), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn listings_and_ledger() {
    let harness = Harness::new();
    let doctor = harness.doctor("doc@example.com").await;
    let patient = harness.patient("p@example.com", 6).await;

    for (start, end) in [(at(11, 0), at(11, 30)), (at(10, 0), at(10, 30))] {
        let (status, _) = send(
            harness.app(),
            Method::POST,
            "/",
            Some(&harness.token(&patient)),
            Some(booking(&doctor, start, end)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(harness.app(), Method::GET, "/mine", Some(&harness.token(&patient)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (status, body) = send(harness.app(), Method::GET, "/doctor", Some(&harness.token(&doctor)), None).await;
    assert_eq!(status, StatusCode::OK);
    let schedule = body["appointments"].as_array().unwrap();
    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule[0]["start_time"], json!(at(10, 0)));

    let (status, _) = send(harness.app(), Method::GET, "/doctor", Some(&harness.token(&patient)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(harness.app(), Method::GET, "/credits", Some(&harness.token(&patient)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credits"], 2);
    let entries = body["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry["amount"] == -2));
}

#[tokio::test]
async fn unknown_caller_is_404() {
    let harness = Harness::new();
    let ghost = TestUser::patient("ghost@example.com");
    let token = JwtTestUtils::create_test_token(&ghost, &harness.secret, Some(1));

    let (status, _) = send(harness.app(), Method::GET, "/mine", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
