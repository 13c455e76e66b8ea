// libs/shared/database/tests/supabase_store_test.rs

use assert_matches::assert_matches;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::{AppConfig, SchedulingConfig, StoreBackend};
use shared_database::{ClinicStore, StoreError, SupabaseStore};
use shared_models::clinic::{
    Appointment, AppointmentPatch, AppointmentStatus, AvailabilityWindow, ClinicUser, NewAvailability, SlotStatus,
    UserRole, VerificationStatus,
};

fn store_for(mock_server: &MockServer) -> SupabaseStore {
    SupabaseStore::new(&AppConfig {
        supabase_url: mock_server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_service_role_key: "test-service-role-key".to_string(),
        supabase_jwt_secret: "test-jwt-secret".to_string(),
        video_api_base_url: "http://localhost:9".to_string(),
        video_application_id: String::new(),
        video_application_secret: String::new(),
        bind_address: "127.0.0.1:0".to_string(),
        store_backend: StoreBackend::Supabase,
        scheduling: SchedulingConfig::default(),
    })
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
}

fn appointment(status: AppointmentStatus) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        doctor_id: Uuid::new_v4(),
        start_time: at(10, 0),
        end_time: at(10, 30),
        status,
        patient_description: None,
        notes: None,
        video_session_id: Some("session-1".to_string()),
        video_session_token: None,
        created_at: at(8, 0),
        updated_at: at(8, 0),
    }
}

fn doctor(status: VerificationStatus) -> ClinicUser {
    ClinicUser {
        id: Uuid::new_v4(),
        external_id: "ext-doctor".to_string(),
        email: "d@example.com".to_string(),
        name: Some("Dr. Test".to_string()),
        role: UserRole::Doctor,
        verification_status: Some(status),
        speciality: Some("Cardiology".to_string()),
        experience: Some(8),
        description: None,
        credits: 0,
        created_at: at(8, 0),
    }
}

fn completion() -> AppointmentPatch {
    AppointmentPatch {
        expected_status: Some(AppointmentStatus::Scheduled),
        status: Some(AppointmentStatus::Completed),
        ..Default::default()
    }
}

#[tokio::test]
async fn conditional_patch_sends_the_status_guard() {
    let mock_server = MockServer::start().await;
    let mut completed = appointment(AppointmentStatus::Completed);
    completed.updated_at = at(11, 0);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", completed.id)))
        .and(query_param("status", "eq.SCHEDULED"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({ "status": "COMPLETED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([completed])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let updated = store_for(&mock_server)
        .update_appointment(completed.id, completion())
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn completion_that_matches_no_row_reports_the_current_status() {
    let mock_server = MockServer::start().await;
    let cancelled = appointment(AppointmentStatus::Cancelled);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.SCHEDULED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", cancelled.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cancelled])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server)
        .update_appointment(cancelled.id, completion())
        .await;

    assert_matches!(result, Err(StoreError::InvalidState(message)) if message.contains("CANCELLED"));
}

#[tokio::test]
async fn completion_of_a_vanished_row_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server)
        .update_appointment(Uuid::new_v4(), completion())
        .await;

    assert_eq!(result, Err(StoreError::NotFound("Appointment".to_string())));
}

#[tokio::test]
async fn cancel_goes_through_the_refund_function() {
    let mock_server = MockServer::start().await;
    let cancelled = appointment(AppointmentStatus::Cancelled);

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/cancel_appointment"))
        .and(body_partial_json(json!({
            "p_appointment_id": cancelled.id,
            "p_credit_cost": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(cancelled)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server).cancel_booking(cancelled.id, 2).await.unwrap();

    assert_eq!(result, cancelled);
}

#[tokio::test]
async fn cancelling_a_settled_appointment_is_an_invalid_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/cancel_appointment"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "P0001",
            "message": "appointment_not_scheduled",
            "details": null,
            "hint": null
        })))
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server).cancel_booking(Uuid::new_v4(), 2).await;

    assert_matches!(result, Err(StoreError::InvalidState(_)));
}

#[tokio::test]
async fn availability_is_replaced_in_one_call() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let window = AvailabilityWindow {
        id: Uuid::new_v4(),
        doctor_id,
        start_time: at(9, 0),
        end_time: at(17, 0),
        status: SlotStatus::Available,
        created_at: at(8, 0),
    };

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/replace_availability"))
        .and(body_partial_json(json!({ "p_doctor_id": doctor_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(window)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let created = store_for(&mock_server)
        .replace_availability(NewAvailability {
            doctor_id,
            start_time: at(9, 0),
            end_time: at(17, 0),
        })
        .await
        .unwrap();

    assert_eq!(created, window);
}

#[tokio::test]
async fn verification_patch_is_limited_to_doctors() {
    let mock_server = MockServer::start().await;
    let verified = doctor(VerificationStatus::Verified);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", verified.id)))
        .and(query_param("role", "eq.DOCTOR"))
        .and(body_partial_json(json!({ "verification_status": "VERIFIED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([verified])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let updated = store_for(&mock_server)
        .set_verification_status(verified.id, VerificationStatus::Verified)
        .await
        .unwrap();

    assert_eq!(updated.verification_status, Some(VerificationStatus::Verified));
}

#[tokio::test]
async fn verifying_a_non_doctor_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server)
        .set_verification_status(Uuid::new_v4(), VerificationStatus::Rejected)
        .await;

    assert_eq!(result, Err(StoreError::NotFound("Doctor".to_string())));
}
