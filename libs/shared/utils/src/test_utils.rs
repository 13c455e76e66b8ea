use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, SchedulingConfig, StoreBackend};
use shared_models::auth::User;
use shared_models::clinic::{
    Appointment, AppointmentStatus, AvailabilityWindow, ClinicUser, SlotStatus, UserRole,
    VerificationStatus,
};

use crate::jwt::sign_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub video_api_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            video_api_base_url: "http://localhost:54400".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: "test-service-role-key".to_string(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            video_api_base_url: self.video_api_base_url.clone(),
            video_application_id: "test-video-app".to_string(),
            video_application_secret: "test-video-secret".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            store_backend: StoreBackend::Memory,
            scheduling: SchedulingConfig::default(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Identity-provider side of a test user.
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "patient")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: format!("user_{}", Uuid::new_v4().simple()),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let claims = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        sign_token(&claims, secret).expect("test secret must not be empty")
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Builders for store records used across cell tests.
pub struct ClinicFixtures;

impl ClinicFixtures {
    pub fn user(external: &TestUser, role: UserRole, credits: i64) -> ClinicUser {
        ClinicUser {
            id: Uuid::new_v4(),
            external_id: external.id.clone(),
            email: external.email.clone(),
            name: Some(external.email.split('@').next().unwrap_or("user").to_string()),
            role,
            verification_status: None,
            speciality: None,
            experience: None,
            description: None,
            credits,
            created_at: Utc::now(),
        }
    }

    pub fn patient(external: &TestUser, credits: i64) -> ClinicUser {
        Self::user(external, UserRole::Patient, credits)
    }

    pub fn doctor(external: &TestUser, status: VerificationStatus) -> ClinicUser {
        ClinicUser {
            verification_status: Some(status),
            speciality: Some("General Medicine".to_string()),
            experience: Some(8),
            description: Some("Family physician".to_string()),
            ..Self::user(external, UserRole::Doctor, 0)
        }
    }

    pub fn admin(external: &TestUser) -> ClinicUser {
        Self::user(external, UserRole::Admin, 0)
    }

    /// Window whose stored date is arbitrary; only the time of day matters.
    pub fn window(doctor_id: Uuid, start: NaiveTime, end: NaiveTime) -> AvailabilityWindow {
        let anchor = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id,
            start_time: anchor.and_time(start).and_utc(),
            end_time: anchor.and_time(end).and_utc(),
            status: SlotStatus::Available,
            created_at: Utc::now(),
        }
    }

    pub fn appointment(
        doctor_id: Uuid,
        patient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: AppointmentStatus,
    ) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            start_time: start,
            end_time: end,
            status,
            patient_description: None,
            notes: None,
            video_session_id: Some(format!("session-{}", Uuid::new_v4().simple())),
            video_session_token: None,
            created_at: start - Duration::days(1),
            updated_at: start - Duration::days(1),
        }
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_row(user: &ClinicUser) -> serde_json::Value {
        serde_json::to_value(user).expect("user serializes")
    }

    pub fn appointment_row(appointment: &Appointment) -> serde_json::Value {
        serde_json::to_value(appointment).expect("appointment serializes")
    }

    pub fn window_row(window: &AvailabilityWindow) -> serde_json::Value {
        serde_json::to_value(window).expect("window serializes")
    }

    pub fn error_response(code: &str, message: &str) -> serde_json::Value {
        json!({
            "code": code,
            "message": message,
            "details": null,
            "hint": null
        })
    }
}
