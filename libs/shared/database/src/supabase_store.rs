use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::clinic::{
    Appointment, AppointmentFilter, AppointmentPatch, AvailabilityWindow, ClinicUser,
    CreditTransaction, DoctorFilter, NewAvailability, NewBooking, UserRole, VerificationStatus,
};

use crate::store::{ClinicStore, StoreError};
use crate::supabase::SupabaseClient;

/// [`ClinicStore`] over the Supabase REST API. Multi-row writes go through
/// the Postgres functions in `supabase/migrations`.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;
        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn fetch_first<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        Ok(self.fetch_rows(path).await?.into_iter().next())
    }

    fn first_row<T: DeserializeOwned>(rows: Vec<Value>, what: &str) -> Result<T, StoreError> {
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(what.to_string()))?;
        serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
        serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
        urlencoding::encode(&value.to_rfc3339()).into_owned()
    }
}

#[async_trait]
impl ClinicStore for SupabaseStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<ClinicUser>, StoreError> {
        debug!("Fetching user {}", user_id);
        self.fetch_first(&format!("/rest/v1/users?id=eq.{}", user_id)).await
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<ClinicUser>, StoreError> {
        debug!("Fetching user by external id {}", external_id);
        let path = format!(
            "/rest/v1/users?external_id=eq.{}",
            urlencoding::encode(external_id)
        );
        self.fetch_first(&path).await
    }

    async fn list_doctors(&self, filter: DoctorFilter) -> Result<Vec<ClinicUser>, StoreError> {
        let mut query_parts = vec![format!("role=eq.{}", UserRole::Doctor)];

        if let Some(status) = filter.verification_status {
            query_parts.push(format!("verification_status=eq.{}", status));
        }
        let order = match &filter.speciality {
            Some(speciality) => {
                query_parts.push(format!("speciality=eq.{}", urlencoding::encode(speciality)));
                "name.asc"
            }
            None => "created_at.asc",
        };

        let path = format!("/rest/v1/users?{}&order={}", query_parts.join("&"), order);
        self.fetch_rows(&path).await
    }

    async fn set_verification_status(
        &self,
        doctor_id: Uuid,
        status: VerificationStatus,
    ) -> Result<ClinicUser, StoreError> {
        let path = format!("/rest/v1/users?id=eq.{}&role=eq.{}", doctor_id, UserRole::Doctor);
        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, json!({ "verification_status": status }))
            .await?;
        Self::first_row(rows, "Doctor")
    }

    async fn find_available_window(&self, doctor_id: Uuid) -> Result<Option<AvailabilityWindow>, StoreError> {
        let path = format!(
            "/rest/v1/availabilities?doctor_id=eq.{}&status=eq.AVAILABLE&limit=1",
            doctor_id
        );
        self.fetch_first(&path).await
    }

    async fn list_availability(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let path = format!(
            "/rest/v1/availabilities?doctor_id=eq.{}&order=start_time.asc",
            doctor_id
        );
        self.fetch_rows(&path).await
    }

    async fn replace_availability(&self, window: NewAvailability) -> Result<AvailabilityWindow, StoreError> {
        let created: Value = self
            .supabase
            .rpc(
                "replace_availability",
                json!({
                    "p_doctor_id": window.doctor_id,
                    "p_start_time": window.start_time,
                    "p_end_time": window.end_time,
                }),
            )
            .await?;
        Self::decode(created)
    }

    async fn find_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.fetch_first(&format!("/rest/v1/appointments?id=eq.{}", appointment_id))
            .await
    }

    async fn list_appointments(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let mut query_parts = Vec::new();

        if let Some(doctor_id) = filter.doctor_id {
            query_parts.push(format!("doctor_id=eq.{}", doctor_id));
        }
        if let Some(patient_id) = filter.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if !filter.statuses.is_empty() {
            let statuses: Vec<String> = filter.statuses.iter().map(|s| s.to_string()).collect();
            query_parts.push(format!("status=in.({})", statuses.join(",")));
        }
        if let Some(limit) = filter.starts_on_or_before {
            query_parts.push(format!("start_time=lte.{}", Self::timestamp(limit)));
        }
        query_parts.push("order=start_time.asc".to_string());

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));
        self.fetch_rows(&path).await
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Appointment, StoreError> {
        debug!(
            "Creating booking for patient {} with doctor {}",
            booking.patient_id, booking.doctor_id
        );
        let created: Value = self
            .supabase
            .rpc(
                "book_appointment",
                json!({
                    "p_patient_id": booking.patient_id,
                    "p_doctor_id": booking.doctor_id,
                    "p_start_time": booking.start_time,
                    "p_end_time": booking.end_time,
                    "p_patient_description": booking.patient_description,
                    "p_video_session_id": booking.video_session_id,
                    "p_credit_cost": booking.credit_cost,
                }),
            )
            .await?;
        Self::decode(created)
    }

    async fn cancel_booking(&self, appointment_id: Uuid, credit_cost: i64) -> Result<Appointment, StoreError> {
        let cancelled: Value = self
            .supabase
            .rpc(
                "cancel_appointment",
                json!({
                    "p_appointment_id": appointment_id,
                    "p_credit_cost": credit_cost,
                }),
            )
            .await?;
        Self::decode(cancelled)
    }

    async fn update_appointment(
        &self,
        appointment_id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, StoreError> {
        let mut body = serde_json::to_value(&patch).map_err(|e| StoreError::Decode(e.to_string()))?;
        if let Value::Object(map) = &mut body {
            map.insert("updated_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));
        }

        let mut path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        if let Some(expected) = patch.expected_status {
            path.push_str(&format!("&status=eq.{}", expected));
        }

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, body)
            .await?;

        // A conditional patch that matched nothing means the row moved on.
        if rows.is_empty() && patch.expected_status.is_some() {
            return match self.find_appointment(appointment_id).await? {
                Some(current) => Err(StoreError::InvalidState(format!("Appointment is {}", current.status))),
                None => Err(StoreError::NotFound("Appointment".to_string())),
            };
        }
        Self::first_row(rows, "Appointment")
    }

    async fn list_credit_transactions(&self, user_id: Uuid) -> Result<Vec<CreditTransaction>, StoreError> {
        let path = format!(
            "/rest/v1/credit_transactions?user_id=eq.{}&order=created_at.desc",
            user_id
        );
        self.fetch_rows(&path).await
    }
}
