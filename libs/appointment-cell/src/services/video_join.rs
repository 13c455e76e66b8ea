// libs/appointment-cell/src/services/video_join.rs
use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use shared_database::ClinicStore;
use shared_models::clinic::{AppointmentPatch, ClinicUser};
use shared_utils::clock::Clock;
use video_conferencing_cell::{ConnectionData, TokenRole, VideoSessionProvider};

use crate::models::{AppointmentError, VideoTokenResponse};
use crate::services::booking::store_failure;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::state::AppointmentCellState;

pub struct VideoJoinService {
    store: Arc<dyn ClinicStore>,
    video: Arc<dyn VideoSessionProvider>,
    clock: Arc<dyn Clock>,
    lifecycle: AppointmentLifecycleService,
    join_lead: Duration,
    token_grace: Duration,
}

impl VideoJoinService {
    pub fn new(state: &AppointmentCellState) -> Self {
        let scheduling = &state.config.scheduling;
        Self {
            store: Arc::clone(&state.store),
            video: Arc::clone(&state.video),
            clock: Arc::clone(&state.clock),
            lifecycle: AppointmentLifecycleService::new(),
            join_lead: Duration::minutes(scheduling.join_lead_minutes),
            token_grace: Duration::minutes(scheduling.token_grace_minutes),
        }
    }

    /// Issues a publisher token for one of the two parties of a scheduled
    /// appointment. The token stays valid for a grace period past the end.
    pub async fn generate_video_token(
        &self,
        caller: &ClinicUser,
        appointment_id: Uuid,
    ) -> Result<VideoTokenResponse, AppointmentError> {
        let appointment = self
            .store
            .find_appointment(appointment_id)
            .await
            .map_err(store_failure)?
            .ok_or(AppointmentError::NotFound)?;

        if !appointment.is_party(caller.id) {
            warn!("User {} is not a party to appointment {}", caller.id, appointment_id);
            return Err(AppointmentError::Unauthorized(
                "You are not authorized to join this call".to_string(),
            ));
        }

        self.lifecycle
            .ensure_joinable(&appointment, self.clock.now(), self.join_lead)?;

        let video_session_id = appointment
            .video_session_id
            .clone()
            .ok_or(AppointmentError::NoVideoSession)?;

        let expires_at = appointment.end_time + self.token_grace;
        let connection = ConnectionData {
            name: caller.display_name().to_string(),
            role: caller.role,
            user_id: caller.id,
        };

        let token = self
            .video
            .generate_token(&video_session_id, TokenRole::Publisher, expires_at, &connection)
            .map_err(|e| {
                error!("Failed to generate video token: {}", e);
                AppointmentError::VideoServiceError(e.to_string())
            })?;

        self.store
            .update_appointment(
                appointment_id,
                AppointmentPatch {
                    video_session_token: Some(token.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(store_failure)?;

        info!("Issued video token for appointment {} to {}", appointment_id, caller.id);
        Ok(VideoTokenResponse {
            video_session_id,
            token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{DateTime, TimeZone, Utc};
    use shared_database::InMemoryStore;
    use shared_models::clinic::{Appointment, AppointmentStatus, VerificationStatus};
    use shared_utils::clock::FixedClock;
    use shared_utils::test_utils::{ClinicFixtures, TestConfig, TestUser};
    use video_conferencing_cell::StubVideoProvider;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        clock: Arc<FixedClock>,
        state: AppointmentCellState,
        patient: ClinicUser,
        doctor: ClinicUser,
    }

    async fn fixture(status: AppointmentStatus) -> (Fixture, Appointment) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(at(9, 0)));
        let patient = ClinicFixtures::patient(&TestUser::patient("p@example.com"), 5);
        let doctor = ClinicFixtures::doctor(&TestUser::doctor("d@example.com"), VerificationStatus::Verified);
        store.insert_user(patient.clone()).await;
        store.insert_user(doctor.clone()).await;

        let appointment = ClinicFixtures::appointment(doctor.id, patient.id, at(10, 0), at(10, 30), status);
        store.insert_appointment(appointment.clone()).await;

        let state = AppointmentCellState::new(
            TestConfig::default().to_arc(),
            store.clone(),
            Arc::new(StubVideoProvider::new()),
            clock.clone(),
        );
        (
            Fixture {
                store,
                clock,
                state,
                patient,
                doctor,
            },
            appointment,
        )
    }

    #[tokio::test]
    async fn join_opens_thirty_minutes_early() {
        let (f, appointment) = fixture(AppointmentStatus::Scheduled).await;
        let service = VideoJoinService::new(&f.state);

        assert_matches!(
            service.generate_video_token(&f.patient, appointment.id).await,
            Err(AppointmentError::OutsideTimeWindow(_))
        );

        f.clock.set(at(9, 35));
        let response = service.generate_video_token(&f.patient, appointment.id).await.unwrap();
        assert_eq!(Some(response.video_session_id.clone()), appointment.video_session_id);
        assert_eq!(response.expires_at, at(11, 30));
        assert!(response.token.contains(&f.patient.id.to_string()));

        let stored = f.store.find_appointment(appointment.id).await.unwrap().unwrap();
        assert_eq!(stored.video_session_token, Some(response.token));
    }

    #[tokio::test]
    async fn doctor_can_join_until_the_end() {
        let (f, appointment) = fixture(AppointmentStatus::Scheduled).await;
        let service = VideoJoinService::new(&f.state);

        f.clock.set(at(10, 30));
        assert!(service.generate_video_token(&f.doctor, appointment.id).await.is_ok());

        f.clock.set(at(10, 31));
        assert_matches!(
            service.generate_video_token(&f.doctor, appointment.id).await,
            Err(AppointmentError::OutsideTimeWindow(_))
        );
    }

    #[tokio::test]
    async fn outsiders_and_cancelled_calls_are_refused() {
        let (f, appointment) = fixture(AppointmentStatus::Cancelled).await;
        let service = VideoJoinService::new(&f.state);
        f.clock.set(at(10, 0));

        let stranger = ClinicFixtures::patient(&TestUser::patient("x@example.com"), 5);
        assert_matches!(
            service.generate_video_token(&stranger, appointment.id).await,
            Err(AppointmentError::Unauthorized(_))
        );
        assert_matches!(
            service.generate_video_token(&f.patient, appointment.id).await,
            Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::Cancelled))
        );
        assert_matches!(
            service.generate_video_token(&f.patient, Uuid::new_v4()).await,
            Err(AppointmentError::NotFound)
        );
    }

    #[tokio::test]
    async fn missing_session_is_reported() {
        let (f, mut appointment) = fixture(AppointmentStatus::Scheduled).await;
        appointment.id = Uuid::new_v4();
        appointment.start_time = at(12, 0);
        appointment.end_time = at(12, 30);
        appointment.video_session_id = None;
        f.store.insert_appointment(appointment.clone()).await;
        f.clock.set(at(12, 0));

        assert_matches!(
            VideoJoinService::new(&f.state)
                .generate_video_token(&f.patient, appointment.id)
                .await,
            Err(AppointmentError::NoVideoSession)
        );
    }
}
