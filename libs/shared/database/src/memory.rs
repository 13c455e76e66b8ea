use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use shared_models::clinic::{
    Appointment, AppointmentFilter, AppointmentPatch, AppointmentStatus, AvailabilityWindow,
    ClinicUser, CreditTransaction, DoctorFilter, NewAvailability, NewBooking, SlotStatus,
    TransactionType, UserRole, VerificationStatus,
};

use crate::store::{ClinicStore, StoreError};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, ClinicUser>,
    availabilities: Vec<AvailabilityWindow>,
    appointments: HashMap<Uuid, Appointment>,
    transactions: Vec<CreditTransaction>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing, so rows written in one call still sort by write order.
    fn stamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn ledger_entry(&mut self, user_id: Uuid, amount: i64, now: DateTime<Utc>) {
        let created_at = self.stamp(now);
        self.transactions.push(CreditTransaction {
            id: Uuid::new_v4(),
            user_id,
            amount,
            transaction_type: TransactionType::AppointmentDeduction,
            package_id: None,
            created_at,
        });
    }

    fn ensure_user(&self, user_id: Uuid, what: &str) -> Result<(), StoreError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(what.to_string()))
        }
    }

    fn adjust_credits(&mut self, user_id: Uuid, delta: i64) -> Result<(), StoreError> {
        let user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound("User".to_string()))?;
        user.credits += delta;
        Ok(())
    }
}

type TimeSource = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Process-local [`ClinicStore`]. All writes run under one lock, so every
/// multi-row operation is atomic.
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    now: TimeSource,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_time_source(Utc::now)
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row timestamps come from `now`, typically the application clock.
    pub fn with_time_source(now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            fail_writes: AtomicBool::new(false),
            now: Box::new(now),
        }
    }

    pub async fn insert_user(&self, user: ClinicUser) {
        self.tables.lock().await.users.insert(user.id, user);
    }

    pub async fn insert_window(&self, window: AvailabilityWindow) {
        self.tables.lock().await.availabilities.push(window);
    }

    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.tables
            .lock()
            .await
            .appointments
            .insert(appointment.id, appointment);
    }

    /// Makes booking and cancellation writes fail as if the database were down.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn appointment_count(&self) -> usize {
        self.tables.lock().await.appointments.len()
    }

    pub async fn transaction_count(&self) -> usize {
        self.tables.lock().await.transactions.len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Request("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClinicStore for InMemoryStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<ClinicUser>, StoreError> {
        Ok(self.tables.lock().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<ClinicUser>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.external_id == external_id)
            .cloned())
    }

    async fn list_doctors(&self, filter: DoctorFilter) -> Result<Vec<ClinicUser>, StoreError> {
        let tables = self.tables.lock().await;
        let mut doctors: Vec<ClinicUser> = tables
            .users
            .values()
            .filter(|user| user.role == UserRole::Doctor)
            .filter(|user| {
                filter
                    .verification_status
                    .map_or(true, |status| user.verification_status == Some(status))
            })
            .filter(|user| {
                filter
                    .speciality
                    .as_ref()
                    .map_or(true, |speciality| user.speciality.as_ref() == Some(speciality))
            })
            .cloned()
            .collect();

        if filter.speciality.is_some() {
            doctors.sort_by(|a, b| a.name.cmp(&b.name));
        } else {
            doctors.sort_by_key(|doctor| doctor.created_at);
        }
        Ok(doctors)
    }

    async fn set_verification_status(
        &self,
        doctor_id: Uuid,
        status: VerificationStatus,
    ) -> Result<ClinicUser, StoreError> {
        let mut tables = self.tables.lock().await;
        let doctor = tables
            .users
            .get_mut(&doctor_id)
            .filter(|user| user.role == UserRole::Doctor)
            .ok_or_else(|| StoreError::NotFound("Doctor".to_string()))?;
        doctor.verification_status = Some(status);
        Ok(doctor.clone())
    }

    async fn find_available_window(&self, doctor_id: Uuid) -> Result<Option<AvailabilityWindow>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .availabilities
            .iter()
            .find(|window| window.doctor_id == doctor_id && window.status == SlotStatus::Available)
            .cloned())
    }

    async fn list_availability(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let tables = self.tables.lock().await;
        let mut windows: Vec<AvailabilityWindow> = tables
            .availabilities
            .iter()
            .filter(|window| window.doctor_id == doctor_id)
            .cloned()
            .collect();
        windows.sort_by_key(|window| window.start_time);
        Ok(windows)
    }

    async fn replace_availability(&self, window: NewAvailability) -> Result<AvailabilityWindow, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        tables.availabilities.retain(|existing| {
            !(existing.doctor_id == window.doctor_id && existing.status == SlotStatus::Available)
        });

        let created_at = tables.stamp((self.now)());
        let created = AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id: window.doctor_id,
            start_time: window.start_time,
            end_time: window.end_time,
            status: SlotStatus::Available,
            created_at,
        };
        tables.availabilities.push(created.clone());
        Ok(created)
    }

    async fn find_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.tables.lock().await.appointments.get(&appointment_id).cloned())
    }

    async fn list_appointments(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.lock().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect();
        appointments.sort_by_key(|appointment| appointment.start_time);
        Ok(appointments)
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Appointment, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;

        let requested = booking.interval();
        let taken = tables.appointments.values().any(|existing| {
            existing.doctor_id == booking.doctor_id
                && existing.status == AppointmentStatus::Scheduled
                && existing.interval().overlaps(&requested)
        });
        if taken {
            return Err(StoreError::Overlap);
        }

        let patient_credits = tables
            .users
            .get(&booking.patient_id)
            .map(|patient| patient.credits)
            .ok_or_else(|| StoreError::NotFound("Patient".to_string()))?;
        if patient_credits < booking.credit_cost {
            return Err(StoreError::InsufficientCredits);
        }
        tables.ensure_user(booking.doctor_id, "Doctor")?;

        let now = (self.now)();
        tables.ledger_entry(booking.patient_id, -booking.credit_cost, now);
        tables.ledger_entry(booking.doctor_id, booking.credit_cost, now);
        tables.adjust_credits(booking.patient_id, -booking.credit_cost)?;
        tables.adjust_credits(booking.doctor_id, booking.credit_cost)?;

        let now = tables.stamp(now);
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: booking.patient_id,
            doctor_id: booking.doctor_id,
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: AppointmentStatus::Scheduled,
            patient_description: booking.patient_description,
            notes: None,
            video_session_id: Some(booking.video_session_id),
            video_session_token: None,
            created_at: now,
            updated_at: now,
        };
        tables.appointments.insert(appointment.id, appointment.clone());

        debug!("Stored appointment {}", appointment.id);
        Ok(appointment)
    }

    async fn cancel_booking(&self, appointment_id: Uuid, credit_cost: i64) -> Result<Appointment, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;

        let (patient_id, doctor_id) = match tables.appointments.get(&appointment_id) {
            Some(apt) if apt.status == AppointmentStatus::Scheduled => (apt.patient_id, apt.doctor_id),
            Some(_) => return Err(StoreError::InvalidState("Appointment is not scheduled".to_string())),
            None => return Err(StoreError::NotFound("Appointment".to_string())),
        };

        tables.ensure_user(patient_id, "Patient")?;
        tables.ensure_user(doctor_id, "Doctor")?;

        let now = (self.now)();
        tables.ledger_entry(patient_id, credit_cost, now);
        tables.ledger_entry(doctor_id, -credit_cost, now);
        tables.adjust_credits(patient_id, credit_cost)?;
        tables.adjust_credits(doctor_id, -credit_cost)?;

        let updated_at = tables.stamp(now);
        let appointment = tables
            .appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| StoreError::NotFound("Appointment".to_string()))?;
        appointment.status = AppointmentStatus::Cancelled;
        appointment.updated_at = updated_at;
        Ok(appointment.clone())
    }

    async fn update_appointment(
        &self,
        appointment_id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        let updated_at = tables.stamp((self.now)());
        let appointment = tables
            .appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| StoreError::NotFound("Appointment".to_string()))?;

        if patch.expected_status.is_some_and(|expected| expected != appointment.status) {
            return Err(StoreError::InvalidState(format!(
                "Appointment is {}",
                appointment.status
            )));
        }

        if let Some(status) = patch.status {
            appointment.status = status;
        }
        if let Some(notes) = patch.notes {
            appointment.notes = Some(notes);
        }
        if let Some(token) = patch.video_session_token {
            appointment.video_session_token = Some(token);
        }
        appointment.updated_at = updated_at;
        Ok(appointment.clone())
    }

    async fn list_credit_transactions(&self, user_id: Uuid) -> Result<Vec<CreditTransaction>, StoreError> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<CreditTransaction> = tables
            .transactions
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}
