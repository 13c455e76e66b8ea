use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::interval::TimeInterval;

// ==============================================================================
// USERS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Unassigned,
    Patient,
    Doctor,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Unassigned => write!(f, "UNASSIGNED"),
            UserRole::Patient => write!(f, "PATIENT"),
            UserRole::Doctor => write!(f, "DOCTOR"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "PENDING"),
            VerificationStatus::Verified => write!(f, "VERIFIED"),
            VerificationStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Internal user record shared by patients, doctors and admins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicUser {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub verification_status: Option<VerificationStatus>,
    pub speciality: Option<String>,
    pub experience: Option<i32>,
    pub description: Option<String>,
    pub credits: i64,
    pub created_at: DateTime<Utc>,
}

impl ClinicUser {
    pub fn is_patient(&self) -> bool {
        self.role == UserRole::Patient
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_verified_doctor(&self) -> bool {
        self.role == UserRole::Doctor
            && self.verification_status == Some(VerificationStatus::Verified)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Booked,
    Blocked,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Available => write!(f, "AVAILABLE"),
            SlotStatus::Booked => write!(f, "BOOKED"),
            SlotStatus::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// A doctor's daily template. Only the time-of-day of `start_time` and
/// `end_time` is meaningful; slot generation reapplies it to each day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityWindow {
    pub fn daily_start(&self) -> NaiveTime {
        self.start_time.time()
    }

    pub fn daily_end(&self) -> NaiveTime {
        self.end_time.time()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAvailability {
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "SCHEDULED"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub patient_description: Option<String>,
    pub notes: Option<String>,
    pub video_session_id: Option<String>,
    pub video_session_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_time, self.end_time)
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.patient_id == user_id || self.doctor_id == user_id
    }
}

/// Everything the store needs to persist a booking in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub patient_description: Option<String>,
    pub video_session_id: String,
    pub credit_cost: i64,
}

impl NewBooking {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentPatch {
    /// Write only if the row is still in this status.
    #[serde(skip)]
    pub expected_status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_session_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub statuses: Vec<AppointmentStatus>,
    pub starts_on_or_before: Option<DateTime<Utc>>,
}

impl AppointmentFilter {
    pub fn scheduled_for_doctor(doctor_id: Uuid) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            statuses: vec![AppointmentStatus::Scheduled],
            ..Default::default()
        }
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
            && self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && (self.statuses.is_empty() || self.statuses.contains(&appointment.status))
            && self
                .starts_on_or_before
                .map_or(true, |limit| appointment.start_time <= limit)
    }
}

// ==============================================================================
// CREDIT LEDGER
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    CreditPurchase,
    AppointmentDeduction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub package_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    pub verification_status: Option<VerificationStatus>,
    pub speciality: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn appointment(status: AppointmentStatus) -> Appointment {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(30),
            status,
            patient_description: None,
            notes: None,
            video_session_id: None,
            video_session_token: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn statuses_use_upper_case_wire_names() {
        assert_eq!(serde_json::to_string(&AppointmentStatus::Scheduled).unwrap(), "\"SCHEDULED\"");
        assert_eq!(serde_json::to_string(&VerificationStatus::Verified).unwrap(), "\"VERIFIED\"");
        assert_eq!(AppointmentStatus::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn only_scheduled_is_non_terminal() {
        assert!(!AppointmentStatus::Scheduled.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
    }

    #[test]
    fn filter_respects_status_and_horizon() {
        let apt = appointment(AppointmentStatus::Scheduled);
        let mut filter = AppointmentFilter::scheduled_for_doctor(apt.doctor_id);
        assert!(filter.matches(&apt));

        filter.starts_on_or_before = Some(apt.start_time - chrono::Duration::minutes(1));
        assert!(!filter.matches(&apt));

        let cancelled = appointment(AppointmentStatus::Cancelled);
        assert!(!AppointmentFilter::scheduled_for_doctor(cancelled.doctor_id).matches(&cancelled));
    }

    #[test]
    fn ledger_entry_serializes_type_field() {
        let entry = CreditTransaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: -2,
            transaction_type: TransactionType::AppointmentDeduction,
            package_id: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "APPOINTMENT_DEDUCTION");
    }
}
