use std::sync::Arc;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::SchedulingConfig;
use shared_database::ClinicStore;
use shared_models::clinic::{Appointment, AppointmentFilter, AppointmentStatus, AvailabilityWindow};
use shared_models::TimeInterval;
use shared_utils::clock::Clock;

use crate::models::{AvailabilityError, DaySlots, Slot};
use crate::state::DoctorCellState;

const SLOT_TIME_FORMAT: &str = "%-I:%M %p";
const DAY_LABEL_FORMAT: &str = "%A, %B %-d";

/// Free slots per day for `horizon_days` days starting at `now`'s date.
///
/// The window's time of day is reapplied to each date. A candidate is
/// emitted when it starts at or after `now`, fits entirely inside the
/// window, and overlaps no SCHEDULED appointment. Every day is present in
/// the result even when it has no slots.
pub fn generate_slots(
    window: &AvailabilityWindow,
    appointments: &[Appointment],
    now: DateTime<Utc>,
    config: &SchedulingConfig,
) -> Vec<DaySlots> {
    let step = Duration::minutes(config.slot_minutes);
    let booked: Vec<TimeInterval> = appointments
        .iter()
        .filter(|apt| apt.status == AppointmentStatus::Scheduled)
        .map(Appointment::interval)
        .collect();

    let today = now.date_naive();
    (0..config.horizon_days.max(0) as u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|date| {
            let slots = slots_for_day(date, window.daily_start(), window.daily_end(), step, now, &booked);
            let display_date = slots
                .first()
                .map(|slot| slot.day.clone())
                .unwrap_or_else(|| date.format(DAY_LABEL_FORMAT).to_string());

            DaySlots {
                date,
                display_date,
                slots,
            }
        })
        .collect()
}

fn slots_for_day(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    step: Duration,
    now: DateTime<Utc>,
    booked: &[TimeInterval],
) -> Vec<Slot> {
    let day_end = date.and_time(end).and_utc();
    let mut current = date.and_time(start).and_utc();
    let mut slots = Vec::new();

    if step <= Duration::zero() {
        return slots;
    }

    while current + step <= day_end {
        let next = current + step;

        if current >= now {
            let candidate = TimeInterval::new(current, next);
            if !booked.iter().any(|interval| interval.overlaps(&candidate)) {
                slots.push(Slot {
                    start_time: current,
                    end_time: next,
                    formatted: format!(
                        "{} - {}",
                        current.format(SLOT_TIME_FORMAT),
                        next.format(SLOT_TIME_FORMAT)
                    ),
                    day: current.format(DAY_LABEL_FORMAT).to_string(),
                });
            }
        }

        current = next;
    }

    slots
}

pub struct SlotService {
    store: Arc<dyn ClinicStore>,
    clock: Arc<dyn Clock>,
    scheduling: SchedulingConfig,
}

impl SlotService {
    pub fn new(state: &DoctorCellState) -> Self {
        Self {
            store: Arc::clone(&state.store),
            clock: Arc::clone(&state.clock),
            scheduling: state.config.scheduling.clone(),
        }
    }

    /// `Ok(None)` when the doctor has no AVAILABLE window, which is distinct
    /// from a window whose days are fully booked.
    pub async fn compute_available_slots(
        &self,
        doctor_id: Uuid,
    ) -> Result<Option<Vec<DaySlots>>, AvailabilityError> {
        debug!("Computing available slots for doctor: {}", doctor_id);

        let doctor = self.store.find_user(doctor_id).await?;
        if !doctor.is_some_and(|doctor| doctor.is_verified_doctor()) {
            warn!("Slot request for unknown or unverified doctor: {}", doctor_id);
            return Err(AvailabilityError::NotFound("Doctor not found or not verified".to_string()));
        }

        let Some(window) = self.store.find_available_window(doctor_id).await? else {
            debug!("Doctor {} has no availability window", doctor_id);
            return Ok(None);
        };

        let now = self.clock.now();
        let horizon_end = now
            .date_naive()
            .checked_add_days(Days::new(self.scheduling.horizon_days.max(0) as u64))
            .map(|date| date.and_time(NaiveTime::MIN).and_utc());

        let filter = AppointmentFilter {
            starts_on_or_before: horizon_end,
            ..AppointmentFilter::scheduled_for_doctor(doctor_id)
        };
        let appointments = self.store.list_appointments(filter).await?;

        let days = generate_slots(&window, &appointments, now, &self.scheduling);
        debug!(
            "Generated {} slots for doctor {}",
            days.iter().map(|day| day.slots.len()).sum::<usize>(),
            doctor_id
        );
        Ok(Some(days))
    }
}
