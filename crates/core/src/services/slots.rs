//! # Slot Generation
//!
//! Projects a provider's daily availability window onto each day of a short horizon
//! and walks it in fixed steps, yielding the slots that are neither in the past nor
//! overlapping an existing `SCHEDULED` appointment.
//!
//! The result is advisory only. Booking re-checks overlaps inside its own
//! transaction, so a listed slot can still be lost to a concurrent booker.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{
    errors::{ScheduleError, ScheduleResult},
    models::{
        appointment::{Appointment, AppointmentStatus},
        availability::{AvailabilityWindow, AvailableDay, Slot},
    },
    policy::SchedulingPolicy,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DAY_LABEL_FORMAT: &str = "%A, %B %-d";
const TIME_LABEL_FORMAT: &str = "%-I:%M %p";

#[derive(Debug, Clone)]
pub struct SlotGenerator {
    granularity: Duration,
    horizon_days: u32,
    timezone: Tz,
}

impl SlotGenerator {
    pub fn new(policy: &SchedulingPolicy) -> ScheduleResult<Self> {
        if policy.slot_minutes <= 0 {
            return Err(ScheduleError::Validation(format!(
                "Slot granularity must be positive, got {} minutes",
                policy.slot_minutes
            )));
        }

        Ok(Self {
            granularity: policy.granularity(),
            horizon_days: policy.horizon_days,
            timezone: policy.timezone,
        })
    }

    /// Calendar dates covered by the horizon, starting with today in the schedule timezone.
    pub fn horizon_dates(&self, now: DateTime<Utc>) -> Vec<NaiveDate> {
        let today = now.with_timezone(&self.timezone).date_naive();
        (0..self.horizon_days)
            .filter_map(|offset| today.checked_add_days(chrono::Days::new(u64::from(offset))))
            .collect()
    }

    /// Last instant of the horizon's final day. Appointments starting after it cannot
    /// collide with any generated slot.
    pub fn horizon_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let last_day = self
            .horizon_dates(now)
            .pop()
            .unwrap_or_else(|| now.with_timezone(&self.timezone).date_naive());
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        self.project(last_day, end_of_day)
            .unwrap_or_else(|| now + Duration::days(i64::from(self.horizon_days)))
    }

    /// Lazily produces one [`AvailableDay`] per horizon date, chronologically.
    /// Days without any free slot are still present.
    pub fn generate<'a>(
        &'a self,
        window: &'a AvailabilityWindow,
        now: DateTime<Utc>,
        existing: &'a [Appointment],
    ) -> impl Iterator<Item = AvailableDay> + 'a {
        self.horizon_dates(now).into_iter().map(move |date| AvailableDay {
            date: date.format(DATE_FORMAT).to_string(),
            display_date: date.format(DAY_LABEL_FORMAT).to_string(),
            slots: self.day_slots(window, date, now, existing).collect(),
        })
    }

    /// Free slots of a single date, in chronological order.
    pub fn day_slots<'a>(
        &'a self,
        window: &AvailabilityWindow,
        date: NaiveDate,
        now: DateTime<Utc>,
        existing: &'a [Appointment],
    ) -> DaySlots<'a> {
        let start = self.project(date, window.start_time);
        let end = self.project(date, window.end_time);

        // A window falling into a DST gap yields nothing for that day.
        let (current, window_end) = match (start, end) {
            (Some(start), Some(end)) => (Some(start), end),
            _ => (None, now),
        };

        DaySlots {
            current,
            window_end,
            step: self.granularity,
            now,
            existing,
            timezone: self.timezone,
        }
    }

    fn project(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.timezone
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }
}

/// Iterator over the free slots of one day's window.
#[derive(Debug)]
pub struct DaySlots<'a> {
    current: Option<DateTime<Utc>>,
    window_end: DateTime<Utc>,
    step: Duration,
    now: DateTime<Utc>,
    existing: &'a [Appointment],
    timezone: Tz,
}

impl DaySlots<'_> {
    fn is_booked(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.existing
            .iter()
            .any(|a| a.status == AppointmentStatus::Scheduled && a.overlaps(start, end))
    }

    fn label(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Slot {
        let local_start = start.with_timezone(&self.timezone);
        let local_end = end.with_timezone(&self.timezone);
        Slot {
            start_time: start,
            end_time: end,
            formatted: format!(
                "{} - {}",
                local_start.format(TIME_LABEL_FORMAT),
                local_end.format(TIME_LABEL_FORMAT)
            ),
            day: local_start.format(DAY_LABEL_FORMAT).to_string(),
        }
    }
}

impl Iterator for DaySlots<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        loop {
            let current = self.current?;
            let next = current + self.step;

            // The last slot may end exactly on the window boundary.
            if next > self.window_end {
                self.current = None;
                return None;
            }
            self.current = Some(next);

            if current < self.now || self.is_booked(current, next) {
                continue;
            }

            return Some(self.label(current, next));
        }
    }
}
