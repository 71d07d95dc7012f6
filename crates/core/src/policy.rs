use chrono::Duration;
use chrono_tz::Tz;

/// Tunables shared by slot generation, booking and session joins.
#[derive(Debug, Clone)]
pub struct SchedulingPolicy {
    /// Slot granularity in minutes.
    pub slot_minutes: i64,
    /// Number of consecutive days offered, today included.
    pub horizon_days: u32,
    /// Credits moved from requester to provider per booking.
    pub booking_cost: i64,
    /// How long before the start a party may join the session.
    pub join_lead_minutes: i64,
    /// How long after the end an issued session token stays valid.
    pub token_grace_minutes: i64,
    /// The single wall-clock frame availability windows are expressed in.
    pub timezone: Tz,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            horizon_days: 4,
            booking_cost: 2,
            join_lead_minutes: 30,
            token_grace_minutes: 60,
            timezone: Tz::UTC,
        }
    }
}

impl SchedulingPolicy {
    pub fn granularity(&self) -> Duration {
        Duration::minutes(self.slot_minutes)
    }

    pub fn join_lead(&self) -> Duration {
        Duration::minutes(self.join_lead_minutes)
    }

    pub fn token_grace(&self) -> Duration {
        Duration::minutes(self.token_grace_minutes)
    }
}
