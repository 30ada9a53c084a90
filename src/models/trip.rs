use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
    #[serde(other)]
    Unspecified,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripIntent {
    pub trip_id: String,
    pub pickup_location_id: u64,
    pub destination_location_id: u64,
    pub estimated_trip_distance_km: f64,
    pub distance_to_pickup_km: f64,
    pub traffic_factor: f64,
    pub time_of_day: TimeOfDay,
    #[serde(default)]
    pub at_event: bool,
    #[serde(default)]
    pub event_type: Option<String>,
    pub base_fare: f64,
    pub base_trip_fare: f64,
    pub trip_duration_minutes: u32,
}

impl TripIntent {
    /// Event type with the legacy `"NULL"` placeholder treated as absent.
    pub fn event_type(&self) -> Option<&str> {
        self.event_type
            .as_deref()
            .filter(|kind| !kind.is_empty() && *kind != "NULL")
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.trip_id.trim().is_empty() {
            return Err(AppError::BadRequest("trip_id cannot be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.traffic_factor) {
            return Err(AppError::BadRequest(format!(
                "traffic_factor must be within [0, 2], got {}",
                self.traffic_factor
            )));
        }

        if self.estimated_trip_distance_km < 0.0 || self.distance_to_pickup_km < 0.0 {
            return Err(AppError::BadRequest(
                "distances must be non-negative".to_string(),
            ));
        }

        if self.base_fare < 0.0 || self.base_trip_fare < 0.0 {
            return Err(AppError::BadRequest("fares must be non-negative".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripResult {
    pub driver_id: String,
    pub trip_id: String,
    pub coins_earned: u32,
    pub total_distance: f64,
    pub distance_covered_today: f64,
    pub new_coins_balance: u32,
    pub streak_bonus_earned: u32,
    pub multiplier_applied: f64,
    pub final_fare: f64,
}

/// What a process call did with a trip: applied it now, or returned the
/// result stored by an earlier call.
#[derive(Debug, Clone, PartialEq)]
pub enum TripOutcome {
    Processed(TripResult),
    Replayed(TripResult),
}

impl TripOutcome {
    pub fn result(&self) -> &TripResult {
        match self {
            TripOutcome::Processed(result) | TripOutcome::Replayed(result) => result,
        }
    }

    pub fn into_result(self) -> TripResult {
        match self {
            TripOutcome::Processed(result) | TripOutcome::Replayed(result) => result,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, TripOutcome::Replayed(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripRecord {
    pub driver_id: String,
    #[serde(flatten)]
    pub intent: TripIntent,
    pub trip_date: NaiveDate,
    pub multiplier_applied: f64,
    pub final_fare: f64,
    pub coins_earned: u32,
    pub result: Option<TripResult>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl TripRecord {
    pub fn new(driver_id: &str, intent: TripIntent, trip_date: NaiveDate, now: DateTime<Utc>) -> Self {
        let final_fare = intent.base_trip_fare;
        Self {
            driver_id: driver_id.to_string(),
            intent,
            trip_date,
            multiplier_applied: 1.0,
            final_fare,
            coins_earned: 0,
            result: None,
            created_at: now,
            processed_at: None,
        }
    }

    pub fn trip_id(&self) -> &str {
        &self.intent.trip_id
    }

    pub fn is_processed(&self) -> bool {
        self.result.is_some()
    }

    pub fn mark_processed(&mut self, result: TripResult, trip_date: NaiveDate, now: DateTime<Utc>) {
        self.trip_date = trip_date;
        self.multiplier_applied = result.multiplier_applied;
        self.final_fare = result.final_fare;
        self.coins_earned = result.coins_earned;
        self.result = Some(result);
        self.processed_at = Some(now);
    }
}
