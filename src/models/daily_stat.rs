use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A driver's accumulator for one calendar day. Keyed by `(driver_id, date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStat {
    pub driver_id: String,
    pub date: NaiveDate,
    pub distance_covered_today: f64,
    pub coins_earned: u32,
    pub hours_active: f64,
    pub consecutive_trips: u32,
    pub multiplier_active: bool,
    pub multiplier_value: f64,
    pub multiplier_expires_at: Option<DateTime<Utc>>,
    pub go_home_mode_active: bool,
}

impl DailyStat {
    pub fn new(driver_id: &str, date: NaiveDate) -> Self {
        Self {
            driver_id: driver_id.to_string(),
            date,
            distance_covered_today: 0.0,
            coins_earned: 0,
            hours_active: 0.0,
            consecutive_trips: 0,
            multiplier_active: false,
            multiplier_value: 1.0,
            multiplier_expires_at: None,
            go_home_mode_active: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiplierActivation {
    pub driver_id: String,
    pub multiplier_value: f64,
    pub multiplier_active: bool,
    pub multiplier_expires_at: DateTime<Utc>,
    pub message: String,
}
