use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub experience_years: u32,
    pub rating: f64,
    pub home_location_id: u64,
    pub current_location_id: u64,
    pub daily_avg_distance_km: f64,
    pub target_distance_60_percent: f64,
    pub target_distance_100_percent: f64,
    pub ride_acceptance_rate: f64,
    pub cancellation_rate: f64,
    pub consecutive_target_days: u32,
    pub created_at: DateTime<Utc>,
}

impl Driver {
    /// Recomputes the 60% and 100% distance targets from the daily average.
    pub fn refresh_targets(&mut self) {
        let (tier1, tier2) = target_distances(self.daily_avg_distance_km);
        self.target_distance_60_percent = tier1;
        self.target_distance_100_percent = tier2;
    }
}

pub fn target_distances(daily_avg_distance_km: f64) -> (f64, f64) {
    (
        round_to_cents(daily_avg_distance_km * 0.6),
        round_to_cents(daily_avg_distance_km),
    )
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::target_distances;

    #[test]
    fn targets_are_sixty_and_hundred_percent_of_average() {
        assert_eq!(target_distances(120.0), (72.0, 120.0));
        assert_eq!(target_distances(83.337), (50.0, 83.34));
    }
}
