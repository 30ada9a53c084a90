use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::trip::{TimeOfDay, TripIntent};

const DISTANCE_COIN_RATE: f64 = 0.55;
const TRAFFIC_MAX_COINS: f64 = 20.0;
const TRAFFIC_BASE_WEIGHT: f64 = 0.5;
const TRAFFIC_TIME_OF_DAY_WEIGHT: f64 = 0.3;
const TRAFFIC_COIN_SCALE: f64 = 10.0;

const DEFAULT_EVENT_BONUS: u32 = 5;
const MAJOR_EVENT_BONUS: u32 = 10;
const FESTIVAL_EVENT_BONUS: u32 = 20;

/// Coins awarded for one completed trip.
///
/// The trip distance is expressed as a percentage of the driver's historical
/// daily average; traffic and event bonuses are added on top. Rounding is
/// half-to-even.
pub fn coins_for_trip(driver: &Driver, trip: &TripIntent) -> Result<u32, AppError> {
    if !(driver.daily_avg_distance_km > 0.0) {
        return Err(AppError::InvalidDailyAverage(driver.daily_avg_distance_km));
    }

    let distance_pct = trip.estimated_trip_distance_km / driver.daily_avg_distance_km * 100.0;
    let base_coins = (distance_pct * DISTANCE_COIN_RATE).floor();
    let traffic = traffic_coins(trip.traffic_factor, trip.time_of_day);
    let event = f64::from(event_bonus(trip.at_event, trip.event_type()));

    let total = (base_coins + traffic + event).round_ties_even();
    Ok(total.max(0.0) as u32)
}

pub fn traffic_weight(time_of_day: TimeOfDay) -> f64 {
    match time_of_day {
        TimeOfDay::Morning => 0.8,
        TimeOfDay::Evening => 0.9,
        TimeOfDay::Afternoon => 0.5,
        TimeOfDay::Night => 0.3,
        TimeOfDay::Unspecified => 0.5,
    }
}

pub fn traffic_coins(traffic_factor: f64, time_of_day: TimeOfDay) -> f64 {
    let weighted = traffic_factor * TRAFFIC_BASE_WEIGHT
        + traffic_weight(time_of_day) * TRAFFIC_TIME_OF_DAY_WEIGHT;
    (weighted * TRAFFIC_COIN_SCALE).min(TRAFFIC_MAX_COINS)
}

pub fn event_bonus(at_event: bool, event_type: Option<&str>) -> u32 {
    if !at_event {
        return 0;
    }

    match event_type {
        Some("Concert") | Some("Sports") => MAJOR_EVENT_BONUS,
        Some("Festival") => FESTIVAL_EVENT_BONUS,
        _ => DEFAULT_EVENT_BONUS,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{coins_for_trip, event_bonus, traffic_coins};
    use crate::error::AppError;
    use crate::models::driver::Driver;
    use crate::models::trip::{TimeOfDay, TripIntent};

    fn driver(daily_avg_distance_km: f64) -> Driver {
        Driver {
            id: "D-1".to_string(),
            name: "Ravi".to_string(),
            experience_years: 4,
            rating: 4.6,
            home_location_id: 1,
            current_location_id: 2,
            daily_avg_distance_km,
            target_distance_60_percent: daily_avg_distance_km * 0.6,
            target_distance_100_percent: daily_avg_distance_km,
            ride_acceptance_rate: 88.0,
            cancellation_rate: 6.0,
            consecutive_target_days: 0,
            created_at: Utc::now(),
        }
    }

    fn trip(distance_km: f64, traffic_factor: f64, time_of_day: TimeOfDay) -> TripIntent {
        TripIntent {
            trip_id: "T-1".to_string(),
            pickup_location_id: 2,
            destination_location_id: 3,
            estimated_trip_distance_km: distance_km,
            distance_to_pickup_km: 1.0,
            traffic_factor,
            time_of_day,
            at_event: false,
            event_type: None,
            base_fare: 40.0,
            base_trip_fare: 180.0,
            trip_duration_minutes: 25,
        }
    }

    #[test]
    fn combines_distance_and_traffic_components() {
        // base floor(10% * 0.55) = 5, traffic (0.5 + 0.24) * 10 = 7.4
        let coins = coins_for_trip(&driver(100.0), &trip(10.0, 1.0, TimeOfDay::Morning)).unwrap();
        assert_eq!(coins, 12);
    }

    #[test]
    fn festival_pays_the_largest_event_bonus() {
        let mut festival = trip(10.0, 1.0, TimeOfDay::Morning);
        festival.at_event = true;
        festival.event_type = Some("Festival".to_string());

        let coins = coins_for_trip(&driver(100.0), &festival).unwrap();
        assert_eq!(coins, 32);
    }

    #[test]
    fn event_bonus_table() {
        assert_eq!(event_bonus(false, Some("Festival")), 0);
        assert_eq!(event_bonus(true, None), 5);
        assert_eq!(event_bonus(true, Some("Conference")), 5);
        assert_eq!(event_bonus(true, Some("Concert")), 10);
        assert_eq!(event_bonus(true, Some("Sports")), 10);
        assert_eq!(event_bonus(true, Some("Festival")), 20);
    }

    #[test]
    fn coins_never_decrease_as_traffic_grows() {
        let driver = driver(150.0);
        for time_of_day in [
            TimeOfDay::Morning,
            TimeOfDay::Afternoon,
            TimeOfDay::Evening,
            TimeOfDay::Night,
            TimeOfDay::Unspecified,
        ] {
            let mut previous = 0;
            for step in 0..=20 {
                let factor = f64::from(step) * 0.1;
                let coins = coins_for_trip(&driver, &trip(12.0, factor, time_of_day)).unwrap();
                assert!(coins >= previous, "{time_of_day:?} at {factor}: {coins} < {previous}");
                previous = coins;
            }
        }
    }

    #[test]
    fn traffic_component_is_capped() {
        assert!(traffic_coins(50.0, TimeOfDay::Evening) <= 20.0);
        assert!((traffic_coins(2.0, TimeOfDay::Evening) - 12.7).abs() < 1e-9);
    }

    #[test]
    fn zero_daily_average_is_a_precondition_failure() {
        let result = coins_for_trip(&driver(0.0), &trip(10.0, 1.0, TimeOfDay::Night));
        assert!(matches!(result, Err(AppError::InvalidDailyAverage(_))));
    }
}
