use rand::Rng;

use crate::error::AppError;
use crate::geo::{distance_km, haversine_km};
use crate::models::daily_stat::DailyStat;
use crate::models::location::Location;
use crate::models::recommendation::Recommendation;

const CLOSER_BONUS_PER_KM: f64 = 10.0;
const CLOSER_BONUS_CAP: f64 = 40.0;
const FARTHER_PENALTY_PER_KM: f64 = 5.0;
const FARTHER_PENALTY_CAP: f64 = 20.0;

const FARE_FLAG_DOWN: f64 = 30.0;
const FARE_PER_KM: f64 = 15.0;

/// Produces the starting score for a candidate trip before the home-ward
/// adjustment is applied.
pub trait ScoreStrategy: Send + Sync {
    fn base_score(&self, current: &Location, destination: &Location) -> f64;
}

/// Uniform random base score in `[30, 90)`. Placeholder until a trained
/// scorer exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomScore;

impl ScoreStrategy for RandomScore {
    fn base_score(&self, _current: &Location, _destination: &Location) -> f64 {
        rand::thread_rng().gen_range(30.0..90.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedScore(pub f64);

impl ScoreStrategy for FixedScore {
    fn base_score(&self, _current: &Location, _destination: &Location) -> f64 {
        self.0
    }
}

/// Applies the home-ward adjustment and clamps to `[0, 100]`.
pub fn adjust_score(base_score: f64, current_to_home_km: f64, destination_to_home_km: f64) -> f64 {
    let adjusted = if destination_to_home_km < current_to_home_km {
        let improvement = current_to_home_km - destination_to_home_km;
        base_score + (improvement * CLOSER_BONUS_PER_KM).min(CLOSER_BONUS_CAP)
    } else {
        let regression = destination_to_home_km - current_to_home_km;
        base_score - (regression * FARTHER_PENALTY_PER_KM).min(FARTHER_PENALTY_CAP)
    };

    adjusted.clamp(0.0, 100.0)
}

pub fn estimated_fare(trip_distance_km: f64, multiplier_value: f64) -> f64 {
    round_to(
        (FARE_FLAG_DOWN + trip_distance_km * FARE_PER_KM) * multiplier_value,
        100.0,
    )
}

/// Ranks candidate destinations for a driver heading home, best first.
///
/// The driver's current location is never offered as a destination.
pub fn recommend(
    stat: &DailyStat,
    current: &Location,
    home: &Location,
    candidates: &[Location],
    strategy: &dyn ScoreStrategy,
) -> Result<Vec<Recommendation>, AppError> {
    if !stat.go_home_mode_active {
        return Err(AppError::NotInGoHomeMode(stat.driver_id.clone()));
    }

    let current_to_home = haversine_km(&current.point(), &home.point());

    let mut recommendations: Vec<Recommendation> = candidates
        .iter()
        .enumerate()
        .filter(|(_, destination)| destination.id != current.id)
        .map(|(idx, destination)| {
            let destination_to_home = haversine_km(&destination.point(), &home.point());
            let trip_distance_km = round_to(
                distance_km(
                    current.latitude,
                    current.longitude,
                    destination.latitude,
                    destination.longitude,
                ),
                10.0,
            );
            let score = adjust_score(
                strategy.base_score(current, destination),
                current_to_home,
                destination_to_home,
            );

            Recommendation {
                trip_id: format!("POTENTIAL-{}", idx + 1),
                pickup_location: current.name.clone(),
                destination_location: destination.name.clone(),
                destination_location_id: destination.id,
                score: round_to(score, 10.0),
                brings_closer_to_home: destination_to_home < current_to_home,
                trip_distance_km,
                estimated_fare: estimated_fare(trip_distance_km, stat.multiplier_value),
            }
        })
        .collect();

    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(recommendations)
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{adjust_score, estimated_fare, recommend, FixedScore, RandomScore};
    use crate::error::AppError;
    use crate::geo::distance_km;
    use crate::models::daily_stat::DailyStat;
    use crate::models::location::Location;

    fn location(id: u64, name: &str, latitude: f64, longitude: f64) -> Location {
        Location {
            id,
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    fn bengaluru() -> Vec<Location> {
        vec![
            location(1, "Koramangala", 12.9352, 77.6245),
            location(2, "Hebbal", 13.0358, 77.5970),
            location(3, "Indiranagar", 12.9784, 77.6408),
            location(4, "Yelahanka", 13.1007, 77.5963),
            location(5, "Electronic City", 12.8399, 77.6770),
        ]
    }

    fn go_home_stat() -> DailyStat {
        let mut stat = DailyStat::new("D-3", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        stat.go_home_mode_active = true;
        stat
    }

    #[test]
    fn closer_destinations_gain_up_to_forty_points() {
        assert_eq!(adjust_score(50.0, 10.0, 8.0), 70.0);
        assert_eq!(adjust_score(50.0, 10.0, 2.0), 90.0);
        assert_eq!(adjust_score(80.0, 10.0, 0.0), 100.0);
    }

    #[test]
    fn farther_destinations_lose_up_to_twenty_points() {
        assert_eq!(adjust_score(50.0, 10.0, 12.0), 40.0);
        assert_eq!(adjust_score(50.0, 10.0, 30.0), 30.0);
        assert_eq!(adjust_score(10.0, 0.0, 30.0), 0.0);
    }

    #[test]
    fn fare_scales_with_distance_and_multiplier() {
        assert_eq!(estimated_fare(10.0, 1.0), 180.0);
        assert_eq!(estimated_fare(10.0, 1.5), 270.0);
    }

    #[test]
    fn requires_go_home_mode() {
        let locations = bengaluru();
        let stat = DailyStat::new("D-3", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let result = recommend(&stat, &locations[0], &locations[1], &locations, &FixedScore(60.0));
        assert!(matches!(result, Err(AppError::NotInGoHomeMode(_))));
    }

    #[test]
    fn excludes_current_location_and_ranks_home_ward_trips_first() {
        let locations = bengaluru();
        let current = &locations[0];
        let home = &locations[3];

        let ranked = recommend(&go_home_stat(), current, home, &locations, &FixedScore(60.0)).unwrap();

        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|r| r.destination_location_id != current.id));
        assert!(ranked.windows(2).all(|pair| pair[0].score >= pair[1].score));
        assert!(ranked[0].brings_closer_to_home);
        assert_eq!(ranked[0].pickup_location, "Koramangala");

        let last = ranked.last().unwrap();
        assert_eq!(last.destination_location, "Electronic City");
        assert!(!last.brings_closer_to_home);
        assert_eq!(last.score, 40.0);
    }

    #[test]
    fn trip_distance_is_the_rounded_distance_from_the_current_location() {
        let locations = bengaluru();
        let current = &locations[0];

        let ranked = recommend(&go_home_stat(), current, &locations[3], &locations, &FixedScore(60.0)).unwrap();

        for recommendation in &ranked {
            let destination = &locations[recommendation.destination_location_id as usize - 1];
            let expected = distance_km(
                current.latitude,
                current.longitude,
                destination.latitude,
                destination.longitude,
            );
            assert!((recommendation.trip_distance_km - expected).abs() <= 0.051);
            assert_eq!(
                recommendation.estimated_fare,
                estimated_fare(recommendation.trip_distance_km, 1.0)
            );
        }
    }

    #[test]
    fn random_scores_stay_within_bounds() {
        let locations = bengaluru();

        for _ in 0..50 {
            let ranked =
                recommend(&go_home_stat(), &locations[2], &locations[4], &locations, &RandomScore).unwrap();
            assert!(ranked.iter().all(|r| (0.0..=100.0).contains(&r.score)));
            assert!(ranked.iter().all(|r| r.destination_location_id != 3));
        }
    }
}
