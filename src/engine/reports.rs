use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AppError;
use crate::store::{IncentiveStore, RecordFilter};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub driver_id: String,
    pub name: String,
    pub coins_earned: u32,
    pub distance_covered_km: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EarningsReport {
    pub driver_id: String,
    pub driver_name: String,
    pub period: ReportPeriod,
    pub totals: EarningsTotals,
    pub averages: EarningsAverages,
    pub daily_earnings: Vec<DailyEarnings>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EarningsTotals {
    pub coins_earned: u64,
    pub distance_covered_km: f64,
    pub hours_active: f64,
    pub trips_completed: usize,
    pub base_fare_earned: f64,
    pub final_fare_earned: f64,
    pub bonus_from_multipliers: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EarningsAverages {
    pub coins_per_day: f64,
    pub distance_per_day: f64,
    pub fare_per_trip: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyEarnings {
    pub date: NaiveDate,
    pub coins_earned: u32,
    pub distance_covered_km: f64,
    pub hours_active: f64,
    pub trips_count: usize,
    pub fare_earned: f64,
}

/// Top drivers by coins earned on `date`.
pub fn leaderboard(
    store: &dyn IncentiveStore,
    date: NaiveDate,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    let mut stats = store.daily_stats_on(date)?;
    stats.sort_by(|a, b| {
        b.coins_earned
            .cmp(&a.coins_earned)
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });

    let mut entries = Vec::with_capacity(limit.min(stats.len()));
    for stat in stats {
        if entries.len() == limit {
            break;
        }
        let Some(driver) = store.driver(&stat.driver_id)? else {
            continue;
        };

        entries.push(LeaderboardEntry {
            rank: entries.len() + 1,
            driver_id: stat.driver_id,
            name: driver.name,
            coins_earned: stat.coins_earned,
            distance_covered_km: stat.distance_covered_today,
        });
    }

    Ok(entries)
}

/// Coins, distance and fares for one driver over an inclusive date range.
/// Only processed trips count towards fares.
pub fn driver_earnings(
    store: &dyn IncentiveStore,
    driver_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<EarningsReport, AppError> {
    if start > end {
        return Err(AppError::BadRequest(format!(
            "start_date {start} is after end_date {end}"
        )));
    }

    let driver = store
        .driver(driver_id)?
        .ok_or_else(|| AppError::DriverNotFound(driver_id.to_string()))?;

    let stats = store.daily_stats_between(driver_id, start, end)?;
    let trips: Vec<_> = store
        .trips(&RecordFilter::for_driver(driver_id).between(start, end).unbounded())?
        .into_iter()
        .filter(|trip| trip.is_processed())
        .collect();

    let daily_earnings: Vec<DailyEarnings> = stats
        .iter()
        .map(|stat| {
            let day_trips = trips.iter().filter(|trip| trip.trip_date == stat.date);
            let (trips_count, fare_earned) = day_trips.fold((0, 0.0), |(count, fare), trip| {
                (count + 1, fare + trip.final_fare)
            });

            DailyEarnings {
                date: stat.date,
                coins_earned: stat.coins_earned,
                distance_covered_km: stat.distance_covered_today,
                hours_active: stat.hours_active,
                trips_count,
                fare_earned,
            }
        })
        .collect();

    let coins_earned: u64 = stats.iter().map(|stat| u64::from(stat.coins_earned)).sum();
    let distance_covered_km: f64 = stats.iter().map(|stat| stat.distance_covered_today).sum();
    let hours_active: f64 = stats.iter().map(|stat| stat.hours_active).sum();
    let base_fare_earned: f64 = trips.iter().map(|trip| trip.intent.base_trip_fare).sum();
    let final_fare_earned: f64 = trips.iter().map(|trip| trip.final_fare).sum();

    let day_count = stats.len() as f64;
    let averages = EarningsAverages {
        coins_per_day: if stats.is_empty() { 0.0 } else { coins_earned as f64 / day_count },
        distance_per_day: if stats.is_empty() { 0.0 } else { distance_covered_km / day_count },
        fare_per_trip: if trips.is_empty() {
            0.0
        } else {
            final_fare_earned / trips.len() as f64
        },
    };

    Ok(EarningsReport {
        driver_id: driver.id,
        driver_name: driver.name,
        period: ReportPeriod {
            start_date: start,
            end_date: end,
            days: (end - start).num_days() + 1,
        },
        totals: EarningsTotals {
            coins_earned,
            distance_covered_km,
            hours_active,
            trips_completed: trips.len(),
            base_fare_earned,
            final_fare_earned,
            bonus_from_multipliers: final_fare_earned - base_fare_earned,
        },
        averages,
        daily_earnings,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{driver_earnings, leaderboard};
    use crate::error::AppError;
    use crate::models::daily_stat::DailyStat;
    use crate::models::driver::Driver;
    use crate::models::trip::{TimeOfDay, TripIntent, TripRecord, TripResult};
    use crate::store::memory::InMemoryStore;
    use crate::store::{DailyStatRepository, DriverRepository, TripRepository};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn driver(id: &str, name: &str) -> Driver {
        Driver {
            id: id.to_string(),
            name: name.to_string(),
            experience_years: 2,
            rating: 4.0,
            home_location_id: 1,
            current_location_id: 1,
            daily_avg_distance_km: 100.0,
            target_distance_60_percent: 60.0,
            target_distance_100_percent: 100.0,
            ride_acceptance_rate: 80.0,
            cancellation_rate: 10.0,
            consecutive_target_days: 0,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    fn stat(driver_id: &str, date: NaiveDate, coins: u32, distance: f64) -> DailyStat {
        DailyStat {
            coins_earned: coins,
            distance_covered_today: distance,
            hours_active: 2.0,
            ..DailyStat::new(driver_id, date)
        }
    }

    fn trip(driver_id: &str, trip_id: &str, date: NaiveDate, final_fare: Option<f64>) -> TripRecord {
        let intent = TripIntent {
            trip_id: trip_id.to_string(),
            pickup_location_id: 1,
            destination_location_id: 2,
            estimated_trip_distance_km: 8.0,
            distance_to_pickup_km: 1.0,
            traffic_factor: 1.0,
            time_of_day: TimeOfDay::Evening,
            at_event: false,
            event_type: None,
            base_fare: 30.0,
            base_trip_fare: 100.0,
            trip_duration_minutes: 20,
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        let mut record = TripRecord::new(driver_id, intent, date, now);

        if let Some(fare) = final_fare {
            let result = TripResult {
                driver_id: driver_id.to_string(),
                trip_id: trip_id.to_string(),
                coins_earned: 9,
                total_distance: 9.0,
                distance_covered_today: 9.0,
                new_coins_balance: 9,
                streak_bonus_earned: 0,
                multiplier_applied: fare / 100.0,
                final_fare: fare,
            };
            record.mark_processed(result, date, now);
        }
        record
    }

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_driver(driver("D-1", "Ravi")).unwrap();
        store.insert_driver(driver("D-2", "Asha")).unwrap();
        store.insert_driver(driver("D-3", "Imran")).unwrap();

        store.save_daily_stat(stat("D-1", day(1), 40, 30.0)).unwrap();
        store.save_daily_stat(stat("D-2", day(1), 75, 55.0)).unwrap();
        store.save_daily_stat(stat("D-3", day(1), 40, 20.0)).unwrap();
        store.save_daily_stat(stat("D-1", day(2), 60, 45.0)).unwrap();
        store
    }

    #[test]
    fn leaderboard_ranks_by_coins_then_driver_id() {
        let store = seeded();

        let board = leaderboard(&store, day(1), 10).unwrap();
        let order: Vec<_> = board.iter().map(|entry| entry.driver_id.as_str()).collect();
        assert_eq!(order, ["D-2", "D-1", "D-3"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].name, "Asha");
        assert_eq!(board[2].rank, 3);
    }

    #[test]
    fn leaderboard_respects_limit() {
        let store = seeded();

        let board = leaderboard(&store, day(1), 2).unwrap();
        assert_eq!(board.len(), 2);
        assert!(leaderboard(&store, day(9), 10).unwrap().is_empty());
    }

    #[test]
    fn earnings_sum_days_and_processed_trips_only() {
        let store = seeded();
        store.insert_trip(trip("D-1", "T-1", day(1), Some(125.0))).unwrap();
        store.insert_trip(trip("D-1", "T-2", day(2), Some(100.0))).unwrap();
        store.insert_trip(trip("D-1", "T-3", day(2), None)).unwrap();
        store.insert_trip(trip("D-2", "T-4", day(1), Some(150.0))).unwrap();

        let report = driver_earnings(&store, "D-1", day(1), day(3)).unwrap();

        assert_eq!(report.driver_name, "Ravi");
        assert_eq!(report.period.days, 3);
        assert_eq!(report.totals.coins_earned, 100);
        assert_eq!(report.totals.distance_covered_km, 75.0);
        assert_eq!(report.totals.trips_completed, 2);
        assert_eq!(report.totals.base_fare_earned, 200.0);
        assert_eq!(report.totals.final_fare_earned, 225.0);
        assert_eq!(report.totals.bonus_from_multipliers, 25.0);
        assert_eq!(report.averages.coins_per_day, 50.0);
        assert_eq!(report.averages.fare_per_trip, 112.5);

        assert_eq!(report.daily_earnings.len(), 2);
        assert_eq!(report.daily_earnings[0].date, day(1));
        assert_eq!(report.daily_earnings[0].fare_earned, 125.0);
        assert_eq!(report.daily_earnings[1].trips_count, 1);
    }

    #[test]
    fn earnings_reject_reversed_range_and_unknown_driver() {
        let store = seeded();

        assert!(matches!(
            driver_earnings(&store, "D-1", day(3), day(1)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            driver_earnings(&store, "D-9", day(1), day(3)),
            Err(AppError::DriverNotFound(_))
        ));
    }
}
