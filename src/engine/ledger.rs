use std::hash::Hash;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::go_home::ScoreStrategy;
use crate::engine::{cancellation, coins, go_home, multiplier, streak};
use crate::error::AppError;
use crate::models::cancellation::{CancellationIntent, CancellationRecord, CancellationResult};
use crate::models::daily_stat::{DailyStat, MultiplierActivation};
use crate::models::driver::Driver;
use crate::models::location::Location;
use crate::models::recommendation::Recommendation;
use crate::models::trip::{TripIntent, TripOutcome, TripRecord, TripResult};
use crate::store::IncentiveStore;

type DayKey = (String, NaiveDate);

/// Applies incentive rules to stored driver state.
///
/// Every read-modify-write of a `(driver, date)` daily stat happens while
/// holding that pair's lock, so concurrent trips and cancellations for one
/// driver on one day serialize while other drivers proceed in parallel.
///
/// Processing a trip additionally holds a lock on its trip id, taken before
/// the day lock, so one trip is applied at most once whatever driver or date
/// the callers supply.
pub struct IncentiveLedger {
    store: Arc<dyn IncentiveStore>,
    scorer: Arc<dyn ScoreStrategy>,
    recommendation_sample_size: usize,
    // TODO: evict locks for dates before today once a daily rollover task exists
    day_locks: DashMap<DayKey, Arc<Mutex<()>>>,
    trip_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl IncentiveLedger {
    pub fn new(
        store: Arc<dyn IncentiveStore>,
        scorer: Arc<dyn ScoreStrategy>,
        recommendation_sample_size: usize,
    ) -> Self {
        Self {
            store,
            scorer,
            recommendation_sample_size,
            day_locks: DashMap::new(),
            trip_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn IncentiveStore> {
        &self.store
    }

    pub fn get_or_create_daily_stat(&self, driver_id: &str, date: NaiveDate) -> Result<DailyStat, AppError> {
        self.require_driver(driver_id)?;
        self.with_day_lock(driver_id, date, || self.load_daily_stat(driver_id, date))
    }

    pub fn reset_daily_stat(&self, driver_id: &str, date: NaiveDate) -> Result<DailyStat, AppError> {
        self.require_driver(driver_id)?;
        self.with_day_lock(driver_id, date, || {
            let stat = DailyStat::new(driver_id, date);
            self.store.save_daily_stat(stat.clone())?;
            info!(driver_id, %date, "daily stat reset");
            Ok(stat)
        })
    }

    /// Validates a trip and stores it unprocessed.
    pub fn record_trip(
        &self,
        driver_id: &str,
        intent: TripIntent,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<TripRecord, AppError> {
        intent.validate()?;
        self.require_driver(driver_id)?;

        for (role, location_id) in [
            ("pickup", intent.pickup_location_id),
            ("destination", intent.destination_location_id),
        ] {
            if self.store.location(location_id)?.is_none() {
                return Err(AppError::BadRequest(format!(
                    "{role} location {location_id} not found"
                )));
            }
        }

        let record = TripRecord::new(driver_id, intent, date, now);
        self.store.insert_trip(record.clone())?;
        info!(driver_id, trip_id = record.trip_id(), "trip recorded");
        Ok(record)
    }

    /// Processes a completed trip at most once.
    ///
    /// A trip that was already processed comes back as
    /// [`TripOutcome::Replayed`] with its stored result, and the daily stat is
    /// left alone. A trip recorded earlier must be processed with the details
    /// it was recorded with.
    pub fn process_trip(
        &self,
        driver_id: &str,
        intent: &TripIntent,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<TripOutcome, AppError> {
        intent.validate()?;

        self.with_trip_lock(&intent.trip_id, || {
            self.with_day_lock(driver_id, date, || self.apply_trip(driver_id, intent, date, now))
        })
    }

    // Caller holds the trip lock and the day lock.
    fn apply_trip(
        &self,
        driver_id: &str,
        intent: &TripIntent,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<TripOutcome, AppError> {
        let mut driver = self.require_driver(driver_id)?;

        let existing = self.store.trip(&intent.trip_id)?;
        if let Some(record) = &existing {
            if record.driver_id != driver_id {
                return Err(AppError::Conflict(format!(
                    "trip {} belongs to driver {}",
                    intent.trip_id, record.driver_id
                )));
            }
            if let Some(stored) = &record.result {
                info!(driver_id, trip_id = %intent.trip_id, "trip already processed; returning stored result");
                return Ok(TripOutcome::Replayed(stored.clone()));
            }
            if record.intent != *intent {
                warn!(driver_id, trip_id = %intent.trip_id, "trip details differ from the recorded trip");
                return Err(AppError::Conflict(format!(
                    "trip {} was recorded with different details",
                    intent.trip_id
                )));
            }
        }

        self.require_location(intent.pickup_location_id)?;
        self.require_location(intent.destination_location_id)?;

        let coins_earned = coins::coins_for_trip(&driver, intent)?;

        let mut stat = self.load_daily_stat(driver_id, date)?;
        multiplier::expire_if_due(&mut stat, now);

        let total_distance = intent.estimated_trip_distance_km + intent.distance_to_pickup_km;
        let multiplier_applied = multiplier::effective_multiplier(&stat, now);
        let final_fare = multiplier::fare_for(intent.base_trip_fare, &stat, now);

        stat.distance_covered_today += total_distance;
        stat.consecutive_trips += 1;
        stat.coins_earned += coins_earned;
        let streak_bonus_earned = streak::streak_bonus(stat.consecutive_trips);
        stat.coins_earned += streak_bonus_earned;
        stat.hours_active += f64::from(intent.trip_duration_minutes) / 60.0;

        let result = TripResult {
            driver_id: driver_id.to_string(),
            trip_id: intent.trip_id.clone(),
            coins_earned,
            total_distance,
            distance_covered_today: stat.distance_covered_today,
            new_coins_balance: stat.coins_earned,
            streak_bonus_earned,
            multiplier_applied,
            final_fare,
        };

        let mut record =
            existing.unwrap_or_else(|| TripRecord::new(driver_id, intent.clone(), date, now));
        record.mark_processed(result.clone(), date, now);
        driver.current_location_id = intent.destination_location_id;

        self.store.save_trip(record)?;
        self.store.save_daily_stat(stat)?;
        self.store.update_driver(driver)?;

        info!(
            driver_id,
            trip_id = %result.trip_id,
            coins = result.coins_earned,
            streak_bonus = result.streak_bonus_earned,
            balance = result.new_coins_balance,
            multiplier = result.multiplier_applied,
            "trip processed"
        );

        Ok(TripOutcome::Processed(result))
    }

    pub fn activate_multiplier(
        &self,
        driver_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<MultiplierActivation, AppError> {
        self.require_driver(driver_id)?;

        self.with_day_lock(driver_id, date, || {
            let mut stat = self.load_daily_stat(driver_id, date)?;
            if multiplier::expire_if_due(&mut stat, now) {
                self.store.save_daily_stat(stat.clone())?;
            }

            let activation = multiplier::activate(&mut stat, now).inspect_err(|err| {
                warn!(driver_id, coins = stat.coins_earned, error = %err, "multiplier activation rejected");
            })?;
            self.store.save_daily_stat(stat)?;

            info!(
                driver_id,
                value = activation.multiplier_value,
                expires_at = %activation.multiplier_expires_at,
                "multiplier activated"
            );
            Ok(activation)
        })
    }

    pub fn activate_go_home(&self, driver_id: &str, date: NaiveDate) -> Result<DailyStat, AppError> {
        self.require_driver(driver_id)?;

        self.with_day_lock(driver_id, date, || {
            let mut stat = self.load_daily_stat(driver_id, date)?;
            stat.go_home_mode_active = true;
            self.store.save_daily_stat(stat.clone())?;

            info!(driver_id, %date, "go-home mode activated");
            Ok(stat)
        })
    }

    /// Ranks a random sample of known locations for a driver in go-home mode.
    pub fn recommend(
        &self,
        driver_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, AppError> {
        let driver = self.require_driver(driver_id)?;

        let stat = self.with_day_lock(driver_id, date, || {
            let mut stat = self.load_daily_stat(driver_id, date)?;
            if multiplier::expire_if_due(&mut stat, now) {
                self.store.save_daily_stat(stat.clone())?;
            }
            Ok(stat)
        })?;

        if !stat.go_home_mode_active {
            warn!(driver_id, "recommendations requested outside go-home mode");
            return Err(AppError::NotInGoHomeMode(driver_id.to_string()));
        }

        let current = self.require_location(driver.current_location_id)?;
        let home = self.require_location(driver.home_location_id)?;

        let locations = self.store.locations()?;
        let candidates: Vec<Location> = locations
            .choose_multiple(&mut rand::thread_rng(), self.recommendation_sample_size)
            .cloned()
            .collect();

        let recommendations = go_home::recommend(&stat, &current, &home, &candidates, self.scorer.as_ref())?;
        info!(driver_id, count = recommendations.len(), "go-home recommendations ranked");
        Ok(recommendations)
    }

    /// Validates a cancellation and stores it unprocessed.
    pub fn record_cancellation(
        &self,
        intent: CancellationIntent,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CancellationRecord, AppError> {
        self.require_driver(&intent.driver_id)?;

        let record = CancellationRecord::new(intent, date, now);
        self.store.insert_cancellation(record.clone())?;
        info!(
            driver_id = %record.intent.driver_id,
            cancellation_id = %record.id,
            "cancellation recorded"
        );
        Ok(record)
    }

    /// Records and immediately penalizes a cancellation.
    pub fn process_cancellation(
        &self,
        driver_id: &str,
        intent: CancellationIntent,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CancellationResult, AppError> {
        if intent.driver_id != driver_id {
            return Err(AppError::BadRequest(format!(
                "cancellation driver {} does not match {driver_id}",
                intent.driver_id
            )));
        }
        let driver = self.require_driver(driver_id)?;

        self.with_day_lock(driver_id, date, || {
            let mut record = CancellationRecord::new(intent, date, now);
            let result = self.apply_penalty(&driver, &mut record, date, now)?;
            self.store.insert_cancellation(record)?;
            Ok(result)
        })
    }

    /// Penalizes a previously recorded cancellation. A cancellation is only
    /// ever charged once.
    pub fn process_recorded_cancellation(
        &self,
        cancellation_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CancellationResult, AppError> {
        let driver_id = self
            .store
            .cancellation(cancellation_id)?
            .ok_or(AppError::CancellationNotFound(cancellation_id))?
            .intent
            .driver_id;
        let driver = self.require_driver(&driver_id)?;

        self.with_day_lock(&driver_id, date, || {
            let mut record = self
                .store
                .cancellation(cancellation_id)?
                .ok_or(AppError::CancellationNotFound(cancellation_id))?;
            if record.is_processed() {
                warn!(%cancellation_id, "cancellation already processed");
                return Err(AppError::AlreadyProcessed(format!("cancellation {cancellation_id}")));
            }

            let result = self.apply_penalty(&driver, &mut record, date, now)?;
            self.store.save_cancellation(record)?;
            Ok(result)
        })
    }

    // Caller holds the day lock.
    fn apply_penalty(
        &self,
        driver: &Driver,
        record: &mut CancellationRecord,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CancellationResult, AppError> {
        let mut stat = self.load_daily_stat(&driver.id, date)?;
        let result = cancellation::penalize(driver, &mut stat, &record.intent, now);
        record.mark_processed(&result, now);
        self.store.save_daily_stat(stat)?;

        info!(
            driver_id = %driver.id,
            trip_id = %result.trip_id,
            reason = %record.intent.reason,
            penalty = result.penalty_coins,
            balance = result.new_coins_balance,
            "cancellation processed"
        );
        Ok(result)
    }

    fn with_day_lock<T>(
        &self,
        driver_id: &str,
        date: NaiveDate,
        critical: impl FnOnce() -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        with_lock(
            &self.day_locks,
            (driver_id.to_string(), date),
            || format!("daily stat lock for {driver_id}"),
            critical,
        )
    }

    fn with_trip_lock<T>(
        &self,
        trip_id: &str,
        critical: impl FnOnce() -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        with_lock(
            &self.trip_locks,
            trip_id.to_string(),
            || format!("trip lock for {trip_id}"),
            critical,
        )
    }

    // Caller holds the day lock.
    fn load_daily_stat(&self, driver_id: &str, date: NaiveDate) -> Result<DailyStat, AppError> {
        if let Some(stat) = self.store.daily_stat(driver_id, date)? {
            return Ok(stat);
        }

        let stat = DailyStat::new(driver_id, date);
        self.store.save_daily_stat(stat.clone())?;
        info!(driver_id, %date, "daily stat created");
        Ok(stat)
    }

    fn require_driver(&self, driver_id: &str) -> Result<Driver, AppError> {
        self.store
            .driver(driver_id)?
            .ok_or_else(|| AppError::DriverNotFound(driver_id.to_string()))
    }

    fn require_location(&self, location_id: u64) -> Result<Location, AppError> {
        self.store
            .location(location_id)?
            .ok_or(AppError::LocationNotFound(location_id))
    }
}

fn with_lock<K, T>(
    locks: &DashMap<K, Arc<Mutex<()>>>,
    key: K,
    describe: impl FnOnce() -> String,
    critical: impl FnOnce() -> Result<T, AppError>,
) -> Result<T, AppError>
where
    K: Eq + Hash,
{
    // The DashMap shard guard must be dropped before blocking on the mutex.
    let lock = locks
        .entry(key)
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .value()
        .clone();
    let _guard = lock
        .lock()
        .map_err(|_| AppError::Internal(format!("{} poisoned", describe())))?;
    critical()
}
