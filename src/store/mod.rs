//! Storage seams for the incentive ledger.
//!
//! The engine only talks to these traits; [`memory::InMemoryStore`] is the
//! bundled implementation.

pub mod memory;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::cancellation::CancellationRecord;
use crate::models::daily_stat::DailyStat;
use crate::models::driver::Driver;
use crate::models::location::Location;
use crate::models::trip::TripRecord;

pub trait LocationRepository: Send + Sync {
    /// Stores a new location and assigns its id.
    fn insert_location(&self, name: String, latitude: f64, longitude: f64) -> Result<Location, AppError>;

    fn location(&self, id: u64) -> Result<Option<Location>, AppError>;

    /// All locations ordered by id.
    fn locations(&self) -> Result<Vec<Location>, AppError>;
}

pub trait DriverRepository: Send + Sync {
    /// Fails with `Conflict` when the id is taken.
    fn insert_driver(&self, driver: Driver) -> Result<(), AppError>;

    fn driver(&self, id: &str) -> Result<Option<Driver>, AppError>;

    /// All drivers ordered by id.
    fn drivers(&self) -> Result<Vec<Driver>, AppError>;

    fn update_driver(&self, driver: Driver) -> Result<(), AppError>;
}

pub trait DailyStatRepository: Send + Sync {
    fn daily_stat(&self, driver_id: &str, date: NaiveDate) -> Result<Option<DailyStat>, AppError>;

    fn save_daily_stat(&self, stat: DailyStat) -> Result<(), AppError>;

    fn daily_stats_on(&self, date: NaiveDate) -> Result<Vec<DailyStat>, AppError>;

    /// Stats for one driver within an inclusive date range, oldest first.
    fn daily_stats_between(
        &self,
        driver_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyStat>, AppError>;
}

pub trait TripRepository: Send + Sync {
    /// Fails with `Conflict` when the trip id is taken.
    fn insert_trip(&self, record: TripRecord) -> Result<(), AppError>;

    fn trip(&self, trip_id: &str) -> Result<Option<TripRecord>, AppError>;

    fn save_trip(&self, record: TripRecord) -> Result<(), AppError>;

    /// Matching trips, newest first.
    fn trips(&self, filter: &RecordFilter) -> Result<Vec<TripRecord>, AppError>;
}

pub trait CancellationRepository: Send + Sync {
    fn insert_cancellation(&self, record: CancellationRecord) -> Result<(), AppError>;

    fn cancellation(&self, id: Uuid) -> Result<Option<CancellationRecord>, AppError>;

    fn save_cancellation(&self, record: CancellationRecord) -> Result<(), AppError>;

    /// Matching cancellations, newest first.
    fn cancellations(&self, filter: &RecordFilter) -> Result<Vec<CancellationRecord>, AppError>;
}

/// Everything the ledger needs from storage.
pub trait IncentiveStore:
    LocationRepository + DriverRepository + DailyStatRepository + TripRepository + CancellationRepository
{
}

impl<T> IncentiveStore for T where
    T: LocationRepository
        + DriverRepository
        + DailyStatRepository
        + TripRepository
        + CancellationRepository
{
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordFilter {
    pub driver_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            driver_id: None,
            start_date: None,
            end_date: None,
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl RecordFilter {
    pub fn for_driver(driver_id: &str) -> Self {
        Self {
            driver_id: Some(driver_id.to_string()),
            ..Self::default()
        }
    }

    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.limit = usize::MAX;
        self
    }

    pub fn matches(&self, driver_id: &str, date: NaiveDate) -> bool {
        self.driver_id.as_deref().is_none_or(|wanted| wanted == driver_id)
            && self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
    }
}

fn default_limit() -> usize {
    100
}
