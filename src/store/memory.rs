use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::cancellation::CancellationRecord;
use crate::models::daily_stat::DailyStat;
use crate::models::driver::Driver;
use crate::models::location::Location;
use crate::models::trip::TripRecord;
use crate::store::{
    CancellationRepository, DailyStatRepository, DriverRepository, LocationRepository,
    RecordFilter, TripRepository,
};

pub struct InMemoryStore {
    locations: DashMap<u64, Location>,
    next_location_id: AtomicU64,
    drivers: DashMap<String, Driver>,
    daily_stats: DashMap<(String, NaiveDate), DailyStat>,
    trips: DashMap<String, TripRecord>,
    cancellations: DashMap<Uuid, CancellationRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            locations: DashMap::new(),
            next_location_id: AtomicU64::new(1),
            drivers: DashMap::new(),
            daily_stats: DashMap::new(),
            trips: DashMap::new(),
            cancellations: DashMap::new(),
        }
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            locations: self.locations.len(),
            drivers: self.drivers.len(),
            trips: self.trips.len(),
            cancellations: self.cancellations.len(),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub locations: usize,
    pub drivers: usize,
    pub trips: usize,
    pub cancellations: usize,
}

impl LocationRepository for InMemoryStore {
    fn insert_location(&self, name: String, latitude: f64, longitude: f64) -> Result<Location, AppError> {
        let location = Location {
            id: self.next_location_id.fetch_add(1, Ordering::Relaxed),
            name,
            latitude,
            longitude,
        };

        self.locations.insert(location.id, location.clone());
        Ok(location)
    }

    fn location(&self, id: u64) -> Result<Option<Location>, AppError> {
        Ok(self.locations.get(&id).map(|entry| entry.value().clone()))
    }

    fn locations(&self) -> Result<Vec<Location>, AppError> {
        let mut locations: Vec<Location> = self
            .locations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        locations.sort_by_key(|location| location.id);
        Ok(locations)
    }
}

impl DriverRepository for InMemoryStore {
    fn insert_driver(&self, driver: Driver) -> Result<(), AppError> {
        match self.drivers.entry(driver.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "driver {} already exists",
                driver.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(driver);
                Ok(())
            }
        }
    }

    fn driver(&self, id: &str) -> Result<Option<Driver>, AppError> {
        Ok(self.drivers.get(id).map(|entry| entry.value().clone()))
    }

    fn drivers(&self) -> Result<Vec<Driver>, AppError> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(drivers)
    }

    fn update_driver(&self, driver: Driver) -> Result<(), AppError> {
        let mut existing = self
            .drivers
            .get_mut(&driver.id)
            .ok_or_else(|| AppError::DriverNotFound(driver.id.clone()))?;
        *existing = driver;
        Ok(())
    }
}

impl DailyStatRepository for InMemoryStore {
    fn daily_stat(&self, driver_id: &str, date: NaiveDate) -> Result<Option<DailyStat>, AppError> {
        Ok(self
            .daily_stats
            .get(&(driver_id.to_string(), date))
            .map(|entry| entry.value().clone()))
    }

    fn save_daily_stat(&self, stat: DailyStat) -> Result<(), AppError> {
        self.daily_stats
            .insert((stat.driver_id.clone(), stat.date), stat);
        Ok(())
    }

    fn daily_stats_on(&self, date: NaiveDate) -> Result<Vec<DailyStat>, AppError> {
        Ok(self
            .daily_stats
            .iter()
            .filter(|entry| entry.value().date == date)
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn daily_stats_between(
        &self,
        driver_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyStat>, AppError> {
        let mut stats: Vec<DailyStat> = self
            .daily_stats
            .iter()
            .filter(|entry| {
                let stat = entry.value();
                stat.driver_id == driver_id && stat.date >= start && stat.date <= end
            })
            .map(|entry| entry.value().clone())
            .collect();
        stats.sort_by_key(|stat| stat.date);
        Ok(stats)
    }
}

impl TripRepository for InMemoryStore {
    fn insert_trip(&self, record: TripRecord) -> Result<(), AppError> {
        match self.trips.entry(record.trip_id().to_string()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "trip {} already exists",
                record.trip_id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn trip(&self, trip_id: &str) -> Result<Option<TripRecord>, AppError> {
        Ok(self.trips.get(trip_id).map(|entry| entry.value().clone()))
    }

    fn save_trip(&self, record: TripRecord) -> Result<(), AppError> {
        self.trips.insert(record.trip_id().to_string(), record);
        Ok(())
    }

    fn trips(&self, filter: &RecordFilter) -> Result<Vec<TripRecord>, AppError> {
        let mut trips: Vec<TripRecord> = self
            .trips
            .iter()
            .filter(|entry| filter.matches(&entry.value().driver_id, entry.value().trip_date))
            .map(|entry| entry.value().clone())
            .collect();
        trips.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.trip_id().cmp(b.trip_id()))
        });
        Ok(trips.into_iter().skip(filter.skip).take(filter.limit).collect())
    }
}

impl CancellationRepository for InMemoryStore {
    fn insert_cancellation(&self, record: CancellationRecord) -> Result<(), AppError> {
        match self.cancellations.entry(record.id) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "cancellation {} already exists",
                record.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn cancellation(&self, id: Uuid) -> Result<Option<CancellationRecord>, AppError> {
        Ok(self.cancellations.get(&id).map(|entry| entry.value().clone()))
    }

    fn save_cancellation(&self, record: CancellationRecord) -> Result<(), AppError> {
        self.cancellations.insert(record.id, record);
        Ok(())
    }

    fn cancellations(&self, filter: &RecordFilter) -> Result<Vec<CancellationRecord>, AppError> {
        let mut cancellations: Vec<CancellationRecord> = self
            .cancellations
            .iter()
            .filter(|entry| {
                let record = entry.value();
                filter.matches(&record.intent.driver_id, record.cancellation_date)
            })
            .map(|entry| entry.value().clone())
            .collect();
        cancellations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(cancellations
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::InMemoryStore;
    use crate::error::AppError;
    use crate::models::trip::{TimeOfDay, TripIntent, TripRecord};
    use crate::store::{LocationRepository, RecordFilter, TripRepository};

    fn record(trip_id: &str, driver_id: &str, day: u32, minute: i64) -> TripRecord {
        let created_at = Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap() + Duration::minutes(minute);
        TripRecord::new(
            driver_id,
            TripIntent {
                trip_id: trip_id.to_string(),
                pickup_location_id: 1,
                destination_location_id: 2,
                estimated_trip_distance_km: 5.0,
                distance_to_pickup_km: 1.0,
                traffic_factor: 0.5,
                time_of_day: TimeOfDay::Afternoon,
                at_event: false,
                event_type: None,
                base_fare: 30.0,
                base_trip_fare: 105.0,
                trip_duration_minutes: 15,
            },
            NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            created_at,
        )
    }

    #[test]
    fn location_ids_are_sequential() {
        let store = InMemoryStore::new();
        let first = store.insert_location("Jayanagar".to_string(), 12.93, 77.58).unwrap();
        let second = store.insert_location("Malleshwaram".to_string(), 13.0, 77.57).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.locations().unwrap().len(), 2);
    }

    #[test]
    fn duplicate_trip_ids_conflict() {
        let store = InMemoryStore::new();
        store.insert_trip(record("T-1", "D-1", 1, 0)).unwrap();

        let result = store.insert_trip(record("T-1", "D-1", 1, 5));
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn trip_filter_applies_driver_dates_and_paging() {
        let store = InMemoryStore::new();
        store.insert_trip(record("T-1", "D-1", 1, 0)).unwrap();
        store.insert_trip(record("T-2", "D-1", 2, 0)).unwrap();
        store.insert_trip(record("T-3", "D-1", 3, 0)).unwrap();
        store.insert_trip(record("T-4", "D-2", 2, 0)).unwrap();

        let filter = RecordFilter::for_driver("D-1").between(
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        );
        let trips = store.trips(&filter).unwrap();
        let ids: Vec<&str> = trips.iter().map(|trip| trip.trip_id()).collect();
        assert_eq!(ids, vec!["T-3", "T-2"]);

        let paged = RecordFilter {
            skip: 1,
            limit: 2,
            ..RecordFilter::default()
        };
        assert_eq!(store.trips(&paged).unwrap().len(), 2);
    }
}
