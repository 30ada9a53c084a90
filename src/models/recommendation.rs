use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub trip_id: String,
    pub pickup_location: String,
    pub destination_location: String,
    pub destination_location_id: u64,
    pub score: f64,
    pub brings_closer_to_home: bool,
    pub trip_distance_km: f64,
    pub estimated_fare: f64,
}
