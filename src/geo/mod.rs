use crate::models::location::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    haversine_km(
        &GeoPoint {
            lat: lat1,
            lng: lng1,
        },
        &GeoPoint {
            lat: lat2,
            lng: lng2,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::distance_km;

    #[test]
    fn zero_distance_for_same_point() {
        let distance = distance_km(12.9716, 77.5946, 12.9716, 77.5946);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn majestic_to_whitefield_is_around_19_km() {
        let distance = distance_km(12.9767, 77.5713, 12.9698, 77.7500);
        assert!((distance - 19.4).abs() < 1.0, "got {distance}");
    }

    #[test]
    fn distance_is_symmetric() {
        let there = distance_km(12.9352, 77.6245, 13.0358, 77.5970);
        let back = distance_km(13.0358, 77.5970, 12.9352, 77.6245);
        assert!((there - back).abs() < 1e-9);
    }
}
