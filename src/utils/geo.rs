//! Great-circle distance helpers.

use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range values
    pub fn new(lat: f64, lng: f64) -> Result<Self, ApiError> {
        validate_coordinate(lat, lng)?;
        Ok(Self { lat, lng })
    }
}

/// Latitude must be finite and within [-90, 90], longitude within [-180, 180]
pub fn validate_coordinate(lat: f64, lng: f64) -> Result<(), ApiError> {
    let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
    let lng_ok = lng.is_finite() && (-180.0..=180.0).contains(&lng);
    if lat_ok && lng_ok {
        Ok(())
    } else {
        Err(ApiError::InvalidCoordinate { lat, lng })
    }
}

/// Haversine distance between two points in kilometers
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let x = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * x.sqrt().atan2((1.0 - x).sqrt());
    EARTH_RADIUS_KM * c
}

/// Human readable distance: whole meters below 1 km, else km with one decimal
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.1} km", km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = distance_km(GeoPoint { lat: 0.0, lng: 0.0 }, GeoPoint { lat: 0.0, lng: 1.0 });
        assert!((d - 111.19).abs() < 0.05, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_self() {
        let a = GeoPoint { lat: 12.9716, lng: 77.5946 };
        let b = GeoPoint { lat: 12.9352, lng: 77.6245 };
        assert_eq!(distance_km(a, a), 0.0);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
        // VoltHub Central to GreenCharge West is roughly 5 km
        let d = distance_km(a, b);
        assert!(d > 4.5 && d < 5.5, "got {}", d);
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.5), "500 m");
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(0.1234), "123 m");
        assert_eq!(format_distance(2.34), "2.3 km");
        assert_eq!(format_distance(1.0), "1.0 km");
    }

    #[test]
    fn test_validate_coordinate() {
        assert!(GeoPoint::new(12.97, 77.59).is_ok());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());

        assert!(matches!(
            GeoPoint::new(f64::NAN, 0.0),
            Err(ApiError::InvalidCoordinate { .. })
        ));
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
    }
}
