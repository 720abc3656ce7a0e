use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Mean earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// WGS84 latitude/longitude pair in decimal degrees.
///
/// Fields are public so callers can build positions from raw wire input;
/// [`GeoPoint::validate`] is what providers run before trusting one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a validated point.
    pub fn new(lat: f64, lng: f64) -> Result<Self, SchemaError> {
        let p = Self { lat, lng };
        p.validate()?;
        Ok(p)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let ok = self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng);
        if ok {
            Ok(())
        } else {
            Err(SchemaError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// The legacy vendor wire format uses `(0, 0)` for "no destination".
    pub fn is_wire_zero(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }

    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        haversine_m(*self, *other)
    }
}

/// Great-circle distance in meters.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_and_nan() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 118.0).is_err());
        assert!(GeoPoint::new(32.05, 118.79).is_ok());
    }

    #[test]
    fn haversine_is_zero_for_same_point() {
        let p = GeoPoint::new(32.0603, 118.7969).unwrap();
        assert!(haversine_m(p, p) < 1e-6);
    }

    #[test]
    fn haversine_one_degree_latitude_is_about_111km() {
        let a = GeoPoint::new(32.0, 118.0).unwrap();
        let b = GeoPoint::new(33.0, 118.0).unwrap();
        let d = a.distance_m(&b);
        assert!((d - 111_195.0).abs() < 200.0, "got {d}");
    }
}
