//! Live vehicle tracking contract.

use cityaccess_schemas::{GeoPoint, VehicleInfo};

use crate::error::{InvalidArgument, TrackServiceError};

/// Contract every tracking-capable provider implements.
///
/// Fields a provider cannot supply stay empty (`plate: None`,
/// `Occupancy::Unknown`); values are never invented.
pub trait TrackService: Send + Sync {
    /// Whether [`TrackService::taxis_near_by`] and
    /// [`TrackService::track_taxi_with_near_by`] are supported. Static.
    fn track_nearby_taxis_enabled(&self) -> bool;

    /// Vehicles around `location`.
    ///
    /// `radius_hint_m` is advisory; `0.0` means "provider default". An empty
    /// vector means nothing was found and is not an error.
    ///
    /// # Errors
    /// `Unsupported` when nearby tracking is disabled; `InvalidArgument` for
    /// malformed coordinates or a negative/non-finite radius; `Track` with
    /// `NetworkError`/`DbOperationError` for backend failures.
    fn taxis_near_by(
        &self,
        location: GeoPoint,
        radius_hint_m: f64,
    ) -> Result<Vec<VehicleInfo>, TrackServiceError>;

    /// Same as [`TrackService::taxis_near_by`], centred on a known vehicle.
    /// The tracked vehicle itself comes first.
    ///
    /// # Errors
    /// Additionally `Track(DeviceNotFound)` for an unknown device.
    fn track_taxi_with_near_by(
        &self,
        device_id: &str,
        radius_hint_m: f64,
    ) -> Result<Vec<VehicleInfo>, TrackServiceError>;

    /// Single-vehicle lookup.
    ///
    /// # Errors
    /// `Track(DeviceNotFound)` for an unknown device.
    fn track_taxi(&self, device_id: &str) -> Result<VehicleInfo, TrackServiceError>;
}

/// Shared argument checks for nearby queries.
pub fn validate_location(location: &GeoPoint) -> Result<(), InvalidArgument> {
    location
        .validate()
        .map_err(|e| InvalidArgument::new("location", e.to_string()))
}

pub fn validate_radius(radius_hint_m: f64) -> Result<(), InvalidArgument> {
    if !radius_hint_m.is_finite() || radius_hint_m < 0.0 {
        return Err(InvalidArgument::new(
            "radius_hint_m",
            format!("radius must be a finite, non-negative number of meters, got {radius_hint_m}"),
        ));
    }
    Ok(())
}

pub fn validate_device_id(device_id: &str) -> Result<(), InvalidArgument> {
    if device_id.trim().is_empty() {
        return Err(InvalidArgument::new("device_id", "device id is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_checks() {
        assert!(validate_radius(0.0).is_ok());
        assert!(validate_radius(1500.0).is_ok());
        assert_eq!(validate_radius(-1.0).unwrap_err().argument, "radius_hint_m");
        assert!(validate_radius(f64::NAN).is_err());
        assert!(validate_radius(f64::INFINITY).is_err());
    }

    #[test]
    fn location_checks() {
        assert!(validate_location(&GeoPoint { lat: 32.0, lng: 118.8 }).is_ok());
        let err = validate_location(&GeoPoint { lat: -95.0, lng: 0.0 }).unwrap_err();
        assert_eq!(err.argument, "location");
    }

    #[test]
    fn blank_device_rejected() {
        assert!(validate_device_id("  ").is_err());
        assert!(validate_device_id("T-1").is_ok());
    }
}
