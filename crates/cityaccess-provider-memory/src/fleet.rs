//! Vehicle positions and radius search.

use std::collections::BTreeMap;

use cityaccess_schemas::{GeoPoint, VehicleInfo};

/// Last known position of every vehicle, keyed by device id.
#[derive(Clone, Debug, Default)]
pub(crate) struct Fleet {
    vehicles: BTreeMap<String, VehicleInfo>,
}

impl Fleet {
    pub(crate) fn upsert(&mut self, vehicle: VehicleInfo) -> Option<VehicleInfo> {
        self.vehicles.insert(vehicle.device_id.clone(), vehicle)
    }

    pub(crate) fn remove(&mut self, device_id: &str) -> Option<VehicleInfo> {
        self.vehicles.remove(device_id)
    }

    pub(crate) fn get(&self, device_id: &str) -> Option<&VehicleInfo> {
        self.vehicles.get(device_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Vehicles within `radius_m` of `center`, nearest first. Ties break on
    /// device id so results are deterministic.
    pub(crate) fn within(
        &self,
        center: GeoPoint,
        radius_m: f64,
        exclude: Option<&str>,
    ) -> Vec<VehicleInfo> {
        let mut hits: Vec<(f64, &VehicleInfo)> = self
            .vehicles
            .values()
            .filter(|v| Some(v.device_id.as_str()) != exclude)
            .map(|v| (center.distance_m(&v.position), v))
            .filter(|(d, _)| *d <= radius_m)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.device_id.cmp(&b.1.device_id)));
        hits.into_iter().map(|(_, v)| v.clone()).collect()
    }
}
