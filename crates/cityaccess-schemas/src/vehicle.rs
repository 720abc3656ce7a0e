use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::geo::GeoPoint;

/// Passenger state reported by the in-car terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Occupancy {
    /// The provider cannot tell. Used instead of guessing.
    #[default]
    Unknown = 0,
    Empty = 1,
    Occupied = 2,
}

impl TryFrom<u8> for Occupancy {
    type Error = SchemaError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Empty),
            2 => Ok(Self::Occupied),
            other => Err(SchemaError::UnknownOccupancyCode(other)),
        }
    }
}

impl From<Occupancy> for u8 {
    fn from(o: Occupancy) -> u8 {
        o as u8
    }
}

/// Snapshot of one tracked vehicle, produced fresh on every tracking query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    /// In-car terminal identifier.
    pub device_id: String,
    /// Licence plate. `None` when the provider does not know it.
    pub plate: Option<String>,
    pub position: GeoPoint,
    #[serde(default)]
    pub occupancy: Occupancy,
}

impl VehicleInfo {
    pub fn new(device_id: impl Into<String>, position: GeoPoint) -> Self {
        Self {
            device_id: device_id.into(),
            plate: None,
            position,
            occupancy: Occupancy::Unknown,
        }
    }

    pub fn with_plate(mut self, plate: impl Into<String>) -> Self {
        self.plate = Some(plate.into());
        self
    }

    pub fn with_occupancy(mut self, occupancy: Occupancy) -> Self {
        self.occupancy = occupancy;
        self
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.device_id.trim().is_empty() {
            return Err(SchemaError::MissingField("device_id"));
        }
        self.position.validate()
    }
}
