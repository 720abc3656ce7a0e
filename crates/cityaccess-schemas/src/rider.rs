use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::geo::GeoPoint;
use crate::money::PriceIncrease;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Gender {
    Male = 0,
    Female = 1,
    #[default]
    Unknown = 2,
}

impl TryFrom<u8> for Gender {
    type Error = SchemaError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Male),
            1 => Ok(Self::Female),
            2 => Ok(Self::Unknown),
            other => Err(SchemaError::UnknownGenderCode(other)),
        }
    }
}

impl From<Gender> for u8 {
    fn from(g: Gender) -> u8 {
        g as u8
    }
}

/// Who is asking for the taxi.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderIdentity {
    /// Platform user id. Falls back to the mobile number when blank.
    #[serde(default)]
    pub user_id: String,
    /// Form of address, e.g. "Ms. Zhang".
    pub name: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    /// Mobile number the driver calls back. Required.
    pub mobile: String,
    /// Rider's handset id, when the platform knows it.
    pub device_id: Option<String>,
}

impl RiderIdentity {
    pub fn new(mobile: impl Into<String>) -> Self {
        Self {
            mobile: mobile.into(),
            ..Self::default()
        }
    }

    pub fn effective_user_id(&self) -> &str {
        if self.user_id.trim().is_empty() {
            &self.mobile
        } else {
            &self.user_id
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let m = self.mobile.trim();
        if m.is_empty() {
            return Err(SchemaError::MissingField("mobile"));
        }
        let digits = m.strip_prefix('+').unwrap_or(m);
        let plausible = (5..=20).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit() || c == '-')
            && digits.chars().any(|c| c.is_ascii_digit());
        if !plausible {
            return Err(SchemaError::InvalidMobile(self.mobile.clone()));
        }
        if let Some(dev) = &self.device_id {
            if dev.trim().is_empty() {
                return Err(SchemaError::MissingField("device_id"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub location: Option<GeoPoint>,
    /// Place name or map-picked label.
    pub description: Option<String>,
}

impl Destination {
    /// Normalize the vendor convention where `(0, 0)` means "no destination".
    pub fn from_wire(lat: f64, lng: f64, description: Option<String>) -> Option<Self> {
        let p = GeoPoint { lat, lng };
        let location = (!p.is_wire_zero()).then_some(p);
        let description = description.filter(|d| !d.trim().is_empty());
        if location.is_none() && description.is_none() {
            return None;
        }
        Some(Self {
            location,
            description,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RidePreferences {
    /// Requested car type, free text.
    pub car_type: Option<String>,
    /// Anything else, e.g. "female driver please".
    pub free_text: Option<String>,
}

/// Everything a provider needs to create (or enlarge) a hailing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Pickup position. Required.
    pub location: GeoPoint,
    pub destination: Option<Destination>,
    pub rider: RiderIdentity,
    #[serde(default)]
    pub preferences: RidePreferences,
    /// Ignored by providers that do not support price increases.
    pub price_increase: Option<PriceIncrease>,
}

impl OrderRequest {
    pub fn new(location: GeoPoint, rider: RiderIdentity) -> Self {
        Self {
            location,
            destination: None,
            rider,
            preferences: RidePreferences::default(),
            price_increase: None,
        }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_preferences(mut self, preferences: RidePreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_price_increase(mut self, price: PriceIncrease) -> Self {
        self.price_increase = Some(price);
        self
    }

    /// Check the mandatory fields and any optional field that was supplied.
    pub fn validate(&self) -> Result<(), SchemaError> {
        self.location.validate()?;
        self.rider.validate()?;
        if let Some(loc) = self.destination.as_ref().and_then(|d| d.location) {
            loc.validate()?;
        }
        if let Some(p) = self.price_increase {
            if p.fen() <= 0 {
                return Err(SchemaError::NonPositivePrice { fen: p.fen() });
            }
        }
        Ok(())
    }
}

/// Payload of an "urge driver" reminder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgeMessage {
    /// How the driver should address the rider.
    pub title: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    pub text: Option<String>,
}
