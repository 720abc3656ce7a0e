use chrono::{DateTime, Utc};
use cityaccess_contract::{LifecycleEvent, OrderLifecycle};
use cityaccess_schemas::{CapabilityDescriptor, OrderRequest, PriceIncrease, UrgeMessage};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_RADIUS_M: f64 = 3_000.0;
pub const MAX_RADIUS_M: f64 = 10_000.0;
pub const MAX_ENLARGE_FACTOR: f64 = 3.0;
pub const DEFAULT_ORDER_ID_PREFIX: &str = "ca";

/// Static configuration of one in-memory provider instance.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryProviderSettings {
    pub capability: CapabilityDescriptor,
    pub nearby_enabled: bool,
    /// Per-device position lookup. Some dispatch backends only answer
    /// area queries; without it the per-device calls fail with
    /// `FunctionNotSupported`.
    pub point_tracking_enabled: bool,
    /// Used when a nearby query passes a zero radius hint.
    pub default_radius_m: f64,
    /// Upper bound for any radius, hinted or enlarged.
    pub max_radius_m: f64,
    /// `enlarge_search` clamps its factor into `[1, max_enlarge_factor]`.
    pub max_enlarge_factor: f64,
    pub order_id_prefix: String,
}

impl Default for MemoryProviderSettings {
    fn default() -> Self {
        Self {
            capability: CapabilityDescriptor::default(),
            nearby_enabled: false,
            point_tracking_enabled: true,
            default_radius_m: DEFAULT_RADIUS_M,
            max_radius_m: MAX_RADIUS_M,
            max_enlarge_factor: MAX_ENLARGE_FACTOR,
            order_id_prefix: DEFAULT_ORDER_ID_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("default_radius_m must be finite and > 0, got {0}")]
    DefaultRadius(f64),
    #[error("max_radius_m ({max}) must be finite and >= default_radius_m ({default})")]
    MaxRadius { default: f64, max: f64 },
    #[error("max_enlarge_factor must be finite and >= 1, got {0}")]
    EnlargeFactor(f64),
    #[error("order_id_prefix must be non-empty ASCII alphanumeric, got {0:?}")]
    OrderIdPrefix(String),
}

impl MemoryProviderSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.default_radius_m.is_finite() || self.default_radius_m <= 0.0 {
            return Err(SettingsError::DefaultRadius(self.default_radius_m));
        }
        if !self.max_radius_m.is_finite() || self.max_radius_m < self.default_radius_m {
            return Err(SettingsError::MaxRadius {
                default: self.default_radius_m,
                max: self.max_radius_m,
            });
        }
        if !self.max_enlarge_factor.is_finite() || self.max_enlarge_factor < 1.0 {
            return Err(SettingsError::EnlargeFactor(self.max_enlarge_factor));
        }
        let p = &self.order_id_prefix;
        if p.is_empty() || !p.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SettingsError::OrderIdPrefix(p.clone()));
        }
        Ok(())
    }

    /// Radius actually searched for a hint: `0` means default, everything is
    /// capped at `max_radius_m`.
    pub fn effective_radius(&self, radius_hint_m: f64) -> f64 {
        if radius_hint_m == 0.0 {
            self.default_radius_m
        } else {
            radius_hint_m.min(self.max_radius_m)
        }
    }
}

/// Simulated backend failure mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendFault {
    Network,
    Database,
}

/// Asynchronous events raised by the dispatch side (drivers, matching).
///
/// Rider-originated transitions (cancel, no-show) only enter through the
/// `OrderService` calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchEvent {
    DriverConfirmed { vehicle_id: Option<String> },
    NoTaxiFound,
    NoDriverConfirm,
    DriverCancelled { reason: String },
    TripCompleted,
}

impl DispatchEvent {
    pub(crate) fn to_lifecycle(&self) -> LifecycleEvent {
        match self {
            Self::DriverConfirmed { .. } => LifecycleEvent::DriverConfirmed,
            Self::NoTaxiFound => LifecycleEvent::NoTaxiFound,
            Self::NoDriverConfirm => LifecycleEvent::NoDriverConfirm,
            Self::DriverCancelled { reason } => LifecycleEvent::DriverCancelled {
                reason: reason.clone(),
            },
            Self::TripCompleted => LifecycleEvent::TripCompleted,
        }
    }
}

/// Everything the provider remembers about one order.
#[derive(Clone, Debug)]
pub struct OrderRecord {
    pub lifecycle: OrderLifecycle,
    pub request: OrderRequest,
    /// Rider device bound at creation, if the request carried one.
    pub rider_device_id: Option<String>,
    /// Assigned on driver confirmation.
    pub vehicle_id: Option<String>,
    pub search_radius_m: f64,
    /// The increase the provider actually accepted.
    pub accepted_price_increase: Option<PriceIncrease>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One delivered urge, as the driver would receive it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UrgeNotification {
    pub order_id: String,
    pub rider_device_id: String,
    pub vehicle_id: Option<String>,
    pub message: UrgeMessage,
    pub sent_at: DateTime<Utc>,
}
