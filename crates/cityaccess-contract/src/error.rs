//! Error taxonomy shared by every provider.
//!
//! Two disjoint numbered families ([`OrderError`] 100–104, [`TrackError`]
//! 200–203) plus two cross-cutting signals: [`UnsupportedFeature`] for calls
//! the capability descriptor marked disabled, and [`InvalidArgument`] for
//! malformed tracking input. Every value carries its code (where one is
//! defined) and an optional description so callers can introspect failures
//! without string matching.
//!
//! Classification:
//! - caller bugs ([`OrderErrorKind::InvalidOrderOp`], [`InvalidArgument`],
//!   [`UnsupportedFeature`]) must be fixed upstream, never retried;
//! - backend failures (`NetworkError`, `DbOperationError`) are retry
//!   candidates for the platform. The retry policy itself is not part of the
//!   contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn describe(description: &Option<String>) -> String {
    match description {
        Some(d) if !d.is_empty() => format!(": {d}"),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Order errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderErrorKind {
    /// Description should name the device id.
    DeviceNotFound,
    /// Description should name the order id.
    OrderNotFound,
    /// Description should name the order state and the rejected operation.
    InvalidOrderOp,
    DbOperationError,
    NetworkError,
}

impl OrderErrorKind {
    pub fn code(self) -> u32 {
        match self {
            Self::DeviceNotFound => 100,
            Self::OrderNotFound => 101,
            Self::InvalidOrderOp => 102,
            Self::DbOperationError => 103,
            Self::NetworkError => 104,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        [
            Self::DeviceNotFound,
            Self::OrderNotFound,
            Self::InvalidOrderOp,
            Self::DbOperationError,
            Self::NetworkError,
        ]
        .into_iter()
        .find(|k| k.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order error {} ({:?}){}", .kind.code(), .kind, describe(.description))]
pub struct OrderError {
    pub kind: OrderErrorKind,
    pub description: Option<String>,
}

impl OrderError {
    pub fn new(kind: OrderErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: Some(description.into()),
        }
    }

    pub fn bare(kind: OrderErrorKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    pub fn device_not_found(device_id: &str) -> Self {
        Self::new(
            OrderErrorKind::DeviceNotFound,
            format!("device not found: {device_id}"),
        )
    }

    pub fn order_not_found(order_id: &str) -> Self {
        Self::new(
            OrderErrorKind::OrderNotFound,
            format!("order not found: {order_id}"),
        )
    }

    pub fn invalid_op(description: impl Into<String>) -> Self {
        Self::new(OrderErrorKind::InvalidOrderOp, description)
    }

    pub fn db(description: impl Into<String>) -> Self {
        Self::new(OrderErrorKind::DbOperationError, description)
    }

    pub fn network(description: impl Into<String>) -> Self {
        Self::new(OrderErrorKind::NetworkError, description)
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            OrderErrorKind::DbOperationError | OrderErrorKind::NetworkError
        )
    }

    pub fn is_caller_bug(&self) -> bool {
        self.kind == OrderErrorKind::InvalidOrderOp
    }
}

// ---------------------------------------------------------------------------
// Track errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackErrorKind {
    DeviceNotFound,
    /// The provider's backend lacks this particular lookup.
    FunctionNotSupported,
    DbOperationError,
    NetworkError,
}

impl TrackErrorKind {
    pub fn code(self) -> u32 {
        match self {
            Self::DeviceNotFound => 200,
            Self::FunctionNotSupported => 201,
            Self::DbOperationError => 202,
            Self::NetworkError => 203,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        [
            Self::DeviceNotFound,
            Self::FunctionNotSupported,
            Self::DbOperationError,
            Self::NetworkError,
        ]
        .into_iter()
        .find(|k| k.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("track error {} ({:?}){}", .kind.code(), .kind, describe(.description))]
pub struct TrackError {
    pub kind: TrackErrorKind,
    pub description: Option<String>,
}

impl TrackError {
    pub fn new(kind: TrackErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: Some(description.into()),
        }
    }

    pub fn bare(kind: TrackErrorKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    pub fn device_not_found(device_id: &str) -> Self {
        Self::new(
            TrackErrorKind::DeviceNotFound,
            format!("device not found: {device_id}"),
        )
    }

    pub fn not_supported(function: &str) -> Self {
        Self::new(
            TrackErrorKind::FunctionNotSupported,
            format!("function not supported: {function}"),
        )
    }

    pub fn db(description: impl Into<String>) -> Self {
        Self::new(TrackErrorKind::DbOperationError, description)
    }

    pub fn network(description: impl Into<String>) -> Self {
        Self::new(TrackErrorKind::NetworkError, description)
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            TrackErrorKind::DbOperationError | TrackErrorKind::NetworkError
        )
    }
}

// ---------------------------------------------------------------------------
// Cross-cutting signals
// ---------------------------------------------------------------------------

/// Optional features gated by a capability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    EnlargeSearch,
    UrgeTaxi,
    PriceIncrease,
    NearbyTracking,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnlargeSearch => "enlarge_search",
            Self::UrgeTaxi => "urge_taxi",
            Self::PriceIncrease => "price_increase",
            Self::NearbyTracking => "nearby_tracking",
        }
    }
}

/// Raised when a gated operation is invoked although the provider advertised
/// it as disabled. A development-time aid: well-behaved callers check the
/// capability first and never see it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported feature {}{}", .feature.as_str(), describe(.description))]
pub struct UnsupportedFeature {
    pub feature: Feature,
    pub description: Option<String>,
}

impl UnsupportedFeature {
    pub fn new(feature: Feature) -> Self {
        Self {
            feature,
            description: None,
        }
    }

    pub fn with_description(feature: Feature, description: impl Into<String>) -> Self {
        Self {
            feature,
            description: Some(description.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument `{argument}`: {description}")]
pub struct InvalidArgument {
    pub argument: &'static str,
    pub description: String,
}

impl InvalidArgument {
    pub fn new(argument: &'static str, description: impl Into<String>) -> Self {
        Self {
            argument,
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-service error unions
// ---------------------------------------------------------------------------

/// Failure of a gated order operation (`enlarge_search`, `urge_taxi_driver`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderServiceError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFeature),
}

impl OrderServiceError {
    /// Numeric wire code; `None` for the unnumbered unsupported signal.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Order(e) => Some(e.code()),
            Self::Unsupported(_) => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Order(e) => e.description(),
            Self::Unsupported(e) => e.description.as_deref(),
        }
    }

    pub fn order_kind(&self) -> Option<OrderErrorKind> {
        match self {
            Self::Order(e) => Some(e.kind),
            Self::Unsupported(_) => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Order(e) if e.is_retryable())
    }

    pub fn is_caller_bug(&self) -> bool {
        match self {
            Self::Order(e) => e.is_caller_bug(),
            Self::Unsupported(_) => true,
        }
    }
}

/// Failure of a tracking operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackServiceError {
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFeature),
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
}

impl TrackServiceError {
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Track(e) => Some(e.code()),
            Self::Unsupported(_) | Self::InvalidArgument(_) => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Track(e) => e.description(),
            Self::Unsupported(e) => e.description.as_deref(),
            Self::InvalidArgument(e) => Some(e.description.as_str()),
        }
    }

    pub fn track_kind(&self) -> Option<TrackErrorKind> {
        match self {
            Self::Track(e) => Some(e.kind),
            _ => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Track(e) if e.is_retryable())
    }

    pub fn is_caller_bug(&self) -> bool {
        matches!(self, Self::Unsupported(_) | Self::InvalidArgument(_))
    }
}
