//! Provider gateway: the platform-side wrapper around one provider.
//!
//! # Invariants
//!
//! **Capability first.** The capability descriptor (and the nearby-tracking
//! flag) are read exactly once, when the gateway is built, and cached for the
//! provider session. Every gated call is checked against the cache before it
//! reaches the provider:
//!
//! 1. `enlarge_search`    → `enlarge_search_enabled`
//! 2. `urge_taxi_driver`  → `urge_taxi_enabled`
//! 3. nearby tracking     → `track_nearby_taxis_enabled()`
//! 4. price increase      → `PriceIncreasePolicy` (dropped when `Forbidden`,
//!    refused when not one of the advertised fixed levels)
//!
//! A refused call returns [`PlatformError::CapabilityDisabled`] and the
//! provider is never invoked. The provider's own `UnsupportedFeature` signal
//! remains as the second line; the gateway does not collapse the two.
//!
//! **Interface presence.** A provider may expose only one of the two
//! services. Calling the missing one yields
//! [`PlatformError::InterfaceNotEnabled`].
//!
//! **No local recovery.** Provider errors are surfaced unchanged inside
//! [`PlatformError::Order`] / [`PlatformError::Track`].

use std::borrow::Cow;
use std::sync::Arc;

use cityaccess_schemas::{
    CapabilityDescriptor, GeoPoint, Order, OrderRequest, PriceIncrease, PriceIncreasePolicy,
    UrgeMessage, VehicleInfo,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{Feature, OrderServiceError, TrackServiceError};
use crate::order_service::OrderService;
use crate::track_service::TrackService;

// ---------------------------------------------------------------------------
// ServiceInterface
// ---------------------------------------------------------------------------

/// The two independently implementable provider contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceInterface {
    Order,
    Track,
}

impl ServiceInterface {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Track => "track",
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("PLATFORM_REFUSED: unknown provider {0}")]
    UnknownProvider(String),

    #[error("PLATFORM_REFUSED: provider {provider} does not expose the {} interface", .interface.as_str())]
    InterfaceNotEnabled {
        provider: String,
        interface: ServiceInterface,
    },

    #[error("PLATFORM_REFUSED: provider {provider} has {} disabled", .feature.as_str())]
    CapabilityDisabled { provider: String, feature: Feature },

    #[error("PLATFORM_REFUSED: provider {provider} does not offer a price increase of {offered}")]
    PriceIncreaseNotOffered {
        provider: String,
        offered: PriceIncrease,
    },

    #[error("provider {provider}: {source}")]
    Order {
        provider: String,
        #[source]
        source: OrderServiceError,
    },

    #[error("provider {provider}: {source}")]
    Track {
        provider: String,
        #[source]
        source: TrackServiceError,
    },
}

impl PlatformError {
    /// The numeric provider error code, if the failure came from a provider.
    pub fn provider_code(&self) -> Option<u32> {
        match self {
            Self::Order { source, .. } => source.code(),
            Self::Track { source, .. } => source.code(),
            _ => None,
        }
    }

    /// Refused locally, before any provider call.
    pub fn is_refusal(&self) -> bool {
        !matches!(self, Self::Order { .. } | Self::Track { .. })
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Order { source, .. } => source.is_retryable(),
            Self::Track { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderGateway
// ---------------------------------------------------------------------------

/// Platform-side handle for one provider session.
pub struct ProviderGateway {
    name: String,
    orders: Option<Arc<dyn OrderService>>,
    tracking: Option<Arc<dyn TrackService>>,
    /// Cached at construction. `None` iff no order service.
    capability: Option<CapabilityDescriptor>,
    nearby_enabled: bool,
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway")
            .field("name", &self.name)
            .field("interfaces", &self.interfaces())
            .field("capability", &self.capability)
            .field("nearby_enabled", &self.nearby_enabled)
            .finish()
    }
}

impl ProviderGateway {
    /// Wrap already-instantiated provider services and negotiate capabilities.
    pub fn new(
        name: impl Into<String>,
        orders: Option<Arc<dyn OrderService>>,
        tracking: Option<Arc<dyn TrackService>>,
    ) -> Self {
        let name = name.into();
        let capability = orders.as_ref().map(|o| o.capability());
        let nearby_enabled = tracking
            .as_ref()
            .is_some_and(|t| t.track_nearby_taxis_enabled());
        debug!(provider = %name, ?capability, nearby_enabled, "provider capabilities negotiated");
        Self {
            name,
            orders,
            tracking,
            capability,
            nearby_enabled,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cached descriptor, `None` when the provider has no order service.
    pub fn capability(&self) -> Option<&CapabilityDescriptor> {
        self.capability.as_ref()
    }

    pub fn nearby_enabled(&self) -> bool {
        self.nearby_enabled
    }

    pub fn interfaces(&self) -> Vec<ServiceInterface> {
        let mut v = Vec::new();
        if self.orders.is_some() {
            v.push(ServiceInterface::Order);
        }
        if self.tracking.is_some() {
            v.push(ServiceInterface::Track);
        }
        v
    }

    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::NearbyTracking => self.nearby_enabled,
            Feature::EnlargeSearch => self
                .capability
                .as_ref()
                .is_some_and(|c| c.enlarge_search_enabled),
            Feature::UrgeTaxi => self.capability.as_ref().is_some_and(|c| c.urge_taxi_enabled),
            Feature::PriceIncrease => self
                .capability
                .as_ref()
                .is_some_and(|c| c.price_increase != PriceIncreasePolicy::Forbidden),
        }
    }

    fn order_service(&self) -> Result<&Arc<dyn OrderService>, PlatformError> {
        self.orders
            .as_ref()
            .ok_or_else(|| PlatformError::InterfaceNotEnabled {
                provider: self.name.clone(),
                interface: ServiceInterface::Order,
            })
    }

    fn track_service(&self) -> Result<&Arc<dyn TrackService>, PlatformError> {
        self.tracking
            .as_ref()
            .ok_or_else(|| PlatformError::InterfaceNotEnabled {
                provider: self.name.clone(),
                interface: ServiceInterface::Track,
            })
    }

    fn require(&self, feature: Feature) -> Result<(), PlatformError> {
        if self.supports(feature) {
            return Ok(());
        }
        warn!(provider = %self.name, feature = feature.as_str(), "gated call refused by capability");
        Err(PlatformError::CapabilityDisabled {
            provider: self.name.clone(),
            feature,
        })
    }

    fn order_err(&self, source: impl Into<OrderServiceError>) -> PlatformError {
        PlatformError::Order {
            provider: self.name.clone(),
            source: source.into(),
        }
    }

    fn track_err(&self, source: TrackServiceError) -> PlatformError {
        PlatformError::Track {
            provider: self.name.clone(),
            source,
        }
    }

    /// Fit a request's price increase to the negotiated policy.
    ///
    /// `Forbidden` drops the increase; `FixedLevels` refuses amounts that were
    /// not advertised; `Unrestricted` keeps it.
    pub fn normalize_request<'a>(
        &self,
        request: &'a OrderRequest,
    ) -> Result<Cow<'a, OrderRequest>, PlatformError> {
        let Some(offered) = request.price_increase else {
            return Ok(Cow::Borrowed(request));
        };
        let policy = self
            .capability
            .as_ref()
            .map(|c| &c.price_increase)
            .unwrap_or(&PriceIncreasePolicy::Forbidden);

        match policy {
            PriceIncreasePolicy::Forbidden => {
                debug!(provider = %self.name, %offered, "price increase dropped: provider forbids it");
                let mut owned = request.clone();
                owned.price_increase = None;
                Ok(Cow::Owned(owned))
            }
            p if p.admits(offered) => Ok(Cow::Borrowed(request)),
            _ => Err(PlatformError::PriceIncreaseNotOffered {
                provider: self.name.clone(),
                offered,
            }),
        }
    }

    // -- Order service -------------------------------------------------------

    pub fn create_order(&self, request: &OrderRequest) -> Result<Order, PlatformError> {
        let svc = self.order_service()?;
        let request = self.normalize_request(request)?;
        svc.create_order(&request).map_err(|e| self.order_err(e))
    }

    pub fn query_order_status(&self, order_id: &str) -> Result<Order, PlatformError> {
        self.order_service()?
            .query_order_status(order_id)
            .map_err(|e| self.order_err(e))
    }

    pub fn enlarge_search(
        &self,
        request: &OrderRequest,
        enlarge_factor: f64,
    ) -> Result<Order, PlatformError> {
        let svc = self.order_service()?;
        self.require(Feature::EnlargeSearch)?;
        let request = self.normalize_request(request)?;
        svc.enlarge_search(&request, enlarge_factor)
            .map_err(|e| self.order_err(e))
    }

    pub fn urge_taxi_driver(
        &self,
        order_id: &str,
        device_id: &str,
        message: &UrgeMessage,
    ) -> Result<(), PlatformError> {
        let svc = self.order_service()?;
        self.require(Feature::UrgeTaxi)?;
        svc.urge_taxi_driver(order_id, device_id, message)
            .map_err(|e| self.order_err(e))
    }

    pub fn cancel_order_by_user(
        &self,
        order_id: &str,
        device_id: &str,
    ) -> Result<Order, PlatformError> {
        self.order_service()?
            .cancel_order_by_user(order_id, device_id)
            .map_err(|e| self.order_err(e))
    }

    pub fn report_driver_no_show(
        &self,
        order_id: &str,
        device_id: &str,
    ) -> Result<Order, PlatformError> {
        self.order_service()?
            .report_driver_no_show(order_id, device_id)
            .map_err(|e| self.order_err(e))
    }

    pub fn batch_query_order_status(
        &self,
        order_ids: &[String],
    ) -> Result<Vec<Option<Order>>, PlatformError> {
        let out = self.order_service()?.batch_query_order_status(order_ids);
        if out.len() != order_ids.len() {
            // A provider that breaks alignment cannot be trusted per entry.
            warn!(
                provider = %self.name,
                expected = order_ids.len(),
                got = out.len(),
                "batch query result misaligned; discarding"
            );
            return Ok(vec![None; order_ids.len()]);
        }
        Ok(out)
    }

    // -- Tracking service ----------------------------------------------------

    pub fn taxis_near_by(
        &self,
        location: GeoPoint,
        radius_hint_m: f64,
    ) -> Result<Vec<VehicleInfo>, PlatformError> {
        let svc = self.track_service()?;
        self.require(Feature::NearbyTracking)?;
        svc.taxis_near_by(location, radius_hint_m)
            .map_err(|e| self.track_err(e))
    }

    pub fn track_taxi_with_near_by(
        &self,
        device_id: &str,
        radius_hint_m: f64,
    ) -> Result<Vec<VehicleInfo>, PlatformError> {
        let svc = self.track_service()?;
        self.require(Feature::NearbyTracking)?;
        svc.track_taxi_with_near_by(device_id, radius_hint_m)
            .map_err(|e| self.track_err(e))
    }

    pub fn track_taxi(&self, device_id: &str) -> Result<VehicleInfo, PlatformError> {
        self.track_service()?
            .track_taxi(device_id)
            .map_err(|e| self.track_err(e))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
