//! Provider registry: routes platform calls to the provider that owns an order.
//!
//! Order ids are unique only within a provider, so the platform always
//! addresses an order by [`ProviderOrderRef`]. The registry never rewrites or
//! guesses a provider: an unregistered provider name is a refusal, not a
//! fallback.
//!
//! # Thread-safety
//! Lookups take `&self`; registration takes `&mut self`. Build the registry at
//! startup and share it behind an `Arc` afterwards.

use std::collections::BTreeMap;
use std::fmt;

use cityaccess_schemas::{Order, OrderRequest, UrgeMessage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gateway::{PlatformError, ProviderGateway};

/// `(provider, order_id)`: the only globally unique handle for an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderOrderRef {
    pub provider: String,
    pub order_id: String,
}

impl ProviderOrderRef {
    pub fn new(provider: impl Into<String>, order_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            order_id: order_id.into(),
        }
    }
}

impl fmt::Display for ProviderOrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.order_id)
    }
}

#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderGateway>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gateway under its own name. Returns the gateway it
    /// replaced, if any.
    pub fn register(&mut self, gateway: ProviderGateway) -> Option<ProviderGateway> {
        let name = gateway.name().to_string();
        info!(provider = %name, interfaces = ?gateway.interfaces(), "provider registered");
        self.providers.insert(name, gateway)
    }

    pub fn get(&self, provider: &str) -> Result<&ProviderGateway, PlatformError> {
        self.providers
            .get(provider)
            .ok_or_else(|| PlatformError::UnknownProvider(provider.to_string()))
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn gateways(&self) -> impl Iterator<Item = &ProviderGateway> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn create_order(
        &self,
        provider: &str,
        request: &OrderRequest,
    ) -> Result<(ProviderOrderRef, Order), PlatformError> {
        let order = self.get(provider)?.create_order(request)?;
        Ok((ProviderOrderRef::new(provider, order.order_id.clone()), order))
    }

    pub fn enlarge_search(
        &self,
        provider: &str,
        request: &OrderRequest,
        enlarge_factor: f64,
    ) -> Result<(ProviderOrderRef, Order), PlatformError> {
        let order = self
            .get(provider)?
            .enlarge_search(request, enlarge_factor)?;
        Ok((ProviderOrderRef::new(provider, order.order_id.clone()), order))
    }

    pub fn query_order_status(&self, order: &ProviderOrderRef) -> Result<Order, PlatformError> {
        self.get(&order.provider)?
            .query_order_status(&order.order_id)
    }

    pub fn cancel_order_by_user(
        &self,
        order: &ProviderOrderRef,
        device_id: &str,
    ) -> Result<Order, PlatformError> {
        self.get(&order.provider)?
            .cancel_order_by_user(&order.order_id, device_id)
    }

    pub fn report_driver_no_show(
        &self,
        order: &ProviderOrderRef,
        device_id: &str,
    ) -> Result<Order, PlatformError> {
        self.get(&order.provider)?
            .report_driver_no_show(&order.order_id, device_id)
    }

    pub fn urge_taxi_driver(
        &self,
        order: &ProviderOrderRef,
        device_id: &str,
        message: &UrgeMessage,
    ) -> Result<(), PlatformError> {
        self.get(&order.provider)?
            .urge_taxi_driver(&order.order_id, device_id, message)
    }

    /// Mixed-provider batch lookup, positionally aligned with `orders`.
    ///
    /// Entries are grouped per provider so each provider sees a single batch
    /// call. An entry is `None` when its provider is unknown, the provider
    /// has no order interface, or the provider reported it absent.
    pub fn batch_query_order_status(&self, orders: &[ProviderOrderRef]) -> Vec<Option<Order>> {
        let mut out: Vec<Option<Order>> = vec![None; orders.len()];

        // provider -> (positions, ids)
        let mut groups: BTreeMap<&str, (Vec<usize>, Vec<String>)> = BTreeMap::new();
        for (pos, r) in orders.iter().enumerate() {
            let g = groups.entry(r.provider.as_str()).or_default();
            g.0.push(pos);
            g.1.push(r.order_id.clone());
        }

        for (provider, (positions, ids)) in groups {
            let results = match self
                .get(provider)
                .and_then(|gw| gw.batch_query_order_status(&ids))
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(provider, error = %e, entries = ids.len(), "batch group skipped");
                    continue;
                }
            };
            for (pos, result) in positions.into_iter().zip(results) {
                out[pos] = result;
            }
        }
        out
    }
}
