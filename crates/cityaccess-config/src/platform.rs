//! Typed view of the effective config.
//!
//! ```yaml
//! providers:
//!   nanjing:
//!     interfaces: [order, track]
//!     capability:
//!       price_increase_mode: fixed_levels
//!       fixed_price_increases: [5.0, 10.0]
//!       enlarge_search_enabled: true
//!       urge_taxi_enabled: true
//!     tracking:
//!       nearby_enabled: true
//!       point_tracking_enabled: true
//!       default_radius_m: 3000
//!       max_radius_m: 10000
//!     dispatch:
//!       max_enlarge_factor: 3.0
//!       order_id_prefix: nj
//! ```

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Context, Result};
use cityaccess_contract::ServiceInterface;
use cityaccess_provider_memory::types::{
    DEFAULT_ORDER_ID_PREFIX, DEFAULT_RADIUS_M, MAX_ENLARGE_FACTOR, MAX_RADIUS_M,
};
use cityaccess_provider_memory::MemoryProviderSettings;
use cityaccess_schemas::CapabilityDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{escape_pointer_token, LoadedConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub interfaces: BTreeSet<ServiceInterface>,
    #[serde(default)]
    pub capability: CapabilityDescriptor,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub nearby_enabled: bool,
    /// Whether the backend answers per-device position lookups.
    #[serde(default = "enabled")]
    pub point_tracking_enabled: bool,
    #[serde(default = "default_radius_m")]
    pub default_radius_m: f64,
    #[serde(default = "max_radius_m")]
    pub max_radius_m: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            nearby_enabled: false,
            point_tracking_enabled: true,
            default_radius_m: DEFAULT_RADIUS_M,
            max_radius_m: MAX_RADIUS_M,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "max_enlarge_factor")]
    pub max_enlarge_factor: f64,
    /// Defaults to the provider name's ASCII alphanumerics.
    #[serde(default)]
    pub order_id_prefix: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_enlarge_factor: MAX_ENLARGE_FACTOR,
            order_id_prefix: None,
        }
    }
}

fn enabled() -> bool {
    true
}

fn default_radius_m() -> f64 {
    DEFAULT_RADIUS_M
}

fn max_radius_m() -> f64 {
    MAX_RADIUS_M
}

fn max_enlarge_factor() -> f64 {
    MAX_ENLARGE_FACTOR
}

impl PlatformConfig {
    /// Parse and validate the merged config.
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        Self::from_json(&loaded.config_json)
    }

    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: PlatformConfig = serde_json::from_value(config_json.clone())
            .context("CONFIG_INVALID: config does not match the provider schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            bail!("CONFIG_INVALID: no providers configured");
        }
        for (name, p) in &self.providers {
            p.validate(name)
                .with_context(|| format!("CONFIG_INVALID: provider {name}"))?;
        }
        Ok(())
    }

    pub fn provider(&self, name: &str) -> Result<&ProviderConfig> {
        self.providers
            .get(name)
            .with_context(|| format!("provider {name} is not configured"))
    }
}

impl ProviderConfig {
    pub fn has_interface(&self, interface: ServiceInterface) -> bool {
        self.interfaces.contains(&interface)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            bail!("provider name is empty");
        }
        if self.interfaces.is_empty() {
            bail!("at least one interface (order, track) must be enabled");
        }
        if self.tracking.nearby_enabled && !self.has_interface(ServiceInterface::Track) {
            bail!("tracking.nearby_enabled requires the track interface");
        }
        self.memory_settings(name)
            .validate()
            .map_err(anyhow::Error::new)?;
        Ok(())
    }

    /// Settings for an in-memory provider standing in for `name`.
    pub fn memory_settings(&self, name: &str) -> MemoryProviderSettings {
        let order_id_prefix = self.dispatch.order_id_prefix.clone().unwrap_or_else(|| {
            let derived: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
            if derived.is_empty() {
                DEFAULT_ORDER_ID_PREFIX.to_string()
            } else {
                derived
            }
        });
        MemoryProviderSettings {
            capability: self.capability.clone(),
            nearby_enabled: self.tracking.nearby_enabled,
            point_tracking_enabled: self.tracking.point_tracking_enabled,
            default_radius_m: self.tracking.default_radius_m,
            max_radius_m: self.tracking.max_radius_m,
            max_enlarge_factor: self.dispatch.max_enlarge_factor,
            order_id_prefix,
        }
    }
}

const PROVIDER_FIELDS: &[&str] = &[
    "interfaces",
    "capability/price_increase_mode",
    "capability/fixed_price_increases",
    "capability/enlarge_search_enabled",
    "capability/urge_taxi_enabled",
    "tracking/nearby_enabled",
    "tracking/point_tracking_enabled",
    "tracking/default_radius_m",
    "tracking/max_radius_m",
    "dispatch/max_enlarge_factor",
    "dispatch/order_id_prefix",
];

/// Pointers the typed view reads, expanded for every configured provider.
pub(crate) fn consumed_pointers(config_json: &Value) -> Vec<String> {
    let Some(providers) = config_json.get("providers").and_then(Value::as_object) else {
        return Vec::new();
    };
    providers
        .keys()
        .flat_map(|name| {
            let base = format!("/providers/{}", escape_pointer_token(name));
            PROVIDER_FIELDS
                .iter()
                .map(move |f| format!("{base}/{f}"))
        })
        .collect()
}
