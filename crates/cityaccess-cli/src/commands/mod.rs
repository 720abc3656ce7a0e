//! Command handlers for the `cityaccess` CLI.
//!
//! Shared loading and wiring lives here; command-specific logic lives in the
//! submodules.

pub mod providers;
pub mod simulate;

use std::sync::Arc;

use anyhow::{Context, Result};
use cityaccess_config::{
    load_layered_yaml, report_unused_keys, LoadedConfig, PlatformConfig, ProviderConfig,
    UnusedKeyPolicy,
};
use cityaccess_contract::{OrderService, ProviderGateway, ServiceInterface, TrackService};
use cityaccess_provider_memory::MemoryProvider;
use tracing::warn;

/// Load, hash and validate the layered config.
///
/// Unused keys are logged; with `strict` they fail the load.
pub fn load_platform_config(
    config_paths: &[String],
    strict: bool,
) -> Result<(LoadedConfig, PlatformConfig)> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    for ptr in &report.unused_leaf_pointers {
        warn!(pointer = %ptr, "config key is not read by any provider field");
    }

    let cfg = PlatformConfig::from_loaded(&loaded)?;
    Ok((loaded, cfg))
}

/// An in-memory provider standing in for `name`, exposed through a gateway
/// with exactly the configured interfaces.
pub fn memory_gateway(
    name: &str,
    cfg: &ProviderConfig,
) -> Result<(Arc<MemoryProvider>, ProviderGateway)> {
    let provider = Arc::new(
        MemoryProvider::new(cfg.memory_settings(name))
            .with_context(|| format!("provider {name}: invalid settings"))?,
    );
    let orders = cfg
        .has_interface(ServiceInterface::Order)
        .then(|| provider.clone() as Arc<dyn OrderService>);
    let tracking = cfg
        .has_interface(ServiceInterface::Track)
        .then(|| provider.clone() as Arc<dyn TrackService>);
    let gateway = ProviderGateway::new(name, orders, tracking);
    Ok((provider, gateway))
}
