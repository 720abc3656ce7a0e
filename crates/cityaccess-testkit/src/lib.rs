//! Shared fixtures for cross-crate scenario tests.
//!
//! Everything here builds real values through the public APIs; nothing is
//! mocked. Fallible builders return `anyhow::Result` so scenarios can use `?`.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use cityaccess_config::{load_layered_yaml_from_strings, PlatformConfig};
use cityaccess_contract::{
    OrderService, ProviderGateway, ProviderRegistry, ServiceInterface, TrackService,
};
use cityaccess_provider_memory::{DispatchEvent, MemoryProvider, MemoryProviderSettings};
use cityaccess_schemas::{
    CapabilityDescriptor, FixedLevels, GeoPoint, Occupancy, Order, OrderRequest, PriceIncrease,
    PriceIncreasePolicy, RiderIdentity, VehicleInfo,
};

/// Xinjiekou, Nanjing.
pub const PICKUP_LAT: f64 = 32.0415;
pub const PICKUP_LNG: f64 = 118.7781;

/// Roughly meters per degree of latitude.
const METERS_PER_DEG_LAT: f64 = 111_195.0;

pub fn pickup() -> GeoPoint {
    GeoPoint {
        lat: PICKUP_LAT,
        lng: PICKUP_LNG,
    }
}

/// A point `meters` due north of the pickup.
pub fn north_of_pickup(meters: f64) -> GeoPoint {
    GeoPoint {
        lat: PICKUP_LAT + meters / METERS_PER_DEG_LAT,
        lng: PICKUP_LNG,
    }
}

pub fn rider(device_id: &str) -> RiderIdentity {
    RiderIdentity {
        user_id: format!("user-{device_id}"),
        name: Some("Ms. Zhang".to_string()),
        device_id: Some(device_id.to_string()),
        ..RiderIdentity::new("13800138000")
    }
}

pub fn order_request(device_id: &str) -> OrderRequest {
    OrderRequest::new(pickup(), rider(device_id))
}

pub fn levels(yuan: &[f64]) -> Result<FixedLevels> {
    let parsed = yuan
        .iter()
        .map(|y| PriceIncrease::from_yuan(*y))
        .collect::<Result<Vec<_>, _>>()
        .context("price level")?;
    Ok(FixedLevels::new(parsed)?)
}

/// Everything switched on; fixed surcharge levels of 5 and 10 yuan.
pub fn full_featured_settings() -> Result<MemoryProviderSettings> {
    Ok(MemoryProviderSettings {
        capability: CapabilityDescriptor {
            price_increase: PriceIncreasePolicy::FixedLevels(levels(&[5.0, 10.0])?),
            enlarge_search_enabled: true,
            urge_taxi_enabled: true,
        },
        nearby_enabled: true,
        ..MemoryProviderSettings::default()
    })
}

/// Every optional feature off.
pub fn basic_settings() -> MemoryProviderSettings {
    MemoryProviderSettings::default()
}

/// A provider plus a gateway exposing the given interfaces.
pub fn memory_gateway(
    name: &str,
    settings: MemoryProviderSettings,
    interfaces: &[ServiceInterface],
) -> Result<(Arc<MemoryProvider>, ProviderGateway)> {
    let provider = Arc::new(MemoryProvider::new(settings)?);
    let orders = interfaces
        .contains(&ServiceInterface::Order)
        .then(|| provider.clone() as Arc<dyn OrderService>);
    let tracking = interfaces
        .contains(&ServiceInterface::Track)
        .then(|| provider.clone() as Arc<dyn TrackService>);
    Ok((provider, ProviderGateway::new(name, orders, tracking)))
}

/// Build one in-memory provider per configured entry and register them all.
pub fn registry_from_yaml(
    yaml_docs: &[&str],
) -> Result<(ProviderRegistry, BTreeMap<String, Arc<MemoryProvider>>)> {
    let loaded = load_layered_yaml_from_strings(yaml_docs)?;
    let cfg = PlatformConfig::from_loaded(&loaded)?;

    let mut registry = ProviderRegistry::new();
    let mut providers = BTreeMap::new();
    for (name, p) in &cfg.providers {
        let interfaces: Vec<ServiceInterface> = p.interfaces.iter().copied().collect();
        let (provider, gateway) = memory_gateway(name, p.memory_settings(name), &interfaces)?;
        registry.register(gateway);
        providers.insert(name.clone(), provider);
    }
    Ok((registry, providers))
}

/// Put an empty taxi `meters` north of the pickup.
pub fn place_taxi(provider: &MemoryProvider, device_id: &str, meters: f64) -> Result<()> {
    provider.upsert_vehicle(
        VehicleInfo::new(device_id, north_of_pickup(meters))
            .with_plate(format!("SU-{device_id}"))
            .with_occupancy(Occupancy::Empty),
    )?;
    Ok(())
}

/// Create an order for `rider_device` and have `vehicle_id` confirm it.
pub fn confirmed_order(
    provider: &MemoryProvider,
    rider_device: &str,
    vehicle_id: &str,
) -> Result<Order> {
    let order = provider.create_order(&order_request(rider_device))?;
    let confirmed = provider.apply_dispatch_event(
        &order.order_id,
        &DispatchEvent::DriverConfirmed {
            vehicle_id: Some(vehicle_id.to_string()),
        },
        None,
    )?;
    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn north_offset_is_roughly_metric() {
        let d = pickup().distance_m(&north_of_pickup(1_000.0));
        assert!((d - 1_000.0).abs() < 5.0, "{d}");
    }

    #[test]
    fn fixtures_are_valid() {
        assert!(order_request("dev").validate().is_ok());
        assert!(full_featured_settings().unwrap().validate().is_ok());
        assert!(levels(&[]).is_err());
    }
}
