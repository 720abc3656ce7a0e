//! `cityaccess providers`: one line per configured provider.

use anyhow::Result;
use cityaccess_config::ProviderConfig;

use super::load_platform_config;

pub fn run(config_paths: &[String], strict: bool) -> Result<()> {
    let (loaded, cfg) = load_platform_config(config_paths, strict)?;
    println!("config_hash={}", loaded.config_hash);
    println!("providers={}", cfg.providers.len());
    for (name, p) in &cfg.providers {
        println!("{}", describe(name, p));
    }
    Ok(())
}

fn describe(name: &str, p: &ProviderConfig) -> String {
    let interfaces: Vec<&str> = p.interfaces.iter().map(|i| i.as_str()).collect();
    let levels: Vec<String> = p
        .capability
        .fixed_price_increase_levels()
        .iter()
        .map(|l| format!("{:.2}", l.yuan()))
        .collect();
    let mode = serde_json::to_value(p.capability.price_increase_mode())
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();

    format!(
        "provider={} interfaces={} price_increase_mode={} fixed_levels=[{}] enlarge_search={} urge_taxi={} nearby={}",
        name,
        interfaces.join(","),
        mode,
        levels.join(","),
        p.capability.enlarge_search_enabled,
        p.capability.urge_taxi_enabled,
        p.tracking.nearby_enabled,
    )
}
