//! Scenario: `cityaccess simulate`
//!
//! Drives create → confirm → urge → outcome against an in-memory provider
//! built from the repo config, and checks the JSON report.

use std::path::PathBuf;

use assert_cmd::Command;
use serde_json::Value;

fn base_config() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../config/base.yaml")
        .to_string_lossy()
        .into_owned()
}

#[allow(deprecated)]
fn simulate(extra: &[&str]) -> Value {
    let base = base_config();
    let mut args = vec!["simulate", "--config", base.as_str()];
    args.extend_from_slice(extra);
    let out = Command::cargo_bin("cityaccess")
        .unwrap()
        .env("RUST_LOG", "warn")
        .args(&args)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

fn step<'a>(report: &'a Value, name: &str) -> &'a Value {
    report["steps"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["step"] == name)
        .unwrap_or_else(|| panic!("missing step {name}"))
}

#[test]
fn no_show_scenario_on_full_featured_provider() {
    let report = simulate(&["--provider", "nanjing"]);

    assert_eq!(report["final_status"], "TAXI_NO_SHOW");
    assert!(report["order_id"].as_str().unwrap().starts_with("nj-"));

    assert_eq!(step(&report, "create_order")["status"], "SUBMITTED");
    assert_eq!(step(&report, "taxis_near_by")["detail"], "1 vehicle(s)");
    assert_eq!(step(&report, "driver_confirmed")["status"], "CONFIRMED_BY_DRIVER");
    assert_eq!(step(&report, "urge_taxi_driver")["ok"], true);

    let after = step(&report, "cancel_after_terminal");
    assert_eq!(after["ok"], false);
    assert_eq!(after["code"], 102);

    assert_eq!(step(&report, "batch_query_order_status")["detail"], "some,none");
}

#[test]
fn limited_provider_refuses_gated_calls_locally() {
    let report = simulate(&["--provider", "suzhou", "--outcome", "completed"]);

    assert_eq!(report["final_status"], "COMPLETED");

    let nearby = step(&report, "taxis_near_by");
    assert_eq!(nearby["ok"], false);
    assert!(nearby.get("code").is_none());

    let urge = step(&report, "urge_taxi_driver");
    assert_eq!(urge["ok"], false);
    assert!(urge["detail"].as_str().unwrap().contains("urge_taxi"));
}

#[test]
fn user_cancel_outcome() {
    let report = simulate(&["--provider", "nanjing", "--outcome", "user-cancel"]);
    assert_eq!(report["final_status"], "CANCELLED_BY_USER");
    assert_eq!(step(&report, "cancel_order_by_user")["detail"], "cancelled by rider");
}

#[test]
fn unlisted_price_increase_is_refused_before_creation() {
    let report = simulate(&["--provider", "nanjing", "--price-increase", "7"]);
    let create = step(&report, "create_order");
    assert_eq!(create["ok"], false);
    assert!(report["order_id"].is_null());
    assert_eq!(report["steps"].as_array().unwrap().len(), 1);
}

#[test]
#[allow(deprecated)]
fn unknown_provider_fails() {
    Command::cargo_bin("cityaccess")
        .unwrap()
        .args(["simulate", "--config", &base_config(), "--provider", "beijing"])
        .assert()
        .failure();
}
