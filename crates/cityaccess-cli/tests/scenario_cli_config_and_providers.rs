//! Scenario: `cityaccess config-hash` and `cityaccess providers`
//!
//! GREEN when:
//! - config-hash prints a stable 64-hex hash followed by canonical JSON;
//! - providers lists every configured provider with its capabilities;
//! - a city layer adds providers on top of the base file;
//! - invalid or secret-bearing config fails with the documented marker.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn repo_config(rel: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join(rel)
        .to_string_lossy()
        .into_owned()
}

#[allow(deprecated)]
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("cityaccess").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn config_hash_is_stable_across_runs() {
    let base = repo_config("base.yaml");
    let first = cli().args(["config-hash", &base]).output().unwrap();
    let second = cli().args(["config-hash", &base]).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let out = String::from_utf8(first.stdout).unwrap();
    let hash_line = out.lines().next().unwrap();
    let hash = hash_line.strip_prefix("config_hash=").unwrap();
    assert_eq!(hash.len(), 64);
    assert!(out.contains(r#""order_id_prefix":"nj""#));
}

#[test]
fn providers_lists_capabilities() {
    cli()
        .args(["providers", "--config", &repo_config("base.yaml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("providers=2"))
        .stdout(predicate::str::contains(
            "provider=nanjing interfaces=order,track price_increase_mode=fixed_levels \
             fixed_levels=[5.00,10.00,20.00] enlarge_search=true urge_taxi=true nearby=true",
        ))
        .stdout(predicate::str::contains(
            "provider=suzhou interfaces=order price_increase_mode=forbidden",
        ));
}

#[test]
fn city_layer_adds_provider() {
    cli()
        .args([
            "providers",
            "--config",
            &repo_config("base.yaml"),
            "--config",
            &repo_config("cities/shanghai.yaml"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("providers=3"))
        .stdout(predicate::str::contains(
            "provider=shanghai interfaces=order,track price_increase_mode=unrestricted",
        ));
}

#[test]
fn strict_mode_rejects_unknown_keys() {
    let dir = tempfile::tempdir().unwrap();
    let overlay = dir.path().join("typo.yaml");
    std::fs::write(
        &overlay,
        "providers:\n  nanjing:\n    trackng:\n      nearby_enabled: false\n",
    )
    .unwrap();
    let overlay = overlay.to_string_lossy().into_owned();
    let base = repo_config("base.yaml");

    cli()
        .args(["providers", "--config", &base, "--config", &overlay])
        .assert()
        .success();

    cli()
        .args(["providers", "--strict", "--config", &base, "--config", &overlay])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn invalid_capability_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.yaml");
    std::fs::write(
        &bad,
        "providers:\n  x:\n    interfaces: [order]\n    capability:\n      price_increase_mode: forbidden\n      fixed_price_increases: [5.0]\n",
    )
    .unwrap();

    cli()
        .args(["providers", "--config", &bad.to_string_lossy()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_INVALID"));
}

#[test]
fn secret_literal_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("secret.yaml");
    std::fs::write(
        &bad,
        "providers:\n  x:\n    interfaces: [order]\n    api_key: \"sk-live-0000111122223333\"\n",
    )
    .unwrap();

    cli()
        .args(["config-hash", &bad.to_string_lossy()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"))
        .stderr(predicate::str::contains("sk-live-0000111122223333").not());
}
