//! `cityaccess simulate`: walk one order through its lifecycle against an
//! in-memory provider configured like the real one.
//!
//! Platform calls go through `ProviderGateway`, so capability refusals show
//! up exactly as the platform would see them. Driver-side events are injected
//! directly into the provider.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use cityaccess_contract::{PlatformError, ProviderGateway};
use cityaccess_provider_memory::{DispatchEvent, MemoryProvider};
use cityaccess_schemas::{
    GeoPoint, Occupancy, Order, OrderRequest, PriceIncrease, RiderIdentity, UrgeMessage,
    VehicleInfo,
};

use super::{load_platform_config, memory_gateway};

pub const SIM_RIDER_DEVICE: &str = "SIM-RIDER-1";
pub const SIM_RIDER_MOBILE: &str = "13800138000";
pub const SIM_TAXI: &str = "SIM-TAXI-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Outcome {
    /// Rider reports the confirmed taxi never arrived
    NoShow,
    /// Trip completes normally
    Completed,
    /// Driver cancels after confirming
    DriverCancel,
    /// Rider cancels after confirmation
    UserCancel,
}

pub struct SimulateArgs<'a> {
    pub config_paths: &'a [String],
    pub provider: &'a str,
    pub outcome: Outcome,
    pub lat: f64,
    pub lng: f64,
    pub price_increase: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub provider: String,
    pub config_hash: String,
    pub order_id: Option<String>,
    pub final_status: Option<&'static str>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Serialize)]
pub struct Step {
    pub step: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Step {
    fn order(step: &'static str, order: &Order) -> Self {
        Self {
            step,
            ok: true,
            status: Some(order.status.as_str()),
            code: None,
            detail: order.status_description.clone(),
        }
    }

    fn done(step: &'static str, detail: impl Into<String>) -> Self {
        Self {
            step,
            ok: true,
            status: None,
            code: None,
            detail: Some(detail.into()),
        }
    }

    fn failed(step: &'static str, err: &PlatformError) -> Self {
        Self {
            step,
            ok: false,
            status: None,
            code: err.provider_code(),
            detail: Some(err.to_string()),
        }
    }
}

pub fn run(args: SimulateArgs<'_>) -> Result<SimulationReport> {
    let (loaded, cfg) = load_platform_config(args.config_paths, false)?;
    let pcfg = cfg.provider(args.provider)?;
    let (provider, gateway) = memory_gateway(args.provider, pcfg)?;
    if gateway.capability().is_none() {
        bail!(
            "provider {} exposes no order interface; nothing to simulate",
            args.provider
        );
    }

    let pickup = GeoPoint::new(args.lat, args.lng).context("invalid pickup coordinates")?;
    let mut request = OrderRequest::new(
        pickup,
        RiderIdentity {
            name: Some("Simulated Rider".to_string()),
            device_id: Some(SIM_RIDER_DEVICE.to_string()),
            ..RiderIdentity::new(SIM_RIDER_MOBILE)
        },
    );
    if let Some(yuan) = args.price_increase {
        request = request.with_price_increase(
            PriceIncrease::from_yuan(yuan).context("invalid --price-increase")?,
        );
    }

    // One empty taxi a few hundred meters north of the pickup.
    let taxi_pos = GeoPoint::new((args.lat + 0.003).min(90.0), args.lng)
        .context("invalid taxi position")?;
    provider
        .upsert_vehicle(
            VehicleInfo::new(SIM_TAXI, taxi_pos)
                .with_plate("SIM-0001")
                .with_occupancy(Occupancy::Empty),
        )
        .context("seed simulated vehicle")?;

    let mut report = SimulationReport {
        provider: args.provider.to_string(),
        config_hash: loaded.config_hash,
        order_id: None,
        final_status: None,
        steps: Vec::new(),
    };

    let order = match gateway.create_order(&request) {
        Ok(o) => {
            report.steps.push(Step::order("create_order", &o));
            o
        }
        Err(e) => {
            report.steps.push(Step::failed("create_order", &e));
            return Ok(report);
        }
    };
    let order_id = order.order_id.clone();
    report.order_id = Some(order_id.clone());
    info!(provider = args.provider, order_id = %order_id, "simulation order created");

    drive(&provider, &gateway, &request, &order_id, args.outcome, &mut report.steps);

    report.final_status = gateway
        .query_order_status(&order_id)
        .ok()
        .map(|o| o.status.as_str());
    Ok(report)
}

fn drive(
    provider: &MemoryProvider,
    gateway: &ProviderGateway,
    request: &OrderRequest,
    order_id: &str,
    outcome: Outcome,
    steps: &mut Vec<Step>,
) {
    match gateway.taxis_near_by(request.location, 0.0) {
        Ok(v) => steps.push(Step::done("taxis_near_by", format!("{} vehicle(s)", v.len()))),
        Err(e) => steps.push(Step::failed("taxis_near_by", &e)),
    }

    match provider.apply_dispatch_event(
        order_id,
        &DispatchEvent::DriverConfirmed {
            vehicle_id: Some(SIM_TAXI.to_string()),
        },
        Some("sim-confirm"),
    ) {
        Ok(o) => steps.push(Step::order("driver_confirmed", &o)),
        Err(e) => steps.push(Step {
            step: "driver_confirmed",
            ok: false,
            status: None,
            code: Some(e.code()),
            detail: Some(e.to_string()),
        }),
    }

    let urge = UrgeMessage {
        title: Some("Simulated Rider".to_string()),
        text: Some("waiting at the gate".to_string()),
        ..UrgeMessage::default()
    };
    match gateway.urge_taxi_driver(order_id, SIM_RIDER_DEVICE, &urge) {
        Ok(()) => steps.push(Step::done("urge_taxi_driver", "driver notified")),
        Err(e) => steps.push(Step::failed("urge_taxi_driver", &e)),
    }

    match gateway.track_taxi(SIM_TAXI) {
        Ok(v) => steps.push(Step::done(
            "track_taxi",
            format!("{:.5},{:.5}", v.position.lat, v.position.lng),
        )),
        Err(e) => steps.push(Step::failed("track_taxi", &e)),
    }

    let ended = match outcome {
        Outcome::NoShow => gateway
            .report_driver_no_show(order_id, SIM_RIDER_DEVICE)
            .map(|o| Step::order("report_driver_no_show", &o))
            .unwrap_or_else(|e| Step::failed("report_driver_no_show", &e)),
        Outcome::UserCancel => gateway
            .cancel_order_by_user(order_id, SIM_RIDER_DEVICE)
            .map(|o| Step::order("cancel_order_by_user", &o))
            .unwrap_or_else(|e| Step::failed("cancel_order_by_user", &e)),
        Outcome::Completed => dispatch_step(
            provider,
            order_id,
            "trip_completed",
            DispatchEvent::TripCompleted,
        ),
        Outcome::DriverCancel => dispatch_step(
            provider,
            order_id,
            "driver_cancelled",
            DispatchEvent::DriverCancelled {
                reason: "vehicle breakdown".to_string(),
            },
        ),
    };
    steps.push(ended);

    // Terminal orders refuse every further state change.
    match gateway.cancel_order_by_user(order_id, SIM_RIDER_DEVICE) {
        Ok(o) => steps.push(Step::order("cancel_after_terminal", &o)),
        Err(e) => steps.push(Step::failed("cancel_after_terminal", &e)),
    }

    let ids = vec![order_id.to_string(), "unknown-order".to_string()];
    match gateway.batch_query_order_status(&ids) {
        Ok(entries) => {
            let present: Vec<&str> = entries
                .iter()
                .map(|e| if e.is_some() { "some" } else { "none" })
                .collect();
            steps.push(Step::done("batch_query_order_status", present.join(",")));
        }
        Err(e) => steps.push(Step::failed("batch_query_order_status", &e)),
    }
}

fn dispatch_step(
    provider: &MemoryProvider,
    order_id: &str,
    step: &'static str,
    event: DispatchEvent,
) -> Step {
    match provider.apply_dispatch_event(order_id, &event, None) {
        Ok(o) => Step::order(step, &o),
        Err(e) => Step {
            step,
            ok: false,
            status: None,
            code: Some(e.code()),
            detail: Some(e.to_string()),
        },
    }
}
