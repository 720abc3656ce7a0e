//! Scenario: confirmed taxi never shows up
//!
//! create → Submitted; provider confirms → ConfirmedByDriver; urge succeeds
//! and leaves the status alone; rider reports no-show → TaxiNoShow; a later
//! cancel fails with InvalidOrderOp (102) and the order stays TaxiNoShow.

use cityaccess_contract::{OrderErrorKind, OrderService, ServiceInterface};
use cityaccess_provider_memory::DispatchEvent;
use cityaccess_schemas::{Gender, OrderStatus, UrgeMessage};
use cityaccess_testkit::{full_featured_settings, memory_gateway, order_request, place_taxi};

#[test]
fn no_show_then_cancel_is_refused() -> anyhow::Result<()> {
    let (provider, gateway) = memory_gateway(
        "nanjing",
        full_featured_settings()?,
        &[ServiceInterface::Order, ServiceInterface::Track],
    )?;
    place_taxi(&provider, "T-100", 400.0)?;

    let order = gateway.create_order(&order_request("rider-1"))?;
    assert_eq!(order.status, OrderStatus::Submitted);
    assert_eq!(order.status_description, None);

    let confirmed = provider.apply_dispatch_event(
        &order.order_id,
        &DispatchEvent::DriverConfirmed {
            vehicle_id: Some("T-100".into()),
        },
        Some("dispatch-evt-1"),
    )?;
    assert_eq!(confirmed.status, OrderStatus::ConfirmedByDriver);

    gateway.urge_taxi_driver(
        &order.order_id,
        "rider-1",
        &UrgeMessage {
            title: Some("Ms. Zhang".into()),
            gender: Gender::Female,
            text: Some("I'm at the north entrance".into()),
        },
    )?;
    assert_eq!(
        gateway.query_order_status(&order.order_id)?.status,
        OrderStatus::ConfirmedByDriver,
        "urging must not change the status"
    );
    let urges = provider.urge_notifications();
    assert_eq!(urges.len(), 1);
    assert_eq!(urges[0].vehicle_id.as_deref(), Some("T-100"));

    let no_show = gateway.report_driver_no_show(&order.order_id, "rider-1")?;
    assert_eq!(no_show.status, OrderStatus::TaxiNoShow);
    assert!(no_show
        .status_description
        .as_deref()
        .is_some_and(|d| !d.is_empty()));

    let err = provider
        .cancel_order_by_user(&order.order_id, "rider-1")
        .unwrap_err();
    assert_eq!(err.kind, OrderErrorKind::InvalidOrderOp);
    assert_eq!(err.code(), 102);

    let platform_err = gateway
        .cancel_order_by_user(&order.order_id, "rider-1")
        .unwrap_err();
    assert_eq!(platform_err.provider_code(), Some(102));

    assert_eq!(
        provider.query_order_status(&order.order_id)?.status,
        OrderStatus::TaxiNoShow
    );
    Ok(())
}

#[test]
fn completed_trip_is_terminal() -> anyhow::Result<()> {
    let (provider, _gateway) =
        memory_gateway("nanjing", full_featured_settings()?, &[ServiceInterface::Order])?;
    let order = cityaccess_testkit::confirmed_order(&provider, "rider-2", "T-7")?;

    let done = provider.apply_dispatch_event(&order.order_id, &DispatchEvent::TripCompleted, None)?;
    assert_eq!(done.status, OrderStatus::Completed);

    let err = provider
        .report_driver_no_show(&order.order_id, "rider-2")
        .unwrap_err();
    assert_eq!(err.kind, OrderErrorKind::InvalidOrderOp);

    let err = provider
        .apply_dispatch_event(
            &order.order_id,
            &DispatchEvent::DriverCancelled {
                reason: "late".into(),
            },
            None,
        )
        .unwrap_err();
    assert_eq!(err.kind, OrderErrorKind::InvalidOrderOp);
    Ok(())
}

#[test]
fn driver_cancel_carries_reason() -> anyhow::Result<()> {
    let (provider, _gateway) =
        memory_gateway("nanjing", full_featured_settings()?, &[ServiceInterface::Order])?;
    let order = cityaccess_testkit::confirmed_order(&provider, "rider-3", "T-8")?;

    let cancelled = provider.apply_dispatch_event(
        &order.order_id,
        &DispatchEvent::DriverCancelled {
            reason: "flat tyre".into(),
        },
        None,
    )?;
    assert_eq!(cancelled.status, OrderStatus::CancelledByDriver);
    assert_eq!(cancelled.status_description.as_deref(), Some("flat tyre"));
    Ok(())
}
