//! Scenario: rider and dispatch race on the same order
//!
//! The rider cancels while the driver confirms and completes. Whatever the
//! interleaving, exactly one of "cancel" and "complete" wins, the final
//! status agrees with the winner, and the loser gets InvalidOrderOp.

use std::collections::BTreeSet;
use std::thread;

use cityaccess_contract::{OrderErrorKind, OrderService};
use cityaccess_provider_memory::{DispatchEvent, MemoryProvider};
use cityaccess_schemas::OrderStatus;
use cityaccess_testkit::{full_featured_settings, order_request};

#[test]
fn cancel_and_complete_never_both_succeed() -> anyhow::Result<()> {
    let p = MemoryProvider::new(full_featured_settings()?)?;

    for round in 0..200 {
        let device = format!("rider-{round}");
        let order = p.create_order(&order_request(&device))?;
        let id = order.order_id.as_str();

        let (cancel, complete) = thread::scope(|s| {
            let rider = s.spawn(|| p.cancel_order_by_user(id, &device));
            let driver = s.spawn(|| {
                p.apply_dispatch_event(
                    id,
                    &DispatchEvent::DriverConfirmed {
                        vehicle_id: Some("T-1".into()),
                    },
                    None,
                )
                .and_then(|_| p.apply_dispatch_event(id, &DispatchEvent::TripCompleted, None))
            });
            (rider.join().unwrap(), driver.join().unwrap())
        });

        assert!(
            cancel.is_ok() != complete.is_ok(),
            "round {round}: cancel={cancel:?} complete={complete:?}"
        );
        let final_status = p.query_order_status(id)?.status;
        match (&cancel, &complete) {
            (Ok(c), Err(e)) => {
                assert_eq!(c.status, OrderStatus::CancelledByUser);
                assert_eq!(final_status, OrderStatus::CancelledByUser);
                assert_eq!(e.kind, OrderErrorKind::InvalidOrderOp);
            }
            (Err(e), Ok(c)) => {
                assert_eq!(c.status, OrderStatus::Completed);
                assert_eq!(final_status, OrderStatus::Completed);
                assert_eq!(e.kind, OrderErrorKind::InvalidOrderOp);
            }
            _ => unreachable!(),
        }
    }
    Ok(())
}

#[test]
fn concurrent_creates_get_distinct_ids() -> anyhow::Result<()> {
    let p = MemoryProvider::new(full_featured_settings()?)?;

    let ids: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let p = &p;
                s.spawn(move || {
                    (0..25)
                        .map(|i| {
                            p.create_order(&order_request(&format!("rider-{t}-{i}")))
                                .unwrap()
                                .order_id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(ids.len(), 200);
    assert_eq!(ids.iter().collect::<BTreeSet<_>>().len(), 200);
    assert_eq!(p.order_count(), 200);
    Ok(())
}

#[test]
fn batch_reads_see_consistent_snapshots_during_writes() -> anyhow::Result<()> {
    let p = MemoryProvider::new(full_featured_settings()?)?;
    let ids: Vec<String> = (0..50)
        .map(|i| p.create_order(&order_request(&format!("r{i}"))).map(|o| o.order_id))
        .collect::<Result<_, _>>()?;

    thread::scope(|s| {
        s.spawn(|| {
            for (i, id) in ids.iter().enumerate() {
                p.cancel_order_by_user(id, &format!("r{i}")).unwrap();
            }
        });
        s.spawn(|| {
            for _ in 0..50 {
                let out = p.batch_query_order_status(&ids);
                assert_eq!(out.len(), ids.len());
                assert!(out.iter().all(|o| o.is_some()));
                // Cancels run in id order, so a snapshot is a cancelled prefix.
                let statuses: Vec<OrderStatus> =
                    out.into_iter().flatten().map(|o| o.status).collect();
                let cancelled = statuses
                    .iter()
                    .take_while(|st| **st == OrderStatus::CancelledByUser)
                    .count();
                assert!(statuses[cancelled..]
                    .iter()
                    .all(|st| *st == OrderStatus::Submitted));
            }
        });
    });
    Ok(())
}
