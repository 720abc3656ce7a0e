//! Scenario: Order lifecycle properties
//!
//! Drives random event sequences through `OrderLifecycle` and checks:
//!
//! 1. Every observed status change is a legal edge.
//! 2. Terminal statuses absorb: once terminal, every further event is refused
//!    and the snapshot is unchanged.
//! 3. Replaying an event id is a no-op.
//! 4. Statuses that require a description always carry a non-empty one.

use cityaccess_contract::{is_legal_transition, next_status, LifecycleEvent, OrderLifecycle};
use cityaccess_schemas::OrderStatus;
use proptest::prelude::*;

fn event_strategy() -> impl Strategy<Value = LifecycleEvent> {
    let reason = prop::option::of("[a-z ]{0,12}");
    prop_oneof![
        Just(LifecycleEvent::DriverConfirmed),
        Just(LifecycleEvent::NoTaxiFound),
        Just(LifecycleEvent::NoDriverConfirm),
        Just(LifecycleEvent::TripCompleted),
        reason
            .clone()
            .prop_map(|reason| LifecycleEvent::UserCancelled { reason }),
        "[a-z ]{0,12}".prop_map(|reason| LifecycleEvent::DriverCancelled { reason }),
        reason.prop_map(|reason| LifecycleEvent::RiderReportedNoShow { reason }),
    ]
}

proptest! {
    #[test]
    fn random_sequences_follow_legal_edges(events in prop::collection::vec(event_strategy(), 0..16)) {
        let mut order = OrderLifecycle::new("o-prop");
        for event in &events {
            let before = order.snapshot();
            match order.apply(event, None) {
                Ok(to) => {
                    prop_assert!(is_legal_transition(before.status, to));
                    prop_assert_eq!(order.status(), to);
                }
                Err(e) => {
                    prop_assert_eq!(e.from, before.status);
                    prop_assert_eq!(order.snapshot(), before);
                }
            }
            let snap = order.snapshot();
            prop_assert!(snap.validate().is_ok());
            if snap.status.requires_description() {
                let d = snap.status_description.unwrap_or_default();
                prop_assert!(!d.trim().is_empty());
            }
        }
    }

    #[test]
    fn terminal_statuses_absorb(prefix in prop::collection::vec(event_strategy(), 0..8),
                                tail in prop::collection::vec(event_strategy(), 1..8)) {
        let mut order = OrderLifecycle::new("o-term");
        for event in &prefix {
            let _ = order.apply(event, None);
        }
        prop_assume!(order.is_terminal());
        let frozen = order.snapshot();
        for event in &tail {
            prop_assert!(order.apply(event, None).is_err());
            prop_assert_eq!(order.snapshot(), frozen.clone());
        }
    }

    #[test]
    fn replayed_event_id_is_noop(events in prop::collection::vec(event_strategy(), 1..10)) {
        let mut once = OrderLifecycle::new("o-replay");
        let mut twice = OrderLifecycle::new("o-replay");
        for (i, event) in events.iter().enumerate() {
            let id = format!("evt-{i}");
            let _ = once.apply(event, Some(&id));
            let _ = twice.apply(event, Some(&id));
            let _ = twice.apply(event, Some(&id));
        }
        prop_assert_eq!(once.snapshot(), twice.snapshot());
    }
}

#[test]
fn transition_table_matches_edge_predicate() {
    let events = [
        LifecycleEvent::DriverConfirmed,
        LifecycleEvent::NoTaxiFound,
        LifecycleEvent::NoDriverConfirm,
        LifecycleEvent::UserCancelled { reason: None },
        LifecycleEvent::DriverCancelled {
            reason: "car broke down".into(),
        },
        LifecycleEvent::RiderReportedNoShow { reason: None },
        LifecycleEvent::TripCompleted,
    ];
    for from in OrderStatus::ALL {
        for event in &events {
            if let Some(to) = next_status(from, event) {
                assert!(is_legal_transition(from, to), "{from} -> {to}");
                assert!(!from.is_terminal());
            }
        }
    }
}
