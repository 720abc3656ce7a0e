//! Order lifecycle state machine.
//!
//! # Design
//!
//! Every status change a provider makes goes through [`OrderLifecycle::apply`],
//! which enforces two invariants:
//!
//! 1. **Legal transitions only.** An event that has no edge from the current
//!    status returns [`TransitionError`] and leaves the order untouched.
//! 2. **Idempotent replay.** If an `event_id` is supplied and was already
//!    applied, the call is a silent no-op. Dispatch backends redeliver events;
//!    replaying a log converges to the same state.
//!
//! # State diagram
//!
//! ```text
//!                      DriverConfirmed
//!   new() ──► Submitted ─────────────────► ConfirmedByDriver
//!               │  │  │                      │   │   │   │
//!    NoTaxiFound│  │  │UserCancelled         │   │   │   └─ TripCompleted ──► Completed
//!               ▼  │  └───────────┐          │   │   └───── TaxiNoShow ─────► TaxiNoShow
//!       NoTaxiFound│              ▼          │   └───────── DriverCancelled ► CancelledByDriver
//!                  │       CancelledByUser ◄─┘ UserCancelled
//!   NoDriverConfirm▼
//!       NoDriverConfirm
//! ```
//!
//! All six leaf statuses are terminal.

use std::collections::HashSet;

use cityaccess_schemas::{Order, OrderStatus};

use crate::error::OrderError;

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Events that move an order between statuses.
///
/// `UserCancelled` and `RiderReportedNoShow` originate from platform calls;
/// the rest are asynchronous driver/dispatch events raised inside the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    DriverConfirmed,
    NoTaxiFound,
    NoDriverConfirm,
    UserCancelled { reason: Option<String> },
    DriverCancelled { reason: String },
    RiderReportedNoShow { reason: Option<String> },
    TripCompleted,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DriverConfirmed => "DriverConfirmed",
            Self::NoTaxiFound => "NoTaxiFound",
            Self::NoDriverConfirm => "NoDriverConfirm",
            Self::UserCancelled { .. } => "UserCancelled",
            Self::DriverCancelled { .. } => "DriverCancelled",
            Self::RiderReportedNoShow { .. } => "RiderReportedNoShow",
            Self::TripCompleted => "TripCompleted",
        }
    }
}

/// The status an event leads to from `from`, or `None` if there is no edge.
pub fn next_status(from: OrderStatus, event: &LifecycleEvent) -> Option<OrderStatus> {
    use LifecycleEvent as E;
    use OrderStatus::*;

    match (from, event) {
        (Submitted, E::DriverConfirmed) => Some(ConfirmedByDriver),
        (Submitted, E::NoTaxiFound) => Some(NoTaxiFound),
        (Submitted, E::NoDriverConfirm) => Some(NoDriverConfirm),
        (Submitted | ConfirmedByDriver, E::UserCancelled { .. }) => Some(CancelledByUser),

        (ConfirmedByDriver, E::DriverCancelled { .. }) => Some(CancelledByDriver),
        (ConfirmedByDriver, E::RiderReportedNoShow { .. }) => Some(TaxiNoShow),
        (ConfirmedByDriver, E::TripCompleted) => Some(Completed),

        _ => None,
    }
}

/// Whether any event connects `from` to `to`.
pub fn is_legal_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (
            Submitted,
            ConfirmedByDriver | NoTaxiFound | NoDriverConfirm | CancelledByUser
        ) | (
            ConfirmedByDriver,
            CancelledByUser | CancelledByDriver | TaxiNoShow | Completed
        )
    )
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

/// Returned when an event cannot legally be applied in the current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub order_id: String,
    /// The status the order was in when the illegal event arrived.
    pub from: OrderStatus,
    pub event: &'static str,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "illegal order transition: order {} is {} and cannot accept {}",
            self.order_id, self.from, self.event
        )
    }
}

impl std::error::Error for TransitionError {}

impl From<TransitionError> for OrderError {
    fn from(e: TransitionError) -> Self {
        OrderError::invalid_op(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// OrderLifecycle
// ---------------------------------------------------------------------------

/// One order tracked through the lifecycle machine.
#[derive(Debug, Clone)]
pub struct OrderLifecycle {
    order_id: String,
    status: OrderStatus,
    description: Option<String>,
    /// Applied event ids, for idempotent replay.
    applied: HashSet<String>,
}

impl OrderLifecycle {
    /// A freshly created order in `Submitted`.
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            status: OrderStatus::Submitted,
            description: None,
            applied: HashSet::new(),
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The externally visible snapshot.
    pub fn snapshot(&self) -> Order {
        Order {
            order_id: self.order_id.clone(),
            status: self.status,
            status_description: self.description.clone(),
        }
    }

    /// Check an event against the current status without applying it.
    pub fn check(&self, event: &LifecycleEvent) -> Result<OrderStatus, TransitionError> {
        next_status(self.status, event).ok_or_else(|| TransitionError {
            order_id: self.order_id.clone(),
            from: self.status,
            event: event.name(),
        })
    }

    /// Apply an event.
    ///
    /// `event_id`: if `Some` and already applied, returns `Ok` without
    /// touching the order.
    ///
    /// # Errors
    /// [`TransitionError`] for events with no edge from the current status.
    /// The order is unchanged in that case.
    pub fn apply(
        &mut self,
        event: &LifecycleEvent,
        event_id: Option<&str>,
    ) -> Result<OrderStatus, TransitionError> {
        if let Some(id) = event_id {
            if self.applied.contains(id) {
                return Ok(self.status);
            }
        }

        let to = self.check(event)?;
        self.description = status_description(to, event);
        self.status = to;

        if let Some(id) = event_id {
            self.applied.insert(id.to_string());
        }
        Ok(to)
    }
}

/// Cancellations and no-shows always get a reason, falling back to a
/// canned one when the event did not carry any.
fn status_description(to: OrderStatus, event: &LifecycleEvent) -> Option<String> {
    let given = match event {
        LifecycleEvent::UserCancelled { reason } | LifecycleEvent::RiderReportedNoShow { reason } => {
            reason.clone()
        }
        LifecycleEvent::DriverCancelled { reason } => Some(reason.clone()),
        _ => None,
    }
    .filter(|r| !r.trim().is_empty());

    match (to, given) {
        (_, Some(r)) => Some(r),
        (OrderStatus::CancelledByUser, None) => Some("cancelled by rider".to_string()),
        (OrderStatus::CancelledByDriver, None) => Some("cancelled by driver".to_string()),
        (OrderStatus::TaxiNoShow, None) => {
            Some("confirmed taxi did not show up".to_string())
        }
        (OrderStatus::NoTaxiFound, None) => Some("no taxi found nearby".to_string()),
        (OrderStatus::NoDriverConfirm, None) => {
            Some("no driver confirmed the order".to_string())
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmed() -> OrderLifecycle {
        let mut o = OrderLifecycle::new("ord-test");
        o.apply(&LifecycleEvent::DriverConfirmed, Some("c1")).unwrap();
        o
    }

    #[test]
    fn new_order_starts_submitted() {
        let o = OrderLifecycle::new("ord-test");
        assert_eq!(o.status(), OrderStatus::Submitted);
        assert!(!o.is_terminal());
        assert_eq!(o.snapshot().status_description, None);
    }

    #[test]
    fn confirm_then_complete() {
        let mut o = confirmed();
        assert_eq!(o.status(), OrderStatus::ConfirmedByDriver);
        o.apply(&LifecycleEvent::TripCompleted, Some("t1")).unwrap();
        assert_eq!(o.status(), OrderStatus::Completed);
        assert!(o.is_terminal());
    }

    #[test]
    fn user_cancel_allowed_from_submitted_and_confirmed() {
        let mut a = OrderLifecycle::new("a");
        a.apply(&LifecycleEvent::UserCancelled { reason: None }, None)
            .unwrap();
        assert_eq!(a.status(), OrderStatus::CancelledByUser);

        let mut b = confirmed();
        b.apply(&LifecycleEvent::UserCancelled { reason: Some("plans changed".into()) }, None)
            .unwrap();
        assert_eq!(b.snapshot().status_description.as_deref(), Some("plans changed"));
    }

    #[test]
    fn no_show_only_from_confirmed() {
        let mut o = OrderLifecycle::new("o");
        let err = o
            .apply(&LifecycleEvent::RiderReportedNoShow { reason: None }, None)
            .unwrap_err();
        assert_eq!(err.from, OrderStatus::Submitted);
        assert_eq!(o.status(), OrderStatus::Submitted);
    }

    #[test]
    fn terminal_statuses_accept_nothing() {
        let mut o = confirmed();
        o.apply(&LifecycleEvent::RiderReportedNoShow { reason: None }, None)
            .unwrap();
        let before = o.snapshot();
        for ev in [
            LifecycleEvent::DriverConfirmed,
            LifecycleEvent::UserCancelled { reason: None },
            LifecycleEvent::TripCompleted,
        ] {
            assert!(o.apply(&ev, None).is_err());
        }
        assert_eq!(o.snapshot(), before);
    }

    #[test]
    fn cancellations_and_no_shows_always_described() {
        let mut o = confirmed();
        o.apply(&LifecycleEvent::DriverCancelled { reason: "  ".into() }, None)
            .unwrap();
        let snap = o.snapshot();
        assert!(snap.validate().is_ok());
        assert_eq!(snap.status_description.as_deref(), Some("cancelled by driver"));
    }

    #[test]
    fn idempotent_replay_does_not_reapply() {
        let mut o = OrderLifecycle::new("o");
        o.apply(&LifecycleEvent::DriverConfirmed, Some("e1")).unwrap();
        // Same id after a further transition is still skipped.
        o.apply(&LifecycleEvent::TripCompleted, Some("e2")).unwrap();
        assert_eq!(
            o.apply(&LifecycleEvent::DriverConfirmed, Some("e1")).unwrap(),
            OrderStatus::Completed
        );
    }

    #[test]
    fn transition_error_maps_to_invalid_order_op() {
        let mut o = OrderLifecycle::new("o-5");
        let err: OrderError = o
            .apply(&LifecycleEvent::TripCompleted, None)
            .unwrap_err()
            .into();
        assert_eq!(err.code(), 102);
        assert!(err.description().unwrap().contains("SUBMITTED"));
    }

    #[test]
    fn edge_table_agrees_with_next_status() {
        let events = [
            LifecycleEvent::DriverConfirmed,
            LifecycleEvent::NoTaxiFound,
            LifecycleEvent::NoDriverConfirm,
            LifecycleEvent::UserCancelled { reason: None },
            LifecycleEvent::DriverCancelled { reason: "x".into() },
            LifecycleEvent::RiderReportedNoShow { reason: None },
            LifecycleEvent::TripCompleted,
        ];
        for from in OrderStatus::ALL {
            for ev in &events {
                if let Some(to) = next_status(from, ev) {
                    assert!(is_legal_transition(from, to), "{from:?} -> {to:?}");
                    assert!(!from.is_terminal());
                }
            }
        }
    }
}
