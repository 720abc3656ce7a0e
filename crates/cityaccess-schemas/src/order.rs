use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Every status a hailing order can occupy.
///
/// Discriminants are the vendor wire codes; decoding any other code fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum OrderStatus {
    /// Request accepted by the provider and being dispatched. Sole initial state.
    Submitted = 1,
    /// A driver accepted the order.
    ConfirmedByDriver = 2,
    /// Search finished without any candidate vehicle. **Terminal.**
    NoTaxiFound = 3,
    /// Candidates were found but none confirmed. **Terminal.**
    NoDriverConfirm = 4,
    /// The rider cancelled. **Terminal.**
    CancelledByUser = 5,
    /// The assigned driver cancelled. **Terminal.**
    CancelledByDriver = 6,
    /// The rider reported that the confirmed taxi never arrived. **Terminal.**
    TaxiNoShow = 7,
    /// Trip finished. **Terminal.**
    Completed = 8,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Submitted,
        OrderStatus::ConfirmedByDriver,
        OrderStatus::NoTaxiFound,
        OrderStatus::NoDriverConfirm,
        OrderStatus::CancelledByUser,
        OrderStatus::CancelledByDriver,
        OrderStatus::TaxiNoShow,
        OrderStatus::Completed,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Submitted | Self::ConfirmedByDriver)
    }

    /// Cancellations and no-shows must explain themselves.
    pub fn requires_description(self) -> bool {
        matches!(
            self,
            Self::CancelledByUser | Self::CancelledByDriver | Self::TaxiNoShow
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::ConfirmedByDriver => "CONFIRMED_BY_DRIVER",
            Self::NoTaxiFound => "NO_TAXI_FOUND",
            Self::NoDriverConfirm => "NO_DRIVER_CONFIRM",
            Self::CancelledByUser => "CANCELLED_BY_USER",
            Self::CancelledByDriver => "CANCELLED_BY_DRIVER",
            Self::TaxiNoShow => "TAXI_NO_SHOW",
            Self::Completed => "COMPLETED",
        }
    }
}

impl TryFrom<u8> for OrderStatus {
    type Error = SchemaError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        OrderStatus::ALL
            .into_iter()
            .find(|s| s.code() == code)
            .ok_or(SchemaError::UnknownStatusCode(code))
    }
}

impl From<OrderStatus> for u8 {
    fn from(s: OrderStatus) -> u8 {
        s.code()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// Externally visible snapshot of one hailing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Provider-assigned identifier, unique within that provider.
    pub order_id: String,
    pub status: OrderStatus,
    /// Free-text reason. Present for cancellations and no-shows.
    pub status_description: Option<String>,
}

impl Order {
    pub fn new(
        order_id: impl Into<String>,
        status: OrderStatus,
        status_description: Option<String>,
    ) -> Result<Self, SchemaError> {
        let order = Self {
            order_id: order_id.into(),
            status,
            status_description,
        };
        order.validate()?;
        Ok(order)
    }

    pub fn submitted(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            status: OrderStatus::Submitted,
            status_description: None,
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.order_id.trim().is_empty() {
            return Err(SchemaError::MissingField("order_id"));
        }
        let described = self
            .status_description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty());
        if self.status.requires_description() && !described {
            return Err(SchemaError::MissingStatusDescription(self.status));
        }
        Ok(())
    }
}
