//! Order placement and management contract.

use cityaccess_schemas::{CapabilityDescriptor, Order, OrderRequest, UrgeMessage};

use crate::error::{OrderError, OrderServiceError};

/// Contract every order-capable provider implements.
///
/// Implementations must be `Send + Sync`: one instance serves every platform
/// worker concurrently. A state-changing call must be atomic with respect to
/// other calls on the same order.
pub trait OrderService: Send + Sync {
    /// Static capability descriptor. No side effects, never fails, and returns
    /// the same value for the provider's lifetime.
    fn capability(&self) -> CapabilityDescriptor;

    /// Create an order. The returned order is in `Submitted`.
    ///
    /// Optional request fields the provider does not support (destination,
    /// preferences, price increase) are ignored, not rejected.
    ///
    /// # Errors
    /// `InvalidOrderOp` for missing/malformed mandatory fields;
    /// `NetworkError`/`DbOperationError` for backend failures.
    fn create_order(&self, request: &OrderRequest) -> Result<Order, OrderError>;

    /// # Errors
    /// `OrderNotFound` if the id is unknown to this provider.
    fn query_order_status(&self, order_id: &str) -> Result<Order, OrderError>;

    /// Create an order with an enlarged search radius.
    ///
    /// `enlarge_factor` is a suggested multiplier (typically 1–3); the
    /// provider may clamp it.
    ///
    /// # Errors
    /// `Unsupported` when `enlarge_search_enabled` is false. Never falls back
    /// to a plain search. Otherwise as [`OrderService::create_order`].
    fn enlarge_search(
        &self,
        request: &OrderRequest,
        enlarge_factor: f64,
    ) -> Result<Order, OrderServiceError>;

    /// Ask the assigned driver to hurry. Does not change the order's status.
    ///
    /// # Errors
    /// `Unsupported` when `urge_taxi_enabled` is false; `OrderNotFound`,
    /// `DeviceNotFound`; `InvalidOrderOp` unless the order is
    /// `ConfirmedByDriver`.
    fn urge_taxi_driver(
        &self,
        order_id: &str,
        device_id: &str,
        message: &UrgeMessage,
    ) -> Result<(), OrderServiceError>;

    /// `Submitted | ConfirmedByDriver → CancelledByUser`.
    ///
    /// # Errors
    /// `OrderNotFound`, `DeviceNotFound`; `InvalidOrderOp` from any other
    /// status.
    fn cancel_order_by_user(&self, order_id: &str, device_id: &str) -> Result<Order, OrderError>;

    /// `ConfirmedByDriver → TaxiNoShow`. Same errors as cancel.
    fn report_driver_no_show(&self, order_id: &str, device_id: &str)
        -> Result<Order, OrderError>;

    /// Positionally aligned lookup. An entry is `None` when its id is
    /// unknown or its individual lookup failed; the call as a whole never
    /// fails.
    fn batch_query_order_status(&self, order_ids: &[String]) -> Vec<Option<Order>> {
        order_ids
            .iter()
            .map(|id| match self.query_order_status(id) {
                Ok(order) => Some(order),
                Err(e) => {
                    tracing::debug!(order_id = %id, code = e.code(), "batch entry absent");
                    None
                }
            })
            .collect()
    }
}
