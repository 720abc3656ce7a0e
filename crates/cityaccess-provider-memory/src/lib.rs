//! In-memory reference provider.
//!
//! Implements both `OrderService` and `TrackService` over plain collections
//! so the platform (and tests) can exercise the full contract without a real
//! dispatch backend.
//!
//! Behaviour notes:
//! - Order ids are `{order_id_prefix}-{uuid v4, simple form}`.
//! - Driver-side events arrive through [`MemoryProvider::apply_dispatch_event`];
//!   nothing happens on a timer.
//! - The rider device on the request is registered and bound to the order at
//!   creation. Lifecycle calls check, in order: order exists, device is known,
//!   device matches the bound one, transition is legal.
//! - Orders are retained until [`MemoryProvider::purge_terminal_orders`],
//!   which also drops their urge notifications and any rider device no
//!   remaining order is bound to. [`MemoryProvider::drain_urge_notifications`]
//!   empties the outbox for a consumer that delivers urges elsewhere.
//!
//! # Locking
//! `orders` is always taken before `devices`. No method takes them in the
//! reverse order, and `fleet` is never held together with `orders`. `urges`
//! is only taken while `orders` is held or with no other lock.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use cityaccess_contract::{
    validate_device_id, validate_location, validate_radius, Feature, LifecycleEvent,
    OrderError, OrderLifecycle, OrderService, OrderServiceError, TrackError, TrackService,
    TrackServiceError, UnsupportedFeature,
};
use cityaccess_schemas::{
    CapabilityDescriptor, GeoPoint, Order, OrderRequest, OrderStatus, PriceIncrease,
    PriceIncreasePolicy, UrgeMessage, VehicleInfo,
};

mod fleet;
pub mod types;

use fleet::Fleet;
pub use types::{
    BackendFault, DispatchEvent, MemoryProviderSettings, OrderRecord, SettingsError,
    UrgeNotification,
};

#[derive(Debug)]
pub struct MemoryProvider {
    settings: MemoryProviderSettings,
    orders: RwLock<BTreeMap<String, OrderRecord>>,
    devices: RwLock<BTreeSet<String>>,
    fleet: RwLock<Fleet>,
    urges: Mutex<Vec<UrgeNotification>>,
    fault: Mutex<Option<BackendFault>>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::from_valid(MemoryProviderSettings::default())
    }
}

impl MemoryProvider {
    pub fn new(settings: MemoryProviderSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self::from_valid(settings))
    }

    fn from_valid(settings: MemoryProviderSettings) -> Self {
        Self {
            settings,
            orders: RwLock::new(BTreeMap::new()),
            devices: RwLock::new(BTreeSet::new()),
            fleet: RwLock::new(Fleet::default()),
            urges: Mutex::new(Vec::new()),
            fault: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &MemoryProviderSettings {
        &self.settings
    }

    // -- Test / scenario wiring ---------------------------------------------

    /// Make every subsequent backend call fail until cleared with `None`.
    /// `capability()` and `track_nearby_taxis_enabled()` are unaffected.
    pub fn inject_backend_fault(&self, fault: Option<BackendFault>) {
        if let Some(f) = fault {
            warn!(fault = ?f, "backend fault injected");
        }
        *self.fault.lock() = fault;
    }

    fn order_fault(&self) -> Result<(), OrderError> {
        match *self.fault.lock() {
            None => Ok(()),
            Some(BackendFault::Network) => Err(OrderError::network("dispatch backend unreachable")),
            Some(BackendFault::Database) => Err(OrderError::db("order store unavailable")),
        }
    }

    fn track_fault(&self) -> Result<(), TrackError> {
        match *self.fault.lock() {
            None => Ok(()),
            Some(BackendFault::Network) => Err(TrackError::network("tracking backend unreachable")),
            Some(BackendFault::Database) => Err(TrackError::db("position store unavailable")),
        }
    }

    /// Make a rider device known to the provider.
    pub fn register_device(&self, device_id: impl Into<String>) -> bool {
        self.devices.write().insert(device_id.into())
    }

    pub fn upsert_vehicle(&self, vehicle: VehicleInfo) -> Result<(), TrackServiceError> {
        validate_device_id(&vehicle.device_id)?;
        validate_location(&vehicle.position)?;
        debug!(device_id = %vehicle.device_id, lat = vehicle.position.lat, lng = vehicle.position.lng, "vehicle position updated");
        self.fleet.write().upsert(vehicle);
        Ok(())
    }

    pub fn remove_vehicle(&self, device_id: &str) -> Option<VehicleInfo> {
        self.fleet.write().remove(device_id)
    }

    pub fn vehicle_count(&self) -> usize {
        self.fleet.read().len()
    }

    /// Urges delivered so far, oldest first.
    pub fn urge_notifications(&self) -> Vec<UrgeNotification> {
        self.urges.lock().clone()
    }

    /// Take every recorded urge, leaving the outbox empty.
    pub fn drain_urge_notifications(&self) -> Vec<UrgeNotification> {
        std::mem::take(&mut *self.urges.lock())
    }

    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }

    pub fn order_record(&self, order_id: &str) -> Option<OrderRecord> {
        self.orders.read().get(order_id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.orders.read().len()
    }

    /// Drop terminal orders last updated strictly before `before`, together
    /// with their urge notifications and the rider devices only they were
    /// bound to. Returns how many orders were removed. Live orders are never
    /// touched.
    pub fn purge_terminal_orders(&self, before: DateTime<Utc>) -> usize {
        let mut orders = self.orders.write();
        let n0 = orders.len();
        let mut released: BTreeSet<String> = BTreeSet::new();
        orders.retain(|_, r| {
            let purge = r.lifecycle.is_terminal() && r.updated_at < before;
            if purge {
                if let Some(dev) = &r.rider_device_id {
                    released.insert(dev.clone());
                }
            }
            !purge
        });
        for r in orders.values() {
            if let Some(dev) = &r.rider_device_id {
                released.remove(dev);
            }
        }

        let mut devices = self.devices.write();
        for dev in &released {
            devices.remove(dev);
        }
        drop(devices);

        let mut urges = self.urges.lock();
        let urges_before = urges.len();
        urges.retain(|u| orders.contains_key(&u.order_id));
        let urges_dropped = urges_before - urges.len();
        drop(urges);

        let purged = n0 - orders.len();
        if purged > 0 {
            info!(
                purged,
                devices_released = released.len(),
                urges_dropped,
                %before,
                "terminal orders purged"
            );
        }
        purged
    }

    // -- Dispatch side ---------------------------------------------------------

    /// Feed a driver/dispatch event into an order.
    ///
    /// `event_id`, when given, makes redelivery a no-op.
    ///
    /// # Errors
    /// `OrderNotFound`, or `InvalidOrderOp` for an illegal transition.
    pub fn apply_dispatch_event(
        &self,
        order_id: &str,
        event: &DispatchEvent,
        event_id: Option<&str>,
    ) -> Result<Order, OrderError> {
        let mut orders = self.orders.write();
        let rec = orders
            .get_mut(order_id)
            .ok_or_else(|| OrderError::order_not_found(order_id))?;

        let from = rec.lifecycle.status();
        let to = rec.lifecycle.apply(&event.to_lifecycle(), event_id)?;
        if from != to {
            if let DispatchEvent::DriverConfirmed { vehicle_id } = event {
                rec.vehicle_id = vehicle_id.clone();
            }
            rec.updated_at = Utc::now();
            info!(order_id, %from, %to, "order transition (dispatch)");
        }
        Ok(rec.lifecycle.snapshot())
    }

    // -- Order internals -------------------------------------------------------

    fn accept_price_increase(&self, offered: Option<PriceIncrease>) -> Option<PriceIncrease> {
        let offered = offered?;
        match &self.settings.capability.price_increase {
            PriceIncreasePolicy::Forbidden => {
                debug!(%offered, "price increase ignored: not supported");
                None
            }
            p if p.admits(offered) => Some(offered),
            _ => {
                warn!(%offered, "price increase ignored: not an offered level");
                None
            }
        }
    }

    fn place(&self, request: &OrderRequest, search_radius_m: f64) -> Result<Order, OrderError> {
        request
            .validate()
            .map_err(|e| OrderError::invalid_op(format!("invalid order request: {e}")))?;
        self.order_fault()?;

        let rider_device_id = request.rider.device_id.clone();
        if let Some(dev) = &rider_device_id {
            self.register_device(dev.clone());
        }

        let order_id = format!("{}-{}", self.settings.order_id_prefix, Uuid::new_v4().simple());
        let now = Utc::now();
        let lifecycle = OrderLifecycle::new(order_id.clone());
        let snapshot = lifecycle.snapshot();
        let rec = OrderRecord {
            lifecycle,
            request: request.clone(),
            rider_device_id,
            vehicle_id: None,
            search_radius_m,
            accepted_price_increase: self.accept_price_increase(request.price_increase),
            created_at: now,
            updated_at: now,
        };

        self.orders.write().insert(order_id.clone(), rec);
        info!(
            order_id = %order_id,
            user_id = request.rider.effective_user_id(),
            search_radius_m,
            "order submitted"
        );
        Ok(snapshot)
    }

    /// Resolve an order for a rider-initiated call and run `f` on it under
    /// the write lock.
    fn with_rider_order<T>(
        &self,
        order_id: &str,
        device_id: &str,
        f: impl FnOnce(&mut OrderRecord) -> Result<T, OrderError>,
    ) -> Result<T, OrderError> {
        self.order_fault()?;
        let mut orders = self.orders.write();
        let rec = orders
            .get_mut(order_id)
            .ok_or_else(|| OrderError::order_not_found(order_id))?;

        if !self.devices.read().contains(device_id) {
            return Err(OrderError::device_not_found(device_id));
        }
        if let Some(bound) = &rec.rider_device_id {
            if bound != device_id {
                return Err(OrderError::invalid_op(format!(
                    "device {device_id} does not own order {order_id}"
                )));
            }
        }
        f(rec)
    }

    fn rider_transition(
        &self,
        order_id: &str,
        device_id: &str,
        event: LifecycleEvent,
    ) -> Result<Order, OrderError> {
        self.with_rider_order(order_id, device_id, |rec| {
            let from = rec.lifecycle.status();
            let to = rec.lifecycle.apply(&event, None)?;
            rec.updated_at = Utc::now();
            info!(order_id, device_id, %from, %to, "order transition (rider)");
            Ok(rec.lifecycle.snapshot())
        })
    }

    // -- Tracking internals ----------------------------------------------------

    fn require_point_tracking(&self, function: &str) -> Result<(), TrackError> {
        if self.settings.point_tracking_enabled {
            Ok(())
        } else {
            Err(TrackError::not_supported(function))
        }
    }

    fn require_nearby(&self) -> Result<(), TrackServiceError> {
        if self.settings.nearby_enabled {
            Ok(())
        } else {
            Err(UnsupportedFeature::with_description(
                Feature::NearbyTracking,
                "this provider does not report vehicles by area",
            )
            .into())
        }
    }
}

impl OrderService for MemoryProvider {
    fn capability(&self) -> CapabilityDescriptor {
        self.settings.capability.clone()
    }

    fn create_order(&self, request: &OrderRequest) -> Result<Order, OrderError> {
        self.place(request, self.settings.default_radius_m)
    }

    fn query_order_status(&self, order_id: &str) -> Result<Order, OrderError> {
        self.order_fault()?;
        self.orders
            .read()
            .get(order_id)
            .map(|r| r.lifecycle.snapshot())
            .ok_or_else(|| OrderError::order_not_found(order_id))
    }

    fn enlarge_search(
        &self,
        request: &OrderRequest,
        enlarge_factor: f64,
    ) -> Result<Order, OrderServiceError> {
        if !self.settings.capability.enlarge_search_enabled {
            return Err(UnsupportedFeature::with_description(
                Feature::EnlargeSearch,
                "this provider always searches its default radius",
            )
            .into());
        }
        if !enlarge_factor.is_finite() || enlarge_factor <= 0.0 {
            return Err(OrderError::invalid_op(format!(
                "enlarge factor must be a positive number, got {enlarge_factor}"
            ))
            .into());
        }
        let factor = enlarge_factor.clamp(1.0, self.settings.max_enlarge_factor);
        if factor != enlarge_factor {
            debug!(requested = enlarge_factor, applied = factor, "enlarge factor clamped");
        }
        let radius = (self.settings.default_radius_m * factor).min(self.settings.max_radius_m);
        Ok(self.place(request, radius)?)
    }

    fn urge_taxi_driver(
        &self,
        order_id: &str,
        device_id: &str,
        message: &UrgeMessage,
    ) -> Result<(), OrderServiceError> {
        if !self.settings.capability.urge_taxi_enabled {
            return Err(UnsupportedFeature::new(Feature::UrgeTaxi).into());
        }
        let note = self.with_rider_order(order_id, device_id, |rec| {
            let status = rec.lifecycle.status();
            if status != OrderStatus::ConfirmedByDriver {
                return Err(OrderError::invalid_op(format!(
                    "order {order_id} is {status}; urging needs a confirmed driver"
                )));
            }
            Ok(UrgeNotification {
                order_id: order_id.to_string(),
                rider_device_id: device_id.to_string(),
                vehicle_id: rec.vehicle_id.clone(),
                message: message.clone(),
                sent_at: Utc::now(),
            })
        })?;
        debug!(order_id, vehicle_id = ?note.vehicle_id, "driver urged");
        self.urges.lock().push(note);
        Ok(())
    }

    fn cancel_order_by_user(&self, order_id: &str, device_id: &str) -> Result<Order, OrderError> {
        self.rider_transition(
            order_id,
            device_id,
            LifecycleEvent::UserCancelled { reason: None },
        )
    }

    fn report_driver_no_show(&self, order_id: &str, device_id: &str) -> Result<Order, OrderError> {
        self.rider_transition(
            order_id,
            device_id,
            LifecycleEvent::RiderReportedNoShow { reason: None },
        )
    }

    fn batch_query_order_status(&self, order_ids: &[String]) -> Vec<Option<Order>> {
        if let Err(e) = self.order_fault() {
            warn!(error = %e, entries = order_ids.len(), "batch query failed; all entries absent");
            return vec![None; order_ids.len()];
        }
        // One read lock for the whole batch: entries reflect a single moment.
        let orders = self.orders.read();
        order_ids
            .iter()
            .map(|id| orders.get(id).map(|r| r.lifecycle.snapshot()))
            .collect()
    }
}

impl TrackService for MemoryProvider {
    fn track_nearby_taxis_enabled(&self) -> bool {
        self.settings.nearby_enabled
    }

    fn taxis_near_by(
        &self,
        location: GeoPoint,
        radius_hint_m: f64,
    ) -> Result<Vec<VehicleInfo>, TrackServiceError> {
        self.require_nearby()?;
        validate_location(&location)?;
        validate_radius(radius_hint_m)?;
        self.track_fault()?;

        let radius = self.settings.effective_radius(radius_hint_m);
        let found = self.fleet.read().within(location, radius, None);
        debug!(radius_m = radius, found = found.len(), "nearby search");
        Ok(found)
    }

    fn track_taxi_with_near_by(
        &self,
        device_id: &str,
        radius_hint_m: f64,
    ) -> Result<Vec<VehicleInfo>, TrackServiceError> {
        self.require_nearby()?;
        validate_device_id(device_id)?;
        validate_radius(radius_hint_m)?;
        self.require_point_tracking("track_taxi_with_near_by")?;
        self.track_fault()?;

        let radius = self.settings.effective_radius(radius_hint_m);
        let fleet = self.fleet.read();
        let tracked = fleet
            .get(device_id)
            .cloned()
            .ok_or_else(|| TrackError::device_not_found(device_id))?;
        let mut out = Vec::with_capacity(1);
        let around = fleet.within(tracked.position, radius, Some(device_id));
        out.push(tracked);
        out.extend(around);
        Ok(out)
    }

    fn track_taxi(&self, device_id: &str) -> Result<VehicleInfo, TrackServiceError> {
        validate_device_id(device_id)?;
        self.require_point_tracking("track_taxi")?;
        self.track_fault()?;
        self.fleet
            .read()
            .get(device_id)
            .cloned()
            .ok_or_else(|| TrackError::device_not_found(device_id).into())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
