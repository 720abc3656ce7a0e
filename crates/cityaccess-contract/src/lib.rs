//! cityaccess-contract
//!
//! The contract between the ride-hailing platform and a city-level dispatch
//! provider.
//!
//! - `OrderService` / `TrackService`: what a provider implements.
//! - `lifecycle`: the order state machine every provider must honour.
//! - `error`: the numeric error taxonomy (100–104, 200–203) plus the
//!   `UnsupportedFeature` signal, kept distinct from each other.
//! - `ProviderGateway` / `ProviderRegistry`: the platform side. Capabilities
//!   are read once per provider session and every gated call is checked
//!   against them before the provider is invoked.
//!
//! The contract is synchronous. Implementations are `Send + Sync` and must
//! tolerate concurrent calls.

mod error;
mod gateway;
mod order_service;
mod registry;
mod track_service;

pub mod lifecycle;

pub use error::{
    Feature, InvalidArgument, OrderError, OrderErrorKind, OrderServiceError, TrackError,
    TrackErrorKind, TrackServiceError, UnsupportedFeature,
};

pub use gateway::{PlatformError, ProviderGateway, ServiceInterface};
pub use registry::{ProviderOrderRef, ProviderRegistry};

pub use lifecycle::{
    is_legal_transition, next_status, LifecycleEvent, OrderLifecycle, TransitionError,
};

pub use order_service::OrderService;
pub use track_service::{validate_device_id, validate_location, validate_radius, TrackService};
