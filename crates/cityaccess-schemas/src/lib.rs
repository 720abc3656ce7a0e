//! cityaccess-schemas
//!
//! Value types shared by the platform and every taxi-dispatch provider:
//! positions, vehicles, orders, rider requests, money and the static
//! capability descriptor a provider advertises.
//!
//! Everything here is a plain value. Identity and lifecycle live in the
//! provider; these records are copied across the contract boundary.

mod capability;
mod error;
mod geo;
mod money;
mod order;
mod rider;
mod vehicle;

pub use capability::{CapabilityDescriptor, FixedLevels, PriceIncreaseMode, PriceIncreasePolicy};
pub use error::SchemaError;
pub use geo::{haversine_m, GeoPoint, EARTH_RADIUS_M};
pub use money::{fen_to_yuan, yuan_to_fen, PriceIncrease, FEN_PER_YUAN};
pub use order::{Order, OrderStatus};
pub use rider::{Destination, Gender, OrderRequest, RidePreferences, RiderIdentity, UrgeMessage};
pub use vehicle::{Occupancy, VehicleInfo};
