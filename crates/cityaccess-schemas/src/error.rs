use thiserror::Error;

use crate::order::OrderStatus;

/// Validation failures for the shared value types.
///
/// Providers map these onto their own error families (an invalid order
/// request becomes `InvalidOrderOp`, a malformed tracking position becomes
/// `InvalidArgument`); this type never crosses the provider boundary itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("coordinate out of range or not finite: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),

    #[error("malformed mobile number: {0:?}")]
    InvalidMobile(String),

    #[error("price amount is not finite")]
    PriceNotFinite,

    #[error("price amount out of range after scaling to fen")]
    PriceOutOfRange,

    #[error("price increase must be positive, got {fen} fen")]
    NonPositivePrice { fen: i64 },

    #[error("fixed price-increase mode requires at least one level")]
    EmptyFixedLevels,

    #[error("fixed price-increase levels given while mode is {0:?}")]
    UnexpectedFixedLevels(crate::capability::PriceIncreaseMode),

    #[error("unknown order status code {0}")]
    UnknownStatusCode(u8),

    #[error("unknown occupancy code {0}")]
    UnknownOccupancyCode(u8),

    #[error("unknown gender code {0}")]
    UnknownGenderCode(u8),

    #[error("unknown price-increase mode code {0}")]
    UnknownPriceModeCode(u8),

    #[error("status {0:?} requires a status description")]
    MissingStatusDescription(OrderStatus),
}
