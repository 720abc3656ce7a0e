//! Integer-fen money representation.
//!
//! Price increases are carried internally as `i64` fen (1 yuan = 100 fen) so
//! that fixed-level matching is exact. `f64` yuan only appears at the vendor
//! wire boundary:
//!
//! | Direction            | Function        |
//! |----------------------|-----------------|
//! | internal → wire      | [`fen_to_yuan`] |
//! | wire → internal      | [`yuan_to_fen`] |

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Scale factor: 1 yuan = 100 fen.
pub const FEN_PER_YUAN: i64 = 100;

pub fn fen_to_yuan(fen: i64) -> f64 {
    fen as f64 / FEN_PER_YUAN as f64
}

/// Convert a wire yuan amount to fen, rounding to the nearest fen.
pub fn yuan_to_fen(yuan: f64) -> Result<i64, SchemaError> {
    if !yuan.is_finite() {
        return Err(SchemaError::PriceNotFinite);
    }
    let scaled = yuan * FEN_PER_YUAN as f64;
    // `as` saturates; reject instead.
    if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
        return Err(SchemaError::PriceOutOfRange);
    }
    Ok(scaled.round() as i64)
}

/// A strictly positive surcharge a rider offers on top of the metered fare.
///
/// Serialized as yuan (`f64`) to match vendor payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PriceIncrease(i64);

impl PriceIncrease {
    pub fn from_fen(fen: i64) -> Result<Self, SchemaError> {
        if fen <= 0 {
            return Err(SchemaError::NonPositivePrice { fen });
        }
        Ok(Self(fen))
    }

    pub fn from_yuan(yuan: f64) -> Result<Self, SchemaError> {
        Self::from_fen(yuan_to_fen(yuan)?)
    }

    pub fn fen(self) -> i64 {
        self.0
    }

    pub fn yuan(self) -> f64 {
        fen_to_yuan(self.0)
    }
}

impl TryFrom<f64> for PriceIncrease {
    type Error = SchemaError;

    fn try_from(yuan: f64) -> Result<Self, Self::Error> {
        Self::from_yuan(yuan)
    }
}

impl From<PriceIncrease> for f64 {
    fn from(p: PriceIncrease) -> f64 {
        p.yuan()
    }
}

impl std::fmt::Display for PriceIncrease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02} CNY", self.0 / FEN_PER_YUAN, self.0 % FEN_PER_YUAN)
    }
}
