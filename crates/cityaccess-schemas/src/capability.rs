//! Static self-description a provider returns before any stateful call.
//!
//! The "fixed levels present iff mode is FixedLevels" rule is carried by the
//! type: [`PriceIncreasePolicy::FixedLevels`] is the only variant that holds
//! levels, and [`FixedLevels`] cannot be empty. Wire decoding goes through
//! [`CapabilityDescriptor::from_parts`], which rejects both mismatches.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::money::PriceIncrease;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PriceIncreaseMode {
    Forbidden = 0,
    FixedLevels = 1,
    Unrestricted = 2,
}

impl PriceIncreaseMode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PriceIncreaseMode {
    type Error = SchemaError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Forbidden),
            1 => Ok(Self::FixedLevels),
            2 => Ok(Self::Unrestricted),
            other => Err(SchemaError::UnknownPriceModeCode(other)),
        }
    }
}

/// Non-empty, ascending, de-duplicated list of surcharge amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLevels(Vec<PriceIncrease>);

impl FixedLevels {
    pub fn new(levels: impl IntoIterator<Item = PriceIncrease>) -> Result<Self, SchemaError> {
        let mut v: Vec<PriceIncrease> = levels.into_iter().collect();
        if v.is_empty() {
            return Err(SchemaError::EmptyFixedLevels);
        }
        v.sort();
        v.dedup();
        Ok(Self(v))
    }

    pub fn as_slice(&self) -> &[PriceIncrease] {
        &self.0
    }

    pub fn contains(&self, p: PriceIncrease) -> bool {
        self.0.binary_search(&p).is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceIncreasePolicy {
    Forbidden,
    FixedLevels(FixedLevels),
    Unrestricted,
}

impl PriceIncreasePolicy {
    pub fn mode(&self) -> PriceIncreaseMode {
        match self {
            Self::Forbidden => PriceIncreaseMode::Forbidden,
            Self::FixedLevels(_) => PriceIncreaseMode::FixedLevels,
            Self::Unrestricted => PriceIncreaseMode::Unrestricted,
        }
    }

    /// Empty unless the mode is `FixedLevels`.
    pub fn fixed_levels(&self) -> &[PriceIncrease] {
        match self {
            Self::FixedLevels(levels) => levels.as_slice(),
            _ => &[],
        }
    }

    /// Whether a rider-offered surcharge is acceptable under this policy.
    pub fn admits(&self, p: PriceIncrease) -> bool {
        match self {
            Self::Forbidden => false,
            Self::FixedLevels(levels) => levels.contains(p),
            Self::Unrestricted => true,
        }
    }
}

/// Which optional features a provider supports. Stable for the provider's
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CapabilityWire", into = "CapabilityWire")]
pub struct CapabilityDescriptor {
    pub price_increase: PriceIncreasePolicy,
    pub enlarge_search_enabled: bool,
    pub urge_taxi_enabled: bool,
}

impl Default for CapabilityDescriptor {
    fn default() -> Self {
        Self {
            price_increase: PriceIncreasePolicy::Forbidden,
            enlarge_search_enabled: false,
            urge_taxi_enabled: false,
        }
    }
}

impl CapabilityDescriptor {
    /// Assemble a descriptor from the flat vendor representation.
    pub fn from_parts(
        mode: PriceIncreaseMode,
        fixed_levels: Vec<PriceIncrease>,
        enlarge_search_enabled: bool,
        urge_taxi_enabled: bool,
    ) -> Result<Self, SchemaError> {
        let price_increase = match mode {
            PriceIncreaseMode::FixedLevels => {
                PriceIncreasePolicy::FixedLevels(FixedLevels::new(fixed_levels)?)
            }
            other if !fixed_levels.is_empty() => {
                return Err(SchemaError::UnexpectedFixedLevels(other));
            }
            PriceIncreaseMode::Forbidden => PriceIncreasePolicy::Forbidden,
            PriceIncreaseMode::Unrestricted => PriceIncreasePolicy::Unrestricted,
        };
        Ok(Self {
            price_increase,
            enlarge_search_enabled,
            urge_taxi_enabled,
        })
    }

    pub fn price_increase_mode(&self) -> PriceIncreaseMode {
        self.price_increase.mode()
    }

    pub fn fixed_price_increase_levels(&self) -> &[PriceIncrease] {
        self.price_increase.fixed_levels()
    }
}

#[derive(Serialize, Deserialize)]
struct CapabilityWire {
    price_increase_mode: PriceIncreaseMode,
    #[serde(default)]
    fixed_price_increases: Vec<PriceIncrease>,
    #[serde(default)]
    enlarge_search_enabled: bool,
    #[serde(default)]
    urge_taxi_enabled: bool,
}

impl TryFrom<CapabilityWire> for CapabilityDescriptor {
    type Error = SchemaError;

    fn try_from(w: CapabilityWire) -> Result<Self, Self::Error> {
        Self::from_parts(
            w.price_increase_mode,
            w.fixed_price_increases,
            w.enlarge_search_enabled,
            w.urge_taxi_enabled,
        )
    }
}

impl From<CapabilityDescriptor> for CapabilityWire {
    fn from(c: CapabilityDescriptor) -> Self {
        Self {
            price_increase_mode: c.price_increase_mode(),
            fixed_price_increases: c.fixed_price_increase_levels().to_vec(),
            enlarge_search_enabled: c.enlarge_search_enabled,
            urge_taxi_enabled: c.urge_taxi_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yuan(v: f64) -> PriceIncrease {
        PriceIncrease::from_yuan(v).unwrap()
    }

    #[test]
    fn fixed_mode_requires_levels() {
        let err =
            CapabilityDescriptor::from_parts(PriceIncreaseMode::FixedLevels, vec![], true, true)
                .unwrap_err();
        assert_eq!(err, SchemaError::EmptyFixedLevels);
    }

    #[test]
    fn other_modes_reject_levels() {
        for mode in [PriceIncreaseMode::Forbidden, PriceIncreaseMode::Unrestricted] {
            let err = CapabilityDescriptor::from_parts(mode, vec![yuan(5.0)], false, false)
                .unwrap_err();
            assert_eq!(err, SchemaError::UnexpectedFixedLevels(mode));
        }
    }

    #[test]
    fn levels_are_sorted_and_deduplicated() {
        let cap = CapabilityDescriptor::from_parts(
            PriceIncreaseMode::FixedLevels,
            vec![yuan(10.0), yuan(5.0), yuan(10.0)],
            false,
            false,
        )
        .unwrap();
        assert_eq!(cap.fixed_price_increase_levels(), &[yuan(5.0), yuan(10.0)]);
        assert!(cap.price_increase.admits(yuan(5.0)));
        assert!(!cap.price_increase.admits(yuan(7.0)));
    }

    #[test]
    fn default_is_everything_off() {
        let cap = CapabilityDescriptor::default();
        assert_eq!(cap.price_increase_mode(), PriceIncreaseMode::Forbidden);
        assert!(cap.fixed_price_increase_levels().is_empty());
        assert!(!cap.enlarge_search_enabled);
        assert!(!cap.urge_taxi_enabled);
    }

    #[test]
    fn json_decode_enforces_level_invariant() {
        let ok = r#"{"price_increase_mode":"fixed_levels","fixed_price_increases":[5,10],"urge_taxi_enabled":true}"#;
        let cap: CapabilityDescriptor = serde_json::from_str(ok).unwrap();
        assert_eq!(cap.fixed_price_increase_levels().len(), 2);
        assert!(cap.urge_taxi_enabled);
        assert!(!cap.enlarge_search_enabled);

        let bad = r#"{"price_increase_mode":"unrestricted","fixed_price_increases":[5]}"#;
        assert!(serde_json::from_str::<CapabilityDescriptor>(bad).is_err());

        let bad = r#"{"price_increase_mode":"fixed_levels"}"#;
        assert!(serde_json::from_str::<CapabilityDescriptor>(bad).is_err());
    }

    #[test]
    fn numeric_mode_codes() {
        assert_eq!(PriceIncreaseMode::try_from(1).unwrap(), PriceIncreaseMode::FixedLevels);
        assert_eq!(PriceIncreaseMode::Unrestricted.code(), 2);
        assert!(PriceIncreaseMode::try_from(3).is_err());
    }
}
