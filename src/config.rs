//! Association configuration types.
//!
//! Platform-independent types describing what a forced-connection attempt
//! asks the network-configuration service for: which access-point slot to
//! allow, which network area to search, and which EULA version to report.
//!
//! # Example
//!
//! ```
//! use sysconfig_menu::config::{ApSlot, AssociationConfig, NETWORK_AREA_INTERNET};
//!
//! let slot = ApSlot::FIRST.next();
//! let config = AssociationConfig::for_slot(slot);
//! assert_eq!(config.allowed_ap_mask, 0b010);
//! assert_eq!(config.network_area, NETWORK_AREA_INTERNET);
//! ```

use std::fmt;

/// Number of pre-configured access-point slots.
pub const AP_SLOT_COUNT: u8 = 3;

/// Network area selecting internet-capable access points.
pub const NETWORK_AREA_INTERNET: u8 = 2;

/// One of the three pre-configured access-point slots.
///
/// Slots are 0-indexed internally and 1-indexed everywhere an operator sees
/// them. Selection is cyclic in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApSlot(u8);

impl ApSlot {
    pub const FIRST: ApSlot = ApSlot(0);

    pub fn new(index: u8) -> Result<Self, ConfigError> {
        if index < AP_SLOT_COUNT {
            Ok(Self(index))
        } else {
            Err(ConfigError::InvalidSlot { index })
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// 1-indexed number shown to the operator.
    pub fn display_number(self) -> u8 {
        self.0 + 1
    }

    /// Next slot, wrapping from the last back to the first.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % AP_SLOT_COUNT)
    }

    /// Previous slot, wrapping from the first back to the last.
    pub fn prev(self) -> Self {
        Self((self.0 + AP_SLOT_COUNT - 1) % AP_SLOT_COUNT)
    }

    /// Single-bit allowed-access-point mask selecting this slot.
    pub fn allow_mask(self) -> u8 {
        1 << self.0
    }
}

impl fmt::Display for ApSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_number())
    }
}

/// EULA version reported with a connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EulaVersion {
    pub major: u8,
    pub minor: u8,
}

impl EulaVersion {
    /// Current default version requested when none is specified.
    pub const CURRENT: EulaVersion = EulaVersion { major: 1, minor: 0 };
}

impl Default for EulaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Parameters handed to the network-configuration service for one connect
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationConfig {
    /// Network area to search.
    pub network_area: u8,
    /// Bitmask of access-point slots the service may use.
    pub allowed_ap_mask: u8,
    /// EULA version reported to the service.
    pub eula_version: EulaVersion,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            network_area: 0,
            allowed_ap_mask: 0,
            eula_version: EulaVersion::CURRENT,
        }
    }
}

impl AssociationConfig {
    /// Default config narrowed to a single slot: internet network area,
    /// allow mask selecting `slot`, current-default EULA version.
    pub fn for_slot(slot: ApSlot) -> Self {
        Self {
            network_area: NETWORK_AREA_INTERNET,
            allowed_ap_mask: slot.allow_mask(),
            ..Self::default()
        }
    }
}

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Slot index outside [0, AP_SLOT_COUNT).
    InvalidSlot { index: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSlot { index } => {
                write!(f, "invalid slot index {} (max {})", index, AP_SLOT_COUNT - 1)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ApSlot Tests ====================

    #[test]
    fn test_slot_bounds() {
        assert!(ApSlot::new(0).is_ok());
        assert!(ApSlot::new(2).is_ok());
        assert_eq!(ApSlot::new(3), Err(ConfigError::InvalidSlot { index: 3 }));
    }

    #[test]
    fn test_slot_wraps_forward() {
        // Three presses of "right" from slot 0 land back on slot 0.
        let slot = ApSlot::FIRST.next().next().next();
        assert_eq!(slot, ApSlot::FIRST);
    }

    #[test]
    fn test_slot_wraps_backward() {
        assert_eq!(ApSlot::FIRST.prev().index(), 2);
        assert_eq!(ApSlot::FIRST.prev().prev().index(), 1);
    }

    #[test]
    fn test_slot_display_is_one_indexed() {
        assert_eq!(ApSlot::FIRST.display_number(), 1);
        assert_eq!(ApSlot::FIRST.prev().display_number(), 3);
        assert_eq!(ApSlot::FIRST.to_string(), "1");
    }

    #[test]
    fn test_allow_mask_selects_single_bit() {
        assert_eq!(ApSlot::new(0).unwrap().allow_mask(), 0b001);
        assert_eq!(ApSlot::new(1).unwrap().allow_mask(), 0b010);
        assert_eq!(ApSlot::new(2).unwrap().allow_mask(), 0b100);
    }

    // ==================== AssociationConfig Tests ====================

    #[test]
    fn test_for_slot_fills_request_fields() {
        let config = AssociationConfig::for_slot(ApSlot::new(2).unwrap());
        assert_eq!(config.network_area, NETWORK_AREA_INTERNET);
        assert_eq!(config.allowed_ap_mask, 0b100);
        assert_eq!(config.eula_version, EulaVersion::CURRENT);
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidSlot { index: 7 };
        assert_eq!(err.to_string(), "invalid slot index 7 (max 2)");
    }
}
