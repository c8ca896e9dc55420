//! Per-service characteristic groups: once validation confirms a service's
//! characteristics are all present, they're bundled here so the rest of the core can check "do I
//! have battery support" with one `Option`/`matches!` instead of re-deriving it from raw UUIDs
//! each time. These are registry-shaped records, not live GATT handles — the adapter still owns
//! the actual characteristic objects, addressed by the UUIDs in [`crate::uuids`].

use crate::types::FeatureSupport;

/// The mandatory Ringly-vendor-service characteristics. Every validated peripheral has these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RinglyCharacteristics {
    pub has_command: bool,
    pub has_message: bool,
    pub has_ancs_v1: bool,
    pub has_ancs_v2: bool,
    pub has_bond: bool,
    pub has_clear_bond: bool,
    pub has_configuration_hash: bool,
}

impl RinglyCharacteristics {
    /// The Ringly service's own invariant: `TooManyAncsNotificationCharacteristicsFound` fires
    /// when a peripheral somehow exposes both the v1 and v2 ANCS characteristics at once.
    pub fn has_exactly_one_ancs_variant(&self) -> bool {
        self.has_ancs_v1 != self.has_ancs_v2
    }
}

/// Battery-service characteristics. Optional at the service level: a peripheral without a
/// battery service simply reports [`FeatureSupport::Unsupported`] everywhere in this group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BatteryCharacteristics {
    pub support: FeatureSupport,
    pub has_state: bool,
    pub has_charge: bool,
}

/// Device Information service characteristics, with per-field version gating since older
/// firmware revisions progressively added MAC address, chip, and bootloader/softdevice version
/// reporting (see `RLYPeripheralDeviceInformation.h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceInformationCharacteristics {
    pub mac_address_support: FeatureSupport,
    pub chip_version_support: FeatureSupport,
    pub bootloader_version_support: FeatureSupport,
    pub softdevice_version_support: FeatureSupport,
}

/// Activity-tracking service characteristics (optional module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActivityCharacteristics {
    pub support: FeatureSupport,
    pub has_control_point: bool,
    pub has_tracking_data: bool,
}

/// Flash-log service characteristics (optional module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LoggingCharacteristics {
    pub support: FeatureSupport,
    pub has_flash: bool,
    pub has_request: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_ancs_variant_rejects_both_and_neither() {
        let mut c = RinglyCharacteristics::default();
        assert!(!c.has_exactly_one_ancs_variant());
        c.has_ancs_v1 = true;
        assert!(c.has_exactly_one_ancs_variant());
        c.has_ancs_v2 = true;
        assert!(!c.has_exactly_one_ancs_variant());
    }
}
