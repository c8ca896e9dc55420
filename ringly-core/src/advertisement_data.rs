//! Advertisement payload shape, platform-independent. The adapter is responsible for parsing
//! whatever the platform's scan-result representation is (`NSDictionary`, BlueZ D-Bus
//! properties, …) into this plain struct; the core never sees the platform's native type.

use std::collections::HashMap;

use btuuid::BluetoothUuid;

/// Data included in a Bluetooth advertisement or scan response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdvertisementData {
    /// The (possibly shortened) local name of the device (CSS §A.1.2). For Ringly peripherals
    /// this is `RLY-<SHORT>-<MAC4>`; see [`crate::types::appearance_for_short_name`].
    pub local_name: Option<String>,
    /// Manufacturer specific data (CSS §A.1.4)
    pub manufacturer_data: Option<ManufacturerData>,
    /// Service associated data (CSS §A.1.11)
    pub service_data: HashMap<BluetoothUuid, Vec<u8>>,
    /// Advertised GATT service UUIDs (CSS §A.1.1)
    pub service_uuids: Vec<BluetoothUuid>,
    pub overflow_service_uuids: Vec<BluetoothUuid>,
    /// Transmitted power level (CSS §A.1.5)
    pub tx_power_level: Option<i16>,
    /// Set to true for connectable advertising packets
    pub is_connectable: bool,
    /// Solicited GATT service UUIDs (CSS §A.1.10). Recovery-mode peripherals are identified by
    /// one of [`crate::uuids::RECOVERY_SOLICITED_SERVICE_V1`]/`_V2` appearing here rather than
    /// in `service_uuids`.
    pub solicited_service_uuids: Vec<BluetoothUuid>,
}

/// Manufacturer specific data included in Bluetooth advertisements. See the Bluetooth Core
/// Specification Supplement §A.1.4 for details.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ManufacturerData {
    /// Company identifier (defined [here](https://www.bluetooth.com/specifications/assigned-numbers/company-identifiers/))
    pub company_id: u16,
    /// Manufacturer specific data
    pub data: Vec<u8>,
}

impl AdvertisementData {
    /// Whether this advertisement solicits one of the recovery (DFU bootloader) service UUIDs,
    /// identifying a peripheral stuck in recovery mode rather than a normal one.
    pub fn is_recovery_advertisement(&self) -> bool {
        self.solicited_service_uuids.iter().any(|uuid| {
            *uuid == crate::uuids::RECOVERY_SOLICITED_SERVICE_V1
                || *uuid == crate::uuids::RECOVERY_SOLICITED_SERVICE_V2
        })
    }

    /// Whether this advertisement names the Ringly vendor service, identifying a normal
    /// (non-recovery) Ringly peripheral.
    pub fn is_ringly_advertisement(&self) -> bool {
        self.service_uuids.contains(&crate::uuids::RINGLY_SERVICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_advertisement_is_detected_by_solicited_uuid() {
        let mut data = AdvertisementData::default();
        data.solicited_service_uuids
            .push(crate::uuids::RECOVERY_SOLICITED_SERVICE_V1);
        assert!(data.is_recovery_advertisement());
        assert!(!data.is_ringly_advertisement());
    }

    #[test]
    fn ringly_advertisement_is_detected_by_service_uuid() {
        let mut data = AdvertisementData::default();
        data.service_uuids.push(crate::uuids::RINGLY_SERVICE);
        assert!(data.is_ringly_advertisement());
        assert!(!data.is_recovery_advertisement());
    }

    #[test]
    fn default_advertisement_is_neither() {
        let data = AdvertisementData::default();
        assert!(!data.is_recovery_advertisement());
        assert!(!data.is_ringly_advertisement());
    }
}
