//! The static service/characteristic UUID registry. Every Ringly peripheral exposes a
//! fixed set of GATT services and characteristics; this table names them all so the validation
//! pipeline and the adapter-facing discovery calls never hand-roll a UUID literal twice.
//!
//! Long-form (128-bit) UUIDs are the ones actually advertised by Ringly hardware. Where a
//! standard Bluetooth SIG 16-bit UUID also exists for the same role (battery, device
//! information), both are exposed: the adapter should prefer the 16-bit form when scanning,
//! since that's what's in the advertisement packet, but discovery-by-UUID accepts either.

use btuuid::BluetoothUuid;

const fn uuid128(bytes: [u8; 16]) -> BluetoothUuid {
    BluetoothUuid::Uuid128(u128::from_be_bytes(bytes))
}

const fn uuid16(value: u16) -> BluetoothUuid {
    BluetoothUuid::Uuid16(value)
}

/// The Ringly vendor service.
pub const RINGLY_SERVICE: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x10\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const RINGLY_COMMAND_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x10\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const RINGLY_MESSAGE_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x10\x02\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const RINGLY_ANCS_V1_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x10\x03\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const RINGLY_ANCS_V2_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x10\x04\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const RINGLY_BOND_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x10\x05\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const RINGLY_CLEAR_BOND_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x10\x06\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const RINGLY_CONFIGURATION_HASH_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x10\x07\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");

/// Bluetooth SIG standard Battery service (`0x180F`).
pub const BATTERY_SERVICE: BluetoothUuid = uuid16(0x180F);
/// Bluetooth SIG standard Battery Level characteristic (`0x2A19`), used here as the charge value.
pub const BATTERY_CHARGE_CHARACTERISTIC: BluetoothUuid = uuid16(0x2A19);
/// Vendor-specific battery state characteristic (not in the SIG battery service).
pub const BATTERY_STATE_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x20\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");

/// Bluetooth SIG standard Device Information service (`0x180A`).
pub const DEVICE_INFORMATION_SERVICE: BluetoothUuid = uuid16(0x180A);
/// Vendor MAC-address characteristic; not a standard DIS characteristic.
pub const DEVICE_MAC_ADDRESS_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x20\x02\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
/// Firmware Revision String (`0x2A26`), used for the application version.
pub const DEVICE_APPLICATION_VERSION_CHARACTERISTIC: BluetoothUuid = uuid16(0x2A26);
/// Hardware Revision String (`0x2A27`).
pub const DEVICE_HARDWARE_VERSION_CHARACTERISTIC: BluetoothUuid = uuid16(0x2A27);
pub const DEVICE_CHIP_VERSION_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x20\x03\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
/// Software Revision String (`0x2A28`), used for the bootloader version.
pub const DEVICE_BOOTLOADER_VERSION_CHARACTERISTIC: BluetoothUuid = uuid16(0x2A28);
pub const DEVICE_SOFTDEVICE_VERSION_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x20\x04\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
/// Manufacturer Name String (`0x2A29`).
pub const DEVICE_MANUFACTURER_CHARACTERISTIC: BluetoothUuid = uuid16(0x2A29);

/// Optional activity-tracking service.
pub const ACTIVITY_SERVICE: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x30\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const ACTIVITY_CONTROL_POINT_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x30\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const ACTIVITY_TRACKING_DATA_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x30\x02\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");

/// Optional flash-log service.
pub const LOGGING_SERVICE: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x40\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const LOGGING_FLASH_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x40\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const LOGGING_REQUEST_CHARACTERISTIC: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x40\x02\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");

/// Recovery-mode (DFU bootloader) solicited service UUIDs, one per known hardware version.
/// Central filters discovery on these in addition to [`RINGLY_SERVICE`] so that peripherals
/// stuck in recovery mode are still surfaced (as recovery peripherals, not normal ones).
pub const RECOVERY_SOLICITED_SERVICE_V1: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x50\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
pub const RECOVERY_SOLICITED_SERVICE_V2: BluetoothUuid =
    uuid128(*b"\xA1\x9B\x50\x02\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");

/// The UUIDs Central scans for when discovering normal (non-recovery) Ringly peripherals.
pub fn scan_service_uuids() -> &'static [BluetoothUuid] {
    &[RINGLY_SERVICE]
}

/// The solicited UUIDs Central scans for when discovering recovery-mode peripherals.
pub fn recovery_solicited_uuids() -> &'static [BluetoothUuid] {
    &[RECOVERY_SOLICITED_SERVICE_V1, RECOVERY_SOLICITED_SERVICE_V2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_entries_are_distinct() {
        let all = [
            RINGLY_SERVICE,
            RINGLY_COMMAND_CHARACTERISTIC,
            RINGLY_MESSAGE_CHARACTERISTIC,
            RINGLY_ANCS_V1_CHARACTERISTIC,
            RINGLY_ANCS_V2_CHARACTERISTIC,
            RINGLY_BOND_CHARACTERISTIC,
            RINGLY_CLEAR_BOND_CHARACTERISTIC,
            RINGLY_CONFIGURATION_HASH_CHARACTERISTIC,
            BATTERY_SERVICE,
            BATTERY_CHARGE_CHARACTERISTIC,
            BATTERY_STATE_CHARACTERISTIC,
            DEVICE_INFORMATION_SERVICE,
            ACTIVITY_SERVICE,
            LOGGING_SERVICE,
            RECOVERY_SOLICITED_SERVICE_V1,
            RECOVERY_SOLICITED_SERVICE_V2,
        ];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "duplicate UUID at {i} and {j}");
                }
            }
        }
    }
}
