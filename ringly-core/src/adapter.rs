//! The injected BLE transport boundary. Everything above this trait
//! is platform-agnostic; everything below it is the caller's problem (CoreBluetooth, BlueZ,
//! a mock for tests). This plays the role `CBCentralManager`/`CBPeripheral` play on Apple
//! platforms, but as a plain trait object instead of an FFI binding to one specific OS.

use crate::error::AdapterError;
use crate::types::PeerId;
use btuuid::BluetoothUuid;
use uuid::Uuid;

/// A single characteristic write or read request, addressed by peripheral and UUID. The adapter
/// owns GATT traversal (service → characteristic); the core never needs a live handle to either.
pub trait BleAdapter: Send {
    /// Begins scanning for peripherals advertising any of `service_uuids`, or any of
    /// `solicited_uuids` as a solicited-services entry (used for recovery-mode peripherals).
    fn start_scanning(
        &mut self,
        service_uuids: &[BluetoothUuid],
        solicited_uuids: &[BluetoothUuid],
    ) -> Result<(), AdapterError>;

    fn stop_scanning(&mut self) -> Result<(), AdapterError>;

    fn connect(&mut self, peer: PeerId) -> Result<(), AdapterError>;

    fn cancel_connection(&mut self, peer: PeerId) -> Result<(), AdapterError>;

    /// Begins GATT service discovery on `peer`. Results are delivered out-of-band, via whatever
    /// event-delivery method the embedder calls on the relevant `Peripheral` once the platform's
    /// discovery callback fires (see `Peripheral::handle_services_discovered`).
    fn discover_services(&mut self, peer: PeerId) -> Result<(), AdapterError>;

    /// Begins characteristic discovery for one already-discovered service on `peer`.
    fn discover_characteristics(&mut self, peer: PeerId, service: BluetoothUuid) -> Result<(), AdapterError>;

    /// Writes `value` to the characteristic `uuid` on `peer`. `with_response` selects
    /// write-with-response vs. write-without-response.
    fn write_characteristic(
        &mut self,
        peer: PeerId,
        uuid: BluetoothUuid,
        value: &[u8],
        with_response: bool,
    ) -> Result<(), AdapterError>;

    fn read_characteristic(&mut self, peer: PeerId, uuid: BluetoothUuid) -> Result<(), AdapterError>;

    fn set_notify(&mut self, peer: PeerId, uuid: BluetoothUuid, enabled: bool) -> Result<(), AdapterError>;

    /// Whether the local adapter's radio is currently usable (`CBManagerStatePoweredOn`
    /// equivalent). Callers poll this rather than receiving a push, since the push side is
    /// delivered through the observer machinery instead.
    fn is_powered_on(&self) -> bool;

    /// Synchronously returns the already-connected peripherals advertising any of
    /// `service_uuids`, paired with the platform identifier each was assigned at discovery time.
    /// Unlike scanning, this is a direct query with no corresponding discovery callback, mirroring
    /// `-[CBCentralManager retrieveConnectedPeripheralsWithServices:]`.
    fn retrieve_connected_peripherals(&self, service_uuids: &[BluetoothUuid]) -> Vec<(PeerId, Uuid)>;

    /// Synchronously resolves a previously-known peripheral by its platform identifier, if the
    /// adapter still has a handle to it. Mirrors
    /// `-[CBCentralManager retrievePeripheralsWithIdentifiers:]` narrowed to a single lookup.
    fn retrieve_peripheral(&self, identifier: Uuid) -> Option<PeerId>;
}

/// An in-memory [`BleAdapter`] for tests: records every call it receives and never talks to real
/// hardware. Fakes the boundary so the logic above it can be tested without a live radio.
#[derive(Debug, Default)]
pub struct MockAdapter {
    pub powered_on: bool,
    pub scanning: bool,
    pub connected: Vec<PeerId>,
    pub writes: Vec<(PeerId, BluetoothUuid, Vec<u8>, bool)>,
    pub notify_subscriptions: Vec<(PeerId, BluetoothUuid, bool)>,
    pub discover_services_calls: Vec<PeerId>,
    pub discover_characteristics_calls: Vec<(PeerId, BluetoothUuid)>,
    /// Peripherals the adapter "already knows about" for `retrieve_connected_peripherals` /
    /// `retrieve_peripheral` to resolve, independent of live scan/connect state. Tests populate
    /// this directly rather than going through a scan.
    pub known_peripherals: Vec<(PeerId, Uuid)>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            powered_on: true,
            ..Self::default()
        }
    }
}

impl BleAdapter for MockAdapter {
    fn start_scanning(
        &mut self,
        _service_uuids: &[BluetoothUuid],
        _solicited_uuids: &[BluetoothUuid],
    ) -> Result<(), AdapterError> {
        self.scanning = true;
        Ok(())
    }

    fn stop_scanning(&mut self) -> Result<(), AdapterError> {
        self.scanning = false;
        Ok(())
    }

    fn connect(&mut self, peer: PeerId) -> Result<(), AdapterError> {
        self.connected.push(peer);
        Ok(())
    }

    fn cancel_connection(&mut self, peer: PeerId) -> Result<(), AdapterError> {
        self.connected.retain(|p| *p != peer);
        Ok(())
    }

    fn discover_services(&mut self, peer: PeerId) -> Result<(), AdapterError> {
        self.discover_services_calls.push(peer);
        Ok(())
    }

    fn discover_characteristics(&mut self, peer: PeerId, service: BluetoothUuid) -> Result<(), AdapterError> {
        self.discover_characteristics_calls.push((peer, service));
        Ok(())
    }

    fn write_characteristic(
        &mut self,
        peer: PeerId,
        uuid: BluetoothUuid,
        value: &[u8],
        with_response: bool,
    ) -> Result<(), AdapterError> {
        self.writes.push((peer, uuid, value.to_vec(), with_response));
        Ok(())
    }

    fn read_characteristic(&mut self, _peer: PeerId, _uuid: BluetoothUuid) -> Result<(), AdapterError> {
        Ok(())
    }

    fn set_notify(&mut self, peer: PeerId, uuid: BluetoothUuid, enabled: bool) -> Result<(), AdapterError> {
        self.notify_subscriptions.push((peer, uuid, enabled));
        Ok(())
    }

    fn is_powered_on(&self) -> bool {
        self.powered_on
    }

    fn retrieve_connected_peripherals(&self, _service_uuids: &[BluetoothUuid]) -> Vec<(PeerId, Uuid)> {
        self.known_peripherals
            .iter()
            .filter(|(peer, _)| self.connected.contains(peer))
            .copied()
            .collect()
    }

    fn retrieve_peripheral(&self, identifier: Uuid) -> Option<PeerId> {
        self.known_peripherals
            .iter()
            .find(|(_, id)| *id == identifier)
            .map(|(peer, _)| *peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uuids::RINGLY_SERVICE;

    #[test]
    fn mock_adapter_records_scanning() {
        let mut adapter = MockAdapter::new();
        adapter.start_scanning(&[RINGLY_SERVICE], &[]).unwrap();
        assert!(adapter.scanning);
        adapter.stop_scanning().unwrap();
        assert!(!adapter.scanning);
    }

    #[test]
    fn mock_adapter_tracks_connect_and_cancel() {
        let mut adapter = MockAdapter::new();
        let peer = PeerId::from_raw(1);
        adapter.connect(peer).unwrap();
        assert_eq!(adapter.connected, vec![peer]);
        adapter.cancel_connection(peer).unwrap();
        assert!(adapter.connected.is_empty());
    }

    #[test]
    fn mock_adapter_records_writes_verbatim() {
        let mut adapter = MockAdapter::new();
        let peer = PeerId::from_raw(7);
        adapter
            .write_characteristic(peer, RINGLY_SERVICE, &[1, 2, 3], true)
            .unwrap();
        assert_eq!(adapter.writes.len(), 1);
        assert_eq!(adapter.writes[0].2, vec![1, 2, 3]);
    }

    #[test]
    fn mock_adapter_records_service_and_characteristic_discovery() {
        let mut adapter = MockAdapter::new();
        let peer = PeerId::from_raw(3);
        adapter.discover_services(peer).unwrap();
        adapter.discover_characteristics(peer, RINGLY_SERVICE).unwrap();
        assert_eq!(adapter.discover_services_calls, vec![peer]);
        assert_eq!(adapter.discover_characteristics_calls, vec![(peer, RINGLY_SERVICE)]);
    }

    #[test]
    fn retrieve_connected_peripherals_only_returns_connected_known_peers() {
        let mut adapter = MockAdapter::new();
        let connected_peer = PeerId::from_raw(1);
        let disconnected_peer = PeerId::from_raw(2);
        let connected_id = Uuid::from_u128(1);
        let disconnected_id = Uuid::from_u128(2);
        adapter.known_peripherals = vec![(connected_peer, connected_id), (disconnected_peer, disconnected_id)];
        adapter.connected.push(connected_peer);

        let found = adapter.retrieve_connected_peripherals(&[RINGLY_SERVICE]);
        assert_eq!(found, vec![(connected_peer, connected_id)]);
    }

    #[test]
    fn retrieve_peripheral_resolves_a_known_identifier() {
        let mut adapter = MockAdapter::new();
        let peer = PeerId::from_raw(9);
        let identifier = Uuid::from_u128(9);
        adapter.known_peripherals.push((peer, identifier));

        assert_eq!(adapter.retrieve_peripheral(identifier), Some(peer));
        assert_eq!(adapter.retrieve_peripheral(Uuid::from_u128(404)), None);
    }
}
