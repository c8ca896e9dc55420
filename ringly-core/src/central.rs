//! The fleet manager: owns the injected BLE adapter, the weak `UUID → Peripheral` map,
//! the discovery snapshot (normal and recovery-mode peripherals), and connection orchestration.
//!
//! `Central` never mutates a previously-published [`Discovery`] snapshot in place; every update
//! builds a fresh one and replaces the old, so an observer holding a clone from `discovery()`
//! never sees a value change out from under it mid-read.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use uuid::Uuid;

use crate::adapter::BleAdapter;
use crate::advertisement_data::AdvertisementData;
use crate::ancs_v1::Ancs1AssemblerConfig;
use crate::commands::Command;
use crate::dfu::RecoveryPeripheral;
use crate::error::{AdapterError, Error};
use crate::observer::Observable;
use crate::peripheral::Peripheral;
use crate::types::PeerId;
use crate::uuids::{recovery_solicited_uuids, scan_service_uuids};

/// A peripheral shared between `Central`'s weak map and every caller that holds one.
/// `Arc<Mutex<_>>` makes the reference counting explicit:
/// `Central` downgrades its own copy to a `Weak`, so a peripheral is dropped once every caller
/// (and observer, transitively) has dropped their `Arc`.
pub type PeripheralHandle = Arc<Mutex<Peripheral>>;

/// Receives fleet-level events. Peripheral-level events (writes, messages, validation, ...) are
/// delivered through each peripheral's own [`crate::peripheral::PeripheralObserver`]; this trait
/// only carries events that belong to the fleet as a whole.
pub trait CentralObserver: Send + Sync {
    fn adapter_state_changed(&self, _powered_on: bool) {}
    fn will_connect(&self, _identifier: Uuid) {}
    fn did_connect(&self, _identifier: Uuid) {}
    fn did_fail_to_connect(&self, _identifier: Uuid, _error: Option<&Error>) {}
    fn did_restore_peripherals(&self, _identifiers: &[Uuid]) {}
    fn discovery_updated(&self, _snapshot: &Discovery) {}
}

/// An immutable snapshot of one scan in progress: the peripherals and recovery peripherals seen
/// so far, plus whether scanning is still active. No timestamp is carried (callers that need
/// "how long has this scan run" stamp their own clock at `start_discovery` time; the core keeps
/// no persisted state of its own).
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub peripherals: Vec<Uuid>,
    pub recovery_peripherals: Vec<RecoveryPeripheral>,
    pub is_scanning: bool,
}

/// Configuration passed to `Central` at construction, collecting every tunable into an explicit
/// struct rather than reaching for process-wide state.
#[derive(Debug, Clone)]
pub struct CentralConfig {
    pub ancs_v1: Ancs1AssemblerConfig,
}

/// The fleet manager. Holds the adapter and a weak map so that retrieving the "same" peripheral
/// twice (by discovery, by `retrieve_connected_peripherals`, or by `retrieve_peripheral`) yields
/// the same shared identity rather than a fresh, disconnected copy of it.
pub struct Central {
    adapter: Box<dyn BleAdapter>,
    config: CentralConfig,
    peripherals: HashMap<Uuid, Weak<Mutex<Peripheral>>>,
    peers: HashMap<PeerId, Uuid>,
    discovery: Discovery,
    observers: Observable<dyn CentralObserver>,
}

impl Central {
    pub fn new(adapter: Box<dyn BleAdapter>, config: CentralConfig) -> Self {
        Self {
            adapter,
            config,
            peripherals: HashMap::new(),
            peers: HashMap::new(),
            discovery: Discovery::default(),
            observers: Observable::new(),
        }
    }

    pub fn subscribe(&mut self, observer: &Arc<dyn CentralObserver>) {
        self.observers.subscribe(observer);
    }

    pub fn unsubscribe(&mut self, observer: &Arc<dyn CentralObserver>) {
        self.observers.unsubscribe(observer);
    }

    pub fn is_powered_on(&self) -> bool {
        self.adapter.is_powered_on()
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// A no-op query whose only purpose is to make the adapter surface its own "turn on
    /// Bluetooth" system prompt. Returns whether a prompt would be shown, i.e. whether
    /// the adapter isn't already powered on.
    pub fn prompt_to_power_on_bluetooth(&self) -> bool {
        !self.adapter.is_powered_on()
    }

    /// Begins scanning for the Ringly service UUID and both recovery-mode solicited UUIDs.
    pub fn start_discovery(&mut self) -> Result<(), Error> {
        tracing::debug!("starting discovery");
        self.adapter
            .start_scanning(scan_service_uuids(), recovery_solicited_uuids())?;
        self.discovery = Discovery {
            is_scanning: true,
            ..Discovery::default()
        };
        let snapshot = self.discovery.clone();
        self.observers.dispatch(|o| o.discovery_updated(&snapshot));
        Ok(())
    }

    pub fn stop_discovery(&mut self) -> Result<(), Error> {
        self.adapter.stop_scanning()?;
        self.discovery.is_scanning = false;
        let snapshot = self.discovery.clone();
        self.observers.dispatch(|o| o.discovery_updated(&snapshot));
        Ok(())
    }

    /// Looks up a previously-seen peripheral by identifier without creating one.
    pub fn peripheral(&self, identifier: Uuid) -> Option<PeripheralHandle> {
        self.peripherals.get(&identifier).and_then(Weak::upgrade)
    }

    fn get_or_create(
        &mut self,
        peer: PeerId,
        identifier: Uuid,
        advertised_name: Option<String>,
        assume_paired: bool,
    ) -> PeripheralHandle {
        self.peers.insert(peer, identifier);
        if let Some(existing) = self.peripheral(identifier) {
            return existing;
        }
        let peripheral = Arc::new(Mutex::new(Peripheral::new(
            peer,
            identifier,
            advertised_name,
            assume_paired,
            self.config.ancs_v1,
        )));
        self.peripherals.insert(identifier, Arc::downgrade(&peripheral));
        peripheral
    }

    /// Delivers one scan result from the adapter. Normal Ringly advertisements rehydrate
    /// or create a [`Peripheral`] and add its identifier to the discovery snapshot; recovery
    /// advertisements add a [`RecoveryPeripheral`] instead. The snapshot is rebuilt and replaced
    /// wholesale, never mutated field-by-field, so `discovery_updated` observers always see a
    /// complete, consistent view.
    pub fn handle_scan_result(
        &mut self,
        peer: PeerId,
        identifier: Uuid,
        advertisement: &AdvertisementData,
    ) -> Option<PeripheralHandle> {
        let mut handle = None;
        if advertisement.is_recovery_advertisement() {
            if !self
                .discovery
                .recovery_peripherals
                .iter()
                .any(|r| r.peer == peer)
            {
                self.discovery
                    .recovery_peripherals
                    .push(RecoveryPeripheral { peer });
            }
        } else if advertisement.is_ringly_advertisement() {
            let peripheral =
                self.get_or_create(peer, identifier, advertisement.local_name.clone(), false);
            if !self.discovery.peripherals.contains(&identifier) {
                self.discovery.peripherals.push(identifier);
            }
            handle = Some(peripheral);
        }
        let snapshot = self.discovery.clone();
        self.observers.dispatch(|o| o.discovery_updated(&snapshot));
        handle
    }

    /// Instructs the adapter to connect. Emits `will_connect` synchronously; `did_connect` /
    /// `did_fail_to_connect` are delivered later via [`Self::handle_did_connect`] /
    /// [`Self::handle_did_fail_to_connect`] once the adapter resolves the request.
    pub fn connect(&mut self, peripheral: &PeripheralHandle) -> Result<(), Error> {
        let (peer, identifier) = {
            let p = peripheral.lock().unwrap();
            (p.peer(), p.identifier())
        };
        self.observers.dispatch(|o| o.will_connect(identifier));
        self.adapter.connect(peer).map_err(Error::from)
    }

    pub fn cancel_connection(&mut self, peripheral: &PeripheralHandle) -> Result<(), Error> {
        let peer = peripheral.lock().unwrap().peer();
        self.adapter.cancel_connection(peer)?;
        let identifier = peripheral.lock().unwrap().identifier();
        self.observers.dispatch(|o| o.did_fail_to_connect(identifier, None));
        Ok(())
    }

    /// Delivers a successful connection outcome: marks the peripheral connected (which, inside
    /// [`Peripheral::handle_connected`], kicks off service discovery — the first validation
    /// step) and notifies fleet observers.
    pub fn handle_did_connect(&mut self, identifier: Uuid) -> Result<(), Error> {
        if let Some(peripheral) = self.peripheral(identifier) {
            let mut p = peripheral.lock().unwrap();
            p.handle_connected(self.adapter.as_mut())?;
        }
        self.observers.dispatch(|o| o.did_connect(identifier));
        Ok(())
    }

    pub fn handle_did_fail_to_connect(&mut self, identifier: Uuid, error: Option<Error>) {
        self.observers
            .dispatch(|o| o.did_fail_to_connect(identifier, error.as_ref()));
    }

    /// Delivers a disconnection: resets the peripheral's validation state back to freshly
    /// discovered, with accumulated errors cleared, and fails any in-flight writes.
    pub fn handle_did_disconnect(&mut self, identifier: Uuid) {
        if let Some(peripheral) = self.peripheral(identifier) {
            peripheral.lock().unwrap().handle_disconnected();
        }
    }

    /// Queries the adapter for already-connected peripherals advertising the Ringly service,
    /// rehydrating each into the weak map.
    pub fn retrieve_connected_peripherals(&mut self) -> Vec<PeripheralHandle> {
        let found = self.adapter.retrieve_connected_peripherals(scan_service_uuids());
        found
            .into_iter()
            .map(|(peer, identifier)| self.get_or_create(peer, identifier, None, false))
            .collect()
    }

    /// Resolves a previously-known peripheral by platform identifier. `assume_paired` seeds the
    /// initial `PairState` as `AssumedPaired` for a peripheral this call is creating fresh; it
    /// has no effect on a peripheral the weak map already holds.
    pub fn retrieve_peripheral(&mut self, identifier: Uuid, assume_paired: bool) -> Option<PeripheralHandle> {
        if let Some(existing) = self.peripheral(identifier) {
            return Some(existing);
        }
        let peer = self.adapter.retrieve_peripheral(identifier)?;
        Some(self.get_or_create(peer, identifier, None, assume_paired))
    }

    /// Rehydrates peripherals the adapter restored on cold start. Each restored
    /// peripheral is added to the weak map as already-connected; `did_restore_peripherals` fires
    /// once with every restored identifier, after the map update completes.
    pub fn handle_restore_peripherals(&mut self, restored: &[(PeerId, Uuid, bool)]) {
        let mut identifiers = Vec::with_capacity(restored.len());
        for &(peer, identifier, assume_paired) in restored {
            self.get_or_create(peer, identifier, None, assume_paired);
            identifiers.push(identifier);
        }
        self.observers
            .dispatch(|o| o.did_restore_peripherals(&identifiers));
    }

    pub fn handle_adapter_state_changed(&mut self, powered_on: bool) {
        self.observers.dispatch(|o| o.adapter_state_changed(powered_on));
    }

    /// Looks up `identifier` in the weak map and returns it, or a [`PeripheralError::Disconnected`]
    /// if the peripheral has been dropped or was never discovered.
    fn require_peripheral(&self, identifier: Uuid) -> Result<PeripheralHandle, Error> {
        self.peripheral(identifier)
            .ok_or(Error::Peripheral(crate::error::PeripheralError::Disconnected))
    }

    /// Queues and, if nothing else is in flight, immediately sends one command to `identifier`.
    /// Only `Central` can perform this: it is the sole owner of the adapter the write needs.
    pub fn write_command(&mut self, identifier: Uuid, command: Command) -> Result<(), Error> {
        let peripheral = self.require_peripheral(identifier)?;
        let mut p = peripheral.lock().unwrap();
        p.write_command(self.adapter.as_mut(), command)
    }

    /// Issues reads for every Device Information characteristic `identifier`'s firmware reported
    /// having.
    pub fn read_device_information(&mut self, identifier: Uuid) -> Result<(), Error> {
        let peripheral = self.require_peripheral(identifier)?;
        let mut p = peripheral.lock().unwrap();
        p.read_device_information(self.adapter.as_mut())
    }

    pub fn read_configuration_hash(&mut self, identifier: Uuid) -> Result<(), Error> {
        let peripheral = self.require_peripheral(identifier)?;
        let mut p = peripheral.lock().unwrap();
        p.read_configuration_hash(self.adapter.as_mut())
    }

    pub fn write_configuration_hash(&mut self, identifier: Uuid, hash: u64) -> Result<(), Error> {
        let peripheral = self.require_peripheral(identifier)?;
        let mut p = peripheral.lock().unwrap();
        p.write_configuration_hash(self.adapter.as_mut(), hash)
    }

    pub fn read_flash_log(&mut self, identifier: Uuid) -> Result<(), Error> {
        let peripheral = self.require_peripheral(identifier)?;
        let mut p = peripheral.lock().unwrap();
        p.read_flash_log(self.adapter.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockAdapter;
    use crate::ancs_v1::ReferenceDate;
    use std::sync::Mutex as StdMutex;
    use uuid::Uuid;

    fn config() -> CentralConfig {
        CentralConfig {
            ancs_v1: Ancs1AssemblerConfig {
                include_flags: false,
                reference: ReferenceDate { year: 2026, month: 7 },
            },
        }
    }

    fn ringly_advertisement(name: &str) -> AdvertisementData {
        AdvertisementData {
            local_name: Some(name.to_string()),
            service_uuids: vec![crate::uuids::RINGLY_SERVICE],
            ..AdvertisementData::default()
        }
    }

    fn recovery_advertisement() -> AdvertisementData {
        AdvertisementData {
            solicited_service_uuids: vec![crate::uuids::RECOVERY_SOLICITED_SERVICE_V1],
            ..AdvertisementData::default()
        }
    }

    #[test]
    fn discovering_the_same_identifier_twice_yields_the_same_peripheral() {
        let mut central = Central::new(Box::new(MockAdapter::new()), config());
        central.start_discovery().unwrap();
        let peer = PeerId::from_raw(1);
        let identifier = Uuid::from_u128(1);
        let ad = ringly_advertisement("RLY-DAYD-ABCD");

        let first = central.handle_scan_result(peer, identifier, &ad).unwrap();
        let second = central.handle_scan_result(peer, identifier, &ad).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(central.discovery().peripherals, vec![identifier]);
    }

    #[test]
    fn recovery_advertisement_populates_recovery_peripherals_not_peripherals() {
        let mut central = Central::new(Box::new(MockAdapter::new()), config());
        central.start_discovery().unwrap();
        let peer = PeerId::from_raw(2);
        let identifier = Uuid::from_u128(2);
        let handle = central.handle_scan_result(peer, identifier, &recovery_advertisement());
        assert!(handle.is_none());
        assert!(central.discovery().peripherals.is_empty());
        assert_eq!(central.discovery().recovery_peripherals.len(), 1);
        assert_eq!(central.discovery().recovery_peripherals[0].peer, peer);
    }

    #[test]
    fn dropping_every_handle_lets_the_weak_map_entry_die() {
        let mut central = Central::new(Box::new(MockAdapter::new()), config());
        let identifier = Uuid::from_u128(3);
        let handle = central.handle_scan_result(PeerId::from_raw(3), identifier, &ringly_advertisement("RLY-DAYD-ABCD"));
        drop(handle);
        assert!(central.peripheral(identifier).is_none());
    }

    #[test]
    fn connect_emits_will_connect_and_routes_through_the_adapter() {
        let mut central = Central::new(Box::new(MockAdapter::new()), config());
        let identifier = Uuid::from_u128(4);
        let peer = PeerId::from_raw(4);
        let peripheral = central
            .handle_scan_result(peer, identifier, &ringly_advertisement("RLY-DAYD-ABCD"))
            .unwrap();

        #[derive(Default)]
        struct Recorder(StdMutex<Vec<String>>);
        impl CentralObserver for Recorder {
            fn will_connect(&self, _id: Uuid) {
                self.0.lock().unwrap().push("will_connect".into());
            }
            fn did_connect(&self, _id: Uuid) {
                self.0.lock().unwrap().push("did_connect".into());
            }
        }
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn CentralObserver> = recorder.clone();
        central.subscribe(&observer);

        central.connect(&peripheral).unwrap();
        central.handle_did_connect(identifier).unwrap();

        assert_eq!(*recorder.0.lock().unwrap(), vec!["will_connect", "did_connect"]);
        assert!(peripheral.lock().unwrap().is_validated() == false);
        assert_eq!(
            peripheral.lock().unwrap().validation_state(),
            crate::validation::ValidationState::WaitingForServices
        );
    }

    #[test]
    fn retrieve_peripheral_with_assume_paired_seeds_assumed_paired_state() {
        let mut adapter = MockAdapter::new();
        adapter.connected.push(PeerId::from_raw(5));
        let identifier = Uuid::from_u128(5);
        let peer = PeerId::from_raw(5);

        struct AdapterWithKnownPeer(MockAdapter, Uuid);
        // `MockAdapter::retrieve_peripheral` always returns `None`; wrap it so the test can
        // exercise `Central::retrieve_peripheral`'s "adapter resolves it" path directly.
        impl crate::adapter::BleAdapter for AdapterWithKnownPeer {
            fn start_scanning(&mut self, s: &[btuuid::BluetoothUuid], so: &[btuuid::BluetoothUuid]) -> Result<(), AdapterError> {
                self.0.start_scanning(s, so)
            }
            fn stop_scanning(&mut self) -> Result<(), AdapterError> {
                self.0.stop_scanning()
            }
            fn connect(&mut self, peer: PeerId) -> Result<(), AdapterError> {
                self.0.connect(peer)
            }
            fn cancel_connection(&mut self, peer: PeerId) -> Result<(), AdapterError> {
                self.0.cancel_connection(peer)
            }
            fn discover_services(&mut self, peer: PeerId) -> Result<(), AdapterError> {
                self.0.discover_services(peer)
            }
            fn discover_characteristics(&mut self, peer: PeerId, service: btuuid::BluetoothUuid) -> Result<(), AdapterError> {
                self.0.discover_characteristics(peer, service)
            }
            fn write_characteristic(&mut self, peer: PeerId, uuid: btuuid::BluetoothUuid, value: &[u8], with_response: bool) -> Result<(), AdapterError> {
                self.0.write_characteristic(peer, uuid, value, with_response)
            }
            fn read_characteristic(&mut self, peer: PeerId, uuid: btuuid::BluetoothUuid) -> Result<(), AdapterError> {
                self.0.read_characteristic(peer, uuid)
            }
            fn set_notify(&mut self, peer: PeerId, uuid: btuuid::BluetoothUuid, enabled: bool) -> Result<(), AdapterError> {
                self.0.set_notify(peer, uuid, enabled)
            }
            fn is_powered_on(&self) -> bool {
                self.0.is_powered_on()
            }
            fn retrieve_connected_peripherals(&self, service_uuids: &[btuuid::BluetoothUuid]) -> Vec<(PeerId, Uuid)> {
                self.0.retrieve_connected_peripherals(service_uuids)
            }
            fn retrieve_peripheral(&self, identifier: Uuid) -> Option<PeerId> {
                (identifier == self.1).then_some(PeerId::from_raw(5))
            }
        }

        let _ = peer;
        let mut central = Central::new(Box::new(AdapterWithKnownPeer(adapter, identifier)), config());
        let handle = central.retrieve_peripheral(identifier, true).unwrap();
        assert_eq!(handle.lock().unwrap().pair_state(), crate::types::PairState::AssumedPaired);
    }

    #[test]
    fn restoring_peripherals_notifies_observers_with_every_identifier() {
        let mut central = Central::new(Box::new(MockAdapter::new()), config());

        #[derive(Default)]
        struct Recorder(StdMutex<Vec<Uuid>>);
        impl CentralObserver for Recorder {
            fn did_restore_peripherals(&self, ids: &[Uuid]) {
                self.0.lock().unwrap().extend_from_slice(ids);
            }
        }
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn CentralObserver> = recorder.clone();
        central.subscribe(&observer);

        let a = Uuid::from_u128(10);
        let b = Uuid::from_u128(11);
        central.handle_restore_peripherals(&[
            (PeerId::from_raw(10), a, true),
            (PeerId::from_raw(11), b, false),
        ]);

        assert_eq!(*recorder.0.lock().unwrap(), vec![a, b]);
        assert!(central.peripheral(a).is_some());
        assert!(central.peripheral(b).is_some());
    }
}
