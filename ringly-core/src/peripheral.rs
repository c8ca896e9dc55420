//! The per-peripheral state container: identity, device information cache,
//! battery, pairing, ANCS mode, the validation pipeline, and the operations a connected
//! peripheral exposes (serialized command writes, inbound message routing, ANCS/activity
//! integration, configuration-hash and flash-log reads).
//!
//! Event delivery methods take `&mut self`, using the borrow checker in place of a serial
//! dispatch queue: whoever holds the `&mut Peripheral` is, by construction, the only
//! party allowed to deliver an event into it at that moment. [`crate::central::Central`] is
//! normally that sole owner.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use btuuid::BluetoothUuid;
use uuid::Uuid;

use crate::activity::ActivitySample;
use crate::adapter::BleAdapter;
use crate::ancs::AncsNotification;
use crate::ancs_v1::{Ancs1AssemblerConfig, AncsV1Assembler};
use crate::characteristics::{
    ActivityCharacteristics, BatteryCharacteristics, DeviceInformationCharacteristics,
    LoggingCharacteristics, RinglyCharacteristics,
};
use crate::commands::Command;
use crate::error::{AdapterError, Error, PeripheralError};
use crate::message::Message;
use crate::observer::Observable;
use crate::types::{
    appearance_for_short_name, parse_advertised_name, AncsNotificationMode, Appearance,
    BatteryState, ConnectionState, FeatureSupport, PairState, PeerId, ShutdownReason,
};
use crate::uuids::*;
use crate::validation::{BlockedOn, Validation, ValidationState};

/// Version and MAC-address strings read from the Device Information service. Present fields are
/// gated by [`DeviceInformationCharacteristics`]'s `FeatureSupport` flags; a `None` here can mean
/// either "not yet read" or "unsupported by this firmware".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub application_version: Option<String>,
    pub hardware_version: Option<String>,
    pub bootloader_version: Option<String>,
    pub softdevice_version: Option<String>,
    pub chip_version: Option<String>,
    pub mac_address: Option<String>,
    pub manufacturer: Option<String>,
}

/// Receives events from one [`Peripheral`]. Every method has an empty default body:
/// implementors override only the callbacks they care about.
/// Callbacks are identified by `identifier` rather than by a borrowed `&Peripheral`, since an
/// event-delivery method that needs `&mut self` on the peripheral cannot simultaneously hand
/// observers a live `&self` to the same value; an observer that wants the full current state
/// looks it up through `Central` by `identifier`.
pub trait PeripheralObserver: Send + Sync {
    fn will_write_command(&self, _identifier: Uuid, _command: &Command) {}
    fn did_write_command(&self, _identifier: Uuid, _command: &Command) {}
    fn failed_to_write_command(&self, _identifier: Uuid, _command: &Command, _error: &Error) {}
    fn did_receive_message(&self, _identifier: Uuid, _message: &Message) {}
    fn did_receive_ancs_notification(&self, _identifier: Uuid, _notification: &AncsNotification) {}
    fn did_receive_activity_samples(&self, _identifier: Uuid, _samples: &[ActivitySample]) {}
    fn did_update_validation_state(&self, _identifier: Uuid, _state: ValidationState) {}
    fn did_update_battery(&self, _identifier: Uuid, _charge: Option<u8>, _state: Option<BatteryState>) {}
    fn did_read_configuration_hash(&self, _identifier: Uuid, _hash: Result<u64, Error>) {}
    fn did_read_flash_log_data(&self, _identifier: Uuid, _data: &[u8]) {}
    fn did_disconnect(&self, _identifier: Uuid) {}
}

/// One physical peripheral's locally-tracked state.
pub struct Peripheral {
    peer: PeerId,
    identifier: Uuid,
    advertised_name: Option<String>,
    short_name: Option<String>,
    last_four_mac: Option<String>,
    appearance: Appearance,

    connection_state: ConnectionState,
    pair_state: PairState,
    ancs_mode: AncsNotificationMode,
    last_shutdown_reason: ShutdownReason,
    validation: Validation,

    ringly: RinglyCharacteristics,
    battery_characteristics: BatteryCharacteristics,
    device_characteristics: DeviceInformationCharacteristics,
    activity_characteristics: ActivityCharacteristics,
    logging_characteristics: LoggingCharacteristics,

    discovered_services: HashSet<BluetoothUuid>,
    awaiting_characteristics: HashSet<BluetoothUuid>,
    awaiting_notification_confirmations: HashSet<BluetoothUuid>,

    battery_charge: Option<u8>,
    battery_state: Option<BatteryState>,
    device_info: DeviceInfo,

    ancs_v1: AncsV1Assembler,
    pending_ancs_v2_counts: Option<(u32, u32)>,

    pending_writes: VecDeque<Command>,
    observers: Observable<dyn PeripheralObserver>,
}

impl Peripheral {
    /// Constructs a freshly discovered peripheral. `assume_paired` mirrors
    /// `Central::retrieve_peripheral`'s parameter of the same name: when the caller already
    /// knows (from its own persisted state) that this peripheral is paired, the initial
    /// `PairState` starts as `AssumedPaired` instead of `AssumedUnpaired`.
    pub fn new(
        peer: PeerId,
        identifier: Uuid,
        advertised_name: Option<String>,
        assume_paired: bool,
        ancs_v1_config: Ancs1AssemblerConfig,
    ) -> Self {
        let parsed = advertised_name.as_deref().and_then(parse_advertised_name);
        let (short_name, last_four_mac) = match parsed {
            Some((short, mac)) => (Some(short), Some(mac)),
            None => (None, None),
        };
        let appearance = appearance_for_short_name(short_name.as_deref().unwrap_or(""));

        Self {
            peer,
            identifier,
            advertised_name,
            short_name,
            last_four_mac,
            appearance,
            connection_state: ConnectionState::default(),
            pair_state: if assume_paired {
                PairState::AssumedPaired
            } else {
                PairState::default()
            },
            ancs_mode: AncsNotificationMode::default(),
            last_shutdown_reason: ShutdownReason::default(),
            validation: Validation::new(),
            ringly: RinglyCharacteristics::default(),
            battery_characteristics: BatteryCharacteristics::default(),
            device_characteristics: DeviceInformationCharacteristics::default(),
            activity_characteristics: ActivityCharacteristics::default(),
            logging_characteristics: LoggingCharacteristics::default(),
            discovered_services: HashSet::new(),
            awaiting_characteristics: HashSet::new(),
            awaiting_notification_confirmations: HashSet::new(),
            battery_charge: None,
            battery_state: None,
            device_info: DeviceInfo::default(),
            ancs_v1: AncsV1Assembler::new(ancs_v1_config),
            pending_ancs_v2_counts: None,
            pending_writes: VecDeque::new(),
            observers: Observable::new(),
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn identifier(&self) -> Uuid {
        self.identifier
    }

    pub fn advertised_name(&self) -> Option<&str> {
        self.advertised_name.as_deref()
    }

    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    pub fn last_four_mac(&self) -> Option<&str> {
        self.last_four_mac.as_deref()
    }

    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn pair_state(&self) -> PairState {
        self.pair_state
    }

    pub fn is_paired(&self) -> bool {
        self.pair_state.is_paired()
    }

    pub fn ancs_mode(&self) -> AncsNotificationMode {
        self.ancs_mode
    }

    pub fn last_shutdown_reason(&self) -> ShutdownReason {
        self.last_shutdown_reason
    }

    pub fn validation_state(&self) -> ValidationState {
        self.validation.state()
    }

    pub fn validation_blocked_on(&self) -> Option<BlockedOn> {
        self.validation.blocked_on()
    }

    pub fn validation_errors(&self) -> &[PeripheralError] {
        self.validation.validation_errors()
    }

    pub fn is_validated(&self) -> bool {
        self.validation.is_validated()
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn battery_charge(&self) -> Option<u8> {
        self.battery_charge
    }

    pub fn battery_state(&self) -> Option<BatteryState> {
        self.battery_state
    }

    pub fn ringly_characteristics(&self) -> RinglyCharacteristics {
        self.ringly
    }

    pub fn subscribe(&mut self, observer: &Arc<dyn PeripheralObserver>) {
        self.observers.subscribe(observer);
    }

    pub fn unsubscribe(&mut self, observer: &Arc<dyn PeripheralObserver>) {
        self.observers.unsubscribe(observer);
    }

    /// A per-peripheral tracing span, opened fresh for each event-delivery call
    /// rather than held open across the peripheral's lifetime, since nothing here is a single
    /// long-lived task worth instrumenting as one span.
    fn span(&self) -> tracing::Span {
        tracing::info_span!("peripheral", uuid = %self.identifier)
    }

    /// Marks the peripheral connected and kicks off service discovery, the first step of the
    /// validation pipeline.
    pub fn handle_connected(&mut self, adapter: &mut dyn BleAdapter) -> Result<(), Error> {
        let _enter = self.span().entered();
        self.connection_state = ConnectionState::Connected;
        self.validation.start_discovering_services();
        adapter.discover_services(self.peer)?;
        self.dispatch_validation_state();
        Ok(())
    }

    /// Resets validation and fails every in-flight write with `Disconnected`: disconnection is
    /// treated as universal cancellation of anything still in flight.
    pub fn handle_disconnected(&mut self) {
        let _enter = self.span().entered();
        tracing::debug!("peripheral disconnected");
        self.connection_state = ConnectionState::Disconnected;
        self.validation.reset();
        self.discovered_services.clear();
        self.awaiting_characteristics.clear();
        self.awaiting_notification_confirmations.clear();
        self.ancs_v1.reset();
        self.pending_ancs_v2_counts = None;

        let failed: Vec<Command> = self.pending_writes.drain(..).collect();
        for command in &failed {
            self.dispatch_failed_write(command, &Error::Peripheral(PeripheralError::Disconnected));
        }

        let id = self.identifier;
        self.observers.dispatch(|o| o.did_disconnect(id));
    }

    /// Records the services discovered on this peripheral and, if every required service is
    /// present, begins characteristic discovery for each one.
    pub fn handle_services_discovered(
        &mut self,
        adapter: &mut dyn BleAdapter,
        services: &[BluetoothUuid],
    ) -> Result<(), Error> {
        self.discovered_services = services.iter().copied().collect();

        if self.discovered_services.is_empty() {
            self.validation.record_error(PeripheralError::NoServicesFound);
            self.dispatch_validation_state();
            return Ok(());
        }

        let required = [
            (RINGLY_SERVICE, PeripheralError::RinglyServiceNotFound),
            (BATTERY_SERVICE, PeripheralError::BatteryServiceNotFound),
            (
                DEVICE_INFORMATION_SERVICE,
                PeripheralError::DeviceInformationServiceNotFound,
            ),
        ];
        for (uuid, error) in required {
            if !self.discovered_services.contains(&uuid) {
                self.validation.record_error(error);
            }
        }
        if self.validation.state() == ValidationState::HasValidationErrors {
            self.dispatch_validation_state();
            return Ok(());
        }

        self.awaiting_characteristics = self
            .discovered_services
            .iter()
            .copied()
            .filter(|uuid| {
                matches!(
                    *uuid,
                    RINGLY_SERVICE | BATTERY_SERVICE | DEVICE_INFORMATION_SERVICE | ACTIVITY_SERVICE
                        | LOGGING_SERVICE
                )
            })
            .collect();
        self.validation.waiting_for(BlockedOn::RinglyService);

        for service in self.awaiting_characteristics.clone() {
            adapter.discover_characteristics(self.peer, service)?;
        }
        self.dispatch_validation_state();
        Ok(())
    }

    /// Records one service's discovered characteristics. Once every outstanding service has
    /// reported, subscribes to notifications on the characteristics that need them.
    pub fn handle_characteristics_discovered(
        &mut self,
        adapter: &mut dyn BleAdapter,
        service: BluetoothUuid,
        characteristics: &[BluetoothUuid],
    ) -> Result<(), Error> {
        let has = |uuid| characteristics.contains(&uuid);

        match service {
            RINGLY_SERVICE => {
                self.ringly.has_command = has(RINGLY_COMMAND_CHARACTERISTIC);
                self.ringly.has_message = has(RINGLY_MESSAGE_CHARACTERISTIC);
                self.ringly.has_ancs_v1 = has(RINGLY_ANCS_V1_CHARACTERISTIC);
                self.ringly.has_ancs_v2 = has(RINGLY_ANCS_V2_CHARACTERISTIC);
                self.ringly.has_bond = has(RINGLY_BOND_CHARACTERISTIC);
                self.ringly.has_clear_bond = has(RINGLY_CLEAR_BOND_CHARACTERISTIC);
                self.ringly.has_configuration_hash = has(RINGLY_CONFIGURATION_HASH_CHARACTERISTIC);

                if !self.ringly.has_command {
                    self.validation.record_error(PeripheralError::CommandCharacteristicNotFound);
                }
                if !self.ringly.has_message {
                    self.validation.record_error(PeripheralError::MessageCharacteristicNotFound);
                }
                if !self.ringly.has_bond {
                    self.validation.record_error(PeripheralError::BondCharacteristicNotFound);
                }
                if !self.ringly.has_clear_bond {
                    self.validation.record_error(PeripheralError::ClearBondCharacteristicNotFound);
                }
                if !self.ringly.has_configuration_hash {
                    self.validation
                        .record_error(PeripheralError::ConfigurationHashCharacteristicNotFound);
                }
                if !self.ringly.has_exactly_one_ancs_variant() {
                    let error = if self.ringly.has_ancs_v1 && self.ringly.has_ancs_v2 {
                        PeripheralError::TooManyAncsNotificationCharacteristicsFound
                    } else {
                        PeripheralError::AncsNotificationCharacteristicNotFound
                    };
                    self.validation.record_error(error);
                }
            }
            BATTERY_SERVICE => {
                self.battery_characteristics.has_state = has(BATTERY_STATE_CHARACTERISTIC);
                self.battery_characteristics.has_charge = has(BATTERY_CHARGE_CHARACTERISTIC);
                self.battery_characteristics.support = FeatureSupport::Supported;
                if !self.battery_characteristics.has_state {
                    self.validation.record_error(PeripheralError::BatteryStateCharacteristicNotFound);
                }
                if !self.battery_characteristics.has_charge {
                    self.validation.record_error(PeripheralError::BatteryChargeCharacteristicNotFound);
                }
            }
            DEVICE_INFORMATION_SERVICE => {
                if !has(DEVICE_APPLICATION_VERSION_CHARACTERISTIC) {
                    self.validation
                        .record_error(PeripheralError::DeviceApplicationCharacteristicNotFound);
                }
                if !has(DEVICE_HARDWARE_VERSION_CHARACTERISTIC) {
                    self.validation.record_error(PeripheralError::DeviceHardwareCharacteristicNotFound);
                }
                if !has(DEVICE_MANUFACTURER_CHARACTERISTIC) {
                    self.validation
                        .record_error(PeripheralError::DeviceManufacturerCharacteristicNotFound);
                }
                self.device_characteristics.mac_address_support = supported(has(DEVICE_MAC_ADDRESS_CHARACTERISTIC));
                self.device_characteristics.chip_version_support = supported(has(DEVICE_CHIP_VERSION_CHARACTERISTIC));
                self.device_characteristics.bootloader_version_support =
                    supported(has(DEVICE_BOOTLOADER_VERSION_CHARACTERISTIC));
                self.device_characteristics.softdevice_version_support =
                    supported(has(DEVICE_SOFTDEVICE_VERSION_CHARACTERISTIC));
            }
            ACTIVITY_SERVICE => {
                self.activity_characteristics.has_control_point = has(ACTIVITY_CONTROL_POINT_CHARACTERISTIC);
                self.activity_characteristics.has_tracking_data = has(ACTIVITY_TRACKING_DATA_CHARACTERISTIC);
                self.activity_characteristics.support = FeatureSupport::Supported;
                if !self.activity_characteristics.has_control_point {
                    self.validation
                        .record_error(PeripheralError::ActivityControlPointCharacteristicNotFound);
                }
                if !self.activity_characteristics.has_tracking_data {
                    self.validation
                        .record_error(PeripheralError::ActivityTrackingDataCharacteristicNotFound);
                }
            }
            LOGGING_SERVICE => {
                self.logging_characteristics.has_flash = has(LOGGING_FLASH_CHARACTERISTIC);
                self.logging_characteristics.has_request = has(LOGGING_REQUEST_CHARACTERISTIC);
                self.logging_characteristics.support = FeatureSupport::Supported;
                if !self.logging_characteristics.has_flash {
                    self.validation.record_error(PeripheralError::LoggingFlashCharacteristicNotFound);
                }
                if !self.logging_characteristics.has_request {
                    self.validation.record_error(PeripheralError::LoggingRequestCharacteristicNotFound);
                }
            }
            _ => {}
        }

        self.awaiting_characteristics.remove(&service);

        if self.validation.state() == ValidationState::HasValidationErrors {
            self.dispatch_validation_state();
            return Ok(());
        }

        if self.awaiting_characteristics.is_empty() {
            self.begin_notification_subscriptions(adapter)?;
        } else {
            self.validation.waiting_for(self.next_blocked_on());
        }
        self.dispatch_validation_state();
        Ok(())
    }

    fn next_blocked_on(&self) -> BlockedOn {
        if self.awaiting_characteristics.contains(&RINGLY_SERVICE) {
            BlockedOn::RinglyService
        } else if self.awaiting_characteristics.contains(&BATTERY_SERVICE) {
            BlockedOn::BatteryService
        } else if self.awaiting_characteristics.contains(&DEVICE_INFORMATION_SERVICE) {
            BlockedOn::DeviceInformationService
        } else {
            BlockedOn::RinglyService
        }
    }

    fn begin_notification_subscriptions(&mut self, adapter: &mut dyn BleAdapter) -> Result<(), Error> {
        self.validation.start_waiting_for_notification_state_confirmation();

        let mut targets = vec![RINGLY_MESSAGE_CHARACTERISTIC];
        targets.push(if self.ringly.has_ancs_v1 {
            RINGLY_ANCS_V1_CHARACTERISTIC
        } else {
            RINGLY_ANCS_V2_CHARACTERISTIC
        });
        if self.battery_characteristics.has_state {
            targets.push(BATTERY_STATE_CHARACTERISTIC);
        }

        self.awaiting_notification_confirmations = targets.iter().copied().collect();
        for uuid in targets {
            adapter.set_notify(self.peer, uuid, true)?;
        }
        Ok(())
    }

    /// Invariant (c): notification-state confirmations may arrive in any order; validation
    /// completes once every outstanding one has.
    pub fn handle_notification_state_confirmed(&mut self, characteristic: BluetoothUuid) {
        self.awaiting_notification_confirmations.remove(&characteristic);
        if self.awaiting_notification_confirmations.is_empty() {
            self.validation.mark_validated();
            self.ancs_mode = if self.ringly.has_ancs_v2 {
                AncsNotificationMode::AutonomousOnDevice
            } else {
                AncsNotificationMode::PhoneForwarded
            };
        }
        self.dispatch_validation_state();
    }

    /// Queues `command` for delivery. Writes are serialized (invariant (a)): a second call while
    /// one is already in flight queues behind it rather than overlapping the two on the wire.
    pub fn write_command(&mut self, adapter: &mut dyn BleAdapter, command: Command) -> Result<(), Error> {
        let was_idle = self.pending_writes.is_empty();
        self.pending_writes.push_back(command);
        if was_idle {
            self.start_next_write(adapter)?;
        }
        Ok(())
    }

    fn start_next_write(&mut self, adapter: &mut dyn BleAdapter) -> Result<(), Error> {
        let Some(command) = self.pending_writes.front().cloned() else {
            return Ok(());
        };
        self.dispatch_will_write(&command);
        let bytes = command.encode();
        if let Err(e) = adapter.write_characteristic(self.peer, RINGLY_COMMAND_CHARACTERISTIC, &bytes, true) {
            self.pending_writes.pop_front();
            let error = Error::from(e);
            self.dispatch_failed_write(&command, &error);
            return Err(error);
        }
        Ok(())
    }

    /// Delivers the adapter's write-completion result for the currently in-flight command, then
    /// starts the next queued write, if any.
    pub fn handle_write_result(&mut self, adapter: &mut dyn BleAdapter, result: Result<(), AdapterError>) {
        let Some(command) = self.pending_writes.pop_front() else {
            return;
        };
        match result {
            Ok(()) => self.dispatch_did_write(&command),
            Err(e) => self.dispatch_failed_write(&command, &Error::from(e)),
        }
        let _ = self.start_next_write(adapter);
    }

    /// Decodes and routes one inbound short message, updating locally-tracked state (pair
    /// state, last shutdown reason, pending ANCS v2 attribute counts) before handing the decoded
    /// message to observers.
    pub fn handle_message(&mut self, bytes: &[u8]) {
        let _enter = self.span().entered();
        let Some(message) = Message::decode(bytes) else {
            return;
        };
        if let Message::Unsupported { message_type, .. } = &message {
            tracing::debug!(message_type = *message_type, "unsupported message type");
        }
        match &message {
            Message::BondComplete => self.pair_state = PairState::Paired,
            Message::ShuttingDown(reason) => self.last_shutdown_reason = *reason,
            Message::AncsV2DescriptorWritten {
                notification_attribute_count,
                application_attribute_count,
            } => {
                self.pending_ancs_v2_counts =
                    Some((*notification_attribute_count, *application_attribute_count));
            }
            _ => {}
        }
        let id = self.identifier;
        self.observers.dispatch(|o| o.did_receive_message(id, &message));
    }

    /// Feeds one v1 ANCS fragment. Fragment order is assumed FIFO.
    pub fn handle_ancs_v1_fragment(&mut self, fragment: &[u8]) -> Result<(), Error> {
        let _enter = self.span().entered();
        let fed = self.ancs_v1.feed(fragment);
        if let Err(e) = &fed {
            tracing::warn!(error = %e, "ANCS v1 fragment assembly failed");
        }
        if let Some(notification) = fed? {
            let id = self.identifier;
            self.observers
                .dispatch(|o| o.did_receive_ancs_notification(id, &notification));
        }
        Ok(())
    }

    /// Parses one complete v2 ANCS notification buffer, using the attribute counts declared by
    /// the preceding [`Message::AncsV2DescriptorWritten`].
    pub fn handle_ancs_v2_notification(&mut self, buffer: &[u8]) -> Result<(), Error> {
        let _enter = self.span().entered();
        let (notification_count, application_count) = self.pending_ancs_v2_counts.take().unwrap_or((0, 0));
        let parsed = crate::ancs_v2::parse_notification(
            buffer,
            notification_count as usize,
            application_count as usize,
        );
        if let Err(e) = &parsed {
            tracing::warn!(error = %e, "ANCS v2 parse failed");
        }
        let notification = parsed?;
        let id = self.identifier;
        self.observers
            .dispatch(|o| o.did_receive_ancs_notification(id, &notification));
        Ok(())
    }

    /// Decodes one activity-tracking read buffer and delivers the samples. Requires the
    /// tracking-data characteristic to have been found during validation.
    pub fn handle_activity_samples(&mut self, buffer: &[u8]) -> Result<(), Error> {
        let _enter = self.span().entered();
        if !self.activity_characteristics.has_tracking_data {
            return Err(PeripheralError::NotSubscribedToActivityNotifications.into());
        }
        let decoded = crate::activity::decode_samples(buffer);
        if let Err(e) = &decoded {
            tracing::warn!(error = %e, "activity sample decode failed");
        }
        let samples = decoded?;
        let id = self.identifier;
        self.observers
            .dispatch(|o| o.did_receive_activity_samples(id, &samples));
        Ok(())
    }

    /// Issues reads for every Device Information characteristic this peripheral's firmware
    /// reported having, including the version-gated optional ones.
    pub fn read_device_information(&mut self, adapter: &mut dyn BleAdapter) -> Result<(), Error> {
        adapter.read_characteristic(self.peer, DEVICE_APPLICATION_VERSION_CHARACTERISTIC)?;
        adapter.read_characteristic(self.peer, DEVICE_HARDWARE_VERSION_CHARACTERISTIC)?;
        adapter.read_characteristic(self.peer, DEVICE_MANUFACTURER_CHARACTERISTIC)?;
        if self.device_characteristics.mac_address_support == FeatureSupport::Supported {
            adapter.read_characteristic(self.peer, DEVICE_MAC_ADDRESS_CHARACTERISTIC)?;
        }
        if self.device_characteristics.chip_version_support == FeatureSupport::Supported {
            adapter.read_characteristic(self.peer, DEVICE_CHIP_VERSION_CHARACTERISTIC)?;
        }
        if self.device_characteristics.bootloader_version_support == FeatureSupport::Supported {
            adapter.read_characteristic(self.peer, DEVICE_BOOTLOADER_VERSION_CHARACTERISTIC)?;
        }
        if self.device_characteristics.softdevice_version_support == FeatureSupport::Supported {
            adapter.read_characteristic(self.peer, DEVICE_SOFTDEVICE_VERSION_CHARACTERISTIC)?;
        }
        Ok(())
    }

    pub fn handle_application_version_read(&mut self, bytes: &[u8]) {
        self.device_info.application_version = Some(String::from_utf8_lossy(bytes).into_owned());
    }

    pub fn handle_hardware_version_read(&mut self, bytes: &[u8]) {
        self.device_info.hardware_version = Some(String::from_utf8_lossy(bytes).into_owned());
    }

    pub fn handle_bootloader_version_read(&mut self, bytes: &[u8]) {
        self.device_info.bootloader_version = Some(String::from_utf8_lossy(bytes).into_owned());
    }

    pub fn handle_softdevice_version_read(&mut self, bytes: &[u8]) {
        self.device_info.softdevice_version = Some(String::from_utf8_lossy(bytes).into_owned());
    }

    pub fn handle_chip_version_read(&mut self, bytes: &[u8]) {
        self.device_info.chip_version = Some(String::from_utf8_lossy(bytes).into_owned());
    }

    pub fn handle_manufacturer_read(&mut self, bytes: &[u8]) {
        self.device_info.manufacturer = Some(String::from_utf8_lossy(bytes).into_owned());
    }

    /// The MAC address characteristic reports 6 raw bytes; formatted as the usual colon-separated
    /// hex string rather than stored as a raw buffer, since every caller wants it for display.
    pub fn handle_mac_address_read(&mut self, bytes: &[u8]) {
        if bytes.len() != 6 {
            return;
        }
        let formatted = bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":");
        self.device_info.mac_address = Some(formatted);
    }

    pub fn handle_battery_charge(&mut self, charge: u8) {
        self.battery_charge = Some(charge);
        self.dispatch_battery();
    }

    pub fn handle_battery_state(&mut self, byte: u8) {
        self.battery_state = BatteryState::from_wire(byte);
        self.dispatch_battery();
    }

    fn dispatch_battery(&mut self) {
        let id = self.identifier;
        let charge = self.battery_charge;
        let state = self.battery_state;
        self.observers.dispatch(|o| o.did_update_battery(id, charge, state));
    }

    /// Issues a read of the configuration hash characteristic. The result is delivered
    /// later, via [`Self::handle_configuration_hash_read`].
    pub fn read_configuration_hash(&mut self, adapter: &mut dyn BleAdapter) -> Result<(), Error> {
        if !self.ringly.has_configuration_hash {
            return Err(PeripheralError::ConfigurationHashCharacteristicNotFound.into());
        }
        adapter
            .read_characteristic(self.peer, RINGLY_CONFIGURATION_HASH_CHARACTERISTIC)
            .map_err(Into::into)
    }

    /// Writes a freshly computed configuration hash back to the peripheral, so it can detect on
    /// its next boot whether the app's settings have changed underneath it.
    pub fn write_configuration_hash(&mut self, adapter: &mut dyn BleAdapter, hash: u64) -> Result<(), Error> {
        if !self.ringly.has_configuration_hash {
            return Err(PeripheralError::ConfigurationHashCharacteristicNotFound.into());
        }
        adapter
            .write_characteristic(
                self.peer,
                RINGLY_CONFIGURATION_HASH_CHARACTERISTIC,
                &hash.to_le_bytes(),
                true,
            )
            .map_err(Into::into)
    }

    pub fn handle_configuration_hash_read(&mut self, result: Result<&[u8], AdapterError>) {
        let parsed: Result<u64, Error> = result.map_err(Error::from).and_then(|bytes| {
            let array: [u8; 8] = bytes
                .try_into()
                .map_err(|_| Error::Peripheral(PeripheralError::IncorrectLength))?;
            Ok(u64::from_le_bytes(array))
        });
        let id = self.identifier;
        self.observers
            .dispatch(move |o| o.did_read_configuration_hash(id, parsed.clone()));
    }

    /// Begins a flash-log read. Data streams back via repeated calls to
    /// [`Self::handle_flash_log_data`]; a zero-length buffer marks the end of the read.
    pub fn read_flash_log(&mut self, adapter: &mut dyn BleAdapter) -> Result<(), Error> {
        if !self.logging_characteristics.has_flash {
            return Err(PeripheralError::LoggingFlashCharacteristicNotFound.into());
        }
        adapter
            .read_characteristic(self.peer, LOGGING_FLASH_CHARACTERISTIC)
            .map_err(Into::into)
    }

    pub fn handle_flash_log_data(&mut self, data: &[u8]) {
        let id = self.identifier;
        self.observers.dispatch(|o| o.did_read_flash_log_data(id, data));
    }

    fn dispatch_will_write(&mut self, command: &Command) {
        let id = self.identifier;
        self.observers.dispatch(|o| o.will_write_command(id, command));
    }

    fn dispatch_did_write(&mut self, command: &Command) {
        let id = self.identifier;
        self.observers.dispatch(|o| o.did_write_command(id, command));
    }

    fn dispatch_failed_write(&mut self, command: &Command, error: &Error) {
        tracing::warn!(uuid = %self.identifier, %error, "command write failed");
        let id = self.identifier;
        self.observers
            .dispatch(|o| o.failed_to_write_command(id, command, error));
    }

    fn dispatch_validation_state(&mut self) {
        let id = self.identifier;
        let state = self.validation.state();
        if state == ValidationState::HasValidationErrors {
            tracing::warn!(uuid = %id, errors = ?self.validation.validation_errors(), "peripheral has validation errors");
        }
        self.observers.dispatch(|o| o.did_update_validation_state(id, state));
    }
}

fn supported(present: bool) -> FeatureSupport {
    if present {
        FeatureSupport::Supported
    } else {
        FeatureSupport::Unsupported
    }
}
