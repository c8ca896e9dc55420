use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_channel::{mpsc, oneshot};
use ringly_core::activity::ActivitySample;
use ringly_core::ancs::AncsNotification;
use ringly_core::central::PeripheralHandle;
use ringly_core::commands::Command;
use ringly_core::message::Message;
use ringly_core::peripheral::{DeviceInfo, PeripheralObserver};
use ringly_core::types::{BatteryState, ConnectionState, PairState};
use ringly_core::validation::ValidationState;
use ringly_core::Error as CoreError;
use uuid::Uuid;

use crate::error::Result;
use crate::util::{broadcast, watch, BroadcastReceiver, BroadcastSender};

/// An asynchronous wrapper around a [`PeripheralHandle`].
///
/// Every write or read that used to deliver its outcome through a
/// [`PeripheralObserver`] callback instead resolves a future here. State that changes over
/// time (messages, notifications, activity samples, validation state, battery) is exposed as a
/// broadcast stream instead, since those events have no single caller waiting on them.
#[derive(Clone)]
pub struct PeripheralAsync {
    handle: PeripheralHandle,
    delegate: Arc<PeripheralAsyncDelegate>,
}

impl PeripheralAsync {
    pub(crate) fn new(handle: PeripheralHandle, delegate: Arc<PeripheralAsyncDelegate>) -> Self {
        Self { handle, delegate }
    }

    pub(crate) fn handle(&self) -> &PeripheralHandle {
        &self.handle
    }

    pub(crate) fn delegate(&self) -> &PeripheralAsyncDelegate {
        &self.delegate
    }

    pub fn identifier(&self) -> Uuid {
        self.handle.lock().unwrap().identifier()
    }

    pub fn advertised_name(&self) -> Option<String> {
        self.handle.lock().unwrap().advertised_name().map(str::to_owned)
    }

    pub fn short_name(&self) -> Option<String> {
        self.handle.lock().unwrap().short_name().map(str::to_owned)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.handle.lock().unwrap().connection_state()
    }

    pub fn pair_state(&self) -> PairState {
        self.handle.lock().unwrap().pair_state()
    }

    pub fn is_validated(&self) -> bool {
        self.handle.lock().unwrap().is_validated()
    }

    pub fn validation_state(&self) -> ValidationState {
        self.handle.lock().unwrap().validation_state()
    }

    pub fn device_info(&self) -> DeviceInfo {
        self.handle.lock().unwrap().device_info().clone()
    }

    pub fn battery_charge(&self) -> Option<u8> {
        self.handle.lock().unwrap().battery_charge()
    }

    pub fn battery_state(&self) -> Option<BatteryState> {
        self.handle.lock().unwrap().battery_state()
    }

    /// A stream of inbound short messages, in arrival order.
    pub fn messages(&self) -> BroadcastReceiver<Message> {
        self.delegate.messages.new_receiver()
    }

    /// A stream of assembled ANCS notifications (v1 and v2 alike).
    pub fn notifications(&self) -> BroadcastReceiver<AncsNotification> {
        self.delegate.notifications.new_receiver()
    }

    /// A stream of activity-sample batches, one per inbound decode.
    pub fn activity_samples(&self) -> BroadcastReceiver<Arc<[ActivitySample]>> {
        self.delegate.activity_samples.new_receiver()
    }

    /// A stream of validation-state transitions.
    pub fn validation_updates(&self) -> BroadcastReceiver<ValidationState> {
        self.delegate.validation_updated.new_receiver()
    }

    /// A stream of battery updates, `(charge, state)`, either of which may be absent if not yet
    /// determined.
    pub fn battery_updates(&self) -> BroadcastReceiver<(Option<u8>, Option<BatteryState>)> {
        self.delegate.battery_updated.new_receiver()
    }

    /// Resolves once the peripheral disconnects.
    pub async fn disconnected(&self) {
        let mut receiver = self.delegate.disconnected.new_receiver();
        let _ = receiver.recv().await;
    }
}

pub(crate) struct PeripheralAsyncDelegate {
    writes: Mutex<VecDeque<oneshot::Sender<Result<()>>>>,
    configuration_hash_reads: Mutex<VecDeque<oneshot::Sender<Result<u64>>>>,
    flash_log: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    messages: BroadcastSender<Message>,
    notifications: BroadcastSender<AncsNotification>,
    activity_samples: BroadcastSender<Arc<[ActivitySample]>>,
    validation_updated: BroadcastSender<ValidationState>,
    battery_updated: BroadcastSender<(Option<u8>, Option<BatteryState>)>,
    disconnected: BroadcastSender<()>,
}

impl PeripheralAsyncDelegate {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(VecDeque::new()),
            configuration_hash_reads: Mutex::new(VecDeque::new()),
            flash_log: Mutex::new(None),
            messages: broadcast(16),
            notifications: broadcast(16),
            activity_samples: broadcast(16),
            validation_updated: watch(),
            battery_updated: watch(),
            disconnected: watch(),
        }
    }

    pub fn register_write(&self, _command: Command) -> oneshot::Receiver<Result<()>> {
        let (sender, receiver) = oneshot::channel();
        self.writes.lock().unwrap().push_back(sender);
        receiver
    }

    pub fn register_device_information(&self) -> oneshot::Receiver<Result<()>> {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(Ok(()));
        receiver
    }

    pub fn register_configuration_hash_read(&self) -> oneshot::Receiver<Result<u64>> {
        let (sender, receiver) = oneshot::channel();
        self.configuration_hash_reads.lock().unwrap().push_back(sender);
        receiver
    }

    /// Registers a fresh flash-log stream, replacing any previous one. The sender is dropped
    /// (closing the stream) once a zero-length chunk arrives.
    pub fn register_flash_log(&self) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let (sender, receiver) = mpsc::unbounded();
        *self.flash_log.lock().unwrap() = Some(sender);
        receiver
    }
}

impl PeripheralObserver for PeripheralAsyncDelegate {
    fn will_write_command(&self, _identifier: Uuid, _command: &Command) {}

    fn did_write_command(&self, _identifier: Uuid, _command: &Command) {
        if let Some(sender) = self.writes.lock().unwrap().pop_front() {
            let _ = sender.send(Ok(()));
        }
    }

    fn failed_to_write_command(&self, _identifier: Uuid, _command: &Command, error: &CoreError) {
        if let Some(sender) = self.writes.lock().unwrap().pop_front() {
            let _ = sender.send(Err(error.clone().into()));
        }
    }

    fn did_receive_message(&self, _identifier: Uuid, message: &Message) {
        let _ = self.messages.try_broadcast(message.clone());
    }

    fn did_receive_ancs_notification(&self, _identifier: Uuid, notification: &AncsNotification) {
        let _ = self.notifications.try_broadcast(notification.clone());
    }

    fn did_receive_activity_samples(&self, _identifier: Uuid, samples: &[ActivitySample]) {
        let _ = self.activity_samples.try_broadcast(samples.into());
    }

    fn did_update_validation_state(&self, _identifier: Uuid, state: ValidationState) {
        let _ = self.validation_updated.try_broadcast(state);
    }

    fn did_update_battery(&self, _identifier: Uuid, charge: Option<u8>, state: Option<BatteryState>) {
        let _ = self.battery_updated.try_broadcast((charge, state));
    }

    fn did_read_configuration_hash(&self, _identifier: Uuid, hash: std::result::Result<u64, CoreError>) {
        if let Some(sender) = self.configuration_hash_reads.lock().unwrap().pop_front() {
            let _ = sender.send(hash.map_err(Into::into));
        }
    }

    fn did_read_flash_log_data(&self, _identifier: Uuid, data: &[u8]) {
        let mut slot = self.flash_log.lock().unwrap();
        if let Some(sender) = slot.as_ref() {
            let _ = sender.unbounded_send(data.to_vec());
            if data.is_empty() {
                *slot = None;
            }
        }
    }

    fn did_disconnect(&self, _identifier: Uuid) {
        let _ = self.disconnected.try_broadcast(());
        for sender in self.writes.lock().unwrap().drain(..) {
            let _ = sender.send(Err(CoreError::from(ringly_core::error::PeripheralError::Disconnected).into()));
        }
        for sender in self.configuration_hash_reads.lock().unwrap().drain(..) {
            let _ = sender.send(Err(CoreError::from(ringly_core::error::PeripheralError::Disconnected).into()));
        }
        *self.flash_log.lock().unwrap() = None;
    }
}
