use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_channel::oneshot;
use ringly_core::adapter::BleAdapter;
use ringly_core::central::{Central, CentralConfig, CentralObserver, Discovery, PeripheralHandle};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::peripheral::{PeripheralAsync, PeripheralAsyncDelegate};
use crate::util::{BroadcastReceiver, BroadcastSender, broadcast, watch};

/// An asynchronous wrapper around [`Central`].
///
/// Every method that used to deliver its outcome through a [`CentralObserver`] callback instead
/// resolves a future or yields from a stream; the blocking rule this crate exists to remove is
/// "call the sync method, then separately notice the callback fired."
#[derive(Clone)]
pub struct CentralAsync {
    inner: Arc<Mutex<Central>>,
    delegate: Arc<CentralAsyncDelegate>,
    peripherals: Arc<Mutex<HashMap<Uuid, Arc<PeripheralAsyncDelegate>>>>,
}

impl CentralAsync {
    /// Constructs a `Central` over `adapter` and subscribes this wrapper's bridging delegate to
    /// it. The returned value is the only handle callers need; the inner sync [`Central`] is
    /// reachable only through this wrapper's methods.
    pub fn new(adapter: Box<dyn BleAdapter>, config: CentralConfig) -> Self {
        let mut central = Central::new(adapter, config);
        let delegate = Arc::new(CentralAsyncDelegate::new());
        central.subscribe(&(delegate.clone() as Arc<dyn CentralObserver>));
        Self {
            inner: Arc::new(Mutex::new(central)),
            delegate,
            peripherals: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn wrap(&self, identifier: Uuid, handle: PeripheralHandle) -> PeripheralAsync {
        let delegate = self
            .peripherals
            .lock()
            .unwrap()
            .entry(identifier)
            .or_insert_with(|| {
                let delegate = Arc::new(PeripheralAsyncDelegate::new());
                handle
                    .lock()
                    .unwrap()
                    .subscribe(&(delegate.clone() as Arc<dyn ringly_core::peripheral::PeripheralObserver>));
                delegate
            })
            .clone();
        PeripheralAsync::new(handle, delegate)
    }

    pub fn is_powered_on(&self) -> bool {
        self.inner.lock().unwrap().is_powered_on()
    }

    /// A stream of adapter power-state changes, pushed by the embedder via
    /// `Central::handle_adapter_state_changed`.
    pub fn state_updates(&self) -> BroadcastReceiver<bool> {
        self.delegate.state_updated.new_receiver()
    }

    pub fn prompt_to_power_on_bluetooth(&self) -> bool {
        self.inner.lock().unwrap().prompt_to_power_on_bluetooth()
    }

    pub fn discovery(&self) -> Discovery {
        self.inner.lock().unwrap().discovery().clone()
    }

    /// A stream of discovery snapshots. `Central` republishes the whole snapshot on every scan
    /// result rather than emitting per-peripheral events, so this mirrors that shape instead of
    /// reinventing a per-item discovery stream the sync core doesn't have.
    pub fn discovery_updates(&self) -> BroadcastReceiver<Discovery> {
        self.delegate.discovery_updated.new_receiver()
    }

    pub fn start_discovery(&self) -> Result<()> {
        self.inner.lock().unwrap().start_discovery().map_err(Into::into)
    }

    pub fn stop_discovery(&self) -> Result<()> {
        self.inner.lock().unwrap().stop_discovery().map_err(Into::into)
    }

    pub fn peripheral(&self, identifier: Uuid) -> Option<PeripheralAsync> {
        let handle = self.inner.lock().unwrap().peripheral(identifier)?;
        Some(self.wrap(identifier, handle))
    }

    pub fn retrieve_connected_peripherals(&self) -> Vec<PeripheralAsync> {
        let handles = self.inner.lock().unwrap().retrieve_connected_peripherals();
        handles
            .into_iter()
            .map(|handle| {
                let identifier = handle.lock().unwrap().identifier();
                self.wrap(identifier, handle)
            })
            .collect()
    }

    pub fn retrieve_peripheral(&self, identifier: Uuid, assume_paired: bool) -> Option<PeripheralAsync> {
        let handle = self
            .inner
            .lock()
            .unwrap()
            .retrieve_peripheral(identifier, assume_paired)?;
        Some(self.wrap(identifier, handle))
    }

    /// Rehydrates peripherals the adapter restored on cold start. Unlike the sync `Central`
    /// method of the same name, wraps and returns each one rather than just firing an observer
    /// callback, since a caller awaiting this already has everything it needs to start
    /// reconnecting them.
    pub fn handle_restore_peripherals(&self, restored: &[(ringly_core::types::PeerId, Uuid, bool)]) -> Vec<PeripheralAsync> {
        self.inner.lock().unwrap().handle_restore_peripherals(restored);
        restored
            .iter()
            .filter_map(|&(_, identifier, _)| self.peripheral(identifier))
            .collect()
    }

    /// A stream of restored-peripheral batches, one per `handle_restore_peripherals` call.
    pub fn restored_peripherals(&self) -> BroadcastReceiver<Vec<Uuid>> {
        self.delegate.restored.new_receiver()
    }

    pub fn handle_adapter_state_changed(&self, powered_on: bool) {
        self.inner.lock().unwrap().handle_adapter_state_changed(powered_on);
    }

    pub fn handle_scan_result(
        &self,
        peer: ringly_core::types::PeerId,
        identifier: Uuid,
        advertisement: &ringly_core::advertisement_data::AdvertisementData,
    ) -> Option<PeripheralAsync> {
        let handle = self
            .inner
            .lock()
            .unwrap()
            .handle_scan_result(peer, identifier, advertisement)?;
        Some(self.wrap(identifier, handle))
    }

    /// Instructs the adapter to connect, then waits for the eventual `did_connect` /
    /// `did_fail_to_connect` outcome. If this future is dropped before that outcome arrives, the
    /// connection attempt is canceled.
    pub async fn connect(&self, peripheral: &PeripheralAsync) -> Result<()> {
        let identifier = peripheral.identifier();
        tracing::debug!(uuid = %identifier, "connect requested");
        let receiver = self.delegate.register_connecting(identifier);

        {
            let mut central = self.inner.lock().unwrap();
            central.connect(peripheral.handle())?;
        }

        let guard = crate::util::defer(|| {
            let mut central = self.inner.lock().unwrap();
            let _ = central.cancel_connection(peripheral.handle());
        });
        let res = receiver.await?;
        guard.defuse();
        res
    }

    pub fn cancel_connection(&self, peripheral: &PeripheralAsync) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .cancel_connection(peripheral.handle())
            .map_err(Into::into)
    }

    pub fn handle_did_connect(&self, identifier: Uuid) -> Result<()> {
        self.inner.lock().unwrap().handle_did_connect(identifier)?;
        Ok(())
    }

    pub fn handle_did_fail_to_connect(&self, identifier: Uuid, error: Option<ringly_core::Error>) {
        self.inner
            .lock()
            .unwrap()
            .handle_did_fail_to_connect(identifier, error);
    }

    pub fn handle_did_disconnect(&self, identifier: Uuid) {
        self.inner.lock().unwrap().handle_did_disconnect(identifier);
    }

    /// Writes one command to `identifier`'s peripheral, resolving once the write completes (or
    /// fails) rather than requiring the caller to watch
    /// [`ringly_core::peripheral::PeripheralObserver::did_write_command`] itself.
    pub async fn write_command(&self, peripheral: &PeripheralAsync, command: ringly_core::commands::Command) -> Result<()> {
        let receiver = peripheral.delegate().register_write(command.clone());
        {
            let mut central = self.inner.lock().unwrap();
            central.write_command(peripheral.identifier(), command)?;
        }
        receiver.await?
    }

    pub async fn read_device_information(&self, peripheral: &PeripheralAsync) -> Result<()> {
        let receiver = peripheral.delegate().register_device_information();
        {
            let mut central = self.inner.lock().unwrap();
            central.read_device_information(peripheral.identifier())?;
        }
        receiver.await?
    }

    pub async fn read_configuration_hash(&self, peripheral: &PeripheralAsync) -> Result<u64> {
        let receiver = peripheral.delegate().register_configuration_hash_read();
        {
            let mut central = self.inner.lock().unwrap();
            central.read_configuration_hash(peripheral.identifier())?;
        }
        receiver.await?
    }

    pub async fn write_configuration_hash(&self, peripheral: &PeripheralAsync, hash: u64) -> Result<()> {
        {
            let mut central = self.inner.lock().unwrap();
            central.write_configuration_hash(peripheral.identifier(), hash)?;
        }
        Ok(())
    }

    /// Streams flash-log data until the peripheral signals completion with a zero-length chunk.
    pub fn read_flash_log(&self, peripheral: &PeripheralAsync) -> Result<futures_channel::mpsc::UnboundedReceiver<Vec<u8>>> {
        let receiver = peripheral.delegate().register_flash_log();
        let mut central = self.inner.lock().unwrap();
        central.read_flash_log(peripheral.identifier())?;
        Ok(receiver)
    }
}

struct CentralAsyncDelegate {
    connecting: Mutex<HashMap<Uuid, oneshot::Sender<Result<()>>>>,
    state_updated: BroadcastSender<bool>,
    discovery_updated: BroadcastSender<Discovery>,
    restored: BroadcastSender<Vec<Uuid>>,
}

impl CentralAsyncDelegate {
    fn new() -> Self {
        Self {
            connecting: Mutex::new(HashMap::new()),
            state_updated: watch(),
            discovery_updated: watch(),
            restored: broadcast(16),
        }
    }

    fn register_connecting(&self, identifier: Uuid) -> oneshot::Receiver<Result<()>> {
        let (sender, receiver) = oneshot::channel();
        self.connecting.lock().unwrap().insert(identifier, sender);
        receiver
    }
}

impl CentralObserver for CentralAsyncDelegate {
    fn adapter_state_changed(&self, powered_on: bool) {
        let _ = self.state_updated.try_broadcast(powered_on);
    }

    fn did_connect(&self, identifier: Uuid) {
        if let Some(sender) = self.connecting.lock().unwrap().remove(&identifier) {
            let _ = sender.send(Ok(()));
        }
    }

    fn did_fail_to_connect(&self, identifier: Uuid, error: Option<&ringly_core::Error>) {
        if let Some(sender) = self.connecting.lock().unwrap().remove(&identifier) {
            let err = error.cloned().map(Error::from).unwrap_or(Error::from(crate::error::ErrorKind::Canceled));
            let _ = sender.send(Err(err));
        }
    }

    fn did_restore_peripherals(&self, identifiers: &[Uuid]) {
        let _ = self.restored.try_broadcast(identifiers.to_vec());
    }

    fn discovery_updated(&self, snapshot: &Discovery) {
        let _ = self.discovery_updated.try_broadcast(snapshot.clone());
    }
}
