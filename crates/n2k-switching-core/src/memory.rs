//! In-memory host (for testing and simulation).
//!
//! Keeps switch state in a map, fans out a delta to every matching
//! subscription on each write, and records everything the plugin sends so
//! tests can inspect it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};

use crate::error::{Error, Result};
use crate::host::{
    Delta, Subscription, SubscriptionEvent, SubscriptionId, SubscriptionRequest, SwitchingHost,
};

/// Capacity of the inbound and outbound N2K buses.
const BUS_CAPACITY: usize = 256;

struct Subscriber {
    paths: HashSet<String>,
    tx: mpsc::UnboundedSender<SubscriptionEvent>,
}

#[derive(Default)]
struct Recorded {
    emitted: Vec<Value>,
    writes: Vec<(String, Value)>,
    provider_errors: Vec<String>,
    provider_statuses: Vec<String>,
}

/// In-memory [`SwitchingHost`].
#[derive(Clone)]
pub struct MemoryHost {
    state: Arc<RwLock<HashMap<String, Value>>>,
    known_paths: Arc<RwLock<BTreeSet<String>>>,
    subscribers: Arc<Mutex<HashMap<SubscriptionId, Subscriber>>>,
    invalid_paths: Arc<RwLock<HashSet<String>>>,
    read_only_paths: Arc<RwLock<HashSet<String>>>,
    subscribe_failure: Arc<RwLock<Option<String>>>,
    recorded: Arc<Mutex<Recorded>>,
    inbound: broadcast::Sender<Value>,
    outbound: broadcast::Sender<Value>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(HashMap::new())),
            known_paths: Arc::new(RwLock::new(BTreeSet::new())),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            invalid_paths: Arc::new(RwLock::new(HashSet::new())),
            read_only_paths: Arc::new(RwLock::new(HashSet::new())),
            subscribe_failure: Arc::new(RwLock::new(None)),
            recorded: Arc::new(Mutex::new(Recorded::default())),
            inbound: broadcast::channel(BUS_CAPACITY).0,
            outbound: broadcast::channel(BUS_CAPACITY).0,
        }
    }

    /// Set a path value and notify matching subscriptions.
    pub fn set_value(&self, path: &str, value: Value) {
        self.state.write().insert(path.to_string(), value.clone());
        self.known_paths.write().insert(path.to_string());
        self.notify(path, value);
    }

    /// Current value of a path.
    pub fn value(&self, path: &str) -> Option<Value> {
        self.state.read().get(path).cloned()
    }

    /// Make a path known to the host without giving it a value.
    pub fn add_available_path(&self, path: impl Into<String>) {
        self.known_paths.write().insert(path.into());
    }

    /// Subscriptions touching this path report an error instead of deltas.
    pub fn mark_invalid_path(&self, path: impl Into<String>) {
        self.invalid_paths.write().insert(path.into());
    }

    /// Writes to this path fail.
    pub fn mark_read_only(&self, path: impl Into<String>) {
        self.read_only_paths.write().insert(path.into());
    }

    /// Make every subsequent `subscribe` call fail with `message`.
    pub fn fail_subscriptions(&self, message: impl Into<String>) {
        *self.subscribe_failure.write() = Some(message.into());
    }

    /// Deliver a message on the N2K input. Returns the number of listeners.
    pub fn publish_nmea2000(&self, message: Value) -> usize {
        self.inbound.send(message).unwrap_or(0)
    }

    /// Listen to everything the plugin sends to the N2K output.
    pub fn outbound(&self) -> broadcast::Receiver<Value> {
        self.outbound.subscribe()
    }

    /// Messages sent to the N2K output so far.
    pub fn emitted(&self) -> Vec<Value> {
        self.recorded.lock().emitted.clone()
    }

    /// Drain recorded output messages.
    pub fn take_emitted(&self) -> Vec<Value> {
        std::mem::take(&mut self.recorded.lock().emitted)
    }

    /// Successful writes made through `put_self_path`, in order.
    pub fn writes(&self) -> Vec<(String, Value)> {
        self.recorded.lock().writes.clone()
    }

    pub fn provider_errors(&self) -> Vec<String> {
        self.recorded.lock().provider_errors.clone()
    }

    pub fn provider_statuses(&self) -> Vec<String> {
        self.recorded.lock().provider_statuses.clone()
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|_, s| !s.tx.is_closed());
        subscribers.len()
    }

    /// Number of N2K input listeners.
    pub fn listener_count(&self) -> usize {
        self.inbound.receiver_count()
    }

    fn notify(&self, path: &str, value: Value) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|_, s| !s.tx.is_closed());
        for subscriber in subscribers.values() {
            if subscriber.paths.contains(path) {
                let _ = subscriber
                    .tx
                    .send(SubscriptionEvent::Delta(Delta::single(path, value.clone())));
            }
        }
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SwitchingHost for MemoryHost {
    async fn get_self_path(&self, path: &str) -> Option<Value> {
        self.value(path)
    }

    async fn put_self_path(&self, path: &str, value: Value) -> Result<()> {
        if self.read_only_paths.read().contains(path) {
            return Err(Error::state_write(path, "path is read only"));
        }
        self.recorded
            .lock()
            .writes
            .push((path.to_string(), value.clone()));
        self.set_value(path, value);
        Ok(())
    }

    async fn subscribe(&self, request: SubscriptionRequest) -> Result<Subscription> {
        let failure = self.subscribe_failure.read().clone();
        if let Some(message) = failure {
            return Err(Error::Host(message));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let invalid = self.invalid_paths.read();
            for path in request.paths.iter().filter(|p| invalid.contains(*p)) {
                let _ = tx.send(SubscriptionEvent::Error(format!("invalid path {}", path)));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.subscribers.lock().insert(
            id.clone(),
            Subscriber {
                paths: request.paths.into_iter().collect(),
                tx,
            },
        );
        Ok(Subscription { id, events: rx })
    }

    async fn unsubscribe(&self, id: &SubscriptionId) {
        self.subscribers.lock().remove(id);
    }

    fn emit_nmea2000_json(&self, message: Value) {
        self.recorded.lock().emitted.push(message.clone());
        let _ = self.outbound.send(message);
    }

    fn nmea2000_messages(&self) -> broadcast::Receiver<Value> {
        self.inbound.subscribe()
    }

    fn set_provider_error(&self, message: &str) {
        self.recorded
            .lock()
            .provider_errors
            .push(message.to_string());
    }

    fn set_provider_status(&self, message: &str) {
        self.recorded
            .lock()
            .provider_statuses
            .push(message.to_string());
    }

    fn available_paths(&self) -> Vec<String> {
        self.known_paths.read().iter().cloned().collect()
    }
}
