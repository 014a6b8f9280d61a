//! Control ingester.
//!
//! Listens to the N2K input for PGN 127502 Switch Bank Control and writes
//! each present switch field to the matching internal path. Messages are
//! handled one at a time and independently; a failure in one never affects
//! the next.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;

use crate::codec::from_wire;
use crate::error::Result;
use crate::host::SharedHost;
use crate::message::ControlMessage;
use crate::registry::BankRegistry;
use crate::teardown::ResourceHandle;

/// Applies inbound switch bank control to internal state.
#[derive(Clone)]
pub struct ControlIngester {
    host: SharedHost,
    registry: Arc<BankRegistry>,
}

impl ControlIngester {
    pub fn new(host: SharedHost, registry: Arc<BankRegistry>) -> Self {
        Self { host, registry }
    }

    /// Register the N2K input listener.
    ///
    /// The listener is attached before this returns, so no message published
    /// afterwards is missed.
    pub fn listen(&self) -> ResourceHandle {
        let mut rx = self.host.nmea2000_messages();
        let ingester = self.clone();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => {
                        if let Err(e) = ingester.handle_message(&message).await {
                            tracing::error!("Failed to process N2K message: {}", e);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("N2K input lagged, {} messages skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("N2K input closed");
        });

        ResourceHandle::listener(task)
    }

    /// Handle one raw inbound message. Returns the number of state writes.
    pub async fn handle_message(&self, message: &Value) -> Result<usize> {
        match ControlMessage::from_json(message)? {
            Some(control) => self.apply(&control).await,
            None => Ok(0),
        }
    }

    /// Write every present switch field of `control`.
    ///
    /// Control for an unregistered bank is ignored. A switch index with no
    /// configured path is logged and skipped; the remaining fields are still
    /// applied.
    pub async fn apply(&self, control: &ControlMessage) -> Result<usize> {
        let Some(paths) = self.registry.lookup(control.instance) else {
            tracing::trace!(bank = control.instance, "Control for unconfigured bank ignored");
            return Ok(0);
        };
        tracing::debug!(bank = control.instance, "msg: {:?}", control);

        let mut writes = 0;
        for (index, state) in control.present() {
            let Some(path) = paths.get(index - 1) else {
                tracing::error!(
                    bank = control.instance,
                    switch = index,
                    "no path for switch {} bank {}",
                    index,
                    control.instance
                );
                continue;
            };

            tracing::debug!(bank = control.instance, switch = index, %path, "Switch {} {}", index, state);
            self.host
                .put_self_path(path, Value::from(from_wire(state)))
                .await?;
            writes += 1;
        }
        Ok(writes)
    }
}
