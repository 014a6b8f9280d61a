//! Change bridge.
//!
//! One state subscription per bank. Any delta touching a bank's switches
//! triggers a full status report for that bank, rebuilt from current state
//! rather than patched from the delta, so simultaneous changes are always
//! reported together.

use crate::error::{Error, Result};
use crate::host::{SharedHost, SubscriptionEvent, SubscriptionRequest};
use crate::registry::{Bank, BankRegistry};
use crate::report::StatusReportBuilder;
use crate::teardown::ResourceHandle;

/// Turns state changes into PGN 127501 reports.
pub struct ChangeBridge {
    host: SharedHost,
}

impl ChangeBridge {
    pub fn new(host: SharedHost) -> Self {
        Self { host }
    }

    /// Subscribe every registered bank.
    ///
    /// A bank whose subscription cannot be created is reported to the host
    /// and left out; the other banks are still wired.
    pub async fn wire(&self, registry: &BankRegistry) -> Vec<ResourceHandle> {
        let mut handles = Vec::with_capacity(registry.len());
        for bank in registry.banks() {
            match self.wire_bank(bank.clone()).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::error!(bank = bank.instance, "{}", e);
                    self.host.set_provider_error(&e.to_string());
                }
            }
        }
        handles
    }

    /// Subscribe to exactly the switches of `bank` and start reporting.
    pub async fn wire_bank(&self, bank: Bank) -> Result<ResourceHandle> {
        let request = SubscriptionRequest::self_paths(bank.switches.clone());
        let subscription = self
            .host
            .subscribe(request)
            .await
            .map_err(|e| Error::subscription(bank.instance, e.to_string()))?;

        let id = subscription.id.clone();
        let mut events = subscription.events;
        let host = self.host.clone();
        let instance = bank.instance;
        let count = bank.switches.len();

        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                Self::handle_event(&host, &bank, event).await;
            }
            tracing::debug!(bank = bank.instance, "Subscription closed");
        });

        tracing::info!(bank = instance, "Subscribed to {} switch paths", count);
        Ok(ResourceHandle::subscription(instance, id, self.host.clone(), task))
    }

    /// React to one subscription event. Returns `true` if a report was sent.
    pub async fn handle_event(host: &SharedHost, bank: &Bank, event: SubscriptionEvent) -> bool {
        match event {
            SubscriptionEvent::Delta(delta) => {
                if !delta.paths().any(|path| bank.contains(path)) {
                    tracing::trace!(bank = bank.instance, "Delta without bank switches ignored");
                    return false;
                }
                StatusReportBuilder::emit(host.as_ref(), bank).await;
                true
            }
            SubscriptionEvent::Error(message) => {
                let err = Error::subscription(bank.instance, message);
                tracing::error!(bank = bank.instance, "{}", err);
                host.set_provider_error(&err.to_string());
                false
            }
        }
    }
}
