//! Periodic reporter.
//!
//! Banks with a send rate get their full status report resent on a fixed
//! period whether or not anything changed, so listeners that join the bus
//! late still learn the bank state.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::host::SharedHost;
use crate::registry::{Bank, BankRegistry};
use crate::report::StatusReportBuilder;
use crate::teardown::ResourceHandle;

/// Resends PGN 127501 reports on a timer.
pub struct PeriodicReporter {
    host: SharedHost,
}

impl PeriodicReporter {
    pub fn new(host: SharedHost) -> Self {
        Self { host }
    }

    /// Start a timer for every bank with a send rate.
    pub fn start(&self, registry: &BankRegistry) -> Vec<ResourceHandle> {
        registry
            .banks()
            .filter_map(|bank| {
                bank.send_interval
                    .map(|period| self.start_bank(bank.clone(), period))
            })
            .collect()
    }

    /// Start the resend timer for one bank. The first report goes out one
    /// period after start.
    pub fn start_bank(&self, bank: Bank, period: Duration) -> ResourceHandle {
        let host = self.host.clone();
        let instance = bank.instance;

        let task = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer.tick().await; // Skip first tick

            loop {
                timer.tick().await;
                tracing::debug!(bank = bank.instance, "Periodic status report");
                StatusReportBuilder::emit(host.as_ref(), &bank).await;
            }
        });

        tracing::info!(bank = instance, "Resending status every {:?}", period);
        ResourceHandle::timer(instance, task)
    }
}
