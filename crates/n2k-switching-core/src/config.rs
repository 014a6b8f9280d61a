//! Plugin configuration.
//!
//! The host persists the configuration and hands it over as JSON:
//!
//! ```json
//! { "banks": [ { "instance": 1, "sendRate": 15, "switches": ["electrical.switches.bank1.1.state"] } ] }
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_INDICATORS, MAX_SEND_RATE_SECS};
use crate::error::{Error, Result};

/// Top-level plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Banks to emulate
    #[serde(default)]
    pub banks: Vec<BankConfig>,
}

/// One emulated switch bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankConfig {
    /// N2K switch bank instance
    #[serde(default)]
    pub instance: u8,
    /// Resend interval in seconds, 0 disables periodic reports
    #[serde(default)]
    pub send_rate: f64,
    /// Switch paths; index 0 is indicator 1 on the wire
    #[serde(default)]
    pub switches: Vec<String>,
}

impl BankConfig {
    pub fn new(instance: u8, switches: Vec<String>) -> Self {
        Self {
            instance,
            send_rate: 0.0,
            switches,
        }
    }

    pub fn with_send_rate(mut self, secs: f64) -> Self {
        self.send_rate = secs;
        self
    }

    /// Resend period, or `None` when periodic reporting is off or the rate
    /// is not a representable duration.
    pub fn send_interval(&self) -> Option<Duration> {
        if self.send_rate > 0.0 {
            Duration::try_from_secs_f64(self.send_rate).ok()
        } else {
            None
        }
    }
}

impl PluginConfig {
    /// Decode the configuration handed over by the host.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))
    }

    /// Check the bank invariants: unique instances, at most
    /// [`MAX_INDICATORS`] switches and a send rate between 0 and
    /// [`MAX_SEND_RATE_SECS`].
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for bank in &self.banks {
            if !seen.insert(bank.instance) {
                return Err(Error::InvalidConfiguration(format!(
                    "duplicate bank instance {}",
                    bank.instance
                )));
            }
            if bank.switches.len() > MAX_INDICATORS {
                return Err(Error::InvalidConfiguration(format!(
                    "bank {} has {} switches, at most {} are supported",
                    bank.instance,
                    bank.switches.len(),
                    MAX_INDICATORS
                )));
            }
            if !(0.0..=MAX_SEND_RATE_SECS).contains(&bank.send_rate) {
                return Err(Error::InvalidConfiguration(format!(
                    "bank {} has invalid sendRate {}, expected 0 to {} seconds",
                    bank.instance, bank.send_rate, MAX_SEND_RATE_SECS
                )));
            }
        }
        Ok(())
    }

    /// Every switch path referenced by any bank, in configuration order.
    pub fn switch_paths(&self) -> impl Iterator<Item = &str> {
        self.banks
            .iter()
            .flat_map(|bank| bank.switches.iter().map(String::as_str))
    }
}
