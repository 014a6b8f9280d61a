//! Bank registry.
//!
//! Maps a switch bank instance to the ordered switch paths it exposes. The
//! registry is built once when the plugin starts and is never mutated
//! afterwards, so it is shared between tasks as a plain `Arc`.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::{BankConfig, PluginConfig};

/// A registered bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Bank {
    /// N2K switch bank instance
    pub instance: u8,
    /// Switch paths; index 0 is indicator 1
    pub switches: Vec<String>,
    /// Periodic resend interval, if any
    pub send_interval: Option<Duration>,
}

impl Bank {
    /// Position (0-based) of a switch path within this bank.
    pub fn position(&self, path: &str) -> Option<usize> {
        self.switches.iter().position(|p| p == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.position(path).is_some()
    }
}

impl From<&BankConfig> for Bank {
    fn from(config: &BankConfig) -> Self {
        Self {
            instance: config.instance,
            switches: config.switches.clone(),
            send_interval: config.send_interval(),
        }
    }
}

/// Bank instance to switch paths.
#[derive(Debug, Clone, Default)]
pub struct BankRegistry {
    banks: BTreeMap<u8, Bank>,
}

impl BankRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration, skipping banks without switches.
    pub fn from_config(config: &PluginConfig) -> Self {
        let mut registry = Self::new();
        for bank in &config.banks {
            if bank.switches.is_empty() {
                tracing::warn!(bank = bank.instance, "Bank has no switches configured, skipping");
                continue;
            }
            registry.register(Bank::from(bank));
        }
        registry
    }

    /// Store a bank under its instance. Banks without switches are ignored.
    pub fn register(&mut self, bank: Bank) {
        if bank.switches.is_empty() {
            return;
        }
        self.banks.insert(bank.instance, bank);
    }

    /// Switch paths of a bank, in wire order.
    pub fn lookup(&self, instance: u8) -> Option<&[String]> {
        self.banks.get(&instance).map(|bank| bank.switches.as_slice())
    }

    pub fn get(&self, instance: u8) -> Option<&Bank> {
        self.banks.get(&instance)
    }

    /// Registered banks, ordered by instance.
    pub fn banks(&self) -> impl Iterator<Item = &Bank> {
        self.banks.values()
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}
