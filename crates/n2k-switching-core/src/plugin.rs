//! Plugin lifecycle.
//!
//! [`SwitchingPlugin`] is the value the host holds. `start` builds a
//! [`RunningInstance`] (configuration, registry and every acquired resource);
//! `stop` cancels its teardown set and drops it.

use std::sync::Arc;

use serde::Serialize;

use crate::bridge::ChangeBridge;
use crate::config::PluginConfig;
use crate::constants::plugin;
use crate::error::Result;
use crate::host::SharedHost;
use crate::ingest::ControlIngester;
use crate::periodic::PeriodicReporter;
use crate::registry::BankRegistry;
use crate::schema;
use crate::teardown::{ResourceKind, TeardownSet};

/// Plugin identity shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// State owned by a started plugin.
struct RunningInstance {
    config: PluginConfig,
    registry: Arc<BankRegistry>,
    teardown: TeardownSet,
}

/// NMEA 2000 switching emulator.
pub struct SwitchingPlugin {
    host: SharedHost,
    running: Option<RunningInstance>,
}

impl SwitchingPlugin {
    pub fn new(host: SharedHost) -> Self {
        Self {
            host,
            running: None,
        }
    }

    pub fn descriptor() -> PluginDescriptor {
        PluginDescriptor {
            id: plugin::ID,
            name: plugin::NAME,
            description: plugin::DESCRIPTION,
        }
    }

    /// Start emulating the configured banks.
    ///
    /// A running instance is stopped first. An invalid configuration is
    /// rejected before anything is acquired.
    pub async fn start(&mut self, config: PluginConfig) -> Result<()> {
        if self.running.is_some() {
            tracing::info!("Plugin already running, restarting");
            self.stop().await;
        }

        if let Err(e) = config.validate() {
            tracing::error!("{}", e);
            self.host.set_provider_error(&e.to_string());
            return Err(e);
        }

        let registry = Arc::new(BankRegistry::from_config(&config));
        let mut teardown = TeardownSet::new();

        if !registry.is_empty() {
            for handle in ChangeBridge::new(self.host.clone()).wire(&registry).await {
                teardown.push(handle);
            }
            for handle in PeriodicReporter::new(self.host.clone()).start(&registry) {
                teardown.push(handle);
            }
            teardown.push(ControlIngester::new(self.host.clone(), registry.clone()).listen());

            self.host
                .set_provider_status(&format!("Emulating {} switch bank(s)", registry.len()));
        }

        tracing::info!(
            banks = registry.len(),
            resources = teardown.len(),
            "NMEA 2000 switching emulator started"
        );
        self.running = Some(RunningInstance {
            config,
            registry,
            teardown,
        });
        Ok(())
    }

    /// Start from the JSON configuration handed over by the host.
    pub async fn start_from_value(&mut self, value: serde_json::Value) -> Result<()> {
        let config = match PluginConfig::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                self.host.set_provider_error(&e.to_string());
                return Err(e);
            }
        };
        self.start(config).await
    }

    /// Cancel every subscription, timer and listener, in acquisition order.
    ///
    /// Safe to call when not running; a second call does nothing.
    pub async fn stop(&mut self) {
        let Some(mut instance) = self.running.take() else {
            return;
        };
        let released = instance.teardown.cancel_all().await;
        tracing::info!(
            banks = instance.registry.len(),
            released,
            "NMEA 2000 switching emulator stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Configuration of the running instance.
    pub fn config(&self) -> Option<&PluginConfig> {
        self.running.as_ref().map(|r| &r.config)
    }

    /// Registry of the running instance.
    pub fn registry(&self) -> Option<Arc<BankRegistry>> {
        self.running.as_ref().map(|r| r.registry.clone())
    }

    /// Resources held by the running instance, in acquisition order.
    pub fn resources(&self) -> Vec<ResourceKind> {
        self.running
            .as_ref()
            .map(|r| r.teardown.kinds())
            .unwrap_or_default()
    }

    /// Configuration schema for the host UI.
    pub fn schema(&self) -> serde_json::Value {
        schema::config_schema(&self.host.available_paths(), self.config())
    }
}
