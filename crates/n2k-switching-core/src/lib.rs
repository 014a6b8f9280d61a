//! NMEA 2000 switch bank emulation.
//!
//! This crate makes internal switch-state paths appear on an NMEA 2000 bus as
//! one or more binary switch banks, and applies incoming bank control commands
//! back to those paths.
//!
//! ## Architecture
//!
//! ```text
//!  PluginConfig ──► BankRegistry ──┬──► ChangeBridge ─────┐
//!                                  │                      ├──► PGN 127501 out
//!                                  ├──► PeriodicReporter ─┘
//!                                  │
//!  PGN 127502 in ──► ControlIngester ──► put_self_path ──► (delta) ──► ChangeBridge
//! ```
//!
//! - **codec**: On/Off wire values to and from internal switch values
//! - **registry**: bank instance to ordered switch paths
//! - **report**: builds full PGN 127501 status reports from current state
//! - **bridge** / **periodic**: event-driven and timer-driven reporting
//! - **ingest**: PGN 127502 control handling
//! - **plugin**: start/stop lifecycle and the teardown set
//!
//! Everything the plugin needs from its host goes through [`SwitchingHost`].
//! [`MemoryHost`] implements it in memory for tests and simulation.

pub mod bridge;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod ingest;
pub mod memory;
pub mod message;
pub mod periodic;
pub mod plugin;
pub mod registry;
pub mod report;
pub mod schema;
pub mod teardown;

pub use codec::{from_wire, to_wire, SwitchState};
pub use config::{BankConfig, PluginConfig};
pub use error::{Error, Result};
pub use host::{
    Delta, PathValue, SharedHost, Subscription, SubscriptionEvent, SubscriptionId,
    SubscriptionRequest, SwitchingHost, Update,
};
pub use memory::MemoryHost;
pub use message::{ControlMessage, StatusReport};
pub use plugin::{PluginDescriptor, SwitchingPlugin};
pub use registry::{Bank, BankRegistry};
pub use report::StatusReportBuilder;
pub use teardown::{ResourceHandle, ResourceKind, TeardownSet};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
