//! Host capability seam.
//!
//! The plugin does not own state storage, change notification, or the N2K
//! transport. It reaches all of them through [`SwitchingHost`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};

use crate::constants::SELF_CONTEXT;
use crate::error::Result;

/// Identifier of a live state subscription.
pub type SubscriptionId = String;

/// Request to be notified of changes on a set of paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub context: String,
    pub paths: Vec<String>,
}

impl SubscriptionRequest {
    /// Subscribe to paths of the own vessel.
    pub fn self_paths(paths: Vec<String>) -> Self {
        Self {
            context: SELF_CONTEXT.to_string(),
            paths,
        }
    }
}

/// A single changed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    pub path: String,
    pub value: Value,
}

/// A group of values changed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub values: Vec<PathValue>,
}

/// Change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub context: String,
    #[serde(default)]
    pub updates: Vec<Update>,
}

impl Delta {
    /// Delta for one path of the own vessel.
    pub fn single(path: impl Into<String>, value: Value) -> Self {
        Self {
            context: SELF_CONTEXT.to_string(),
            updates: vec![Update {
                timestamp: Some(Utc::now()),
                values: vec![PathValue {
                    path: path.into(),
                    value,
                }],
            }],
        }
    }

    /// Every changed path in this delta.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.updates
            .iter()
            .flat_map(|u| u.values.iter().map(|v| v.path.as_str()))
    }
}

/// What a subscription delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    Delta(Delta),
    /// The subscription mechanism reported a problem with this subscription.
    Error(String),
}

/// A live subscription. Events stop when the host unsubscribes it or the
/// receiver is dropped.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: mpsc::UnboundedReceiver<SubscriptionEvent>,
}

/// Everything the plugin needs from the process hosting it.
#[async_trait]
pub trait SwitchingHost: Send + Sync {
    /// Current value of a path on the own vessel, `None` if unknown.
    async fn get_self_path(&self, path: &str) -> Option<Value>;

    /// Write a value to a path on the own vessel.
    async fn put_self_path(&self, path: &str, value: Value) -> Result<()>;

    /// Subscribe to changes on a set of paths.
    async fn subscribe(&self, request: SubscriptionRequest) -> Result<Subscription>;

    /// Cancel a subscription. Unknown ids are ignored.
    async fn unsubscribe(&self, id: &SubscriptionId);

    /// Send a message to the N2K output.
    fn emit_nmea2000_json(&self, message: Value);

    /// Listen to decoded N2K input. Dropping the receiver removes the listener.
    fn nmea2000_messages(&self) -> broadcast::Receiver<Value>;

    /// Report a plugin error to the host.
    fn set_provider_error(&self, message: &str);

    /// Report plugin status to the host.
    fn set_provider_status(&self, message: &str);

    /// All paths the host currently knows about.
    fn available_paths(&self) -> Vec<String>;
}

/// Shared host handle.
pub type SharedHost = Arc<dyn SwitchingHost>;
