//! Teardown set.
//!
//! Every resource acquired while starting (a state subscription, a resend
//! timer, the N2K input listener) is recorded here as a [`ResourceHandle`].
//! Stopping cancels them in the order they were acquired.

use tokio::task::JoinHandle;

use crate::host::{SharedHost, SubscriptionId};

/// What a handle releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Change subscription on a bank's paths
    Subscription { bank: u8 },
    /// Periodic report timer for a bank
    Timer { bank: u8 },
    /// N2K input listener
    Listener,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Subscription { bank } => write!(f, "subscription(bank {})", bank),
            ResourceKind::Timer { bank } => write!(f, "timer(bank {})", bank),
            ResourceKind::Listener => write!(f, "listener"),
        }
    }
}

/// A cancellable resource owned by the running plugin.
pub struct ResourceHandle {
    kind: ResourceKind,
    task: JoinHandle<()>,
    subscription: Option<(SubscriptionId, SharedHost)>,
}

impl ResourceHandle {
    /// A subscription: the task draining it plus the host-side id.
    pub fn subscription(bank: u8, id: SubscriptionId, host: SharedHost, task: JoinHandle<()>) -> Self {
        Self {
            kind: ResourceKind::Subscription { bank },
            task,
            subscription: Some((id, host)),
        }
    }

    pub fn timer(bank: u8, task: JoinHandle<()>) -> Self {
        Self {
            kind: ResourceKind::Timer { bank },
            task,
            subscription: None,
        }
    }

    pub fn listener(task: JoinHandle<()>) -> Self {
        Self {
            kind: ResourceKind::Listener,
            task,
            subscription: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Stop the task and release the host-side resource.
    ///
    /// Returns once the task has finished, so nothing it owns can run later.
    pub async fn cancel(self) {
        self.task.abort();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::warn!("{} task ended abnormally: {}", self.kind, e);
            }
        }
        if let Some((id, host)) = self.subscription {
            host.unsubscribe(&id).await;
        }
        tracing::debug!("Released {}", self.kind);
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("kind", &self.kind)
            .field("subscription", &self.subscription.as_ref().map(|(id, _)| id))
            .finish()
    }
}

/// Ordered set of handles, cancelled exactly once.
#[derive(Debug, Default)]
pub struct TeardownSet {
    handles: Vec<ResourceHandle>,
}

impl TeardownSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: ResourceHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Kinds of the held handles, in registration order.
    pub fn kinds(&self) -> Vec<ResourceKind> {
        self.handles.iter().map(ResourceHandle::kind).collect()
    }

    /// Cancel every handle in registration order and empty the set.
    ///
    /// Returns the number of handles cancelled; zero on an empty set.
    pub async fn cancel_all(&mut self) -> usize {
        let handles = std::mem::take(&mut self.handles);
        let count = handles.len();
        for handle in handles {
            handle.cancel().await;
        }
        count
    }
}
