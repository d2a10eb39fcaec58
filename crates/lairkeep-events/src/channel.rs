//! Typed publish/subscribe channel for [`Notification`] records.
//!
//! Subscribers register for one [`NotificationKind`] or for every kind.
//! Publishing delivers to a snapshot of the subscribers registered at the
//! moment of the call, in registration order. The registry lock is released
//! before any handler runs, so handlers may subscribe, unsubscribe, or
//! publish on the same channel; those changes apply from the next publish.
//!
//! A handler that returns an error or panics is logged and skipped. Delivery
//! to the remaining handlers continues and the publisher only sees the
//! counts in the returned [`DeliveryReport`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lairkeep_types::{Notification, NotificationKind};
use tracing::{debug, error, warn};

/// Error returned by a notification handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("notification handler failed: {message}")]
pub struct HandlerError {
    /// Description of what went wrong inside the handler.
    pub message: String,
}

impl HandlerError {
    /// Create a handler error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A registered notification handler.
pub type Handler = Arc<dyn Fn(&Notification) -> Result<(), HandlerError> + Send + Sync>;

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Return the raw sequence number (registration order).
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// Outcome of a single publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

/// What a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    /// A single notification kind.
    Kind(NotificationKind),
    /// Every notification.
    All,
}

impl Topic {
    fn matches(self, kind: NotificationKind) -> bool {
        match self {
            Self::Kind(wanted) => wanted == kind,
            Self::All => true,
        }
    }
}

struct Subscription {
    id: SubscriptionId,
    topic: Topic,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    /// Kept in registration order.
    subscriptions: Vec<Subscription>,
}

/// Cloneable handle to a shared notification registry.
///
/// Every clone publishes to and subscribes on the same registry.
#[derive(Clone, Default)]
pub struct NotificationChannel {
    registry: Arc<Mutex<Registry>>,
}

impl core::fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("subscribers", &self.lock().subscriptions.len())
            .finish()
    }
}

impl NotificationChannel {
    /// Create a channel with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one notification kind.
    pub fn subscribe<F>(&self, kind: NotificationKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register(Topic::Kind(kind), Arc::new(handler))
    }

    /// Register a handler for every notification kind.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register(Topic::All, Arc::new(handler))
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.lock();
        let before = registry.subscriptions.len();
        registry.subscriptions.retain(|sub| sub.id != id);
        let removed = registry.subscriptions.len() < before;
        debug!(subscription = id.0, removed, "Unsubscribed");
        removed
    }

    /// Number of subscribers that would receive a notification of `kind`.
    pub fn subscriber_count(&self, kind: NotificationKind) -> usize {
        self.lock()
            .subscriptions
            .iter()
            .filter(|sub| sub.topic.matches(kind))
            .count()
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.lock().subscriptions.clear();
        debug!("All notification subscriptions cleared");
    }

    /// Deliver `notification` to every matching subscriber.
    pub fn publish(&self, notification: &Notification) -> DeliveryReport {
        let kind = notification.kind();

        // Snapshot under the lock, dispatch without it.
        let handlers: Vec<(SubscriptionId, Handler)> = self
            .lock()
            .subscriptions
            .iter()
            .filter(|sub| sub.topic.matches(kind))
            .map(|sub| (sub.id, Arc::clone(&sub.handler)))
            .collect();

        let mut report = DeliveryReport::default();
        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(notification))) {
                Ok(Ok(())) => report.delivered = report.delivered.saturating_add(1),
                Ok(Err(err)) => {
                    report.failed = report.failed.saturating_add(1);
                    warn!(
                        subscription = id.0,
                        ?kind,
                        error = %err,
                        "Notification handler failed"
                    );
                }
                Err(payload) => {
                    report.failed = report.failed.saturating_add(1);
                    error!(
                        subscription = id.0,
                        ?kind,
                        message = panic_message(payload.as_ref()),
                        "Notification handler panicked"
                    );
                }
            }
        }
        report
    }

    fn register(&self, topic: Topic, handler: Handler) -> SubscriptionId {
        let mut registry = self.lock();
        let id = SubscriptionId(registry.next_id);
        registry.next_id = registry.next_id.saturating_add(1);
        registry.subscriptions.push(Subscription { id, topic, handler });
        debug!(subscription = id.0, ?topic, "Subscribed");
        id
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // A panicking handler never holds this lock, so a poisoned registry
        // is still consistent.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
