//! In-memory log of published notifications.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lairkeep_types::{Notification, NotificationKind};

use crate::channel::{NotificationChannel, SubscriptionId};

/// Captures every notification published on a channel, in order.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct NotificationRecorder {
    log: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationRecorder {
    /// Subscribe a new recorder to every kind on `channel`.
    pub fn attach(channel: &NotificationChannel) -> (Self, SubscriptionId) {
        let recorder = Self::default();
        let log = Arc::clone(&recorder.log);
        let id = channel.subscribe_all(move |notification| {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification.clone());
            Ok(())
        });
        (recorder, id)
    }

    /// Copy of everything recorded so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Recorded notifications of one kind, in order.
    pub fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.lock()
            .iter()
            .filter(|n| n.kind() == kind)
            .cloned()
            .collect()
    }

    /// Number of recorded notifications of one kind.
    pub fn count(&self, kind: NotificationKind) -> usize {
        self.lock().iter().filter(|n| n.kind() == kind).count()
    }

    /// The most recent notification, if any.
    pub fn last(&self) -> Option<Notification> {
        self.lock().last().cloned()
    }

    /// Total number of recorded notifications.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Return whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
