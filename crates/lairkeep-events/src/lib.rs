//! In-process notification fabric for the Lairkeep game loop.
//!
//! Every mutation in the economy and every state-machine transition is
//! announced as an immutable [`Notification`] record. This crate provides the
//! typed publish/subscribe channel those records travel over, plus a recorder
//! that captures them for tests and session summaries.
//!
//! # Modules
//!
//! - [`channel`] -- [`NotificationChannel`]: kind-keyed subscriptions,
//!   snapshot delivery, isolated handler failures.
//! - [`recorder`] -- [`NotificationRecorder`]: an in-memory log of everything
//!   published on a channel.
//!
//! [`Notification`]: lairkeep_types::Notification

pub mod channel;
pub mod recorder;

pub use channel::{DeliveryReport, Handler, HandlerError, NotificationChannel, SubscriptionId};
pub use recorder::NotificationRecorder;
