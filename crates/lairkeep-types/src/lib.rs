//! Shared type definitions for the Lairkeep game loop.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: resource kinds, time periods, game states, narrative event
//! records, and the notification contract consumed by UI and other systems.
//!
//! # Modules
//!
//! - [`enums`] -- Resource kinds, time periods, and game states
//! - [`ids`] -- Type-safe identifier wrappers
//! - [`content`] -- Narrative event records supplied by the content feed
//! - [`notifications`] -- Immutable notification records and their kinds

pub mod content;
pub mod enums;
pub mod ids;
pub mod notifications;

// Re-export all public types at crate root for convenience.
pub use content::{Choice, ChoiceEffect, EventRecord, PeriodEligibility};
pub use enums::{GameState, ResourceKind, TimePeriod};
pub use ids::EventId;
pub use notifications::{Notification, NotificationKind};
