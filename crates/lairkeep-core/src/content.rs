//! Loading the narrative event catalog.
//!
//! Events are data. The catalog is read once from YAML and is read-only for
//! the rest of the session:
//!
//! ```yaml
//! events:
//!   - id: wandering_merchant
//!     title: "A Wandering Merchant"
//!     occurs_in: { night: false }
//!     choices:
//!       - text: "Trade"
//!         effect:
//!           costs: { primary_currency: 20 }
//!           grants: { metal: 10 }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use lairkeep_types::{EventId, EventRecord, TimePeriod};
use serde::Deserialize;
use tracing::info;

/// Errors that can occur when loading event content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Failed to read the content file from disk.
    #[error("failed to read content file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse content YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// Two events share an id.
    #[error("duplicate event id: {id}")]
    DuplicateId {
        /// The repeated id.
        id: EventId,
    },

    /// An event has an empty id.
    #[error("event titled {title:?} has an empty id")]
    EmptyId {
        /// Title of the offending event.
        title: String,
    },

    /// An event offers no choices, so it could never be resolved.
    #[error("event {id} has no choices")]
    NoChoices {
        /// The offending event.
        id: EventId,
    },
}

impl From<serde_yml::Error> for ContentError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    events: Vec<EventRecord>,
}

/// Validated, ordered collection of event records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCatalog {
    events: Vec<EventRecord>,
}

impl EventCatalog {
    /// Build a catalog from records, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyId`], [`ContentError::DuplicateId`], or
    /// [`ContentError::NoChoices`] for the first invalid record.
    pub fn new(events: Vec<EventRecord>) -> Result<Self, ContentError> {
        let mut seen = BTreeSet::new();
        for event in &events {
            if event.id.as_str().is_empty() {
                return Err(ContentError::EmptyId {
                    title: event.title.clone(),
                });
            }
            if !seen.insert(event.id.as_str()) {
                return Err(ContentError::DuplicateId {
                    id: event.id.clone(),
                });
            }
            if event.choices.is_empty() {
                return Err(ContentError::NoChoices {
                    id: event.id.clone(),
                });
            }
        }
        Ok(Self { events })
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Io`] if the file cannot be read, otherwise
    /// see [`EventCatalog::parse`].
    pub fn from_file(path: &Path) -> Result<Self, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::parse(&contents)?;
        info!(path = %path.display(), events = catalog.len(), "Event catalog loaded");
        Ok(catalog)
    }

    /// Parse a catalog from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Yaml`] for malformed YAML, or a validation
    /// error from [`EventCatalog::new`].
    pub fn parse(yaml: &str) -> Result<Self, ContentError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: CatalogFile = serde_yml::from_str(yaml)?;
        Self::new(file.events)
    }

    /// Every record, in catalog order.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Look up a record by id.
    pub fn get(&self, id: &EventId) -> Option<&EventRecord> {
        self.events.iter().find(|event| &event.id == id)
    }

    /// Records that may fire during `period`, in catalog order.
    pub fn eligible(&self, period: TimePeriod) -> Vec<&EventRecord> {
        self.events
            .iter()
            .filter(|event| event.can_occur_during(period))
            .collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return whether the catalog has no records.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
