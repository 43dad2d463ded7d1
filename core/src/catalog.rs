//! Collaborator interfaces consumed by the engine's callers.
//!
//! The rule functions never reach for configuration or the participant
//! directory themselves: callers look values up through these traits and
//! pass them in. In-memory implementations are provided for the HTTP shell
//! and for tests.

use crate::category::validate_ladder;
use crate::error::CategoryError;
use crate::types::{CategoryDefinition, EventId, ModalityRule, Participant, PullCouplePolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event and modality configuration
pub trait EventCatalog: Send + Sync {
    /// Rules for a modality of an event, if the event offers it
    fn modality_rule(&self, event_id: EventId, modality: &str) -> Option<ModalityRule>;

    /// Pull-couple policy of an event, if the event is known
    fn pull_couple_policy(&self, event_id: EventId) -> Option<PullCouplePolicy>;

    /// Ordered category ladder
    fn category_definitions(&self) -> Vec<CategoryDefinition>;
}

/// Participant directory lookup
pub trait ParticipantDirectory: Send + Sync {
    /// Finds a participant by DNI or by id
    fn find_by_identifier(&self, identifier: &str) -> Option<Participant>;
}

/// Rules of one event as stored in a catalog document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRules {
    /// Event identifier
    pub event_id: EventId,
    /// Pull-couple policy for the event
    #[serde(default)]
    pub policy: PullCouplePolicy,
    /// Modalities offered
    pub modalities: Vec<ModalityRule>,
}

/// Serializable catalog: category ladder plus per-event rules
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Ordered category ladder
    pub categories: Vec<CategoryDefinition>,
    /// Events
    #[serde(default)]
    pub events: Vec<EventRules>,
}

/// In-memory [`EventCatalog`], read-only once built
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    categories: Vec<CategoryDefinition>,
    events: HashMap<EventId, EventRules>,
}

impl InMemoryCatalog {
    /// Builds a catalog after checking the category ladder.
    ///
    /// # Errors
    ///
    /// Returns a [`CategoryError`] when the ladder is not contiguous,
    /// increasing, and uniquely named.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CategoryError> {
        validate_ladder(&document.categories)?;
        let events = document
            .events
            .into_iter()
            .map(|rules| (rules.event_id, rules))
            .collect();
        Ok(Self {
            categories: document.categories,
            events,
        })
    }

    /// Category ladder, borrowed
    #[must_use]
    pub fn categories(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    /// Rules of an event, borrowed
    #[must_use]
    pub fn event(&self, event_id: EventId) -> Option<&EventRules> {
        self.events.get(&event_id)
    }

    /// Number of configured events
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

impl EventCatalog for InMemoryCatalog {
    fn modality_rule(&self, event_id: EventId, modality: &str) -> Option<ModalityRule> {
        self.events
            .get(&event_id)?
            .modalities
            .iter()
            .find(|m| m.name == modality)
            .cloned()
    }

    fn pull_couple_policy(&self, event_id: EventId) -> Option<PullCouplePolicy> {
        self.events.get(&event_id).map(|rules| rules.policy)
    }

    fn category_definitions(&self) -> Vec<CategoryDefinition> {
        self.categories.clone()
    }
}

/// In-memory [`ParticipantDirectory`]
#[derive(Clone, Debug, Default)]
pub struct InMemoryDirectory {
    participants: Vec<Participant>,
}

impl InMemoryDirectory {
    /// Creates a directory holding the given participants
    #[must_use]
    pub const fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    /// Adds or replaces a participant (matched by id)
    pub fn upsert(&mut self, participant: Participant) {
        match self.participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => *existing = participant,
            None => self.participants.push(participant),
        }
    }
}

impl ParticipantDirectory for InMemoryDirectory {
    fn find_by_identifier(&self, identifier: &str) -> Option<Participant> {
        let identifier = identifier.trim();
        self.participants
            .iter()
            .find(|p| p.dni == identifier || p.id.to_string() == identifier)
            .cloned()
    }
}
