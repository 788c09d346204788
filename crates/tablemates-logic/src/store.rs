//! Participant storage keyed by id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ValidationError;
use crate::profile::{Participant, ParticipantId};

/// Holds participant records for the lifetime of a matcher or discovery engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileStore {
    profiles: HashMap<ParticipantId, Participant>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert, replacing any existing record with the same id.
    /// Returns `true` when an existing record was replaced.
    pub fn upsert(&mut self, participant: Participant) -> Result<bool, ValidationError> {
        if let Err(e) = participant.validate() {
            log::warn!("rejected participant record: {}", e);
            return Err(e);
        }
        Ok(self
            .profiles
            .insert(participant.id.clone(), participant)
            .is_some())
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.profiles.get(id)
    }

    pub fn get_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.profiles.get_mut(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.profiles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.profiles.values()
    }

    /// Resolve ids to records, skipping unknown ids.
    pub fn resolve<'a, I>(&self, ids: I) -> Vec<Participant>
    where
        I: IntoIterator<Item = &'a ParticipantId>,
    {
        ids.into_iter()
            .filter_map(|id| self.profiles.get(id).cloned())
            .collect()
    }
}
