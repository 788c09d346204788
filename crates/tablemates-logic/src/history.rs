//! Placement history.
//!
//! Every time a group is finalised, each member gets one [`PlacementRecord`]
//! listing who they sat with. Records are never removed; the fairness policy
//! only reads how many a participant has.
//!
//! The store is an ordinary value owned by whoever runs formation, so two
//! matchers (say, one per city) never share history by accident.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::profile::ParticipantId;

/// One participant's seat in one formed group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Every member of the group, including the record's owner.
    pub group_members: Vec<ParticipantId>,
    pub placed_at: DateTime<Utc>,
}

/// Append-only placement log keyed by participant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStore {
    records: HashMap<ParticipantId, Vec<PlacementRecord>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of groups this participant has been placed in.
    pub fn placement_count(&self, id: &ParticipantId) -> usize {
        self.records.get(id).map_or(0, Vec::len)
    }

    pub fn history_for(&self, id: &ParticipantId) -> &[PlacementRecord] {
        self.records.get(id).map_or(&[], |v| v.as_slice())
    }

    /// Append one record per member of a finalised group.
    pub fn record_group(&mut self, members: &[ParticipantId], placed_at: DateTime<Utc>) {
        for id in members {
            self.records
                .entry(id.clone())
                .or_default()
                .push(PlacementRecord {
                    group_members: members.to_vec(),
                    placed_at,
                });
        }
    }

    /// Everyone this participant has shared a table with, without repeats.
    pub fn past_tablemates(&self, id: &ParticipantId) -> Vec<ParticipantId> {
        let mut seen = std::collections::BTreeSet::new();
        for record in self.history_for(id) {
            for other in &record.group_members {
                if other != id {
                    seen.insert(other.clone());
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Participants with at least one placement.
    pub fn participant_count(&self) -> usize {
        self.records.len()
    }

    /// Total records across all participants.
    pub fn total_records(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().map(|n| ParticipantId::from(*n)).collect()
    }

    #[test]
    fn unknown_participant_has_no_history() {
        let history = HistoryStore::new();
        assert_eq!(history.placement_count(&"nobody".into()), 0);
        assert!(history.history_for(&"nobody".into()).is_empty());
    }

    #[test]
    fn one_record_per_member() {
        let mut history = HistoryStore::new();
        let group = ids(&["a", "b", "c"]);
        let now = Utc::now();
        history.record_group(&group, now);

        assert_eq!(history.total_records(), 3);
        assert_eq!(history.participant_count(), 3);
        let record = &history.history_for(&"b".into())[0];
        assert_eq!(record.group_members, group);
        assert_eq!(record.placed_at, now);
    }

    #[test]
    fn history_accumulates_across_runs() {
        let mut history = HistoryStore::new();
        history.record_group(&ids(&["a", "b"]), Utc::now());
        history.record_group(&ids(&["a", "c"]), Utc::now());
        assert_eq!(history.placement_count(&"a".into()), 2);
        assert_eq!(history.placement_count(&"b".into()), 1);
        assert_eq!(history.past_tablemates(&"a".into()), ids(&["b", "c"]));
    }
}
