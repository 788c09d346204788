//! Fairness adjustment for under-served participants.
//!
//! Participants who have been placed a few times, but not many, get a small
//! additive boost so the allocator prefers groups that include them. New
//! participants and frequent diners get nothing.
//!
//! | Prior placements | Boost |
//! |------------------|-------|
//! | 0 | 0.0 |
//! | 1–2 | 0.15 |
//! | 3+ | 0.0 |
//!
//! Across a group each member adds `boost × 0.1`, so a table full of
//! under-served diners gains at most `0.15 × 0.1 × size`.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

use crate::error::ConfigError;
use crate::history::HistoryStore;
use crate::profile::Participant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessPolicy {
    /// Additive boost for an eligible participant.
    pub boost: f64,
    /// Fewest prior placements that qualify.
    pub min_placements: usize,
    /// Most prior placements that still qualify.
    pub max_placements: usize,
    /// Fraction of each member's boost that reaches the group score.
    pub member_damping: f64,
}

impl Default for FairnessPolicy {
    fn default() -> Self {
        Self {
            boost: 0.15,
            min_placements: 1,
            max_placements: 2,
            member_damping: 0.1,
        }
    }
}

impl FairnessPolicy {
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.min_placements > self.max_placements {
            errors.push(ConfigError::InvalidFairnessRange {
                min: self.min_placements,
                max: self.max_placements,
            });
        }
        if self.boost < 0.0 {
            errors.push(ConfigError::InvalidWeight {
                name: "fairness boost",
                value: self.boost,
            });
        }
        if !(0.0..=1.0).contains(&self.member_damping) {
            errors.push(ConfigError::InvalidWeight {
                name: "member_damping",
                value: self.member_damping,
            });
        }
        errors
    }

    /// Boost earned by someone with `placements` prior placements.
    pub fn boost_for(&self, placements: usize) -> f64 {
        if (self.min_placements..=self.max_placements).contains(&placements) {
            self.boost
        } else {
            0.0
        }
    }

    /// Adjust an individual score by the participant's boost.
    pub fn adjust(
        &self,
        participant: &Participant,
        history: &HistoryStore,
        base_score: f64,
    ) -> f64 {
        base_score + self.boost_for(history.placement_count(&participant.id))
    }

    /// Damped contribution of one member to a group's score.
    pub fn member_contribution(&self, participant: &Participant, history: &HistoryStore) -> f64 {
        self.adjust(participant, history, 0.0) * self.member_damping
    }

    /// Total fairness adjustment for a group: the sum of member contributions.
    pub fn group_adjustment<P: Borrow<Participant>>(
        &self,
        group: &[P],
        history: &HistoryStore,
    ) -> f64 {
        group
            .iter()
            .map(|m| self.member_contribution(m.borrow(), history))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Gender, ParticipantId};
    use chrono::Utc;

    const EPS: f64 = 1e-12;

    fn person(id: &str) -> Participant {
        Participant::new(id, 25, Gender::Female, "Delhi", "AIIMS")
    }

    fn place(history: &mut HistoryStore, id: &str, times: usize) {
        for _ in 0..times {
            history.record_group(&[ParticipantId::from(id)], Utc::now());
        }
    }

    #[test]
    fn boost_schedule() {
        let policy = FairnessPolicy::default();
        assert_eq!(policy.boost_for(0), 0.0);
        assert_eq!(policy.boost_for(1), 0.15);
        assert_eq!(policy.boost_for(2), 0.15);
        assert_eq!(policy.boost_for(3), 0.0);
        assert_eq!(policy.boost_for(40), 0.0);
    }

    #[test]
    fn adjust_adds_boost_to_base() {
        let policy = FairnessPolicy::default();
        let mut history = HistoryStore::new();
        place(&mut history, "a", 1);
        let adjusted = policy.adjust(&person("a"), &history, 0.5);
        assert!((adjusted - 0.65).abs() < EPS);
        assert_eq!(policy.adjust(&person("b"), &history, 0.5), 0.5);
    }

    #[test]
    fn new_and_frequent_members_contribute_equally() {
        let policy = FairnessPolicy::default();
        let mut history = HistoryStore::new();
        place(&mut history, "veteran", 4);

        let newcomer = policy.member_contribution(&person("newcomer"), &history);
        let veteran = policy.member_contribution(&person("veteran"), &history);
        assert_eq!(newcomer, 0.0);
        assert_eq!(veteran, 0.0);
        assert_eq!(newcomer, veteran);
    }

    #[test]
    fn group_adjustment_is_damped_per_member() {
        let policy = FairnessPolicy::default();
        let mut history = HistoryStore::new();
        place(&mut history, "a", 1);
        place(&mut history, "b", 2);
        place(&mut history, "c", 3);
        let group = vec![person("a"), person("b"), person("c"), person("d")];
        let adj = policy.group_adjustment(&group, &history);
        assert!((adj - 0.03).abs() < EPS);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let policy = FairnessPolicy {
            min_placements: 3,
            max_placements: 1,
            ..FairnessPolicy::default()
        };
        assert_eq!(
            policy.validate(),
            vec![ConfigError::InvalidFairnessRange { min: 3, max: 1 }]
        );
    }
}
