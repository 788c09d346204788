//! Conflict-free selection of scored candidate groups.
//!
//! Candidates from every bucket overlap heavily; allocation picks a subset in
//! which no participant appears twice. The shipped strategy is greedy
//! set packing: walk candidates best-first and keep each one whose members
//! are all still free. Greedy is not optimal, but after the sort it is linear
//! in the number of candidates. Other strategies plug in behind
//! [`Allocator`].
//!
//! Equal scores are broken by the sorted member-id list, ascending, so the
//! same candidates always produce the same selection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::profile::ParticipantId;

/// A scored candidate awaiting allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Member ids, sorted ascending.
    pub member_ids: Vec<ParticipantId>,
    /// Fairness-adjusted score.
    pub score: f64,
    /// Index of the bucket the candidate was drawn from.
    pub bucket: usize,
}

impl ScoredCandidate {
    pub fn new(mut member_ids: Vec<ParticipantId>, score: f64, bucket: usize) -> Self {
        member_ids.sort();
        Self {
            member_ids,
            score,
            bucket,
        }
    }
}

/// Chooses a participant-disjoint subset of candidates.
pub trait Allocator {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Return the selected candidates. No participant id may appear in more
    /// than one returned candidate.
    fn allocate(&self, candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate>;
}

/// Available allocation strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocatorKind {
    #[default]
    GreedyByScore,
}

impl AllocatorKind {
    pub fn build(self) -> Box<dyn Allocator + Send + Sync> {
        match self {
            AllocatorKind::GreedyByScore => Box::new(GreedyAllocator),
        }
    }
}

/// Best-first greedy set packing.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAllocator;

impl Allocator for GreedyAllocator {
    fn name(&self) -> &'static str {
        "greedy-by-score"
    }

    fn allocate(&self, mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        candidates.sort_by(rank);

        let mut used: HashSet<ParticipantId> = HashSet::new();
        let mut selected = Vec::new();
        for candidate in candidates {
            if candidate.member_ids.iter().any(|id| used.contains(id)) {
                continue;
            }
            used.extend(candidate.member_ids.iter().cloned());
            selected.push(candidate);
        }
        selected
    }
}

/// Score descending, then member ids ascending.
fn rank(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.member_ids.cmp(&b.member_ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(members: &[&str], score: f64) -> ScoredCandidate {
        ScoredCandidate::new(
            members.iter().map(|m| ParticipantId::from(*m)).collect(),
            score,
            0,
        )
    }

    fn names(selected: &[ScoredCandidate]) -> Vec<Vec<&str>> {
        selected
            .iter()
            .map(|c| c.member_ids.iter().map(ParticipantId::as_str).collect())
            .collect()
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert!(GreedyAllocator.allocate(Vec::new()).is_empty());
    }

    #[test]
    fn picks_best_first_and_skips_overlaps() {
        let selected = GreedyAllocator.allocate(vec![
            cand(&["a", "b"], 0.5),
            cand(&["b", "c"], 0.9),
            cand(&["c", "d"], 0.8),
            cand(&["a", "d"], 0.7),
        ]);
        // b,c wins; c,d and a,b overlap it; a,d is free
        assert_eq!(names(&selected), vec![vec!["b", "c"], vec!["a", "d"]]);
    }

    #[test]
    fn greedy_is_not_optimal() {
        // Taking the single best blocks two groups worth more together.
        let selected = GreedyAllocator.allocate(vec![
            cand(&["a", "b", "c", "d"], 1.0),
            cand(&["a", "b"], 0.6),
            cand(&["c", "d"], 0.6),
        ]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].score, 1.0);
    }

    #[test]
    fn ties_break_on_member_ids() {
        let forward =
            GreedyAllocator.allocate(vec![cand(&["c", "d"], 0.5), cand(&["a", "c"], 0.5)]);
        let reverse =
            GreedyAllocator.allocate(vec![cand(&["a", "c"], 0.5), cand(&["c", "d"], 0.5)]);
        assert_eq!(names(&forward), vec![vec!["a", "c"]]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn member_ids_are_sorted_on_construction() {
        let c = cand(&["z", "a", "m"], 0.1);
        let expected: Vec<ParticipantId> = vec!["a".into(), "m".into(), "z".into()];
        assert_eq!(c.member_ids, expected);
    }

    #[test]
    fn kind_builds_greedy() {
        assert_eq!(AllocatorKind::default().build().name(), "greedy-by-score");
    }
}
