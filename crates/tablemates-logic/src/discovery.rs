//! One-to-one profile discovery.
//!
//! Recommends the next profile a participant should see. Each (viewer,
//! candidate) pair gets a compatibility score from five signals:
//!
//! | Signal | Weight |
//! |--------|--------|
//! | academic similarity | 0.20 |
//! | interest compatibility (Jaccard, damped for near-identical sets) | 0.25 |
//! | same city | 0.15 |
//! | behavioural match against past likes and dislikes | 0.30 |
//! | diversity relative to recent likes | 0.10 |
//!
//! Selection is epsilon-greedy. The exploration rate starts at 0.3 and decays
//! with the number of interactions, never dropping below 0.05. When exploring,
//! the pick is uniform over the top fifth of scored candidates.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ValidationError;
use crate::profile::{Participant, ParticipantId};
use crate::store::ProfileStore;

/// Default number of candidates scored per recommendation.
pub const DEFAULT_MAX_CANDIDATES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryWeights {
    pub academic: f64,
    pub interest: f64,
    pub geographic: f64,
    pub behavioral: f64,
    pub diversity: f64,
}

impl Default for DiscoveryWeights {
    fn default() -> Self {
        Self {
            academic: 0.20,
            interest: 0.25,
            geographic: 0.15,
            behavioral: 0.30,
            diversity: 0.10,
        }
    }
}

/// Exploration schedule for epsilon-greedy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationSchedule {
    pub base_rate: f64,
    pub decay: f64,
    pub min_rate: f64,
    /// Fraction of the ranked list explored from.
    pub top_fraction_divisor: usize,
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self {
            base_rate: 0.3,
            decay: 0.02,
            min_rate: 0.05,
            top_fraction_divisor: 5,
        }
    }
}

impl ExplorationSchedule {
    /// Exploration probability after `interactions` likes and dislikes.
    pub fn rate(&self, interactions: usize) -> f64 {
        (self.base_rate * (-self.decay * interactions as f64).exp()).max(self.min_rate)
    }
}

/// Academic similarity in \[0, 1\]: same university, same degree, close
/// graduation years.
pub fn academic_similarity(a: &Participant, b: &Participant) -> f64 {
    let mut score = 0.0;
    if a.university == b.university {
        score += 0.4;
    }
    if a.degree == b.degree {
        score += 0.3;
    }
    let year_gap = (a.graduation_year as i32 - b.graduation_year as i32).abs();
    if year_gap <= 1 {
        score += 0.3 * (1.0 - year_gap as f64 / 2.0);
    }
    score.min(1.0)
}

/// Jaccard similarity of interest sets, damped when the sets are identical
/// (×0.7) or overlap by more than 80% of the smaller set (×0.85).
pub fn interest_compatibility(a: &Participant, b: &Participant) -> f64 {
    let set_a: HashSet<&str> = a.interests.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.interests.iter().map(String::as_str).collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    let jaccard = intersection as f64 / union as f64;

    let multiplier = if intersection == set_a.len() && intersection == set_b.len() {
        0.7
    } else if intersection as f64 / set_a.len().min(set_b.len()) as f64 > 0.8 {
        0.85
    } else {
        1.0
    };
    jaccard * multiplier
}

pub fn geographic_score(a: &Participant, b: &Participant) -> f64 {
    if a.city == b.city {
        0.8
    } else {
        0.0
    }
}

/// Academic and interest similarity combined (0.4 / 0.6).
pub fn profile_similarity(a: &Participant, b: &Participant) -> f64 {
    academic_similarity(a, b) * 0.4 + interest_compatibility(a, b) * 0.6
}

/// Cold-start similarity from age, academics and interests.
pub fn demographic_similarity(a: &Participant, b: &Participant) -> f64 {
    let mut score = 0.0;
    let age_gap = (a.age as i64 - b.age as i64).abs();
    if age_gap <= 2 {
        score += 0.3 * (1.0 - age_gap as f64 / 5.0);
    }
    score += academic_similarity(a, b) * 0.5;
    score += interest_compatibility(a, b) * 0.2;
    score.min(1.0)
}

/// Recommends profiles one at a time.
pub struct DiscoveryEngine {
    profiles: ProfileStore,
    weights: DiscoveryWeights,
    exploration: ExplorationSchedule,
    rng: StdRng,
}

impl DiscoveryEngine {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            profiles: ProfileStore::new(),
            weights: DiscoveryWeights::default(),
            exploration: ExplorationSchedule::default(),
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
        }
    }

    pub fn with_weights(mut self, weights: DiscoveryWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_exploration(mut self, exploration: ExplorationSchedule) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn add_participant(&mut self, participant: Participant) -> Result<bool, ValidationError> {
        self.profiles.upsert(participant)
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Behavioural match of `candidate` against what `viewer` liked and
    /// disliked before. Falls back to demographic similarity with no likes.
    pub fn behavioral_match(&self, viewer: &Participant, candidate: &Participant) -> f64 {
        if viewer.liked_profiles.is_empty() {
            return demographic_similarity(viewer, candidate);
        }

        let similar: Vec<f64> = recent(&viewer.liked_profiles, 10)
            .iter()
            .filter_map(|id| self.profiles.get(id))
            .map(|liked| profile_similarity(candidate, liked))
            .filter(|&s| s > 0.3)
            .collect();
        if !similar.is_empty() {
            return similar.iter().sum::<f64>() / similar.len() as f64;
        }

        let resembles_dislike = recent(&viewer.disliked_profiles, 5)
            .iter()
            .filter_map(|id| self.profiles.get(id))
            .any(|disliked| profile_similarity(candidate, disliked) > 0.6);
        if resembles_dislike {
            0.1
        } else {
            0.5
        }
    }

    /// How different `candidate` is from the viewer's recent likes.
    pub fn diversity_bonus(&self, viewer: &Participant, candidate: &Participant) -> f64 {
        if viewer.liked_profiles.is_empty() {
            return 0.5;
        }
        let distances: Vec<f64> = recent(&viewer.liked_profiles, 5)
            .iter()
            .filter_map(|id| self.profiles.get(id))
            .map(|liked| 1.0 - profile_similarity(candidate, liked))
            .collect();
        if distances.is_empty() {
            0.5
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        }
    }

    /// Weighted compatibility of `candidate` for `viewer`.
    pub fn compatibility(&self, viewer: &Participant, candidate: &Participant) -> f64 {
        let w = &self.weights;
        academic_similarity(viewer, candidate) * w.academic
            + interest_compatibility(viewer, candidate) * w.interest
            + geographic_score(viewer, candidate) * w.geographic
            + self.behavioral_match(viewer, candidate) * w.behavioral
            + self.diversity_bonus(viewer, candidate) * w.diversity
    }

    pub fn exploration_rate(&self, viewer: &Participant) -> f64 {
        self.exploration
            .rate(viewer.liked_profiles.len() + viewer.disliked_profiles.len())
    }

    /// Pick the next profile for `viewer_id`, or `None` if the viewer is
    /// unknown or has seen everyone.
    pub fn select_next_profile(
        &mut self,
        viewer_id: &ParticipantId,
        max_candidates: usize,
    ) -> Option<ParticipantId> {
        let viewer = self.profiles.get(viewer_id)?;

        let seen: HashSet<&ParticipantId> = viewer
            .liked_profiles
            .iter()
            .chain(&viewer.disliked_profiles)
            .chain(std::iter::once(viewer_id))
            .collect();
        let mut pool: Vec<&Participant> = self
            .profiles
            .iter()
            .filter(|p| !seen.contains(&p.id))
            .collect();
        if pool.is_empty() {
            return None;
        }
        // Store iteration order is unspecified
        pool.sort_by(|a, b| a.id.cmp(&b.id));
        if pool.len() > max_candidates {
            pool = pool
                .choose_multiple(&mut self.rng, max_candidates)
                .copied()
                .collect();
        }

        let mut scored: Vec<(&Participant, f64)> = pool
            .into_iter()
            .map(|c| (c, self.compatibility(viewer, c)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));

        let explore = self.rng.gen::<f64>() < self.exploration_rate(viewer);
        let picked = if explore {
            let top = (scored.len() / self.exploration.top_fraction_divisor.max(1)).max(1);
            scored[..top]
                .choose(&mut self.rng)
                .map(|(p, _)| p.id.clone())
        } else {
            scored.first().map(|(p, _)| p.id.clone())
        };
        log::debug!(
            "recommendation for {}: {:?} ({})",
            viewer_id,
            picked,
            if explore { "explore" } else { "exploit" }
        );
        picked
    }

    /// Record a like or dislike. Returns `false` for an unknown viewer.
    pub fn record_feedback(
        &mut self,
        viewer_id: &ParticipantId,
        candidate_id: &ParticipantId,
        liked: bool,
    ) -> bool {
        let Some(viewer) = self.profiles.get_mut(viewer_id) else {
            return false;
        };
        if liked {
            viewer.liked_profiles.push(candidate_id.clone());
        } else {
            viewer.disliked_profiles.push(candidate_id.clone());
        }
        viewer.last_feedback_at = Some(Utc::now());
        true
    }
}

fn recent(ids: &[ParticipantId], n: usize) -> &[ParticipantId] {
    &ids[ids.len().saturating_sub(n)..]
}
