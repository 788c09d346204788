//! Group quality scoring.
//!
//! A candidate group's quality is a weighted sum of four sub-scores:
//!
//! | Sub-score | Signal | Default weight |
//! |-----------|--------|----------------|
//! | interest diversity | normalised Shannon entropy of pooled interest tags | 0.4 × 0.6 |
//! | conversation potential | share of pairs with a common interest, peaked at 70% | 0.4 × 0.4 |
//! | demographic balance | age spread, gender mix, university mix, status mix | 0.3 |
//! | social compatibility | alcohol and relationship-status mixes | 0.3 |
//!
//! Every sub-score has a defined value for degenerate groups (empty interest
//! pool, fewer than two members) so scoring never divides by zero.
//!
//! ```
//! use tablemates_logic::profile::{Gender, Participant};
//! use tablemates_logic::scoring::GroupScorer;
//!
//! let group: Vec<Participant> = (0..6)
//!     .map(|i| {
//!         Participant::new(format!("u{i}"), 22 + i, Gender::ALL[i as usize % 2], "Delhi", "JNU")
//!             .with_interests(["music"])
//!     })
//!     .collect();
//! let scorer = GroupScorer::default();
//! assert_eq!(scorer.interest_diversity(&group), 0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::ConfigError;
use crate::profile::{Participant, RelationshipStatus};

/// Tolerance used when checking that a weight family sums to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Every constant the group scorer uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of the combined interest score in the total.
    pub interest: f64,
    /// Share of the interest score taken by diversity.
    pub interest_diversity_share: f64,
    /// Share of the interest score taken by conversation potential.
    pub conversation_share: f64,
    pub demographic: f64,
    pub social: f64,

    // Demographic sub-weights
    pub age_spread: f64,
    pub gender_balance: f64,
    pub affiliation_diversity: f64,
    pub status_balance: f64,

    /// Ideal share of member pairs with at least one common interest.
    pub conversation_target: f64,
    /// Maximum deduction when every pair shares an interest.
    pub over_target_penalty: f64,
    /// Age standard deviation that counts as full spread.
    pub age_spread_norm: f64,
    /// Distinct universities that count as full diversity.
    pub affiliation_norm: f64,
    /// Status balance used when only one status is present.
    pub neutral_status_balance: f64,

    /// Inclusive band for the share of drinkers.
    pub alcohol_band: (f64, f64),
    pub alcohol_in_band: f64,
    pub alcohol_out_of_band: f64,
    /// Inclusive band for the share of singles.
    pub single_band: (f64, f64),
    pub single_in_band: f64,
    pub single_out_of_band: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            interest: 0.4,
            interest_diversity_share: 0.6,
            conversation_share: 0.4,
            demographic: 0.3,
            social: 0.3,
            age_spread: 0.3,
            gender_balance: 0.3,
            affiliation_diversity: 0.2,
            status_balance: 0.2,
            conversation_target: 0.7,
            over_target_penalty: 0.3,
            age_spread_norm: 3.0,
            affiliation_norm: 3.0,
            neutral_status_balance: 0.5,
            alcohol_band: (0.3, 0.7),
            alcohol_in_band: 1.0,
            alcohol_out_of_band: 0.7,
            single_band: (0.2, 0.8),
            single_in_band: 1.0,
            single_out_of_band: 0.8,
        }
    }
}

impl ScoringWeights {
    /// Return every inconsistency found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let families: [(&'static str, f64); 3] = [
            ("top-level", self.interest + self.demographic + self.social),
            (
                "interest split",
                self.interest_diversity_share + self.conversation_share,
            ),
            (
                "demographic",
                self.age_spread
                    + self.gender_balance
                    + self.affiliation_diversity
                    + self.status_balance,
            ),
        ];
        for (name, sum) in families {
            if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                errors.push(ConfigError::WeightSumMismatch { name, sum });
            }
        }

        if !(self.conversation_target > 0.0 && self.conversation_target < 1.0) {
            errors.push(ConfigError::InvalidWeight {
                name: "conversation_target",
                value: self.conversation_target,
            });
        }
        if self.age_spread_norm <= 0.0 {
            errors.push(ConfigError::InvalidWeight {
                name: "age_spread_norm",
                value: self.age_spread_norm,
            });
        }
        if self.affiliation_norm <= 0.0 {
            errors.push(ConfigError::InvalidWeight {
                name: "affiliation_norm",
                value: self.affiliation_norm,
            });
        }

        errors
    }
}

/// Per-component breakdown of a group score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupScore {
    pub interest_diversity: f64,
    pub conversation_potential: f64,
    pub demographic_balance: f64,
    pub social_compatibility: f64,
    /// Weighted total, before any fairness adjustment.
    pub total: f64,
}

/// Scores arbitrary groups of participants.
#[derive(Debug, Clone, Default)]
pub struct GroupScorer {
    weights: ScoringWeights,
}

impl GroupScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Weighted quality score of a group.
    pub fn score<P: Borrow<Participant>>(&self, group: &[P]) -> f64 {
        self.breakdown(group).total
    }

    /// All four sub-scores plus the weighted total.
    pub fn breakdown<P: Borrow<Participant>>(&self, group: &[P]) -> GroupScore {
        let w = &self.weights;
        let interest_diversity = self.interest_diversity(group);
        let conversation_potential = self.conversation_potential(group);
        let demographic_balance = self.demographic_balance(group);
        let social_compatibility = self.social_compatibility(group);

        let interest = interest_diversity * w.interest_diversity_share
            + conversation_potential * w.conversation_share;
        let total = interest * w.interest
            + demographic_balance * w.demographic
            + social_compatibility * w.social;

        GroupScore {
            interest_diversity,
            conversation_potential,
            demographic_balance,
            social_compatibility,
            total,
        }
    }

    /// Normalised Shannon entropy (base 2) of the pooled interest tags.
    ///
    /// The normaliser is the entropy of a uniform distribution over the
    /// distinct tags present, or 1.0 when only one tag exists. An empty pool
    /// scores 0. Terms are summed in tag order, so equal groups score
    /// bit-for-bit equal.
    pub fn interest_diversity<P: Borrow<Participant>>(&self, group: &[P]) -> f64 {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut mentions = 0usize;
        for member in group {
            for tag in &member.borrow().interests {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
                mentions += 1;
            }
        }
        if mentions == 0 {
            return 0.0;
        }

        let total = mentions as f64;
        let entropy: f64 = counts
            .values()
            .map(|&c| {
                let p = c as f64 / total;
                -p * p.log2()
            })
            .sum();

        let max_entropy = if counts.len() > 1 {
            (counts.len() as f64).log2()
        } else {
            1.0
        };
        entropy / max_entropy
    }

    /// Share of member pairs with at least one common interest.
    /// Zero when the group has fewer than two members.
    pub fn shared_interest_ratio<P: Borrow<Participant>>(&self, group: &[P]) -> f64 {
        let n = group.len();
        if n < 2 {
            return 0.0;
        }
        let sets: Vec<HashSet<&str>> = group
            .iter()
            .map(|m| m.borrow().interests.iter().map(String::as_str).collect())
            .collect();

        let mut shared = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                if !sets[i].is_disjoint(&sets[j]) {
                    shared += 1;
                }
            }
        }
        let pairs = n * (n - 1) / 2;
        shared as f64 / pairs as f64
    }

    /// Conversation potential: rises linearly to 1.0 at the target ratio,
    /// then falls off by up to `over_target_penalty` as the ratio nears 1.
    pub fn conversation_potential<P: Borrow<Participant>>(&self, group: &[P]) -> f64 {
        let w = &self.weights;
        let ratio = self.shared_interest_ratio(group);
        if ratio <= w.conversation_target {
            ratio / w.conversation_target
        } else {
            let excess = (ratio - w.conversation_target) / (1.0 - w.conversation_target);
            1.0 - excess * w.over_target_penalty
        }
    }

    /// Demographic balance across age, gender, university and relationship
    /// status. Zero for groups smaller than two.
    ///
    /// Age spread is the population standard deviation (divide by n), not
    /// the sample form.
    pub fn demographic_balance<P: Borrow<Participant>>(&self, group: &[P]) -> f64 {
        let n = group.len();
        if n < 2 {
            return 0.0;
        }
        let w = &self.weights;
        let size = n as f64;

        let ages: Vec<f64> = group.iter().map(|m| m.borrow().age as f64).collect();
        let age_balance = (std_dev(&ages) / w.age_spread_norm).min(1.0);

        let mut genders = HashMap::new();
        for m in group {
            *genders.entry(m.borrow().gender).or_insert(0usize) += 1;
        }
        let minority = genders.values().copied().min().unwrap_or(0) as f64 / size;
        let gender_balance = 1.0 - (0.5 - minority).abs() * 2.0;

        let universities: HashSet<&str> = group
            .iter()
            .map(|m| m.borrow().university.as_str())
            .collect();
        let affiliation = (universities.len() as f64 / w.affiliation_norm).min(1.0);

        let mut statuses = HashMap::new();
        for m in group {
            *statuses
                .entry(m.borrow().relationship_status)
                .or_insert(0usize) += 1;
        }
        let status_balance = if statuses.len() > 1 {
            let majority = statuses.values().copied().max().unwrap_or(0) as f64 / size;
            1.0 - (majority - 1.0 / statuses.len() as f64)
        } else {
            w.neutral_status_balance
        };

        age_balance * w.age_spread
            + gender_balance * w.gender_balance
            + affiliation * w.affiliation_diversity
            + status_balance * w.status_balance
    }

    /// Mean of the alcohol-mix and single-mix indicators.
    /// Zero for an empty group.
    pub fn social_compatibility<P: Borrow<Participant>>(&self, group: &[P]) -> f64 {
        if group.is_empty() {
            return 0.0;
        }
        let w = &self.weights;
        let size = group.len() as f64;

        let drinkers = group.iter().filter(|&m| m.borrow().alcohol).count() as f64 / size;
        let alcohol = if in_band(drinkers, w.alcohol_band) {
            w.alcohol_in_band
        } else {
            w.alcohol_out_of_band
        };

        let singles = group
            .iter()
            .filter(|&m| m.borrow().relationship_status == RelationshipStatus::Single)
            .count() as f64
            / size;
        let relationship = if in_band(singles, w.single_band) {
            w.single_in_band
        } else {
            w.single_out_of_band
        };

        (alcohol + relationship) / 2.0
    }
}

fn in_band(value: f64, (low, high): (f64, f64)) -> bool {
    (low..=high).contains(&value)
}

/// Population standard deviation. Zero for fewer than two values.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Gender;

    const EPS: f64 = 1e-9;

    fn member(id: &str, interests: &[&str]) -> Participant {
        Participant::new(id, 24, Gender::Male, "Delhi", "DU")
            .with_interests(interests.iter().copied())
    }

    #[test]
    fn diversity_zero_for_single_tag() {
        let group: Vec<_> = (0..6)
            .map(|i| member(&format!("u{i}"), &["music"]))
            .collect();
        assert_eq!(GroupScorer::default().interest_diversity(&group), 0.0);
    }

    #[test]
    fn diversity_zero_for_empty_pool() {
        let group: Vec<_> = (0..3).map(|i| member(&format!("u{i}"), &[])).collect();
        assert_eq!(GroupScorer::default().interest_diversity(&group), 0.0);
    }

    #[test]
    fn diversity_one_for_uniform_tags() {
        let group = vec![
            member("a", &["music", "art"]),
            member("b", &["hiking", "yoga"]),
        ];
        let d = GroupScorer::default().interest_diversity(&group);
        assert!((d - 1.0).abs() < EPS);
    }

    #[test]
    fn diversity_skewed_distribution() {
        // 3× music, 1× art: H = 0.8113, normaliser log2(2) = 1
        let group = vec![
            member("a", &["music", "art"]),
            member("b", &["music"]),
            member("c", &["music"]),
        ];
        let d = GroupScorer::default().interest_diversity(&group);
        assert!((d - 0.811_278_124_459_132_8).abs() < 1e-9);
    }

    #[test]
    fn disjoint_interests_have_no_conversation_potential() {
        let group = vec![
            member("a", &["music"]),
            member("b", &["art"]),
            member("c", &["yoga"]),
        ];
        let scorer = GroupScorer::default();
        assert_eq!(scorer.shared_interest_ratio(&group), 0.0);
        assert_eq!(scorer.conversation_potential(&group), 0.0);
    }

    #[test]
    fn conversation_potential_peaks_at_target() {
        let scorer = GroupScorer::default();
        // 5 members, pairs = 10; link 7 pairs via a shared tag
        // a,b,c share "x" (3 pairs); d,e share "y" (1 pair);
        // a,d share "z"; b,e share "w"; c,d share "v"
        let group = vec![
            member("a", &["x", "z"]),
            member("b", &["x", "w"]),
            member("c", &["x", "v"]),
            member("d", &["y", "z", "v"]),
            member("e", &["y", "w"]),
        ];
        let ratio = scorer.shared_interest_ratio(&group);
        assert!((ratio - 0.7).abs() < EPS);
        assert!((scorer.conversation_potential(&group) - 1.0).abs() < EPS);
    }

    #[test]
    fn conversation_potential_penalises_full_overlap() {
        let group: Vec<_> = (0..4)
            .map(|i| member(&format!("u{i}"), &["music"]))
            .collect();
        let c = GroupScorer::default().conversation_potential(&group);
        assert!((c - 0.7).abs() < EPS);
    }

    #[test]
    fn single_member_has_no_pairs() {
        let group = vec![member("a", &["music"])];
        let scorer = GroupScorer::default();
        assert_eq!(scorer.shared_interest_ratio(&group), 0.0);
        assert_eq!(scorer.demographic_balance(&group), 0.0);
    }

    #[test]
    fn demographic_balance_of_homogeneous_group() {
        // Same age, one gender, one university, one status:
        // age 0, gender 1 - |0.5 - 1| * 2 = 0, affiliation 1/3, status 0.5
        let group: Vec<_> = (0..4).map(|i| member(&format!("u{i}"), &[])).collect();
        let b = GroupScorer::default().demographic_balance(&group);
        let expected = 0.2 / 3.0 + 0.5 * 0.2;
        assert!((b - expected).abs() < EPS);
    }

    #[test]
    fn demographic_balance_of_mixed_group() {
        let mut group = Vec::new();
        for (i, uni) in ["DU", "JNU", "DTU", "IIT Delhi"].iter().enumerate() {
            let mut p = Participant::new(
                format!("u{i}"),
                20 + 3 * i as u32,
                Gender::ALL[i % 2],
                "Delhi",
                *uni,
            );
            p.relationship_status = if i % 2 == 0 {
                RelationshipStatus::Single
            } else {
                RelationshipStatus::InRelationship
            };
            group.push(p);
        }
        // ages 20,23,26,29: population std = sqrt(11.25) = 3.354 → capped 1.0
        // gender 2/2 → 1.0; 4 universities → 1.0; statuses 2/2 → 1 - (0.5 - 0.5) = 1.0
        let b = GroupScorer::default().demographic_balance(&group);
        assert!((b - 1.0).abs() < EPS);
    }

    #[test]
    fn social_compatibility_bands() {
        let scorer = GroupScorer::default();
        let mut group: Vec<_> = (0..4).map(|i| member(&format!("u{i}"), &[])).collect();
        // nobody drinks, everyone single: 0.7 and 0.8
        assert!((scorer.social_compatibility(&group) - 0.75).abs() < EPS);

        group[0].alcohol = true;
        group[1].alcohol = true;
        group[2].relationship_status = RelationshipStatus::NotLooking;
        // drinkers 0.5, singles 0.75
        assert!((scorer.social_compatibility(&group) - 1.0).abs() < EPS);
    }

    #[test]
    fn social_compatibility_of_empty_group_is_zero() {
        let group: Vec<Participant> = Vec::new();
        assert_eq!(GroupScorer::default().social_compatibility(&group), 0.0);
    }

    #[test]
    fn total_matches_weighted_breakdown() {
        let group = vec![
            member("a", &["music", "art"]),
            member("b", &["music", "yoga"]),
            member("c", &["hiking"]),
        ];
        let scorer = GroupScorer::default();
        let s = scorer.breakdown(&group);
        let expected = (s.interest_diversity * 0.6 + s.conversation_potential * 0.4) * 0.4
            + s.demographic_balance * 0.3
            + s.social_compatibility * 0.3;
        assert!((s.total - expected).abs() < EPS);
        assert_eq!(scorer.score(&group), s.total);
    }

    #[test]
    fn accepts_borrowed_members() {
        let owned = vec![member("a", &["music"]), member("b", &["art"])];
        let borrowed: Vec<&Participant> = owned.iter().collect();
        let scorer = GroupScorer::default();
        assert_eq!(scorer.score(&owned), scorer.score(&borrowed));
    }

    #[test]
    fn social_compatibility_with_borrowed_members() {
        let mut owned: Vec<_> = (0..4).map(|i| member(&format!("u{i}"), &[])).collect();
        owned[0].alcohol = true;
        owned[1].alcohol = true;
        owned[2].relationship_status = RelationshipStatus::NotLooking;
        let borrowed: Vec<&Participant> = owned.iter().collect();
        let scorer = GroupScorer::default();
        assert!((scorer.social_compatibility(&borrowed) - 1.0).abs() < EPS);
        assert_eq!(
            scorer.social_compatibility(&borrowed),
            scorer.social_compatibility(&owned)
        );
    }

    #[test]
    fn repeated_scores_are_bitwise_equal() {
        use crate::sample::create_sample_participants;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let people = create_sample_participants(600, &mut StdRng::seed_from_u64(3));
        let scorer = GroupScorer::default();
        for group in people.chunks(6) {
            let diversity = scorer.interest_diversity(group).to_bits();
            let total = scorer.score(group).to_bits();
            for _ in 0..50 {
                assert_eq!(scorer.interest_diversity(group).to_bits(), diversity);
                assert_eq!(scorer.score(group).to_bits(), total);
            }
        }
    }

    #[test]
    fn age_spread_uses_population_std_dev() {
        // sample form would give sqrt(2)
        assert!((std_dev(&[20.0, 22.0]) - 1.0).abs() < EPS);
        assert_eq!(std_dev(&[30.0]), 0.0);
    }

    #[test]
    fn default_weights_validate() {
        assert!(ScoringWeights::default().validate().is_empty());
    }

    #[test]
    fn mismatched_weights_are_reported() {
        let weights = ScoringWeights {
            demographic: 0.5,
            conversation_target: 1.0,
            ..ScoringWeights::default()
        };
        let errors = weights.validate();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0],
            ConfigError::WeightSumMismatch {
                name: "top-level",
                ..
            }
        ));
    }
}
