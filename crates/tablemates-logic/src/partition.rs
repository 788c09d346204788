//! Hard-constraint partitioning.
//!
//! Participants are bucketed by an exact match on diet, budget band, city and
//! sorted language set. Buckets are a prefilter: nobody is ever scored against
//! someone outside their bucket. Buckets too small to fill one group are
//! dropped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::profile::{BudgetBand, DietaryRestriction, Participant};

/// The hard constraints two participants must share to dine together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstraintKey {
    pub dietary_restriction: DietaryRestriction,
    pub budget: BudgetBand,
    pub city: String,
    /// Sorted ascending.
    pub languages: Vec<String>,
}

impl ConstraintKey {
    pub fn of(participant: &Participant) -> Self {
        Self {
            dietary_restriction: participant.dietary_restriction,
            budget: participant.budget,
            city: participant.city.clone(),
            // BTreeSet iterates in order
            languages: participant.languages.iter().cloned().collect(),
        }
    }
}

/// Bucket every participant by constraint key, keeping all buckets.
pub fn bucket_by_constraints(
    participants: &[Participant],
) -> BTreeMap<ConstraintKey, Vec<&Participant>> {
    let mut buckets: BTreeMap<ConstraintKey, Vec<&Participant>> = BTreeMap::new();
    for participant in participants {
        buckets
            .entry(ConstraintKey::of(participant))
            .or_default()
            .push(participant);
    }
    buckets
}

/// Bucket participants and drop buckets with fewer than `min_bucket_size`
/// members.
pub fn partition_by_constraints(
    participants: &[Participant],
    min_bucket_size: usize,
) -> BTreeMap<ConstraintKey, Vec<&Participant>> {
    let mut buckets = bucket_by_constraints(participants);
    buckets.retain(|_, members| members.len() >= min_bucket_size);
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Gender;

    fn person(id: &str, city: &str) -> Participant {
        Participant::new(id, 22, Gender::Female, city, "DTU")
    }

    fn people(prefix: &str, count: usize, city: &str) -> Vec<Participant> {
        (0..count)
            .map(|i| person(&format!("{prefix}{i}"), city))
            .collect()
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        assert!(partition_by_constraints(&[], 6).is_empty());
    }

    #[test]
    fn language_order_does_not_matter() {
        let a = person("a", "Delhi").with_languages(["Hindi", "English"]);
        let b = person("b", "Delhi").with_languages(["English", "Hindi"]);
        assert_eq!(ConstraintKey::of(&a), ConstraintKey::of(&b));
    }

    #[test]
    fn small_buckets_are_dropped() {
        let mut all = people("d", 6, "Delhi");
        all.extend(people("m", 5, "Mumbai"));
        let buckets = partition_by_constraints(&all, 6);
        assert_eq!(buckets.len(), 1);
        let (key, members) = buckets.iter().next().unwrap();
        assert_eq!(key.city, "Delhi");
        assert_eq!(members.len(), 6);
    }

    #[test]
    fn buckets_partition_the_input() {
        let mut all = people("d", 7, "Delhi");
        all.extend(people("b", 3, "Bangalore"));
        all[2] = all[2].clone().with_diet(DietaryRestriction::Vegan);
        let buckets = bucket_by_constraints(&all);
        let total: usize = buckets.values().map(Vec::len).sum();
        assert_eq!(total, all.len());
        assert_eq!(buckets.len(), 3);
    }

    #[test]
    fn different_budgets_never_share_a_bucket() {
        let mut all = people("x", 6, "Delhi");
        all[0] = all[0].clone().with_budget(BudgetBand::Premium);
        assert!(partition_by_constraints(&all, 6).is_empty());
    }
}
