//! Candidate group generation within one constraint bucket.
//!
//! Small buckets are enumerated exhaustively: C(20, 6) is 38,760 groups, which
//! is still cheap to score. Above the sampling threshold the number of
//! combinations explodes, so candidates are drawn at random instead:
//! `min(max_samples, bucket_len × samples_per_member)` independent draws, each
//! a uniform size-k subset. Draws are not deduplicated, and nothing guarantees
//! the best group is ever drawn.
//!
//! Randomness comes from the caller's RNG so a seeded generator reproduces the
//! exact candidate set.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::profile::Participant;

/// When and how much to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPolicy {
    /// Buckets larger than this are sampled rather than enumerated.
    pub threshold: usize,
    /// Upper bound on draws per bucket.
    pub max_samples: usize,
    /// Draws per bucket member, before the cap.
    pub samples_per_member: usize,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            threshold: 20,
            max_samples: 1000,
            samples_per_member: 10,
        }
    }
}

impl SamplingPolicy {
    /// How candidates will be produced for a bucket of `bucket_len`.
    pub fn mode(&self, bucket_len: usize) -> GenerationMode {
        if bucket_len > self.threshold {
            GenerationMode::Sampled {
                draws: self
                    .max_samples
                    .min(bucket_len.saturating_mul(self.samples_per_member)),
            }
        } else {
            GenerationMode::Exhaustive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Exhaustive,
    Sampled { draws: usize },
}

/// Lazily yields candidate groups for one bucket.
pub struct Candidates<'b, 'a, R: ?Sized> {
    bucket: &'b [&'a Participant],
    size: usize,
    source: Source<'b, R>,
}

enum Source<'b, R: ?Sized> {
    Exhaustive(Combinations),
    Sampled { rng: &'b mut R, remaining: usize },
}

impl<'b, 'a, R: Rng + ?Sized> Iterator for Candidates<'b, 'a, R> {
    type Item = Vec<&'a Participant>;

    fn next(&mut self) -> Option<Self::Item> {
        let bucket = self.bucket;
        match &mut self.source {
            Source::Exhaustive(combos) => combos
                .next()
                .map(|indices| indices.iter().map(|&i| bucket[i]).collect()),
            Source::Sampled { rng, remaining } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                Some(
                    bucket
                        .choose_multiple(&mut **rng, self.size)
                        .copied()
                        .collect(),
                )
            }
        }
    }
}

/// Candidate groups of `size` drawn from `bucket`.
///
/// Yields nothing when the bucket cannot fill a single group.
pub fn candidates<'b, 'a, R: Rng + ?Sized>(
    bucket: &'b [&'a Participant],
    size: usize,
    policy: &SamplingPolicy,
    rng: &'b mut R,
) -> Candidates<'b, 'a, R> {
    let source = if bucket.len() < size || size == 0 {
        Source::Exhaustive(Combinations::empty())
    } else {
        match policy.mode(bucket.len()) {
            GenerationMode::Exhaustive => Source::Exhaustive(Combinations::new(bucket.len(), size)),
            GenerationMode::Sampled { draws } => Source::Sampled {
                rng,
                remaining: draws,
            },
        }
    };
    Candidates {
        bucket,
        size,
        source,
    }
}

/// Collect every candidate for a bucket.
pub fn generate_candidates<'a, R: Rng + ?Sized>(
    bucket: &[&'a Participant],
    size: usize,
    policy: &SamplingPolicy,
    rng: &mut R,
) -> Vec<Vec<&'a Participant>> {
    candidates(bucket, size, policy, rng).collect()
}

/// Lexicographic k-combinations of `0..n`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }

    fn empty() -> Self {
        Self {
            n: 0,
            indices: Vec::new(),
            started: true,
            done: true,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }

        let k = self.indices.len();
        // Rightmost index that can still move right
        let Some(i) = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) else {
            self.done = true;
            return None;
        };
        self.indices[i] += 1;
        for j in (i + 1)..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}

/// n choose k, saturating.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: usize = 1;
    for i in 0..k {
        result = result.saturating_mul(n - i) / (i + 1);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Gender;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn bucket(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| Participant::new(format!("u{i}"), 22, Gender::Male, "Delhi", "DU"))
            .collect()
    }

    fn ids(group: &[&Participant]) -> Vec<String> {
        group.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn combinations_are_lexicographic() {
        let all: Vec<Vec<usize>> = Combinations::new(4, 2).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
    }

    #[test]
    fn combinations_edge_cases() {
        assert_eq!(Combinations::new(3, 3).count(), 1);
        assert_eq!(Combinations::new(3, 4).count(), 0);
        assert_eq!(binomial(20, 6), 38_760);
        assert_eq!(binomial(5, 6), 0);
    }

    #[test]
    fn small_bucket_is_exhaustive() {
        let people = bucket(8);
        let refs: Vec<&Participant> = people.iter().collect();
        let mut rng = StdRng::seed_from_u64(1);
        let groups = generate_candidates(&refs, 6, &SamplingPolicy::default(), &mut rng);
        assert_eq!(groups.len(), binomial(8, 6));

        let distinct: HashSet<Vec<String>> = groups.iter().map(|g| ids(g)).collect();
        assert_eq!(distinct.len(), groups.len());
    }

    #[test]
    fn bucket_at_threshold_is_exhaustive() {
        let policy = SamplingPolicy::default();
        assert_eq!(policy.mode(20), GenerationMode::Exhaustive);
        assert_eq!(policy.mode(21), GenerationMode::Sampled { draws: 210 });
        assert_eq!(policy.mode(500), GenerationMode::Sampled { draws: 1000 });
    }

    #[test]
    fn large_bucket_draws_capped_samples() {
        let people = bucket(30);
        let refs: Vec<&Participant> = people.iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        let groups = generate_candidates(&refs, 6, &SamplingPolicy::default(), &mut rng);
        assert_eq!(groups.len(), 300);
        for g in &groups {
            assert_eq!(g.len(), 6);
            let unique: HashSet<&str> = g.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(unique.len(), 6, "a draw must not repeat a member");
        }
    }

    #[test]
    fn sampling_is_reproducible_with_seed() {
        let people = bucket(25);
        let refs: Vec<&Participant> = people.iter().collect();
        let policy = SamplingPolicy::default();
        let a = generate_candidates(&refs, 6, &policy, &mut StdRng::seed_from_u64(99));
        let b = generate_candidates(&refs, 6, &policy, &mut StdRng::seed_from_u64(99));
        let a: Vec<Vec<String>> = a.iter().map(|g| ids(g)).collect();
        let b: Vec<Vec<String>> = b.iter().map(|g| ids(g)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn undersized_bucket_yields_nothing() {
        let people = bucket(5);
        let refs: Vec<&Participant> = people.iter().collect();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(generate_candidates(&refs, 6, &SamplingPolicy::default(), &mut rng).is_empty());
    }
}
