//! End-to-end dining group formation.
//!
//! A formation run is a pure function of the candidate pool and the current
//! placement history, apart from appending the new placements to history:
//!
//! 1. Validate candidates and drop duplicate ids (first occurrence wins).
//! 2. Bucket by hard constraints; drop buckets smaller than one group.
//! 3. Generate candidate groups per bucket (exhaustive or sampled).
//! 4. Score each candidate and add the members' fairness contributions.
//! 5. Allocate a participant-disjoint subset.
//! 6. With `refill_leftovers`, repeat 3 to 5 over the unplaced members of
//!    every bucket that can still seat a full group.
//! 7. Record one placement per member of every selected group.
//!
//! `form_groups` takes `&mut self`, so two runs on one matcher can never
//! interleave their allocation phases.
//!
//! ```
//! use tablemates_logic::config::MatcherConfig;
//! use tablemates_logic::matcher::GroupMatcher;
//! use tablemates_logic::profile::{Gender, Participant};
//!
//! let config = MatcherConfig { seed: Some(1), ..MatcherConfig::default() };
//! let mut matcher = GroupMatcher::new(config).unwrap();
//! let pool: Vec<Participant> = (0..12)
//!     .map(|i| {
//!         let gender = Gender::ALL[i as usize % 3];
//!         Participant::new(format!("user_{i}"), 21 + i % 5, gender, "Delhi", "JNU")
//!     })
//!     .collect();
//! let groups = matcher.form_groups(&pool).unwrap();
//! assert_eq!(groups.len(), 2);
//! ```

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::allocator::{Allocator, ScoredCandidate};
use crate::candidates::{candidates, GenerationMode};
use crate::config::MatcherConfig;
use crate::error::{ConfigError, MatchError, ValidationError};
use crate::history::HistoryStore;
use crate::partition::{bucket_by_constraints, ConstraintKey};
use crate::profile::{Participant, ParticipantId};
use crate::scoring::{GroupScore, GroupScorer};
use crate::store::ProfileStore;

/// A finalised dining group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningGroup {
    /// Members ordered by id.
    pub members: Vec<Participant>,
    pub constraint_key: ConstraintKey,
    /// Fairness-adjusted score the allocator ranked this group by.
    pub score: f64,
}

impl DiningGroup {
    pub fn member_ids(&self) -> Vec<ParticipantId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Counters from the most recent formation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationReport {
    pub participants: usize,
    pub buckets_considered: usize,
    pub buckets_dropped: usize,
    pub candidates_scored: usize,
    pub groups_formed: usize,
    /// Allocation rounds that placed at least one group.
    pub rounds: usize,
    pub participants_unplaced: usize,
    pub deadline_hit: bool,
    pub allocator: String,
}

pub struct GroupMatcher {
    config: MatcherConfig,
    scorer: GroupScorer,
    allocator: Box<dyn Allocator + Send + Sync>,
    profiles: ProfileStore,
    history: HistoryStore,
    rng: StdRng,
    last_run: Option<FormationReport>,
}

impl GroupMatcher {
    /// Build a matcher, failing on the first configuration problem.
    pub fn new(config: MatcherConfig) -> Result<Self, ConfigError> {
        if let Some(err) = config.validate().into_iter().next() {
            return Err(err);
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            scorer: GroupScorer::new(config.weights.clone()),
            allocator: config.allocator.build(),
            profiles: ProfileStore::new(),
            history: HistoryStore::new(),
            rng,
            last_run: None,
            config,
        })
    }

    /// Build a matcher from a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, MatchError> {
        let config = MatcherConfig::from_json(json)?;
        Ok(Self::new(config)?)
    }

    /// Replace the placement history, e.g. with one restored by the caller.
    pub fn with_history(mut self, history: HistoryStore) -> Self {
        self.history = history;
        self
    }

    /// Swap in a different allocation strategy.
    pub fn with_allocator(mut self, allocator: Box<dyn Allocator + Send + Sync>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn last_run(&self) -> Option<&FormationReport> {
        self.last_run.as_ref()
    }

    /// Insert or replace a participant. Returns `true` on replacement.
    pub fn add_participant(&mut self, participant: Participant) -> Result<bool, ValidationError> {
        self.profiles.upsert(participant)
    }

    /// Quality score plus the members' fairness contributions.
    pub fn score_group<P: Borrow<Participant>>(&self, group: &[P]) -> f64 {
        self.scorer.score(group) + self.config.fairness.group_adjustment(group, &self.history)
    }

    /// Sub-scores without any fairness adjustment.
    pub fn score_breakdown<P: Borrow<Participant>>(&self, group: &[P]) -> GroupScore {
        self.scorer.breakdown(group)
    }

    /// Constraint keys that have enough members to form a group.
    pub fn qualifying_buckets(&self, participants: &[Participant]) -> Vec<ConstraintKey> {
        bucket_by_constraints(participants)
            .into_iter()
            .filter(|(_, members)| members.len() >= self.config.min_bucket_size())
            .map(|(key, _)| key)
            .collect()
    }

    /// Form groups from participants already in the profile store.
    /// Unknown ids are ignored.
    pub fn form_groups_from_store(
        &mut self,
        ids: &[ParticipantId],
    ) -> Result<Vec<DiningGroup>, MatchError> {
        let pool = self.profiles.resolve(ids);
        self.form_groups(&pool)
    }

    /// Run the full formation pipeline over `participants`.
    pub fn form_groups(
        &mut self,
        participants: &[Participant],
    ) -> Result<Vec<DiningGroup>, MatchError> {
        let mut seen = HashSet::new();
        let mut pool = Vec::with_capacity(participants.len());
        for p in participants {
            p.validate()?;
            if seen.insert(p.id.clone()) {
                pool.push(p.clone());
            } else {
                log::debug!("duplicate candidate {} ignored", p.id);
            }
        }

        let group_size = self.config.target_group_size;
        let min_bucket = self.config.min_bucket_size();
        let mut report = FormationReport {
            participants: pool.len(),
            allocator: self.allocator.name().to_string(),
            ..FormationReport::default()
        };

        let all_buckets = bucket_by_constraints(&pool);
        let buckets: Vec<(ConstraintKey, Vec<&Participant>)> = all_buckets
            .into_iter()
            .filter(|(_, members)| {
                let keep = members.len() >= min_bucket;
                if !keep {
                    report.buckets_dropped += 1;
                }
                keep
            })
            .collect();
        report.buckets_considered = buckets.len();
        log::debug!(
            "{} participants in {} viable buckets ({} too small)",
            pool.len(),
            report.buckets_considered,
            report.buckets_dropped
        );

        let deadline = self
            .config
            .scoring_deadline()
            .map(|limit| Instant::now() + limit);
        let mut placed: HashSet<ParticipantId> = HashSet::new();
        let mut selected = Vec::new();

        // Each round only sees members not yet placed, so rounds stay disjoint.
        loop {
            let open: Vec<OpenBucket<'_, '_>> = buckets
                .iter()
                .enumerate()
                .map(|(index, (key, members))| OpenBucket {
                    index,
                    key,
                    members: members
                        .iter()
                        .copied()
                        .filter(|m| !placed.contains(&m.id))
                        .collect(),
                })
                .filter(|bucket| bucket.members.len() >= group_size)
                .collect();
            if open.is_empty() {
                break;
            }

            let scored = self.score_round(&open, deadline, &mut report);
            let round = self.allocator.allocate(scored);
            if round.is_empty() {
                break;
            }
            report.rounds += 1;
            for candidate in &round {
                placed.extend(candidate.member_ids.iter().cloned());
            }
            selected.extend(round);

            if !self.config.refill_leftovers || report.deadline_hit {
                break;
            }
        }

        let by_id: HashMap<&ParticipantId, &Participant> =
            pool.iter().map(|p| (&p.id, p)).collect();
        let groups: Vec<DiningGroup> = selected
            .into_iter()
            .map(|candidate| DiningGroup {
                members: candidate
                    .member_ids
                    .iter()
                    .filter_map(|id| by_id.get(id).map(|p| (*p).clone()))
                    .collect(),
                constraint_key: buckets[candidate.bucket].0.clone(),
                score: candidate.score,
            })
            .collect();

        let placed_at = Utc::now();
        for group in &groups {
            self.history.record_group(&group.member_ids(), placed_at);
        }

        let seated: usize = groups.iter().map(DiningGroup::len).sum();
        report.groups_formed = groups.len();
        report.participants_unplaced = pool.len() - seated;
        log::info!(
            "formed {} groups from {} participants ({} unplaced, {} candidates scored)",
            report.groups_formed,
            report.participants,
            report.participants_unplaced,
            report.candidates_scored
        );
        self.last_run = Some(report);

        Ok(groups)
    }

    fn score_round(
        &mut self,
        open: &[OpenBucket<'_, '_>],
        deadline: Option<Instant>,
        report: &mut FormationReport,
    ) -> Vec<ScoredCandidate> {
        let group_size = self.config.target_group_size;
        let mut scored = Vec::new();

        'buckets: for bucket in open {
            match self.config.sampling.mode(bucket.members.len()) {
                GenerationMode::Exhaustive => log::debug!(
                    "bucket {} ({}): {} members, exhaustive",
                    bucket.index,
                    bucket.key.city,
                    bucket.members.len()
                ),
                GenerationMode::Sampled { draws } => log::debug!(
                    "bucket {} ({}): {} members, sampling {} draws",
                    bucket.index,
                    bucket.key.city,
                    bucket.members.len(),
                    draws
                ),
            }

            for group in candidates(
                &bucket.members,
                group_size,
                &self.config.sampling,
                &mut self.rng,
            ) {
                if deadline.is_some_and(|at| Instant::now() >= at) {
                    log::warn!(
                        "scoring deadline reached after {} candidates; allocating what was scored",
                        report.candidates_scored + scored.len()
                    );
                    report.deadline_hit = true;
                    break 'buckets;
                }
                let score = self.scorer.score(&group)
                    + self.config.fairness.group_adjustment(&group, &self.history);
                let ids = group.iter().map(|m| m.id.clone()).collect();
                scored.push(ScoredCandidate::new(ids, score, bucket.index));
            }
        }

        report.candidates_scored += scored.len();
        scored
    }
}

/// Unplaced members of one viable bucket.
struct OpenBucket<'k, 'p> {
    index: usize,
    key: &'k ConstraintKey,
    members: Vec<&'p Participant>,
}
