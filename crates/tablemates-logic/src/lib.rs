//! Dining group formation logic for Tablemates.
//!
//! This crate assigns people to small dining groups. Hard constraints (diet,
//! budget, city, languages) decide who may sit together at all; soft
//! preferences (interests, demographics, social style) decide which tables
//! are good. Functions take plain data and return results; the only
//! long-lived state is the profile store and placement history owned by a
//! [`matcher::GroupMatcher`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`allocator`] | Greedy set packing of scored candidates into disjoint groups |
//! | [`candidates`] | Exhaustive or sampled candidate generation per bucket |
//! | [`config`] | Matcher configuration, JSON loading and validation |
//! | [`discovery`] | One-to-one profile recommendations (epsilon-greedy) |
//! | [`error`] | Configuration, validation and formation errors |
//! | [`fairness`] | Score boost for under-served participants |
//! | [`history`] | Append-only placement log |
//! | [`matcher`] | End-to-end formation pipeline |
//! | [`monitor`] | Recommendation and formation metrics |
//! | [`partition`] | Hard-constraint bucketing |
//! | [`profile`] | Participant records and attribute enums |
//! | [`sample`] | Synthetic participants for demos and benchmarks |
//! | [`scoring`] | Four-factor group quality score |
//! | [`store`] | Participant storage keyed by id |

pub mod allocator;
pub mod candidates;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fairness;
pub mod history;
pub mod matcher;
pub mod monitor;
pub mod partition;
pub mod profile;
pub mod sample;
pub mod scoring;
pub mod store;
