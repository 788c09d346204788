//! Tablemates Headless Harness
//!
//! Runs group formation and discovery over synthetic participants and checks
//! the invariants the service depends on. Entirely in-process: no database,
//! no networking.
//!
//! Usage:
//!   cargo run -p tablemates-simtest
//!   cargo run -p tablemates-simtest -- --verbose --seed 7
//!   cargo run -p tablemates-simtest -- --config matcher.json

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tablemates_logic::candidates::{generate_candidates, GenerationMode, SamplingPolicy};
use tablemates_logic::config::MatcherConfig;
use tablemates_logic::discovery::{DiscoveryEngine, DEFAULT_MAX_CANDIDATES};
use tablemates_logic::matcher::{DiningGroup, GroupMatcher};
use tablemates_logic::monitor::AlgorithmMonitor;
use tablemates_logic::partition::{bucket_by_constraints, partition_by_constraints, ConstraintKey};
use tablemates_logic::profile::{Gender, Participant, ParticipantId};
use tablemates_logic::sample::{create_sample_participants, create_uniform_participants};
use tablemates_logic::scoring::GroupScorer;

#[derive(Parser)]
#[command(name = "tablemates-simtest")]
#[command(about = "Headless checks for dining group formation and discovery", long_about = None)]
struct Args {
    /// Print every check, not only failures
    #[arg(short, long)]
    verbose: bool,

    /// Seed for sample data and candidate sampling
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Matcher configuration as JSON; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Size of the varied sample pool
    #[arg(long, default_value_t = 200)]
    participants: usize,

    /// Size of the uniform pool used for the timing run
    #[arg(long, default_value_t = 1000)]
    perf_participants: usize,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let args = Args::parse();

    let filter = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    println!("=== Tablemates Harness ===\n");

    let base = match load_config(&args) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Constraint bucketing
    results.extend(validate_partition(&args));

    // 2. Score ranges and edge cases
    results.extend(validate_scoring(&args, &base));

    // 3. End-to-end formation scenarios
    results.extend(validate_formation(&args, &base));

    // 4. Fairness boost
    results.extend(validate_fairness(&args, &base));

    // 5. Candidate sampling
    results.extend(validate_sampling(&args, &base));

    // 6. One-to-one discovery
    results.extend(validate_discovery(&args));

    // 7. Monitoring counters
    results.extend(validate_monitor(&args, &base));

    // 8. Timing on a large uniform pool
    results.extend(validate_performance(&args, &base));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<MatcherConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            MatcherConfig::from_json(&json).map_err(|e| format!("{}: {}", path.display(), e))?
        }
        None => MatcherConfig::default(),
    };
    if config.seed.is_none() {
        config.seed = Some(args.seed);
    }
    Ok(config)
}

fn matcher(base: &MatcherConfig) -> Result<GroupMatcher, String> {
    GroupMatcher::new(base.clone()).map_err(|e| e.to_string())
}

/// One bucket worth of participants sharing every hard constraint.
fn one_bucket(count: usize, prefix: &str) -> Vec<Participant> {
    const INTERESTS: [&str; 8] = [
        "music", "hiking", "cooking", "art", "gaming", "reading", "yoga", "movies",
    ];
    (0..count)
        .map(|i| {
            Participant::new(
                format!("{prefix}_{i:02}"),
                20 + (i % 9) as u32,
                Gender::ALL[i % 3],
                "Delhi",
                ["DU", "JNU", "DTU"][i % 3],
            )
            .with_interests([
                INTERESTS[i % 8],
                INTERESTS[(i + 3) % 8],
                INTERESTS[(i * 5 + 1) % 8],
            ])
            .with_alcohol(i % 2 == 0)
        })
        .collect()
}

fn disjoint(groups: &[DiningGroup]) -> bool {
    let mut seen = HashSet::new();
    groups
        .iter()
        .flat_map(DiningGroup::member_ids)
        .all(|id| seen.insert(id))
}

fn respects_constraints(groups: &[DiningGroup]) -> bool {
    groups.iter().all(|g| {
        g.members
            .iter()
            .all(|m| ConstraintKey::of(m) == g.constraint_key)
    })
}

// ── 1. Partition ────────────────────────────────────────────────────────

fn validate_partition(args: &Args) -> Vec<TestResult> {
    println!("--- Constraint Buckets ---");
    let mut results = Vec::new();
    let people =
        create_sample_participants(args.participants, &mut StdRng::seed_from_u64(args.seed));

    let buckets = bucket_by_constraints(&people);
    let bucketed: usize = buckets.values().map(Vec::len).sum();
    results.push(TestResult::new(
        "partition_covers_everyone",
        bucketed == people.len(),
        format!("{} participants in {} buckets", bucketed, buckets.len()),
    ));

    let mismatched = buckets
        .iter()
        .flat_map(|(key, members)| members.iter().filter(move |m| ConstraintKey::of(m) != *key))
        .count();
    results.push(TestResult::new(
        "partition_keys_match_members",
        mismatched == 0,
        format!("{} misplaced participants", mismatched),
    ));

    let viable = partition_by_constraints(&people, 6);
    let too_small = viable.values().filter(|m| m.len() < 6).count();
    results.push(TestResult::new(
        "partition_drops_small_buckets",
        too_small == 0,
        format!(
            "{} of {} buckets can seat a table",
            viable.len(),
            buckets.len()
        ),
    ));

    if args.verbose {
        for (key, members) in viable.iter().take(5) {
            println!(
                "  {:<10} {:<10} {:<8} {:?}: {}",
                key.city,
                format!("{:?}", key.dietary_restriction),
                key.budget.label(),
                key.languages,
                members.len()
            );
        }
    }

    results
}

// ── 2. Scoring ──────────────────────────────────────────────────────────

fn validate_scoring(args: &Args, base: &MatcherConfig) -> Vec<TestResult> {
    println!("--- Group Scoring ---");
    let mut results = Vec::new();
    let scorer = GroupScorer::new(base.weights.clone());
    let people = create_sample_participants(
        args.participants.max(6),
        &mut StdRng::seed_from_u64(args.seed),
    );

    let mut out_of_range = 0;
    let mut checked = 0;
    for window in people.windows(6).step_by(3) {
        let s = scorer.breakdown(window);
        checked += 1;
        let parts = [
            s.interest_diversity,
            s.conversation_potential,
            s.demographic_balance,
            s.social_compatibility,
            s.total,
        ];
        if parts.iter().any(|v| !(0.0..=1.0).contains(v)) {
            out_of_range += 1;
        }
    }
    results.push(TestResult::new(
        "scores_in_unit_range",
        out_of_range == 0,
        format!("{} of {} groups out of range", out_of_range, checked),
    ));

    let one_tag: Vec<Participant> = one_bucket(6, "same")
        .into_iter()
        .map(|p| p.with_interests(["music"]))
        .collect();
    let diversity = scorer.interest_diversity(&one_tag);
    results.push(TestResult::new(
        "single_interest_has_no_diversity",
        diversity.abs() < 1e-12,
        format!("diversity = {:.4}", diversity),
    ));

    let single = one_bucket(1, "solo");
    let balance = scorer.demographic_balance(&single);
    results.push(TestResult::new(
        "single_member_has_no_balance",
        balance == 0.0,
        format!("balance = {:.4}", balance),
    ));

    let empty: [Participant; 0] = [];
    results.push(TestResult::new(
        "empty_group_scores_zero",
        scorer.score(&empty) == 0.0,
        format!("score = {:.4}", scorer.score(&empty)),
    ));

    results
}

// ── 3. Formation ────────────────────────────────────────────────────────

fn validate_formation(args: &Args, base: &MatcherConfig) -> Vec<TestResult> {
    println!("--- Group Formation ---");
    let mut results = Vec::new();

    let mut m = match matcher(base) {
        Ok(m) => m,
        Err(e) => return vec![TestResult::new("formation_matcher", false, e)],
    };

    // Twenty-five people, one constraint key
    match m.form_groups(&one_bucket(25, "big")) {
        Ok(groups) => {
            let full = groups.iter().all(|g| g.len() == base.target_group_size);
            results.push(TestResult::new(
                "bucket_of_25_seats_four_tables",
                groups.len() >= 4 && full,
                format!("{} groups, all full = {}", groups.len(), full),
            ));
            results.push(TestResult::new(
                "bucket_of_25_groups_disjoint",
                disjoint(&groups),
                "no participant seated twice",
            ));
        }
        Err(e) => results.push(TestResult::new(
            "bucket_of_25_seats_four_tables",
            false,
            e.to_string(),
        )),
    }

    // Five people cannot fill a table
    match m.form_groups(&one_bucket(5, "small")) {
        Ok(groups) => results.push(TestResult::new(
            "bucket_of_5_forms_nothing",
            groups.is_empty(),
            format!("{} groups", groups.len()),
        )),
        Err(e) => results.push(TestResult::new(
            "bucket_of_5_forms_nothing",
            false,
            e.to_string(),
        )),
    }

    // Varied pool
    let people =
        create_sample_participants(args.participants, &mut StdRng::seed_from_u64(args.seed));
    match m.form_groups(&people) {
        Ok(groups) => {
            results.push(TestResult::new(
                "sample_groups_respect_constraints",
                respects_constraints(&groups),
                format!("{} groups checked", groups.len()),
            ));
            results.push(TestResult::new(
                "sample_groups_disjoint",
                disjoint(&groups),
                "no participant seated twice",
            ));
            let bounded = groups
                .iter()
                .all(|g| (0.0..=1.0 + 6.0 * 0.015).contains(&g.score));
            results.push(TestResult::new(
                "sample_group_scores_bounded",
                bounded,
                "adjusted scores within [0, 1 + fairness]",
            ));
            if let Some(report) = m.last_run() {
                results.push(TestResult::new(
                    "sample_report_consistent",
                    report.groups_formed == groups.len()
                        && report.participants_unplaced
                            + groups.iter().map(DiningGroup::len).sum::<usize>()
                            == report.participants,
                    format!(
                        "{} buckets, {} dropped, {} candidates, {} rounds, {} unplaced",
                        report.buckets_considered,
                        report.buckets_dropped,
                        report.candidates_scored,
                        report.rounds,
                        report.participants_unplaced
                    ),
                ));
            }
        }
        Err(e) => results.push(TestResult::new(
            "sample_groups_respect_constraints",
            false,
            e.to_string(),
        )),
    }

    // Same seed, same groups
    let run = |config: &MatcherConfig| -> Option<Vec<Vec<ParticipantId>>> {
        let mut m = GroupMatcher::new(config.clone()).ok()?;
        let groups = m.form_groups(&people).ok()?;
        Some(groups.iter().map(DiningGroup::member_ids).collect())
    };
    let first = run(base);
    results.push(TestResult::new(
        "formation_deterministic_with_seed",
        first.is_some() && first == run(base),
        "two runs with one seed agree",
    ));

    results
}

// ── 4. Fairness ─────────────────────────────────────────────────────────

fn validate_fairness(args: &Args, base: &MatcherConfig) -> Vec<TestResult> {
    println!("--- Fairness ---");
    let mut results = Vec::new();
    let policy = &base.fairness;

    let boosts: Vec<f64> = (0..4).map(|n| policy.boost_for(n)).collect();
    results.push(TestResult::new(
        "boost_only_for_underserved",
        boosts[0] == 0.0 && boosts[3] == 0.0 && boosts[1] > 0.0 && boosts[1] == boosts[2],
        format!("boosts for 0..=3 placements: {:?}", boosts),
    ));

    let mut m = match matcher(base) {
        Ok(m) => m,
        Err(e) => return vec![TestResult::new("fairness_matcher", false, e)],
    };
    let table = one_bucket(base.target_group_size, "fair");
    let before = m.score_group(&table);
    if let Err(e) = m.form_groups(&table) {
        results.push(TestResult::new(
            "fairness_boost_after_placement",
            false,
            e.to_string(),
        ));
        return results;
    }
    let after = m.score_group(&table);
    let expected = table.len() as f64 * policy.boost * policy.member_damping;
    if args.verbose {
        println!(
            "  score before {:.4}, after one placement {:.4}",
            before, after
        );
    }
    results.push(TestResult::new(
        "fairness_boost_after_placement",
        ((after - before) - expected).abs() < 1e-9,
        format!("delta {:.4}, expected {:.4}", after - before, expected),
    ));

    results
}

// ── 5. Sampling ─────────────────────────────────────────────────────────

fn validate_sampling(args: &Args, base: &MatcherConfig) -> Vec<TestResult> {
    println!("--- Candidate Sampling ---");
    let mut results = Vec::new();
    let people = one_bucket(30, "draw");
    let bucket: Vec<&Participant> = people.iter().collect();
    let policy = SamplingPolicy::default();
    let size = base.target_group_size;

    let draws = generate_candidates(
        &bucket,
        size,
        &policy,
        &mut StdRng::seed_from_u64(args.seed),
    );
    results.push(TestResult::new(
        "bucket_of_30_draws_300",
        draws.len() == 300 && policy.mode(30) == GenerationMode::Sampled { draws: 300 },
        format!("{} candidates", draws.len()),
    ));

    let distinct = draws.iter().all(|c| {
        let ids: HashSet<_> = c.iter().map(|p| &p.id).collect();
        c.len() == size && ids.len() == size
    });
    results.push(TestResult::new(
        "sampled_candidates_have_distinct_members",
        distinct,
        format!("every draw has {} distinct members", size),
    ));

    let exhaustive = generate_candidates(
        &bucket[..8],
        size,
        &policy,
        &mut StdRng::seed_from_u64(args.seed),
    );
    results.push(TestResult::new(
        "small_bucket_enumerated",
        exhaustive.len() == 28,
        format!("{} combinations of 8 choose 6", exhaustive.len()),
    ));

    results
}

// ── 6. Discovery ────────────────────────────────────────────────────────

fn validate_discovery(args: &Args) -> Vec<TestResult> {
    println!("--- Discovery ---");
    let mut results = Vec::new();
    let people = create_sample_participants(20, &mut StdRng::seed_from_u64(args.seed));
    let viewer = people[0].id.clone();

    let mut engine = DiscoveryEngine::new(Some(args.seed));
    for p in people.iter().cloned() {
        if let Err(e) = engine.add_participant(p) {
            results.push(TestResult::new(
                "discovery_accepts_samples",
                false,
                e.to_string(),
            ));
            return results;
        }
    }

    let mut shown = HashSet::new();
    while let Some(next) = engine.select_next_profile(&viewer, DEFAULT_MAX_CANDIDATES) {
        if next == viewer || !shown.insert(next.clone()) {
            break;
        }
        engine.record_feedback(&viewer, &next, shown.len() % 2 == 0);
    }
    results.push(TestResult::new(
        "discovery_shows_each_profile_once",
        shown.len() == people.len() - 1 && !shown.contains(&viewer),
        format!("{} profiles shown before exhaustion", shown.len()),
    ));

    let unknown = ParticipantId::from("nobody");
    results.push(TestResult::new(
        "discovery_unknown_viewer",
        engine
            .select_next_profile(&unknown, DEFAULT_MAX_CANDIDATES)
            .is_none()
            && !engine.record_feedback(&unknown, &viewer, true),
        "unknown viewers get nothing",
    ));

    let out_of_range = people
        .iter()
        .skip(1)
        .filter_map(|c| {
            let v = engine.profiles().get(&viewer)?;
            let score = engine.compatibility(v, c);
            (!(0.0..=1.0 + 1e-9).contains(&score)).then_some(score)
        })
        .count();
    results.push(TestResult::new(
        "discovery_compatibility_bounded",
        out_of_range == 0,
        format!("{} scores outside [0, 1]", out_of_range),
    ));

    results
}

// ── 7. Monitor ──────────────────────────────────────────────────────────

fn validate_monitor(args: &Args, base: &MatcherConfig) -> Vec<TestResult> {
    println!("--- Monitoring ---");
    let mut results = Vec::new();
    let mut monitor = AlgorithmMonitor::new();

    let mut m = match matcher(base) {
        Ok(m) => m,
        Err(e) => return vec![TestResult::new("monitor_matcher", false, e)],
    };
    let people =
        create_sample_participants(args.participants, &mut StdRng::seed_from_u64(args.seed));
    let started = Instant::now();
    let groups = match m.form_groups(&people) {
        Ok(groups) => groups,
        Err(e) => return vec![TestResult::new("monitor_formation", false, e.to_string())],
    };
    let latency = started.elapsed().as_secs_f64() * 1000.0 / groups.len().max(1) as f64;
    for (i, g) in groups.iter().enumerate() {
        monitor.record_group_formation(latency, g.len(), Some((i % 5) as f64 + 1.0));
    }

    let summary = monitor.summary();
    results.push(TestResult::new(
        "monitor_counts_groups",
        summary.total_groups == groups.len() as u64
            && monitor.formation.participants_placed
                == groups.iter().map(|g| g.len() as u64).sum::<u64>(),
        format!(
            "{} groups, avg satisfaction {:.2}, avg latency {:.3} ms",
            summary.total_groups, summary.avg_satisfaction, summary.avg_formation_latency_ms
        ),
    ));

    monitor.record_recommendation(1.0, true, true);
    monitor.record_recommendation(1.0, true, false);
    results.push(TestResult::new(
        "monitor_mutual_like_rate",
        (monitor.summary().mutual_like_rate - 50.0).abs() < 1e-9,
        format!("{:.1}%", monitor.summary().mutual_like_rate),
    ));

    results
}

// ── 8. Performance ──────────────────────────────────────────────────────

fn validate_performance(args: &Args, base: &MatcherConfig) -> Vec<TestResult> {
    println!("--- Performance ---");
    let mut results = Vec::new();
    let people = create_uniform_participants(
        args.perf_participants,
        &mut StdRng::seed_from_u64(args.seed),
    );

    let mut m = match matcher(base) {
        Ok(m) => m,
        Err(e) => return vec![TestResult::new("performance_matcher", false, e)],
    };
    let started = Instant::now();
    let groups = match m.form_groups(&people) {
        Ok(groups) => groups,
        Err(e) => return vec![TestResult::new("performance_run", false, e.to_string())],
    };
    let elapsed = started.elapsed();

    let buckets = m.last_run().map_or(0, |r| r.buckets_considered);
    let unplaced = m
        .last_run()
        .map_or(people.len(), |r| r.participants_unplaced);
    let leftover_bound = buckets * (base.target_group_size - 1);
    results.push(TestResult::new(
        "large_pool_mostly_seated",
        !base.refill_leftovers || unplaced <= leftover_bound,
        format!(
            "{} groups from {} participants, {} unplaced, {:.1} ms",
            groups.len(),
            people.len(),
            unplaced,
            elapsed.as_secs_f64() * 1000.0
        ),
    ));
    results.push(TestResult::new(
        "large_pool_disjoint",
        disjoint(&groups) && respects_constraints(&groups),
        format!("{} buckets", buckets),
    ));

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_args() -> Args {
        Args::parse_from(["tablemates-simtest", "--participants", "60"])
    }

    fn failures(results: &[TestResult]) -> Vec<String> {
        results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| format!("{}: {}", r.name, r.detail))
            .collect()
    }

    #[test]
    fn scoring_checks_pass_with_defaults() {
        let args = default_args();
        let base = load_config(&args).unwrap();
        let results = validate_scoring(&args, &base);
        assert!(results
            .iter()
            .any(|r| r.name == "single_interest_has_no_diversity"));
        assert_eq!(failures(&results), Vec::<String>::new());
    }

    #[test]
    fn sampling_checks_pass_with_defaults() {
        let args = default_args();
        let base = load_config(&args).unwrap();
        assert_eq!(
            failures(&validate_sampling(&args, &base)),
            Vec::<String>::new()
        );
    }
}
