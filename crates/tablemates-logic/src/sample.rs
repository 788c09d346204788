//! Synthetic participant generation for demos, benchmarks and the harness.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::profile::{BudgetBand, DietaryRestriction, Gender, Participant, RelationshipStatus};

// Sample pools - real deployments load participants from their own store
static INTERESTS: &[&str] = &[
    "photography",
    "cooking",
    "hiking",
    "reading",
    "music",
    "traveling",
    "gaming",
    "sports",
    "art",
    "technology",
    "movies",
    "dancing",
    "yoga",
    "writing",
    "entrepreneurship",
    "volunteering",
];

static UNIVERSITIES: &[&str] = &["Delhi University", "IIT Delhi", "JNU", "AIIMS", "DTU"];
static DEGREES: &[&str] = &[
    "Computer Science",
    "Business",
    "Medicine",
    "Engineering",
    "Arts",
];
static CITIES: &[&str] = &["Delhi", "Mumbai", "Bangalore"];
static LANGUAGES: &[&str] = &["English", "Hindi", "Punjabi", "Tamil"];

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str]) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}

/// Varied participants across three cities, all diets and budgets.
pub fn create_sample_participants<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Participant> {
    (0..count)
        .map(|i| {
            let language_count = rng.gen_range(1..=3);
            let interest_count = rng.gen_range(3..=5);
            let mut p = Participant::new(
                format!("user_{i}"),
                rng.gen_range(20..=28),
                Gender::ALL[rng.gen_range(0..Gender::ALL.len())],
                pick(rng, CITIES),
                pick(rng, UNIVERSITIES),
            )
            .with_degree(pick(rng, DEGREES), rng.gen_range(2024..=2027))
            .with_diet(DietaryRestriction::ALL[rng.gen_range(0..3)])
            .with_budget(BudgetBand::ALL[rng.gen_range(0..3)])
            .with_languages(LANGUAGES.choose_multiple(rng, language_count).copied())
            .with_interests(INTERESTS.choose_multiple(rng, interest_count).copied())
            .with_alcohol(rng.gen_bool(0.5))
            .with_relationship_status(RelationshipStatus::ALL[rng.gen_range(0..3)]);
            p.bio = format!("Sample bio for user {i}");
            p
        })
        .collect()
}

/// Participants sharing one city and language set, with two diets, two
/// budgets and two genders. Produces a few large buckets, which is the
/// expensive case for candidate generation.
pub fn create_uniform_participants<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Participant> {
    let interests = &INTERESTS[..12];
    (0..count)
        .map(|i| {
            let mut p = Participant::new(
                format!("user_{i}"),
                rng.gen_range(20..=28),
                [Gender::Male, Gender::Female][rng.gen_range(0..2)],
                "Delhi",
                pick(rng, &["DU", "IIT", "JNU"]),
            )
            .with_degree(
                pick(rng, &["CS", "Business", "Engineering"]),
                rng.gen_range(2024..=2027),
            )
            .with_diet(
                [
                    DietaryRestriction::Unrestricted,
                    DietaryRestriction::Vegetarian,
                ][rng.gen_range(0..2)],
            )
            .with_budget([BudgetBand::Economy, BudgetBand::Standard][rng.gen_range(0..2)])
            .with_languages(["English", "Hindi"])
            .with_interests(interests.choose_multiple(rng, 4).copied())
            .with_alcohol(rng.gen_bool(0.5))
            .with_relationship_status(
                [
                    RelationshipStatus::Single,
                    RelationshipStatus::InRelationship,
                ][rng.gen_range(0..2)],
            );
            p.bio = format!("Bio {i}");
            p
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::bucket_by_constraints;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sample_participants_are_valid() {
        let mut rng = StdRng::seed_from_u64(42);
        let people = create_sample_participants(50, &mut rng);
        assert_eq!(people.len(), 50);
        for p in &people {
            assert!(p.validate().is_ok(), "{} invalid", p.id);
            assert!((3..=5).contains(&p.interests.len()));
            assert!((1..=3).contains(&p.languages.len()));
            assert!((20..=28).contains(&p.age));
        }
        assert_eq!(people[7].id.as_str(), "user_7");
    }

    #[test]
    fn uniform_participants_form_at_most_four_buckets() {
        let mut rng = StdRng::seed_from_u64(42);
        let people = create_uniform_participants(200, &mut rng);
        // 2 diets × 2 budgets, one city and language set
        assert!(bucket_by_constraints(&people).len() <= 4);
        assert!(people.iter().all(|p| p.interests.len() == 4));
    }

    #[test]
    fn generation_is_seeded() {
        let a = create_sample_participants(10, &mut StdRng::seed_from_u64(1));
        let b = create_sample_participants(10, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }
}
