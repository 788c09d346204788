//! Participant records.
//!
//! A participant carries three kinds of attributes:
//! - **Hard constraints** (diet, budget band, city, spoken languages). Two
//!   people whose hard constraints differ are never placed together.
//! - **Demographics** (age, gender, university, relationship status), used to
//!   balance a group.
//! - **Preferences** (interest tags, alcohol), used for conversation and
//!   social-style scoring.
//!
//! ```
//! use tablemates_logic::profile::{Gender, Participant};
//!
//! let p = Participant::new("user_1", 24, Gender::Female, "Delhi", "JNU")
//!     .with_interests(["hiking", "music"]);
//! assert!(p.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ValidationError;

/// Opaque participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dietary restriction (hard constraint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryRestriction {
    #[serde(rename = "none")]
    Unrestricted,
    Vegetarian,
    Vegan,
}

impl DietaryRestriction {
    pub const ALL: [DietaryRestriction; 3] = [
        DietaryRestriction::Unrestricted,
        DietaryRestriction::Vegetarian,
        DietaryRestriction::Vegan,
    ];
}

/// Per-head budget band (hard constraint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BudgetBand {
    #[serde(rename = "500-800")]
    Economy,
    #[serde(rename = "800-1200")]
    Standard,
    #[serde(rename = "1200+")]
    Premium,
}

impl BudgetBand {
    pub const ALL: [BudgetBand; 3] = [
        BudgetBand::Economy,
        BudgetBand::Standard,
        BudgetBand::Premium,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BudgetBand::Economy => "500-800",
            BudgetBand::Standard => "800-1200",
            BudgetBand::Premium => "1200+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::NonBinary];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Single,
    InRelationship,
    NotLooking,
}

impl RelationshipStatus {
    pub const ALL: [RelationshipStatus; 3] = [
        RelationshipStatus::Single,
        RelationshipStatus::InRelationship,
        RelationshipStatus::NotLooking,
    ];
}

/// A person who may be placed into a dining group.
///
/// Hard-constraint fields must not change while a formation run is using the
/// record; the matcher clones candidates at the start of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,

    // Hard constraints
    pub dietary_restriction: DietaryRestriction,
    pub budget: BudgetBand,
    pub city: String,
    /// Spoken languages. Kept sorted so the constraint key is order-independent.
    pub languages: BTreeSet<String>,

    // Demographics
    pub age: u32,
    pub gender: Gender,
    pub university: String,
    pub degree: String,
    pub graduation_year: u16,
    pub relationship_status: RelationshipStatus,

    // Preferences
    pub interests: Vec<String>,
    pub alcohol: bool,
    pub bio: String,

    // Discovery feedback
    #[serde(default)]
    pub liked_profiles: Vec<ParticipantId>,
    #[serde(default)]
    pub disliked_profiles: Vec<ParticipantId>,
    #[serde(default)]
    pub last_feedback_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Participant {
    /// Create a participant with neutral defaults for everything not given:
    /// no dietary restriction, standard budget, English only, single,
    /// non-drinker, no interests.
    pub fn new(
        id: impl Into<ParticipantId>,
        age: u32,
        gender: Gender,
        city: impl Into<String>,
        university: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            dietary_restriction: DietaryRestriction::Unrestricted,
            budget: BudgetBand::Standard,
            city: city.into(),
            languages: BTreeSet::from(["English".to_string()]),
            age,
            gender,
            university: university.into(),
            degree: String::new(),
            graduation_year: 2025,
            relationship_status: RelationshipStatus::Single,
            interests: Vec::new(),
            alcohol: false,
            bio: String::new(),
            liked_profiles: Vec::new(),
            disliked_profiles: Vec::new(),
            last_feedback_at: None,
        }
    }

    pub fn with_diet(mut self, diet: DietaryRestriction) -> Self {
        self.dietary_restriction = diet;
        self
    }

    pub fn with_budget(mut self, budget: BudgetBand) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_alcohol(mut self, alcohol: bool) -> Self {
        self.alcohol = alcohol;
        self
    }

    pub fn with_relationship_status(mut self, status: RelationshipStatus) -> Self {
        self.relationship_status = status;
        self
    }

    pub fn with_degree(mut self, degree: impl Into<String>, graduation_year: u16) -> Self {
        self.degree = degree.into();
        self.graduation_year = graduation_year;
        self
    }

    /// Check that every required attribute is present and plausible.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.city.trim().is_empty() {
            return Err(ValidationError::EmptyCity(self.id.clone()));
        }
        if self.languages.is_empty() {
            return Err(ValidationError::NoLanguages(self.id.clone()));
        }
        if self.university.trim().is_empty() {
            return Err(ValidationError::EmptyAffiliation(self.id.clone()));
        }
        if !(16..=120).contains(&self.age) {
            return Err(ValidationError::InvalidAge {
                id: self.id.clone(),
                age: self.age,
            });
        }
        if self.interests.iter().any(|tag| tag.trim().is_empty()) {
            return Err(ValidationError::BlankInterest(self.id.clone()));
        }
        Ok(())
    }
}
