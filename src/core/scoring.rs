use crate::core::distance::distance_km;
use crate::core::weights::ScoringWeights;
use crate::models::{ChildrenDesire, Goal, Profile};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Compute the 0-100 compatibility of `candidate` for `requester`
///
/// Scoring rubric (each term added, total clamped and rounded):
/// - shared hobbies, per hobby up to a cap
/// - distance band, when both sides have coordinates
/// - age-difference band, only when each age is inside the other's range
/// - relationship goals lookup
/// - candidate gender equal to the requester's `interested_in`
/// - equal smoking, drinking, children
/// - children desire lookup
/// - equal education, equal occupation
pub fn compatibility_score(
    requester: &Profile,
    candidate: &Profile,
    weights: &ScoringWeights,
    today: NaiveDate,
) -> u8 {
    let total = hobbies_score(requester, candidate, weights)
        + distance_score(requester, candidate, weights)
        + age_score(requester, candidate, weights, today)
        + goals_score(requester.goals, candidate.goals, weights)
        + gender_score(requester, candidate, weights)
        + lifestyle_score(requester, candidate, weights)
        + children_desire_score(requester.children_desire, candidate.children_desire, weights)
        + equality_score(&requester.education, &candidate.education, weights.education)
        + occupation_score(requester, candidate, weights);

    total.clamp(0.0, 100.0).round() as u8
}

#[inline]
fn hobbies_score(a: &Profile, b: &Profile, weights: &ScoringWeights) -> f64 {
    let theirs: HashSet<&str> = b.hobbies.iter().map(String::as_str).collect();
    let shared = a
        .hobbies
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .intersection(&theirs)
        .count();

    (shared as f64 * weights.hobbies.per_shared).min(weights.hobbies.max)
}

#[inline]
fn distance_score(a: &Profile, b: &Profile, weights: &ScoringWeights) -> f64 {
    let (Some(from), Some(to)) = (a.coordinates(), b.coordinates()) else {
        return 0.0;
    };

    let km = distance_km(from, to);
    if km <= 10.0 {
        weights.location.within_10
    } else if km <= 30.0 {
        weights.location.within_30
    } else if km <= 50.0 {
        weights.location.within_50
    } else {
        0.0
    }
}

/// Scored only when both profiles fall inside each other's preferred range
#[inline]
fn age_score(a: &Profile, b: &Profile, weights: &ScoringWeights, today: NaiveDate) -> f64 {
    let age_a = a.age_on(today);
    let age_b = b.age_on(today);

    let mutually_eligible =
        a.preference_age_range.contains(age_b) && b.preference_age_range.contains(age_a);
    if !mutually_eligible {
        return 0.0;
    }

    match age_a.abs_diff(age_b) {
        0..=3 => weights.age.within_3,
        4..=7 => weights.age.within_7,
        8..=10 => weights.age.within_10,
        _ => 0.0,
    }
}

/// Table value for requester goal `a` against candidate goal `b`, expressed at 15
pub fn goals_table(a: Goal, b: Goal) -> f64 {
    use Goal::*;
    match (a, b) {
        (SeriousRelationship, SeriousRelationship) => 15.0,
        (SeriousRelationship, LongTermRelationships) => 12.0,
        (SeriousRelationship, CasualDating) => 0.0,
        (SeriousRelationship, Friendship) => 2.0,
        (SeriousRelationship, NotSure) => 5.0,

        (LongTermRelationships, SeriousRelationship) => 10.0,
        (LongTermRelationships, LongTermRelationships) => 15.0,
        (LongTermRelationships, CasualDating) => 3.0,
        (LongTermRelationships, Friendship) => 2.0,
        (LongTermRelationships, NotSure) => 6.0,

        (CasualDating, SeriousRelationship) => 0.0,
        (CasualDating, LongTermRelationships) => 3.0,
        (CasualDating, CasualDating) => 15.0,
        (CasualDating, Friendship) => 5.0,
        (CasualDating, NotSure) => 8.0,

        (Friendship, SeriousRelationship) => 2.0,
        (Friendship, LongTermRelationships) => 2.0,
        (Friendship, CasualDating) => 5.0,
        (Friendship, Friendship) => 15.0,
        (Friendship, NotSure) => 6.0,

        (NotSure, SeriousRelationship) => 5.0,
        (NotSure, LongTermRelationships) => 6.0,
        (NotSure, CasualDating) => 8.0,
        (NotSure, Friendship) => 6.0,
        (NotSure, NotSure) => 10.0,
    }
}

/// Table value for requester desire `a` against candidate desire `b`, expressed at 10
pub fn children_desire_table(a: ChildrenDesire, b: ChildrenDesire) -> f64 {
    use ChildrenDesire::*;
    match (a, b) {
        (Want, Want) => 10.0,
        (Want, DontWant) => 0.0,
        (Want, Open) => 7.0,
        (Want, NotSure) => 4.0,

        (DontWant, Want) => 0.0,
        (DontWant, DontWant) => 10.0,
        (DontWant, Open) => 5.0,
        (DontWant, NotSure) => 4.0,

        (Open, Want) => 7.0,
        (Open, DontWant) => 5.0,
        (Open, Open) => 8.0,
        (Open, NotSure) => 6.0,

        (NotSure, Want) => 4.0,
        (NotSure, DontWant) => 4.0,
        (NotSure, Open) => 6.0,
        (NotSure, NotSure) => 5.0,
    }
}

#[inline]
fn goals_score(a: Option<Goal>, b: Option<Goal>, weights: &ScoringWeights) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => {
            goals_table(a, b) * weights.goals / ScoringWeights::GOALS_TABLE_SCALE
        }
        _ => 0.0,
    }
}

#[inline]
fn children_desire_score(
    a: Option<ChildrenDesire>,
    b: Option<ChildrenDesire>,
    weights: &ScoringWeights,
) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => {
            children_desire_table(a, b) * weights.children_desire
                / ScoringWeights::CHILDREN_DESIRE_TABLE_SCALE
        }
        _ => 0.0,
    }
}

/// One-directional: the candidate's gender against what the requester wants
#[inline]
fn gender_score(a: &Profile, b: &Profile, weights: &ScoringWeights) -> f64 {
    if b.gender == a.interested_in {
        weights.gender
    } else {
        0.0
    }
}

#[inline]
fn lifestyle_score(a: &Profile, b: &Profile, weights: &ScoringWeights) -> f64 {
    equality_score(&a.smoking, &b.smoking, weights.lifestyle.smoking)
        + equality_score(&a.drinking, &b.drinking, weights.lifestyle.drinking)
        + equality_score(&a.children, &b.children, weights.lifestyle.children)
}

#[inline]
fn occupation_score(a: &Profile, b: &Profile, weights: &ScoringWeights) -> f64 {
    match (&a.occupation, &b.occupation) {
        (Some(x), Some(y)) if !x.is_empty() && x == y => weights.occupation,
        _ => 0.0,
    }
}

/// Absent attributes never count as equal
#[inline]
fn equality_score<T: PartialEq>(a: &Option<T>, b: &Option<T>, weight: f64) -> f64 {
    match (a, b) {
        (Some(x), Some(y)) if x == y => weight,
        _ => 0.0,
    }
}

/// Scores candidates against a requester with a fixed set of weights
#[derive(Debug, Clone)]
pub struct CompatibilityScorer {
    weights: ScoringWeights,
}

impl CompatibilityScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, requester: &Profile, candidate: &Profile, today: NaiveDate) -> u8 {
        compatibility_score(requester, candidate, &self.weights, today)
    }
}

impl Default for CompatibilityScorer {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
