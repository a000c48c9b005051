// Unit tests for Kindred Match

use chrono::{Datelike, NaiveDate};
use kindred_match::core::{
    calculate_bounding_box, distance_km, exclusion_set, haversine_distance,
    filters::birth_date_window,
    CompatibilityScorer, ScoringWeights, WeightOverrides,
};
use kindred_match::models::{
    AgeRange, Children, ChildrenDesire, Coordinates, Drinking, Education, Gender, Goal, Location,
    Match, MatchStatus, Profile, Smoking,
};
use chrono::Utc;
use uuid::Uuid;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
}

fn create_test_profile(age: i32, gender: Gender, interested_in: Gender, lat: f64, lon: f64) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        account_id: Uuid::new_v4(),
        display_name: String::new(),
        date_of_birth: NaiveDate::from_ymd_opt(today().year() - age, 1, 1).unwrap(),
        gender,
        interested_in,
        preference_age_range: AgeRange { min: 20, max: 45 },
        location: Location {
            coordinates: Some(Coordinates::new(lon, lat)),
            radius_km: 50.0,
        },
        hobbies: vec![],
        goals: None,
        relationship_status: None,
        smoking: None,
        drinking: None,
        children: None,
        children_desire: None,
        education: None,
        occupation: None,
        created_at: Utc::now(),
    }
}

fn fully_aligned(profile: &mut Profile) {
    profile.hobbies = ["Yoga", "Chess", "Hiking", "Cooking", "Running", "Tennis"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    profile.goals = Some(Goal::SeriousRelationship);
    profile.smoking = Some(Smoking::Never);
    profile.drinking = Some(Drinking::Socially);
    profile.children = Some(Children::NoChildren);
    profile.children_desire = Some(ChildrenDesire::Want);
    profile.education = Some(Education::Master);
    profile.occupation = Some("Engineer".to_string());
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(52.52, 13.405, 52.52, 13.405);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_berlin_to_potsdam() {
    // Berlin Mitte to Potsdam is roughly 27 km
    let distance = haversine_distance(52.52, 13.405, 52.3906, 13.0645);
    assert!(distance > 20.0 && distance < 35.0, "got {}", distance);
}

#[test]
fn test_distance_symmetric() {
    let points = [
        Coordinates::new(13.405, 52.52),
        Coordinates::new(-74.006, 40.7128),
        Coordinates::new(151.2093, -33.8688),
        Coordinates::new(179.9, 0.0),
        Coordinates::new(-179.9, 0.0),
    ];

    for a in points {
        assert!(distance_km(a, a).abs() < 1e-9);
        for b in points {
            let ab = distance_km(a, b);
            let ba = distance_km(b, a);
            assert!((ab - ba).abs() < 1e-9, "{:?} vs {:?}", a, b);
        }
    }

    // Across the antimeridian the short way round is used
    assert!(distance_km(points[3], points[4]) < 25.0);
}

#[test]
fn test_bounding_box_contains_center() {
    let bbox = calculate_bounding_box(52.52, 13.405, 10.0);
    assert!(bbox.min_lat < 52.52 && bbox.max_lat > 52.52);
    assert!(bbox.min_lon < 13.405 && bbox.max_lon > 13.405);
    // One degree of latitude is well outside a 10 km box
    assert!(bbox.max_lat < 53.52);
}

#[test]
fn test_score_bounds_hold_across_profiles() {
    let scorer = CompatibilityScorer::default();
    let genders = [Gender::Male, Gender::Female, Gender::Other];

    let mut profiles = Vec::new();
    for (i, age) in [18, 24, 31, 45, 70].iter().enumerate() {
        for gender in genders {
            let mut p = create_test_profile(*age, gender, genders[i % 3], 0.1 * i as f64, 0.0);
            if i % 2 == 0 {
                fully_aligned(&mut p);
            }
            profiles.push(p);
        }
    }

    for a in &profiles {
        for b in &profiles {
            let score = scorer.score(a, b, today());
            assert!(score <= 100, "score {} out of range", score);
        }
    }
}

#[test]
fn test_fully_aligned_pair_clamps_to_100() {
    let scorer = CompatibilityScorer::default();
    let mut a = create_test_profile(30, Gender::Male, Gender::Female, 0.0, 0.0);
    let mut b = create_test_profile(30, Gender::Female, Gender::Male, 0.0, 0.0);
    fully_aligned(&mut a);
    fully_aligned(&mut b);

    assert_eq!(scorer.score(&a, &b, today()), 100);
}

#[test]
fn test_gender_term_is_one_directional() {
    let scorer = CompatibilityScorer::default();
    let a = create_test_profile(30, Gender::Male, Gender::Female, 0.0, 0.0);
    // b is not interested in a's gender, a is interested in b's
    let b = create_test_profile(30, Gender::Female, Gender::Female, 0.0, 0.0);

    let forward = scorer.score(&a, &b, today());
    let backward = scorer.score(&b, &a, today());
    assert_eq!(forward, backward + 10);
}

#[test]
fn test_age_gate_must_be_mutual() {
    let scorer = CompatibilityScorer::default();
    let mut a = create_test_profile(30, Gender::Male, Gender::Female, 0.0, 0.0);
    let b = create_test_profile(31, Gender::Female, Gender::Male, 0.0, 0.0);

    let eligible = scorer.score(&a, &b, today());

    a.preference_age_range = AgeRange { min: 35, max: 40 };
    let gated = scorer.score(&a, &b, today());
    assert_eq!(eligible, gated + 15);
}

#[test]
fn test_weight_overrides_from_json() {
    let overrides: WeightOverrides = serde_json::from_str(
        r#"{"location": {"within10": 30}, "education": 0, "childrenDesire": 20}"#,
    )
    .unwrap();

    let weights = ScoringWeights::default().merged(&overrides);
    assert_eq!(weights.location.within_10, 30.0);
    assert_eq!(weights.location.within_30, 10.0, "sub-objects merge key by key");
    assert_eq!(weights.education, 0.0);
    assert_eq!(weights.children_desire, 20.0);
    assert_eq!(weights.goals, 15.0);
}

#[test]
fn test_overridden_weights_change_score() {
    let a = create_test_profile(30, Gender::Male, Gender::Female, 0.0, 0.0);
    let b = create_test_profile(30, Gender::Female, Gender::Male, 0.0, 0.0);

    let overrides: WeightOverrides = serde_json::from_str(r#"{"gender": 0}"#).unwrap();
    let no_gender = CompatibilityScorer::new(ScoringWeights::default().merged(&overrides));

    let base = CompatibilityScorer::default().score(&a, &b, today());
    assert_eq!(no_gender.score(&a, &b, today()), base - 10);
}

#[test]
fn test_birth_window_is_year_granular() {
    let (from, until) = birth_date_window(&AgeRange { min: 25, max: 35 }, 2026);
    assert_eq!(from, NaiveDate::from_ymd_opt(1991, 1, 1).unwrap());
    assert_eq!(until, NaiveDate::from_ymd_opt(2001, 12, 31).unwrap());
}

#[test]
fn test_exclusion_set_deduplicates() {
    let me = Uuid::new_v4();
    let other = Uuid::new_v4();
    let now = Utc::now();

    let matched = Match {
        id: Uuid::new_v4(),
        user1: other,
        user2: me,
        compatibility_score: 70,
        status: MatchStatus::Matched,
        matched_at: Some(now),
        unmatched_at: None,
        created_at: now,
        updated_at: now,
    };

    let excluded = exclusion_set(me, vec![other, other, me], &[matched]);
    assert_eq!(excluded.len(), 2);
    assert!(excluded.contains(&me));
    assert!(excluded.contains(&other));
}
