use crate::core::distance::{is_within_sphere, km_to_radians};
use crate::models::{
    AgeRange, CandidateQuery, Children, ChildrenDesire, Coordinates, Drinking, Gender, GeoWithin,
    Goal, Profile, ProfileId, RelationshipStatus, SearchFilters, Smoking,
};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

/// Request filters merged with the requester's profile defaults
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveFilters {
    pub age_range: AgeRange,
    pub gender: Option<Gender>,
    pub center: Option<Coordinates>,
    pub radius_km: f64,
    pub goals: Option<Goal>,
    pub relationship_status: Option<RelationshipStatus>,
    pub children: Option<Children>,
    pub children_desire: Option<ChildrenDesire>,
    pub smoking: Option<Smoking>,
    pub drinking: Option<Drinking>,
}

impl EffectiveFilters {
    /// Filters implied by the profile alone (recommendation feed)
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            age_range: profile.preference_age_range,
            gender: Some(profile.interested_in),
            center: profile.coordinates(),
            radius_km: profile.location.radius_km,
            goals: None,
            relationship_status: None,
            children: None,
            children_desire: None,
            smoking: None,
            drinking: None,
        }
    }

    /// Explicit request filters take precedence over profile defaults
    pub fn resolve(profile: &Profile, filters: &SearchFilters) -> Self {
        let defaults = Self::from_profile(profile);

        Self {
            age_range: filters.age_range.unwrap_or(defaults.age_range),
            gender: filters.gender.or(defaults.gender),
            center: filters
                .location
                .map(|point| Coordinates::new(point.lng, point.lat))
                .or(defaults.center),
            radius_km: filters.radius.unwrap_or(defaults.radius_km),
            goals: filters.goals,
            relationship_status: filters.relationship_status,
            children: filters.children,
            children_desire: filters.children_desire,
            smoking: filters.smoking,
            drinking: filters.drinking,
        }
    }

    /// Widened copy used for the one-time retry after an empty result
    pub fn relaxed(&self, policy: &RelaxationPolicy) -> Self {
        let min = self
            .age_range
            .min
            .saturating_sub(policy.age_years)
            .max(AgeRange::MIN_AGE);

        Self {
            age_range: AgeRange {
                min,
                max: self.age_range.max.saturating_add(policy.age_years),
            },
            gender: None,
            radius_km: self.radius_km + policy.radius_km,
            ..self.clone()
        }
    }
}

/// How far the retry widens an empty search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationPolicy {
    pub age_years: u32,
    pub radius_km: f64,
}

impl Default for RelaxationPolicy {
    fn default() -> Self {
        Self {
            age_years: 5,
            radius_km: 20.0,
        }
    }
}

/// Inclusive date-of-birth window for an age range.
///
/// Year-granular: `[Jan 1 of year - max, Dec 31 of year - min]`. Exact ages
/// are only applied later by the scorer.
pub fn birth_date_window(age_range: &AgeRange, current_year: i32) -> (NaiveDate, NaiveDate) {
    // Years below chrono's range clamp to the earliest representable date
    let year_minus = |age: u32| i32::try_from(i64::from(current_year) - i64::from(age)).ok();

    let born_from = year_minus(age_range.max)
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .unwrap_or(NaiveDate::MIN);
    let born_until = year_minus(age_range.min)
        .and_then(|year| NaiveDate::from_ymd_opt(year, 12, 31))
        .unwrap_or(NaiveDate::MIN);
    (born_from, born_until)
}

/// Translate effective filters and an exclusion set into a store query
pub fn build_candidate_query(
    filters: &EffectiveFilters,
    exclude_ids: HashSet<ProfileId>,
    today: NaiveDate,
    limit: Option<usize>,
) -> CandidateQuery {
    let (born_from, born_until) = birth_date_window(&filters.age_range, today.year());

    let geo = filters.center.map(|center| GeoWithin {
        center,
        radius_km: filters.radius_km,
        radius_radians: km_to_radians(filters.radius_km),
    });

    CandidateQuery {
        exclude_ids,
        born_from,
        born_until,
        gender: filters.gender,
        geo,
        goals: filters.goals,
        relationship_status: filters.relationship_status,
        children: filters.children,
        children_desire: filters.children_desire,
        smoking: filters.smoking,
        drinking: filters.drinking,
        limit,
    }
}

#[inline]
fn matches_optional<T: PartialEq>(wanted: &Option<T>, actual: &Option<T>) -> bool {
    match wanted {
        Some(w) => actual.as_ref() == Some(w),
        None => true,
    }
}

/// Check if a profile satisfies every constraint of a candidate query
pub fn matches_query(profile: &Profile, query: &CandidateQuery) -> bool {
    if query.exclude_ids.contains(&profile.id) {
        return false;
    }

    if profile.date_of_birth < query.born_from || profile.date_of_birth > query.born_until {
        return false;
    }

    if let Some(gender) = query.gender {
        if profile.gender != gender {
            return false;
        }
    }

    // A geo constraint excludes profiles without coordinates
    if let Some(geo) = &query.geo {
        match profile.coordinates() {
            Some(point) if is_within_sphere(point, geo) => {}
            _ => return false,
        }
    }

    matches_optional(&query.goals, &profile.goals)
        && matches_optional(&query.relationship_status, &profile.relationship_status)
        && matches_optional(&query.children, &profile.children)
        && matches_optional(&query.children_desire, &profile.children_desire)
        && matches_optional(&query.smoking, &profile.smoking)
        && matches_optional(&query.drinking, &profile.drinking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LatLng, Location};
    use chrono::Utc;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn create_test_profile(dob: NaiveDate, gender: Gender, lon: f64, lat: f64) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            display_name: "Test User".to_string(),
            date_of_birth: dob,
            gender,
            interested_in: Gender::Female,
            preference_age_range: AgeRange { min: 25, max: 35 },
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

    fn requester() -> Profile {
        create_test_profile(
            NaiveDate::from_ymd_opt(1995, 5, 1).unwrap(),
            Gender::Male,
            -74.0060,
            40.7128,
        )
    }

    #[test]
    fn test_birth_window_is_year_granular() {
        let (from, until) = birth_date_window(&AgeRange { min: 25, max: 35 }, 2025);
        assert_eq!(from, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(until, NaiveDate::from_ymd_opt(2000, 12, 31).unwrap());
    }

    #[test]
    fn test_request_filters_override_profile_defaults() {
        let profile = requester();
        let filters = SearchFilters {
            age_range: Some(AgeRange { min: 30, max: 40 }),
            radius: Some(5.0),
            location: Some(LatLng { lat: 51.5, lng: -0.12 }),
            smoking: Some(Smoking::Never),
            ..Default::default()
        };

        let effective = EffectiveFilters::resolve(&profile, &filters);

        assert_eq!(effective.age_range, AgeRange { min: 30, max: 40 });
        assert_eq!(effective.gender, Some(Gender::Female));
        assert_eq!(effective.center, Some(Coordinates::new(-0.12, 51.5)));
        assert_eq!(effective.radius_km, 5.0);
        assert_eq!(effective.smoking, Some(Smoking::Never));
    }

    #[test]
    fn test_relaxed_filters_drop_gender_and_widen() {
        let effective = EffectiveFilters::from_profile(&requester());
        let relaxed = effective.relaxed(&RelaxationPolicy::default());

        assert_eq!(relaxed.gender, None);
        assert_eq!(relaxed.age_range, AgeRange { min: 20, max: 40 });
        assert_eq!(relaxed.radius_km, 70.0);
    }

    #[test]
    fn test_relaxed_age_floor() {
        let mut effective = EffectiveFilters::from_profile(&requester());
        effective.age_range = AgeRange { min: 19, max: 22 };

        let relaxed = effective.relaxed(&RelaxationPolicy::default());
        assert_eq!(relaxed.age_range.min, AgeRange::MIN_AGE);
    }

    #[test]
    fn test_relaxed_age_ceiling_saturates() {
        let mut effective = EffectiveFilters::from_profile(&requester());
        effective.age_range = AgeRange { min: 18, max: u32::MAX };

        let relaxed = effective.relaxed(&RelaxationPolicy::default());
        assert_eq!(relaxed.age_range.max, u32::MAX);

        let (from, until) = birth_date_window(&relaxed.age_range, 2025);
        assert_eq!(from, NaiveDate::MIN);
        assert_eq!(until, NaiveDate::from_ymd_opt(2007, 12, 31).unwrap());
    }

    #[test]
    fn test_query_constraints() {
        let profile = requester();
        let effective = EffectiveFilters::from_profile(&profile);
        let query = build_candidate_query(&effective, HashSet::from([profile.id]), today(), None);

        let near = create_test_profile(
            NaiveDate::from_ymd_opt(1996, 8, 20).unwrap(),
            Gender::Female,
            -74.01,
            40.72,
        );
        assert!(matches_query(&near, &query));

        assert!(!matches_query(&profile, &query), "self is excluded");

        let wrong_gender = Profile {
            gender: Gender::Male,
            ..near.clone()
        };
        assert!(!matches_query(&wrong_gender, &query));

        let far = create_test_profile(near.date_of_birth, Gender::Female, -74.0, 45.0);
        assert!(!matches_query(&far, &query));

        let too_young = create_test_profile(
            NaiveDate::from_ymd_opt(2003, 1, 1).unwrap(),
            Gender::Female,
            -74.01,
            40.72,
        );
        assert!(!matches_query(&too_young, &query));

        let mut no_location = near.clone();
        no_location.location.coordinates = None;
        assert!(!matches_query(&no_location, &query));
    }

    #[test]
    fn test_optional_filters_apply_as_equality() {
        let profile = requester();
        let mut effective = EffectiveFilters::from_profile(&profile);
        effective.goals = Some(Goal::SeriousRelationship);
        let query = build_candidate_query(&effective, HashSet::new(), today(), None);

        let mut candidate = create_test_profile(
            NaiveDate::from_ymd_opt(1996, 8, 20).unwrap(),
            Gender::Female,
            -74.01,
            40.72,
        );
        assert!(!matches_query(&candidate, &query), "missing attribute fails an explicit filter");

        candidate.goals = Some(Goal::SeriousRelationship);
        assert!(matches_query(&candidate, &query));
    }
}
