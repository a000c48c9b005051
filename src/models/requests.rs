use crate::core::MatchResponse;
use crate::models::domain::{
    AgeRange, Children, ChildrenDesire, Drinking, Gender, Goal, InteractionType, ProfileId,
    RelationshipStatus, Smoking,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Request-facing point, `{lat, lng}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Explicit search filters. Absent fields fall back to the requester's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_filters"))]
pub struct SearchFilters {
    #[serde(default)]
    pub age_range: Option<AgeRange>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub goals: Option<Goal>,
    #[serde(default)]
    pub relationship_status: Option<RelationshipStatus>,
    #[serde(default)]
    pub children: Option<Children>,
    #[serde(default)]
    pub children_desire: Option<ChildrenDesire>,
    #[serde(default)]
    pub smoking: Option<Smoking>,
    #[serde(default)]
    pub drinking: Option<Drinking>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub radius: Option<f64>,
    #[serde(default)]
    pub location: Option<LatLng>,
}

fn validate_filters(filters: &SearchFilters) -> Result<(), ValidationError> {
    if let Some(range) = filters.age_range {
        if range.min < AgeRange::MIN_AGE {
            return Err(ValidationError::new("age_range_min_below_18"));
        }
        if range.min > range.max {
            return Err(ValidationError::new("age_range_inverted"));
        }
        if range.max > AgeRange::MAX_AGE {
            return Err(ValidationError::new("age_range_max_above_120"));
        }
    }

    if let Some(point) = filters.location {
        if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lng) {
            return Err(ValidationError::new("location_out_of_range"));
        }
    }

    Ok(())
}

/// Basic or advanced search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(alias = "user_id")]
    pub user_id: ProfileId,
    #[serde(default)]
    #[validate(nested)]
    pub filters: SearchFilters,
}

/// Query string for the recommendation feed
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationQuery {
    #[serde(alias = "user_id")]
    pub user_id: ProfileId,
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: usize,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub limit: Option<usize>,
}

fn default_page() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInteractionRequest {
    pub user_from: ProfileId,
    pub user_to: ProfileId,
    #[serde(rename = "type")]
    pub kind: InteractionType,
}

/// Identifies the acting profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(alias = "user_id")]
    pub user_id: ProfileId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub user_id: ProfileId,
    pub target_id: ProfileId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondMatchRequest {
    pub user_id: ProfileId,
    pub action: MatchResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_deserialize_from_request_shape() {
        let filters: SearchFilters = serde_json::from_str(
            r#"{"ageRange": {"min": 25, "max": 35}, "gender": "Female",
                "goals": "Serious relationship", "radius": 15,
                "location": {"lat": 40.7, "lng": -74.0}}"#,
        )
        .unwrap();

        assert_eq!(filters.age_range, Some(AgeRange { min: 25, max: 35 }));
        assert_eq!(filters.gender, Some(Gender::Female));
        assert_eq!(filters.goals, Some(Goal::SeriousRelationship));
        assert_eq!(filters.radius, Some(15.0));
        assert!(filters.validate().is_ok());
    }

    #[test]
    fn test_inverted_age_range_fails_validation() {
        let filters = SearchFilters {
            age_range: Some(AgeRange { min: 40, max: 30 }),
            ..Default::default()
        };
        assert!(filters.validate().is_err());
    }

    #[test]
    fn test_underage_range_fails_validation() {
        let filters = SearchFilters {
            age_range: Some(AgeRange { min: 16, max: 30 }),
            ..Default::default()
        };
        assert!(filters.validate().is_err());
    }

    #[test]
    fn test_age_range_max_is_bounded() {
        let filters: SearchFilters =
            serde_json::from_str(r#"{"ageRange": {"min": 18, "max": 4294967295}}"#).unwrap();
        assert!(filters.validate().is_err());

        let oldest = SearchFilters {
            age_range: Some(AgeRange { min: 18, max: AgeRange::MAX_AGE }),
            ..Default::default()
        };
        assert!(oldest.validate().is_ok());
    }

    #[test]
    fn test_respond_action_names() {
        let req: RespondMatchRequest = serde_json::from_str(
            r#"{"userId": "67e55044-10b1-426f-9247-bb680e5fe0c8", "action": "Rejected"}"#,
        )
        .unwrap();
        assert_eq!(req.action, MatchResponse::Rejected);
    }
}
