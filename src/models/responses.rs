use crate::models::domain::{Interaction, Match, Profile, ProfileId};
use serde::{Deserialize, Serialize};

/// A candidate profile with its compatibility against the requester
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub user: Profile,
    pub compatibility_score: u8,
}

/// Advanced search result.
///
/// Serializes either as a plain array or as `{message, results: []}`; callers
/// tell them apart by the presence of `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdvancedSearchResponse {
    NoResults {
        message: String,
        results: Vec<ScoredCandidate>,
    },
    Results(Vec<ScoredCandidate>),
}

impl AdvancedSearchResponse {
    pub const SUGGEST_WIDENING: &'static str =
        "No profiles match your filters. Try widening your search.";

    pub fn no_results(message: impl Into<String>) -> Self {
        Self::NoResults {
            message: message.into(),
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[ScoredCandidate] {
        match self {
            Self::NoResults { results, .. } | Self::Results(results) => results,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub total_matches: usize,
    pub results: Vec<ScoredCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecommendationResponse {
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            total_matches: 0,
            results: Vec::new(),
            message: Some(message.into()),
        }
    }
}

/// Result of recording an interaction
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    Created {
        interaction: Interaction,
        match_record: Option<Match>,
    },
    /// The exact `(from, to, type)` edge already existed
    Existing(Interaction),
}

impl InteractionOutcome {
    pub fn interaction(&self) -> &Interaction {
        match self {
            Self::Created { interaction, .. } | Self::Existing(interaction) => interaction,
        }
    }
}

/// Wire form of [`InteractionOutcome`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InteractionResponse {
    Existing {
        message: String,
        interaction: Interaction,
    },
    Created(Interaction),
}

impl From<InteractionOutcome> for InteractionResponse {
    fn from(outcome: InteractionOutcome) -> Self {
        match outcome {
            InteractionOutcome::Created { interaction, .. } => Self::Created(interaction),
            InteractionOutcome::Existing(interaction) => Self::Existing {
                message: "Interaction already exists".to_string(),
                interaction,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    #[serde(rename = "match")]
    pub match_record: Match,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileViewsResponse {
    pub user_id: ProfileId,
    pub views: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
