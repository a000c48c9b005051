// Core algorithm exports
pub mod distance;
pub mod exclusion;
pub mod filters;
pub mod match_state;
pub mod ranking;
pub mod scoring;
pub mod weights;

pub use distance::{calculate_bounding_box, distance_km, haversine_distance};
pub use exclusion::exclusion_set;
pub use filters::{build_candidate_query, matches_query, EffectiveFilters, RelaxationPolicy};
pub use match_state::{MatchEffect, MatchResponse, TransitionError, PENDING_PLACEHOLDER_SCORE};
pub use ranking::{rank_and_paginate, rank_candidates, RankedPage};
pub use scoring::{compatibility_score, CompatibilityScorer};
pub use weights::{ScoringWeights, WeightOverrides};
