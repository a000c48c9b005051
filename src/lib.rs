//! Kindred Match - matching and recommendation engine for the Kindred dating platform
//!
//! This library scores candidate pairs, builds candidate queries with
//! exclusion and relaxation, ranks and paginates results, and drives the
//! match lifecycle from interactions.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use crate::core::{distance_km, haversine_distance, CompatibilityScorer, ScoringWeights, WeightOverrides};
pub use error::{MatchError, MatchResult};
pub use models::{Match, MatchStatus, Profile, ScoredCandidate};
pub use services::{MatchService, SearchService};
pub use store::{MemoryStore, PostgresStore, Store};
