use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

use crate::config::MatchingSettings;
use crate::core::{
    build_candidate_query, exclusion_set, rank_and_paginate, rank_candidates, CompatibilityScorer,
    EffectiveFilters, RelaxationPolicy,
};
use crate::error::{MatchError, MatchResult};
use crate::models::{
    AdvancedSearchResponse, MatchStatus, Profile, ProfileId, RecommendationResponse,
    ScoredCandidate, SearchFilters,
};
use crate::store::{Store, StoreResult};

const SEARCH_UNAVAILABLE: &str = "Search is temporarily unavailable. Please try again later.";

/// Paging and candidate bounds for search and recommendations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub recommendation_cap_factor: usize,
    pub max_candidates: usize,
    pub relaxation: RelaxationPolicy,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::from(&MatchingSettings::default())
    }
}

impl From<&MatchingSettings> for SearchLimits {
    fn from(settings: &MatchingSettings) -> Self {
        Self {
            default_page_size: settings.default_page_size,
            max_page_size: settings.max_page_size,
            recommendation_cap_factor: settings.recommendation_cap_factor,
            max_candidates: settings.max_candidates,
            relaxation: settings.relaxation(),
        }
    }
}

/// Candidate search pipeline
///
/// # Pipeline Stages
/// 1. Requester profile lookup (missing profile is fatal)
/// 2. Exclusion set derivation
/// 3. Candidate query against the store
/// 4. Scoring and ranking
///
/// Failures in stages 2 and 3 degrade to an empty result.
pub struct SearchService {
    store: Arc<dyn Store>,
    scorer: CompatibilityScorer,
    limits: SearchLimits,
}

impl SearchService {
    pub fn new(store: Arc<dyn Store>, scorer: CompatibilityScorer, limits: SearchLimits) -> Self {
        Self {
            store,
            scorer,
            limits,
        }
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    async fn requester(&self, user_id: ProfileId) -> MatchResult<Profile> {
        self.store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| MatchError::profile_not_found(user_id))
    }

    async fn exclusions(&self, user_id: ProfileId) -> StoreResult<HashSet<ProfileId>> {
        let disliked = self.store.disliked_targets(user_id).await?;
        let matched = self
            .store
            .matches_for(user_id, Some(MatchStatus::Matched))
            .await?;

        let excluded = exclusion_set(user_id, disliked, &matched);
        tracing::debug!(user_id = %user_id, excluded = excluded.len(), "Resolved exclusion set");
        Ok(excluded)
    }

    async fn candidates(
        &self,
        requester: &Profile,
        filters: &EffectiveFilters,
        limit: usize,
        today: NaiveDate,
    ) -> StoreResult<Vec<Profile>> {
        let excluded = self.exclusions(requester.id).await?;
        let query = build_candidate_query(filters, excluded, today, Some(limit));
        let candidates = self.store.find_candidates(&query).await?;

        tracing::debug!(
            user_id = %requester.id,
            candidates = candidates.len(),
            "Fetched candidates"
        );
        Ok(candidates)
    }

    /// All candidates matching the filters, sorted by score, unpaginated
    pub async fn basic_search(
        &self,
        user_id: ProfileId,
        filters: &SearchFilters,
    ) -> MatchResult<Vec<ScoredCandidate>> {
        filters.validate()?;
        let requester = self.requester(user_id).await?;
        let today = Utc::now().date_naive();

        let effective = EffectiveFilters::resolve(&requester, filters);
        let candidates = match self
            .candidates(&requester, &effective, self.limits.max_candidates, today)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Basic search degraded to empty result");
                return Ok(Vec::new());
            }
        };

        let ranked = rank_candidates(&self.scorer, &requester, candidates, today);
        tracing::info!(user_id = %user_id, results = ranked.len(), "Basic search complete");
        Ok(ranked)
    }

    /// Like [`basic_search`](Self::basic_search), retried once with relaxed
    /// filters when nothing matches
    pub async fn advanced_search(
        &self,
        user_id: ProfileId,
        filters: &SearchFilters,
    ) -> MatchResult<AdvancedSearchResponse> {
        filters.validate()?;
        let requester = self.requester(user_id).await?;
        let today = Utc::now().date_naive();
        let limit = self.limits.max_candidates;

        let effective = EffectiveFilters::resolve(&requester, filters);
        let mut candidates = match self.candidates(&requester, &effective, limit, today).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Advanced search degraded");
                return Ok(AdvancedSearchResponse::no_results(SEARCH_UNAVAILABLE));
            }
        };

        if candidates.is_empty() {
            let relaxed = effective.relaxed(&self.limits.relaxation);
            tracing::info!(
                user_id = %user_id,
                min_age = relaxed.age_range.min,
                max_age = relaxed.age_range.max,
                radius_km = relaxed.radius_km,
                "No candidates, retrying with relaxed filters"
            );

            candidates = match self.candidates(&requester, &relaxed, limit, today).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Relaxed search degraded");
                    return Ok(AdvancedSearchResponse::no_results(SEARCH_UNAVAILABLE));
                }
            };
        }

        if candidates.is_empty() {
            tracing::info!(user_id = %user_id, "Advanced search found nothing after relaxation");
            return Ok(AdvancedSearchResponse::no_results(
                AdvancedSearchResponse::SUGGEST_WIDENING,
            ));
        }

        let ranked = rank_candidates(&self.scorer, &requester, candidates, today);
        tracing::info!(user_id = %user_id, results = ranked.len(), "Advanced search complete");
        Ok(AdvancedSearchResponse::Results(ranked))
    }

    /// Paginated feed from the requester's own preferences.
    ///
    /// Results are capped at `recommendation_cap_factor × limit` before
    /// slicing, and `total_matches` reports the capped count.
    pub async fn recommendations(
        &self,
        user_id: ProfileId,
        page: usize,
        limit: Option<usize>,
    ) -> MatchResult<RecommendationResponse> {
        if page < 1 {
            return Err(MatchError::InvalidInput("page must be at least 1".into()));
        }
        let limit = limit.unwrap_or(self.limits.default_page_size);
        if limit < 1 || limit > self.limits.max_page_size {
            return Err(MatchError::InvalidInput(format!(
                "limit must be between 1 and {}",
                self.limits.max_page_size
            )));
        }

        let requester = self.requester(user_id).await?;
        let today = Utc::now().date_naive();
        let cap = self.limits.recommendation_cap_factor.saturating_mul(limit);

        let filters = EffectiveFilters::from_profile(&requester);
        let fetch = self.limits.max_candidates.max(cap);
        let candidates = match self.candidates(&requester, &filters, fetch, today).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Recommendations degraded");
                return Ok(RecommendationResponse::degraded(
                    "Recommendations are temporarily unavailable",
                ));
            }
        };

        let ranked = rank_and_paginate(
            &self.scorer,
            &requester,
            candidates,
            page,
            limit,
            Some(cap),
            today,
        );

        tracing::info!(
            user_id = %user_id,
            page,
            limit,
            total_matches = ranked.total_matches,
            "Generated recommendations"
        );

        Ok(RecommendationResponse {
            total_matches: ranked.total_matches,
            results: ranked.items,
            message: None,
        })
    }
}
