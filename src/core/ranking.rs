use crate::core::scoring::CompatibilityScorer;
use crate::models::{Profile, ScoredCandidate};
use chrono::NaiveDate;

/// A ranked, possibly paginated slice of scored candidates
#[derive(Debug, Clone)]
pub struct RankedPage {
    pub items: Vec<ScoredCandidate>,
    pub total_matches: usize,
}

/// Score every candidate and sort descending.
///
/// The sort is stable, so equal scores keep the store's query order.
pub fn rank_candidates(
    scorer: &CompatibilityScorer,
    requester: &Profile,
    candidates: Vec<Profile>,
    today: NaiveDate,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|user| {
            let compatibility_score = scorer.score(requester, &user, today);
            ScoredCandidate {
                user,
                compatibility_score,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));
    scored
}

/// Rank, cap and slice a candidate batch
///
/// `cap` bounds the total result count before slicing; `page` is 1-based and
/// a page past the end is empty.
pub fn rank_and_paginate(
    scorer: &CompatibilityScorer,
    requester: &Profile,
    candidates: Vec<Profile>,
    page: usize,
    page_size: usize,
    cap: Option<usize>,
    today: NaiveDate,
) -> RankedPage {
    let mut ranked = rank_candidates(scorer, requester, candidates, today);

    if let Some(cap) = cap {
        ranked.truncate(cap);
    }
    let total_matches = ranked.len();

    let start = page.saturating_sub(1).saturating_mul(page_size);
    let items = if start >= ranked.len() {
        Vec::new()
    } else {
        ranked
            .into_iter()
            .skip(start)
            .take(page_size)
            .collect()
    };

    RankedPage {
        items,
        total_matches,
    }
}
