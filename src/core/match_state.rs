use crate::models::{InteractionType, Match, MatchFields, MatchStatus, ProfileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score stored on a Pending record until the pair actually matches
pub const PENDING_PLACEHOLDER_SCORE: u8 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("only the match recipient may respond to this request")]
    NotRecipient,

    #[error("profile is not a participant of this match")]
    NotParticipant,

    #[error("cannot move a {from} match to {to}")]
    Illegal { from: MatchStatus, to: MatchStatus },
}

impl MatchStatus {
    /// Legal explicit transitions: `Pending → Matched | Rejected`, `Matched → Unmatched`
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Pending, MatchStatus::Matched)
                | (MatchStatus::Pending, MatchStatus::Rejected)
                | (MatchStatus::Matched, MatchStatus::Unmatched)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Rejected | MatchStatus::Unmatched)
    }
}

/// What an interaction does to the pair's match record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEffect {
    /// No match record is touched
    Unchanged,
    /// One-sided interest; upsert Pending with the placeholder score
    Pending,
    /// Reciprocal interest; upsert Matched with a computed score
    Matched,
    /// Upsert Rejected, keeping the stored score
    Rejected,
}

/// Decide the match effect of `kind` given whether the target already liked back
pub fn effect_of_interaction(kind: InteractionType, reciprocal_like: bool) -> MatchEffect {
    match kind {
        kind if kind.is_positive() && reciprocal_like => MatchEffect::Matched,
        kind if kind.is_positive() => MatchEffect::Pending,
        InteractionType::Dislike => MatchEffect::Rejected,
        _ => MatchEffect::Unchanged,
    }
}

/// Upsert fields for an effect. `score` is only read for `Matched`.
pub fn upsert_fields(effect: MatchEffect, score: u8, now: DateTime<Utc>) -> Option<MatchFields> {
    match effect {
        MatchEffect::Unchanged => None,
        MatchEffect::Pending => Some(MatchFields {
            status: MatchStatus::Pending,
            compatibility_score: Some(PENDING_PLACEHOLDER_SCORE),
            matched_at: None,
        }),
        MatchEffect::Matched => Some(MatchFields {
            status: MatchStatus::Matched,
            compatibility_score: Some(score),
            matched_at: Some(now),
        }),
        MatchEffect::Rejected => Some(MatchFields {
            status: MatchStatus::Rejected,
            compatibility_score: None,
            matched_at: None,
        }),
    }
}

/// Explicit answer to a Pending match request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResponse {
    Matched,
    Rejected,
}

impl MatchResponse {
    pub fn status(self) -> MatchStatus {
        match self {
            MatchResponse::Matched => MatchStatus::Matched,
            MatchResponse::Rejected => MatchStatus::Rejected,
        }
    }
}

/// Only `user2`, the non-initiator, may answer, and only while Pending
pub fn check_response(
    record: &Match,
    responder: ProfileId,
    response: MatchResponse,
) -> Result<MatchStatus, TransitionError> {
    if record.user2 != responder {
        return Err(TransitionError::NotRecipient);
    }

    let next = response.status();
    if !record.status.can_transition_to(next) {
        return Err(TransitionError::Illegal {
            from: record.status,
            to: next,
        });
    }

    Ok(next)
}

/// Either participant may unmatch a Matched record
pub fn check_unmatch(record: &Match, requester: ProfileId) -> Result<(), TransitionError> {
    if !record.involves(requester) {
        return Err(TransitionError::NotParticipant);
    }

    if !record.status.can_transition_to(MatchStatus::Unmatched) {
        return Err(TransitionError::Illegal {
            from: record.status,
            to: MatchStatus::Unmatched,
        });
    }

    Ok(())
}
