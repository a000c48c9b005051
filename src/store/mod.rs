//! Persistence seams for profiles, interactions and the match lifecycle.
//!
//! Services only talk to these traits; `memory` and `postgres` provide the
//! engines.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CandidateQuery, Conversation, Interaction, InteractionType, Match, MatchFields, MatchPair,
    MatchStatus, Notification, Profile, ProfileId, UnknownLabel,
};

/// Errors raised by a store engine
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<UnknownLabel> for StoreError {
    fn from(err: UnknownLabel) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: ProfileId) -> StoreResult<Option<Profile>>;

    /// Profiles satisfying `query`, in a stable order, at most `query.limit`
    async fn find_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Profile>>;

    async fn health_check(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn find_interaction(
        &self,
        from: ProfileId,
        to: ProfileId,
        kind: InteractionType,
    ) -> StoreResult<Option<Interaction>>;

    /// Insert unless the `(from, to, kind)` edge exists.
    ///
    /// Returns the stored record and whether this call created it.
    async fn insert_interaction(&self, interaction: &Interaction) -> StoreResult<(Interaction, bool)>;

    /// Targets `from` has disliked
    async fn disliked_targets(&self, from: ProfileId) -> StoreResult<Vec<ProfileId>>;

    async fn latest_interaction(&self, from: ProfileId) -> StoreResult<Option<Interaction>>;

    async fn delete_interaction(&self, id: Uuid) -> StoreResult<bool>;

    /// Number of `kind` interactions received by `to`
    async fn count_received(&self, to: ProfileId, kind: InteractionType) -> StoreResult<u64>;
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Lookup by unordered pair
    async fn find_match(&self, pair: MatchPair) -> StoreResult<Option<Match>>;

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>>;

    /// Insert or update the record for the unordered pair.
    ///
    /// `pair.user1`/`pair.user2` are written only on insert. A `None` score
    /// keeps the stored score, or writes the pending placeholder on insert.
    async fn upsert_match(&self, pair: MatchPair, fields: MatchFields) -> StoreResult<Match>;

    /// Insert a Pending record unless one exists for the pair
    async fn insert_match_if_absent(&self, pair: MatchPair, score: u8) -> StoreResult<(Match, bool)>;

    /// Set status, optionally the score, and the matching timestamp
    /// (`matched_at` for Matched, `unmatched_at` for Unmatched)
    async fn update_match_status(
        &self,
        id: Uuid,
        status: MatchStatus,
        score: Option<u8>,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Match>>;

    /// Records involving `profile`, optionally filtered by status
    async fn matches_for(
        &self,
        profile: ProfileId,
        status: Option<MatchStatus>,
    ) -> StoreResult<Vec<Match>>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the pair's conversation and whether this call created it
    async fn find_or_create_conversation(&self, pair: MatchPair) -> StoreResult<(Conversation, bool)>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, notification: &Notification) -> StoreResult<()>;

    async fn notifications_for(&self, recipient: ProfileId) -> StoreResult<Vec<Notification>>;
}

/// Every capability the services need from one engine
pub trait Store:
    ProfileStore + InteractionStore + MatchStore + ConversationStore + NotificationStore
{
}

impl<T> Store for T where
    T: ProfileStore + InteractionStore + MatchStore + ConversationStore + NotificationStore
{
}
