use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ConversationStore, InteractionStore, MatchStore, NotificationStore, ProfileStore, StoreResult,
};
use crate::core::{matches_query, PENDING_PLACEHOLDER_SCORE};
use crate::models::{
    CandidateQuery, Conversation, Interaction, InteractionType, Match, MatchFields, MatchPair,
    MatchStatus, Notification, Profile, ProfileId,
};

type PairKey = (ProfileId, ProfileId);

#[derive(Default)]
struct State {
    /// Insertion order doubles as the candidate query order
    profiles: Vec<Profile>,
    interactions: Vec<Interaction>,
    matches: HashMap<PairKey, Match>,
    conversations: HashMap<PairKey, Conversation>,
    notifications: Vec<Notification>,
}

/// In-memory store engine.
///
/// Every mutation runs under one write lock, which gives the same
/// one-record-per-pair guarantee the SQL engine gets from its unique indexes.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile
    pub async fn upsert_profile(&self, profile: Profile) {
        let mut state = self.state.write().await;
        match state.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => state.profiles.push(profile),
        }
    }

    pub async fn match_count(&self) -> usize {
        self.state.read().await.matches.len()
    }

    pub async fn conversations_for(&self, pair: MatchPair) -> Vec<Conversation> {
        let state = self.state.read().await;
        state.conversations.get(&pair.key()).cloned().into_iter().collect()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, id: ProfileId) -> StoreResult<Option<Profile>> {
        let state = self.state.read().await;
        Ok(state.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn find_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Profile>> {
        let state = self.state.read().await;
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(state
            .profiles
            .iter()
            .filter(|profile| matches_query(profile, query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl InteractionStore for MemoryStore {
    async fn find_interaction(
        &self,
        from: ProfileId,
        to: ProfileId,
        kind: InteractionType,
    ) -> StoreResult<Option<Interaction>> {
        let state = self.state.read().await;
        Ok(state
            .interactions
            .iter()
            .find(|i| i.user_from == from && i.user_to == to && i.kind == kind)
            .cloned())
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> StoreResult<(Interaction, bool)> {
        let mut state = self.state.write().await;

        let existing = state.interactions.iter().find(|i| {
            i.user_from == interaction.user_from
                && i.user_to == interaction.user_to
                && i.kind == interaction.kind
        });
        if let Some(existing) = existing {
            return Ok((existing.clone(), false));
        }

        state.interactions.push(interaction.clone());
        Ok((interaction.clone(), true))
    }

    async fn disliked_targets(&self, from: ProfileId) -> StoreResult<Vec<ProfileId>> {
        let state = self.state.read().await;
        Ok(state
            .interactions
            .iter()
            .filter(|i| i.user_from == from && i.kind == InteractionType::Dislike)
            .map(|i| i.user_to)
            .collect())
    }

    async fn latest_interaction(&self, from: ProfileId) -> StoreResult<Option<Interaction>> {
        let state = self.state.read().await;
        // Later pushes win ties on created_at
        Ok(state
            .interactions
            .iter()
            .enumerate()
            .filter(|(_, i)| i.user_from == from)
            .max_by_key(|(idx, i)| (i.created_at, *idx))
            .map(|(_, i)| i.clone()))
    }

    async fn delete_interaction(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.interactions.len();
        state.interactions.retain(|i| i.id != id);
        Ok(state.interactions.len() != before)
    }

    async fn count_received(&self, to: ProfileId, kind: InteractionType) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .interactions
            .iter()
            .filter(|i| i.user_to == to && i.kind == kind)
            .count() as u64)
    }
}

fn new_match(pair: MatchPair, status: MatchStatus, score: u8, now: DateTime<Utc>) -> Match {
    Match {
        id: Uuid::new_v4(),
        user1: pair.user1,
        user2: pair.user2,
        compatibility_score: score,
        status,
        matched_at: None,
        unmatched_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn find_match(&self, pair: MatchPair) -> StoreResult<Option<Match>> {
        let state = self.state.read().await;
        Ok(state.matches.get(&pair.key()).cloned())
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let state = self.state.read().await;
        Ok(state.matches.values().find(|m| m.id == id).cloned())
    }

    async fn upsert_match(&self, pair: MatchPair, fields: MatchFields) -> StoreResult<Match> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let record = state.matches.entry(pair.key()).or_insert_with(|| {
            new_match(
                pair,
                fields.status,
                fields.compatibility_score.unwrap_or(PENDING_PLACEHOLDER_SCORE),
                now,
            )
        });

        record.status = fields.status;
        if let Some(score) = fields.compatibility_score {
            record.compatibility_score = score;
        }
        if fields.matched_at.is_some() {
            record.matched_at = fields.matched_at;
        }
        record.updated_at = now;

        Ok(record.clone())
    }

    async fn insert_match_if_absent(&self, pair: MatchPair, score: u8) -> StoreResult<(Match, bool)> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.matches.get(&pair.key()) {
            return Ok((existing.clone(), false));
        }

        let record = new_match(pair, MatchStatus::Pending, score, Utc::now());
        state.matches.insert(pair.key(), record.clone());
        Ok((record, true))
    }

    async fn update_match_status(
        &self,
        id: Uuid,
        status: MatchStatus,
        score: Option<u8>,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Match>> {
        let mut state = self.state.write().await;
        let Some(record) = state.matches.values_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        record.status = status;
        if let Some(score) = score {
            record.compatibility_score = score;
        }
        match status {
            MatchStatus::Matched => record.matched_at = Some(at),
            MatchStatus::Unmatched => record.unmatched_at = Some(at),
            MatchStatus::Pending | MatchStatus::Rejected => {}
        }
        record.updated_at = at;

        Ok(Some(record.clone()))
    }

    async fn matches_for(
        &self,
        profile: ProfileId,
        status: Option<MatchStatus>,
    ) -> StoreResult<Vec<Match>> {
        let state = self.state.read().await;
        let mut found: Vec<Match> = state
            .matches
            .values()
            .filter(|m| m.involves(profile))
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            b.matched_at
                .cmp(&a.matched_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(found)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn find_or_create_conversation(&self, pair: MatchPair) -> StoreResult<(Conversation, bool)> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.conversations.get(&pair.key()) {
            return Ok((existing.clone(), false));
        }

        let conversation = Conversation {
            id: Uuid::new_v4(),
            participants: [pair.user1, pair.user2],
            created_at: Utc::now(),
        };
        state.conversations.insert(pair.key(), conversation.clone());
        Ok((conversation, true))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.state.write().await.notifications.push(notification.clone());
        Ok(())
    }

    async fn notifications_for(&self, recipient: ProfileId) -> StoreResult<Vec<Notification>> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(status: MatchStatus, score: Option<u8>) -> MatchFields {
        MatchFields {
            status,
            compatibility_score: score,
            matched_at: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_either_order_hits_same_record() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let first = store
            .upsert_match(MatchPair::new(a, b), fields(MatchStatus::Pending, Some(50)))
            .await
            .unwrap();
        let second = store
            .upsert_match(MatchPair::new(b, a), fields(MatchStatus::Matched, Some(80)))
            .await
            .unwrap();

        assert_eq!(store.match_count().await, 1);
        assert_eq!(first.id, second.id);
        assert_eq!(second.user1, a, "participants are only written on insert");
        assert_eq!(second.status, MatchStatus::Matched);
        assert_eq!(second.compatibility_score, 80);
    }

    #[tokio::test]
    async fn test_upsert_without_score_keeps_stored_score() {
        let store = MemoryStore::new();
        let pair = MatchPair::new(Uuid::new_v4(), Uuid::new_v4());

        store
            .upsert_match(pair, fields(MatchStatus::Matched, Some(91)))
            .await
            .unwrap();
        let rejected = store
            .upsert_match(pair, fields(MatchStatus::Rejected, None))
            .await
            .unwrap();

        assert_eq!(rejected.compatibility_score, 91);
    }

    #[tokio::test]
    async fn test_duplicate_interaction_not_inserted() {
        let store = MemoryStore::new();
        let interaction = Interaction::new(Uuid::new_v4(), Uuid::new_v4(), InteractionType::Like);

        let (_, created) = store.insert_interaction(&interaction).await.unwrap();
        assert!(created);

        let duplicate = Interaction::new(interaction.user_from, interaction.user_to, InteractionType::Like);
        let (stored, created) = store.insert_interaction(&duplicate).await.unwrap();
        assert!(!created);
        assert_eq!(stored.id, interaction.id);
    }
}
