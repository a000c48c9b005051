use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::match_state::{
    check_response, check_unmatch, effect_of_interaction, upsert_fields, MatchEffect,
    MatchResponse, PENDING_PLACEHOLDER_SCORE,
};
use crate::core::CompatibilityScorer;
use crate::error::{MatchError, MatchResult};
use crate::models::{
    CreateInteractionRequest, Interaction, InteractionOutcome, InteractionType, Match,
    MatchOutcome, MatchPair, MatchStatus, Notification, NotificationKind, Profile, ProfileId,
    ProfileViewsResponse,
};
use crate::services::notifier::Notifier;
use crate::store::Store;

/// Interactions and the match lifecycle
///
/// Store writes (match record, conversation, notification records) are
/// awaited in sequence and any failure is returned to the caller. Publishing
/// to the [`Notifier`] happens only after they all succeed.
pub struct MatchService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    scorer: CompatibilityScorer,
}

impl MatchService {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        scorer: CompatibilityScorer,
    ) -> Self {
        Self {
            store,
            notifier,
            scorer,
        }
    }

    async fn profile(&self, id: ProfileId) -> MatchResult<Profile> {
        self.store
            .get_profile(id)
            .await?
            .ok_or_else(|| MatchError::profile_not_found(id))
    }

    async fn existing_match(&self, match_id: Uuid) -> MatchResult<Match> {
        self.store
            .get_match(match_id)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("Match {} not found", match_id)))
    }

    fn score(&self, requester: &Profile, candidate: &Profile) -> u8 {
        self.scorer.score(requester, candidate, Utc::now().date_naive())
    }

    /// Has `from` recorded a Like or SuperLike towards `to`?
    async fn has_liked(&self, from: ProfileId, to: ProfileId) -> MatchResult<bool> {
        if self
            .store
            .find_interaction(from, to, InteractionType::Like)
            .await?
            .is_some()
        {
            return Ok(true);
        }

        Ok(self
            .store
            .find_interaction(from, to, InteractionType::SuperLike)
            .await?
            .is_some())
    }

    /// Persist a notification record; it is published later by [`Self::publish`]
    async fn record_notification(
        &self,
        pending: &mut Vec<Notification>,
        recipient: ProfileId,
        sender: ProfileId,
        kind: NotificationKind,
        match_id: Option<Uuid>,
    ) -> MatchResult<()> {
        let notification = Notification::new(recipient, sender, kind, match_id);
        self.store.create_notification(&notification).await?;
        pending.push(notification);
        Ok(())
    }

    /// Conversation plus the new-match notification for a freshly Matched pair
    async fn open_match(
        &self,
        pending: &mut Vec<Notification>,
        record: &Match,
        recipient: ProfileId,
        sender: ProfileId,
        kind: NotificationKind,
    ) -> MatchResult<()> {
        let (conversation, created) = self
            .store
            .find_or_create_conversation(record.pair())
            .await?;
        if created {
            tracing::debug!(conversation_id = %conversation.id, match_id = %record.id, "Opened conversation");
        }

        self.record_notification(pending, recipient, sender, kind, Some(record.id))
            .await
    }

    /// Post-commit delivery. Failures are logged and never surface.
    async fn publish(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            let payload = match serde_json::to_value(&notification) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(notification_id = %notification.id, error = %e, "Failed to encode notification");
                    continue;
                }
            };

            if let Err(e) = self.notifier.publish(&notification.topic(), &payload).await {
                tracing::warn!(
                    notification_id = %notification.id,
                    recipient = %notification.recipient,
                    error = %e,
                    "Failed to publish notification"
                );
            }
        }
    }

    /// Record an interaction and apply its effect on the pair's match record.
    ///
    /// An identical `(from, to, type)` edge is returned as
    /// [`InteractionOutcome::Existing`] without side effects. The edge itself
    /// is written after the match, conversation and notification records, so
    /// a request that fails part way leaves no edge behind and a retry
    /// applies the whole effect again.
    pub async fn create_interaction(
        &self,
        request: &CreateInteractionRequest,
    ) -> MatchResult<InteractionOutcome> {
        let (from, to, kind) = (request.user_from, request.user_to, request.kind);
        if from == to {
            return Err(MatchError::InvalidInput(
                "Cannot interact with your own profile".into(),
            ));
        }

        let requester = self.profile(from).await?;
        let target = self.profile(to).await?;

        if let Some(existing) = self.store.find_interaction(from, to, kind).await? {
            tracing::info!(from = %from, to = %to, kind = %kind, "Interaction already exists");
            return Ok(InteractionOutcome::Existing(existing));
        }

        let reciprocal = kind.is_positive() && self.has_liked(to, from).await?;
        let effect = effect_of_interaction(kind, reciprocal);

        let now = Utc::now();
        let score = match effect {
            MatchEffect::Matched => self.score(&requester, &target),
            _ => PENDING_PLACEHOLDER_SCORE,
        };

        let mut pending = Vec::new();
        let match_record = match upsert_fields(effect, score, now) {
            Some(fields) => Some(self.store.upsert_match(MatchPair::new(from, to), fields).await?),
            None => None,
        };

        if let (MatchEffect::Matched, Some(record)) = (effect, &match_record) {
            tracing::info!(match_id = %record.id, score = record.compatibility_score, "Reciprocal like matched");
            self.open_match(&mut pending, record, to, from, NotificationKind::NewMatch)
                .await?;
        }

        if kind == InteractionType::SuperLike {
            let match_id = match_record.as_ref().map(|m| m.id);
            self.record_notification(&mut pending, to, from, NotificationKind::SuperLike, match_id)
                .await?;
        }

        let (interaction, created) = self
            .store
            .insert_interaction(&Interaction::new(from, to, kind))
            .await?;
        self.publish(pending).await;

        if !created {
            // A concurrent identical request wrote the edge first
            tracing::info!(from = %from, to = %to, kind = %kind, "Interaction already exists");
            return Ok(InteractionOutcome::Existing(interaction));
        }

        tracing::info!(from = %from, to = %to, kind = %kind, effect = ?effect, "Recorded interaction");
        Ok(InteractionOutcome::Created {
            interaction,
            match_record,
        })
    }

    /// Delete the requester's most recent interaction. Match records stay.
    pub async fn undo_last_interaction(&self, user_id: ProfileId) -> MatchResult<Interaction> {
        let last = self
            .store
            .latest_interaction(user_id)
            .await?
            .ok_or_else(|| MatchError::NotFound("No interaction to undo".into()))?;

        if !self.store.delete_interaction(last.id).await? {
            return Err(MatchError::NotFound("No interaction to undo".into()));
        }

        tracing::info!(user_id = %user_id, interaction_id = %last.id, "Undid interaction");
        Ok(last)
    }

    pub async fn profile_views(&self, user_id: ProfileId) -> MatchResult<ProfileViewsResponse> {
        self.profile(user_id).await?;
        let views = self
            .store
            .count_received(user_id, InteractionType::View)
            .await?;

        Ok(ProfileViewsResponse { user_id, views })
    }

    /// Existing record for the pair, or a new Pending request from `user_id`
    pub async fn create_or_get_match(
        &self,
        user_id: ProfileId,
        target_id: ProfileId,
    ) -> MatchResult<MatchOutcome> {
        if user_id == target_id {
            return Err(MatchError::InvalidInput("Cannot match with yourself".into()));
        }

        let requester = self.profile(user_id).await?;
        let target = self.profile(target_id).await?;
        let pair = MatchPair::new(user_id, target_id);

        if let Some(existing) = self.store.find_match(pair).await? {
            return Ok(MatchOutcome {
                match_record: existing,
                created: false,
            });
        }

        let score = self.score(&requester, &target);
        let (record, created) = self.store.insert_match_if_absent(pair, score).await?;

        if created {
            let mut pending = Vec::new();
            self.record_notification(
                &mut pending,
                target_id,
                user_id,
                NotificationKind::MatchRequest,
                Some(record.id),
            )
            .await?;
            self.publish(pending).await;
            tracing::info!(match_id = %record.id, score, "Created match request");
        }

        Ok(MatchOutcome {
            match_record: record,
            created,
        })
    }

    /// Accept or reject a Pending request addressed to `user_id`
    pub async fn respond_to_match(
        &self,
        match_id: Uuid,
        user_id: ProfileId,
        action: MatchResponse,
    ) -> MatchResult<Match> {
        let record = self.existing_match(match_id).await?;
        let next = check_response(&record, user_id, action)?;

        let score = match next {
            MatchStatus::Matched => {
                let initiator = self.profile(record.user1).await?;
                let responder = self.profile(record.user2).await?;
                Some(self.score(&initiator, &responder))
            }
            _ => None,
        };

        let updated = self
            .store
            .update_match_status(match_id, next, score, Utc::now())
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("Match {} not found", match_id)))?;

        let mut pending = Vec::new();
        match next {
            MatchStatus::Matched => {
                self.open_match(
                    &mut pending,
                    &updated,
                    updated.user1,
                    user_id,
                    NotificationKind::MatchAccepted,
                )
                .await?
            }
            _ => {
                self.record_notification(
                    &mut pending,
                    updated.user1,
                    user_id,
                    NotificationKind::MatchRejected,
                    Some(updated.id),
                )
                .await?
            }
        }
        self.publish(pending).await;

        tracing::info!(match_id = %match_id, status = %next, "Responded to match request");
        Ok(updated)
    }

    pub async fn unmatch(&self, match_id: Uuid, user_id: ProfileId) -> MatchResult<Match> {
        let record = self.existing_match(match_id).await?;
        check_unmatch(&record, user_id)?;

        let updated = self
            .store
            .update_match_status(match_id, MatchStatus::Unmatched, None, Utc::now())
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("Match {} not found", match_id)))?;

        tracing::info!(match_id = %match_id, user_id = %user_id, "Unmatched");
        Ok(updated)
    }

    /// Matched records involving the profile, newest first
    pub async fn list_matches(&self, user_id: ProfileId) -> MatchResult<Vec<Match>> {
        self.profile(user_id).await?;
        Ok(self
            .store
            .matches_for(user_id, Some(MatchStatus::Matched))
            .await?)
    }
}
