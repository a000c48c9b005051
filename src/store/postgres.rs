use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::{
    ConversationStore, InteractionStore, MatchStore, NotificationStore, ProfileStore, StoreError,
    StoreResult,
};
use crate::config::DatabaseSettings;
use crate::core::{calculate_bounding_box, PENDING_PLACEHOLDER_SCORE};
use crate::models::{
    AgeRange, CandidateQuery, Conversation, Coordinates, Interaction, InteractionType, Location,
    Match, MatchFields, MatchPair, MatchStatus, Notification, NotificationKind, Profile, ProfileId,
};

const PROFILE_COLUMNS: &str = "id, account_id, display_name, date_of_birth, gender, interested_in, \
     age_min, age_max, longitude, latitude, radius_km, hobbies, goals, relationship_status, \
     smoking, drinking, children, children_desire, education, occupation, created_at";

const MATCH_COLUMNS: &str =
    "id, user1, user2, compatibility_score, status, matched_at, unmatched_at, created_at, updated_at";

/// PostgreSQL store engine
///
/// Pair uniqueness for matches and conversations is enforced by unique
/// indexes on `(LEAST(a, b), GREATEST(a, b))`; every write to those tables is
/// an `INSERT ... ON CONFLICT` against that index.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run migrations
    pub async fn connect(settings: &DatabaseSettings) -> StoreResult<Self> {
        tracing::info!(
            max_connections = settings.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
            .test_before_acquire(true)
            .connect(&settings.url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Insert or replace a profile
    pub async fn upsert_profile(&self, profile: &Profile) -> StoreResult<()> {
        let range = profile.preference_age_range;
        if !range.is_valid() {
            return Err(StoreError::Corrupt(format!(
                "profile {} has age range {}-{}",
                profile.id, range.min, range.max
            )));
        }
        let coordinates = profile.coordinates();

        sqlx::query(
            r#"
            INSERT INTO profiles (
                id, account_id, display_name, date_of_birth, gender, interested_in,
                age_min, age_max, longitude, latitude, radius_km, hobbies, goals,
                relationship_status, smoking, drinking, children, children_desire,
                education, occupation, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            ON CONFLICT (id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                date_of_birth = EXCLUDED.date_of_birth,
                gender = EXCLUDED.gender,
                interested_in = EXCLUDED.interested_in,
                age_min = EXCLUDED.age_min,
                age_max = EXCLUDED.age_max,
                longitude = EXCLUDED.longitude,
                latitude = EXCLUDED.latitude,
                radius_km = EXCLUDED.radius_km,
                hobbies = EXCLUDED.hobbies,
                goals = EXCLUDED.goals,
                relationship_status = EXCLUDED.relationship_status,
                smoking = EXCLUDED.smoking,
                drinking = EXCLUDED.drinking,
                children = EXCLUDED.children,
                children_desire = EXCLUDED.children_desire,
                education = EXCLUDED.education,
                occupation = EXCLUDED.occupation
            "#,
        )
        .bind(profile.id)
        .bind(profile.account_id)
        .bind(&profile.display_name)
        .bind(profile.date_of_birth)
        .bind(profile.gender.as_str())
        .bind(profile.interested_in.as_str())
        .bind(profile.preference_age_range.min as i32)
        .bind(profile.preference_age_range.max as i32)
        .bind(coordinates.map(|c| c.longitude))
        .bind(coordinates.map(|c| c.latitude))
        .bind(profile.location.radius_km)
        .bind(&profile.hobbies)
        .bind(profile.goals.map(|v| v.as_str()))
        .bind(profile.relationship_status.map(|v| v.as_str()))
        .bind(profile.smoking.map(|v| v.as_str()))
        .bind(profile.drinking.map(|v| v.as_str()))
        .bind(profile.children.map(|v| v.as_str()))
        .bind(profile.children_desire.map(|v| v.as_str()))
        .bind(profile.education.map(|v| v.as_str()))
        .bind(profile.occupation.as_deref())
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn parse_label<T>(value: String) -> StoreResult<T>
where
    T: FromStr<Err = crate::models::UnknownLabel>,
{
    Ok(value.parse::<T>()?)
}

fn parse_optional<T>(value: Option<String>) -> StoreResult<Option<T>>
where
    T: FromStr<Err = crate::models::UnknownLabel>,
{
    value.map(parse_label).transpose()
}

fn score_from_db(value: i16) -> StoreResult<u8> {
    u8::try_from(value).map_err(|_| StoreError::Corrupt(format!("compatibility score {}", value)))
}

fn profile_from_row(row: &PgRow) -> StoreResult<Profile> {
    let longitude: Option<f64> = row.try_get("longitude")?;
    let latitude: Option<f64> = row.try_get("latitude")?;
    let age_min: i32 = row.try_get("age_min")?;
    let age_max: i32 = row.try_get("age_max")?;

    Ok(Profile {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        display_name: row.try_get("display_name")?,
        date_of_birth: row.try_get("date_of_birth")?,
        gender: parse_label(row.try_get("gender")?)?,
        interested_in: parse_label(row.try_get("interested_in")?)?,
        preference_age_range: AgeRange {
            min: age_min.max(0) as u32,
            max: age_max.max(0) as u32,
        },
        location: Location {
            coordinates: longitude
                .zip(latitude)
                .map(|(lon, lat)| Coordinates::new(lon, lat)),
            radius_km: row.try_get("radius_km")?,
        },
        hobbies: row.try_get("hobbies")?,
        goals: parse_optional(row.try_get("goals")?)?,
        relationship_status: parse_optional(row.try_get("relationship_status")?)?,
        smoking: parse_optional(row.try_get("smoking")?)?,
        drinking: parse_optional(row.try_get("drinking")?)?,
        children: parse_optional(row.try_get("children")?)?,
        children_desire: parse_optional(row.try_get("children_desire")?)?,
        education: parse_optional(row.try_get("education")?)?,
        occupation: row.try_get("occupation")?,
        created_at: row.try_get("created_at")?,
    })
}

fn interaction_from_row(row: &PgRow) -> StoreResult<Interaction> {
    Ok(Interaction {
        id: row.try_get("id")?,
        user_from: row.try_get("user_from")?,
        user_to: row.try_get("user_to")?,
        kind: parse_label(row.try_get("kind")?)?,
        created_at: row.try_get("created_at")?,
    })
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    Ok(Match {
        id: row.try_get("id")?,
        user1: row.try_get("user1")?,
        user2: row.try_get("user2")?,
        compatibility_score: score_from_db(row.try_get("compatibility_score")?)?,
        status: parse_label(row.try_get("status")?)?,
        matched_at: row.try_get("matched_at")?,
        unmatched_at: row.try_get("unmatched_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn conversation_from_row(row: &PgRow) -> StoreResult<Conversation> {
    Ok(Conversation {
        id: row.try_get("id")?,
        participants: [row.try_get("participant1")?, row.try_get("participant2")?],
        created_at: row.try_get("created_at")?,
    })
}

fn notification_from_row(row: &PgRow) -> StoreResult<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        recipient: row.try_get("recipient")?,
        sender: row.try_get("sender")?,
        kind: parse_label::<NotificationKind>(row.try_get("kind")?)?,
        match_id: row.try_get("match_id")?,
        read: row.try_get("read")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Append `AND column = value` when the filter is present
fn push_equality(qb: &mut QueryBuilder<'_, Postgres>, column: &str, value: Option<&'static str>) {
    if let Some(value) = value {
        qb.push(format!(" AND {} = ", column));
        qb.push_bind(value);
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn get_profile(&self, id: ProfileId) -> StoreResult<Option<Profile>> {
        let query = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn find_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Profile>> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM profiles WHERE date_of_birth >= ", PROFILE_COLUMNS));
        qb.push_bind(query.born_from);
        qb.push(" AND date_of_birth <= ");
        qb.push_bind(query.born_until);

        if !query.exclude_ids.is_empty() {
            let excluded: Vec<Uuid> = query.exclude_ids.iter().copied().collect();
            qb.push(" AND NOT (id = ANY(");
            qb.push_bind(excluded);
            qb.push("))");
        }

        push_equality(&mut qb, "gender", query.gender.map(|v| v.as_str()));

        if let Some(geo) = &query.geo {
            let center = geo.center;

            // Index-friendly pre-filter, widened so it never cuts into the cap
            let bbox = calculate_bounding_box(center.latitude, center.longitude, geo.radius_km * 1.1);
            qb.push(" AND latitude IS NOT NULL AND longitude IS NOT NULL AND latitude BETWEEN ");
            qb.push_bind(bbox.min_lat);
            qb.push(" AND ");
            qb.push_bind(bbox.max_lat);
            if bbox.min_lon >= -180.0 && bbox.max_lon <= 180.0 {
                qb.push(" AND longitude BETWEEN ");
                qb.push_bind(bbox.min_lon);
                qb.push(" AND ");
                qb.push_bind(bbox.max_lon);
            }

            // Haversine central angle against the radius in radians
            qb.push(" AND 2 * asin(LEAST(1.0, sqrt(power(sin(radians(latitude - ");
            qb.push_bind(center.latitude);
            qb.push(") / 2), 2) + cos(radians(");
            qb.push_bind(center.latitude);
            qb.push(")) * cos(radians(latitude)) * power(sin(radians(longitude - ");
            qb.push_bind(center.longitude);
            qb.push(") / 2), 2)))) <= ");
            qb.push_bind(geo.radius_radians);
        }

        push_equality(&mut qb, "goals", query.goals.map(|v| v.as_str()));
        push_equality(
            &mut qb,
            "relationship_status",
            query.relationship_status.map(|v| v.as_str()),
        );
        push_equality(&mut qb, "children", query.children.map(|v| v.as_str()));
        push_equality(&mut qb, "children_desire", query.children_desire.map(|v| v.as_str()));
        push_equality(&mut qb, "smoking", query.smoking.map(|v| v.as_str()));
        push_equality(&mut qb, "drinking", query.drinking.map(|v| v.as_str()));

        qb.push(" ORDER BY created_at, id");
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        tracing::debug!(rows = rows.len(), "Candidate query returned");

        rows.iter().map(profile_from_row).collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl InteractionStore for PostgresStore {
    async fn find_interaction(
        &self,
        from: ProfileId,
        to: ProfileId,
        kind: InteractionType,
    ) -> StoreResult<Option<Interaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_from, user_to, kind, created_at
            FROM interactions
            WHERE user_from = $1 AND user_to = $2 AND kind = $3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(interaction_from_row).transpose()
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> StoreResult<(Interaction, bool)> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO interactions (id, user_from, user_to, kind, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_from, user_to, kind) DO NOTHING
            RETURNING id, user_from, user_to, kind, created_at
            "#,
        )
        .bind(interaction.id)
        .bind(interaction.user_from)
        .bind(interaction.user_to)
        .bind(interaction.kind.as_str())
        .bind(interaction.created_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((interaction_from_row(&row)?, true));
        }

        let existing = self
            .find_interaction(interaction.user_from, interaction.user_to, interaction.kind)
            .await?
            .ok_or_else(|| StoreError::Corrupt("interaction conflict without a row".into()))?;
        Ok((existing, false))
    }

    async fn disliked_targets(&self, from: ProfileId) -> StoreResult<Vec<ProfileId>> {
        let rows = sqlx::query("SELECT user_to FROM interactions WHERE user_from = $1 AND kind = $2")
            .bind(from)
            .bind(InteractionType::Dislike.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get("user_to").map_err(StoreError::from))
            .collect()
    }

    async fn latest_interaction(&self, from: ProfileId) -> StoreResult<Option<Interaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_from, user_to, kind, created_at
            FROM interactions
            WHERE user_from = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(from)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(interaction_from_row).transpose()
    }

    async fn delete_interaction(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM interactions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_received(&self, to: ProfileId, kind: InteractionType) -> StoreResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM interactions WHERE user_to = $1 AND kind = $2")
                .bind(to)
                .bind(kind.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn find_match(&self, pair: MatchPair) -> StoreResult<Option<Match>> {
        let (low, high) = pair.key();
        let query = format!(
            "SELECT {} FROM matches WHERE LEAST(user1, user2) = $1 AND GREATEST(user1, user2) = $2",
            MATCH_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(low)
            .bind(high)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let query = format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn upsert_match(&self, pair: MatchPair, fields: MatchFields) -> StoreResult<Match> {
        let insert_score = fields.compatibility_score.unwrap_or(PENDING_PLACEHOLDER_SCORE);
        let query = format!(
            r#"
            INSERT INTO matches (id, user1, user2, compatibility_score, status, matched_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            ON CONFLICT ((LEAST(user1, user2)), (GREATEST(user1, user2))) DO UPDATE SET
                status = EXCLUDED.status,
                compatibility_score = COALESCE($7, matches.compatibility_score),
                matched_at = COALESCE(EXCLUDED.matched_at, matches.matched_at),
                updated_at = NOW()
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(pair.user1)
            .bind(pair.user2)
            .bind(insert_score as i16)
            .bind(fields.status.as_str())
            .bind(fields.matched_at)
            .bind(fields.compatibility_score.map(i16::from))
            .fetch_one(&self.pool)
            .await?;

        match_from_row(&row)
    }

    async fn insert_match_if_absent(&self, pair: MatchPair, score: u8) -> StoreResult<(Match, bool)> {
        let query = format!(
            r#"
            INSERT INTO matches (id, user1, user2, compatibility_score, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT ((LEAST(user1, user2)), (GREATEST(user1, user2))) DO NOTHING
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );

        let inserted = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(pair.user1)
            .bind(pair.user2)
            .bind(score as i16)
            .bind(MatchStatus::Pending.as_str())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok((match_from_row(&row)?, true));
        }

        let existing = self
            .find_match(pair)
            .await?
            .ok_or_else(|| StoreError::Corrupt("match conflict without a row".into()))?;
        Ok((existing, false))
    }

    async fn update_match_status(
        &self,
        id: Uuid,
        status: MatchStatus,
        score: Option<u8>,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Match>> {
        let query = format!(
            r#"
            UPDATE matches SET
                status = $2,
                compatibility_score = COALESCE($3, compatibility_score),
                matched_at = CASE WHEN $2 = 'Matched' THEN $4 ELSE matched_at END,
                unmatched_at = CASE WHEN $2 = 'Unmatched' THEN $4 ELSE unmatched_at END,
                updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(score.map(i16::from))
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn matches_for(
        &self,
        profile: ProfileId,
        status: Option<MatchStatus>,
    ) -> StoreResult<Vec<Match>> {
        let query = format!(
            r#"
            SELECT {} FROM matches
            WHERE (user1 = $1 OR user2 = $1) AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY matched_at DESC NULLS LAST, created_at DESC
            "#,
            MATCH_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(profile)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(match_from_row).collect()
    }
}

#[async_trait]
impl ConversationStore for PostgresStore {
    async fn find_or_create_conversation(&self, pair: MatchPair) -> StoreResult<(Conversation, bool)> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO conversations (id, participant1, participant2, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT ((LEAST(participant1, participant2)), (GREATEST(participant1, participant2))) DO NOTHING
            RETURNING id, participant1, participant2, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(pair.user1)
        .bind(pair.user2)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((conversation_from_row(&row)?, true));
        }

        let (low, high) = pair.key();
        let row = sqlx::query(
            r#"
            SELECT id, participant1, participant2, created_at
            FROM conversations
            WHERE LEAST(participant1, participant2) = $1 AND GREATEST(participant1, participant2) = $2
            "#,
        )
        .bind(low)
        .bind(high)
        .fetch_one(&self.pool)
        .await?;

        Ok((conversation_from_row(&row)?, false))
    }
}

#[async_trait]
impl NotificationStore for PostgresStore {
    async fn create_notification(&self, notification: &Notification) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient, sender, kind, match_id, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id)
        .bind(notification.recipient)
        .bind(notification.sender)
        .bind(notification.kind.as_str())
        .bind(notification.match_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn notifications_for(&self, recipient: ProfileId) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, recipient, sender, kind, match_id, read, created_at
            FROM notifications
            WHERE recipient = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_score_is_corrupt() {
        assert_eq!(score_from_db(73).unwrap(), 73);
        assert!(score_from_db(-1).is_err());
        assert!(score_from_db(300).is_err());
    }

    #[test]
    fn test_unknown_label_is_corrupt() {
        let err = parse_label::<MatchStatus>("Engaged".to_string()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_upsert_match_either_order() {
        let settings = DatabaseSettings::default();
        let store = PostgresStore::connect(&settings).await.expect("Failed to connect");

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        for id in [a, b] {
            let profile = Profile {
                id,
                account_id: Uuid::new_v4(),
                display_name: String::new(),
                date_of_birth: chrono::NaiveDate::from_ymd_opt(1995, 1, 1).unwrap(),
                gender: crate::models::Gender::Female,
                interested_in: crate::models::Gender::Male,
                preference_age_range: AgeRange::default(),
                location: Location::default(),
                hobbies: vec![],
                goals: None,
                relationship_status: None,
                smoking: None,
                drinking: None,
                children: None,
                children_desire: None,
                education: None,
                occupation: None,
                created_at: Utc::now(),
            };
            store.upsert_profile(&profile).await.unwrap();
        }

        let pending = MatchFields {
            status: MatchStatus::Pending,
            compatibility_score: Some(PENDING_PLACEHOLDER_SCORE),
            matched_at: None,
        };
        let first = store.upsert_match(MatchPair::new(a, b), pending).await.unwrap();
        let second = store.upsert_match(MatchPair::new(b, a), pending).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.user1, a);
    }
}
