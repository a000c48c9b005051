use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Profile identifier. Interactions and matches reference profiles by this id.
pub type ProfileId = Uuid;

/// A stored or submitted label that names no known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

/// Declares an enum whose serialized form is a human-readable label.
///
/// The same label is used on the wire and in the database, so `as_str` and
/// `FromStr` are generated alongside the serde renames.
macro_rules! labeled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownLabel {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

labeled_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

labeled_enum!(
    /// Relationship intent
    Goal {
        SeriousRelationship => "Serious relationship",
        LongTermRelationships => "Long-term relationships",
        CasualDating => "Casual dating",
        Friendship => "Friendship",
        NotSure => "Not sure yet",
    }
);

labeled_enum!(RelationshipStatus {
    Single => "Single",
    Divorced => "Divorced",
    Separated => "Separated",
    Widowed => "Widowed",
    Complicated => "It's complicated",
});

labeled_enum!(Smoking {
    Never => "Never",
    Occasionally => "Occasionally",
    Regularly => "Regularly",
});

labeled_enum!(Drinking {
    Never => "Never",
    Socially => "Socially",
    Regularly => "Regularly",
});

labeled_enum!(Children {
    NoChildren => "No children",
    HasChildren => "Has children",
});

labeled_enum!(ChildrenDesire {
    Want => "Want children",
    DontWant => "Don't want children",
    Open => "Open to children",
    NotSure => "Not sure",
});

labeled_enum!(Education {
    HighSchool => "High school",
    Bachelor => "Bachelor",
    Master => "Master",
    Doctorate => "Doctorate",
    Other => "Other",
});

labeled_enum!(InteractionType {
    Like => "Like",
    Dislike => "Dislike",
    SuperLike => "SuperLike",
    Message => "Message",
    View => "View",
});

impl InteractionType {
    /// Like and SuperLike both express interest and can complete a match
    pub fn is_positive(&self) -> bool {
        matches!(self, InteractionType::Like | InteractionType::SuperLike)
    }
}

labeled_enum!(MatchStatus {
    Pending => "Pending",
    Matched => "Matched",
    Rejected => "Rejected",
    Unmatched => "Unmatched",
});

labeled_enum!(NotificationKind {
    MatchRequest => "match_request",
    NewMatch => "new_match",
    MatchAccepted => "match_accepted",
    MatchRejected => "match_rejected",
    SuperLike => "super_like",
});

/// Geographic point serialized as `[longitude, latitude]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self { longitude, latitude }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.longitude, c.latitude]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            coordinates: None,
            radius_km: default_radius_km(),
        }
    }
}

fn default_radius_km() -> f64 { 50.0 }

/// Inclusive age bounds in years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub const MIN_AGE: u32 = 18;
    pub const MAX_AGE: u32 = 120;

    /// `18 ≤ min ≤ max ≤ 120`
    pub fn is_valid(&self) -> bool {
        self.min >= Self::MIN_AGE && self.min <= self.max && self.max <= Self::MAX_AGE
    }

    pub fn contains(&self, age: u32) -> bool {
        age >= self.min && age <= self.max
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self { min: Self::MIN_AGE, max: 99 }
    }
}

/// Dating profile with the attributes used for matching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub account_id: Uuid,
    #[serde(default)]
    pub display_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub interested_in: Gender,
    #[serde(default)]
    pub preference_age_range: AgeRange,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub goals: Option<Goal>,
    #[serde(default)]
    pub relationship_status: Option<RelationshipStatus>,
    #[serde(default)]
    pub smoking: Option<Smoking>,
    #[serde(default)]
    pub drinking: Option<Drinking>,
    #[serde(default)]
    pub children: Option<Children>,
    #[serde(default)]
    pub children_desire: Option<ChildrenDesire>,
    #[serde(default)]
    pub education: Option<Education>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Age in whole years on `today`, counting a birthday only once it has passed
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        age_on(self.date_of_birth, today)
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.coordinates
    }
}

pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Directed interaction from one profile to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: Uuid,
    pub user_from: ProfileId,
    pub user_to: ProfileId,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(user_from: ProfileId, user_to: ProfileId, kind: InteractionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_from,
            user_to,
            kind,
            created_at: Utc::now(),
        }
    }
}

/// Participants of a match as written on first insert.
///
/// `user1` is the initiator. Lookups treat the pair as unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchPair {
    pub user1: ProfileId,
    pub user2: ProfileId,
}

impl MatchPair {
    pub fn new(initiator: ProfileId, counterpart: ProfileId) -> Self {
        Self {
            user1: initiator,
            user2: counterpart,
        }
    }

    /// Order-independent key; `(a, b)` and `(b, a)` produce the same value
    pub fn key(&self) -> (ProfileId, ProfileId) {
        if self.user1 <= self.user2 {
            (self.user1, self.user2)
        } else {
            (self.user2, self.user1)
        }
    }
}

/// Undirected mutual-interest record for a pair of profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub user1: ProfileId,
    pub user2: ProfileId,
    pub compatibility_score: u8,
    pub status: MatchStatus,
    pub matched_at: Option<DateTime<Utc>>,
    pub unmatched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn pair(&self) -> MatchPair {
        MatchPair::new(self.user1, self.user2)
    }

    pub fn involves(&self, profile_id: ProfileId) -> bool {
        self.user1 == profile_id || self.user2 == profile_id
    }

    /// The participant that is not `profile_id`
    pub fn other_party(&self, profile_id: ProfileId) -> Option<ProfileId> {
        if self.user1 == profile_id {
            Some(self.user2)
        } else if self.user2 == profile_id {
            Some(self.user1)
        } else {
            None
        }
    }
}

/// Fields written by a match upsert.
///
/// `compatibility_score: None` keeps the stored score on update; on insert the
/// pending placeholder is written instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchFields {
    pub status: MatchStatus,
    pub compatibility_score: Option<u8>,
    pub matched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub participants: [ProfileId; 2],
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient: ProfileId,
    pub sender: ProfileId,
    pub kind: NotificationKind,
    pub match_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient: ProfileId,
        sender: ProfileId,
        kind: NotificationKind,
        match_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient,
            sender,
            kind,
            match_id,
            read: false,
            created_at: Utc::now(),
        }
    }

    /// Pub/sub topic the notification is published on
    pub fn topic(&self) -> String {
        format!("notifications:{}", self.recipient)
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Spherical-cap constraint: candidates within `radius_radians` of `center`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoWithin {
    pub center: Coordinates,
    pub radius_km: f64,
    pub radius_radians: f64,
}

/// Store-agnostic description of a candidate profile lookup
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub exclude_ids: HashSet<ProfileId>,
    /// Inclusive date-of-birth window derived from the age range
    pub born_from: NaiveDate,
    pub born_until: NaiveDate,
    pub gender: Option<Gender>,
    pub geo: Option<GeoWithin>,
    pub goals: Option<Goal>,
    pub relationship_status: Option<RelationshipStatus>,
    pub children: Option<Children>,
    pub children_desire: Option<ChildrenDesire>,
    pub smoking: Option<Smoking>,
    pub drinking: Option<Drinking>,
    pub limit: Option<usize>,
}
