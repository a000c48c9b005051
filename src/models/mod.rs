// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    age_on, AgeRange, BoundingBox, CandidateQuery, Children, ChildrenDesire, Conversation,
    Coordinates, Drinking, Education, Gender, GeoWithin, Goal, Interaction, InteractionType,
    Location, Match, MatchFields, MatchPair, MatchStatus, Notification, NotificationKind, Profile,
    ProfileId, RelationshipStatus, Smoking, UnknownLabel,
};
pub use requests::{
    CreateInteractionRequest, CreateMatchRequest, LatLng, RecommendationQuery,
    RespondMatchRequest, SearchFilters, SearchRequest, UserRequest,
};
pub use responses::{
    AdvancedSearchResponse, ErrorResponse, HealthResponse, InteractionOutcome,
    InteractionResponse, MatchOutcome, ProfileViewsResponse, RecommendationResponse,
    ScoredCandidate,
};
