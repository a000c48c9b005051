use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::AppState;
use crate::error::MatchError;
use crate::models::{
    CreateInteractionRequest, CreateMatchRequest, InteractionOutcome, InteractionResponse,
    RespondMatchRequest, UserRequest,
};

/// Configure interaction and match routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/interactions", web::post().to(create_interaction))
        .route("/interactions/last", web::delete().to(undo_last_interaction))
        .route("/profiles/{id}/views", web::get().to(profile_views))
        .route("/matches", web::get().to(list_matches))
        .route("/matches", web::post().to(create_or_get_match))
        .route("/matches/{id}/respond", web::post().to(respond_to_match))
        .route("/matches/{id}/unmatch", web::post().to(unmatch));
}

/// POST /api/v1/interactions
///
/// Request body:
/// ```json
/// {
///   "userFrom": "uuid",
///   "userTo": "uuid",
///   "type": "Like|Dislike|SuperLike|Message|View"
/// }
/// ```
///
/// 201 with the new interaction, or 200 with
/// `{message: "Interaction already exists", interaction}` for a duplicate.
async fn create_interaction(
    state: web::Data<AppState>,
    req: web::Json<CreateInteractionRequest>,
) -> Result<HttpResponse, MatchError> {
    let outcome = state.matches.create_interaction(&req).await?;

    let mut response = match outcome {
        InteractionOutcome::Created { .. } => HttpResponse::Created(),
        InteractionOutcome::Existing(_) => HttpResponse::Ok(),
    };
    Ok(response.json(InteractionResponse::from(outcome)))
}

/// DELETE /api/v1/interactions/last?userId={id}
async fn undo_last_interaction(
    state: web::Data<AppState>,
    query: web::Query<UserRequest>,
) -> Result<HttpResponse, MatchError> {
    let removed = state.matches.undo_last_interaction(query.user_id).await?;
    Ok(HttpResponse::Ok().json(removed))
}

/// GET /api/v1/profiles/{id}/views
async fn profile_views(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, MatchError> {
    let views = state.matches.profile_views(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views))
}

/// GET /api/v1/matches?userId={id}
async fn list_matches(
    state: web::Data<AppState>,
    query: web::Query<UserRequest>,
) -> Result<HttpResponse, MatchError> {
    let matches = state.matches.list_matches(query.user_id).await?;
    Ok(HttpResponse::Ok().json(matches))
}

/// POST /api/v1/matches
///
/// Request body: `{"userId": "uuid", "targetId": "uuid"}`
async fn create_or_get_match(
    state: web::Data<AppState>,
    req: web::Json<CreateMatchRequest>,
) -> Result<HttpResponse, MatchError> {
    let outcome = state
        .matches
        .create_or_get_match(req.user_id, req.target_id)
        .await?;

    let mut response = if outcome.created {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };
    Ok(response.json(outcome))
}

/// POST /api/v1/matches/{id}/respond
///
/// Request body: `{"userId": "uuid", "action": "Matched|Rejected"}`
async fn respond_to_match(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<RespondMatchRequest>,
) -> Result<HttpResponse, MatchError> {
    let updated = state
        .matches
        .respond_to_match(path.into_inner(), req.user_id, req.action)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// POST /api/v1/matches/{id}/unmatch
///
/// Request body: `{"userId": "uuid"}`
async fn unmatch(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<UserRequest>,
) -> Result<HttpResponse, MatchError> {
    let updated = state.matches.unmatch(path.into_inner(), req.user_id).await?;
    Ok(HttpResponse::Ok().json(updated))
}
