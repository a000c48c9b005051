use actix_web::{web, HttpResponse};
use validator::Validate;

use super::AppState;
use crate::error::MatchError;
use crate::models::{RecommendationQuery, SearchRequest};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/search/basic", web::post().to(basic_search))
        .route("/search/advanced", web::post().to(advanced_search))
        .route("/recommendations", web::get().to(recommendations));
}

/// POST /api/v1/search/basic
///
/// Request body:
/// ```json
/// {
///   "userId": "uuid",
///   "filters": { "ageRange": {"min": 25, "max": 35}, "gender": "Female", "radius": 30 }
/// }
/// ```
async fn basic_search(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse, MatchError> {
    req.validate()?;
    let results = state.search.basic_search(req.user_id, &req.filters).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// POST /api/v1/search/advanced
///
/// Same body as basic search. An empty result is `{message, results: []}`.
async fn advanced_search(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse, MatchError> {
    req.validate()?;
    let response = state.search.advanced_search(req.user_id, &req.filters).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/recommendations?userId={id}&page=1&limit=10
async fn recommendations(
    state: web::Data<AppState>,
    query: web::Query<RecommendationQuery>,
) -> Result<HttpResponse, MatchError> {
    query.validate()?;

    let max = state.search.limits().max_page_size;
    if query.limit.is_some_and(|limit| limit > max) {
        return Err(MatchError::InvalidInput(format!(
            "limit must be between 1 and {}",
            max
        )));
    }

    let response = state
        .search
        .recommendations(query.user_id, query.page, query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}
