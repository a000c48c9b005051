// HTTP tests for Kindred Match

use actix_web::{http::StatusCode, test, web, App};
use chrono::{Datelike, NaiveDate, Utc};
use kindred_match::core::CompatibilityScorer;
use kindred_match::models::{AgeRange, Coordinates, Gender, Location, Profile};
use kindred_match::routes::{configure_routes, AppState};
use kindred_match::services::{LogNotifier, MatchService, SearchLimits, SearchService};
use kindred_match::store::{MemoryStore, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

fn create_test_profile(age: i32, gender: Gender, interested_in: Gender) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        account_id: Uuid::new_v4(),
        display_name: String::new(),
        date_of_birth: NaiveDate::from_ymd_opt(Utc::now().year() - age, 1, 1).unwrap(),
        gender,
        interested_in,
        preference_age_range: AgeRange { min: 18, max: 60 },
        location: Location {
            coordinates: Some(Coordinates::new(13.405, 52.52)),
            radius_km: 50.0,
        },
        hobbies: vec!["Climbing".to_string()],
        goals: None,
        relationship_status: None,
        smoking: None,
        drinking: None,
        children: None,
        children_desire: None,
        education: None,
        occupation: None,
        created_at: Utc::now(),
    }
}

async fn seeded_state(profiles: &[Profile]) -> AppState {
    let memory = Arc::new(MemoryStore::new());
    for profile in profiles {
        memory.upsert_profile(profile.clone()).await;
    }

    let store: Arc<dyn Store> = memory;
    let scorer = CompatibilityScorer::default();

    AppState {
        search: Arc::new(SearchService::new(
            store.clone(),
            scorer.clone(),
            SearchLimits::default(),
        )),
        matches: Arc::new(MatchService::new(store.clone(), Arc::new(LogNotifier), scorer)),
        store,
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_reports_healthy() {
    let app = app!(seeded_state(&[]).await);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_malformed_json_is_400_with_error_body() {
    let app = app!(seeded_state(&[]).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["statusCode"], 400);
    assert!(body["message"].as_str().unwrap().contains("Invalid JSON"));
}

#[actix_web::test]
async fn test_interaction_created_then_existing() {
    let a = create_test_profile(30, Gender::Male, Gender::Female);
    let b = create_test_profile(28, Gender::Female, Gender::Male);
    let app = app!(seeded_state(&[a.clone(), b.clone()]).await);

    let payload = json!({"userFrom": a.id, "userTo": b.id, "type": "Like"});

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["type"], "Like");

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let existing: Value = test::read_body_json(resp).await;
    assert_eq!(existing["message"], "Interaction already exists");
    assert_eq!(existing["interaction"]["id"], created["id"]);
}

#[actix_web::test]
async fn test_unknown_target_is_404() {
    let a = create_test_profile(30, Gender::Male, Gender::Female);
    let app = app!(seeded_state(&[a.clone()]).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .set_json(json!({"userFrom": a.id, "userTo": Uuid::new_v4(), "type": "Like"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[actix_web::test]
async fn test_search_rejects_underage_range() {
    let a = create_test_profile(30, Gender::Male, Gender::Female);
    let app = app!(seeded_state(&[a.clone()]).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/search/basic")
        .set_json(json!({"userId": a.id, "filters": {"ageRange": {"min": 16, "max": 30}}}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_advanced_search_sentinel_over_http() {
    let a = create_test_profile(30, Gender::Male, Gender::Female);
    let app = app!(seeded_state(&[a.clone()]).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/search/advanced")
        .set_json(json!({"userId": a.id, "filters": {}}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert!(body["message"].is_string());
    assert_eq!(body["results"], json!([]));
}

#[actix_web::test]
async fn test_recommendations_over_http() {
    let a = create_test_profile(30, Gender::Male, Gender::Female);
    let b = create_test_profile(28, Gender::Female, Gender::Male);
    let c = create_test_profile(33, Gender::Female, Gender::Male);
    let app = app!(seeded_state(&[a.clone(), b, c]).await);

    let uri = format!("/api/v1/recommendations?userId={}&page=1&limit=1", a.id);
    let req = test::TestRequest::get().uri(&uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["totalMatches"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert!(body["results"][0]["compatibilityScore"].is_u64());

    let uri = format!("/api/v1/recommendations?userId={}&limit=500", a.id);
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_match_request_respond_flow() {
    let a = create_test_profile(30, Gender::Male, Gender::Female);
    let b = create_test_profile(28, Gender::Female, Gender::Male);
    let app = app!(seeded_state(&[a.clone(), b.clone()]).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches")
        .set_json(json!({"userId": a.id, "targetId": b.id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let outcome: Value = test::read_body_json(resp).await;
    assert_eq!(outcome["match"]["status"], "Pending");
    let match_id = outcome["match"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{}/respond", match_id))
        .set_json(json!({"userId": a.id, "action": "Matched"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{}/respond", match_id))
        .set_json(json!({"userId": b.id, "action": "Matched"}))
        .to_request();
    let accepted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(accepted["status"], "Matched");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/matches?userId={}", b.id))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{}/unmatch", match_id))
        .set_json(json!({"userId": b.id}))
        .to_request();
    let unmatched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(unmatched["status"], "Unmatched");
}

#[actix_web::test]
async fn test_profile_views_and_undo() {
    let a = create_test_profile(30, Gender::Male, Gender::Female);
    let b = create_test_profile(28, Gender::Female, Gender::Male);
    let app = app!(seeded_state(&[a.clone(), b.clone()]).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .set_json(json!({"userFrom": a.id, "userTo": b.id, "type": "View"}))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/profiles/{}/views", b.id))
        .to_request();
    let views: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(views["views"], 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/interactions/last?userId={}", a.id))
        .to_request();
    let undone: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(undone["type"], "View");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/interactions/last?userId={}", a.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
