// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use rtr_messages::config::Config;
use rtr_messages::routes::create_router;
use rtr_messages::services::{
    EnrichmentService, PlaceClient, RouteCatalog, StravaClient, StravaService,
};
use rtr_messages::AppState;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Two scheduled runs; the October one is after dark.
#[allow(dead_code)]
pub const SCHEDULE_CSV: &str = r#"Date,Meeting location,Surface,8k Route,8k Strava link,5k Route,5k Strava link,Distance (km),Elevation (m),Latitude,Longitude
2026-06-04,Radcliffe market,Road,Castle Loop,https://www.strava.com/routes/1,Short Castle,https://www.strava.com/routes/2,8.1,60,53.561,-2.326
2026-10-22,Radcliffe market,"Trail, after dark",Tower Hill,https://www.strava.com/routes/3,,,7.9,120,53.561,-2.326
"#;

/// Authorization code the mock Strava accepts.
#[allow(dead_code)]
pub const GOOD_CODE: &str = "good_code";

/// How the mock Strava answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(dead_code)]
pub enum StravaMode {
    /// Token refresh works and one matching run is listed
    Healthy,
    /// Every token request is rejected with 401
    Revoked,
    /// The activity list returns 429
    RateLimited,
    /// The activity list returns 500
    Broken,
}

#[allow(dead_code)]
pub fn test_catalog() -> RouteCatalog {
    RouteCatalog::load_from_reader(SCHEDULE_CSV.as_bytes()).expect("test schedule should parse")
}

/// Create a test app with every external service unconfigured.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_offline_app(config: Config) -> (Router, Arc<AppState>) {
    let strava_client = config
        .strava_credentials()
        .map(|(id, secret)| StravaClient::new(id.to_string(), secret.to_string()));

    let state = Arc::new(AppState {
        config,
        catalog: test_catalog(),
        enrichment: EnrichmentService::default(),
        strava_client,
    });

    (create_router(state.clone()), state)
}

/// Create a test app backed by a local mock of Strava and LocationIQ.
#[allow(dead_code)]
pub async fn create_test_app(mode: StravaMode) -> (Router, Arc<AppState>) {
    let base = spawn_mock_upstream(mode).await;
    let config = Config::test_default();

    let (id, secret) = config
        .strava_credentials()
        .expect("test config has Strava credentials");
    let client = StravaClient::with_base_urls(
        id.to_string(),
        secret.to_string(),
        &format!("{}/api/v3", base),
        &format!("{}/oauth", base),
    );
    let strava = config
        .strava_refresh_token
        .clone()
        .map(|token| StravaService::new(client.clone(), token));
    let places = config
        .locationiq_api_key
        .clone()
        .map(|key| PlaceClient::with_base_url(key, &format!("{}/v1", base)));

    let state = Arc::new(AppState {
        config,
        catalog: test_catalog(),
        enrichment: EnrichmentService::new(strava, places),
        strava_client: Some(client),
    });

    (create_router(state.clone()), state)
}

/// Serve the mock upstream on an ephemeral port and return its base URL.
async fn spawn_mock_upstream(mode: StravaMode) -> String {
    let app = Router::new()
        .route(
            "/oauth/token",
            post(move |form: Form<HashMap<String, String>>| mock_token(mode, form)),
        )
        .route(
            "/api/v3/athlete/activities",
            get(move || mock_activities(mode)),
        )
        .route("/v1/reverse", get(mock_reverse));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("mock upstream address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}

async fn mock_token(
    mode: StravaMode,
    Form(form): Form<HashMap<String, String>>,
) -> axum::response::Response {
    if mode == StravaMode::Revoked {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Authorization Error"})),
        )
            .into_response();
    }

    let accepted = match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => form.get("code").map(String::as_str) == Some(GOOD_CODE),
        Some("refresh_token") => form.contains_key("refresh_token"),
        _ => false,
    };
    if !accepted {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Bad Request", "errors": [{"field": "code", "code": "invalid"}]})),
        )
            .into_response();
    }

    Json(json!({
        "token_type": "Bearer",
        "access_token": "mock_access_token",
        "refresh_token": "mock_refresh_token",
        "expires_at": chrono::Utc::now().timestamp() + 6 * 3600,
        "expires_in": 21600
    }))
    .into_response()
}

async fn mock_activities(mode: StravaMode) -> axum::response::Response {
    match mode {
        StravaMode::RateLimited => {
            (StatusCode::TOO_MANY_REQUESTS, "Rate Limit Exceeded").into_response()
        }
        StravaMode::Broken => (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response(),
        _ => Json(json!([
            {
                "id": 424242,
                "name": "RTR Castle Loop",
                "sport_type": "Run",
                "start_date": "2026-06-04T18:30:00Z",
                "distance": 8342.0,
                "total_elevation_gain": 71.4,
                "map": {"summary_polyline": "_p~iF~ps|U_ulLnnqC"}
            },
            {
                "id": 7,
                "name": "Commute",
                "sport_type": "Ride",
                "start_date": "2026-06-04T08:00:00Z",
                "distance": 12000.0,
                "total_elevation_gain": 10.0,
                "map": {"summary_polyline": null}
            }
        ]))
        .into_response(),
    }
}

async fn mock_reverse(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let lat: f64 = params.get("lat").and_then(|v| v.parse().ok()).unwrap_or(0.0);
    let road = if lat < 39.0 { "Market Street" } else { "Castle Road" };
    Json(json!({
        "display_name": format!("{}, Radcliffe, Bury", road),
        "address": {"road": road, "town": "Radcliffe"}
    }))
}
