// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Message generation through the HTTP API, against a mocked Strava and
//! LocationIQ.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::StravaMode;
use serde_json::Value;
use tower::ServiceExt;

mod common;

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_strava_enrichment_appears_in_message() {
    let (app, _state) = common::create_test_app(StravaMode::Healthy).await;

    let (status, json) = get_json(app, "/api/message?date=2026-06-04&platform=whatsapp").await;
    assert_eq!(status, StatusCode::OK);

    let message = &json["message"];
    assert_eq!(message["source"], "strava");
    assert_eq!(message["distance_km"], 8.342);
    assert_eq!(message["places"][0], "Market Street");
    assert_eq!(message["places"][1], "Castle Road");

    let text = message["text"].as_str().unwrap();
    assert!(text.contains("Distance: 8.3 km · Elevation: 71 m"));
    assert!(text.contains("Passing: Market Street, Castle Road"));
    assert!(text.contains("• Castle Loop: https://www.strava.com/routes/1"));
    assert!(text.contains("• Short Castle: https://www.strava.com/routes/2"));
    assert!(json["notices"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_strava_failures_fall_back_to_schedule() {
    for mode in [StravaMode::Revoked, StravaMode::RateLimited, StravaMode::Broken] {
        let (app, _state) = common::create_test_app(mode).await;

        let (status, json) = get_json(app, "/api/message?date=2026-06-04").await;
        assert_eq!(status, StatusCode::OK, "{:?}", mode);

        let message = &json["message"];
        assert!(message["source"].is_null(), "{:?}", mode);
        assert_eq!(message["distance_km"], 8.1);
        assert!(message["text"]
            .as_str()
            .unwrap()
            .contains("Distance: 8.1 km · Elevation: 60 m"));

        // Places still come from the schedule's start coordinate
        assert_eq!(message["places"][0], "Castle Road");

        let notices = json["notices"].as_array().unwrap();
        assert_eq!(notices.len(), 1, "{:?}", mode);
        let notice = notices[0].as_str().unwrap();
        match mode {
            StravaMode::Revoked => assert!(notice.contains("admin")),
            StravaMode::RateLimited => assert!(notice.contains("rate limit")),
            _ => assert!(notice.contains("Strava data unavailable")),
        }
    }
}

#[tokio::test]
async fn test_same_inputs_give_same_text() {
    let (app, _state) = common::create_test_app(StravaMode::Healthy).await;

    let uri = "/api/message?date=2026-10-22&platform=facebook&shuffle=3";
    let (_, first) = get_json(app.clone(), uri).await;
    let (_, second) = get_json(app, uri).await;

    assert_eq!(first["message"]["text"], second["message"]["text"]);
    assert_eq!(first["message"]["seed"], second["message"]["seed"]);
}

#[tokio::test]
async fn test_after_dark_run_includes_safety_line() {
    let (app, _state) = common::create_offline_app(rtr_messages::config::Config::test_default());

    let (_, dark) = get_json(app.clone(), "/api/message?date=2026-10-22").await;
    let (_, light) = get_json(app, "/api/message?date=2026-06-04").await;

    assert!(dark["message"]["text"].as_str().unwrap().contains("hi-vis"));
    assert!(!light["message"]["text"].as_str().unwrap().contains("hi-vis"));
}

#[tokio::test]
async fn test_hashtags_only_on_instagram() {
    let (app, _state) = common::create_offline_app(rtr_messages::config::Config::test_default());

    for platform in ["whatsapp", "facebook", "instagram", "email"] {
        let (status, json) =
            get_json(app.clone(), &format!("/api/message?date=2026-06-04&platform={}", platform))
                .await;
        assert_eq!(status, StatusCode::OK);

        let text = json["message"]["text"].as_str().unwrap();
        assert_eq!(text.contains('#'), platform == "instagram", "{}", platform);
        assert!(text.contains("groups.runtogether.co.uk"));
    }
}

#[tokio::test]
async fn test_single_route_option_listed() {
    let (app, _state) = common::create_offline_app(rtr_messages::config::Config::test_default());
    let (_, json) = get_json(app, "/api/message?date=2026-10-22").await;

    let text = json["message"]["text"].as_str().unwrap();
    assert!(text.contains("• Tower Hill: https://www.strava.com/routes/3"));
    assert!(!text.contains("(Routes not found in schedule)"));
}

#[tokio::test]
async fn test_unknown_date_is_not_found() {
    let (app, _state) = common::create_offline_app(rtr_messages::config::Config::test_default());
    let (status, json) = get_json(app, "/api/message?date=2026-01-01").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_unknown_platform_is_bad_request() {
    let (app, _state) = common::create_offline_app(rtr_messages::config::Config::test_default());
    let (status, json) = get_json(app, "/api/message?date=2026-06-04&platform=fax").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_lookup_by_label() {
    let (app, _state) = common::create_offline_app(rtr_messages::config::Config::test_default());
    let (status, json) =
        get_json(app, "/api/message?date=Thursday%2004%20June%202026").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["date"], "2026-06-04");
}

#[tokio::test]
async fn test_list_routes() {
    let (app, _state) = common::create_offline_app(rtr_messages::config::Config::test_default());
    let (status, json) = get_json(app, "/api/routes").await;

    assert_eq!(status, StatusCode::OK);
    let routes = json.as_array().unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0]["date"], "2026-06-04");
    assert_eq!(routes[1]["surface"], "Trail, after dark");
}

#[tokio::test]
async fn test_download_as_text_file() {
    let (app, _state) = common::create_offline_app(rtr_messages::config::Config::test_default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/message/download?date=2026-06-04&platform=email")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"RTR_Thursday_04_June_2026_Email.txt\""
    );
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_health() {
    let (app, _state) = common::create_offline_app(rtr_messages::config::Config::test_default());
    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}
