// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered form and preview pages.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::StravaMode;
use rtr_messages::config::Config;
use tower::ServiceExt;

mod common;

const BOUNDARY: &str = "rtr-test-boundary";

const TRACK_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg>
    <trkpt lat="53.5610" lon="-2.3260"><ele>60.0</ele></trkpt>
    <trkpt lat="53.5650" lon="-2.3200"><ele>75.0</ele></trkpt>
    <trkpt lat="53.5700" lon="-2.3150"><ele>70.0</ele></trkpt>
    <trkpt lat="53.5610" lon="-2.3260"><ele>80.0</ele></trkpt>
  </trkseg></trk>
</gpx>"#;

/// Build a multipart body from text fields and an optional GPX upload.
fn multipart_body(fields: &[(&str, &str)], gpx: Option<&str>) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some(gpx) = gpx {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"gpx\"; filename=\"run.gpx\"\r\n\
             Content-Type: application/gpx+xml\r\n\r\n{gpx}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

async fn post_message(config: Config, body: String) -> (StatusCode, String) {
    let (app, _state) = common::create_offline_app(config);
    post_message_to(app, body).await
}

async fn post_message_to(app: Router, body: String) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/message")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn unconfigured() -> Config {
    Config {
        strava_client_id: None,
        strava_client_secret: None,
        strava_refresh_token: None,
        locationiq_api_key: None,
        admin_password: None,
        ..Config::test_default()
    }
}

#[tokio::test]
async fn test_index_lists_runs_and_setup_notices() {
    let (app, _state) = common::create_offline_app(unconfigured());
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("Content-Security-Policy"));

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Thursday 04 June 2026"));
    assert!(html.contains("Thursday 22 October 2026"));
    assert!(html.contains("LOCATIONIQ_API_KEY"));
    assert!(html.contains("STRAVA_CLIENT_ID"));
}

#[tokio::test]
async fn test_preview_uses_uploaded_gpx() {
    let body = multipart_body(
        &[("date", "2026-06-04"), ("platform", "Facebook"), ("shuffle", "0")],
        Some(TRACK_GPX),
    );
    let (status, html) = post_message(unconfigured(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("(from Gpx)"));
    assert!(html.contains("Elevation 25 m"));
    assert!(html.contains("RTR_Thursday_04_June_2026_Facebook.txt"));
}

#[tokio::test]
async fn test_preview_with_unusable_gpx_keeps_schedule_values() {
    let body = multipart_body(&[("date", "2026-06-04")], Some("not a gpx file"));
    let (status, html) = post_message(Config::test_default(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("no usable track points"));
    assert!(html.contains("Distance 8.1 km"));
    assert!(html.contains("(from schedule)"));
}

#[tokio::test]
async fn test_shuffle_advances_counter() {
    let body = multipart_body(
        &[("date", "2026-06-04"), ("shuffle", "4"), ("action", "shuffle")],
        None,
    );
    let (status, html) = post_message(Config::test_default(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("name=\"shuffle\" value=\"5\""));
}

#[tokio::test]
async fn test_unusable_gpx_skips_place_lookup() {
    // Strava has nothing, LocationIQ answers for any coordinate.
    let (app, _state) = common::create_test_app(StravaMode::Broken).await;
    let body = multipart_body(&[("date", "2026-06-04")], Some("not a gpx file"));
    let (status, html) = post_message_to(app, body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("no usable track points"));
    assert!(html.contains("(from schedule)"));
    assert!(!html.contains("Passing:"));
    assert!(!html.contains("Castle Road"));
}

#[tokio::test]
async fn test_preview_unknown_date() {
    let body = multipart_body(&[("date", "1999-01-01")], None);
    let (status, html) = post_message(Config::test_default(), body).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.starts_with("<!doctype html>"));
    assert!(html.contains("No run scheduled for &quot;1999-01-01&quot;"));
    assert!(html.contains("href=\"/\""));
}

#[tokio::test]
async fn test_preview_unknown_platform() {
    let body = multipart_body(&[("date", "2026-06-04"), ("platform", "Fax")], None);
    let (status, html) = post_message(Config::test_default(), body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.starts_with("<!doctype html>"));
    assert!(!html.contains("\"error\""));
}

#[tokio::test]
async fn test_download_previewed_text() {
    let (app, _state) = common::create_offline_app(Config::test_default());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/message/download")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "file_name=RTR_Thursday_04_June_2026_WhatsApp.txt&text=Line+one%0D%0ALine+two",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"RTR_Thursday_04_June_2026_WhatsApp.txt\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"Line one\nLine two");
}
