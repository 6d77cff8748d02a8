// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON API routes.

use crate::error::{AppError, Result};
use crate::models::RouteRecord;
use crate::services::composer::seed_for;
use crate::services::{compose, Message, Platform};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/routes", get(list_routes))
        .route("/api/message", get(get_message))
        .route("/api/message/download", get(download_message))
}

// ─── Generation ──────────────────────────────────────────────

/// Parameters identifying one message.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    /// Run identifier (ISO date) or display label
    pub date: String,
    #[serde(default)]
    pub platform: Option<String>,
    /// Shuffle counter; each increment re-rolls the wording
    #[serde(default)]
    pub shuffle: u32,
}

/// A generated message plus everything the user should know about it.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub date: String,
    pub label: String,
    pub message: Message,
    pub notices: Vec<String>,
}

/// Parse a platform name, defaulting to WhatsApp.
pub(crate) fn parse_platform(raw: Option<&str>) -> Result<Platform> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.parse().map_err(AppError::BadRequest),
        None => Ok(Platform::WhatsApp),
    }
}

pub(crate) fn find_route<'a>(state: &'a AppState, date: &str) -> Result<&'a RouteRecord> {
    state
        .catalog
        .find(date.trim())
        .ok_or_else(|| AppError::NotFound(format!("No run scheduled for {:?}", date)))
}

/// Enrich and compose a message for one run.
///
/// Only an unknown run or platform is an error; enrichment problems come
/// back as notices.
pub(crate) async fn generate(
    state: &AppState,
    route: &RouteRecord,
    platform: Platform,
    shuffle: u32,
    trail_file: Option<&[u8]>,
) -> MessageResponse {
    let enrichment = state.enrichment.enrich(route, trail_file).await;
    let seed = seed_for(route, platform, shuffle);
    let message = compose(route, &enrichment, platform, &seed, &state.club_links());

    tracing::info!(
        route = %route.id(),
        platform = %platform,
        shuffle,
        source = ?message.source,
        places = message.places.len(),
        "Generated message"
    );

    let mut notices = state.config.setup_notices();
    notices.extend(enrichment.notices);

    MessageResponse {
        date: route.id(),
        label: route.label(),
        message,
        notices,
    }
}

// ─── Handlers ────────────────────────────────────────────────

/// List scheduled runs.
async fn list_routes(State(state): State<Arc<AppState>>) -> Json<Vec<RouteRecord>> {
    Json(state.catalog.routes().to_vec())
}

/// Generate a message for a run.
async fn get_message(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MessageQuery>,
) -> Result<Json<MessageResponse>> {
    let platform = parse_platform(params.platform.as_deref())?;
    let route = find_route(&state, &params.date)?;

    Ok(Json(generate(&state, route, platform, params.shuffle, None).await))
}

/// Generate a message and return it as a text file download.
async fn download_message(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MessageQuery>,
) -> Result<Response> {
    let platform = parse_platform(params.platform.as_deref())?;
    let route = find_route(&state, &params.date)?;
    let response = generate(&state, route, platform, params.shuffle, None).await;

    Ok(text_attachment(&response.message.file_name, response.message.text))
}

/// A `text/plain` attachment response.
pub(crate) fn text_attachment(file_name: &str, text: String) -> Response {
    let file_name: String = file_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    let file_name = if file_name.is_empty() {
        "message.txt".to_string()
    } else {
        file_name
    };

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        text,
    )
        .into_response()
}
