// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTML form and preview pages.

use crate::error::{AppError, Result};
use crate::routes::api::{find_route, generate, parse_platform, text_attachment, MessageResponse};
use crate::routes::html::{escape, notices, page, respond};
use crate::services::Platform;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Form, Multipart, State},
    http::StatusCode,
    response::{Html, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

const TITLE: &str = "RTR Message Generator";

/// Largest accepted upload (GPX files from watches can be a few MB).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route(
            "/message",
            post(preview).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/message/download", post(download))
}

/// Form page: pick a run and a platform, optionally upload a GPX file.
async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut body = notices(&state.config.setup_notices());

    if state.catalog.is_empty() {
        body.push_str("<p>No runs found in the route schedule.</p>");
        return Html(page(TITLE, &body));
    }

    let first = state.catalog.routes()[0].id();
    body.push_str(&message_form(&state, &first, Platform::WhatsApp, 0, "Generate message"));
    Html(page(TITLE, &body))
}

/// Fields posted by the message form.
#[derive(Debug, Default)]
struct MessageForm {
    date: String,
    platform: Option<String>,
    shuffle: u32,
    /// Set by the "Shuffle wording" button
    reshuffle: bool,
    gpx: Option<Vec<u8>>,
}

async fn read_message_form(mut multipart: Multipart) -> Result<MessageForm> {
    let mut form = MessageForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "gpx" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
                if !bytes.is_empty() {
                    form.gpx = Some(bytes.to_vec());
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid form field: {}", e)))?;
                match name.as_str() {
                    "date" => form.date = value,
                    "platform" => form.platform = Some(value),
                    "shuffle" => form.shuffle = value.trim().parse().unwrap_or(0),
                    "action" => form.reshuffle = value == "shuffle",
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

/// Render the preview for a submitted form.
async fn preview(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match render_preview(&state, multipart).await {
        Ok(body) => respond(StatusCode::OK, TITLE, &body),
        Err(err) => error_page(err),
    }
}

async fn render_preview(state: &AppState, multipart: Multipart) -> Result<String> {
    let form = read_message_form(multipart).await?;
    let platform = parse_platform(form.platform.as_deref())?;
    let route = find_route(state, &form.date)?;
    let shuffle = if form.reshuffle {
        form.shuffle.wrapping_add(1)
    } else {
        form.shuffle
    };

    let response = generate(state, route, platform, shuffle, form.gpx.as_deref()).await;
    Ok(preview_body(state, &response, platform, shuffle))
}

/// Form errors shown as a page with a way back to the form.
fn error_page(err: AppError) -> Response {
    let status = err.status();
    let message = match &err {
        AppError::NotFound(msg) | AppError::BadRequest(msg) => msg.clone(),
        _ => {
            tracing::error!(error = %err, "Failed to render message preview");
            "Something went wrong while generating the message.".to_string()
        }
    };
    respond(
        status,
        TITLE,
        &format!("<p>{}</p><p><a href=\"/\">Back</a></p>", escape(&message)),
    )
}

fn preview_body(
    state: &AppState,
    response: &MessageResponse,
    platform: Platform,
    shuffle: u32,
) -> String {
    let message = &response.message;
    let mut body = notices(&response.notices);

    body.push_str(&format!(
        "<h2>{} · {}</h2>",
        escape(&response.label),
        escape(platform.as_str())
    ));
    body.push_str(&format!(
        "<textarea readonly rows=\"22\">{}</textarea>",
        escape(&message.text)
    ));

    let source = match message.source {
        Some(source) => format!("{:?}", source),
        None => "schedule".to_string(),
    };
    body.push_str(&format!(
        "<p>Distance {:.1} km · Elevation {:.0} m (from {})</p>",
        message.distance_km,
        message.elevation_m,
        escape(&source)
    ));

    body.push_str(&format!(
        "<form method=\"post\" action=\"/message/download\">\
         <input type=\"hidden\" name=\"file_name\" value=\"{}\">\
         <input type=\"hidden\" name=\"text\" value=\"{}\">\
         <button type=\"submit\">Download message as .txt</button></form>",
        escape(&message.file_name),
        escape(&message.text)
    ));

    body.push_str(&message_form(state, &response.date, platform, shuffle, "Regenerate"));
    body
}

/// The run/platform/upload form, carrying the shuffle counter forward.
fn message_form(
    state: &AppState,
    selected_date: &str,
    selected_platform: Platform,
    shuffle: u32,
    submit_label: &str,
) -> String {
    let dates: String = state
        .catalog
        .routes()
        .iter()
        .map(|r| {
            let id = r.id();
            format!(
                "<option value=\"{}\"{}>{}</option>",
                escape(&id),
                if id == selected_date { " selected" } else { "" },
                escape(&r.label())
            )
        })
        .collect();

    let platforms: String = Platform::ALL
        .iter()
        .map(|p| {
            format!(
                "<option value=\"{0}\"{1}>{0}</option>",
                p.as_str(),
                if *p == selected_platform { " selected" } else { "" }
            )
        })
        .collect();

    format!(
        "<form method=\"post\" action=\"/message\" enctype=\"multipart/form-data\">\
         <label for=\"date\">Choose a date</label><select id=\"date\" name=\"date\">{dates}</select>\
         <label for=\"platform\">Platform</label><select id=\"platform\" name=\"platform\">{platforms}</select>\
         <label for=\"gpx\">GPX file (used when Strava has no activity)</label>\
         <input id=\"gpx\" name=\"gpx\" type=\"file\" accept=\".gpx,application/gpx+xml\">\
         <input type=\"hidden\" name=\"shuffle\" value=\"{shuffle}\">\
         <p><button type=\"submit\" name=\"action\" value=\"generate\">{label}</button> \
         <button type=\"submit\" name=\"action\" value=\"shuffle\">🔀 Shuffle wording</button></p>\
         </form>",
        label = escape(submit_label),
    )
}

#[derive(Debug, Deserialize)]
struct DownloadForm {
    file_name: String,
    text: String,
}

/// Download the previewed text exactly as rendered.
async fn download(Form(form): Form<DownloadForm>) -> Response {
    // Browsers submit line breaks as CRLF.
    text_attachment(&form.file_name, form.text.replace("\r\n", "\n"))
}
