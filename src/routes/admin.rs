// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin page: one-time Strava OAuth flow.
//!
//! The flow moves through three states. With no refresh token configured
//! the page offers the authorization link. Following it leaves the user on
//! Strava's consent page while the exchange is pending. Strava then
//! redirects to `/admin/callback` with a `code`, which is exchanged once for
//! a token pair that the page displays for copying into
//! `STRAVA_REFRESH_TOKEN`.

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{check_admin_password, sign_oauth_state, verify_oauth_state};
use crate::models::TokenPair;
use crate::routes::html::{escape, respond};
use crate::services::StravaClient;
use crate::AppState;

const TITLE: &str = "RTR Admin";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(admin_login).post(admin_page))
        .route("/admin/callback", get(admin_callback))
}

/// What the admin page shows once the password check has passed.
#[derive(Debug)]
pub enum AdminView {
    /// No refresh token configured yet.
    Unauthenticated { authorize_url: String },
    /// A refresh token is configured; re-authorizing is still possible.
    Authorized { authorize_url: String },
    /// The callback code was exchanged; show the pair for manual copy.
    TokenIssued(TokenPair),
}

impl AdminView {
    fn render(&self) -> String {
        match self {
            AdminView::Unauthenticated { authorize_url } => format!(
                "<p>No Strava refresh token is configured, so messages use schedule values only.</p>\
                 <p><a href=\"{}\">Authorize with Strava</a></p>",
                escape(authorize_url)
            ),
            AdminView::Authorized { authorize_url } => format!(
                "<p>A Strava refresh token is configured.</p>\
                 <p>If Strava rejects it, <a href=\"{}\">authorize again</a>.</p>",
                escape(authorize_url)
            ),
            AdminView::TokenIssued(tokens) => format!(
                "<p>Strava authorization succeeded. Copy the refresh token into your host \
                 configuration as <code>STRAVA_REFRESH_TOKEN</code> and restart the service.</p>\
                 <dl><dt>Refresh token</dt><dd><code>{}</code></dd>\
                 <dt>Access token</dt><dd><code>{}</code></dd>\
                 <dt>Access token expires</dt><dd>{}</dd></dl>",
                escape(&tokens.refresh_token),
                escape(&tokens.access_token),
                tokens.expires_at_utc().to_rfc3339()
            ),
        }
    }
}

fn password_form() -> &'static str {
    "<form method=\"post\" action=\"/admin\">\
     <label for=\"password\">Admin password</label>\
     <input id=\"password\" name=\"password\" type=\"password\" autocomplete=\"current-password\">\
     <p><button type=\"submit\">Continue</button></p></form>"
}

/// Render an error as an admin page that reveals nothing.
fn error_page(err: AppError) -> Response {
    match err {
        AppError::Unauthorized => respond(
            StatusCode::UNAUTHORIZED,
            TITLE,
            &format!("<p>Incorrect or missing password.</p>{}", password_form()),
        ),
        AppError::NotConfigured(msg) => respond(
            StatusCode::SERVICE_UNAVAILABLE,
            TITLE,
            &format!("<p class=\"notice\">{}</p>", escape(&msg)),
        ),
        AppError::BadRequest(msg) => respond(
            StatusCode::BAD_REQUEST,
            TITLE,
            &format!("<p>{}</p><p><a href=\"/admin\">Back</a></p>", escape(&msg)),
        ),
        AppError::StravaApi(msg) => {
            tracing::warn!(error = %msg, "Strava token exchange failed");
            respond(
                StatusCode::BAD_GATEWAY,
                TITLE,
                &format!(
                    "<p>Strava token exchange failed: {}</p><p><a href=\"/admin\">Start again</a></p>",
                    escape(&msg)
                ),
            )
        }
        other => other.into_response(),
    }
}

fn strava_client(state: &AppState) -> Result<&StravaClient> {
    state.strava_client.as_ref().ok_or_else(|| {
        AppError::NotConfigured(
            "Set STRAVA_CLIENT_ID and STRAVA_CLIENT_SECRET to enable Strava authorization"
                .to_string(),
        )
    })
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Password form.
async fn admin_login(State(state): State<Arc<AppState>>) -> Response {
    match state.config.admin_password {
        Some(_) => respond(StatusCode::OK, TITLE, password_form()),
        None => error_page(AppError::NotConfigured(
            "Set ADMIN_PASSWORD to enable the admin page".to_string(),
        )),
    }
}

#[derive(Deserialize)]
pub struct AdminForm {
    #[serde(default)]
    password: String,
}

/// Password-gated status page with the authorization link.
async fn admin_page(State(state): State<Arc<AppState>>, Form(form): Form<AdminForm>) -> Response {
    match admin_view(&state, &form.password) {
        Ok(view) => respond(StatusCode::OK, TITLE, &view.render()),
        Err(e) => error_page(e),
    }
}

fn admin_view(state: &AppState, password: &str) -> Result<AdminView> {
    check_admin_password(&state.config, Some(password))?;
    let client = strava_client(state)?;

    let secret = state.config.admin_password.as_deref().unwrap_or_default();
    let oauth_state = sign_oauth_state(secret.as_bytes(), now_ms())?;
    let authorize_url = client.authorize_url(&state.config.oauth_callback_url(), &oauth_state);

    tracing::info!("Admin page opened");

    Ok(if state.config.strava_refresh_token.is_some() {
        AdminView::Authorized { authorize_url }
    } else {
        AdminView::Unauthenticated { authorize_url }
    })
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange the code once and display the token pair.
async fn admin_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match handle_callback(&state, params).await {
        Ok(view) => respond(StatusCode::OK, TITLE, &view.render()),
        Err(e) => error_page(e),
    }
}

async fn handle_callback(state: &AppState, params: CallbackParams) -> Result<AdminView> {
    let secret = state.config.admin_password.as_deref().ok_or_else(|| {
        AppError::NotConfigured("Set ADMIN_PASSWORD to enable the admin page".to_string())
    })?;

    // The signed state stands in for the password on the redirect back.
    let state_ok = params
        .state
        .as_deref()
        .is_some_and(|s| verify_oauth_state(s, secret.as_bytes(), now_ms()));
    if !state_ok {
        tracing::warn!("Rejected OAuth callback with missing or invalid state");
        return Err(AppError::Unauthorized);
    }

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return Err(AppError::BadRequest(format!(
            "Strava authorization was not granted ({})",
            error
        )));
    }

    let code = params
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");
    let tokens = strava_client(state)?.exchange_code(code.trim()).await?;
    tracing::info!(
        expires_at = %tokens.expires_at_utc().to_rfc3339(),
        "Strava authorization complete; refresh token ready to copy"
    );

    Ok(AdminView::TokenIssued(tokens))
}
