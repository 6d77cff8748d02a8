// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for fetching recent run activities.
//!
//! Handles:
//! - Authorization code exchange (admin OAuth flow)
//! - Token refresh when expired
//! - Activity listing for a date window
//! - Rate limit and auth failure classification

use crate::error::AppError;
use crate::models::{ActivitySnapshot, TokenPair};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

const STRAVA_API_URL: &str = "https://www.strava.com/api/v3";
const STRAVA_OAUTH_URL: &str = "https://www.strava.com/oauth";

/// Scope requested on the consent page.
pub const STRAVA_SCOPE: &str = "activity:read_all";

/// Days before the run date searched for a matching activity.
const MATCH_WINDOW_DAYS: i64 = 7;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_base_urls(client_id, client_secret, STRAVA_API_URL, STRAVA_OAUTH_URL)
    }

    /// Create a client against non-default endpoints (used by tests).
    pub fn with_base_urls(
        client_id: String,
        client_secret: String,
        base_url: &str,
        oauth_url: &str,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            oauth_url: oauth_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        }
    }

    /// URL of the Strava consent page for the admin OAuth flow.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}/authorize?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             approval_prompt=force&\
             scope={}&\
             state={}",
            self.oauth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            STRAVA_SCOPE,
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenPair, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token exchange failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// List the athlete's activities started within `[after, before)`.
    pub async fn list_activities(
        &self,
        access_token: &str,
        after: i64,  // Unix timestamp
        before: i64, // Unix timestamp
        per_page: u32,
    ) -> Result<Vec<ActivitySnapshot>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("after", after.to_string()),
                ("before", before.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        let summaries: Vec<StravaActivitySummary> = self.check_response_json(response).await?;
        Ok(summaries.into_iter().map(ActivitySnapshot::from).collect())
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
                return Err(AppError::StravaApi(AppError::RATE_LIMIT.to_string()));
            }

            if status.as_u16() == 401 {
                return Err(AppError::StravaApi(
                    AppError::STRAVA_TOKEN_ERROR.to_string(),
                ));
            }

            return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

/// Summary activity from the list endpoint.
#[derive(Debug, Clone, Deserialize)]
struct StravaActivitySummary {
    id: u64,
    name: String,
    sport_type: String,
    start_date: DateTime<Utc>,
    distance: f64,
    #[serde(default)]
    total_elevation_gain: f64,
    #[serde(default)]
    map: Option<StravaMap>,
}

/// Activity map data with polylines.
#[derive(Debug, Clone, Deserialize)]
struct StravaMap {
    summary_polyline: Option<String>,
}

impl From<StravaActivitySummary> for ActivitySnapshot {
    fn from(a: StravaActivitySummary) -> Self {
        Self {
            id: a.id,
            name: a.name,
            sport_type: a.sport_type,
            start_date: a.start_date,
            distance: a.distance,
            total_elevation_gain: a.total_elevation_gain,
            summary_polyline: a
                .map
                .and_then(|m| m.summary_polyline)
                .filter(|p| !p.is_empty()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaService - High-level service with token management
// ─────────────────────────────────────────────────────────────────────────────

/// Token state shared by all requests: the current refresh token and the
/// cached access token derived from it.
struct TokenState {
    refresh_token: String,
    cached: Option<TokenPair>,
}

/// High-level Strava service that manages the token lifecycle.
///
/// The refresh token comes from configuration. Access tokens are derived on
/// demand and cached until they come within 5 minutes of expiry. The mutex
/// serializes refreshes so concurrent requests trigger at most one.
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    tokens: Arc<Mutex<TokenState>>,
}

impl StravaService {
    pub fn new(client: StravaClient, refresh_token: String) -> Self {
        Self {
            client,
            tokens: Arc::new(Mutex::new(TokenState {
                refresh_token,
                cached: None,
            })),
        }
    }

    pub fn client(&self) -> &StravaClient {
        &self.client
    }

    /// Get a valid (non-expired) access token, refreshing if needed.
    pub async fn get_valid_access_token(&self) -> Result<String, AppError> {
        let mut state = self.tokens.lock().await;

        if let Some(cached) = &state.cached {
            if !cached.needs_refresh(Utc::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        tracing::info!("Access token missing or expired, refreshing");
        let new_tokens = self.client.refresh_token(&state.refresh_token).await?;

        if new_tokens.refresh_token != state.refresh_token {
            // Rotated tokens are kept for this process only.
            tracing::warn!(
                "Strava rotated the refresh token; update STRAVA_REFRESH_TOKEN via the admin page"
            );
            state.refresh_token = new_tokens.refresh_token.clone();
        }

        let access_token = new_tokens.access_token.clone();
        state.cached = Some(new_tokens);
        Ok(access_token)
    }

    /// Drop the cached access token so the next request refreshes it.
    /// The refresh token is kept.
    pub async fn invalidate_access_token(&self) {
        let mut state = self.tokens.lock().await;
        if state.cached.take().is_some() {
            tracing::warn!("Strava rejected the cached access token, dropping it");
        }
    }

    /// Find the most recent run near `date`, preferring activities whose
    /// name mentions one of `route_names`.
    pub async fn latest_matching_activity(
        &self,
        date: NaiveDate,
        route_names: &[&str],
    ) -> Result<Option<ActivitySnapshot>, AppError> {
        let (after, before) = match_window(date);
        let access_token = self.get_valid_access_token().await?;
        let activities = match self
            .client
            .list_activities(&access_token, after, before, 50)
            .await
        {
            Ok(activities) => activities,
            Err(e) => {
                if e.is_strava_token_error() {
                    self.invalidate_access_token().await;
                }
                return Err(e);
            }
        };

        tracing::debug!(%date, fetched = activities.len(), "Listed Strava activities");
        Ok(pick_matching_activity(activities, route_names))
    }
}

/// Unix timestamps bounding the search window for a run date.
fn match_window(date: NaiveDate) -> (i64, i64) {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let after = midnight - Duration::days(MATCH_WINDOW_DAYS);
    let before = midnight + Duration::days(1);
    (after.timestamp(), before.timestamp())
}

/// Keep runs, prefer name matches, then take the latest start.
fn pick_matching_activity(
    activities: Vec<ActivitySnapshot>,
    route_names: &[&str],
) -> Option<ActivitySnapshot> {
    let names: Vec<String> = route_names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();

    let runs: Vec<ActivitySnapshot> = activities.into_iter().filter(|a| a.is_run()).collect();

    let (named, unnamed): (Vec<_>, Vec<_>) = runs.into_iter().partition(|a| {
        let name = a.name.to_lowercase();
        names.iter().any(|n| name.contains(n.as_str()))
    });

    let pool = if named.is_empty() { unnamed } else { named };
    pool.into_iter().max_by_key(|a| a.start_date)
}
