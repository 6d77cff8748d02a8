// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Every secret is optional. A missing secret disables only the feature
//! that needs it and is reported through [`Config::setup_notices`].

use std::env;

/// Default location of the route schedule.
pub const DEFAULT_SCHEDULE_PATH: &str = "data/route_schedule.csv";

const DEFAULT_BOOKING_URL: &str = "https://groups.runtogether.co.uk/RunTogetherRadcliffe/Runs";
const DEFAULT_CANCEL_URL: &str = "https://groups.runtogether.co.uk/My/BookedRuns";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Strava OAuth client ID (public)
    pub strava_client_id: Option<String>,
    /// Path to the CSV route schedule
    pub schedule_path: String,
    /// Externally visible base URL, used for the OAuth callback
    pub public_url: String,
    /// Booking link included in every message
    pub booking_url: String,
    /// Cancellation link included in every message
    pub cancel_url: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Strava OAuth client secret
    pub strava_client_secret: Option<String>,
    /// Pre-provisioned Strava refresh token (obtained via the admin page)
    pub strava_refresh_token: Option<String>,
    /// LocationIQ API key
    pub locationiq_api_key: Option<String>,
    /// Shared secret gating the admin page
    pub admin_password: Option<String>,
}

impl Config {
    /// Config for tests: every feature configured, nothing reachable.
    pub fn test_default() -> Self {
        Self {
            strava_client_id: Some("test_client_id".to_string()),
            schedule_path: DEFAULT_SCHEDULE_PATH.to_string(),
            public_url: "http://localhost:8080".to_string(),
            booking_url: DEFAULT_BOOKING_URL.to_string(),
            cancel_url: DEFAULT_CANCEL_URL.to_string(),
            port: 8080,
            strava_client_secret: Some("test_secret".to_string()),
            strava_refresh_token: Some("test_refresh_token".to_string()),
            locationiq_api_key: Some("test_locationiq_key".to_string()),
            admin_password: Some("test_admin_password".to_string()),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };

        Ok(Self {
            strava_client_id: secret("STRAVA_CLIENT_ID"),
            schedule_path: env::var("SCHEDULE_PATH")
                .unwrap_or_else(|_| DEFAULT_SCHEDULE_PATH.to_string()),
            public_url: env::var("PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            booking_url: env::var("BOOKING_URL")
                .unwrap_or_else(|_| DEFAULT_BOOKING_URL.to_string()),
            cancel_url: env::var("CANCEL_URL").unwrap_or_else(|_| DEFAULT_CANCEL_URL.to_string()),
            port,

            strava_client_secret: secret("STRAVA_CLIENT_SECRET"),
            strava_refresh_token: secret("STRAVA_REFRESH_TOKEN"),
            locationiq_api_key: secret("LOCATIONIQ_API_KEY"),
            admin_password: secret("ADMIN_PASSWORD"),
        })
    }

    /// Strava client credentials, if both halves are present.
    pub fn strava_credentials(&self) -> Option<(&str, &str)> {
        match (&self.strava_client_id, &self.strava_client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }

    /// URL Strava redirects back to after the consent page.
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/admin/callback", self.public_url)
    }

    /// Setup instructions for every feature disabled by missing config.
    pub fn setup_notices(&self) -> Vec<String> {
        let mut notices = Vec::new();

        if self.strava_credentials().is_none() {
            notices.push(
                "Strava enrichment disabled: set STRAVA_CLIENT_ID and STRAVA_CLIENT_SECRET."
                    .to_string(),
            );
        } else if self.strava_refresh_token.is_none() {
            notices.push(
                "Strava enrichment disabled: run the /admin OAuth flow and set STRAVA_REFRESH_TOKEN."
                    .to_string(),
            );
        }
        if self.locationiq_api_key.is_none() {
            notices.push("Place names disabled: set LOCATIONIQ_API_KEY.".to_string());
        }
        if self.admin_password.is_none() {
            notices.push("Admin page disabled: set ADMIN_PASSWORD.".to_string());
        }

        notices
    }
}

/// Read an optional secret, treating blank values as absent.
fn secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
