// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! RTR Messages: announcement text for the weekly club run
//!
//! This crate provides a small web service that turns the route schedule
//! into WhatsApp/Facebook/Instagram/Email copy, enriched with Strava
//! distance/elevation and LocationIQ place names.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{ClubLinks, EnrichmentService, RouteCatalog, StravaClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub catalog: RouteCatalog,
    pub enrichment: EnrichmentService,
    /// Strava client for the admin OAuth flow (present when credentials are set)
    pub strava_client: Option<StravaClient>,
}

impl AppState {
    /// Links appended to every message.
    pub fn club_links(&self) -> ClubLinks {
        ClubLinks {
            booking_url: self.config.booking_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
        }
    }
}
