// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity snapshot used for message enrichment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distance/elevation of a single Strava activity, fetched per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    /// Strava activity ID
    pub id: u64,
    /// Activity name/title
    pub name: String,
    /// Sport type (Run, TrailRun, Ride, ...)
    pub sport_type: String,
    /// Start date/time
    pub start_date: DateTime<Utc>,
    /// Distance in meters
    pub distance: f64,
    /// Total elevation gain in meters
    pub total_elevation_gain: f64,
    /// Encoded summary polyline (precision 5), if the activity has a map
    #[serde(default)]
    pub summary_polyline: Option<String>,
}

impl ActivitySnapshot {
    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }

    /// Whether this is a running activity.
    pub fn is_run(&self) -> bool {
        matches!(self.sport_type.as_str(), "Run" | "TrailRun" | "VirtualRun")
    }
}
