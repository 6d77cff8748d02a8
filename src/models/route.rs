// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Scheduled run model, one per row of the route schedule.

use crate::models::Coordinate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Meeting point used when the schedule leaves it blank.
pub const DEFAULT_MEETING_LOCATION: &str = "Radcliffe market";

/// A named route option with its link (usually a Strava route).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLink {
    /// Route name (e.g. "Castle loop")
    pub name: String,
    pub url: String,
}

/// A scheduled run from the route schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecord {
    /// Run date
    pub date: NaiveDate,
    /// Meeting point
    pub meeting_location: String,
    /// Surface/notes column (e.g. "Road, after dark")
    pub surface: String,
    /// Route options on offer, in schedule order
    pub routes: Vec<RouteLink>,
    /// Nominal distance in kilometres
    pub distance_km: f64,
    /// Nominal elevation gain in metres
    pub elevation_m: f64,
    /// Starting coordinate, if the schedule lists one
    pub start: Option<Coordinate>,
}

impl RouteRecord {
    /// Route identifier used by the HTTP API (ISO date).
    pub fn id(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Human-readable date, e.g. "Thursday 23 October 2026".
    pub fn label(&self) -> String {
        self.date.format("%A %d %B %Y").to_string()
    }

    /// Whether the run happens in the dark and needs the lights reminder.
    pub fn is_after_dark(&self) -> bool {
        self.surface.to_lowercase().contains("after dark")
    }

    /// Names of the route options, for matching Strava activities.
    pub fn route_names(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(surface: &str) -> RouteRecord {
        RouteRecord {
            date: NaiveDate::from_ymd_opt(2026, 10, 22).unwrap(),
            meeting_location: DEFAULT_MEETING_LOCATION.to_string(),
            surface: surface.to_string(),
            routes: vec![],
            distance_km: 8.0,
            elevation_m: 60.0,
            start: None,
        }
    }

    #[test]
    fn test_label_and_id() {
        let r = record("");
        assert_eq!(r.id(), "2026-10-22");
        assert_eq!(r.label(), "Thursday 22 October 2026");
    }

    #[test]
    fn test_after_dark_is_case_insensitive() {
        assert!(record("Road, After Dark").is_after_dark());
        assert!(!record("Trail").is_after_dark());
    }
}
