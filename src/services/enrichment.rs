// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort enrichment of a scheduled run with external data.
//!
//! Handles the workflow:
//! 1. Fetch the most recent matching Strava activity
//! 2. Fall back to an uploaded GPX file when Strava has nothing
//! 3. Reverse-geocode sampled route coordinates into place names
//!
//! Nothing here fails the request. Every error is logged and turned into a
//! notice for the page, and the message renders from catalog values alone.

use crate::models::{ActivitySnapshot, Coordinate, Place, RouteRecord};
use crate::services::places::PlaceClient;
use crate::services::strava::StravaService;
use crate::services::trail::{parse_trail, Trail};
use serde::Serialize;

/// Maximum number of coordinates sent to LocationIQ per message.
pub const MAX_PLACE_LOOKUPS: usize = 4;

/// Where the distance/elevation figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentSource {
    Strava,
    Gpx,
}

/// External data for one message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Enrichment {
    pub source: Option<EnrichmentSource>,
    /// Activity the figures came from, when the source is Strava
    pub activity_id: Option<u64>,
    pub distance_km: Option<f64>,
    pub elevation_m: Option<f64>,
    pub places: Vec<Place>,
    /// Non-fatal problems to show the user
    pub notices: Vec<String>,
}

impl Enrichment {
    fn from_activity(activity: &ActivitySnapshot) -> Self {
        Self {
            source: Some(EnrichmentSource::Strava),
            activity_id: Some(activity.id),
            distance_km: Some(activity.distance_km()),
            elevation_m: Some(activity.total_elevation_gain),
            ..Default::default()
        }
    }

    fn from_trail(trail: &Trail) -> Self {
        // A single point has no length; keep the scheduled distance.
        let distance_km = Some(trail.distance_km()).filter(|km| *km > 0.0);

        Self {
            source: Some(EnrichmentSource::Gpx),
            distance_km,
            elevation_m: trail.elevation_gain_m(),
            ..Default::default()
        }
    }
}

/// Orchestrates the Strava and LocationIQ clients. Either may be absent
/// when its configuration is missing.
#[derive(Clone, Default)]
pub struct EnrichmentService {
    strava: Option<StravaService>,
    places: Option<PlaceClient>,
}

impl EnrichmentService {
    pub fn new(strava: Option<StravaService>, places: Option<PlaceClient>) -> Self {
        Self { strava, places }
    }

    pub fn strava(&self) -> Option<&StravaService> {
        self.strava.as_ref()
    }

    /// Enrich a scheduled run. Never fails.
    pub async fn enrich(&self, route: &RouteRecord, trail_file: Option<&[u8]>) -> Enrichment {
        let mut notices = Vec::new();
        let activity = self.fetch_activity(route, &mut notices).await;

        // An uploaded file that yields no points means no places either.
        let mut unusable_upload = false;

        let (mut enrichment, coords) = match &activity {
            Some(activity) => (Enrichment::from_activity(activity), activity_coordinates(activity)),
            None => {
                let trail = trail_file.map(parse_trail).unwrap_or_default();
                if trail_file.is_some() && trail.is_empty() {
                    notices.push("The uploaded GPX file had no usable track points.".to_string());
                    unusable_upload = true;
                }
                if trail.is_empty() {
                    (Enrichment::default(), Vec::new())
                } else {
                    tracing::info!(
                        route = %route.id(),
                        points = trail.points().len(),
                        "Using GPX fallback for enrichment"
                    );
                    (Enrichment::from_trail(&trail), trail.coordinates())
                }
            }
        };

        let coords = if coords.is_empty() && !unusable_upload {
            route.start.into_iter().collect()
        } else {
            coords
        };

        enrichment.places = self.lookup_places(&coords, &mut notices).await;
        enrichment.notices = notices;
        enrichment
    }

    async fn fetch_activity(
        &self,
        route: &RouteRecord,
        notices: &mut Vec<String>,
    ) -> Option<ActivitySnapshot> {
        let strava = self.strava.as_ref()?;

        match strava
            .latest_matching_activity(route.date, &route.route_names())
            .await
        {
            Ok(Some(activity)) => {
                tracing::info!(
                    route = %route.id(),
                    activity_id = activity.id,
                    distance_km = activity.distance_km(),
                    "Matched Strava activity"
                );
                Some(activity)
            }
            Ok(None) => {
                tracing::info!(route = %route.id(), "No matching Strava activity");
                None
            }
            Err(e) => {
                tracing::warn!(route = %route.id(), error = %e, "Strava lookup failed");
                let notice = if e.is_strava_token_error() {
                    "Strava rejected the stored credentials; re-run the admin OAuth flow."
                        .to_string()
                } else if e.is_rate_limited() {
                    "Strava rate limit reached; distance and elevation come from the schedule."
                        .to_string()
                } else {
                    format!("Strava data unavailable: {}", e)
                };
                notices.push(notice);
                None
            }
        }
    }

    async fn lookup_places(&self, coords: &[Coordinate], notices: &mut Vec<String>) -> Vec<Place> {
        let Some(places) = self.places.as_ref() else {
            return Vec::new();
        };
        if coords.is_empty() {
            return Vec::new();
        }

        match places.nearby_places(coords, MAX_PLACE_LOOKUPS).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "Place lookup failed");
                notices.push(format!("Place names unavailable: {}", e));
                Vec::new()
            }
        }
    }
}

/// Decode the activity's summary polyline into coordinates.
fn activity_coordinates(activity: &ActivitySnapshot) -> Vec<Coordinate> {
    let Some(encoded) = activity.summary_polyline.as_deref() else {
        return Vec::new();
    };

    match polyline::decode_polyline(encoded, 5) {
        Ok(line) => line
            .coords()
            .map(|c| Coordinate::new(c.y, c.x))
            .filter(Coordinate::is_valid)
            .collect(),
        Err(e) => {
            tracing::warn!(activity_id = activity.id, error = %e, "Failed to decode polyline");
            Vec::new()
        }
    }
}
