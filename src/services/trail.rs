// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPX trail parsing, used when Strava has no matching activity.
//!
//! Parsing never fails: a file that does not parse as GPX yields an empty
//! trail, which in turn yields no places and no distance.

use crate::models::Coordinate;
use geo::{Distance, Haversine, Point};
use std::io::Cursor;

/// A single trail point with optional elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub coordinate: Coordinate,
    pub elevation: Option<f64>,
}

/// Ordered coordinate sequence extracted from a GPX file.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    points: Vec<TrailPoint>,
}

impl Trail {
    pub fn from_points(points: Vec<TrailPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[TrailPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.points.iter().map(|p| p.coordinate).collect()
    }

    /// Great-circle length of the trail in kilometres.
    pub fn distance_km(&self) -> f64 {
        let metres: f64 = self
            .points
            .windows(2)
            .map(|w| {
                let a = Point::new(w[0].coordinate.lon, w[0].coordinate.lat);
                let b = Point::new(w[1].coordinate.lon, w[1].coordinate.lat);
                Haversine.distance(a, b)
            })
            .sum();
        metres / 1000.0
    }

    /// Sum of positive elevation deltas, or `None` if the file has no elevations.
    pub fn elevation_gain_m(&self) -> Option<f64> {
        let elevations: Vec<f64> = self.points.iter().filter_map(|p| p.elevation).collect();
        if elevations.is_empty() {
            return None;
        }

        Some(
            elevations
                .windows(2)
                .map(|w| (w[1] - w[0]).max(0.0))
                .sum(),
        )
    }
}

/// Parse an uploaded GPX file into a trail.
///
/// Track points are used in file order; files with no tracks fall back to
/// their route points.
pub fn parse_trail(bytes: &[u8]) -> Trail {
    if bytes.is_empty() {
        return Trail::default();
    }

    let gpx = match ::gpx::read(Cursor::new(bytes)) {
        Ok(gpx) => gpx,
        Err(e) => {
            tracing::warn!(error = %e, "Uploaded trail file is not valid GPX, ignoring");
            return Trail::default();
        }
    };

    let to_point = |wpt: &::gpx::Waypoint| {
        let p = wpt.point();
        TrailPoint {
            coordinate: Coordinate::new(p.y(), p.x()),
            elevation: wpt.elevation,
        }
    };

    let mut points: Vec<TrailPoint> = gpx
        .tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .flat_map(|s| s.points.iter())
        .map(to_point)
        .collect();

    if points.is_empty() {
        points = gpx
            .routes
            .iter()
            .flat_map(|r| r.points.iter())
            .map(to_point)
            .collect();
    }

    points.retain(|p| p.coordinate.is_valid());

    tracing::debug!(points = points.len(), "Parsed trail file");
    Trail { points }
}

/// Pick up to `n` evenly spaced coordinates, always keeping the first and last.
pub fn sample_coordinates(coords: &[Coordinate], n: usize) -> Vec<Coordinate> {
    if coords.len() <= n {
        return coords.to_vec();
    }
    match n {
        0 => Vec::new(),
        1 => vec![coords[0]],
        _ => {
            let last = coords.len() - 1;
            (0..n).map(|i| coords[i * last / (n - 1)]).collect()
        }
    }
}
