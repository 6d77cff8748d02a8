// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route schedule loading.
//!
//! The schedule is a CSV file with a header row. Columns are matched by
//! name, so extra columns are ignored and their order does not matter.

use crate::models::route::DEFAULT_MEETING_LOCATION;
use crate::models::{Coordinate, RouteLink, RouteRecord};
use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// (name column, link column) pairs for the route options.
const ROUTE_COLUMNS: [(&str, &str); 2] = [("8k Route", "8k Strava link"), ("5k Route", "5k Strava link")];

/// Accepted date formats for the `Date` column. `%Y` also accepts a
/// two-digit year, so the short form must be tried first.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%y", "%d/%m/%Y"];

/// In-memory route schedule, loaded once at startup.
#[derive(Debug, Default, Clone)]
pub struct RouteCatalog {
    routes: Vec<RouteRecord>,
}

impl RouteCatalog {
    /// Load the schedule from a CSV file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path.as_ref()).map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_reader(file)
    }

    /// Load the schedule from any CSV source.
    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| CatalogError::ParseError(e.to_string()))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let idx_date = column("Date").ok_or(CatalogError::MissingColumn("Date"))?;
        let idx_location = column("Meeting location").or_else(|| column("Meeting point"));
        let idx_surface = column("Surface").or_else(|| column("Notes"));
        let idx_distance = column("Distance (km)");
        let idx_elevation = column("Elevation (m)");
        let idx_lat = column("Latitude");
        let idx_lon = column("Longitude");
        let idx_routes: Vec<(Option<usize>, Option<usize>)> = ROUTE_COLUMNS
            .iter()
            .map(|(name, url)| (column(name), column(url)))
            .collect();

        let mut routes = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| CatalogError::ParseError(e.to_string()))?;
            let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");
            let number = |idx: Option<usize>| {
                cell(idx).parse::<f64>().ok().filter(|v| v.is_finite())
            };

            let Some(date) = parse_date(cell(Some(idx_date))) else {
                tracing::debug!(row = line + 2, "Skipping schedule row without a valid date");
                continue;
            };

            let distance_km = number(idx_distance).unwrap_or(0.0);
            let elevation_m = number(idx_elevation).unwrap_or(0.0);
            if distance_km < 0.0 || elevation_m < 0.0 {
                tracing::warn!(
                    row = line + 2,
                    %date,
                    distance_km,
                    elevation_m,
                    "Skipping schedule row with negative distance or elevation"
                );
                continue;
            }

            let start = match (number(idx_lat), number(idx_lon)) {
                (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)).filter(Coordinate::is_valid),
                _ => None,
            };

            let links = idx_routes
                .iter()
                .filter_map(|&(name_idx, url_idx)| {
                    let (name, url) = (cell(name_idx), cell(url_idx));
                    (!name.is_empty() && !url.is_empty()).then(|| RouteLink {
                        name: name.to_string(),
                        url: url.to_string(),
                    })
                })
                .collect();

            let location = cell(idx_location);
            routes.push(RouteRecord {
                date,
                meeting_location: if location.is_empty() {
                    DEFAULT_MEETING_LOCATION.to_string()
                } else {
                    location.to_string()
                },
                surface: cell(idx_surface).to_string(),
                routes: links,
                distance_km,
                elevation_m,
                start,
            });
        }

        routes.sort_by_key(|r| r.date);

        tracing::info!(count = routes.len(), "Loaded route schedule");
        Ok(Self { routes })
    }

    /// All scheduled runs, ordered by date.
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Look up a run by its identifier (ISO date) or display label.
    pub fn find(&self, id: &str) -> Option<&RouteRecord> {
        let date = parse_date(id);
        self.routes
            .iter()
            .find(|r| Some(r.date) == date || r.label() == id)
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Spreadsheet exports sometimes append a midnight time.
    let raw = raw.split_whitespace().next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Errors from schedule loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse CSV: {0}")]
    ParseError(String),

    #[error("Schedule is missing required column {0:?}")]
    MissingColumn(&'static str),
}
