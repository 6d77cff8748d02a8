// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LocationIQ reverse-geocoding client.

use crate::error::AppError;
use crate::models::{Coordinate, Place};
use crate::services::trail::sample_coordinates;
use serde::Deserialize;

const LOCATIONIQ_URL: &str = "https://us1.locationiq.com/v1";

/// LocationIQ API client.
#[derive(Clone)]
pub struct PlaceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PlaceClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, LOCATIONIQ_URL)
    }

    /// Create a client against a non-default endpoint (used by tests).
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Reverse-geocode a single coordinate.
    ///
    /// Returns `Ok(None)` when LocationIQ finds nothing with a usable label.
    pub async fn reverse(&self, coord: Coordinate) -> Result<Option<Place>, AppError> {
        let url = format!("{}/reverse", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.clone()),
                ("lat", coord.lat.to_string()),
                ("lon", coord.lon.to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Geocoding(e.to_string()))?;

        let status = response.status();
        // "Unable to geocode" comes back as 404
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if status.as_u16() == 429 {
            tracing::warn!("LocationIQ rate limit hit (429)");
            return Err(AppError::Geocoding(AppError::RATE_LIMIT.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Geocoding(format!("HTTP {}: {}", status, body)));
        }

        let result: ReverseResponse = response
            .json()
            .await
            .map_err(|e| AppError::Geocoding(format!("JSON parse error: {}", e)))?;

        Ok(result.label().map(|label| Place {
            label,
            coordinate: coord,
        }))
    }

    /// Names of places along a route, in route order without duplicates.
    ///
    /// Looks up at most `max` evenly spaced coordinates. The first failed
    /// request aborts the lookup.
    pub async fn nearby_places(
        &self,
        coords: &[Coordinate],
        max: usize,
    ) -> Result<Vec<Place>, AppError> {
        let mut places: Vec<Place> = Vec::new();

        for coord in sample_coordinates(coords, max) {
            if let Some(place) = self.reverse(coord).await? {
                let seen = places
                    .iter()
                    .any(|p| p.label.eq_ignore_ascii_case(&place.label));
                if !seen {
                    places.push(place);
                }
            }
        }

        Ok(places)
    }
}

/// Subset of the LocationIQ reverse response we use.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    road: Option<String>,
    neighbourhood: Option<String>,
    suburb: Option<String>,
    village: Option<String>,
    town: Option<String>,
}

impl ReverseResponse {
    /// Most specific short label available.
    fn label(&self) -> Option<String> {
        let from_address = self.address.as_ref().and_then(|a| {
            [&a.road, &a.neighbourhood, &a.suburb, &a.village, &a.town]
                .into_iter()
                .flatten()
                .map(|s| s.trim())
                .find(|s| !s.is_empty())
                .map(str::to_string)
        });

        from_address.or_else(|| {
            self.display_name
                .as_deref()
                .and_then(|d| d.split(',').next())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
    }
}
