// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod composer;
pub mod enrichment;
pub mod places;
pub mod strava;
pub mod trail;

pub use catalog::RouteCatalog;
pub use composer::{compose, ClubLinks, Message, Platform};
pub use enrichment::{Enrichment, EnrichmentService, EnrichmentSource};
pub use places::PlaceClient;
pub use strava::{StravaClient, StravaService};
