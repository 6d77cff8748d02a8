// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Message composition.
//!
//! [`compose`] is a pure function of the run, its enrichment, the target
//! platform and a seed string. Each variant slot draws from its own RNG
//! seeded with `SHA-256("{seed}:{slot}")`, so a given seed always renders
//! the same text and the numeric facts never depend on the seed.

use crate::models::{Place, RouteRecord};
use crate::services::enrichment::{Enrichment, EnrichmentSource};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Target platform for the announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    WhatsApp,
    Facebook,
    Instagram,
    Email,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::WhatsApp,
        Platform::Facebook,
        Platform::Instagram,
        Platform::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::WhatsApp => "WhatsApp",
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::Email => "Email",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown platform {:?}", s))
    }
}

// ─── Copy bank ───────────────────────────────────────────────

const INTRO_WHATSAPP: &[&str] = &[
    "Evening crew! Fancy a Thursday run? Here's the plan…",
    "Thursday miles incoming. Here's what's happening…",
    "Hiya! This week's Thursday run…",
];
const INTRO_FACEBOOK: &[&str] = &[
    "Hello runners! Here's what we've got lined up…",
    "Hey team, it's nearly Thursday night run time!",
    "Evening all! Here's the plan for Thursday…",
];
const INTRO_INSTAGRAM: &[&str] = &[
    "Thursday vibes. Let's run.",
    "We run Thursday. You in?",
    "Ready to roll this Thursday?",
];
const INTRO_EMAIL: &[&str] = &[
    "Here are the details for Thursday's run:",
    "This is the plan for Thursday's run:",
    "Thursday run details:",
];

const ROUTES_WHATSAPP: &[&str] = &[
    "📍 *Routes on offer this Thursday:*",
    "🗺️ *Pick your route this week:*",
];
const ROUTES_FACEBOOK: &[&str] = &[
    "📍 Routes on offer this Thursday:",
    "🗺️ Pick your route this week:",
];
const ROUTES_INSTAGRAM: &[&str] = &["Routes tonight:", "Pick your route:"];
const ROUTES_EMAIL: &[&str] = &["Routes available:", "Routes this week:"];

const OUTRO_WHATSAPP: &[&str] = &["Happy running, see you soon!", "👟 See you Thursday!"];
const OUTRO_FACEBOOK: &[&str] = &[
    "Happy running, see you soon!",
    "Bring a mate and say hello. See you there!",
];
const OUTRO_INSTAGRAM: &[&str] = &["See you out there ✌️", "Good vibes only ✨"];
const OUTRO_EMAIL: &[&str] = &["See you Thursday.", "Thanks, and see you soon."];

const SAFETY_LINES: &[&str] = &[
    "If you're able to join us, please bring your lights and wear hi-vis clothing.",
    "Please bring a headtorch and wear hi-vis so we can all be seen.",
    "Pack your lights and pop on some hi-vis for the darker miles, please.",
];

const HASHTAGS: &str = "#RunTogetherRadcliffe #RadcliffeRunners #ThursdayRun";

/// Fixed labels and variant pools for one platform.
struct PlatformCopy {
    intro: &'static [&'static str],
    routes: &'static [&'static str],
    outro: &'static [&'static str],
    meet_label: &'static str,
    time_label: &'static str,
    book_label: &'static str,
    cancel_label: &'static str,
    hashtags: Option<&'static str>,
}

fn platform_copy(platform: Platform) -> PlatformCopy {
    match platform {
        Platform::WhatsApp => PlatformCopy {
            intro: INTRO_WHATSAPP,
            routes: ROUTES_WHATSAPP,
            outro: OUTRO_WHATSAPP,
            meet_label: "📍 *Meeting at:*",
            time_label: "🕖 *We set off at 7:00pm*",
            book_label: "📲 Book now:",
            cancel_label: "❌ Can't make it? Cancel at least 1 hour before:",
            hashtags: None,
        },
        Platform::Facebook => PlatformCopy {
            intro: INTRO_FACEBOOK,
            routes: ROUTES_FACEBOOK,
            outro: OUTRO_FACEBOOK,
            meet_label: "📍 Meeting at:",
            time_label: "🕖 We set off at 7:00pm",
            book_label: "📲 Book now:",
            cancel_label: "❌ Can't make it? Cancel at least 1 hour before:",
            hashtags: None,
        },
        Platform::Instagram => PlatformCopy {
            intro: INTRO_INSTAGRAM,
            routes: ROUTES_INSTAGRAM,
            outro: OUTRO_INSTAGRAM,
            meet_label: "📍 Meeting at:",
            time_label: "🕖 7:00pm start",
            book_label: "Book now:",
            cancel_label: "Can't make it? Cancel at least 1 hour before:",
            hashtags: Some(HASHTAGS),
        },
        Platform::Email => PlatformCopy {
            intro: INTRO_EMAIL,
            routes: ROUTES_EMAIL,
            outro: OUTRO_EMAIL,
            meet_label: "Meeting at:",
            time_label: "We set off at 7:00pm",
            book_label: "Book now:",
            cancel_label: "Can't make it? Cancel at least 1 hour before:",
            hashtags: None,
        },
    }
}

// ─── Composition ─────────────────────────────────────────────

/// Links appended to every message.
#[derive(Debug, Clone)]
pub struct ClubLinks {
    pub booking_url: String,
    pub cancel_url: String,
}

/// A rendered announcement with the facts it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub text: String,
    pub platform: Platform,
    pub seed: String,
    pub distance_km: f64,
    pub elevation_m: f64,
    pub source: Option<EnrichmentSource>,
    pub places: Vec<String>,
    pub file_name: String,
}

/// Seed string for a run/platform/shuffle combination.
pub fn seed_for(route: &RouteRecord, platform: Platform, shuffle: u32) -> String {
    format!("{}|{}#{}", route.label(), platform, shuffle)
}

/// Pick one option, deterministically for a given seed and slot.
fn seeded_choice<'a>(options: &[&'a str], seed: &str, slot: &str) -> &'a str {
    let digest = Sha256::digest(format!("{}:{}", seed, slot).as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let mut rng = StdRng::seed_from_u64(u64::from_le_bytes(bytes));

    options.choose(&mut rng).copied().unwrap_or_default()
}

/// Render the announcement text.
pub fn compose(
    route: &RouteRecord,
    enrichment: &Enrichment,
    platform: Platform,
    seed: &str,
    links: &ClubLinks,
) -> Message {
    let copy = platform_copy(platform);
    let distance_km = enrichment.distance_km.unwrap_or(route.distance_km);
    let elevation_m = enrichment.elevation_m.unwrap_or(route.elevation_m);

    let mut lines: Vec<String> = Vec::new();
    lines.push(seeded_choice(copy.intro, seed, "intro").to_string());
    lines.push(String::new());
    lines.push(format!("{} {}", copy.meet_label, route.meeting_location));
    lines.push(copy.time_label.to_string());
    lines.push(String::new());

    lines.push(seeded_choice(copy.routes, seed, "routes").to_string());
    if route.routes.is_empty() {
        lines.push("• (Routes not found in schedule)".to_string());
    } else {
        for link in &route.routes {
            lines.push(format!("• {}: {}", link.name, link.url));
        }
    }
    lines.push(format!(
        "Distance: {:.1} km · Elevation: {:.0} m",
        distance_km, elevation_m
    ));
    if !enrichment.places.is_empty() {
        lines.push(format!("Passing: {}", place_list(&enrichment.places)));
    }

    if route.is_after_dark() {
        lines.push(String::new());
        lines.push(seeded_choice(SAFETY_LINES, seed, "safety").to_string());
    }

    lines.push(String::new());
    lines.push(format!("{} {}", copy.book_label, links.booking_url));
    lines.push(format!("{} {}", copy.cancel_label, links.cancel_url));
    lines.push(String::new());
    lines.push(seeded_choice(copy.outro, seed, "outro").to_string());
    if let Some(tags) = copy.hashtags {
        lines.push(tags.to_string());
    }

    Message {
        text: lines.join("\n"),
        platform,
        seed: seed.to_string(),
        distance_km,
        elevation_m,
        source: enrichment.source,
        places: enrichment.places.iter().map(|p| p.label.clone()).collect(),
        file_name: format!("RTR_{}_{}.txt", route.label().replace(' ', "_"), platform),
    }
}

fn place_list(places: &[Place]) -> String {
    places
        .iter()
        .map(|p| p.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
