// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin page authentication.
//!
//! The admin page is gated by a shared password. The Strava callback cannot
//! carry the password, so the authorize step mints an HMAC-signed `state`
//! parameter that the callback verifies instead.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{AppError, Result};

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a signed OAuth state stays valid.
pub const OAUTH_STATE_TTL_MS: i64 = 10 * 60 * 1000;

/// Purpose tag embedded in the signed state.
const STATE_PURPOSE: &str = "admin";

/// Check a submitted password against the configured admin password.
///
/// Returns `NotConfigured` when no password is set (the page stays closed)
/// and `Unauthorized` on a missing or wrong password.
pub fn check_admin_password(config: &Config, candidate: Option<&str>) -> Result<()> {
    let expected = config
        .admin_password
        .as_deref()
        .ok_or_else(|| AppError::NotConfigured("Set ADMIN_PASSWORD to enable the admin page".to_string()))?;

    let candidate = candidate.unwrap_or("");
    if bool::from(candidate.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        tracing::warn!("Rejected admin page request with wrong password");
        Err(AppError::Unauthorized)
    }
}

/// Create a signed OAuth state: base64("admin|timestamp_hex|signature_hex").
pub fn sign_oauth_state(secret: &[u8], now_ms: i64) -> Result<String> {
    let payload = format!("{}|{:x}", STATE_PURPOSE, now_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify a signed OAuth state minted less than [`OAUTH_STATE_TTL_MS`] ago.
pub fn verify_oauth_state(state: &str, secret: &[u8], now_ms: i64) -> bool {
    let Some(decoded) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|b| String::from_utf8(b).ok())
    else {
        return false;
    };

    // Format is "purpose|timestamp_hex|signature_hex"
    let parts: Vec<&str> = decoded.splitn(3, '|').collect();
    let [purpose, timestamp_hex, signature_hex] = parts[..] else {
        return false;
    };
    if purpose != STATE_PURPOSE {
        return false;
    }

    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(format!("{}|{}", purpose, timestamp_hex).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    match i64::from_str_radix(timestamp_hex, 16) {
        Ok(issued) => (0..=OAUTH_STATE_TTL_MS).contains(&(now_ms - issued)),
        Err(_) => false,
    }
}
