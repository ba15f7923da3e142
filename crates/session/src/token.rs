// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiry oracle: offline inspection of JWT-shaped access tokens.
//!
//! Only the `exp` claim of the payload segment is read. The signature is never
//! checked; the server remains the authority on validity. Anything that cannot
//! be decoded is reported as expired.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};

/// Whether `token` is expired (or undecodable) right now.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, epoch_ms())
}

/// Whether `token` is expired (or undecodable) at `now_ms`.
pub fn is_expired_at(token: &str, now_ms: u64) -> bool {
    match expires_at_ms(token) {
        Some(exp_ms) => i128::from(now_ms) > i128::from(exp_ms),
        None => true,
    }
}

/// Expiry of `token` in epoch milliseconds, or `None` if it is malformed.
pub fn expires_at_ms(token: &str) -> Option<i64> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return None;
    };

    let bytes = decode_segment(payload)?;
    // Only a JSON object with a numeric `exp` counts; arrays and scalars don't.
    let claims: Map<String, Value> = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_f64()?;
    if !exp.is_finite() {
        return None;
    }
    Some((exp * 1000.0) as i64)
}

/// Seconds until `token` expires, saturating at zero. `None` if malformed.
pub fn remaining_secs(token: &str) -> Option<u64> {
    let exp_ms = expires_at_ms(token)?;
    let now_ms = i64::try_from(epoch_ms()).unwrap_or(i64::MAX);
    Some(u64::try_from((exp_ms - now_ms) / 1000).unwrap_or(0))
}

/// Decode one token segment. JWTs use unpadded base64url, but padded and
/// standard-alphabet payloads are accepted too.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let trimmed = segment.trim_end_matches('=');
    if trimmed.is_empty() {
        return None;
    }
    URL_SAFE_NO_PAD.decode(trimmed).or_else(|_| STANDARD_NO_PAD.decode(trimmed)).ok()
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
