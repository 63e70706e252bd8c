// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Human-shareable invite codes of the form `SKI-<WORD>-<NNNN>`.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::future::Future;

/// Random draws attempted before falling back to a time-derived code.
pub const MAX_INVITE_CODE_ATTEMPTS: usize = 10;

const INVITE_WORDS: [&str; 100] = [
    "ACE", "AIR", "ALP", "APE", "ARC", "ASH", "AXE", "BAY", "BEE", "BIG", "BOW", "BOX", "CAB",
    "CAP", "COD", "COG", "COL", "CUB", "CUP", "DAY", "DEN", "DEW", "DOE", "DOG", "DRY", "DUO",
    "EEL", "ELK", "ELM", "EMU", "FAN", "FIG", "FIN", "FIR", "FIX", "FLY", "FOG", "FOX", "FUN",
    "GEM", "GNU", "HAT", "HAY", "HEN", "HOP", "HUT", "ICE", "INK", "IVY", "JAM", "JAY", "JET",
    "JOY", "KEG", "KEY", "KIT", "LAB", "LOG", "MAP", "MIX", "MUD", "NET", "NUT", "OAK", "OAR",
    "OWL", "PAL", "PAN", "PEA", "PEG", "PIE", "PIN", "POD", "POW", "RAM", "RAY", "RIM", "ROC",
    "RUN", "SAP", "SEA", "SKI", "SKY", "SUN", "TAN", "TEA", "TOP", "TOY", "TUG", "VAN", "WAX",
    "WEB", "WIG", "WIN", "YAK", "YAM", "YEW", "ZAP", "ZEN", "ZIP",
];

/// Draw a random `SKI-<WORD>-<NNNN>` code.
pub fn random_invite_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let word = INVITE_WORDS.choose(rng).copied().unwrap_or("SKI");
    let number: u16 = rng.gen_range(1000..=9999);
    format!("SKI-{word}-{number}")
}

/// Time-derived code used once random draws keep colliding.
pub fn fallback_invite_code(now: DateTime<Utc>) -> String {
    format!("SKI-T{:X}", now.timestamp_millis())
}

/// Canonical form of a user-entered code.
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Whether a user-entered code is plausibly an invite code.
pub fn is_well_formed(code: &str) -> bool {
    (4..=32).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Generate a code not yet taken according to `is_taken`.
///
/// Tries [`MAX_INVITE_CODE_ATTEMPTS`] random codes, then falls back to
/// [`fallback_invite_code`].
pub async fn generate_unique<F, Fut>(mut is_taken: F) -> Result<String, AppError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, AppError>>,
{
    for attempt in 1..=MAX_INVITE_CODE_ATTEMPTS {
        let candidate = random_invite_code(&mut rand::thread_rng());
        if !is_taken(candidate.clone()).await? {
            return Ok(candidate);
        }
        tracing::debug!(attempt, "Invite code collision");
    }

    tracing::warn!(
        attempts = MAX_INVITE_CODE_ATTEMPTS,
        "Invite code space congested, using time-derived code"
    );
    Ok(fallback_invite_code(Utc::now()))
}
