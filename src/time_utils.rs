// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Month in which a ski season starts (November).
const SEASON_START_MONTH: u32 = 11;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Start of the season containing `now`: November 1 (00:00 UTC) of the
/// latest year for which that date is not after `now`.
pub fn season_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let year = if now.month() >= SEASON_START_MONTH {
        now.year()
    } else {
        now.year() - 1
    };

    let date = NaiveDate::from_ymd_opt(year, SEASON_START_MONTH, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    Utc.from_utc_datetime(&date)
}
