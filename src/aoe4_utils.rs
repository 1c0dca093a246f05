use chrono::{DateTime, Utc};

use crate::error::FormatError;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Turns a leaderboard key into its chat label, e.g. `rm_1v1` into `Ranked 1v1`.
pub fn format_leaderboard(leaderboard: &str) -> String {
    if let Some(rest) = leaderboard.strip_prefix("rm_") {
        format!("Ranked {rest}")
    } else if let Some(rest) = leaderboard.strip_prefix("qm_") {
        format!("QM {rest}")
    } else {
        leaderboard.to_string()
    }
}

/// Shortens a rank level token such as `gold_2` to `G2`.
///
/// Missing or empty tokens render as an empty string. Anything else must look
/// like `<tier>_<division>`; only the first two segments are used.
pub fn format_rank_level(rank_level: Option<&str>) -> Result<String, FormatError> {
    let text = match rank_level {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(String::new()),
    };

    let mut parts = text.split('_');
    let tier = parts.next().unwrap_or_default();
    let division = parts
        .next()
        .ok_or_else(|| FormatError::InvalidRankLevel(text.to_string()))?;
    let initial = tier
        .chars()
        .next()
        .ok_or_else(|| FormatError::InvalidRankLevel(text.to_string()))?;

    Ok(format!("{}{}", initial.to_uppercase(), division))
}

/// Renders a number of seconds using its largest whole unit only.
///
/// Days win over hours, hours over minutes; anything below an hour is shown in
/// minutes, including `0 min`. Negative input is treated as zero.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let days = seconds / SECONDS_PER_DAY;
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = seconds / SECONDS_PER_MINUTE;

    if days >= 1 {
        format!("{} day{}", days, plural(days))
    } else if hours >= 1 {
        format!("{} hour{}", hours, plural(hours))
    } else {
        format!("{minutes} min")
    }
}

/// Time elapsed since `date`, relative to `now`. Dates in the future clamp to `0 min`.
pub fn format_age(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_duration((now - date).num_seconds())
}

pub fn plural<N: PartialEq + From<u8>>(count: N) -> &'static str {
    if count == N::from(1) {
        ""
    } else {
        "s"
    }
}
