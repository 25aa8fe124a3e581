//! Small formatting helpers for titles and details.

use chrono::{DateTime, Utc};

/// `1 commit`, `3 commits`; `branch` pluralizes to `branches`.
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        return format!("1 {}", word);
    }
    let plural = if word.ends_with("ch") || word.ends_with('s') || word.ends_with('x') {
        format!("{}es", word)
    } else if let Some(stem) = word.strip_suffix('y') {
        format!("{}ies", stem)
    } else {
        format!("{}s", word)
    };
    format!("{} {}", count, plural)
}

/// Uppercase the first character.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Humanized age of `timestamp` relative to now.
pub fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    format_relative_time_at(timestamp, Utc::now())
}

/// Humanized age of `timestamp` relative to `now`.
pub fn format_relative_time_at(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(timestamp).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} ago", pluralize("minute", minutes as usize));
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} ago", pluralize("hour", hours as usize));
    }

    let days = hours / 24;
    if days == 1 {
        return "yesterday".to_string();
    }
    if days < 30 {
        return format!("{} days ago", days);
    }

    let months = days / 30;
    if months < 12 {
        return format!("{} ago", pluralize("month", months as usize));
    }

    format!("{} ago", pluralize("year", (months / 12) as usize))
}

/// ` · Last fetched 5 minutes ago`, or nothing when never fetched.
pub fn last_fetched_suffix(last_fetched: Option<DateTime<Utc>>) -> String {
    match last_fetched {
        Some(at) => format!("  ·  Last fetched {}", format_relative_time(at)),
        None => String::new(),
    }
}
