//! Formatting helpers for the `list`, `create` and `download` output.

use chrono::{DateTime, Utc};

/// Binary units above plain bytes, with the decimals each one is shown with.
const SIZE_UNITS: [(&str, usize); 4] = [("KB", 1), ("MB", 1), ("GB", 2), ("TB", 2)];

/// Units of an age, largest first.
const AGE_UNITS: [(i64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Size of a snapshot file in human-readable form.
///
/// # Examples
///
/// ```
/// use dbsnap::utils::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 bytes");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} bytes");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    let (name, decimals) = SIZE_UNITS[unit];
    format!("{value:.decimals$} {name}")
}

/// How long ago `then` was, in its two largest units, e.g. "1h 5m ago".
///
/// Timestamps less than a second old, or in the future, are "just now".
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use dbsnap::utils::format_age;
///
/// let now = Utc::now();
/// assert_eq!(format_age(now - Duration::seconds(90), now), "1m 30s ago");
/// assert_eq!(format_age(now, now), "just now");
/// ```
pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    let Some(first) = AGE_UNITS.iter().position(|&(size, _)| secs >= size) else {
        return "just now".to_string();
    };

    let mut rest = secs;
    let parts: Vec<String> = AGE_UNITS[first..]
        .iter()
        .take(2)
        .map(|&(size, unit)| {
            let count = rest / size;
            rest %= size;
            format!("{count}{unit}")
        })
        .collect();
    format!("{} ago", parts.join(" "))
}
