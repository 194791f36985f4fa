//! Display helpers for countdowns, progress bars and rings.

/// `MM:SS` below one hour, `H:MM:SS` from one hour up.
pub fn format_clock(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Human summary using the two most significant units: `16h 30m`, `5m 3s`, `0s`.
pub fn format_compact(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    match (hours, minutes, seconds) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, 0, _) => format!("{h}h"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}

/// `part / total` clamped to `0.0..=1.0`; 0 when `total` is 0.
pub fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64).clamp(0.0, 1.0)
}

/// Whole percentage, rounded half up and capped at 100.
pub fn percent(part: u64, total: u64) -> u8 {
    (ratio(part, total) * 100.0).round() as u8
}
