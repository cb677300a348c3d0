use crate::session::solve::Penalty;

pub const MINUTE_MS: u64 = 60_000;
pub const HOUR_MS: u64 = 3_600_000;
pub const PLUS_TWO_MS: u64 = 2_000;
/// Longest raw time a record holds. Manual entries and stored times above it
/// are rejected.
pub const MAX_SOLVE_MS: u64 = 24 * HOUR_MS;

pub const DNF_LABEL: &str = "DNF";
pub const PLACEHOLDER: &str = "--";

/// Format milliseconds as `SS.CC`, `MM:SS.CC` or `HH:MM:SS.CC`.
/// Centiseconds are truncated, never rounded.
pub fn ms_to_time(ms: u64) -> String {
    let centis = (ms % 1000) / 10;
    let secs = (ms % MINUTE_MS) / 1000;
    if ms < MINUTE_MS {
        format!("{secs:02}.{centis:02}")
    } else if ms < HOUR_MS {
        let mins = ms / MINUTE_MS;
        format!("{mins:02}:{secs:02}.{centis:02}")
    } else {
        let hours = ms / HOUR_MS;
        let mins = (ms % HOUR_MS) / MINUTE_MS;
        format!("{hours:02}:{mins:02}:{secs:02}.{centis:02}")
    }
}

/// Averages are fractional; the sub-millisecond part is dropped before formatting.
pub fn ms_f64_to_time(ms: f64) -> String {
    if !ms.is_finite() {
        return DNF_LABEL.to_string();
    }
    ms_to_time(ms.max(0.0) as u64)
}

pub fn penalized_display(raw_time_ms: u64, penalty: Penalty) -> String {
    match penalty {
        Penalty::None => ms_to_time(raw_time_ms),
        Penalty::PlusTwo => format!("{}+", ms_to_time(raw_time_ms.saturating_add(PLUS_TWO_MS))),
        Penalty::Dnf => DNF_LABEL.to_string(),
    }
}

/// True once a time no longer fits the minutes bucket.
pub fn exceeds_display_range(ms: u64) -> bool {
    ms >= HOUR_MS
}
