//! Time formatting helpers.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Format a duration in seconds as at most two adjacent units starting from
/// the most significant non-zero one, e.g. `121` → `"2m 1s"`, `3600` → `"1h"`.
pub fn format_duration(secs: u64) -> String {
    if secs == 0 {
        return "0s".to_string();
    }
    let mut rest = secs;
    let mut parts = Vec::with_capacity(2);
    for (size, suffix) in UNITS {
        let count = rest / size;
        rest %= size;
        if count > 0 {
            parts.push(format!("{count}{suffix}"));
        } else if !parts.is_empty() {
            // Stop at the first zero unit after a non-zero one: 1d 0h 5m renders as "1d".
            break;
        }
        if parts.len() == 2 {
            break;
        }
    }
    parts.join(" ")
}
