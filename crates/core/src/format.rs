// crates/core/src/format.rs
//! Display formatting for timestamps and durations in the job tree.

use chrono::{DateTime, Utc};

/// Wall-clock time of day with millisecond precision, e.g. `12:00:03.250`.
pub fn format_time(t: DateTime<Utc>) -> String {
    t.format("%H:%M:%S%.3f").to_string()
}

/// Compact duration: `850µs`, `120ms`, `3.40s`.
///
/// Negative spans (clock went backwards between events) render as `0µs`.
pub fn format_duration(d: chrono::Duration) -> String {
    let d = d.to_std().unwrap_or_default();
    let micros = d.as_micros();
    if micros < 1_000 {
        format!("{}µs", micros)
    } else if d.as_millis() < 1_000 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_time() {
        let t = Utc.with_ymd_and_hms(2026, 2, 5, 9, 4, 3).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(format_time(t), "09:04:03.250");
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(chrono::Duration::microseconds(850)), "850µs");
        assert_eq!(format_duration(chrono::Duration::milliseconds(120)), "120ms");
        assert_eq!(format_duration(chrono::Duration::milliseconds(3400)), "3.40s");
    }

    #[test]
    fn test_format_negative_duration() {
        assert_eq!(format_duration(chrono::Duration::milliseconds(-5)), "0µs");
    }
}
