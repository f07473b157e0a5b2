use chrono::{TimeZone, Utc};

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human readable byte size, binary units.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Upload timestamp (epoch millis) as `YYYY-MM-DD HH:MM` UTC.
pub fn format_upload_time(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}
