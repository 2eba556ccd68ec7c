//! Tests for CLI output formatting helpers
//!
//! - Byte formatting (KB, MB, GB)
//! - Duration formatting (ms, s, m)
//! - Relative time formatting
//! - Line truncation for passage previews

use chrono::{Duration, Utc};
use coursealign::cli::output::{format_bytes, format_duration, format_relative_time, truncate_line};

#[test]
fn test_format_bytes_boundaries() {
    assert_eq!(format_bytes(0), "0 B");
    assert_eq!(format_bytes(1023), "1023 B");
    assert_eq!(format_bytes(1024), "1.0 KB");
    assert_eq!(format_bytes(1048576 - 1), "1024.0 KB");
    assert_eq!(format_bytes(1048576), "1.0 MB");
    assert_eq!(format_bytes(1610612736), "1.5 GB");
}

#[test]
fn test_format_duration_ranges() {
    assert_eq!(format_duration(0.0), "0ms");
    assert_eq!(format_duration(0.25), "250ms");
    assert_eq!(format_duration(12.0), "12.00s");
    assert_eq!(format_duration(125.0), "2m 5.0s");
}

#[test]
fn test_format_relative_time_ranges() {
    let now = Utc::now();

    assert_eq!(format_relative_time(&now), "just now");
    assert_eq!(format_relative_time(&(now - Duration::minutes(5))), "5m ago");
    assert_eq!(format_relative_time(&(now - Duration::days(2))), "2d ago");
    assert_eq!(
        format_relative_time(&(now + Duration::hours(1))),
        "in the future"
    );
}

#[test]
fn test_truncate_line_preview() {
    let passage = "Photosynthesis converts light energy\ninto chemical energy.";

    assert_eq!(
        truncate_line(passage, 200),
        "Photosynthesis converts light energy into chemical energy."
    );
    assert_eq!(truncate_line(passage, 17), "Photosynthesis...");
}
