//! Utility functions for URL input and human-readable formatting

use crate::error::{Error, Result};

/// Message used when the submitted URL is empty or whitespace-only
pub const EMPTY_URL_MESSAGE: &str = "Please enter a video URL";

/// Trim and check a user-submitted URL before any network call
///
/// A missing scheme is read as `https://`, so `youtu.be/xyz` passes. The returned
/// string keeps the user's spelling; deciding whether the site is supported is left
/// to the backend.
///
/// # Errors
///
/// Returns [`Error::Input`] if the URL is empty/whitespace-only, does not parse even
/// with a scheme added, or names a scheme other than http/https.
///
/// # Examples
///
/// ```
/// use vidfetch::utils::normalize_url;
///
/// let url = normalize_url("  https://www.youtube.com/watch?v=abc  ").unwrap();
/// assert_eq!(url, "https://www.youtube.com/watch?v=abc");
/// assert_eq!(normalize_url("youtu.be/abc").unwrap(), "youtu.be/abc");
/// assert!(normalize_url("   ").is_err());
/// ```
pub fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Input(EMPTY_URL_MESSAGE.to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = url::Url::parse(&candidate)
        .map_err(|e| Error::Input(format!("'{}' is not a valid URL: {}", trimmed, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Input(format!(
            "URL must start with http:// or https://, got '{}'",
            trimmed
        )));
    }

    // Keep the user's spelling; the backend matches on the raw string
    Ok(trimmed.to_string())
}

/// Format a duration in seconds as `M:SS` or `H:MM:SS`
///
/// # Examples
///
/// ```
/// use vidfetch::utils::format_duration;
///
/// assert_eq!(format_duration(125), "2:05");
/// assert_eq!(format_duration(3725), "1:02:05");
/// ```
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format a byte count with binary units (B, KiB, MiB, GiB)
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}
