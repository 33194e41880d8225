//! Parsing of tool output and derived media parameters.

use crate::error::MediaToolError;

/// Parse `ffprobe` duration output (`format=duration`, bare value).
pub fn parse_duration(stdout: &str) -> Result<f64, MediaToolError> {
    let value = stdout.lines().map(str::trim).find(|l| !l.is_empty());
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| MediaToolError::Parse {
            what: "duration",
            output: stdout.to_string(),
        })
}

/// Parse `ffprobe` stream dimensions (`csv=s=x:p=0`, e.g. `1280x720`) and
/// return the pixel height.
pub fn parse_height(stdout: &str) -> Result<u32, MediaToolError> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|line| line.split('x').nth(1))
        .and_then(|h| h.parse::<u32>().ok())
        .filter(|h| *h > 0)
        .ok_or_else(|| MediaToolError::Parse {
            what: "resolution",
            output: stdout.to_string(),
        })
}

/// Seek position for the thumbnail frame, in seconds.
///
/// Near the midpoint of the declared duration, clamped to
/// `[0.5, duration - 1]`; 1.0 when the duration is unknown or not positive.
pub fn thumbnail_timestamp(duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d.is_finite() && d > 0.0 => {
            let upper = (d - 1.0).max(0.5);
            (d / 2.0).min(upper).max(0.5)
        }
        _ => 1.0,
    }
}

/// Render a timestamp the way it is passed to `ffmpeg -ss`.
pub fn format_timestamp(seconds: f64) -> String {
    format!("{seconds:.2}")
}

/// Keep the tail of stderr; ffmpeg prints the actual error last.
pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.480000\n").unwrap(), 12.48);
        assert!(parse_duration("N/A\n").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_parse_height() {
        assert_eq!(parse_height("1280x720\n").unwrap(), 720);
        // Some containers emit a trailing separator.
        assert_eq!(parse_height("1920x1080x\n").unwrap(), 1080);
        assert!(parse_height("garbage").is_err());
    }

    #[test]
    fn test_thumbnail_timestamp_unknown_duration() {
        assert_eq!(thumbnail_timestamp(None), 1.0);
        assert_eq!(thumbnail_timestamp(Some(0.0)), 1.0);
        assert_eq!(thumbnail_timestamp(Some(-3.0)), 1.0);
    }

    #[test]
    fn test_thumbnail_timestamp_clamps() {
        assert_eq!(thumbnail_timestamp(Some(120.0)), 60.0);
        // d/2 = 0.4 → raised to the 0.5 floor.
        assert_eq!(thumbnail_timestamp(Some(0.8)), 0.5);
        // d/2 = 0.75, d-1 = 0.5 → upper bound wins.
        assert_eq!(thumbnail_timestamp(Some(1.5)), 0.5);
        assert_eq!(thumbnail_timestamp(Some(3.0)), 1.5);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1.0), "1.00");
        assert_eq!(format_timestamp(12.345), "12.35");
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let raw = b"a\nb\nc\nd\ne\nf\ng";
        assert_eq!(stderr_tail(raw), "c\nd\ne\nf\ng");
    }
}
