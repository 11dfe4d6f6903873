//! Timestamp formatting and playback scheduling

use crate::error::{Error, ErrorCode, Result};
use std::time::Duration;

/// Format as `MM:SS.mmm`, truncating to whole milliseconds.
///
/// Minutes are zero-padded to two digits and grow as needed.
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    format!("{:02}:{:02}.{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000)
}

/// Parse a `MM:SS.mmm` timestamp as minutes + seconds + milliseconds.
///
/// Each field is a run of ASCII digits; fields are summed, so `00:75.000`
/// reads as 75 seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let invalid = || Error::new(ErrorCode::Format, format!("invalid timestamp '{}'", s));

    let (minutes, rest) = s.split_once(':').ok_or_else(invalid)?;
    let (seconds, millis) = rest.split_once('.').ok_or_else(invalid)?;

    let minutes = parse_field(minutes).ok_or_else(invalid)?;
    let seconds = parse_field(seconds).ok_or_else(invalid)?;
    let millis = parse_field(millis).ok_or_else(invalid)?;

    minutes
        .checked_mul(60_000)
        .and_then(|m| seconds.checked_mul(1000).and_then(|s| m.checked_add(s)))
        .and_then(|t| t.checked_add(millis))
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Drop everything below one millisecond, saturating at `u64::MAX` ms
pub fn truncate_millis(d: Duration) -> Duration {
    Duration::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// How playback spaces out emissions
///
/// With `wait == 0` the recorded timings are reproduced, optionally skipping
/// the deadtime before the first input. With `wait > 0` every gap is `wait`
/// and the first input fires immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepPolicy {
    pub wait: Duration,
    pub trim: bool,
}

impl SleepPolicy {
    pub fn new(wait: Duration, trim: bool) -> Self {
        Self { wait, trim }
    }

    /// Time to sleep before emitting input `index`.
    ///
    /// `elapsed` is measured from the start of emission. A schedule that has
    /// already slipped yields zero; later gaps are not compressed.
    pub fn delay_before(
        &self,
        index: usize,
        timestamp: Duration,
        deadtime: Duration,
        elapsed: Duration,
    ) -> Duration {
        if index == 0 {
            if self.trim || !self.wait.is_zero() {
                Duration::ZERO
            } else {
                deadtime
            }
        } else if !self.wait.is_zero() {
            self.wait
        } else if self.trim {
            timestamp.saturating_sub(elapsed).saturating_sub(deadtime)
        } else {
            timestamp.saturating_sub(elapsed)
        }
    }
}

impl Default for SleepPolicy {
    fn default() -> Self {
        Self::new(Duration::ZERO, true)
    }
}
