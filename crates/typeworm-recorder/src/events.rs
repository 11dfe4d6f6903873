//! Timeline types and raw keyboard events

use serde::Serialize;
use std::time::{Duration, SystemTime};

/// `EV_KEY` from `linux/input-event-codes.h`
pub const EV_KEY: u16 = 0x01;
/// Key event value for a press (0 is release, 2 is autorepeat)
pub const KEY_DOWN: i32 = 1;

/// One recorded key press
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Input {
    /// Offset from the start of the capture
    pub timestamp: Duration,
    pub label: String,
}

impl Input {
    pub fn new(timestamp: Duration, label: impl Into<String>) -> Self {
        Self {
            timestamp,
            label: label.into(),
        }
    }
}

/// Ordered key presses, timestamps non-decreasing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub inputs: Vec<Input>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, input: Input) {
        debug_assert!(
            self.inputs.last().map_or(true, |l| l.timestamp <= input.timestamp),
            "timeline timestamps must not decrease"
        );
        self.inputs.push(input);
    }

    /// Time before the first input
    pub fn deadtime(&self) -> Duration {
        self.inputs.first().map_or(Duration::ZERO, |i| i.timestamp)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Input> {
        self.inputs.iter()
    }
}

impl FromIterator<Input> for Timeline {
    fn from_iter<T: IntoIterator<Item = Input>>(iter: T) -> Self {
        Self {
            inputs: iter.into_iter().collect(),
        }
    }
}

/// Event as delivered by a keyboard device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
    /// Wall-clock time the kernel saw the event
    pub time: SystemTime,
}

impl RawKeyEvent {
    pub fn key_down(code: u16, time: SystemTime) -> Self {
        Self {
            kind: EV_KEY,
            code,
            value: KEY_DOWN,
            time,
        }
    }

    pub fn is_key_down(&self) -> bool {
        self.kind == EV_KEY && self.value == KEY_DOWN
    }
}
