//! Session control keys

use crate::error::{Error, Result};
use crate::keys::KeyRegistry;

/// Command read between session iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Stop,
    Next,
    Redo,
}

/// Validated stop/next/redo labels with their codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlKeys {
    stop: (String, u16),
    next: (String, u16),
    redo: (String, u16),
}

impl ControlKeys {
    pub const DEFAULT_STOP: &'static str = "ESC";
    pub const DEFAULT_NEXT: &'static str = "LEFTCTRL";
    pub const DEFAULT_REDO: &'static str = "LEFTSHIFT";

    /// Labels must be registered and pairwise distinct.
    pub fn new(registry: &KeyRegistry, stop: &str, next: &str, redo: &str) -> Result<Self> {
        let resolve = |role: &str, label: &str| {
            registry
                .code_of(label)
                .map(|code| (label.to_string(), code))
                .ok_or_else(|| Error::unknown_label(role, label))
        };
        let keys = Self {
            stop: resolve("stop", stop)?,
            next: resolve("next", next)?,
            redo: resolve("redo", redo)?,
        };
        if stop == next || stop == redo || next == redo {
            return Err(Error::invalid_argument(format!(
                "stop, next and redo keys must differ (got {}, {}, {})",
                stop, next, redo
            )));
        }
        Ok(keys)
    }

    pub fn standard(registry: &KeyRegistry) -> Result<Self> {
        Self::new(registry, Self::DEFAULT_STOP, Self::DEFAULT_NEXT, Self::DEFAULT_REDO)
    }

    pub fn stop(&self) -> &str {
        &self.stop.0
    }

    pub fn next(&self) -> &str {
        &self.next.0
    }

    pub fn redo(&self) -> &str {
        &self.redo.0
    }

    pub fn classify(&self, code: u16) -> Option<Control> {
        if code == self.stop.1 {
            Some(Control::Stop)
        } else if code == self.next.1 {
            Some(Control::Next)
        } else if code == self.redo.1 {
            Some(Control::Redo)
        } else {
            None
        }
    }

    /// Labels a session timeline must never contain
    pub fn blacklist(&self) -> Vec<String> {
        vec![self.stop.0.clone(), self.next.0.clone(), self.redo.0.clone()]
    }
}
