//! Keystroke capture
//!
//! Reads key presses from a [`KeyboardSource`] until the stop key, stamping
//! each with its offset from the start of the capture, and writes the
//! timeline in one go at the end.

use crate::device::KeyboardSource;
use crate::events::{Input, Timeline};
use crate::policy::PathPolicy;
use crate::storage;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use typeworm_core::{Error, KeyRegistry, Result};

/// Capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Timeline file to write
    pub path: PathBuf,
    /// Label that ends the capture; never recorded
    pub stop: String,
    /// Allow replacing an existing file
    pub overwrite: bool,
    /// Labels dropped instead of recorded
    pub ignore: Vec<String>,
    pub policy: PathPolicy,
}

impl CaptureConfig {
    pub fn new(path: impl Into<PathBuf>, stop: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stop: stop.into(),
            overwrite: false,
            ignore: Vec::new(),
            policy: PathPolicy::default(),
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn ignore(mut self, labels: Vec<String>) -> Self {
        self.ignore = labels;
        self
    }

    pub fn policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub path: PathBuf,
    pub inputs: usize,
}

pub struct Recorder<'a> {
    registry: &'a KeyRegistry,
    config: CaptureConfig,
}

impl<'a> Recorder<'a> {
    pub fn new(registry: &'a KeyRegistry, config: CaptureConfig) -> Self {
        Self { registry, config }
    }

    /// Record to the configured file until the stop key is pressed.
    ///
    /// The file is created (truncated) before capture starts and filled only
    /// once the stop key arrives.
    pub fn capture<K: KeyboardSource + ?Sized>(&self, keyboard: &mut K) -> Result<CaptureReport> {
        let path = &self.config.path;
        let stop = self.stop_code()?;
        self.config.policy.check_record(path, self.config.overwrite)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dirs(parent).map_err(|e| Error::io("create directory", parent, e))?;
        }
        let file = create_file(path).map_err(|e| Error::io("create", path, e))?;

        info!("recording keys to {} - press {} to stop", path.display(), self.config.stop);
        let timeline = self.record_until(keyboard, stop);

        storage::encode(&timeline, BufWriter::new(file)).map_err(|e| Error::io("write", path, e))?;
        info!("{} inputs were recorded", timeline.len());

        Ok(CaptureReport {
            path: path.clone(),
            inputs: timeline.len(),
        })
    }

    /// Record into memory until the stop key is pressed
    pub fn record<K: KeyboardSource + ?Sized>(&self, keyboard: &mut K) -> Result<Timeline> {
        let stop = self.stop_code()?;
        Ok(self.record_until(keyboard, stop))
    }

    fn stop_code(&self) -> Result<u16> {
        self.registry
            .code_of(&self.config.stop)
            .ok_or_else(|| Error::unknown_label("stop", &self.config.stop))
    }

    fn record_until<K: KeyboardSource + ?Sized>(&self, keyboard: &mut K, stop: u16) -> Timeline {
        let mut timeline = Timeline::new();
        let start = Instant::now();

        'capture: loop {
            let events = match keyboard.read() {
                Ok(events) => events,
                Err(e) => {
                    debug!("keyboard read failed, retrying: {}", e);
                    continue;
                }
            };

            for ev in events.iter().filter(|e| e.is_key_down()) {
                if ev.code == stop {
                    break 'capture;
                }
                match self.registry.label_of(ev.code) {
                    Some(label) if self.config.ignore.iter().any(|i| i == label) => {
                        debug!("dropping control key {}", label);
                    }
                    Some(label) => timeline.push(Input::new(start.elapsed(), label)),
                    None => debug!("dropping unmapped key code {}", ev.code),
                }
            }
        }

        timeline
    }
}

#[cfg(unix)]
fn create_dirs(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_dirs(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn create_file(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
}

#[cfg(not(unix))]
fn create_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedKeyboard;
    use std::time::Duration;
    use typeworm_core::keys::key_codes::*;
    use typeworm_core::ErrorCode;

    #[test]
    fn records_until_stop_key() {
        let registry = KeyRegistry::standard();
        let mut kb = ScriptedKeyboard::new()
            .press(&[A])
            .press_after(Duration::from_millis(30), &[B, UP])
            .press(&[C, ESC, D]);
        let t = Recorder::new(&registry, CaptureConfig::new("x.tw", "ESC"))
            .record(&mut kb)
            .unwrap();
        let labels: Vec<_> = t.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "UP", "C"]);
        assert!(t.inputs[1].timestamp >= t.inputs[0].timestamp + Duration::from_millis(30));
        assert!(t.inputs.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn drops_unmapped_and_ignored_keys() {
        let registry = KeyRegistry::standard();
        let mut kb = ScriptedKeyboard::new()
            .press(&[57, A, LEFTCTRL, LEFTSHIFT])
            .press(&[ESC]);
        let config = CaptureConfig::new("x.tw", "ESC")
            .ignore(vec!["LEFTCTRL".to_string(), "LEFTSHIFT".to_string()]);
        let t = Recorder::new(&registry, config).record(&mut kb).unwrap();
        assert_eq!(t.inputs.len(), 1);
        assert_eq!(t.inputs[0].label, "A");
    }

    #[test]
    fn retries_failed_reads() {
        let registry = KeyRegistry::standard();
        let mut kb = ScriptedKeyboard::new().fail().press(&[Z]).fail().press(&[ESC]);
        let t = Recorder::new(&registry, CaptureConfig::new("x.tw", "ESC"))
            .record(&mut kb)
            .unwrap();
        assert_eq!(t.inputs.len(), 1);
        assert_eq!(kb.remaining(), 0);
    }

    #[test]
    fn unknown_stop_label() {
        let registry = KeyRegistry::standard();
        let mut kb = ScriptedKeyboard::new();
        let err = Recorder::new(&registry, CaptureConfig::new("x.tw", "SPACE"))
            .record(&mut kb)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn capture_writes_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/keys.tw");
        let registry = KeyRegistry::standard();
        let mut kb = ScriptedKeyboard::new().press(&[KEY_1, KEY_2]).press(&[ESC]);
        let report = Recorder::new(&registry, CaptureConfig::new(&path, "ESC"))
            .capture(&mut kb)
            .unwrap();
        assert_eq!(report.inputs, 2);
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" 1"));
        assert!(lines[1].ends_with(" 2"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn capture_with_no_presses_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.tw");
        let registry = KeyRegistry::standard();
        let mut kb = ScriptedKeyboard::new().press(&[ESC]);
        let report = Recorder::new(&registry, CaptureConfig::new(&path, "ESC"))
            .capture(&mut kb)
            .unwrap();
        assert_eq!(report.inputs, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn capture_refuses_existing_file_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.tw");
        fs::write(&path, "00:00.000 A\n").unwrap();
        let registry = KeyRegistry::standard();
        let mut kb = ScriptedKeyboard::new();
        let err = Recorder::new(&registry, CaptureConfig::new(&path, "ESC"))
            .capture(&mut kb)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Precondition);
        assert_eq!(kb.reads(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "00:00.000 A\n");
    }

    #[test]
    fn capture_overwrites_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.tw");
        fs::write(&path, "00:00.000 A\n00:00.100 B\n").unwrap();
        let registry = KeyRegistry::standard();
        let mut kb = ScriptedKeyboard::new().press(&[X]).press(&[ESC]);
        Recorder::new(&registry, CaptureConfig::new(&path, "ESC").overwrite(true))
            .capture(&mut kb)
            .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with(" X\n"));
    }
}
