//! Timeline playback through a virtual keyboard

use crate::device::VirtualKeyboard;
use crate::events::Timeline;
use crate::policy::PathPolicy;
use crate::storage::TimelineReader;
use serde::Serialize;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use typeworm_core::{Error, KeyRegistry, Result, SleepPolicy};

/// Pause after the last press so the kernel delivers it before the virtual
/// keyboard goes away. Shorter values can drop the final key.
pub const DRAIN_DELAY: Duration = Duration::from_millis(100);

/// Pause after a virtual keyboard is created so the input stack has picked it
/// up before the first press. Shorter values can drop the first key.
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Timeline file to play
    pub path: PathBuf,
    /// Fixed gap between presses; zero reproduces the recorded timings
    pub wait: Duration,
    /// Skip the deadtime before the first press
    pub trim: bool,
    /// Labels that make the file unplayable
    pub blacklist: Vec<String>,
    pub policy: PathPolicy,
}

impl PlaybackConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wait: Duration::ZERO,
            trim: true,
            blacklist: Vec::new(),
            policy: PathPolicy::default(),
        }
    }

    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn blacklist(mut self, labels: Vec<String>) -> Self {
        self.blacklist = labels;
        self
    }

    pub fn policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackReport {
    pub path: PathBuf,
    /// Presses in the timeline
    pub inputs: usize,
    /// Presses the virtual keyboard accepted
    pub emitted: usize,
}

/// Replays timeline files
pub struct Replayer<'a> {
    registry: &'a KeyRegistry,
    config: PlaybackConfig,
}

impl<'a> Replayer<'a> {
    pub fn new(registry: &'a KeyRegistry, config: PlaybackConfig) -> Self {
        Self { registry, config }
    }

    /// Validate and parse the configured file
    pub fn load(&self) -> Result<Timeline> {
        let path = &self.config.path;
        self.config.policy.check_playback(path)?;
        let timeline = TimelineReader::new(self.registry)
            .blacklist(&self.config.blacklist)
            .load(path)?;
        if timeline.is_empty() {
            return Err(Error::empty_timeline(path));
        }
        Ok(timeline)
    }

    /// Parse the file, then acquire a virtual keyboard from `open` and play
    /// the timeline on it.
    ///
    /// Nothing is acquired unless the whole file parses. The keyboard is
    /// dropped before returning.
    pub fn play<V, F>(&self, open: F) -> Result<PlaybackReport>
    where
        V: VirtualKeyboard,
        F: FnOnce() -> Result<V>,
    {
        let timeline = self.load()?;
        let mut keyboard = open()?;

        info!("playing back from {}", self.config.path.display());
        let emitted = self.play_timeline(&timeline, &mut keyboard);
        thread::sleep(DRAIN_DELAY);
        drop(keyboard);

        info!("{} inputs were played back", timeline.len());
        Ok(PlaybackReport {
            path: self.config.path.clone(),
            inputs: timeline.len(),
            emitted,
        })
    }

    /// Emit every press in order, sleeping per the configured policy.
    /// Returns how many presses the keyboard accepted.
    pub fn play_timeline<V: VirtualKeyboard + ?Sized>(&self, timeline: &Timeline, keyboard: &mut V) -> usize {
        let policy = SleepPolicy::new(self.config.wait, self.config.trim);
        let deadtime = timeline.deadtime();
        let start = Instant::now();
        let mut emitted = 0;

        for (i, input) in timeline.iter().enumerate() {
            let delay = policy.delay_before(i, input.timestamp, deadtime, start.elapsed());
            if !delay.is_zero() {
                thread::sleep(delay);
            }

            let Some(code) = self.registry.code_of(&input.label) else {
                debug!("skipping unmapped label {}", input.label);
                continue;
            };
            match keyboard.key_press(code) {
                Ok(()) => emitted += 1,
                Err(e) => warn!("failed to press {}: {}", input.label, e),
            }
        }

        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Input;
    use crate::mock::SinkLog;
    use std::fs;
    use std::path::Path;
    use typeworm_core::keys::key_codes::*;
    use typeworm_core::ErrorCode;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn plays_every_press_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.tw", "00:00.000 A\n00:00.010 B\n00:00.020 UP\n");
        let registry = KeyRegistry::standard();
        let log = SinkLog::new();
        let report = Replayer::new(&registry, PlaybackConfig::new(&path))
            .play(|| Ok(log.open()))
            .unwrap();
        assert_eq!(report.inputs, 3);
        assert_eq!(report.emitted, 3);
        assert_eq!(log.codes(), vec![A, B, UP]);
        assert_eq!(log.opened(), 1);
        assert_eq!(log.released(), 1);
    }

    #[test]
    fn malformed_file_fails_before_acquiring() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.tw", "01:00 A\n");
        let registry = KeyRegistry::standard();
        let log = SinkLog::new();
        let err = Replayer::new(&registry, PlaybackConfig::new(&path))
            .play(|| Ok(log.open()))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Format);
        assert_eq!(log.opened(), 0);
    }

    #[test]
    fn blacklisted_label_fails_before_acquiring() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.tw", "00:00.050 A\n00:00.100 ESC\n");
        let registry = KeyRegistry::standard();
        let log = SinkLog::new();
        let err = Replayer::new(&registry, PlaybackConfig::new(&path).blacklist(vec!["ESC".into()]))
            .play(|| Ok(log.open()))
            .unwrap_err();
        assert!(err.message.contains("blacklisted"));
        assert_eq!(log.opened(), 0);
        assert!(log.codes().is_empty());
    }

    #[test]
    fn empty_file_has_no_recorded_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.tw", "");
        let registry = KeyRegistry::standard();
        let log = SinkLog::new();
        let err = Replayer::new(&registry, PlaybackConfig::new(&path))
            .play(|| Ok(log.open()))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Format);
        assert!(err.message.contains("does not contain recorded inputs"));
        assert_eq!(log.opened(), 0);
    }

    #[test]
    fn missing_file_is_a_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let registry = KeyRegistry::standard();
        let log = SinkLog::new();
        let err = Replayer::new(&registry, PlaybackConfig::new(dir.path().join("nope.tw")))
            .play(|| Ok(log.open()))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Precondition);
    }

    #[test]
    fn acquisition_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.tw", "00:00.000 A\n");
        let registry = KeyRegistry::standard();
        let err = Replayer::new(&registry, PlaybackConfig::new(&path))
            .play(|| -> Result<crate::mock::MockSink> { Err(Error::device("uinput", "permission denied")) })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Device);
    }

    #[test]
    fn failed_presses_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.tw", "00:00.000 A\n00:00.001 B\n");
        let registry = KeyRegistry::standard();
        let log = SinkLog::new();
        log.set_failing(true);
        let report = Replayer::new(&registry, PlaybackConfig::new(&path))
            .play(|| Ok(log.open()))
            .unwrap();
        assert_eq!(report.inputs, 2);
        assert_eq!(report.emitted, 0);
        assert_eq!(log.codes(), vec![A, B]);
        assert_eq!(log.released(), 1);
    }

    #[test]
    fn labels_missing_at_emission_are_skipped() {
        let partial = KeyRegistry::from_entries([(A, "A")]);
        let timeline: Timeline = [Input::new(ms(0), "A"), Input::new(ms(1), "B")].into_iter().collect();
        let log = SinkLog::new();
        let mut sink = log.open();
        let emitted = Replayer::new(&partial, PlaybackConfig::new("unused.tw")).play_timeline(&timeline, &mut sink);
        assert_eq!(emitted, 1);
        assert_eq!(log.codes(), vec![A]);
    }

    #[test]
    fn trim_absorbs_deadtime() {
        let registry = KeyRegistry::standard();
        let timeline: Timeline = [Input::new(ms(5000), "A"), Input::new(ms(5200), "B")].into_iter().collect();
        let log = SinkLog::new();
        let mut sink = log.open();
        let start = Instant::now();
        Replayer::new(&registry, PlaybackConfig::new("unused.tw").trim(true)).play_timeline(&timeline, &mut sink);
        let presses = log.presses();
        assert!(presses[0].1 - start < ms(100));
        let gap = presses[1].1 - presses[0].1;
        assert!(gap >= ms(190) && gap < ms(400), "gap {:?}", gap);
    }

    #[test]
    fn untrimmed_waits_out_deadtime() {
        let registry = KeyRegistry::standard();
        let timeline: Timeline = [Input::new(ms(300), "A"), Input::new(ms(400), "B")].into_iter().collect();
        let log = SinkLog::new();
        let mut sink = log.open();
        let start = Instant::now();
        Replayer::new(&registry, PlaybackConfig::new("unused.tw").trim(false)).play_timeline(&timeline, &mut sink);
        let presses = log.presses();
        assert!(presses[0].1 - start >= ms(300));
        assert!(presses[1].1 - start >= ms(400));
    }

    #[test]
    fn fixed_wait_spaces_presses() {
        let registry = KeyRegistry::standard();
        let timeline: Timeline = [
            Input::new(ms(1000), "A"),
            Input::new(ms(1001), "B"),
            Input::new(ms(9000), "C"),
        ]
        .into_iter()
        .collect();
        let log = SinkLog::new();
        let mut sink = log.open();
        let start = Instant::now();
        Replayer::new(&registry, PlaybackConfig::new("unused.tw").wait(ms(40)).trim(false))
            .play_timeline(&timeline, &mut sink);
        let presses = log.presses();
        assert!(presses[0].1 - start < ms(40));
        for pair in presses.windows(2) {
            let gap = pair[1].1 - pair[0].1;
            assert!(gap >= ms(40) && gap < ms(1000), "gap {:?}", gap);
        }
    }
}
