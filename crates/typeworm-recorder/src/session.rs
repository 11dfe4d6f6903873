//! Multi-file sessions
//!
//! A session alternates between an action (capture or playback of one file)
//! and a control phase in which the stop/next/redo keys decide what happens
//! next. The keyboard is shared by both phases; only presses stamped after a
//! control phase begins count as commands, so the press that ended the
//! previous action is never taken for one.

use crate::device::{KeyboardSource, VirtualKeyboard};
use crate::policy::{PathPolicy, PlaybackQueue};
use crate::recorder::{CaptureConfig, Recorder};
use crate::replay::{PlaybackConfig, Replayer};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};
use typeworm_core::{Control, ControlKeys, Error, KeyRegistry, Result};

/// One kind of per-file action a session repeats
pub trait Iteration {
    /// Process the item at `cursor`. `redo` is set when the item is being
    /// processed again at the user's request.
    fn run(&mut self, keyboard: &mut dyn KeyboardSource, cursor: usize, redo: bool) -> Result<PathBuf>;

    /// Cursor after `cursor` completes, or `None` to end the session
    fn advance(&self, cursor: usize) -> Result<Option<usize>>;

    /// Human-readable item at `cursor`, for prompts
    fn describe(&self, cursor: usize) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// Actions completed, redos included
    pub iterations: usize,
    pub last_path: Option<PathBuf>,
}

/// The stop/next/redo state machine shared by both session flavors
#[derive(Debug, Clone)]
pub struct SessionController {
    controls: ControlKeys,
    cursor: usize,
    last: usize,
    pending: bool,
    redo: bool,
}

impl SessionController {
    pub fn new(controls: ControlKeys, start: usize) -> Self {
        Self {
            controls,
            cursor: start,
            last: start,
            pending: true,
            redo: false,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last(&self) -> usize {
        self.last
    }

    /// Drive `iteration` until the stop key, the end of a non-looping queue,
    /// or the first failure.
    pub fn run<K, I>(&mut self, keyboard: &mut K, iteration: &mut I) -> Result<SessionReport>
    where
        K: KeyboardSource,
        I: Iteration + ?Sized,
    {
        let mut report = SessionReport::default();

        loop {
            if self.pending {
                let path = iteration.run(&mut *keyboard, self.cursor, self.redo)?;
                report.iterations += 1;
                report.last_path = Some(path);

                self.last = self.cursor;
                match iteration.advance(self.cursor)? {
                    Some(next) => self.cursor = next,
                    None => return Ok(report),
                }
                self.pending = false;

                info!(
                    "press {} to stop, {} to continue with {}, or {} to redo {}",
                    self.controls.stop(),
                    self.controls.next(),
                    iteration.describe(self.cursor),
                    self.controls.redo(),
                    iteration.describe(self.last),
                );
            }

            if self.await_control(keyboard)? == Some(Control::Stop) {
                return Ok(report);
            }
        }
    }

    /// Read one batch and apply any commands pressed after the read began.
    fn await_control<K: KeyboardSource>(&mut self, keyboard: &mut K) -> Result<Option<Control>> {
        let started = SystemTime::now();
        let events = keyboard
            .read()
            .map_err(|e| Error::device("keyboard read", e))?;

        let mut seen = None;
        for ev in events.iter().filter(|e| e.is_key_down()) {
            if ev.time <= started {
                debug!("ignoring key code {} pressed before the control phase", ev.code);
                continue;
            }
            let Some(control) = self.controls.classify(ev.code) else {
                continue;
            };
            seen = Some(control);
            match control {
                Control::Stop => break,
                Control::Next => {
                    self.pending = true;
                    self.redo = false;
                }
                Control::Redo => {
                    self.cursor = self.last;
                    self.pending = true;
                    self.redo = true;
                }
            }
        }
        Ok(seen)
    }
}

/// Record session configuration
#[derive(Debug, Clone)]
pub struct RecordSessionConfig {
    /// Path with one `%d` in the file name
    pub template: PathBuf,
    /// First value substituted into the template
    pub offset: usize,
    /// Overwrite policy for regular iterations; redos always overwrite
    pub overwrite: bool,
    pub controls: ControlKeys,
    pub policy: PathPolicy,
}

impl RecordSessionConfig {
    pub fn new(template: impl Into<PathBuf>, controls: ControlKeys) -> Self {
        Self {
            template: template.into(),
            offset: 0,
            overwrite: false,
            controls,
            policy: PathPolicy::default(),
        }
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Records `template` rendered with offset, offset + 1, ...
pub struct RecordSession<'a> {
    registry: &'a KeyRegistry,
    config: RecordSessionConfig,
}

impl<'a> RecordSession<'a> {
    pub fn new(registry: &'a KeyRegistry, config: RecordSessionConfig) -> Result<Self> {
        config.policy.check_template(&config.template)?;
        Ok(Self { registry, config })
    }

    pub fn run<K: KeyboardSource>(&self, keyboard: &mut K) -> Result<SessionReport> {
        let mut iteration = RecordIteration {
            registry: self.registry,
            config: &self.config,
        };
        SessionController::new(self.config.controls.clone(), self.config.offset)
            .run(keyboard, &mut iteration)
    }
}

struct RecordIteration<'s> {
    registry: &'s KeyRegistry,
    config: &'s RecordSessionConfig,
}

impl RecordIteration<'_> {
    fn path(&self, cursor: usize) -> PathBuf {
        self.config.policy.render_template(&self.config.template, cursor)
    }
}

impl Iteration for RecordIteration<'_> {
    fn run(&mut self, keyboard: &mut dyn KeyboardSource, cursor: usize, redo: bool) -> Result<PathBuf> {
        let controls = &self.config.controls;
        let capture = CaptureConfig::new(self.path(cursor), controls.stop())
            .overwrite(redo || self.config.overwrite)
            .ignore(vec![controls.next().to_string(), controls.redo().to_string()])
            .policy(self.config.policy.clone());
        let report = Recorder::new(self.registry, capture).capture(keyboard)?;
        Ok(report.path)
    }

    fn advance(&self, cursor: usize) -> Result<Option<usize>> {
        cursor
            .checked_add(1)
            .map(Some)
            .ok_or_else(|| Error::invalid_argument("record session offset exhausted"))
    }

    fn describe(&self, cursor: usize) -> String {
        format!("recording to {}", self.path(cursor).display())
    }
}

/// Playback session configuration
#[derive(Debug, Clone)]
pub struct PlaybackSessionConfig {
    pub queue: PlaybackQueue,
    pub wait: Duration,
    pub trim: bool,
    /// Wrap to the first file after the last one
    pub looping: bool,
    pub controls: ControlKeys,
    pub policy: PathPolicy,
}

impl PlaybackSessionConfig {
    pub fn new(queue: PlaybackQueue, controls: ControlKeys) -> Self {
        Self {
            queue,
            wait: Duration::ZERO,
            trim: true,
            looping: true,
            controls,
            policy: PathPolicy::default(),
        }
    }

    /// Queue discovered from a directory or a file inside one
    pub fn discover(path: &Path, controls: ControlKeys, policy: PathPolicy) -> Result<Self> {
        let queue = policy.discover_queue(path)?;
        Ok(Self::new(queue, controls).policy(policy))
    }

    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Plays queued files in order, acquiring a fresh virtual keyboard per file
pub struct PlaybackSession<'a, F> {
    registry: &'a KeyRegistry,
    config: PlaybackSessionConfig,
    open: F,
}

impl<'a, V, F> PlaybackSession<'a, F>
where
    V: VirtualKeyboard,
    F: FnMut() -> Result<V>,
{
    pub fn new(registry: &'a KeyRegistry, config: PlaybackSessionConfig, open: F) -> Result<Self> {
        let queue = &config.queue;
        if queue.paths.is_empty() {
            return Err(Error::precondition("playback queue is empty"));
        }
        if queue.start >= queue.paths.len() {
            return Err(Error::invalid_argument(format!(
                "start index {} is outside a queue of {} files",
                queue.start,
                queue.paths.len()
            )));
        }
        Ok(Self {
            registry,
            config,
            open,
        })
    }

    pub fn run<K: KeyboardSource>(&mut self, keyboard: &mut K) -> Result<SessionReport> {
        let mut iteration = PlaybackIteration {
            registry: self.registry,
            config: &self.config,
            blacklist: self.config.controls.blacklist(),
            open: &mut self.open,
        };
        SessionController::new(self.config.controls.clone(), self.config.queue.start)
            .run(keyboard, &mut iteration)
    }
}

struct PlaybackIteration<'s, F> {
    registry: &'s KeyRegistry,
    config: &'s PlaybackSessionConfig,
    blacklist: Vec<String>,
    open: &'s mut F,
}

impl<V, F> Iteration for PlaybackIteration<'_, F>
where
    V: VirtualKeyboard,
    F: FnMut() -> Result<V>,
{
    fn run(&mut self, _keyboard: &mut dyn KeyboardSource, cursor: usize, _redo: bool) -> Result<PathBuf> {
        let playback = PlaybackConfig::new(&self.config.queue.paths[cursor])
            .wait(self.config.wait)
            .trim(self.config.trim)
            .blacklist(self.blacklist.clone())
            .policy(self.config.policy.clone());
        let report = Replayer::new(self.registry, playback).play(&mut *self.open)?;
        Ok(report.path)
    }

    fn advance(&self, cursor: usize) -> Result<Option<usize>> {
        let next = cursor + 1;
        Ok(if next < self.config.queue.paths.len() {
            Some(next)
        } else if self.config.looping {
            Some(0)
        } else {
            None
        })
    }

    fn describe(&self, cursor: usize) -> String {
        format!("playing back from {}", self.config.queue.paths[cursor].display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedKeyboard;
    use typeworm_core::keys::key_codes::*;
    use typeworm_core::ErrorCode;

    #[derive(Default)]
    struct Probe {
        calls: Vec<(usize, bool)>,
        len: Option<usize>,
        looping: bool,
        fail_at: Option<usize>,
    }

    impl Iteration for Probe {
        fn run(&mut self, _: &mut dyn KeyboardSource, cursor: usize, redo: bool) -> Result<PathBuf> {
            self.calls.push((cursor, redo));
            if self.fail_at == Some(cursor) {
                return Err(Error::precondition("probe failure"));
            }
            Ok(PathBuf::from(format!("{}.tw", cursor)))
        }

        fn advance(&self, cursor: usize) -> Result<Option<usize>> {
            Ok(match self.len {
                Some(len) if cursor + 1 == len => self.looping.then_some(0),
                _ => Some(cursor + 1),
            })
        }

        fn describe(&self, cursor: usize) -> String {
            cursor.to_string()
        }
    }

    fn controller(start: usize) -> SessionController {
        SessionController::new(ControlKeys::standard(&KeyRegistry::standard()).unwrap(), start)
    }

    #[test]
    fn redo_repeats_last_then_next_moves_on() {
        let mut kb = ScriptedKeyboard::new()
            .press(&[LEFTSHIFT])
            .press(&[LEFTCTRL])
            .press(&[ESC]);
        let mut probe = Probe::default();
        let report = controller(0).run(&mut kb, &mut probe).unwrap();
        assert_eq!(probe.calls, vec![(0, false), (0, true), (1, false)]);
        assert_eq!(report.iterations, 3);
        assert_eq!(report.last_path, Some(PathBuf::from("1.tw")));
    }

    #[test]
    fn presses_before_control_phase_are_ignored() {
        let mut kb = ScriptedKeyboard::new()
            .stale(&[LEFTCTRL, LEFTSHIFT])
            .press(&[A, B])
            .press(&[ESC]);
        let mut probe = Probe::default();
        controller(5).run(&mut kb, &mut probe).unwrap();
        assert_eq!(probe.calls, vec![(5, false)]);
        assert_eq!(kb.reads(), 3);
    }

    #[test]
    fn stale_stop_does_not_end_session() {
        let mut kb = ScriptedKeyboard::new()
            .stale(&[ESC])
            .press(&[LEFTCTRL])
            .press(&[ESC]);
        let mut probe = Probe::default();
        controller(0).run(&mut kb, &mut probe).unwrap();
        assert_eq!(probe.calls, vec![(0, false), (1, false)]);
    }

    #[test]
    fn stop_wins_within_a_batch() {
        let mut kb = ScriptedKeyboard::new().press(&[ESC, LEFTCTRL]);
        let mut probe = Probe::default();
        controller(0).run(&mut kb, &mut probe).unwrap();
        assert_eq!(probe.calls, vec![(0, false)]);
    }

    #[test]
    fn looping_queue_wraps() {
        let mut kb = ScriptedKeyboard::new()
            .press(&[LEFTCTRL])
            .press(&[LEFTCTRL])
            .press(&[ESC]);
        let mut probe = Probe {
            len: Some(2),
            looping: true,
            ..Probe::default()
        };
        controller(1).run(&mut kb, &mut probe).unwrap();
        assert_eq!(probe.calls, vec![(1, false), (0, false), (1, false)]);
    }

    #[test]
    fn finite_queue_halts_after_last() {
        let mut kb = ScriptedKeyboard::new().press(&[LEFTCTRL]);
        let mut probe = Probe {
            len: Some(2),
            ..Probe::default()
        };
        let report = controller(0).run(&mut kb, &mut probe).unwrap();
        assert_eq!(probe.calls, vec![(0, false), (1, false)]);
        assert_eq!(report.iterations, 2);
        assert_eq!(kb.remaining(), 0);
    }

    #[test]
    fn finite_queue_starting_at_last_never_prompts() {
        let mut kb = ScriptedKeyboard::new().press(&[LEFTSHIFT]).press(&[ESC]);
        let mut probe = Probe {
            len: Some(3),
            ..Probe::default()
        };
        controller(2).run(&mut kb, &mut probe).unwrap();
        assert_eq!(probe.calls, vec![(2, false)]);
        assert_eq!(kb.remaining(), 2);
    }

    #[test]
    fn failures_propagate() {
        let mut kb = ScriptedKeyboard::new().press(&[LEFTCTRL]);
        let mut probe = Probe {
            fail_at: Some(1),
            ..Probe::default()
        };
        let err = controller(0).run(&mut kb, &mut probe).unwrap_err();
        assert_eq!(err.code, ErrorCode::Precondition);
        assert_eq!(probe.calls, vec![(0, false), (1, false)]);
    }

    #[test]
    fn control_read_failure_is_surfaced() {
        let mut kb = ScriptedKeyboard::new().fail();
        let mut probe = Probe::default();
        let err = controller(0).run(&mut kb, &mut probe).unwrap_err();
        assert_eq!(err.code, ErrorCode::Device);
    }

    #[test]
    fn cursor_tracks_redo() {
        let mut kb = ScriptedKeyboard::new().press(&[LEFTSHIFT, ESC]);
        let mut probe = Probe::default();
        let mut c = controller(3);
        c.run(&mut kb, &mut probe).unwrap();
        assert_eq!(c.last(), 3);
        assert_eq!(c.cursor(), 3);
    }

    #[test]
    fn playback_session_rejects_bad_queues() {
        let registry = KeyRegistry::standard();
        let controls = ControlKeys::standard(&registry).unwrap();
        let log = crate::mock::SinkLog::new();
        let empty = PlaybackSessionConfig::new(PlaybackQueue { paths: vec![], start: 0 }, controls.clone());
        let err = PlaybackSession::new(&registry, empty, || Ok(log.open())).err().unwrap();
        assert_eq!(err.code, ErrorCode::Precondition);
        let outside = PlaybackSessionConfig::new(
            PlaybackQueue {
                paths: vec![PathBuf::from("a.tw")],
                start: 1,
            },
            controls,
        );
        let err = PlaybackSession::new(&registry, outside, || Ok(log.open())).err().unwrap();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn record_session_rejects_bad_template() {
        let registry = KeyRegistry::standard();
        let controls = ControlKeys::standard(&registry).unwrap();
        let err = RecordSession::new(&registry, RecordSessionConfig::new("out.tw", controls)).err().unwrap();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }
}
