//! Scripted devices for exercising capture, playback and sessions without
//! touching `/dev/input` or `/dev/uinput`.

use crate::device::{KeyboardSource, VirtualKeyboard};
use crate::events::RawKeyEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

#[derive(Debug, Clone)]
enum Step {
    Keys { delay: Duration, codes: Vec<u16> },
    Stale(Vec<u16>),
    Fail,
}

/// Keyboard that replays a fixed script of batches
///
/// Each batch carries a key-down and key-up per code, stamped just after the
/// read started. Running past the end of the script panics so a test cannot
/// hang on a capture that never sees its stop key.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeyboard {
    steps: VecDeque<Step>,
    reads: usize,
}

impl ScriptedKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a batch of presses
    pub fn press(self, codes: &[u16]) -> Self {
        self.press_after(Duration::ZERO, codes)
    }

    /// Block for `delay`, then deliver a batch of presses
    pub fn press_after(mut self, delay: Duration, codes: &[u16]) -> Self {
        self.steps.push_back(Step::Keys {
            delay,
            codes: codes.to_vec(),
        });
        self
    }

    /// Deliver presses stamped a second in the past, as if left over in the
    /// device queue from an earlier phase
    pub fn stale(mut self, codes: &[u16]) -> Self {
        self.steps.push_back(Step::Stale(codes.to_vec()));
        self
    }

    /// Fail one read
    pub fn fail(mut self) -> Self {
        self.steps.push_back(Step::Fail);
        self
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    fn batch(codes: &[u16], time: SystemTime) -> Vec<RawKeyEvent> {
        codes
            .iter()
            .flat_map(|&code| {
                let down = RawKeyEvent::key_down(code, time);
                let up = RawKeyEvent { value: 0, ..down };
                [down, up]
            })
            .chain(std::iter::once(RawKeyEvent {
                kind: 0,
                code: 0,
                value: 0,
                time,
            }))
            .collect()
    }
}

impl KeyboardSource for ScriptedKeyboard {
    fn read(&mut self) -> io::Result<Vec<RawKeyEvent>> {
        self.reads += 1;
        match self.steps.pop_front() {
            Some(Step::Keys { delay, codes }) => {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                Ok(Self::batch(&codes, SystemTime::now() + Duration::from_millis(1)))
            }
            Some(Step::Stale(codes)) => {
                Ok(Self::batch(&codes, SystemTime::now() - Duration::from_secs(1)))
            }
            Some(Step::Fail) => Err(io::Error::new(io::ErrorKind::Interrupted, "scripted read failure")),
            None => panic!("keyboard script exhausted after {} reads", self.reads),
        }
    }
}

#[derive(Debug, Default)]
struct SinkState {
    presses: Vec<(u16, Instant)>,
    opened: usize,
    released: usize,
    failing: bool,
}

/// Shared record of everything done to [`MockSink`]s opened from it
#[derive(Debug, Clone, Default)]
pub struct SinkLog {
    inner: Arc<Mutex<SinkState>>,
}

impl SinkLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a sink, as a playback would
    pub fn open(&self) -> MockSink {
        self.inner.lock().opened += 1;
        MockSink { log: self.clone() }
    }

    /// Make every press report failure (presses are still logged)
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().failing = failing;
    }

    pub fn codes(&self) -> Vec<u16> {
        self.inner.lock().presses.iter().map(|(c, _)| *c).collect()
    }

    pub fn presses(&self) -> Vec<(u16, Instant)> {
        self.inner.lock().presses.clone()
    }

    pub fn opened(&self) -> usize {
        self.inner.lock().opened
    }

    pub fn released(&self) -> usize {
        self.inner.lock().released
    }
}

/// Virtual keyboard that logs presses instead of injecting them
#[derive(Debug)]
pub struct MockSink {
    log: SinkLog,
}

impl VirtualKeyboard for MockSink {
    fn key_press(&mut self, code: u16) -> io::Result<()> {
        let mut state = self.log.inner.lock();
        state.presses.push((code, Instant::now()));
        if state.failing {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock sink failing"));
        }
        Ok(())
    }
}

impl Drop for MockSink {
    fn drop(&mut self) {
        self.log.inner.lock().released += 1;
    }
}
