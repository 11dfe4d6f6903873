//! Device seams between the engines and the OS input layer

use crate::events::RawKeyEvent;
use std::io;

/// Producer of raw events from a physical keyboard
pub trait KeyboardSource {
    /// Block until at least one event is available.
    ///
    /// Errors are retryable; capture retries them, session control surfaces them.
    fn read(&mut self) -> io::Result<Vec<RawKeyEvent>>;
}

/// Sink that injects synthesized key presses
///
/// The device is released when the value is dropped.
pub trait VirtualKeyboard {
    /// Press and release `code`. Delivery is best effort.
    fn key_press(&mut self, code: u16) -> io::Result<()>;
}
