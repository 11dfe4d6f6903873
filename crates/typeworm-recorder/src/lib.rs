//! typeworm-recorder - keystroke capture, timed playback and sessions
//!
//! Records key presses from a physical keyboard into `.tw` timeline files
//! and plays them back through a virtual keyboard with the recorded timing.
//!
//! ## Platform Support
//!
//! - **Linux**: evdev for capture, uinput for playback
//!
//! The engines only see the [`KeyboardSource`] and [`VirtualKeyboard`]
//! traits, so everything except `platform` runs against [`mock`] devices.

pub mod device;
pub mod events;
pub mod mock;
pub mod platform;
pub mod policy;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod storage;

pub use device::{KeyboardSource, VirtualKeyboard};
pub use events::{Input, RawKeyEvent, Timeline};
pub use policy::{PathPolicy, PlaybackQueue};
pub use recorder::{CaptureConfig, CaptureReport, Recorder};
pub use replay::{PlaybackConfig, PlaybackReport, Replayer, DRAIN_DELAY, SETTLE_DELAY};
pub use session::{
    Iteration, PlaybackSession, PlaybackSessionConfig, RecordSession, RecordSessionConfig,
    SessionController, SessionReport,
};
pub use storage::TimelineReader;

#[cfg(target_os = "linux")]
pub use platform::current::{EvdevKeyboard, UinputKeyboard};

pub mod prelude {
    pub use crate::device::{KeyboardSource, VirtualKeyboard};
    pub use crate::events::{Input, Timeline};
    pub use crate::policy::{PathPolicy, PlaybackQueue};
    pub use crate::recorder::{CaptureConfig, CaptureReport, Recorder};
    pub use crate::replay::{PlaybackConfig, PlaybackReport, Replayer};
    pub use crate::session::{
        PlaybackSession, PlaybackSessionConfig, RecordSession, RecordSessionConfig, SessionReport,
    };

    #[cfg(target_os = "linux")]
    pub use crate::platform::current::{EvdevKeyboard, UinputKeyboard};
}
