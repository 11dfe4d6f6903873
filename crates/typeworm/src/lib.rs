//! # typeworm
//!
//! Keystroke macros for Linux with timing fidelity.
//!
//! ## Features
//!
//! - **Recording**: capture key presses from an evdev keyboard into `.tw` files
//! - **Playback**: replay them through a uinput virtual keyboard
//! - **Sessions**: record or play numbered files one after another, steered
//!   by stop/next/redo keys
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use typeworm::prelude::*;
//!
//! let registry = KeyRegistry::standard();
//!
//! let mut keyboard = EvdevKeyboard::find("keyboard", "usb")?;
//! Recorder::new(&registry, CaptureConfig::new("hello.tw", "ESC")).capture(&mut keyboard)?;
//!
//! Replayer::new(&registry, PlaybackConfig::new("hello.tw"))
//!     .play(|| UinputKeyboard::create(&registry))?;
//! # Ok::<(), typeworm::Error>(())
//! ```

// Re-export core types
pub use typeworm_core::*;

// Re-export recorder module
pub use typeworm_recorder as recorder;

pub use typeworm_recorder::{
    CaptureConfig, CaptureReport, PathPolicy, PlaybackConfig, PlaybackReport, PlaybackSession,
    PlaybackSessionConfig, RecordSession, RecordSessionConfig, Recorder, Replayer, SessionReport,
    Timeline,
};

#[cfg(target_os = "linux")]
pub use typeworm_recorder::{EvdevKeyboard, UinputKeyboard};

/// Prelude - import everything you need
pub mod prelude {
    pub use typeworm_core::prelude::*;
    pub use typeworm_recorder::prelude::*;
}
