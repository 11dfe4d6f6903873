//! typeworm-core - building blocks for keystroke recording and playback
//!
//! - **keys**: the label registry, the alphabet of recordable keys
//! - **timing**: `MM:SS.mmm` timestamps and the playback sleep schedule
//! - **controls**: stop/next/redo session keys
//! - **error**: structured errors with JSON output

pub mod controls;
pub mod error;
pub mod keys;
pub mod timing;

pub use controls::{Control, ControlKeys};
pub use error::{Error, ErrorCode, Result};
pub use keys::KeyRegistry;
pub use timing::{format_duration, parse_duration, SleepPolicy};

pub mod prelude {
    pub use crate::controls::{Control, ControlKeys};
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::keys::KeyRegistry;
    pub use crate::timing::{format_duration, parse_duration, SleepPolicy};
}
