//! OS input backends
//!
//! Only Linux is supported: physical keys come from evdev, synthesized keys
//! go out through uinput.

#[cfg(target_os = "linux")]
pub mod linux;

// Re-export the current platform
#[cfg(target_os = "linux")]
pub use linux as current;
