//! evdev keyboards and uinput virtual keyboards

mod keyboard;
mod uinput;

pub use keyboard::*;
pub use uinput::*;

/// Display name of the virtual keyboard
pub const VIRTUAL_KEYBOARD_NAME: &str = "typeworm";

/// Default name substring when searching for the physical keyboard
pub const DEFAULT_KEYBOARD_NAME: &str = "keyboard";

/// Default physical path substring when searching for the physical keyboard
pub const DEFAULT_KEYBOARD_PHYS: &str = "usb";

fn permission_suggestions() -> Vec<String> {
    vec![
        "Run as root, or add your user to the 'input' group".to_string(),
        "Check that /dev/input and /dev/uinput are readable and writable".to_string(),
    ]
}
