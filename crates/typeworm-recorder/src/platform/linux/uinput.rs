use super::{permission_suggestions, VIRTUAL_KEYBOARD_NAME};
use crate::device::VirtualKeyboard;
use crate::replay::SETTLE_DELAY;
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use std::io;
use std::thread;
use tracing::debug;
use typeworm_core::{Error, KeyRegistry, Result};

/// Virtual keyboard created through `/dev/uinput`
///
/// The kernel removes the device when this value is dropped.
pub struct UinputKeyboard {
    device: VirtualDevice,
}

impl UinputKeyboard {
    /// Create a keyboard advertising every key in `registry`
    pub fn create(registry: &KeyRegistry) -> Result<Self> {
        Self::with_name(VIRTUAL_KEYBOARD_NAME, registry)
    }

    /// Returns once the device has had [`SETTLE_DELAY`] to register.
    pub fn with_name(name: &str, registry: &KeyRegistry) -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for code in registry.codes() {
            keys.insert(Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .and_then(|b| b.name(name).with_keys(&keys))
            .and_then(|b| b.build())
            .map_err(|e| Error::device("creating uinput keyboard", e).with_suggestions(permission_suggestions()))?;

        debug!("created virtual keyboard '{}' with {} keys", name, registry.len());
        thread::sleep(SETTLE_DELAY);
        Ok(Self { device })
    }
}

impl VirtualKeyboard for UinputKeyboard {
    fn key_press(&mut self, code: u16) -> io::Result<()> {
        self.device.emit(&[InputEvent::new(EventType::KEY, code, 1)])?;
        self.device.emit(&[InputEvent::new(EventType::KEY, code, 0)])
    }
}
