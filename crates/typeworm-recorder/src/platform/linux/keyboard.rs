use super::permission_suggestions;
use crate::device::KeyboardSource;
use crate::events::RawKeyEvent;
use evdev::Device;
use std::io;
use std::path::Path;
use tracing::{debug, info};
use typeworm_core::{Error, Result};

/// A physical keyboard read through its `/dev/input/event*` node
///
/// The device is not grabbed, so keys keep reaching the rest of the system
/// while they are recorded.
pub struct EvdevKeyboard {
    device: Device,
}

impl EvdevKeyboard {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::open(path).map_err(|e| {
            Error::device(&format!("opening {}", path.display()), e)
                .with_suggestions(permission_suggestions())
        })?;
        info!(
            "using keyboard {} ({})",
            device.name().unwrap_or("unnamed"),
            path.display()
        );
        Ok(Self { device })
    }

    /// Find a keyboard by case-insensitive substrings of its name and
    /// physical path. A name-only match is used when no device matches both.
    pub fn find(name: &str, phys: &str) -> Result<Self> {
        let name = name.to_ascii_lowercase();
        let phys = phys.to_ascii_lowercase();
        let mut fallback = None;

        for (path, device) in evdev::enumerate() {
            let dev_name = device.name().unwrap_or_default().to_ascii_lowercase();
            if !dev_name.contains(&name) {
                continue;
            }
            let dev_phys = device.physical_path().unwrap_or_default().to_ascii_lowercase();
            debug!("candidate keyboard {} at {} ({})", dev_name, path.display(), dev_phys);
            if dev_phys.contains(&phys) {
                return Self::open(&path);
            }
            if fallback.is_none() {
                fallback = Some(path);
            }
        }

        match fallback {
            Some(path) => Self::open(&path),
            None => Err(Error::device(
                "keyboard discovery",
                format!("no input device name contains '{}'", name),
            )
            .with_suggestions(
                std::iter::once("Pass --device /dev/input/eventN or adjust --keyboard-name".to_string())
                    .chain(permission_suggestions())
                    .collect(),
            )),
        }
    }
}

impl KeyboardSource for EvdevKeyboard {
    fn read(&mut self) -> io::Result<Vec<RawKeyEvent>> {
        let events = self.device.fetch_events()?;
        Ok(events
            .map(|ev| RawKeyEvent {
                kind: ev.event_type().0,
                code: ev.code(),
                value: ev.value(),
                time: ev.timestamp(),
            })
            .collect())
    }
}
