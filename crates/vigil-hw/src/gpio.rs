//! Sysfs GPIO pins — buzzer output and PIR motion-sensor input.
//!
//! Uses the `/sys/class/gpio` interface directly rather than a character
//! device library; the terminal only ever drives one output and polls one
//! input.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const GPIO_ROOT: &str = "/sys/class/gpio";

/// The sysfs node appears asynchronously after export.
const EXPORT_SETTLE: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum GpioError {
    #[error("failed to export GPIO {pin}: {source}")]
    Export {
        pin: u32,
        source: std::io::Error,
    },
    #[error("GPIO {pin} I/O failed: {source}")]
    Io {
        pin: u32,
        source: std::io::Error,
    },
}

fn pin_dir(pin: u32) -> PathBuf {
    PathBuf::from(GPIO_ROOT).join(format!("gpio{pin}"))
}

/// Export `pin` if its sysfs directory does not exist yet, then set its
/// direction.
fn export_and_configure(pin: u32, direction: &str) -> Result<PathBuf, GpioError> {
    let dir = pin_dir(pin);
    if !dir.exists() {
        fs::write(PathBuf::from(GPIO_ROOT).join("export"), pin.to_string())
            .map_err(|source| GpioError::Export { pin, source })?;
        std::thread::sleep(EXPORT_SETTLE);
    }

    fs::write(dir.join("direction"), direction)
        .map_err(|source| GpioError::Io { pin, source })?;

    Ok(dir.join("value"))
}

/// An output pin (the alert buzzer).
pub struct OutputPin {
    pin: u32,
    value_path: PathBuf,
}

impl OutputPin {
    pub fn open(pin: u32) -> Result<Self, GpioError> {
        let value_path = export_and_configure(pin, "out")?;
        let out = Self { pin, value_path };
        out.set(false)?;
        tracing::debug!(pin, "output pin configured");
        Ok(out)
    }

    pub fn set(&self, high: bool) -> Result<(), GpioError> {
        fs::write(&self.value_path, if high { "1" } else { "0" })
            .map_err(|source| GpioError::Io { pin: self.pin, source })
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }
}

/// An input pin (the PIR motion sensor; active-high).
pub struct InputPin {
    pin: u32,
    value_path: PathBuf,
}

impl InputPin {
    pub fn open(pin: u32) -> Result<Self, GpioError> {
        let value_path = export_and_configure(pin, "in")?;
        tracing::debug!(pin, "input pin configured");
        Ok(Self { pin, value_path })
    }

    pub fn read(&self) -> Result<bool, GpioError> {
        let raw = fs::read_to_string(&self.value_path)
            .map_err(|source| GpioError::Io { pin: self.pin, source })?;
        Ok(raw.trim() == "1")
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_dir_layout() {
        assert_eq!(pin_dir(26), PathBuf::from("/sys/class/gpio/gpio26"));
    }

    #[test]
    fn open_without_sysfs_fails_cleanly() {
        // On hosts without /sys/class/gpio the export write must surface
        // as an error, not a panic.
        if PathBuf::from(GPIO_ROOT).exists() {
            return;
        }
        assert!(matches!(
            OutputPin::open(26),
            Err(GpioError::Export { pin: 26, .. })
        ));
    }
}
