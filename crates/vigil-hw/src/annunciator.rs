//! The alert annunciator capability — buzzer plus status display.
//!
//! Two implementations share one contract: `GpioAnnunciator` drives real
//! hardware, `ConsoleAnnunciator` logs the same events on hosts without
//! any. `probe()` picks one at startup from the device-tree model string,
//! so callers depend only on the trait.

use std::time::Duration;
use thiserror::Error;

use crate::gpio::{GpioError, OutputPin};
use crate::lcd::{I2cLcd, LcdError};

#[derive(Debug, Error)]
pub enum AnnunciatorError {
    #[error(transparent)]
    Gpio(#[from] GpioError),
    #[error(transparent)]
    Lcd(#[from] LcdError),
}

/// Actuator/display capability consumed by the signal controller.
///
/// `activate` is non-blocking; the caller owns the duration timer and
/// calls `deactivate` when it elapses. Every method must be safe to call
/// on a host with no hardware attached (the console implementation).
pub trait Annunciator: Send {
    fn activate(&mut self, duration: Duration) -> Result<(), AnnunciatorError>;
    fn deactivate(&mut self) -> Result<(), AnnunciatorError>;
    fn set_display(&mut self, line1: &str, line2: &str) -> Result<(), AnnunciatorError>;
}

/// Real hardware: GPIO buzzer, optional I²C LCD. A display that failed
/// to open degrades the terminal to buzzer-only rather than disabling
/// alerts.
pub struct GpioAnnunciator {
    buzzer: OutputPin,
    lcd: Option<I2cLcd>,
}

impl GpioAnnunciator {
    pub fn new(buzzer: OutputPin, lcd: Option<I2cLcd>) -> Self {
        Self { buzzer, lcd }
    }
}

impl Annunciator for GpioAnnunciator {
    fn activate(&mut self, duration: Duration) -> Result<(), AnnunciatorError> {
        tracing::debug!(pin = self.buzzer.pin(), ?duration, "buzzer on");
        self.buzzer.set(true)?;
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), AnnunciatorError> {
        tracing::debug!(pin = self.buzzer.pin(), "buzzer off");
        self.buzzer.set(false)?;
        Ok(())
    }

    fn set_display(&mut self, line1: &str, line2: &str) -> Result<(), AnnunciatorError> {
        if let Some(lcd) = self.lcd.as_mut() {
            lcd.write_line(0, line1)?;
            lcd.write_line(1, line2)?;
        }
        Ok(())
    }
}

/// Console stub with the identical contract, for development hosts and
/// tests.
#[derive(Default)]
pub struct ConsoleAnnunciator;

impl Annunciator for ConsoleAnnunciator {
    fn activate(&mut self, duration: Duration) -> Result<(), AnnunciatorError> {
        tracing::info!(?duration, "[annunciator] ALERT SIGNAL ON");
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), AnnunciatorError> {
        tracing::info!("[annunciator] alert signal off");
        Ok(())
    }

    fn set_display(&mut self, line1: &str, line2: &str) -> Result<(), AnnunciatorError> {
        tracing::info!(line1, line2, "[annunciator] display");
        Ok(())
    }
}

/// True when running on a board whose device tree identifies GPIO-capable
/// hardware (Raspberry Pi and friends).
pub fn is_embedded_board() -> bool {
    std::fs::read_to_string("/sys/firmware/devicetree/base/model")
        .map(|m| m.to_lowercase().contains("raspberry pi"))
        .unwrap_or(false)
}

/// Select an annunciator for this host. Hardware setup failures fall
/// back to the console implementation with a warning; they never abort
/// startup.
pub fn probe(buzzer_pin: u32, lcd_bus: &str, lcd_addr: u16) -> Box<dyn Annunciator> {
    if !is_embedded_board() {
        tracing::info!("no embedded board detected; using console annunciator");
        return Box::new(ConsoleAnnunciator);
    }

    let buzzer = match OutputPin::open(buzzer_pin) {
        Ok(pin) => pin,
        Err(err) => {
            tracing::warn!(error = %err, pin = buzzer_pin, "buzzer setup failed; using console annunciator");
            return Box::new(ConsoleAnnunciator);
        }
    };

    let lcd = match I2cLcd::open(lcd_bus, lcd_addr, 16, 2) {
        Ok(lcd) => Some(lcd),
        Err(err) => {
            tracing::warn!(error = %err, bus = lcd_bus, "LCD setup failed; continuing without display");
            None
        }
    };

    Box::new(GpioAnnunciator::new(buzzer, lcd))
}
