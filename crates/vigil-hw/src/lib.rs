//! vigil-hw — Hardware abstraction for the watch terminal.
//!
//! V4L2 camera capture, sysfs GPIO (buzzer and motion sensor), and an
//! HD44780 status LCD behind a PCF8574 I²C backpack. Every device here is
//! optional at runtime: the annunciator and motion gate degrade to
//! console/no-op behavior on hosts without the hardware.

pub mod annunciator;
pub mod camera;
pub mod frame;
pub mod gpio;
pub mod lcd;
pub mod motion;

pub use annunciator::{Annunciator, AnnunciatorError, ConsoleAnnunciator, GpioAnnunciator};
pub use camera::{Camera, CameraError, FrameSource};
pub use frame::Frame;
pub use gpio::{GpioError, InputPin, OutputPin};
pub use lcd::{I2cLcd, LcdError};
pub use motion::{GpioMotionGate, MotionGate};
