//! Optional motion gating for the capture loop.

use crate::gpio::InputPin;

/// Sensor signal that gates frame processing: while no motion is
/// reported and nothing is in progress, the loop can idle instead of
/// running the encoder.
pub trait MotionGate: Send {
    fn motion_detected(&mut self) -> bool;
}

/// PIR sensor on a sysfs GPIO input pin, active-high.
pub struct GpioMotionGate {
    pin: InputPin,
}

impl GpioMotionGate {
    pub fn new(pin: InputPin) -> Self {
        Self { pin }
    }
}

impl MotionGate for GpioMotionGate {
    fn motion_detected(&mut self) -> bool {
        match self.pin.read() {
            Ok(high) => high,
            Err(err) => {
                // A broken sensor must never stop detection: report motion
                // so the loop keeps scanning.
                tracing::debug!(error = %err, "motion sensor read failed; treating as motion");
                true
            }
        }
    }
}
