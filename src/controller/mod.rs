//! Input subsystem: device sampling and steer normalization
//!
//! Runs synchronously inside the frame loop:
//!
//! 1. [`input_sampler`] - keyboard state, gamepad hot-plug and event draining
//! 2. [`normalizer`] - raw axis values to normalized steer, trigger flags and text
//! 3. [`pipeline`] - per-frame glue producing the [`InputMode`] the layout consumes
//!
//! # Architecture
//!
//! ```text
//! Platform ──► Sampler ──► RawInputSample ──► Normalizer ──► InputMode
//!              (per frame)                    (change-detected)
//! ```

pub mod input_sampler;
pub mod normalizer;
pub mod pipeline;

pub use input_sampler::{GamepadBackend, GilrsBackend, InputSampler, NoGamepads};
pub use normalizer::{advance, normalize_steer, NormalizedInputState};
pub use pipeline::InputPipeline;

/// Axis index carrying the steer value.
pub const STEER_AXIS: u8 = 0;
/// Axis index carrying the left (brake) trigger.
pub const LEFT_TRIGGER_AXIS: u8 = 4;
/// Axis index carrying the right (throttle) trigger.
pub const RIGHT_TRIGGER_AXIS: u8 = 5;
/// Axis value reported by a trigger at rest.
pub const TRIGGER_RELEASED: i16 = i16::MIN;

/// Keyboard state sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigitalKeys {
    pub forward: bool,
    pub left: bool,
    pub back: bool,
    pub right: bool,
}

/// Raw axis values of the held gamepad, as last reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalogSample {
    pub steer_raw: i16,
    pub left_trigger_raw: i16,
    pub right_trigger_raw: i16,
    pub device_present: bool,
}

impl Default for AnalogSample {
    fn default() -> Self {
        Self {
            steer_raw: 0,
            left_trigger_raw: TRIGGER_RELEASED,
            right_trigger_raw: TRIGGER_RELEASED,
            device_present: false,
        }
    }
}

/// What the sampler produced this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawInputSample {
    Digital(DigitalKeys),
    Analog(AnalogSample),
}

/// Per-frame input handed to the lane layout.
#[derive(Clone, Debug, PartialEq)]
pub enum InputMode {
    Digital(DigitalKeys),
    Analog(NormalizedInputState),
}

/// Event drained from the platform queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformEvent {
    Quit,
    AxisMotion { device: usize, axis: u8, value: i16 },
    Button { device: usize, button: u8, pressed: bool },
    DeviceAdded { device: usize },
    DeviceRemoved { device: usize },
}

impl PlatformEvent {
    /// Device, axis and value fields of the event when read as axis motion.
    ///
    /// Non-axis events expose their own fields in the same slots: a button
    /// reads as `(device, button, 0 | 1)`, a hot-plug event as `(device, 0, 0)`.
    pub fn axis_view(&self) -> Option<(usize, u8, i16)> {
        match *self {
            PlatformEvent::Quit => None,
            PlatformEvent::AxisMotion {
                device,
                axis,
                value,
            } => Some((device, axis, value)),
            PlatformEvent::Button {
                device,
                button,
                pressed,
            } => Some((device, button, i16::from(pressed))),
            PlatformEvent::DeviceAdded { device } | PlatformEvent::DeviceRemoved { device } => {
                Some((device, 0, 0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_view_of_real_axis_motion() {
        let event = PlatformEvent::AxisMotion {
            device: 0,
            axis: LEFT_TRIGGER_AXIS,
            value: 12,
        };
        assert_eq!(event.axis_view(), Some((0, 4, 12)));
    }

    #[test]
    fn axis_view_reinterprets_other_events() {
        let button = PlatformEvent::Button {
            device: 0,
            button: 5,
            pressed: true,
        };
        assert_eq!(button.axis_view(), Some((0, 5, 1)));
        assert_eq!(
            PlatformEvent::DeviceAdded { device: 2 }.axis_view(),
            Some((2, 0, 0))
        );
        assert_eq!(PlatformEvent::Quit.axis_view(), None);
    }

    #[test]
    fn triggers_start_released() {
        let sample = AnalogSample::default();
        assert_eq!(sample.left_trigger_raw, TRIGGER_RELEASED);
        assert_eq!(sample.right_trigger_raw, TRIGGER_RELEASED);
        assert_eq!(sample.steer_raw, 0);
    }
}
