use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
use statum::{machine, state};
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::{AxisFilter, DisplayConfig};
use crate::controller::{
    AnalogSample, DigitalKeys, PlatformEvent, RawInputSample, LEFT_TRIGGER_AXIS,
    RIGHT_TRIGGER_AXIS, STEER_AXIS,
};

// Opaque token for an open gamepad
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceId(pub usize);

// Device acquisition errors, never fatal
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("no gamepad enumerated")]
    NoDevice,

    #[error("failed to open gamepad {index}: {reason}")]
    Open { index: usize, reason: String },
}

/// Source of gamepad enumeration and platform events.
pub trait GamepadBackend: fmt::Debug {
    /// Number of currently enumerated devices.
    fn device_count(&self) -> usize;

    /// Opens the device at enumeration `index`.
    fn open(&mut self, index: usize) -> Result<DeviceId, DeviceError>;

    /// Releases a handle returned by [`GamepadBackend::open`].
    fn close(&mut self, id: DeviceId);

    /// Pops the next pending event, `None` once the queue is drained.
    fn next_event(&mut self) -> Option<PlatformEvent>;
}

// Backend used when gamepad input is disabled
#[derive(Debug, Default)]
pub struct NoGamepads;

impl GamepadBackend for NoGamepads {
    fn device_count(&self) -> usize {
        0
    }

    fn open(&mut self, _index: usize) -> Result<DeviceId, DeviceError> {
        Err(DeviceError::NoDevice)
    }

    fn close(&mut self, _id: DeviceId) {}

    fn next_event(&mut self) -> Option<PlatformEvent> {
        None
    }
}

/// gilrs-backed device access.
///
/// Device indices are positions in gilrs' connected-gamepad enumeration.
/// Axes are reported with SDL joystick numbering so the sampler only ever
/// deals with `(device, axis, int16)` triples.
#[derive(Debug)]
pub struct GilrsBackend {
    gilrs: Gilrs,
}

impl GilrsBackend {
    pub fn new() -> Result<Self, gilrs::Error> {
        info!("Initializing gilrs controller interface");
        let gilrs = Gilrs::new()?;
        info!("Successfully initialized gilrs");
        Ok(Self { gilrs })
    }

    fn slot_of(&self, id: GamepadId) -> Option<usize> {
        self.gilrs
            .gamepads()
            .position(|(connected, _)| connected == id)
    }

    fn convert_gilrs_event(&self, id: GamepadId, event: EventType) -> Option<PlatformEvent> {
        match event {
            EventType::AxisChanged(axis, value, _) => {
                let axis = map_axis(axis)?;
                Some(PlatformEvent::AxisMotion {
                    device: self.slot_of(id)?,
                    axis,
                    value: axis_to_raw(value),
                })
            }
            EventType::ButtonChanged(Button::LeftTrigger2, value, _) => {
                Some(PlatformEvent::AxisMotion {
                    device: self.slot_of(id)?,
                    axis: LEFT_TRIGGER_AXIS,
                    value: trigger_to_raw(value),
                })
            }
            EventType::ButtonChanged(Button::RightTrigger2, value, _) => {
                Some(PlatformEvent::AxisMotion {
                    device: self.slot_of(id)?,
                    axis: RIGHT_TRIGGER_AXIS,
                    value: trigger_to_raw(value),
                })
            }
            EventType::ButtonPressed(button, _) => Some(PlatformEvent::Button {
                device: self.slot_of(id)?,
                button: map_button(button)?,
                pressed: true,
            }),
            EventType::ButtonReleased(button, _) => Some(PlatformEvent::Button {
                device: self.slot_of(id)?,
                button: map_button(button)?,
                pressed: false,
            }),
            EventType::Connected => {
                info!("Controller connected event detected");
                Some(PlatformEvent::DeviceAdded {
                    device: self.slot_of(id).unwrap_or_else(|| usize::from(id)),
                })
            }
            EventType::Disconnected => {
                warn!("Controller disconnected event detected");
                Some(PlatformEvent::DeviceRemoved {
                    device: usize::from(id),
                })
            }
            _ => {
                debug!("Unhandled event type: {:?}", event);
                None
            }
        }
    }
}

impl GamepadBackend for GilrsBackend {
    fn device_count(&self) -> usize {
        self.gilrs.gamepads().count()
    }

    fn open(&mut self, index: usize) -> Result<DeviceId, DeviceError> {
        let (id, gamepad) =
            self.gilrs
                .gamepads()
                .nth(index)
                .ok_or_else(|| DeviceError::Open {
                    index,
                    reason: "index not enumerated".to_string(),
                })?;
        info!("Opened gamepad [{}] {} ({})", index, gamepad.name(), id);
        Ok(DeviceId(usize::from(id)))
    }

    fn close(&mut self, id: DeviceId) {
        debug!("Closed gamepad handle {:?}", id);
    }

    fn next_event(&mut self) -> Option<PlatformEvent> {
        while let Some(event) = self.gilrs.next_event() {
            if let Some(converted) = self.convert_gilrs_event(event.id, event.event) {
                return Some(converted);
            }
        }
        None
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum SamplerState {
    Initializing,
    Sampling,
}

#[machine]
#[derive(Debug)]
pub struct InputSampler<S: SamplerState> {
    backend: Box<dyn GamepadBackend>,

    use_gamepad: bool,
    axis_filter: AxisFilter,

    // Handle of enumeration index 0 while held
    held: Option<DeviceId>,

    // Axis values reported by the held device
    analog: AnalogSample,

    quit_requested: bool,

    // Suppresses repeated acquisition warnings until the next success
    failure_reported: bool,
}

impl<S: SamplerState> InputSampler<S> {
    pub fn held_device(&self) -> Option<DeviceId> {
        self.held
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

impl InputSampler<Initializing> {
    pub fn create(backend: Box<dyn GamepadBackend>, config: &DisplayConfig) -> Self {
        debug!(
            "Creating input sampler: use_gamepad={}, axis_filter={:?}",
            config.use_gamepad, config.axis_filter
        );
        Self::new(
            backend,
            config.use_gamepad,
            config.axis_filter,
            None,
            AnalogSample::default(),
            false,
            false,
        )
    }

    pub fn initialize(self) -> InputSampler<Sampling> {
        if self.use_gamepad {
            let count = self.backend.device_count();
            if count == 0 {
                warn!("No gamepad connected, showing keyboard input until one appears");
            } else {
                info!("Found {} gamepads, using index 0", count);
            }
        } else {
            info!("Gamepad input disabled, sampling keyboard");
        }
        self.transition()
    }
}

impl InputSampler<Sampling> {
    /// Runs one frame of sampling.
    ///
    /// Reconciles the device handle with enumeration, drains the event queue
    /// and returns the analog sample if a gamepad is held, otherwise `keys`.
    pub fn poll(&mut self, keys: DigitalKeys) -> (RawInputSample, usize) {
        match self.sync_device() {
            Ok(()) => self.failure_reported = false,
            Err(e) => {
                if !self.failure_reported {
                    warn!("Failed to load gamepad: {}", e);
                    self.failure_reported = true;
                }
            }
        }

        let drained = self.drain_events();

        let sample = match self.held {
            Some(_) if self.use_gamepad => RawInputSample::Analog(self.analog),
            _ => RawInputSample::Digital(keys),
        };
        (sample, drained)
    }

    /// Opens or releases the device handle so that it is held exactly when
    /// gamepad input is enabled and at least one device is enumerated.
    pub fn sync_device(&mut self) -> Result<(), DeviceError> {
        if !self.use_gamepad {
            self.release();
            return Ok(());
        }

        if self.backend.device_count() == 0 {
            if self.held.is_some() {
                info!("Gamepad no longer enumerated, releasing handle");
            }
            self.release();
            return Err(DeviceError::NoDevice);
        }

        if self.held.is_none() {
            let id = self.backend.open(0)?;
            self.analog.device_present = true;
            self.held = Some(id);
        }
        Ok(())
    }

    /// Drains pending platform events, returning how many were seen.
    pub fn drain_events(&mut self) -> usize {
        let mut count = 0;
        while let Some(event) = self.backend.next_event() {
            self.apply_event(event);
            count += 1;
        }
        count
    }

    pub fn apply_event(&mut self, event: PlatformEvent) {
        if event == PlatformEvent::Quit {
            info!("Quit requested");
            self.quit_requested = true;
            return;
        }

        let fields = match (self.axis_filter, event) {
            (AxisFilter::Strict, PlatformEvent::AxisMotion { .. }) => event.axis_view(),
            (AxisFilter::Strict, _) => None,
            (AxisFilter::Permissive, _) => event.axis_view(),
        };

        let Some((device, axis, value)) = fields else {
            debug!("Ignoring non-axis event: {:?}", event);
            return;
        };

        if device != 0 || self.held.is_none() {
            return;
        }

        match axis {
            STEER_AXIS => self.analog.steer_raw = value,
            LEFT_TRIGGER_AXIS => self.analog.left_trigger_raw = value,
            RIGHT_TRIGGER_AXIS => self.analog.right_trigger_raw = value,
            _ => {}
        }
    }

    /// Closes the held handle, if any, and forgets its axis values.
    pub fn release(&mut self) {
        if let Some(id) = self.held.take() {
            self.backend.close(id);
            self.analog = AnalogSample::default();
            info!("Released gamepad handle {:?}", id);
        }
    }
}

fn map_axis(axis: Axis) -> Option<u8> {
    match axis {
        Axis::LeftStickX => Some(STEER_AXIS),
        Axis::LeftStickY => Some(1),
        Axis::RightStickX => Some(2),
        Axis::RightStickY => Some(3),
        Axis::LeftZ => Some(LEFT_TRIGGER_AXIS),
        Axis::RightZ => Some(RIGHT_TRIGGER_AXIS),
        _ => None,
    }
}

fn map_button(button: Button) -> Option<u8> {
    match button {
        Button::South => Some(0),
        Button::East => Some(1),
        Button::West => Some(2),
        Button::North => Some(3),
        Button::Select => Some(4),
        Button::Mode => Some(5),
        Button::Start => Some(6),
        Button::LeftThumb => Some(7),
        Button::RightThumb => Some(8),
        Button::LeftTrigger => Some(9),
        Button::RightTrigger => Some(10),
        Button::DPadUp => Some(11),
        Button::DPadDown => Some(12),
        Button::DPadLeft => Some(13),
        Button::DPadRight => Some(14),
        _ => None,
    }
}

// [-1.0, 1.0] onto the int16 axis range; -1.0 lands on i16::MIN
fn axis_to_raw(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * 32768.0).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

// [0.0, 1.0] trigger travel onto the int16 axis range, released at i16::MIN
fn trigger_to_raw(value: f32) -> i16 {
    (value.clamp(0.0, 1.0) * 65535.0 - 32768.0).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::TRIGGER_RELEASED;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct FakeDevices {
        count: usize,
        fail_open: bool,
        opened: usize,
        closed: usize,
        queue: VecDeque<PlatformEvent>,
    }

    #[derive(Debug, Clone, Default)]
    struct FakeBackend(Rc<RefCell<FakeDevices>>);

    impl GamepadBackend for FakeBackend {
        fn device_count(&self) -> usize {
            self.0.borrow().count
        }

        fn open(&mut self, index: usize) -> Result<DeviceId, DeviceError> {
            let mut devices = self.0.borrow_mut();
            if devices.fail_open {
                return Err(DeviceError::Open {
                    index,
                    reason: "busy".to_string(),
                });
            }
            devices.opened += 1;
            Ok(DeviceId(index))
        }

        fn close(&mut self, _id: DeviceId) {
            self.0.borrow_mut().closed += 1;
        }

        fn next_event(&mut self) -> Option<PlatformEvent> {
            self.0.borrow_mut().queue.pop_front()
        }
    }

    fn sampler(
        backend: &FakeBackend,
        use_gamepad: bool,
        axis_filter: AxisFilter,
    ) -> InputSampler<Sampling> {
        let config = DisplayConfig {
            use_gamepad,
            axis_filter,
            ..DisplayConfig::default()
        };
        InputSampler::create(Box::new(backend.clone()), &config).initialize()
    }

    fn steer(value: i16) -> PlatformEvent {
        PlatformEvent::AxisMotion {
            device: 0,
            axis: STEER_AXIS,
            value,
        }
    }

    fn analog(sample: RawInputSample) -> AnalogSample {
        match sample {
            RawInputSample::Analog(analog) => analog,
            other => panic!("expected analog sample, got {:?}", other),
        }
    }

    #[test]
    fn keyboard_mode_never_opens_device() {
        let backend = FakeBackend::default();
        backend.0.borrow_mut().count = 1;
        let mut sampler = sampler(&backend, false, AxisFilter::Strict);

        let keys = DigitalKeys {
            left: true,
            back: true,
            ..DigitalKeys::default()
        };
        let (sample, _) = sampler.poll(keys);
        assert_eq!(sample, RawInputSample::Digital(keys));
        assert_eq!(backend.0.borrow().opened, 0);
        assert!(sampler.held_device().is_none());
    }

    #[test]
    fn acquires_once_and_applies_axis_events() {
        let backend = FakeBackend::default();
        backend.0.borrow_mut().count = 1;
        let mut sampler = sampler(&backend, true, AxisFilter::Strict);

        backend.0.borrow_mut().queue.push_back(steer(-16384));
        let (sample, drained) = sampler.poll(DigitalKeys::default());
        assert_eq!(drained, 1);
        assert_eq!(analog(sample).steer_raw, -16384);
        assert!(analog(sample).device_present);

        sampler.poll(DigitalKeys::default());
        assert_eq!(backend.0.borrow().opened, 1);
    }

    #[test]
    fn hot_unplug_releases_on_next_frame() {
        let backend = FakeBackend::default();
        backend.0.borrow_mut().count = 1;
        let mut sampler = sampler(&backend, true, AxisFilter::Strict);
        backend.0.borrow_mut().queue.push_back(steer(9000));
        sampler.poll(DigitalKeys::default());
        assert!(sampler.held_device().is_some());

        {
            let mut devices = backend.0.borrow_mut();
            devices.count = 0;
            devices.queue.push_back(steer(-30000));
        }
        let (sample, _) = sampler.poll(DigitalKeys::default());
        assert!(sampler.held_device().is_none());
        assert_eq!(backend.0.borrow().closed, 1);
        assert!(matches!(sample, RawInputSample::Digital(_)));

        backend.0.borrow_mut().count = 1;
        let (sample, _) = sampler.poll(DigitalKeys::default());
        assert_eq!(analog(sample).steer_raw, 0);
        assert_eq!(backend.0.borrow().opened, 2);
    }

    #[test]
    fn open_failure_is_retried_next_frame() {
        let backend = FakeBackend::default();
        {
            let mut devices = backend.0.borrow_mut();
            devices.count = 1;
            devices.fail_open = true;
        }
        let mut sampler = sampler(&backend, true, AxisFilter::Strict);
        let (sample, _) = sampler.poll(DigitalKeys::default());
        assert!(matches!(sample, RawInputSample::Digital(_)));

        backend.0.borrow_mut().fail_open = false;
        let (sample, _) = sampler.poll(DigitalKeys::default());
        assert!(matches!(sample, RawInputSample::Analog(_)));
    }

    #[test]
    fn events_from_other_devices_and_axes_are_ignored() {
        let backend = FakeBackend::default();
        backend.0.borrow_mut().count = 2;
        let mut sampler = sampler(&backend, true, AxisFilter::Strict);
        sampler.poll(DigitalKeys::default());

        sampler.apply_event(PlatformEvent::AxisMotion {
            device: 1,
            axis: STEER_AXIS,
            value: 1000,
        });
        sampler.apply_event(PlatformEvent::AxisMotion {
            device: 0,
            axis: 3,
            value: 1000,
        });
        let (sample, _) = sampler.poll(DigitalKeys::default());
        assert_eq!(analog(sample), AnalogSample {
            device_present: true,
            ..AnalogSample::default()
        });
    }

    #[test]
    fn trigger_axes_update_raw_trigger_values() {
        let backend = FakeBackend::default();
        backend.0.borrow_mut().count = 1;
        let mut sampler = sampler(&backend, true, AxisFilter::Strict);
        sampler.poll(DigitalKeys::default());

        sampler.apply_event(PlatformEvent::AxisMotion {
            device: 0,
            axis: LEFT_TRIGGER_AXIS,
            value: 0,
        });
        let (sample, _) = sampler.poll(DigitalKeys::default());
        assert_eq!(analog(sample).left_trigger_raw, 0);
        assert_eq!(analog(sample).right_trigger_raw, TRIGGER_RELEASED);
    }

    #[test]
    fn strict_filter_ignores_non_axis_events() {
        let backend = FakeBackend::default();
        backend.0.borrow_mut().count = 1;
        let mut sampler = sampler(&backend, true, AxisFilter::Strict);
        backend.0.borrow_mut().queue.push_back(steer(20000));
        sampler.poll(DigitalKeys::default());

        backend.0.borrow_mut().queue.push_back(PlatformEvent::Button {
            device: 0,
            button: 0,
            pressed: true,
        });
        let (sample, _) = sampler.poll(DigitalKeys::default());
        assert_eq!(analog(sample).steer_raw, 20000);
    }

    #[test]
    fn permissive_filter_reads_every_event_as_axis_motion() {
        let backend = FakeBackend::default();
        backend.0.borrow_mut().count = 1;
        let mut sampler = sampler(&backend, true, AxisFilter::Permissive);
        backend.0.borrow_mut().queue.push_back(steer(20000));
        sampler.poll(DigitalKeys::default());

        backend.0.borrow_mut().queue.push_back(PlatformEvent::Button {
            device: 0,
            button: 0,
            pressed: true,
        });
        let (sample, _) = sampler.poll(DigitalKeys::default());
        assert_eq!(analog(sample).steer_raw, 1);
    }

    #[test]
    fn quit_event_is_recorded() {
        let backend = FakeBackend::default();
        let mut sampler = sampler(&backend, false, AxisFilter::Strict);
        backend.0.borrow_mut().queue.push_back(PlatformEvent::Quit);
        sampler.poll(DigitalKeys::default());
        assert!(sampler.quit_requested());
    }

    #[test]
    fn release_closes_held_handle_once() {
        let backend = FakeBackend::default();
        backend.0.borrow_mut().count = 1;
        let mut sampler = sampler(&backend, true, AxisFilter::Strict);
        sampler.poll(DigitalKeys::default());
        sampler.release();
        sampler.release();
        assert_eq!(backend.0.borrow().closed, 1);
    }

    #[test]
    fn gilrs_values_map_onto_int16_range() {
        assert_eq!(axis_to_raw(-1.0), i16::MIN);
        assert_eq!(axis_to_raw(1.0), i16::MAX);
        assert_eq!(axis_to_raw(0.0), 0);
        assert_eq!(trigger_to_raw(0.0), TRIGGER_RELEASED);
        assert_eq!(trigger_to_raw(1.0), i16::MAX);
        assert_ne!(trigger_to_raw(0.01), TRIGGER_RELEASED);
    }
}
