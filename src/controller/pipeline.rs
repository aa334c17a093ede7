use tracing::debug;

use super::input_sampler::{InputSampler, Sampling};
use super::normalizer::{advance, NormalizedInputState};
use super::{DigitalKeys, InputMode, PlatformEvent, RawInputSample};

/// Sampler plus the normalized state carried between frames.
#[derive(Debug)]
pub struct InputPipeline {
    sampler: InputSampler<Sampling>,
    analog_state: NormalizedInputState,
}

/// Result of one frame of input processing.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameInput {
    pub mode: InputMode,
    pub events_drained: usize,
    pub steer_changed: bool,
}

impl InputPipeline {
    pub fn new(sampler: InputSampler<Sampling>) -> Self {
        Self {
            sampler,
            analog_state: NormalizedInputState::default(),
        }
    }

    pub fn next_frame(&mut self, keys: DigitalKeys) -> FrameInput {
        let (sample, events_drained) = self.sampler.poll(keys);

        let (mode, steer_changed) = match sample {
            RawInputSample::Digital(keys) => (InputMode::Digital(keys), false),
            RawInputSample::Analog(analog) => {
                let previous = std::mem::take(&mut self.analog_state);
                let (next, changed) = advance(previous, &analog);
                if changed {
                    debug!(
                        "Steer {} -> {:.4} ({}%)",
                        next.raw_steer(),
                        next.steer,
                        next.display_percent
                    );
                }
                self.analog_state = next;
                (InputMode::Analog(self.analog_state.clone()), changed)
            }
        };

        FrameInput {
            mode,
            events_drained,
            steer_changed,
        }
    }

    pub fn request_quit(&mut self) {
        self.sampler.apply_event(PlatformEvent::Quit);
    }

    pub fn quit_requested(&self) -> bool {
        self.sampler.quit_requested()
    }

    pub fn release_device(&mut self) {
        self.sampler.release();
    }
}
