//! Steer normalization with change detection.
//!
//! Raw steer values are divided by `i16::MAX`, so the positive extreme maps
//! exactly to `1.0`. The negative extreme `-32768` lands one step beyond
//! `-1.0` and is clamped back onto it; `-32767` and `-32768` therefore both
//! normalize to `-1.0`.

use super::{AnalogSample, TRIGGER_RELEASED};

/// Divisor applied to raw steer values.
pub const STEER_DIVISOR: f32 = i16::MAX as f32;

/// Normalized quantities the lane layout draws from.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedInputState {
    /// Signed steer magnitude in `[-1.0, 1.0]`.
    pub steer: f32,
    pub left_trigger_active: bool,
    pub right_trigger_active: bool,
    /// Integer percentage of `|steer|`, 0 to 100.
    pub display_percent: String,
    raw_steer: i16,
}

impl Default for NormalizedInputState {
    fn default() -> Self {
        Self {
            steer: 0.0,
            left_trigger_active: false,
            right_trigger_active: false,
            display_percent: percent_text(0.0),
            raw_steer: 0,
        }
    }
}

impl NormalizedInputState {
    /// Raw steer value the current `steer` was derived from.
    pub fn raw_steer(&self) -> i16 {
        self.raw_steer
    }
}

/// Maps a raw axis reading onto `[-1.0, 1.0]`.
pub fn normalize_steer(raw: i16) -> f32 {
    (f32::from(raw) / STEER_DIVISOR).clamp(-1.0, 1.0)
}

/// Rounded magnitude of `steer` as a percentage string.
pub fn percent_text(steer: f32) -> String {
    let percent = (steer.abs().min(1.0) * 100.0).round() as u8;
    percent.to_string()
}

/// Advances the normalized state by one sample.
///
/// Trigger flags follow the sample every frame. Steer and its text are only
/// recomputed when the raw steer value differs from the one `previous` was
/// built from; otherwise they are carried over untouched. The returned flag
/// reports whether steer was recomputed.
pub fn advance(
    previous: NormalizedInputState,
    sample: &AnalogSample,
) -> (NormalizedInputState, bool) {
    let mut next = previous;
    next.left_trigger_active = sample.left_trigger_raw != TRIGGER_RELEASED;
    next.right_trigger_active = sample.right_trigger_raw != TRIGGER_RELEASED;

    if sample.steer_raw == next.raw_steer {
        return (next, false);
    }

    next.raw_steer = sample.steer_raw;
    next.steer = normalize_steer(sample.steer_raw);
    next.display_percent = percent_text(next.steer);
    (next, true)
}
