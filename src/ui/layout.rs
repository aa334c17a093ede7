//! Lane geometry.
//!
//! The window is split into three vertical lanes of width `⌊w/3⌋ + 1`. The
//! outer lanes show steering, the centre lane is cut in half at mid-height
//! into forward (top) and back (bottom). [`layout`] is a pure function from
//! window size and per-frame input to an ordered list of draw commands.

use crate::controller::{DigitalKeys, InputMode, NormalizedInputState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

pub const BACKGROUND: Rgba = Rgba::new(0x66, 0x66, 0x66, 0xFF);
pub const FILL: Rgba = Rgba::new(0xFF, 0x33, 0x99, 0xFF);
pub const OVERLAY: Rgba = Rgba::new(0xFF, 0xFF, 0xFF, 0xFF);
pub const TEXT: Rgba = Rgba::new(0xFF, 0xFF, 0xFF, 0xFF);

/// Axis-aligned rectangle in window pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl LaneRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// Point a text block is centred on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextAnchor {
    pub x: i32,
    pub y: i32,
}

impl TextAnchor {
    /// Rectangle of a `width` x `height` text block centred on the anchor.
    pub fn place(&self, width: i32, height: i32) -> LaneRect {
        LaneRect::new(self.x - width / 2, self.y - height / 2, width, height)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    FillRect { rect: LaneRect, color: Rgba },
    OutlineRect { rect: LaneRect, color: Rgba },
    Line { from: (i32, i32), to: (i32, i32), color: Rgba },
    Text { text: String, anchor: TextAnchor, color: Rgba },
}

/// Lane measurements for one window size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneGeometry {
    pub width: i32,
    pub height: i32,
    pub lane_width: i32,
    pub half_height: i32,
}

impl LaneGeometry {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            lane_width: width / 3 + 1,
            half_height: height / 2,
        }
    }

    pub fn forward(&self) -> LaneRect {
        LaneRect::new(self.lane_width, 0, self.lane_width, self.half_height)
    }

    pub fn back(&self) -> LaneRect {
        LaneRect::new(
            self.lane_width,
            self.half_height,
            self.lane_width,
            self.half_height,
        )
    }

    pub fn left_lane(&self) -> LaneRect {
        LaneRect::new(0, 0, self.lane_width, self.height)
    }

    // Overlaps the centre lane by one pixel
    pub fn right_lane(&self) -> LaneRect {
        LaneRect::new(self.lane_width * 2 - 1, 0, self.lane_width, self.height)
    }

    /// Steer fill growing leftwards from the centre lane, or rightwards into
    /// the right lane. `None` when steer is exactly zero.
    pub fn steer_fill(&self, steer: f32) -> Option<LaneRect> {
        let w = fill_width(self.lane_width, steer);
        if steer < 0.0 {
            Some(LaneRect::new(self.lane_width - w, 0, w, self.height))
        } else if steer > 0.0 {
            Some(LaneRect::new(self.lane_width * 2, 0, w, self.height))
        } else {
            None
        }
    }

    /// Centre of the half lane that holds the steer percentage.
    pub fn steer_text_anchor(&self, steer: f32) -> Option<TextAnchor> {
        let x = if steer < 0.0 {
            self.lane_width / 2
        } else if steer > 0.0 {
            self.width - self.lane_width / 2
        } else {
            return None;
        };
        Some(TextAnchor {
            x,
            y: self.half_height,
        })
    }

    /// Borders, centre lane outline and centre line, drawn every frame.
    pub fn overlay(&self) -> [DrawCommand; 4] {
        let (w, h) = (self.width, self.height);
        [
            DrawCommand::OutlineRect {
                rect: LaneRect::new(0, 0, w - 1, h),
                color: OVERLAY,
            },
            DrawCommand::OutlineRect {
                rect: LaneRect::new(1, 1, w - 3, h - 2),
                color: OVERLAY,
            },
            DrawCommand::OutlineRect {
                rect: LaneRect::new(self.lane_width, 0, self.lane_width, h),
                color: OVERLAY,
            },
            DrawCommand::Line {
                from: (self.lane_width, self.half_height),
                to: (self.lane_width * 2 - 1, self.half_height),
                color: OVERLAY,
            },
        ]
    }
}

/// Width of the steer fill for a lane of `lane_width` pixels.
pub fn fill_width(lane_width: i32, steer: f32) -> i32 {
    (lane_width as f32 * steer.abs().min(1.0)).round() as i32
}

/// Builds the frame's draw commands in paint order.
pub fn layout(width: i32, height: i32, input: &InputMode) -> Vec<DrawCommand> {
    let geometry = LaneGeometry::new(width, height);
    let mut commands = vec![DrawCommand::Clear(BACKGROUND)];

    match input {
        InputMode::Digital(keys) => digital_fills(&geometry, keys, &mut commands),
        InputMode::Analog(state) => analog_fills(&geometry, state, &mut commands),
    }

    commands.extend(geometry.overlay());
    commands
}

fn digital_fills(geometry: &LaneGeometry, keys: &DigitalKeys, commands: &mut Vec<DrawCommand>) {
    let pressed = [
        (keys.forward, geometry.forward()),
        (keys.left, geometry.left_lane()),
        (keys.back, geometry.back()),
        (keys.right, geometry.right_lane()),
    ];
    commands.extend(
        pressed
            .into_iter()
            .filter(|(down, _)| *down)
            .map(|(_, rect)| DrawCommand::FillRect { rect, color: FILL }),
    );
}

fn analog_fills(
    geometry: &LaneGeometry,
    state: &NormalizedInputState,
    commands: &mut Vec<DrawCommand>,
) {
    if state.left_trigger_active {
        commands.push(DrawCommand::FillRect {
            rect: geometry.back(),
            color: FILL,
        });
    }
    if state.right_trigger_active {
        commands.push(DrawCommand::FillRect {
            rect: geometry.forward(),
            color: FILL,
        });
    }

    let Some(rect) = geometry.steer_fill(state.steer) else {
        return;
    };
    commands.push(DrawCommand::FillRect { rect, color: FILL });

    if state.display_percent != "0" {
        if let Some(anchor) = geometry.steer_text_anchor(state.steer) {
            commands.push(DrawCommand::Text {
                text: state.display_percent.clone(),
                anchor,
                color: TEXT,
            });
        }
    }
}
