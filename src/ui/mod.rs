//! # Lane visualizer window
//!
//! Hosts the per-frame pipeline inside eframe:
//!
//! ```text
//! sample ──► normalize ──► layout ──► paint (+ text cache) ──► present
//! ```
//!
//! [`LaneInputsUI`] is the application context. It owns every resource the
//! frame loop touches (input pipeline with its device handle, text cache) and
//! releases them in reverse order of acquisition when dropped.

pub mod fonts;
pub mod layout;
pub mod painter;
pub mod text_cache;

use chrono::{DateTime, Duration, Local};
use eframe::egui::{self, Key};
use tracing::{debug, info};

use crate::config::DisplayConfig;
use crate::controller::{DigitalKeys, GamepadBackend, InputPipeline, InputSampler};

use self::fonts::FontAsset;
use self::painter::GalleyRasterizer;
use self::text_cache::TextCache;

pub const WINDOW_TITLE: &str = "laneinputs";

const STATS_INTERVAL_SECS: i64 = 10;

/// Viewport and renderer options derived from the config.
pub fn native_options(config: &DisplayConfig) -> eframe::NativeOptions {
    let mut viewport = egui::ViewportBuilder::default()
        .with_title(WINDOW_TITLE)
        .with_inner_size([config.window_width as f32, config.window_height as f32])
        .with_resizable(false)
        .with_decorations(!config.borderless);
    if config.always_on_top {
        viewport = viewport.with_window_level(egui::WindowLevel::AlwaysOnTop);
    }

    eframe::NativeOptions {
        viewport,
        vsync: config.vsync,
        ..Default::default()
    }
}

// Frame and event counters, logged periodically
struct FrameStats {
    frames: u64,
    events: u64,
    last_log_time: DateTime<Local>,
}

// Measured over the real elapsed time; a stalled frame loop stretches it
fn per_second(count: u64, elapsed: Duration) -> f64 {
    let millis = elapsed.num_milliseconds();
    if millis <= 0 {
        return 0.0;
    }
    count as f64 * 1000.0 / millis as f64
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frames: 0,
            events: 0,
            last_log_time: Local::now(),
        }
    }

    fn record(&mut self, events: usize) {
        self.frames += 1;
        self.events += events as u64;

        let now = Local::now();
        let elapsed = now - self.last_log_time;
        if elapsed > Duration::seconds(STATS_INTERVAL_SECS) {
            debug!(
                "Frame stats: {} frames, {} platform events in last {:.1} seconds (avg {:.1} fps)",
                self.frames,
                self.events,
                elapsed.num_milliseconds() as f64 / 1000.0,
                per_second(self.frames, elapsed)
            );
            self.frames = 0;
            self.events = 0;
            self.last_log_time = now;
        }
    }
}

pub struct LaneInputsUI {
    config: DisplayConfig,

    /// Sampler, device handle and carried-over normalized state
    pipeline: InputPipeline,

    /// Holds the rendered steer percentage between frames
    text_cache: TextCache<GalleyRasterizer>,

    stats: FrameStats,
}

impl LaneInputsUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: DisplayConfig,
        font: FontAsset,
        backend: Box<dyn GamepadBackend>,
    ) -> Self {
        font.install(&cc.egui_ctx);

        let sampler = InputSampler::create(backend, &config).initialize();
        let rasterizer = GalleyRasterizer::new(cc.egui_ctx.clone(), config.font_size as f32);

        info!(
            "Window ready: {}x{}",
            config.window_width, config.window_height
        );
        Self {
            config,
            pipeline: InputPipeline::new(sampler),
            text_cache: TextCache::new(rasterizer),
            stats: FrameStats::new(),
        }
    }
}

fn sample_keys(ctx: &egui::Context) -> DigitalKeys {
    ctx.input(|i| DigitalKeys {
        forward: i.key_down(Key::W) || i.key_down(Key::ArrowUp),
        left: i.key_down(Key::A) || i.key_down(Key::ArrowLeft),
        back: i.key_down(Key::S) || i.key_down(Key::Space) || i.key_down(Key::ArrowDown),
        right: i.key_down(Key::D) || i.key_down(Key::ArrowRight),
    })
}

impl eframe::App for LaneInputsUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.pipeline.request_quit();
        }

        let frame_input = self.pipeline.next_frame(sample_keys(ctx));
        let commands = layout::layout(
            self.config.window_width,
            self.config.window_height,
            &frame_input.mode,
        );

        let painter = ctx.layer_painter(egui::LayerId::background());
        painter::paint(&painter, &commands, &mut self.text_cache);
        self.stats.record(frame_input.events_drained);

        // Quit takes effect after this frame has been drawn
        if self.pipeline.quit_requested() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        } else {
            ctx.request_repaint();
        }
    }
}

impl Drop for LaneInputsUI {
    fn drop(&mut self) {
        info!("Shutting down visualizer");
        self.pipeline.release_device();
        self.text_cache.release();
    }
}
