//! Draws [`DrawCommand`]s through egui.

use eframe::egui::{
    self, Color32, CornerRadius, FontId, Galley, Painter, Pos2, Rect, Stroke, StrokeKind, Vec2,
};
use std::sync::Arc;
use tracing::trace;

use super::layout::{DrawCommand, LaneRect, Rgba};
use super::text_cache::{TextCache, TextError, TextRasterizer};

/// Lays out text with egui's font system.
pub struct GalleyRasterizer {
    ctx: egui::Context,
    font: FontId,
}

impl GalleyRasterizer {
    pub fn new(ctx: egui::Context, font_size: f32) -> Self {
        Self {
            ctx,
            font: FontId::proportional(font_size),
        }
    }
}

impl TextRasterizer for GalleyRasterizer {
    type Texture = Arc<Galley>;

    fn rasterize(&mut self, text: &str, color: Rgba) -> Result<Arc<Galley>, TextError> {
        if text.is_empty() {
            return Err(TextError::Empty);
        }
        let galley = self.ctx.fonts(|fonts| {
            fonts.layout_no_wrap(text.to_owned(), self.font.clone(), to_color32(color))
        });
        if galley.size().x <= 0.0 {
            return Err(TextError::Rasterize(format!(
                "no glyphs laid out for {:?}",
                text
            )));
        }
        Ok(galley)
    }

    fn size(texture: &Arc<Galley>) -> (i32, i32) {
        let size = texture.size();
        (size.x.round() as i32, size.y.round() as i32)
    }
}

pub fn to_color32(color: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn to_rect(rect: &LaneRect) -> Rect {
    Rect::from_min_size(
        Pos2::new(rect.x as f32, rect.y as f32),
        Vec2::new(rect.w as f32, rect.h as f32),
    )
}

// Pixels covered by an axis-aligned line, both endpoints included
fn line_span((x0, y0): (i32, i32), (x1, y1): (i32, i32)) -> Rect {
    Rect::from_min_size(
        Pos2::new(x0.min(x1) as f32, y0.min(y1) as f32),
        Vec2::new(
            ((x1 - x0).abs() + 1) as f32,
            ((y1 - y0).abs() + 1) as f32,
        ),
    )
}

/// Paints one frame. A text command whose texture cannot be produced is
/// skipped for this frame only.
pub fn paint(
    painter: &Painter,
    commands: &[DrawCommand],
    text_cache: &mut TextCache<GalleyRasterizer>,
) {
    for command in commands {
        match command {
            DrawCommand::Clear(color) => {
                painter.rect_filled(
                    painter.ctx().screen_rect(),
                    CornerRadius::ZERO,
                    to_color32(*color),
                );
            }
            DrawCommand::FillRect { rect, color } => {
                painter.rect_filled(to_rect(rect), CornerRadius::ZERO, to_color32(*color));
            }
            DrawCommand::OutlineRect { rect, color } => {
                painter.rect_stroke(
                    to_rect(rect),
                    CornerRadius::ZERO,
                    Stroke::new(1.0, to_color32(*color)),
                    StrokeKind::Inside,
                );
            }
            DrawCommand::Line { from, to, color } => {
                painter.rect_filled(
                    line_span(*from, *to),
                    CornerRadius::ZERO,
                    to_color32(*color),
                );
            }
            DrawCommand::Text {
                text,
                anchor,
                color,
            } => {
                let Ok(cached) = text_cache.get_or_create(text, *color) else {
                    trace!("Skipping text draw for \"{}\" this frame", text);
                    continue;
                };
                let placed = anchor.place(cached.width(), cached.height());
                painter.galley(
                    Pos2::new(placed.x as f32, placed.y as f32),
                    Arc::clone(cached.texture()),
                    to_color32(*color),
                );
            }
        }
    }
}
