use eframe::egui;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const FONT_NAME: &str = "lane-text";

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a usable TrueType or OpenType font: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: ab_glyph::InvalidFont,
    },
}

/// Font file bytes, parsed once at startup before the window exists.
#[derive(Debug)]
pub struct FontAsset {
    bytes: Vec<u8>,
}

impl FontAsset {
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes).map_err(|source| FontError::Format {
            path: path.to_path_buf(),
            source,
        })
    }

    // Same parser egui runs when the font is installed
    fn from_bytes(bytes: Vec<u8>) -> Result<Self, ab_glyph::InvalidFont> {
        ab_glyph::FontRef::try_from_slice_and_index(&bytes, 0)?;
        Ok(Self { bytes })
    }

    /// Makes this font the first choice for proportional text.
    pub fn install(self, ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();
        fonts.font_data.insert(
            FONT_NAME.to_owned(),
            Arc::new(egui::FontData::from_owned(self.bytes)),
        );
        fonts
            .families
            .entry(egui::FontFamily::Proportional)
            .or_default()
            .insert(0, FONT_NAME.to_owned());
        ctx.set_fonts(fonts);
        info!("Installed text font");
    }
}
