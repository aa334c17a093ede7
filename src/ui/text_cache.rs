//! Single-entry cache for the rendered steer percentage.

use tracing::{debug, warn};

use super::layout::Rgba;

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("text has zero width")]
    Empty,

    #[error("text rasterization failed: {0}")]
    Rasterize(String),
}

/// Turns a string into something drawable.
pub trait TextRasterizer {
    type Texture;

    fn rasterize(&mut self, text: &str, color: Rgba) -> Result<Self::Texture, TextError>;

    /// Pixel size of a rasterized texture.
    fn size(texture: &Self::Texture) -> (i32, i32);
}

#[derive(Debug)]
pub struct CachedText<T> {
    text: String,
    color: Rgba,
    texture: T,
    width: i32,
    height: i32,
}

impl<T> CachedText<T> {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn texture(&self) -> &T {
        &self.texture
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

/// Holds zero or one rasterized texture.
///
/// A request for a different string (or colour) releases the held texture
/// before rasterizing the new one. If rasterization fails the cache is left
/// empty and the caller skips its text draw for that frame.
pub struct TextCache<R: TextRasterizer> {
    rasterizer: R,
    cached: Option<CachedText<R::Texture>>,
}

impl<R: TextRasterizer> TextCache<R> {
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            cached: None,
        }
    }

    pub fn get_or_create(
        &mut self,
        text: &str,
        color: Rgba,
    ) -> Result<&CachedText<R::Texture>, TextError> {
        if !self.holds(text, color) {
            self.release();
            let texture = self.rasterizer.rasterize(text, color).map_err(|e| {
                warn!("Text \"{}\" failed to load: {}", text, e);
                e
            })?;
            let (width, height) = R::size(&texture);
            debug!("Rasterized \"{}\" at {}x{}", text, width, height);
            self.cached = Some(CachedText {
                text: text.to_string(),
                color,
                texture,
                width,
                height,
            });
        }
        self.cached.as_ref().ok_or(TextError::Empty)
    }

    pub fn cached(&self) -> Option<&CachedText<R::Texture>> {
        self.cached.as_ref()
    }

    /// Drops the held texture, if any.
    pub fn release(&mut self) {
        if let Some(old) = self.cached.take() {
            debug!("Released text texture for \"{}\"", old.text);
        }
    }

    fn holds(&self, text: &str, color: Rgba) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|cached| cached.text == text && cached.color == color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::layout::TEXT;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        rasterized: Cell<usize>,
        released: Cell<usize>,
    }

    struct FakeTexture {
        text: String,
        counters: Rc<Counters>,
    }

    impl Drop for FakeTexture {
        fn drop(&mut self) {
            self.counters.released.set(self.counters.released.get() + 1);
        }
    }

    struct FakeRasterizer {
        counters: Rc<Counters>,
        fail: bool,
    }

    impl TextRasterizer for FakeRasterizer {
        type Texture = FakeTexture;

        fn rasterize(&mut self, text: &str, _color: Rgba) -> Result<FakeTexture, TextError> {
            if self.fail {
                return Err(TextError::Rasterize("glyph missing".to_string()));
            }
            if text.is_empty() {
                return Err(TextError::Empty);
            }
            self.counters
                .rasterized
                .set(self.counters.rasterized.get() + 1);
            Ok(FakeTexture {
                text: text.to_string(),
                counters: Rc::clone(&self.counters),
            })
        }

        fn size(texture: &FakeTexture) -> (i32, i32) {
            (texture.text.len() as i32 * 10, 20)
        }
    }

    fn cache() -> (TextCache<FakeRasterizer>, Rc<Counters>) {
        let counters = Rc::new(Counters::default());
        let rasterizer = FakeRasterizer {
            counters: Rc::clone(&counters),
            fail: false,
        };
        (TextCache::new(rasterizer), counters)
    }

    #[test]
    fn identical_text_is_rasterized_once() {
        let (mut cache, counters) = cache();
        cache.get_or_create("42", TEXT).unwrap();
        cache.get_or_create("42", TEXT).unwrap();
        assert_eq!(counters.rasterized.get(), 1);
        assert_eq!(counters.released.get(), 0);
    }

    #[test]
    fn changed_text_releases_then_recreates_once() {
        let (mut cache, counters) = cache();
        cache.get_or_create("42", TEXT).unwrap();
        let cached = cache.get_or_create("43", TEXT).unwrap();
        assert_eq!(cached.text(), "43");
        assert_eq!((cached.width(), cached.height()), (20, 20));
        assert_eq!(counters.rasterized.get(), 2);
        assert_eq!(counters.released.get(), 1);
    }

    #[test]
    fn failure_leaves_cache_empty() {
        let (mut cache, counters) = cache();
        cache.get_or_create("42", TEXT).unwrap();
        cache.rasterizer.fail = true;
        assert!(matches!(
            cache.get_or_create("43", TEXT),
            Err(TextError::Rasterize(_))
        ));
        assert!(cache.cached().is_none());
        assert_eq!(counters.released.get(), 1);

        cache.rasterizer.fail = false;
        assert_eq!(cache.get_or_create("43", TEXT).unwrap().text(), "43");
    }

    #[test]
    fn empty_text_is_an_error() {
        let (mut cache, _) = cache();
        assert!(matches!(cache.get_or_create("", TEXT), Err(TextError::Empty)));
    }

    #[test]
    fn release_drops_the_texture() {
        let (mut cache, counters) = cache();
        cache.get_or_create("7", TEXT).unwrap();
        cache.release();
        cache.release();
        assert!(cache.cached().is_none());
        assert_eq!(counters.released.get(), 1);
    }

    #[test]
    fn colour_change_invalidates() {
        let (mut cache, counters) = cache();
        cache.get_or_create("7", TEXT).unwrap();
        cache.get_or_create("7", Rgba::new(0, 0, 0, 0xFF)).unwrap();
        assert_eq!(counters.rasterized.get(), 2);
    }
}
