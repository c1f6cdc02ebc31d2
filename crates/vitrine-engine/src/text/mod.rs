//! Font loading for the text renderer.

use thiserror::Error;

/// Error returned by [`FontSystem::load_font`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("font load error: {0}")]
pub struct FontLoadError(pub String);

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

/// Owns a collection of loaded fonts.
///
/// Fonts are immutable after loading. The system is passed to
/// [`TextRenderer::render`](crate::render::TextRenderer::render) each frame so
/// glyphs can be rasterized on demand.
#[derive(Default)]
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        Ok(id)
    }

    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }

    /// Distance between consecutive baselines at `size` pixels.
    pub fn line_height(&self, id: FontId, size: f32) -> f32 {
        self.get(id)
            .and_then(|font| font.horizontal_line_metrics(size))
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2)
    }
}
