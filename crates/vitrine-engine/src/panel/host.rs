use crate::render::{SurfaceSize, TextureId};

use super::aspect::AspectRatio;

/// Floating-point panel extent as reported by the GUI layer.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct PanelSize {
    pub width: f32,
    pub height: f32,
}

impl PanelSize {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl From<SurfaceSize> for PanelSize {
    fn from(size: SurfaceSize) -> Self {
        Self::new(size.width() as f32, size.height() as f32)
    }
}

/// GUI layer hosting render-to-texture panels.
///
/// Panels are addressed by title. A host lays panels out, reports how much
/// content area each one gets and displays their colour textures.
pub trait PanelHost {
    /// Asks the host to keep the panel's content area at `aspect`.
    ///
    /// Hosts without layout constraints may ignore this.
    fn set_size_constraint(&mut self, title: &str, aspect: AspectRatio) {
        let _ = (title, aspect);
    }

    /// Content area currently available to the panel.
    fn available_size(&mut self, title: &str) -> PanelSize;

    /// Displays `texture` inside the panel at `size`.
    fn show_image(&mut self, title: &str, texture: TextureId, size: PanelSize);
}
