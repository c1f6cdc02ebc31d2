use crate::render::{FramebufferId, OffscreenBackend, SurfaceSize};

use super::render_panel::RenderToTexturePanel;

struct Bracket {
    previous: Option<FramebufferId>,
    size: SurfaceSize,
}

/// An in-progress capture into a [`RenderToTexturePanel`].
///
/// While active, the panel's framebuffer is bound and everything drawn
/// through [`backend`](Self::backend) lands in the panel. Ending or dropping
/// the guard rebinds whatever target was bound before `begin`.
pub struct Capture<'a, B: OffscreenBackend> {
    panel: &'a mut RenderToTexturePanel<B>,
    bracket: Option<Bracket>,
}

impl<'a, B: OffscreenBackend> Capture<'a, B> {
    pub(super) fn active(
        panel: &'a mut RenderToTexturePanel<B>,
        previous: Option<FramebufferId>,
        size: SurfaceSize,
    ) -> Self {
        Self {
            panel,
            bracket: Some(Bracket { previous, size }),
        }
    }

    pub(super) fn inactive(panel: &'a mut RenderToTexturePanel<B>) -> Self {
        Self {
            panel,
            bracket: None,
        }
    }

    /// Whether the panel's framebuffer is bound.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.bracket.is_some()
    }

    /// Surface size of this capture; `None` when inactive.
    #[inline]
    pub fn size(&self) -> Option<SurfaceSize> {
        self.bracket.as_ref().map(|b| b.size)
    }

    /// The backend with the panel's framebuffer bound; `None` when inactive.
    pub fn backend(&mut self) -> Option<&mut B> {
        if self.bracket.is_some() {
            Some(&mut self.panel.backend)
        } else {
            None
        }
    }

    /// Ends the capture and restores the previous target.
    pub fn end(self) {}
}

impl<B: OffscreenBackend> Drop for Capture<'_, B> {
    fn drop(&mut self) {
        if let Some(bracket) = self.bracket.take() {
            self.panel.backend.bind_framebuffer(bracket.previous);
        }
    }
}
