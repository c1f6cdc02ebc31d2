use crate::render::RenderTarget;

/// A single acquired swapchain frame.
///
/// Short-lived: holding the surface texture blocks acquisition of the next
/// frame. Hand it back to [`Gpu::submit`](super::Gpu::submit) promptly.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    /// Render target over the swapchain view (no depth/stencil).
    #[inline]
    pub fn target(&mut self) -> RenderTarget<'_> {
        RenderTarget::new(&mut self.encoder, &self.view)
    }
}
