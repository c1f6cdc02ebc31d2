use super::backend::SurfaceSize;

/// Renderer-facing context (device/queue + target formats + viewport).
///
/// This is intentionally small and stable.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub color_format: wgpu::TextureFormat,
    /// Format of the depth/stencil attachment, if the target has one.
    pub depth_stencil_format: Option<wgpu::TextureFormat>,
    pub viewport: SurfaceSize, // physical px
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        color_format: wgpu::TextureFormat,
        viewport: SurfaceSize,
    ) -> Self {
        Self {
            device,
            queue,
            color_format,
            depth_stencil_format: None,
            viewport,
        }
    }

    #[inline]
    pub fn with_depth_stencil(mut self, format: wgpu::TextureFormat) -> Self {
        self.depth_stencil_format = Some(format);
        self
    }
}

/// Target for drawing (encoder + color view, optionally depth/stencil).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub depth_stencil_view: Option<&'a wgpu::TextureView>,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self {
            encoder,
            color_view,
            depth_stencil_view: None,
        }
    }

    #[inline]
    pub fn with_depth_stencil(mut self, view: &'a wgpu::TextureView) -> Self {
        self.depth_stencil_view = Some(view);
        self
    }
}
