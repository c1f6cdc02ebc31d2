use std::collections::HashMap;

use super::backend::{
    attachment_status, BackendError, ClearColor, FramebufferId, FramebufferStatus,
    OffscreenBackend, RenderbufferId, SurfaceSize, TextureId,
};
use super::ctx::{RenderCtx, RenderTarget};

/// Colour format of offscreen textures.
pub const OFFSCREEN_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Format of offscreen depth/stencil renderbuffers.
pub const OFFSCREEN_DEPTH_STENCIL_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Depth24PlusStencil8;

struct Storage {
    // Kept alive for the view; dropping it releases the GPU memory.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: SurfaceSize,
}

#[derive(Default)]
struct Attachments {
    color: Option<TextureId>,
    depth_stencil: Option<RenderbufferId>,
}

/// [`OffscreenBackend`] on top of wgpu.
///
/// wgpu has no bindable framebuffer objects, so this type keeps the
/// framebuffer model itself:
/// - textures and renderbuffers are wgpu textures, recreated on allocation
/// - binding a framebuffer opens a command encoder that clear and draw
///   commands record into
/// - unbinding (or binding another framebuffer) submits that encoder
///
/// Scene renderers reach the bound attachments through [`with_target`](Self::with_target).
pub struct WgpuOffscreen {
    device: wgpu::Device,
    queue: wgpu::Queue,
    max_dimension: u32,

    next_id: u32,
    textures: HashMap<u32, Option<Storage>>,
    renderbuffers: HashMap<u32, Option<Storage>>,
    framebuffers: HashMap<u32, Attachments>,

    bound: Option<FramebufferId>,
    viewport: SurfaceSize,
    encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuOffscreen {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
            max_dimension: device.limits().max_texture_dimension_2d,
            next_id: 1,
            textures: HashMap::new(),
            renderbuffers: HashMap::new(),
            framebuffers: HashMap::new(),
            bound: None,
            viewport: SurfaceSize::new(1, 1),
            encoder: None,
        }
    }

    /// Colour view of `texture`, for presenting it.
    pub fn texture_view(&self, texture: TextureId) -> Option<&wgpu::TextureView> {
        self.textures.get(&texture.0)?.as_ref().map(|s| &s.view)
    }

    /// Size of the storage currently backing `texture`.
    pub fn texture_size(&self, texture: TextureId) -> Option<SurfaceSize> {
        self.textures.get(&texture.0)?.as_ref().map(|s| s.size)
    }

    /// Runs `draw` against the bound framebuffer.
    ///
    /// Returns `None` (and does not call `draw`) when no offscreen framebuffer
    /// is bound or its attachments are missing.
    pub fn with_target<R, F>(&mut self, draw: F) -> Option<R>
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>) -> R,
    {
        let framebuffer = self.bound?;
        let (color, depth_stencil) = attachment_views(
            &self.framebuffers,
            &self.textures,
            &self.renderbuffers,
            framebuffer,
        )?;
        let encoder = self.encoder.as_mut()?;

        let mut ctx = RenderCtx::new(&self.device, &self.queue, OFFSCREEN_COLOR_FORMAT, self.viewport);
        let mut target = RenderTarget::new(encoder, color);
        if let Some(view) = depth_stencil {
            ctx = ctx.with_depth_stencil(OFFSCREEN_DEPTH_STENCIL_FORMAT);
            target = target.with_depth_stencil(view);
        }

        Some(draw(&ctx, &mut target))
    }

    fn issue_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    fn create_storage(
        &self,
        label: &'static str,
        size: SurfaceSize,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Result<Storage, BackendError> {
        if size.width() > self.max_dimension || size.height() > self.max_dimension {
            return Err(BackendError::SizeExceedsLimit {
                requested: size,
                max: self.max_dimension,
            });
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width(),
                height: size.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Storage {
            _texture: texture,
            view,
            size,
        })
    }

    fn submit_pending(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }
}

impl OffscreenBackend for WgpuOffscreen {
    fn create_framebuffer(&mut self) -> Result<FramebufferId, BackendError> {
        let id = self.issue_id();
        self.framebuffers.insert(id, Attachments::default());
        Ok(FramebufferId(id))
    }

    fn create_texture(&mut self) -> Result<TextureId, BackendError> {
        let id = self.issue_id();
        self.textures.insert(id, None);
        Ok(TextureId(id))
    }

    fn create_renderbuffer(&mut self) -> Result<RenderbufferId, BackendError> {
        let id = self.issue_id();
        self.renderbuffers.insert(id, None);
        Ok(RenderbufferId(id))
    }

    fn delete_framebuffer(&mut self, id: FramebufferId) {
        if self.bound == Some(id) {
            self.bind_framebuffer(None);
        }
        self.framebuffers.remove(&id.0);
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.textures.remove(&id.0);
    }

    fn delete_renderbuffer(&mut self, id: RenderbufferId) {
        self.renderbuffers.remove(&id.0);
    }

    fn allocate_color(&mut self, texture: TextureId, size: SurfaceSize) -> Result<(), BackendError> {
        if !self.textures.contains_key(&texture.0) {
            return Err(BackendError::InvalidHandle { kind: "texture", id: texture.0 });
        }
        let storage = self.create_storage(
            "vitrine offscreen color",
            size,
            OFFSCREEN_COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        )?;
        // Replaces (and drops) the previous storage.
        self.textures.insert(texture.0, Some(storage));
        Ok(())
    }

    fn allocate_depth_stencil(
        &mut self,
        renderbuffer: RenderbufferId,
        size: SurfaceSize,
    ) -> Result<(), BackendError> {
        if !self.renderbuffers.contains_key(&renderbuffer.0) {
            return Err(BackendError::InvalidHandle {
                kind: "renderbuffer",
                id: renderbuffer.0,
            });
        }
        let storage = self.create_storage(
            "vitrine offscreen depth/stencil",
            size,
            OFFSCREEN_DEPTH_STENCIL_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )?;
        self.renderbuffers.insert(renderbuffer.0, Some(storage));
        Ok(())
    }

    fn attach_color(&mut self, framebuffer: FramebufferId, texture: TextureId) -> Result<(), BackendError> {
        if !self.textures.contains_key(&texture.0) {
            return Err(BackendError::InvalidHandle { kind: "texture", id: texture.0 });
        }
        let fb = self
            .framebuffers
            .get_mut(&framebuffer.0)
            .ok_or(BackendError::InvalidHandle { kind: "framebuffer", id: framebuffer.0 })?;
        fb.color = Some(texture);
        Ok(())
    }

    fn attach_depth_stencil(
        &mut self,
        framebuffer: FramebufferId,
        renderbuffer: RenderbufferId,
    ) -> Result<(), BackendError> {
        if !self.renderbuffers.contains_key(&renderbuffer.0) {
            return Err(BackendError::InvalidHandle {
                kind: "renderbuffer",
                id: renderbuffer.0,
            });
        }
        let fb = self
            .framebuffers
            .get_mut(&framebuffer.0)
            .ok_or(BackendError::InvalidHandle { kind: "framebuffer", id: framebuffer.0 })?;
        fb.depth_stencil = Some(renderbuffer);
        Ok(())
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        let Some(fb) = self.framebuffers.get(&framebuffer.0) else {
            return FramebufferStatus::MissingColor;
        };
        let color = fb.color.map(|id| {
            self.textures.get(&id.0).and_then(|s| s.as_ref()).map(|s| s.size)
        });
        let depth_stencil = fb.depth_stencil.map(|id| {
            self.renderbuffers.get(&id.0).and_then(|s| s.as_ref()).map(|s| s.size)
        });
        attachment_status(color, depth_stencil)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        if self.bound == framebuffer {
            return;
        }
        self.submit_pending();
        self.bound = framebuffer;

        if framebuffer.is_some() {
            self.encoder = Some(self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vitrine offscreen encoder"),
            }));
        }
    }

    fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.bound
    }

    fn set_viewport(&mut self, size: SurfaceSize) {
        self.viewport = size;
    }

    fn clear(&mut self, color: ClearColor) {
        let Some(framebuffer) = self.bound else { return };
        let Some((color_view, depth_stencil)) = attachment_views(
            &self.framebuffers,
            &self.textures,
            &self.renderbuffers,
            framebuffer,
        ) else {
            return;
        };
        let Some(encoder) = self.encoder.as_mut() else { return };

        let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vitrine offscreen clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: depth_stencil.map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}

impl Drop for WgpuOffscreen {
    fn drop(&mut self) {
        self.submit_pending();
    }
}

fn attachment_views<'a>(
    framebuffers: &HashMap<u32, Attachments>,
    textures: &'a HashMap<u32, Option<Storage>>,
    renderbuffers: &'a HashMap<u32, Option<Storage>>,
    framebuffer: FramebufferId,
) -> Option<(&'a wgpu::TextureView, Option<&'a wgpu::TextureView>)> {
    let fb = framebuffers.get(&framebuffer.0)?;
    let color = textures.get(&fb.color?.0)?.as_ref()?;
    let depth_stencil = fb
        .depth_stencil
        .and_then(|id| renderbuffers.get(&id.0))
        .and_then(|s| s.as_ref())
        .map(|s| &s.view);
    Some((&color.view, depth_stencil))
}
