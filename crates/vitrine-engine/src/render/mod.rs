//! GPU rendering subsystem.
//!
//! [`OffscreenBackend`] is the retained command surface the panel module
//! drives; [`WgpuOffscreen`] implements it on wgpu. Renderers own their GPU
//! resources (pipelines, buffers) and draw through a [`RenderCtx`] /
//! [`RenderTarget`] pair.
//!
//! Convention:
//! - geometry is in physical pixels (top-left origin, +Y down)
//! - vertex shaders convert to NDC using a viewport uniform

mod backend;
mod common;
mod ctx;
mod image;
mod text;
mod wgpu_backend;

#[cfg(test)]
pub(crate) mod fake;

pub use backend::{
    attachment_status, BackendError, ClearColor, FramebufferId, FramebufferStatus,
    OffscreenBackend, RenderbufferId, SurfaceSize, TextureId,
};
pub use ctx::{RenderCtx, RenderTarget};
pub use image::{ImageDraw, ImageRect, ImageRenderer};
pub use text::{TextRenderer, TextRun};
pub use wgpu_backend::{WgpuOffscreen, OFFSCREEN_COLOR_FORMAT, OFFSCREEN_DEPTH_STENCIL_FORMAT};
