use std::fmt;

use thiserror::Error;

/// Opaque framebuffer handle issued by an [`OffscreenBackend`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FramebufferId(pub u32);

/// Opaque colour texture handle issued by an [`OffscreenBackend`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub u32);

/// Opaque depth/stencil renderbuffer handle issued by an [`OffscreenBackend`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RenderbufferId(pub u32);

/// Size of an offscreen surface in pixels. Both dimensions are at least 1.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SurfaceSize {
    width: u32,
    height: u32,
}

impl SurfaceSize {
    /// Clamps each dimension to at least 1.
    #[inline]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Converts a reported floating-point content area to a surface size.
    ///
    /// Rounds to the nearest pixel and clamps to 1×1; zero, negative and
    /// non-finite extents all become 1.
    pub fn from_available(width: f32, height: f32) -> Self {
        fn px(v: f32) -> u32 {
            if !v.is_finite() || v < 1.0 {
                1
            } else {
                (v + 0.5).min(u32::MAX as f32) as u32
            }
        }
        Self::new(px(width), px(height))
    }

    #[inline]
    pub fn width(self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(self) -> u32 {
        self.height
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Straight-alpha RGBA clear colour.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Attachment consistency of a framebuffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramebufferStatus {
    Complete,
    MissingColor,
    MissingDepthStencil,
    /// An attachment has no storage allocated.
    MissingStorage,
    /// Colour and depth/stencil storage differ in size.
    SizeMismatch,
}

impl FramebufferStatus {
    #[inline]
    pub fn is_complete(self) -> bool {
        self == FramebufferStatus::Complete
    }
}

/// Computes completeness from what is attached and how large its storage is.
///
/// `None` means nothing is attached; `Some(None)` means an attachment with no
/// storage yet.
pub fn attachment_status(
    color: Option<Option<SurfaceSize>>,
    depth_stencil: Option<Option<SurfaceSize>>,
) -> FramebufferStatus {
    let Some(color) = color else {
        return FramebufferStatus::MissingColor;
    };
    let Some(depth_stencil) = depth_stencil else {
        return FramebufferStatus::MissingDepthStencil;
    };
    match (color, depth_stencil) {
        (Some(c), Some(d)) if c == d => FramebufferStatus::Complete,
        (Some(_), Some(_)) => FramebufferStatus::SizeMismatch,
        _ => FramebufferStatus::MissingStorage,
    }
}

/// Failures surfaced by an [`OffscreenBackend`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("unknown {kind} handle {id}")]
    InvalidHandle { kind: &'static str, id: u32 },

    #[error("requested surface {requested} exceeds device limit of {max} pixels per side")]
    SizeExceedsLimit { requested: SurfaceSize, max: u32 },

    #[error("{0}")]
    Unsupported(String),
}

/// Retained-mode GPU command surface consumed by the render-to-texture panel.
///
/// Handles are created empty; storage is allocated (and re-allocated on
/// resize) separately. Re-allocating a handle replaces its previous storage.
/// Binding a framebuffer redirects subsequent clear and draw commands to it;
/// binding `None` restores the default (window) target.
pub trait OffscreenBackend {
    fn create_framebuffer(&mut self) -> Result<FramebufferId, BackendError>;
    fn create_texture(&mut self) -> Result<TextureId, BackendError>;
    fn create_renderbuffer(&mut self) -> Result<RenderbufferId, BackendError>;

    fn delete_framebuffer(&mut self, id: FramebufferId);
    fn delete_texture(&mut self, id: TextureId);
    fn delete_renderbuffer(&mut self, id: RenderbufferId);

    /// Allocates colour storage for `texture`.
    fn allocate_color(&mut self, texture: TextureId, size: SurfaceSize) -> Result<(), BackendError>;

    /// Allocates combined depth/stencil storage for `renderbuffer`.
    fn allocate_depth_stencil(
        &mut self,
        renderbuffer: RenderbufferId,
        size: SurfaceSize,
    ) -> Result<(), BackendError>;

    fn attach_color(&mut self, framebuffer: FramebufferId, texture: TextureId) -> Result<(), BackendError>;

    fn attach_depth_stencil(
        &mut self,
        framebuffer: FramebufferId,
        renderbuffer: RenderbufferId,
    ) -> Result<(), BackendError>;

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus;

    /// Makes `framebuffer` the active render target; `None` selects the default target.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    fn bound_framebuffer(&self) -> Option<FramebufferId>;

    fn set_viewport(&mut self, size: SurfaceSize);

    /// Clears the bound target's colour (and depth/stencil, when present).
    fn clear(&mut self, color: ClearColor);
}
