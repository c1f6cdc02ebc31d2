//! Recording backend for tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::backend::{
    attachment_status, BackendError, ClearColor, FramebufferId, FramebufferStatus,
    OffscreenBackend, RenderbufferId, SurfaceSize, TextureId,
};

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    next_id: u32,
    pub framebuffers: HashMap<u32, (Option<TextureId>, Option<RenderbufferId>)>,
    pub textures: HashMap<u32, Option<SurfaceSize>>,
    pub renderbuffers: HashMap<u32, Option<SurfaceSize>>,

    pub bound: Option<FramebufferId>,
    pub viewport: Option<SurfaceSize>,
    pub clears: Vec<(Option<FramebufferId>, ClearColor)>,
    pub draws: Vec<Option<FramebufferId>>,

    pub color_allocations: usize,
    pub depth_allocations: usize,
    pub creations: usize,

    /// Allocations with a side above this fail.
    pub max_dimension: Option<u32>,
    /// Makes every `create_*` call fail.
    pub fail_create: bool,
    /// Makes `allocate_color` fail; depth/stencil allocation still succeeds.
    pub fail_color_alloc: bool,
    /// Status reported for every framebuffer regardless of its attachments.
    pub forced_status: Option<FramebufferStatus>,
}

impl FakeState {
    /// Number of live objects of every kind.
    pub fn live_objects(&self) -> usize {
        self.framebuffers.len() + self.textures.len() + self.renderbuffers.len()
    }

    pub fn texture_size(&self, id: TextureId) -> Option<SurfaceSize> {
        self.textures.get(&id.0).copied().flatten()
    }

    /// Storage size of the depth/stencil renderbuffer attached to `framebuffer`.
    pub fn depth_size(&self, framebuffer: FramebufferId) -> Option<SurfaceSize> {
        let (_, depth) = self.framebuffers.get(&framebuffer.0)?;
        self.renderbuffers.get(&depth.as_ref()?.0).copied().flatten()
    }

    fn issue(&mut self) -> Result<u32, BackendError> {
        if self.fail_create {
            return Err(BackendError::Unsupported("object creation disabled".into()));
        }
        self.next_id += 1;
        self.creations += 1;
        Ok(self.next_id)
    }

    fn check_size(&self, size: SurfaceSize) -> Result<(), BackendError> {
        match self.max_dimension {
            Some(max) if size.width() > max || size.height() > max => {
                Err(BackendError::SizeExceedsLimit { requested: size, max })
            }
            _ => Ok(()),
        }
    }
}

/// In-memory [`OffscreenBackend`] whose state stays observable after the
/// owner drops it.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stands in for a scene draw call against the bound target.
    pub fn draw(&mut self) {
        let mut st = self.state.lock();
        let bound = st.bound;
        st.draws.push(bound);
    }
}

impl OffscreenBackend for FakeBackend {
    fn create_framebuffer(&mut self) -> Result<FramebufferId, BackendError> {
        let mut st = self.state.lock();
        let id = st.issue()?;
        st.framebuffers.insert(id, (None, None));
        Ok(FramebufferId(id))
    }

    fn create_texture(&mut self) -> Result<TextureId, BackendError> {
        let mut st = self.state.lock();
        let id = st.issue()?;
        st.textures.insert(id, None);
        Ok(TextureId(id))
    }

    fn create_renderbuffer(&mut self) -> Result<RenderbufferId, BackendError> {
        let mut st = self.state.lock();
        let id = st.issue()?;
        st.renderbuffers.insert(id, None);
        Ok(RenderbufferId(id))
    }

    fn delete_framebuffer(&mut self, id: FramebufferId) {
        let mut st = self.state.lock();
        if st.bound == Some(id) {
            st.bound = None;
        }
        st.framebuffers.remove(&id.0);
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.state.lock().textures.remove(&id.0);
    }

    fn delete_renderbuffer(&mut self, id: RenderbufferId) {
        self.state.lock().renderbuffers.remove(&id.0);
    }

    fn allocate_color(&mut self, texture: TextureId, size: SurfaceSize) -> Result<(), BackendError> {
        let mut st = self.state.lock();
        st.check_size(size)?;
        if st.fail_color_alloc {
            return Err(BackendError::Unsupported("colour allocation disabled".into()));
        }
        let slot = st
            .textures
            .get_mut(&texture.0)
            .ok_or(BackendError::InvalidHandle { kind: "texture", id: texture.0 })?;
        *slot = Some(size);
        st.color_allocations += 1;
        Ok(())
    }

    fn allocate_depth_stencil(
        &mut self,
        renderbuffer: RenderbufferId,
        size: SurfaceSize,
    ) -> Result<(), BackendError> {
        let mut st = self.state.lock();
        st.check_size(size)?;
        let slot = st
            .renderbuffers
            .get_mut(&renderbuffer.0)
            .ok_or(BackendError::InvalidHandle { kind: "renderbuffer", id: renderbuffer.0 })?;
        *slot = Some(size);
        st.depth_allocations += 1;
        Ok(())
    }

    fn attach_color(&mut self, framebuffer: FramebufferId, texture: TextureId) -> Result<(), BackendError> {
        let mut st = self.state.lock();
        let fb = st
            .framebuffers
            .get_mut(&framebuffer.0)
            .ok_or(BackendError::InvalidHandle { kind: "framebuffer", id: framebuffer.0 })?;
        fb.0 = Some(texture);
        Ok(())
    }

    fn attach_depth_stencil(
        &mut self,
        framebuffer: FramebufferId,
        renderbuffer: RenderbufferId,
    ) -> Result<(), BackendError> {
        let mut st = self.state.lock();
        let fb = st
            .framebuffers
            .get_mut(&framebuffer.0)
            .ok_or(BackendError::InvalidHandle { kind: "framebuffer", id: framebuffer.0 })?;
        fb.1 = Some(renderbuffer);
        Ok(())
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        let st = self.state.lock();
        if let Some(status) = st.forced_status {
            return status;
        }
        let Some(&(color, depth)) = st.framebuffers.get(&framebuffer.0) else {
            return FramebufferStatus::MissingColor;
        };
        attachment_status(
            color.map(|id| st.textures.get(&id.0).copied().flatten()),
            depth.map(|id| st.renderbuffers.get(&id.0).copied().flatten()),
        )
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.state.lock().bound = framebuffer;
    }

    fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.state.lock().bound
    }

    fn set_viewport(&mut self, size: SurfaceSize) {
        self.state.lock().viewport = Some(size);
    }

    fn clear(&mut self, color: ClearColor) {
        let mut st = self.state.lock();
        let bound = st.bound;
        st.clears.push((bound, color));
    }
}
