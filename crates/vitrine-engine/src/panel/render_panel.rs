use std::sync::Arc;

use crate::logging::Level;
use crate::render::{
    ClearColor, FramebufferId, OffscreenBackend, RenderbufferId, SurfaceSize, TextureId,
};

use super::aspect::AspectRatio;
use super::capture::Capture;
use super::error::PanelError;
use super::host::{PanelHost, PanelSize};
use super::report::{ErrorReporter, FacadeReporter};

/// Panel settings.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub title: String,
    pub clear_color: ClearColor,
    pub aspect: AspectRatio,
}

impl PanelConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            clear_color: ClearColor::BLACK,
            aspect: AspectRatio::Unconstrained,
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct Resources {
    framebuffer: FramebufferId,
    color: TextureId,
    depth_stencil: RenderbufferId,
}

/// A titled GUI panel whose content is rendered offscreen.
///
/// Each frame:
/// 1. [`begin`](Self::begin) (or [`capture`](Self::capture)) redirects
///    rendering into the panel's framebuffer, sized to the panel's content
///    area.
/// 2. The caller renders its scene through the returned [`Capture`].
/// 3. Ending the capture restores the previous target.
/// 4. [`draw`](Self::draw) shows the colour texture in the host.
///
/// Offscreen objects are created lazily and released when the panel drops.
pub struct RenderToTexturePanel<B: OffscreenBackend> {
    title: String,
    clear_color: ClearColor,
    aspect: AspectRatio,

    pub(super) backend: B,
    reporter: Arc<dyn ErrorReporter>,

    resources: Option<Resources>,
    /// Size both attachments currently share; `None` when unknown or mismatched.
    allocated: Option<SurfaceSize>,
    /// Size of the last complete capture; what `draw` presents.
    presented: Option<SurfaceSize>,
    reallocations: u64,

    last_error: Option<PanelError>,
}

impl<B: OffscreenBackend> RenderToTexturePanel<B> {
    pub fn new(config: PanelConfig, backend: B) -> Self {
        Self {
            title: config.title,
            clear_color: config.clear_color,
            aspect: config.aspect,
            backend,
            reporter: Arc::new(FacadeReporter),
            resources: None,
            allocated: None,
            presented: None,
            reallocations: 0,
            last_error: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect
    }

    /// Sets the width/height ratio forwarded to the host on the next `begin`.
    /// Zero or negative disables the constraint.
    pub fn set_aspect_ratio(&mut self, ratio: f32) {
        self.aspect = AspectRatio::new(ratio);
    }

    /// Size of the frame currently presented, if any capture has completed.
    #[inline]
    pub fn size(&self) -> Option<SurfaceSize> {
        self.presented
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// Colour texture holding the panel's content.
    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        self.resources.map(|r| r.color)
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Number of times attachment storage has been (re)allocated.
    #[inline]
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }

    /// Creates the framebuffer, colour texture and depth/stencil renderbuffer.
    ///
    /// Idempotent. On failure nothing is kept and the error is reported.
    pub fn init(&mut self) -> bool {
        match self.ensure_resources() {
            Ok(_) => true,
            Err(e) => {
                self.report_failure(e);
                false
            }
        }
    }

    /// Starts capturing into the panel.
    ///
    /// The returned guard restores the previously bound target when it is
    /// ended or dropped. If setup fails the guard is inactive: nothing is
    /// bound and the panel keeps presenting its last complete frame.
    pub fn begin<H: PanelHost + ?Sized>(&mut self, host: &mut H) -> Capture<'_, B> {
        host.set_size_constraint(&self.title, self.aspect);
        let available = host.available_size(&self.title);
        let size = SurfaceSize::from_available(available.width, available.height);

        match self.prepare(size) {
            Ok(framebuffer) => {
                self.last_error = None;
                let previous = self.backend.bound_framebuffer();
                self.backend.bind_framebuffer(Some(framebuffer));
                self.backend.set_viewport(size);
                self.backend.clear(self.clear_color);
                self.presented = Some(size);
                Capture::active(self, previous, size)
            }
            Err(e) => {
                self.report_failure(e);
                Capture::inactive(self)
            }
        }
    }

    /// Runs `scene` inside a begin/end bracket and returns its result.
    pub fn capture<H, F, R>(&mut self, host: &mut H, scene: F) -> R
    where
        H: PanelHost + ?Sized,
        F: FnOnce(&mut Capture<'_, B>) -> R,
    {
        let mut capture = self.begin(host);
        scene(&mut capture)
    }

    /// Shows the latest complete frame in the host.
    pub fn draw<H: PanelHost + ?Sized>(&self, host: &mut H) {
        if let (Some(resources), Some(size)) = (self.resources, self.presented) {
            host.show_image(&self.title, resources.color, PanelSize::from(size));
        }
    }

    /// Makes the framebuffer match `size` and checks it is usable.
    fn prepare(&mut self, size: SurfaceSize) -> Result<FramebufferId, PanelError> {
        let res = self.ensure_resources()?;

        if self.allocated != Some(size) {
            // Depth first: if it fails the colour texture still matches the
            // old depth storage and the presented frame stays intact.
            self.backend.allocate_depth_stencil(res.depth_stencil, size)?;
            self.allocated = None;
            self.backend.allocate_color(res.color, size)?;
            self.backend.attach_color(res.framebuffer, res.color)?;
            self.backend.attach_depth_stencil(res.framebuffer, res.depth_stencil)?;
            self.allocated = Some(size);
            self.reallocations += 1;
            log::debug!("panel '{}': attachments resized to {size}", self.title);
        }

        let status = self.backend.framebuffer_status(res.framebuffer);
        if !status.is_complete() {
            return Err(PanelError::Incomplete(status));
        }
        Ok(res.framebuffer)
    }

    fn ensure_resources(&mut self) -> Result<Resources, PanelError> {
        if let Some(resources) = self.resources {
            return Ok(resources);
        }
        let resources = self.create_resources()?;
        log::debug!("panel '{}': offscreen objects created", self.title);
        self.resources = Some(resources);
        Ok(resources)
    }

    fn create_resources(&mut self) -> Result<Resources, PanelError> {
        let framebuffer = self.backend.create_framebuffer()?;
        let color = match self.backend.create_texture() {
            Ok(id) => id,
            Err(e) => {
                self.backend.delete_framebuffer(framebuffer);
                return Err(e.into());
            }
        };
        let depth_stencil = match self.backend.create_renderbuffer() {
            Ok(id) => id,
            Err(e) => {
                self.backend.delete_texture(color);
                self.backend.delete_framebuffer(framebuffer);
                return Err(e.into());
            }
        };
        Ok(Resources {
            framebuffer,
            color,
            depth_stencil,
        })
    }

    /// Reports `error` unless it repeats the previous frame's failure.
    fn report_failure(&mut self, error: PanelError) {
        if self.last_error.as_ref() == Some(&error) {
            return;
        }
        self.reporter
            .report(Level::Error, &format!("panel '{}': {error}", self.title));
        self.last_error = Some(error);
    }
}

impl<B: OffscreenBackend> Drop for RenderToTexturePanel<B> {
    fn drop(&mut self) {
        let Some(res) = self.resources.take() else { return };
        if self.backend.bound_framebuffer() == Some(res.framebuffer) {
            self.backend.bind_framebuffer(None);
        }
        self.backend.delete_framebuffer(res.framebuffer);
        self.backend.delete_texture(res.color);
        self.backend.delete_renderbuffer(res.depth_stencil);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    use crate::render::fake::FakeBackend;
    use crate::render::FramebufferStatus;

    #[derive(Default)]
    struct FakeHost {
        available: PanelSize,
        constraints: Vec<(String, AspectRatio)>,
        shown: Vec<(String, TextureId, PanelSize)>,
    }

    impl FakeHost {
        fn sized(w: f32, h: f32) -> Self {
            Self {
                available: PanelSize::new(w, h),
                ..Self::default()
            }
        }
    }

    impl PanelHost for FakeHost {
        fn set_size_constraint(&mut self, title: &str, aspect: AspectRatio) {
            self.constraints.push((title.to_string(), aspect));
        }

        fn available_size(&mut self, _title: &str) -> PanelSize {
            self.available
        }

        fn show_image(&mut self, title: &str, texture: TextureId, size: PanelSize) {
            self.shown.push((title.to_string(), texture, size));
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<(Level, String)>>);

    impl ErrorReporter for Collect {
        fn report(&self, level: Level, message: &str) {
            self.0.lock().push((level, message.to_string()));
        }
    }

    fn panel() -> (RenderToTexturePanel<FakeBackend>, FakeBackend, Arc<Collect>) {
        let backend = FakeBackend::new();
        let reports = Arc::new(Collect::default());
        let panel = RenderToTexturePanel::new(PanelConfig::new("Scene"), backend.clone())
            .with_reporter(reports.clone());
        (panel, backend, reports)
    }

    fn s(w: u32, h: u32) -> SurfaceSize {
        SurfaceSize::new(w, h)
    }

    /// The single framebuffer a panel owns.
    fn framebuffer(backend: &FakeBackend) -> FramebufferId {
        let st = backend.state.lock();
        assert_eq!(st.framebuffers.len(), 1);
        FramebufferId(*st.framebuffers.keys().next().unwrap())
    }

    // ── init ──────────────────────────────────────────────────────────────

    #[test]
    fn init_is_idempotent() {
        let (mut panel, backend, _) = panel();
        assert!(panel.init());
        assert!(panel.init());
        let st = backend.state.lock();
        assert_eq!(st.creations, 3);
        assert_eq!(st.live_objects(), 3);
    }

    #[test]
    fn failed_init_reports_and_keeps_nothing() {
        let (mut panel, backend, reports) = panel();
        backend.state.lock().fail_create = true;

        assert!(!panel.init());
        assert!(!panel.is_initialized());
        assert_eq!(backend.state.lock().live_objects(), 0);

        let reports = reports.0.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, Level::Error);
    }

    #[test]
    fn begin_initializes_lazily() {
        let (mut panel, backend, _) = panel();
        let mut host = FakeHost::sized(64.0, 32.0);

        assert!(!panel.is_initialized());
        panel.begin(&mut host).end();
        assert!(panel.is_initialized());
        assert_eq!(backend.state.lock().live_objects(), 3);
    }

    // ── sizing ────────────────────────────────────────────────────────────

    #[test]
    fn resize_reallocates_without_accumulating_storage() {
        let (mut panel, backend, _) = panel();
        let mut host = FakeHost::sized(200.0, 100.0);

        panel.begin(&mut host).end();
        let tex = panel.texture().unwrap();
        assert_eq!(backend.state.lock().texture_size(tex), Some(s(200, 100)));

        let fb = framebuffer(&backend);
        assert_eq!(backend.framebuffer_status(fb), FramebufferStatus::Complete);
        assert_eq!(backend.state.lock().depth_size(fb), Some(s(200, 100)));

        host.available = PanelSize::new(50.0, 50.0);
        panel.begin(&mut host).end();
        assert_eq!(backend.framebuffer_status(fb), FramebufferStatus::Complete);

        let st = backend.state.lock();
        assert_eq!(st.texture_size(tex), Some(s(50, 50)));
        assert_eq!(st.depth_size(fb), Some(s(50, 50)));
        assert_eq!(st.live_objects(), 3);
        assert_eq!(st.viewport, Some(s(50, 50)));
        assert_eq!(panel.size(), Some(s(50, 50)));
        assert_eq!(panel.reallocations(), 2);
    }

    #[test]
    fn unchanged_size_does_not_reallocate() {
        let (mut panel, backend, _) = panel();
        let mut host = FakeHost::sized(120.0, 80.0);

        for _ in 0..5 {
            panel.begin(&mut host).end();
        }

        let st = backend.state.lock();
        assert_eq!(st.color_allocations, 1);
        assert_eq!(st.depth_allocations, 1);
        assert_eq!(st.clears.len(), 5);
    }

    #[test]
    fn degenerate_available_area_is_clamped() {
        let (mut panel, backend, _) = panel();
        let mut host = FakeHost::sized(0.0, -3.0);

        let capture = panel.begin(&mut host);
        assert!(capture.is_active());
        assert_eq!(capture.size(), Some(s(1, 1)));
        drop(capture);

        assert_eq!(backend.state.lock().viewport, Some(s(1, 1)));
    }

    #[test]
    fn fractional_area_rounds_to_nearest_pixel() {
        let (mut panel, _, _) = panel();
        let mut host = FakeHost::sized(99.5, 10.4);
        panel.begin(&mut host).end();
        assert_eq!(panel.size(), Some(s(100, 10)));
    }

    #[test]
    fn aspect_constraint_is_forwarded() {
        let (mut panel, _, _) = panel();
        let mut host = FakeHost::sized(10.0, 10.0);

        panel.set_aspect_ratio(16.0 / 9.0);
        panel.begin(&mut host).end();
        panel.set_aspect_ratio(0.0);
        panel.begin(&mut host).end();

        assert_eq!(host.constraints[0], ("Scene".to_string(), AspectRatio::Fixed(16.0 / 9.0)));
        assert_eq!(host.constraints[1].1, AspectRatio::Unconstrained);
    }

    // ── begin / end bracket ───────────────────────────────────────────────

    #[test]
    fn begin_clears_to_configured_color() {
        let backend = FakeBackend::new();
        let cfg = PanelConfig {
            clear_color: ClearColor::rgba(0.2, 0.3, 0.4, 1.0),
            ..PanelConfig::new("Scene")
        };
        let mut panel = RenderToTexturePanel::new(cfg, backend.clone());
        let mut host = FakeHost::sized(8.0, 8.0);

        panel.begin(&mut host).end();

        let st = backend.state.lock();
        let fb = st.framebuffers.keys().next().copied().map(FramebufferId);
        assert_eq!(st.clears, vec![(fb, ClearColor::rgba(0.2, 0.3, 0.4, 1.0))]);
    }

    #[test]
    fn scene_commands_target_the_panel_between_begin_and_end() {
        let (mut panel, backend, _) = panel();
        let mut host = FakeHost::sized(16.0, 16.0);

        {
            let mut capture = panel.begin(&mut host);
            capture.backend().unwrap().draw();
            capture.end();
        }
        backend.clone().draw();

        let st = backend.state.lock();
        assert_eq!(st.draws.len(), 2);
        assert!(st.draws[0].is_some());
        assert_eq!(st.draws[1], None);
        assert_eq!(st.bound, None);
    }

    #[test]
    fn end_restores_previously_bound_target() {
        let (mut panel, mut backend, _) = panel();
        let outer = backend.create_framebuffer().unwrap();
        backend.bind_framebuffer(Some(outer));
        let mut host = FakeHost::sized(16.0, 16.0);

        let capture = panel.begin(&mut host);
        assert_ne!(backend.bound_framebuffer(), Some(outer));
        capture.end();

        assert_eq!(backend.bound_framebuffer(), Some(outer));
    }

    #[test]
    fn early_exit_from_scene_still_restores_target() {
        let (mut panel, backend, _) = panel();
        let mut host = FakeHost::sized(16.0, 16.0);

        let result = panel.capture(&mut host, |capture| -> Result<(), &str> {
            capture.backend().ok_or("inactive")?.draw();
            Err("scene failed")
        });

        assert_eq!(result, Err("scene failed"));
        assert_eq!(backend.state.lock().bound, None);
    }

    #[test]
    fn panic_in_scene_still_restores_target() {
        let (mut panel, backend, _) = panel();
        let mut host = FakeHost::sized(16.0, 16.0);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: () = panel.capture(&mut host, |_capture| panic!("scene panicked"));
        }));

        assert!(outcome.is_err());
        assert_eq!(backend.state.lock().bound, None);
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn failed_resize_keeps_last_frame_and_reports_once() {
        let (mut panel, backend, reports) = panel();
        let mut host = FakeHost::sized(100.0, 100.0);
        panel.begin(&mut host).end();
        let tex = panel.texture().unwrap();

        backend.state.lock().max_dimension = Some(4096);
        host.available = PanelSize::new(8192.0, 100.0);

        for _ in 0..3 {
            let capture = panel.begin(&mut host);
            assert!(!capture.is_active());
            assert_eq!(capture.size(), None);
        }

        {
            let st = backend.state.lock();
            assert_eq!(st.bound, None);
            assert_eq!(st.texture_size(tex), Some(s(100, 100)));
            assert_eq!(st.clears.len(), 1);
        }
        assert_eq!(panel.size(), Some(s(100, 100)));
        assert_eq!(reports.0.lock().len(), 1);

        panel.draw(&mut host);
        assert_eq!(host.shown, vec![("Scene".to_string(), tex, PanelSize::new(100.0, 100.0))]);
    }

    #[test]
    fn recovers_after_failed_resize() {
        let (mut panel, backend, _) = panel();
        let mut host = FakeHost::sized(100.0, 100.0);
        panel.begin(&mut host).end();

        backend.state.lock().max_dimension = Some(4096);
        host.available = PanelSize::new(5000.0, 100.0);
        assert!(!panel.begin(&mut host).is_active());

        host.available = PanelSize::new(300.0, 200.0);
        assert!(panel.begin(&mut host).is_active());
        assert_eq!(panel.size(), Some(s(300, 200)));
    }

    #[test]
    fn colour_failure_after_depth_resize_keeps_stale_frame_and_retries() {
        let (mut panel, backend, reports) = panel();
        let mut host = FakeHost::sized(100.0, 100.0);
        panel.begin(&mut host).end();
        let tex = panel.texture().unwrap();
        let fb = framebuffer(&backend);

        backend.state.lock().fail_color_alloc = true;
        host.available = PanelSize::new(150.0, 150.0);
        for _ in 0..3 {
            assert!(!panel.begin(&mut host).is_active());
        }

        {
            let st = backend.state.lock();
            assert_eq!(st.texture_size(tex), Some(s(100, 100)));
            assert_eq!(st.depth_size(fb), Some(s(150, 150)));
            assert_eq!(st.bound, None);
        }
        assert_eq!(backend.framebuffer_status(fb), FramebufferStatus::SizeMismatch);
        assert_eq!(reports.0.lock().len(), 1);

        panel.draw(&mut host);
        assert_eq!(host.shown, vec![("Scene".to_string(), tex, PanelSize::new(100.0, 100.0))]);

        // Same size as the failed attempt: the mismatch alone forces a retry.
        backend.state.lock().fail_color_alloc = false;
        assert!(panel.begin(&mut host).is_active());
        assert_eq!(backend.framebuffer_status(fb), FramebufferStatus::Complete);
        assert_eq!(backend.state.lock().texture_size(tex), Some(s(150, 150)));
        assert_eq!(panel.size(), Some(s(150, 150)));
        assert_eq!(panel.reallocations(), 2);
    }

    #[test]
    fn incomplete_framebuffer_deactivates_capture() {
        let (mut panel, backend, reports) = panel();
        let mut host = FakeHost::sized(64.0, 64.0);
        backend.state.lock().forced_status = Some(FramebufferStatus::MissingStorage);

        for _ in 0..2 {
            let mut capture = panel.begin(&mut host);
            assert!(!capture.is_active());
            assert!(capture.backend().is_none());
        }
        {
            let st = backend.state.lock();
            assert_eq!(st.bound, None);
            assert!(st.clears.is_empty());
        }
        {
            let reports = reports.0.lock();
            assert_eq!(reports.len(), 1);
            assert!(reports[0].1.contains("incomplete"), "{}", reports[0].1);
        }
        panel.draw(&mut host);
        assert!(host.shown.is_empty());

        backend.state.lock().forced_status = None;
        assert!(panel.begin(&mut host).is_active());
        assert_eq!(panel.size(), Some(s(64, 64)));
    }

    #[test]
    fn inactive_capture_exposes_no_backend() {
        let (mut panel, backend, _) = panel();
        backend.state.lock().fail_create = true;
        let mut host = FakeHost::sized(16.0, 16.0);

        let mut capture = panel.begin(&mut host);
        assert!(capture.backend().is_none());
    }

    // ── draw ──────────────────────────────────────────────────────────────

    #[test]
    fn draw_before_first_capture_shows_nothing() {
        let (mut panel, _, _) = panel();
        let mut host = FakeHost::sized(16.0, 16.0);

        panel.draw(&mut host);
        assert!(panel.init());
        panel.draw(&mut host);

        assert!(host.shown.is_empty());
    }

    #[test]
    fn draw_shows_color_texture_at_surface_size() {
        let (mut panel, _, _) = panel();
        let mut host = FakeHost::sized(640.4, 359.6);

        panel.begin(&mut host).end();
        panel.draw(&mut host);

        let tex = panel.texture().unwrap();
        assert_eq!(host.shown, vec![("Scene".to_string(), tex, PanelSize::new(640.0, 360.0))]);
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn drop_releases_all_objects() {
        let (mut panel, backend, _) = panel();
        let mut host = FakeHost::sized(32.0, 32.0);
        panel.begin(&mut host).end();
        assert_eq!(backend.state.lock().live_objects(), 3);

        drop(panel);
        assert_eq!(backend.state.lock().live_objects(), 0);
    }

    #[test]
    fn drop_of_uninitialized_panel_is_a_no_op() {
        let (panel, backend, _) = panel();
        drop(panel);
        assert_eq!(backend.state.lock().creations, 0);
    }
}
