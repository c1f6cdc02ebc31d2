use std::sync::Arc;
use std::time::Instant;

use vitrine_engine::core::{App, AppControl, FrameCtx};
use vitrine_engine::device::Gpu;
use vitrine_engine::logging::LogBuffer;
use vitrine_engine::panel::{ErrorReporter, PanelConfig, RenderToTexturePanel};
use vitrine_engine::render::{ImageDraw, ImageRenderer, SurfaceSize, WgpuOffscreen};

use crate::config::StudioConfig;
use crate::dock::DockHost;
use crate::log_view::LogView;
use crate::scene::SpinningQuad;

/// Radians per second.
const SPIN_SPEED: f32 = 0.8;

/// Studio application: a "Scene" panel showing [`SpinningQuad`] docked above
/// a "Logger" panel showing the application log.
pub struct StudioApp {
    config: StudioConfig,
    reporter: Arc<dyn ErrorReporter>,

    panels: Option<Panels>,
    dock: DockHost,
    scene: SpinningQuad,
    log_view: LogView,
    images: ImageRenderer,

    started: Instant,
    shown_size: Option<SurfaceSize>,
}

struct Panels {
    scene: RenderToTexturePanel<WgpuOffscreen>,
    log: RenderToTexturePanel<WgpuOffscreen>,
}

impl StudioApp {
    pub fn new(config: StudioConfig, reporter: Arc<dyn ErrorReporter>, log_lines: LogBuffer) -> Self {
        let (scene_weight, log_weight) = config.row_weights;
        Self {
            dock: DockHost::new(config.dock_margin)
                .with_row(config.panel_title.clone(), scene_weight)
                .with_row(config.log_title.clone(), log_weight),
            log_view: LogView::new(log_lines, config.font_path.as_deref(), config.log_font_size),
            config,
            reporter,
            panels: None,
            scene: SpinningQuad::new(),
            images: ImageRenderer::new(),
            started: Instant::now(),
            shown_size: None,
        }
    }

    fn make_panel(&self, gpu: &Gpu<'_>, config: PanelConfig) -> RenderToTexturePanel<WgpuOffscreen> {
        let mut panel =
            RenderToTexturePanel::new(config, gpu.offscreen()).with_reporter(Arc::clone(&self.reporter));
        if !panel.init() {
            log::warn!("'{}' panel will retry initialization every frame", panel.title());
        }
        panel
    }
}

impl App for StudioApp {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) {
        let scene = self.make_panel(
            gpu,
            PanelConfig {
                aspect: self.config.panel_aspect,
                ..PanelConfig::new(self.config.panel_title.clone())
            },
        );
        let log = self.make_panel(
            gpu,
            PanelConfig {
                clear_color: self.config.background,
                ..PanelConfig::new(self.config.log_title.clone())
            },
        );
        self.panels = Some(Panels { scene, log });
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(panels) = self.panels.as_mut() else {
            return AppControl::Continue;
        };

        self.dock.begin_frame(ctx.gpu.surface_size());
        let angle = self.started.elapsed().as_secs_f32() * SPIN_SPEED;

        // ── offscreen panels ──────────────────────────────────────────────
        let scene = &mut self.scene;
        panels.scene.capture(&mut self.dock, |capture| {
            if let Some(backend) = capture.backend() {
                backend.with_target(|rctx, target| scene.render(rctx, target, angle));
            }
        });
        panels.scene.draw(&mut self.dock);

        let log_view = &mut self.log_view;
        panels.log.capture(&mut self.dock, |capture| {
            if let Some(backend) = capture.backend() {
                backend.with_target(|rctx, target| log_view.render(rctx, target));
            }
        });
        panels.log.draw(&mut self.dock);

        if panels.scene.size() != self.shown_size {
            self.shown_size = panels.scene.size();
            if let Some(size) = self.shown_size {
                log::info!("'{}' panel is now {size}", panels.scene.title());
                ctx.runtime.set_title(format!(
                    "{} - {} {size}",
                    self.config.window_title,
                    panels.scene.title()
                ));
            }
        }

        // ── composite ─────────────────────────────────────────────────────
        let placements = self.dock.take_placements();
        let backends = [&panels.scene, &panels.log];
        let images = &mut self.images;

        ctx.render(self.config.background, |rctx, target| {
            let draws: Vec<ImageDraw<'_>> = placements
                .iter()
                .filter_map(|p| {
                    let panel = backends.iter().find(|panel| panel.title() == p.title)?;
                    panel
                        .backend()
                        .texture_view(p.texture)
                        .map(|view| ImageDraw { view, rect: p.rect })
                })
                .collect();
            images.render(rctx, target, &draws);
        })
    }
}
