use std::collections::HashMap;

use vitrine_engine::panel::{AspectRatio, PanelHost, PanelSize};
use vitrine_engine::render::{ImageRect, SurfaceSize, TextureId};

/// An image a panel asked to show this frame, placed in window pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub title: String,
    pub texture: TextureId,
    pub rect: ImageRect,
}

/// Panel host that stacks panels in rows inside the window minus a margin.
///
/// Registered titles share the dock area by weight, top to bottom, with a
/// margin between rows; unregistered titles get the whole area. Constrained
/// panels are fitted inside their slot and centered.
pub struct DockHost {
    margin: f32,
    window: SurfaceSize,
    rows: Vec<(String, f32)>,
    constraints: HashMap<String, AspectRatio>,
    placements: Vec<Placement>,
}

impl DockHost {
    pub fn new(margin: f32) -> Self {
        Self {
            margin: margin.max(0.0),
            window: SurfaceSize::new(1, 1),
            rows: Vec::new(),
            constraints: HashMap::new(),
            placements: Vec::new(),
        }
    }

    /// Adds a row for `title` taking `weight` shares of the dock height.
    pub fn with_row(mut self, title: impl Into<String>, weight: f32) -> Self {
        self.rows.push((title.into(), weight.max(0.0)));
        self
    }

    /// Starts a frame for a window of `size`.
    pub fn begin_frame(&mut self, size: SurfaceSize) {
        self.window = size;
        self.placements.clear();
    }

    /// Images requested since [`begin_frame`](Self::begin_frame).
    pub fn take_placements(&mut self) -> Vec<Placement> {
        std::mem::take(&mut self.placements)
    }

    fn dock_area(&self) -> ImageRect {
        let w = (self.window.width() as f32 - 2.0 * self.margin).max(0.0);
        let h = (self.window.height() as f32 - 2.0 * self.margin).max(0.0);
        ImageRect::new(self.margin, self.margin, w, h)
    }

    fn slot(&self, title: &str) -> ImageRect {
        let area = self.dock_area();
        let Some(index) = self.rows.iter().position(|(t, _)| t == title) else {
            return area;
        };
        let total: f32 = self.rows.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return area;
        }

        let gaps = self.margin * (self.rows.len() - 1) as f32;
        let usable = (area.height - gaps).max(0.0);
        let mut y = area.y;
        for (i, (_, weight)) in self.rows.iter().enumerate() {
            let h = (usable * weight / total).round();
            if i == index {
                return ImageRect::new(area.x, y, area.width, h);
            }
            y += h + self.margin;
        }
        area
    }

    fn content_size(&self, title: &str) -> PanelSize {
        let area = self.slot(title);
        let full = PanelSize::new(area.width, area.height);
        let aspect = self.constraints.get(title).copied().unwrap_or_default();
        if !aspect.is_constrained() {
            return full;
        }

        let fitted = aspect.constrain(full);
        if fitted.height <= full.height {
            return fitted;
        }
        // Too tall: keep the height and derive the width instead.
        PanelSize::new((full.height * aspect.ratio()).round().max(1.0), full.height)
    }
}

impl PanelHost for DockHost {
    fn set_size_constraint(&mut self, title: &str, aspect: AspectRatio) {
        self.constraints.insert(title.to_string(), aspect);
    }

    fn available_size(&mut self, title: &str) -> PanelSize {
        self.content_size(title)
    }

    fn show_image(&mut self, title: &str, texture: TextureId, size: PanelSize) {
        let area = self.slot(title);
        let x = area.x + ((area.width - size.width) * 0.5).max(0.0);
        let y = area.y + ((area.height - size.height) * 0.5).max(0.0);
        self.placements.push(Placement {
            title: title.to_string(),
            texture,
            rect: ImageRect::new(x.round(), y.round(), size.width, size.height),
        });
    }
}
