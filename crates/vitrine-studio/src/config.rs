use std::path::PathBuf;

use vitrine_engine::panel::AspectRatio;
use vitrine_engine::render::ClearColor;

/// Studio settings. Environment overrides are applied by [`StudioConfig::from_env`].
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub window_title: String,
    pub window_size: (f64, f64),
    pub panel_title: String,
    pub panel_aspect: AspectRatio,
    pub log_title: String,
    /// Height shares of the scene and log rows.
    pub row_weights: (f32, f32),
    pub log_font_size: f32,
    /// Font for the log view; well-known system fonts are tried when unset.
    pub font_path: Option<PathBuf>,
    /// Space kept free around and between docked panels, in physical pixels.
    pub dock_margin: f32,
    pub background: ClearColor,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            window_title: "vitrine studio".to_string(),
            window_size: (1280.0, 720.0),
            panel_title: "Scene".to_string(),
            panel_aspect: AspectRatio::Unconstrained,
            log_title: "Logger".to_string(),
            row_weights: (3.0, 1.0),
            log_font_size: 14.0,
            font_path: None,
            dock_margin: 24.0,
            background: ClearColor::rgba(0.07, 0.07, 0.09, 1.0),
        }
    }
}

impl StudioConfig {
    /// Defaults plus `VITRINE_ASPECT` (e.g. "16:9" or "1.5") and
    /// `VITRINE_FONT` (path to a TTF/OTF file).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os("VITRINE_FONT") {
            config.font_path = Some(PathBuf::from(path));
        }
        if let Ok(raw) = std::env::var("VITRINE_ASPECT") {
            match parse_aspect(&raw) {
                Some(aspect) => config.panel_aspect = aspect,
                None => log::warn!("ignoring VITRINE_ASPECT={raw:?}: expected W:H or a positive number"),
            }
        }
        config
    }
}

/// Parses "W:H" or a plain ratio. Zero means unconstrained.
fn parse_aspect(raw: &str) -> Option<AspectRatio> {
    let raw = raw.trim();
    let ratio = match raw.split_once(':') {
        Some((w, h)) => {
            let w: f32 = w.trim().parse().ok()?;
            let h: f32 = h.trim().parse().ok()?;
            if h == 0.0 {
                return None;
            }
            w / h
        }
        None => raw.parse().ok()?,
    };
    if !ratio.is_finite() || ratio < 0.0 {
        return None;
    }
    Some(AspectRatio::new(ratio))
}
