use std::path::Path;

use vitrine_engine::logging::{Level, LogBuffer, LogLine};
use vitrine_engine::render::{RenderCtx, RenderTarget, TextRenderer, TextRun};
use vitrine_engine::text::{FontId, FontSystem};

const SYSTEM_FONTS: [&str; 5] = [
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];

/// Padding between the panel edge and the text, in pixels.
const PADDING: f32 = 6.0;

/// Scrolling view of the newest [`LogBuffer`] lines, drawn into a panel.
pub struct LogView {
    buffer: LogBuffer,
    fonts: FontSystem,
    font: Option<FontId>,
    font_size: f32,
    text: TextRenderer,
}

impl LogView {
    /// Loads the font at `font_path`, or the first system font found.
    ///
    /// Without a usable font the view stays blank and says so once in the log.
    pub fn new(buffer: LogBuffer, font_path: Option<&Path>, font_size: f32) -> Self {
        let mut fonts = FontSystem::new();
        let font = match read_font(font_path) {
            Some(bytes) => match fonts.load_font(&bytes) {
                Ok(id) => Some(id),
                Err(e) => {
                    log::warn!("log view disabled: {e}");
                    None
                }
            },
            None => {
                log::warn!("log view disabled: no font found (set VITRINE_FONT)");
                None
            }
        };

        Self {
            buffer,
            fonts,
            font,
            font_size,
            text: TextRenderer::new(),
        }
    }

    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let Some(font) = self.font else { return };

        let line_height = self.fonts.line_height(font, self.font_size);
        let lines = self.buffer.lines();
        let visible = visible_lines(&lines, ctx.viewport.height() as f32, line_height);

        let runs: Vec<TextRun> = visible
            .iter()
            .enumerate()
            .map(|(row, line)| TextRun {
                text: line.text.clone(),
                font,
                size: self.font_size,
                origin: [PADDING, PADDING + row as f32 * line_height],
                color: level_color(line.level),
            })
            .collect();

        self.text.render(ctx, target, &runs, &self.fonts);
    }
}

fn read_font(path: Option<&Path>) -> Option<Vec<u8>> {
    if let Some(path) = path {
        return match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("cannot read font {}: {e}", path.display());
                None
            }
        };
    }
    SYSTEM_FONTS.iter().find_map(|p| std::fs::read(p).ok())
}

/// Newest lines that fit in a panel `height` pixels tall.
fn visible_lines(lines: &[LogLine], height: f32, line_height: f32) -> &[LogLine] {
    if line_height <= 0.0 {
        return &[];
    }
    let rows = ((height - 2.0 * PADDING) / line_height).floor().max(0.0) as usize;
    &lines[lines.len().saturating_sub(rows)..]
}

/// Same palette as the console sink.
fn level_color(level: Level) -> [f32; 4] {
    match level {
        Level::Debug => [0.85, 0.85, 0.85, 1.0],
        Level::Info => [0.3, 0.85, 0.35, 1.0],
        Level::Warn => [0.95, 0.8, 0.2, 1.0],
        Level::Error => [0.95, 0.3, 0.3, 1.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<LogLine> {
        (0..n)
            .map(|i| LogLine {
                level: Level::Info,
                text: format!("INFO: {i}"),
            })
            .collect()
    }

    #[test]
    fn keeps_the_newest_lines_that_fit() {
        let all = lines(10);
        // (72 - 12) / 20 = 3 rows
        let shown = visible_lines(&all, 72.0, 20.0);
        let text: Vec<&str> = shown.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(text, ["INFO: 7", "INFO: 8", "INFO: 9"]);
    }

    #[test]
    fn short_logs_are_shown_whole() {
        let all = lines(2);
        assert_eq!(visible_lines(&all, 500.0, 20.0).len(), 2);
    }

    #[test]
    fn tiny_panels_show_nothing() {
        let all = lines(4);
        assert!(visible_lines(&all, 8.0, 20.0).is_empty());
        assert!(visible_lines(&all, 100.0, 0.0).is_empty());
    }

    #[test]
    fn levels_are_distinguishable() {
        let colors = [Level::Debug, Level::Info, Level::Warn, Level::Error].map(level_color);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unreadable_font_path_disables_the_view() {
        let view = LogView::new(LogBuffer::default(), Some(Path::new("/nonexistent/font.ttf")), 14.0);
        assert!(view.font.is_none());
    }
}
