use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;

use colored::Colorize;
use parking_lot::Mutex;

use super::record::{Level, LogRecord};

/// Destination for dequeued records.
///
/// A sink is only ever invoked from the logger's worker thread, one record at a
/// time. It still has to be `Sync` because the logger hands it out behind an
/// `Arc` so it can be swapped at runtime.
pub trait LogSink: Send + Sync {
    fn write(&self, record: &LogRecord);
}

impl<F> LogSink for F
where
    F: Fn(&LogRecord) + Send + Sync,
{
    fn write(&self, record: &LogRecord) {
        self(record)
    }
}

/// Console colouring policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ColorMode {
    /// Colour when the `colored` crate detects a capable terminal.
    #[default]
    Auto,
    /// Colour even when output is not a terminal. Applies `colored`'s
    /// process-wide override.
    Always,
    Never,
}

// ── console ───────────────────────────────────────────────────────────────

/// Writes `"<LEVEL>: <message>"` lines, colour-coded by level.
///
/// DEBUG uses the terminal's default colour, INFO green, WARNING yellow and
/// ERROR red. Each line is written under the sink's own print lock.
pub struct ConsoleSink<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
    color: ColorMode,
}

impl ConsoleSink<io::Stdout> {
    /// Default sink: standard output.
    pub fn stdout(color: ColorMode) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl ConsoleSink<io::Stderr> {
    pub fn stderr(color: ColorMode) -> Self {
        Self::new(io::stderr(), color)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W, color: ColorMode) -> Self {
        if color == ColorMode::Always {
            colored::control::set_override(true);
        }
        Self {
            out: Mutex::new(out),
            color,
        }
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn prefix(&self, level: Level) -> String {
        let label = format!("{level}:");
        if self.color == ColorMode::Never {
            return label;
        }
        let label = label.as_str();
        match level {
            Level::Debug => label.normal().to_string(),
            Level::Info => label.green().to_string(),
            Level::Warn => label.yellow().to_string(),
            Level::Error => label.red().to_string(),
        }
    }
}

impl<W: Write + Send> LogSink for ConsoleSink<W> {
    fn write(&self, record: &LogRecord) {
        let prefix = self.prefix(record.level());
        let mut out = self.out.lock();
        // Nowhere left to report a failing console.
        let _ = writeln!(out, "{prefix} {}", record.message());
        let _ = out.flush();
    }
}

// ── buffer ────────────────────────────────────────────────────────────────

/// One formatted line held by a [`LogBuffer`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LogLine {
    pub level: Level,
    pub text: String,
}

struct BufferState {
    lines: VecDeque<LogLine>,
    capacity: usize,
    generation: u64,
}

/// Bounded, shareable ring of formatted log lines.
///
/// Install a clone as the logger sink and hand another clone to whatever
/// renders the in-panel log view. When full, the oldest line is evicted.
#[derive(Clone)]
pub struct LogBuffer {
    state: Arc<Mutex<BufferState>>,
}

impl LogBuffer {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Arc::new(Mutex::new(BufferState {
                lines: VecDeque::with_capacity(capacity),
                capacity,
                generation: 0,
            })),
        }
    }

    pub fn push(&self, record: &LogRecord) {
        let mut state = self.state.lock();
        if state.lines.len() == state.capacity {
            state.lines.pop_front();
        }
        state.lines.push_back(LogLine {
            level: record.level(),
            text: record.to_string(),
        });
        state.generation = state.generation.wrapping_add(1);
    }

    /// Snapshot of the buffered lines, oldest first.
    pub fn lines(&self) -> Vec<LogLine> {
        self.state.lock().lines.iter().cloned().collect()
    }

    /// Buffered lines joined with `'\n'`, ready for a text widget.
    pub fn text(&self) -> String {
        let state = self.state.lock();
        let mut out = String::new();
        for (i, line) in state.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&line.text);
        }
        out
    }

    /// Changes every time a line is pushed or the buffer is cleared.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn len(&self) -> usize {
        self.state.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().lines.is_empty()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.lines.clear();
        state.generation = state.generation.wrapping_add(1);
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl LogSink for LogBuffer {
    fn write(&self, record: &LogRecord) {
        self.push(record);
    }
}
