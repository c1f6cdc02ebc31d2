//! Vitrine studio: a window with a render-to-texture "Scene" panel and a
//! "Logger" panel showing the application log.

mod app;
mod config;
mod dock;
mod log_view;
mod scene;

use std::sync::Arc;

use anyhow::Context;
use winit::dpi::LogicalSize;

use vitrine_engine::device::GpuInit;
use vitrine_engine::logging::{
    init_logging, ConsoleSink, LogBuffer, LogRecord, LogSink, LoggingConfig,
};
use vitrine_engine::window::{Runtime, RuntimeConfig};

use crate::app::StudioApp;
use crate::config::StudioConfig;

fn main() -> anyhow::Result<()> {
    let logging = LoggingConfig::default();
    let color = logging.color;
    let mut logger = init_logging(logging).context("failed to start logging")?;

    // Everything logged goes to the console and to the in-window log view.
    let log_lines = LogBuffer::default();
    let console = ConsoleSink::stdout(color);
    let panel_lines = log_lines.clone();
    logger.set_sink(Arc::new(move |record: &LogRecord| {
        console.write(record);
        panel_lines.write(record);
    }));

    let config = StudioConfig::from_env();

    let runtime = RuntimeConfig {
        title: config.window_title.clone(),
        initial_size: LogicalSize::new(config.window_size.0, config.window_size.1),
    };

    let app = StudioApp::new(config, Arc::new(logger.handle()), log_lines);
    let result = Runtime::run(runtime, GpuInit::default(), app);

    if let Err(e) = &result {
        let _ = logger.error(format!("studio stopped: {e:#}"));
    }
    // Flushes queued records before the process exits.
    logger.shutdown();
    result
}
