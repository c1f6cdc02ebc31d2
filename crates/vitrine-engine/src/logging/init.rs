use super::bridge::LogBridge;
use super::error::LoggerError;
use super::logger::AsyncLogger;
use super::sink::ColorMode;

/// Directives used when neither the config nor `RUST_LOG` provide any.
pub const DEFAULT_FILTER: &str = "info";

/// Logger configuration.
///
/// `filter` holds `env_logger`-style directives (e.g.
/// `"vitrine_engine=debug,wgpu=warn"`) applied to records that come through
/// the `log` facade. When unset, `RUST_LOG` is used, then [`DEFAULT_FILTER`].
/// Direct [`Logger`](super::Logger) calls are never filtered.
///
/// `color` controls ANSI colouring of the default console sink.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub color: ColorMode,
    pub thread_name: String,
    /// Route `log::info!` and friends into the logger.
    pub install_facade: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            color: ColorMode::Auto,
            thread_name: "vitrine-log".to_string(),
            install_facade: true,
        }
    }
}

impl LoggingConfig {
    /// Directive string in effect once explicit config and the environment
    /// are applied.
    pub fn directives(&self) -> String {
        pick_directives(self.filter.as_deref(), std::env::var("RUST_LOG").ok())
    }

    /// Parsed facade filter.
    pub fn build_filter(&self) -> env_filter::Filter {
        env_filter::Builder::new().parse(&self.directives()).build()
    }

    /// Most verbose level any directive enables.
    pub fn resolved_level(&self) -> log::LevelFilter {
        self.build_filter().filter()
    }
}

fn pick_directives(explicit: Option<&str>, env: Option<String>) -> String {
    explicit
        .map(str::to_owned)
        .or(env)
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
}

/// Builds and starts a logger for the composition root.
///
/// The returned service owns the worker thread; keep it alive for as long as
/// logging is needed and pass [`Logger`](super::Logger) handles to subsystems.
/// With `install_facade`, the `log` crate macros are routed into it as well,
/// which can only succeed once per process.
pub fn init_logging(config: LoggingConfig) -> Result<AsyncLogger, LoggerError> {
    let mut logger = AsyncLogger::new(&config);
    logger.init()?;

    if config.install_facade {
        LogBridge::new(logger.handle(), config.build_filter()).install()?;
    }

    log::debug!("logging initialized ({})", config.directives());
    Ok(logger)
}
