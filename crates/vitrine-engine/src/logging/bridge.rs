use super::error::LoggerError;
use super::logger::Logger;
use super::record::Level;

/// `log` facade backend that forwards into a [`Logger`].
///
/// Records pass through an `env_filter` directive set first, so noisy
/// dependencies can be quieted per module. Survivors are formatted on the
/// calling thread and enqueued; the sink still runs on the logger's worker.
/// Records logged before the worker starts or after it stops are dropped
/// silently, as the facade has no error channel.
pub struct LogBridge {
    logger: Logger,
    filter: env_filter::Filter,
}

impl LogBridge {
    pub fn new(logger: Logger, filter: env_filter::Filter) -> Self {
        Self { logger, filter }
    }

    /// Installs the bridge as the process-wide `log` backend.
    pub fn install(self) -> Result<(), LoggerError> {
        let level = self.filter.filter();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.filter.enabled(metadata)
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.filter.matches(record) {
            return;
        }
        let message = match record.module_path() {
            Some(module) => format!("[{module}] {}", record.args()),
            None => record.args().to_string(),
        };
        let _ = self.logger.log(Level::from(record.level()), message);
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use log::Log;
    use parking_lot::Mutex;

    use crate::logging::{AsyncLogger, LogRecord, LoggingConfig};

    fn collecting_logger() -> (AsyncLogger, Arc<Mutex<Vec<LogRecord>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |r: &LogRecord| seen.lock().push(r.clone())
        };
        let cfg = LoggingConfig {
            install_facade: false,
            ..LoggingConfig::default()
        };
        let mut logger = AsyncLogger::with_sink(&cfg, Arc::new(sink));
        logger.init().unwrap();
        (logger, seen)
    }

    fn filter(directives: &str) -> env_filter::Filter {
        env_filter::Builder::new().parse(directives).build()
    }

    #[test]
    fn forwards_enabled_records_with_module_prefix() {
        let (mut logger, seen) = collecting_logger();
        let bridge = LogBridge::new(logger.handle(), filter("info"));

        bridge.log(
            &log::Record::builder()
                .level(log::Level::Warn)
                .target("vitrine::panel")
                .module_path(Some("vitrine::panel"))
                .args(format_args!("framebuffer incomplete"))
                .build(),
        );
        logger.shutdown();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level(), Level::Warn);
        assert_eq!(seen[0].message(), "[vitrine::panel] framebuffer incomplete");
    }

    #[test]
    fn filters_by_facade_level() {
        let (mut logger, seen) = collecting_logger();
        let bridge = LogBridge::new(logger.handle(), filter("warn"));

        bridge.log(
            &log::Record::builder()
                .level(log::Level::Debug)
                .args(format_args!("noise"))
                .build(),
        );
        logger.shutdown();

        assert!(seen.lock().is_empty());
    }

    #[test]
    fn per_module_directives_quiet_dependencies() {
        let (mut logger, seen) = collecting_logger();
        let bridge = LogBridge::new(logger.handle(), filter("info,wgpu_core=warn"));

        for (target, level, text) in [
            ("wgpu_core::device", log::Level::Info, "adapter chatter"),
            ("wgpu_core::device", log::Level::Warn, "validation"),
            ("vitrine_studio::app", log::Level::Info, "panel resized"),
            ("vitrine_studio::app", log::Level::Debug, "frame"),
        ] {
            bridge.log(
                &log::Record::builder()
                    .level(level)
                    .target(target)
                    .args(format_args!("{text}"))
                    .build(),
            );
        }
        logger.shutdown();

        let got: Vec<String> = seen.lock().iter().map(|r| r.message().to_owned()).collect();
        assert_eq!(got, vec!["validation".to_owned(), "panel resized".to_owned()]);
    }
}
