use crate::logging::{Level, Logger};

/// Destination for panel diagnostics.
pub trait ErrorReporter {
    fn report(&self, level: Level, message: &str);
}

/// Reports through the `log` facade.
#[derive(Debug, Default, Copy, Clone)]
pub struct FacadeReporter;

impl ErrorReporter for FacadeReporter {
    fn report(&self, level: Level, message: &str) {
        log::log!(target: "vitrine::panel", log::Level::from(level), "{message}");
    }
}

/// Reports straight into the async logger. A logger that is not running
/// drops the message.
impl ErrorReporter for Logger {
    fn report(&self, level: Level, message: &str) {
        let _ = self.log(level, message);
    }
}
