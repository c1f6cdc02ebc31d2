//! Asynchronous logging.
//!
//! Producers on any thread hand [`LogRecord`]s to an [`AsyncLogger`] through a
//! [`ConcurrentChannel`](crate::sync::ConcurrentChannel); one worker thread
//! drains them in order into a replaceable [`LogSink`]. The `log` facade can be
//! routed into the same pipeline with [`LogBridge`].

mod bridge;
mod error;
mod init;
mod logger;
mod record;
mod sink;

pub use bridge::LogBridge;
pub use error::{LogError, LoggerError};
pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
pub use logger::{AsyncLogger, Logger};
pub use record::{Level, LogRecord};
pub use sink::{ColorMode, ConsoleSink, LogBuffer, LogLine, LogSink};
