use thiserror::Error;

/// Why a log call did not enqueue its record.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum LogError {
    /// The worker thread has not been started yet.
    #[error("logger not started; record dropped")]
    NotStarted,

    /// The logger has been shut down.
    #[error("logger shut down; record dropped")]
    ShutDown,
}

/// Failures while bringing the logger up.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn log worker thread")]
    Spawn(#[source] std::io::Error),

    /// `init` was called after `shutdown`.
    #[error("logger was shut down and cannot be restarted")]
    Restart,

    /// Another `log` backend is already installed.
    #[error("failed to install log facade bridge")]
    FacadeInstall(#[from] log::SetLoggerError),
}
