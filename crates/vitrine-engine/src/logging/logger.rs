use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::RwLock;

use crate::sync::ConcurrentChannel;

use super::error::{LogError, LoggerError};
use super::init::LoggingConfig;
use super::record::{Level, LogRecord};
use super::sink::{ColorMode, ConsoleSink, LogSink};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

struct Shared {
    channel: ConcurrentChannel<LogRecord>,
    sink: RwLock<Arc<dyn LogSink>>,
    state: AtomicU8,
    sink_failures: AtomicUsize,
}

/// Cloneable producer handle onto an [`AsyncLogger`].
///
/// Handles are what subsystems receive; they can log from any thread and swap
/// the sink, but cannot start or stop the worker.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
}

impl Logger {
    /// Enqueues a record for the worker thread.
    ///
    /// Every level is delivered; filtering is the facade's business (see
    /// [`LogBridge`](super::LogBridge)). Never blocks on the sink.
    pub fn log(&self, level: Level, message: impl Into<String>) -> Result<(), LogError> {
        match self.shared.state.load(Ordering::Acquire) {
            IDLE => return Err(LogError::NotStarted),
            STOPPED => return Err(LogError::ShutDown),
            _ => {}
        }

        self.shared.channel.push_back(LogRecord::new(level, message));
        Ok(())
    }

    pub fn debug(&self, message: impl Into<String>) -> Result<(), LogError> {
        self.log(Level::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Result<(), LogError> {
        self.log(Level::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Result<(), LogError> {
        self.log(Level::Warn, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Result<(), LogError> {
        self.log(Level::Error, message)
    }

    /// Replaces the active sink.
    ///
    /// A record already handed to the previous sink finishes there; every
    /// record dequeued afterwards goes to `sink`.
    pub fn set_sink(&self, sink: Arc<dyn LogSink>) {
        *self.shared.sink.write() = sink;
    }

    /// True between a successful `init` and `shutdown`.
    pub fn is_running(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) == RUNNING
    }

    /// Records queued but not yet handed to the sink.
    pub fn pending(&self) -> usize {
        self.shared.channel.len()
    }

    /// Number of records whose sink call panicked.
    ///
    /// Those records are lost; the worker keeps draining.
    pub fn sink_failures(&self) -> usize {
        self.shared.sink_failures.load(Ordering::Acquire)
    }
}

/// Asynchronous logging service.
///
/// Producers on any thread push records into a [`ConcurrentChannel`]; a single
/// worker thread drains it in insertion order and forwards each record to the
/// active [`LogSink`]. The service is owned by the composition root and hands
/// out [`Logger`] handles; dropping it shuts the worker down.
pub struct AsyncLogger {
    logger: Logger,
    thread_name: String,
    worker: Option<JoinHandle<()>>,
}

impl AsyncLogger {
    /// Builds the service. The worker is not started until [`init`](Self::init).
    pub fn new(config: &LoggingConfig) -> Self {
        let sink: Arc<dyn LogSink> = Arc::new(ConsoleSink::stdout(config.color));
        Self::with_sink(config, sink)
    }

    /// Like [`new`](Self::new) with a caller-provided initial sink.
    pub fn with_sink(config: &LoggingConfig, sink: Arc<dyn LogSink>) -> Self {
        let shared = Arc::new(Shared {
            channel: ConcurrentChannel::new(),
            sink: RwLock::new(sink),
            state: AtomicU8::new(IDLE),
            sink_failures: AtomicUsize::new(0),
        });

        Self {
            logger: Logger { shared },
            thread_name: config.thread_name.clone(),
            worker: None,
        }
    }

    /// Spawns the worker thread.
    ///
    /// Returns `Ok(true)` when the worker was started by this call and
    /// `Ok(false)` when it was already running.
    pub fn init(&mut self) -> Result<bool, LoggerError> {
        if self.worker.is_some() {
            return Ok(false);
        }
        if self.logger.shared.state.load(Ordering::Acquire) == STOPPED {
            return Err(LoggerError::Restart);
        }

        let shared = Arc::clone(&self.logger.shared);
        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || drain(&shared))
            .map_err(LoggerError::Spawn)?;

        self.worker = Some(handle);
        self.logger.shared.state.store(RUNNING, Ordering::Release);
        Ok(true)
    }

    /// Returns a producer handle.
    pub fn handle(&self) -> Logger {
        self.logger.clone()
    }

    /// Stops accepting records, lets the worker deliver what is queued, and
    /// joins it.
    ///
    /// Closing the channel wakes a worker that is blocked on an empty queue, so
    /// this returns promptly even when the logger is idle.
    pub fn shutdown(&mut self) {
        let shared = &self.logger.shared;
        shared.state.store(STOPPED, Ordering::Release);
        shared.channel.close();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                report_out_of_band("log worker terminated abnormally; queued records were lost");
            }
        }
    }
}

impl Deref for AsyncLogger {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.logger
    }
}

impl Drop for AsyncLogger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drain(shared: &Shared) {
    while let Some(record) = shared.channel.pop_front() {
        // Clone the Arc so a concurrent `set_sink` never waits on a slow sink.
        let sink = Arc::clone(&*shared.sink.read());
        if panic::catch_unwind(AssertUnwindSafe(|| sink.write(&record))).is_err()
            && shared.sink_failures.fetch_add(1, Ordering::AcqRel) == 0
        {
            report_out_of_band("log sink panicked; the record was dropped and logging continues");
        }
    }
}

/// Last-resort report for failures of the logging pipeline itself.
fn report_out_of_band(message: &str) {
    ConsoleSink::stderr(ColorMode::Auto).write(&LogRecord::new(Level::Error, message));
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;
    use std::time::Duration;

    use parking_lot::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct Collect(Mutex<Vec<LogRecord>>);

    impl LogSink for Collect {
        fn write(&self, record: &LogRecord) {
            self.0.lock().push(record.clone());
        }
    }

    fn config() -> LoggingConfig {
        LoggingConfig::default()
    }

    fn started(sink: Arc<dyn LogSink>) -> AsyncLogger {
        let mut logger = AsyncLogger::with_sink(&config(), sink);
        assert!(logger.init().unwrap());
        logger
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn log_before_init_is_dropped() {
        let sink = Arc::new(Collect::default());
        let mut logger = AsyncLogger::with_sink(&config(), sink.clone());
        assert_eq!(logger.info("early"), Err(LogError::NotStarted));

        logger.init().unwrap();
        logger.shutdown();
        assert!(sink.0.lock().is_empty());
    }

    #[test]
    fn init_is_idempotent() {
        let mut logger = started(Arc::new(Collect::default()));
        assert!(!logger.init().unwrap());
        assert!(logger.is_running());
    }

    #[test]
    fn log_after_shutdown_is_rejected() {
        let mut logger = started(Arc::new(Collect::default()));
        let handle = logger.handle();
        logger.shutdown();
        assert!(!handle.is_running());
        assert_eq!(handle.error("late"), Err(LogError::ShutDown));
        assert!(matches!(logger.init(), Err(LoggerError::Restart)));
    }

    #[test]
    fn shutdown_while_idle_is_bounded() {
        let mut logger = started(Arc::new(Collect::default()));
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            logger.shutdown();
            tx.send(()).ok();
        });
        assert!(rx.recv_timeout(WAIT).is_ok(), "worker did not stop");
    }

    #[test]
    fn queued_records_are_delivered_before_shutdown_returns() {
        let sink = Arc::new(Collect::default());
        let mut logger = started(sink.clone());
        for i in 0..100 {
            logger.debug(format!("m{i}")).unwrap();
        }
        logger.shutdown();
        assert_eq!(sink.0.lock().len(), 100);
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn single_producer_fifo() {
        let sink = Arc::new(Collect::default());
        let mut logger = started(sink.clone());
        for i in 0..1000 {
            logger.info(i.to_string()).unwrap();
        }
        logger.shutdown();

        let got: Vec<String> = sink.0.lock().iter().map(|r| r.message().to_owned()).collect();
        let want: Vec<String> = (0..1000).map(|i| i.to_string()).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn levels_survive_the_trip() {
        let sink = Arc::new(Collect::default());
        let mut logger = started(sink.clone());
        logger.debug("d").unwrap();
        logger.info("i").unwrap();
        logger.warning("w").unwrap();
        logger.error("e").unwrap();
        logger.shutdown();

        let levels: Vec<Level> = sink.0.lock().iter().map(LogRecord::level).collect();
        assert_eq!(levels, [Level::Debug, Level::Info, Level::Warn, Level::Error]);
    }

    #[test]
    fn default_config_delivers_debug_records() {
        let sink = Arc::new(Collect::default());
        let mut logger = AsyncLogger::with_sink(&LoggingConfig::default(), sink.clone());
        logger.init().unwrap();
        assert_eq!(logger.debug("a"), Ok(()));
        logger.shutdown();

        let got = sink.0.lock();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].to_string(), "DEBUG: a");
    }

    // ── sink failure ──────────────────────────────────────────────────────

    #[test]
    fn panicking_sink_does_not_stop_the_worker() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |r: &LogRecord| {
                if r.message() == "boom" {
                    panic!("sink rejected the record");
                }
                seen.lock().push(r.message().to_owned());
            }
        };
        let mut logger = started(Arc::new(sink));
        logger.info("boom").unwrap();
        logger.info("after").unwrap();
        logger.info("boom").unwrap();
        logger.info("last").unwrap();
        logger.shutdown();

        assert_eq!(*seen.lock(), vec!["after".to_owned(), "last".to_owned()]);
        assert_eq!(logger.sink_failures(), 2);
        assert_eq!(logger.pending(), 0);
    }

    #[test]
    fn worker_survives_a_panicking_sink_until_shutdown() {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let sink = move |r: &LogRecord| {
            if r.message() == "boom" {
                panic!("sink rejected the record");
            }
            tx.lock().send(r.message().to_owned()).ok();
        };
        let mut logger = started(Arc::new(sink));
        logger.info("boom").unwrap();
        logger.info("after").unwrap();

        // Delivered while the logger is still running, not only by shutdown.
        assert_eq!(rx.recv_timeout(WAIT).as_deref(), Ok("after"));
        assert!(logger.is_running());
        logger.shutdown();
    }

    // ── sink swap ─────────────────────────────────────────────────────────

    struct Gate {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
        seen: Mutex<Vec<String>>,
    }

    impl LogSink for Gate {
        fn write(&self, record: &LogRecord) {
            self.entered.lock().send(()).ok();
            self.release.lock().recv_timeout(WAIT).ok();
            self.seen.lock().push(record.message().to_owned());
        }
    }

    #[test]
    fn set_sink_leaves_in_flight_record_with_old_sink() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let old = Arc::new(Gate {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
            seen: Mutex::new(Vec::new()),
        });
        let new = Arc::new(Collect::default());

        let mut logger = started(old.clone());
        logger.info("first").unwrap();
        entered_rx.recv_timeout(WAIT).unwrap();

        logger.set_sink(new.clone());
        logger.info("second").unwrap();
        release_tx.send(()).unwrap();
        logger.shutdown();

        assert_eq!(*old.seen.lock(), vec!["first".to_owned()]);
        let got: Vec<String> = new.0.lock().iter().map(|r| r.message().to_owned()).collect();
        assert_eq!(got, vec!["second".to_owned()]);
    }

    #[test]
    fn sink_runs_on_the_worker_thread_only() {
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let names = Arc::clone(&names);
            move |_: &LogRecord| {
                names.lock().push(thread::current().name().map(str::to_owned));
            }
        };
        let mut logger = started(Arc::new(sink));
        logger.info("a").unwrap();
        logger.info("b").unwrap();
        logger.shutdown();

        let names = names.lock();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.as_deref() == Some("vitrine-log")));
    }
}
