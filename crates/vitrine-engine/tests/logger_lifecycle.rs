use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use vitrine_engine::logging::{AsyncLogger, Level, LogBuffer, LogLine, LoggingConfig};

fn config() -> LoggingConfig {
    LoggingConfig {
        install_facade: false,
        ..LoggingConfig::default()
    }
}

fn started(buffer: &LogBuffer) -> AsyncLogger {
    let mut logger = AsyncLogger::with_sink(&config(), Arc::new(buffer.clone()));
    assert!(logger.init().unwrap());
    logger
}

fn line(level: Level, text: &str) -> LogLine {
    LogLine {
        level,
        text: text.to_string(),
    }
}

#[test]
fn handoff_between_threads_preserves_global_order() {
    let buffer = LogBuffer::default();
    let mut logger = started(&buffer);

    let (to_b, wait_b) = mpsc::channel::<()>();
    let (to_c, wait_c) = mpsc::channel::<()>();

    let a = {
        let log = logger.handle();
        thread::spawn(move || {
            log.debug("a").unwrap();
            to_b.send(()).unwrap();
        })
    };
    let b = {
        let log = logger.handle();
        thread::spawn(move || {
            wait_b.recv().unwrap();
            log.warning("b").unwrap();
            to_c.send(()).unwrap();
        })
    };
    let c = {
        let log = logger.handle();
        thread::spawn(move || {
            wait_c.recv().unwrap();
            log.error("c").unwrap();
        })
    };

    for t in [a, b, c] {
        t.join().unwrap();
    }
    logger.shutdown();

    assert_eq!(
        buffer.lines(),
        vec![
            line(Level::Debug, "DEBUG: a"),
            line(Level::Warn, "WARNING: b"),
            line(Level::Error, "ERROR: c"),
        ]
    );
}

#[test]
fn concurrent_producers_deliver_everything_once_in_per_thread_order() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 250;

    let buffer = LogBuffer::new(THREADS * PER_THREAD);
    let mut logger = started(&buffer);

    let producers: Vec<_> = (0..THREADS)
        .map(|t| {
            let log = logger.handle();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    log.info(format!("{t}:{i}")).unwrap();
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }
    logger.shutdown();

    let lines = buffer.lines();
    assert_eq!(lines.len(), THREADS * PER_THREAD);

    let mut next = [0usize; THREADS];
    for l in &lines {
        let body = l.text.strip_prefix("INFO: ").unwrap();
        let (t, i) = body.split_once(':').unwrap();
        let (t, i): (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
        assert_eq!(i, next[t], "thread {t} out of order");
        next[t] += 1;
    }
    assert_eq!(next, [PER_THREAD; THREADS]);
}

#[test]
fn idle_logger_shuts_down_promptly() {
    let buffer = LogBuffer::default();
    let mut logger = started(&buffer);

    // Let the worker block on the empty queue.
    thread::sleep(Duration::from_millis(50));

    let t0 = Instant::now();
    logger.shutdown();
    assert!(t0.elapsed() < Duration::from_secs(2));
    assert!(buffer.is_empty());
}

#[test]
fn handles_outliving_the_service_are_rejected() {
    let buffer = LogBuffer::default();
    let log = {
        let logger = started(&buffer);
        logger.handle()
    };

    assert!(!log.is_running());
    assert!(log.info("late").is_err());
    assert!(buffer.is_empty());
}
