//! End-to-end tests for the asynchronous backend
//!
//! These tests verify:
//! - Submission ordering and no-loss guarantees
//! - Drain-on-stop and discard semantics
//! - Progress reporting through wait_for_drain
//! - Lifecycle edge cases (idempotent start/stop, restart, blocked submit)
//!
//! Every test owns an isolated `AsyncBackend` instance so they can run in
//! parallel without touching the process-wide backend.

use logrelay::prelude::*;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Formatter that emits the raw message, so tests can assert exact output.
struct RawFormatter;

impl Formatter for RawFormatter {
    fn format(&self, record: &LogRecord) -> String {
        record.message.clone()
    }
}

/// Sink that records every write in memory.
#[derive(Default)]
struct CollectingSink {
    writes: Mutex<Vec<String>>,
    flushes: AtomicUsize,
}

impl Sink for CollectingSink {
    fn write(&self, message: &str) -> Result<()> {
        self.writes.lock().push(message.to_string());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "collecting"
    }
}

/// Sink that sleeps on every write, to simulate slow I/O.
struct SlowSink {
    delay: Duration,
    writes: AtomicUsize,
}

impl SlowSink {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            writes: AtomicUsize::new(0),
        }
    }
}

impl Sink for SlowSink {
    fn write(&self, _message: &str) -> Result<()> {
        thread::sleep(self.delay);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Sink whose writes block until the gate is opened.
#[derive(Default)]
struct GateSink {
    open: AtomicBool,
    writes: Mutex<Vec<String>>,
    flushes: AtomicUsize,
}

impl Sink for GateSink {
    fn write(&self, message: &str) -> Result<()> {
        while !self.open.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(1));
        }
        self.writes.lock().push(message.to_string());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "gate"
    }
}

fn make_item(message: String, sink: &Arc<dyn Sink>) -> LogItem {
    LogItem::new(
        LogRecord::new(LogLevel::Info, message, "backend-test"),
        Arc::new(RawFormatter),
        vec![Arc::clone(sink)],
    )
}

fn config(queue_size: usize, batch_size: usize, discard_on_full: bool) -> BackendConfig {
    BackendConfig {
        queue_size,
        flush_interval: Duration::from_millis(10),
        batch_size,
        discard_on_full,
    }
}

#[test]
fn test_single_producer_ordering() {
    let backend = AsyncBackend::new();
    backend.start(config(16, 4, false)).expect("start failed");

    let sink = Arc::new(CollectingSink::default());
    let sink_dyn: Arc<dyn Sink> = Arc::clone(&sink) as Arc<dyn Sink>;

    for i in 0..100 {
        assert!(backend.submit(make_item(i.to_string(), &sink_dyn)));
    }

    assert!(backend.wait_for_drain(Duration::from_secs(1)));

    let writes = sink.writes.lock();
    let expected: Vec<String> = (0..100).map(|i| i.to_string()).collect();
    assert_eq!(writes.as_slice(), expected.as_slice());

    backend.stop(DEFAULT_SHUTDOWN_TIMEOUT);
}

#[test]
fn test_drain_on_stop_loses_nothing() {
    let backend = AsyncBackend::new();
    backend.start(config(8, 256, false)).expect("start failed");

    let sink = Arc::new(CollectingSink::default());
    let sink_dyn: Arc<dyn Sink> = Arc::clone(&sink) as Arc<dyn Sink>;

    let mut accepted = 0;
    for i in 0..1000 {
        if backend.submit(make_item(format!("record {}", i), &sink_dyn)) {
            accepted += 1;
        }
    }

    backend.stop(Duration::from_secs(5));

    // Every accepted record was written before stop returned.
    assert_eq!(sink.writes.lock().len(), accepted);
    assert_eq!(accepted, 1000);
    assert!(!backend.is_running());
    assert_eq!(backend.queue_size(), 0);
}

#[test]
fn test_discard_on_full_semantics() {
    let backend = AsyncBackend::new();
    backend.start(config(4, 256, true)).expect("start failed");

    let sink = Arc::new(SlowSink::new(Duration::from_millis(100)));
    let sink_dyn: Arc<dyn Sink> = Arc::clone(&sink) as Arc<dyn Sink>;

    let mut accepted = 0;
    let mut rejected = 0;
    for i in 0..1000 {
        if backend.submit(make_item(format!("burst {}", i), &sink_dyn)) {
            accepted += 1;
        } else {
            rejected += 1;
        }
    }

    assert!(rejected > 0, "a slow sink and a queue of 4 must reject bursts");
    assert!(backend.wait_for_drain(Duration::from_secs(30)));
    assert_eq!(sink.writes.load(Ordering::Relaxed), accepted);

    backend.stop(DEFAULT_SHUTDOWN_TIMEOUT);
}

#[test]
fn test_multi_producer_no_loss() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 10_000;

    let backend = Arc::new(AsyncBackend::new());
    backend.start(config(1024, 256, false)).expect("start failed");

    let sink = Arc::new(CollectingSink::default());
    let sink_dyn: Arc<dyn Sink> = Arc::clone(&sink) as Arc<dyn Sink>;

    let mut handles = Vec::new();
    for producer in 0..PRODUCERS {
        let backend = Arc::clone(&backend);
        let sink_dyn = Arc::clone(&sink_dyn);
        handles.push(thread::spawn(move || {
            for sequence in 0..PER_PRODUCER {
                let message = format!("{}:{}", producer, sequence);
                assert!(backend.submit(make_item(message, &sink_dyn)));
                // Occasional jitter so producers interleave unevenly.
                if rand::random::<u8>() < 4 {
                    thread::yield_now();
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("producer panicked");
    }

    assert!(backend.wait_for_drain(Duration::from_secs(30)));

    let writes = sink.writes.lock();
    assert_eq!(writes.len(), PRODUCERS * PER_PRODUCER);
    let unique: HashSet<&String> = writes.iter().collect();
    assert_eq!(unique.len(), PRODUCERS * PER_PRODUCER);

    drop(writes);
    backend.stop(DEFAULT_SHUTDOWN_TIMEOUT);
}

#[test]
fn test_wait_for_drain_observes_prior_submit() {
    let backend = AsyncBackend::new();
    backend.start(config(64, 256, false)).expect("start failed");

    let sink = Arc::new(CollectingSink::default());
    let sink_dyn: Arc<dyn Sink> = Arc::clone(&sink) as Arc<dyn Sink>;

    assert!(backend.submit(make_item("single".to_string(), &sink_dyn)));
    assert!(backend.wait_for_drain(Duration::from_secs(1)));
    assert_eq!(sink.writes.lock().as_slice(), ["single"]);

    backend.stop(DEFAULT_SHUTDOWN_TIMEOUT);
}

#[test]
fn test_wait_for_drain_on_empty_queue() {
    let backend = AsyncBackend::new();
    backend.start(config(64, 256, false)).expect("start failed");

    // Nothing pending: returns promptly without a worker round-trip.
    assert!(backend.wait_for_drain(Duration::from_millis(50)));

    // Repeated flushes with no submissions stay harmless.
    backend.flush();
    backend.flush();
    assert!(backend.wait_for_drain(Duration::from_millis(50)));

    backend.stop(DEFAULT_SHUTDOWN_TIMEOUT);
}

#[test]
fn test_wait_for_drain_when_stopped() {
    let backend = AsyncBackend::new();
    assert!(backend.wait_for_drain(Duration::from_millis(10)));
}

#[test]
fn test_idempotent_start_stop() {
    let backend = AsyncBackend::new();
    backend.start(BackendConfig::default()).expect("first start");
    backend.start(BackendConfig::default()).expect("second start");
    assert!(backend.is_running());

    backend.stop(DEFAULT_SHUTDOWN_TIMEOUT);
    backend.stop(DEFAULT_SHUTDOWN_TIMEOUT);
    assert!(!backend.is_running());
}

#[test]
fn test_restart_after_stop() {
    let backend = AsyncBackend::new();
    let sink = Arc::new(CollectingSink::default());
    let sink_dyn: Arc<dyn Sink> = Arc::clone(&sink) as Arc<dyn Sink>;

    backend.start(config(16, 4, false)).expect("first start");
    assert!(backend.submit(make_item("first run".to_string(), &sink_dyn)));
    backend.stop(Duration::from_secs(5));
    assert!(!backend.is_running());

    // Submissions between runs are dropped, not queued.
    assert!(!backend.submit(make_item("between runs".to_string(), &sink_dyn)));

    backend.start(config(16, 4, false)).expect("second start");
    assert!(backend.submit(make_item("second run".to_string(), &sink_dyn)));
    backend.stop(Duration::from_secs(5));

    assert_eq!(sink.writes.lock().as_slice(), ["first run", "second run"]);
}

#[test]
fn test_blocked_submit_released_by_stop() {
    let backend = Arc::new(AsyncBackend::new());
    // batch_size 1 so records still queued when stop lands are consumed by
    // the shutdown drain rather than the interrupted batch.
    backend.start(config(2, 1, false)).expect("start failed");

    let gate = Arc::new(GateSink::default());
    let gate_dyn: Arc<dyn Sink> = Arc::clone(&gate) as Arc<dyn Sink>;

    // First item is popped by the worker, which then parks inside the gated
    // write, so nothing frees queue slots from here on.
    assert!(backend.submit(make_item("a".to_string(), &gate_dyn)));
    backend.flush();
    let mut waited = 0;
    while backend.queue_size() > 0 && waited < 1000 {
        thread::sleep(Duration::from_millis(1));
        waited += 1;
    }
    assert_eq!(backend.queue_size(), 0, "worker never picked up the first item");

    assert!(backend.submit(make_item("b".to_string(), &gate_dyn)));
    assert!(backend.submit(make_item("c".to_string(), &gate_dyn)));
    assert_eq!(backend.queue_size(), 2);

    let blocked = {
        let backend = Arc::clone(&backend);
        let gate_dyn = Arc::clone(&gate_dyn);
        thread::spawn(move || backend.submit(make_item("d".to_string(), &gate_dyn)))
    };
    thread::sleep(Duration::from_millis(50));

    let stopper = {
        let backend = Arc::clone(&backend);
        thread::spawn(move || backend.stop(Duration::from_secs(10)))
    };

    // The blocked producer bails out as soon as stop is requested.
    assert!(!blocked.join().expect("blocked producer panicked"));

    gate.open.store(true, Ordering::Release);
    stopper.join().expect("stopper panicked");

    assert!(!backend.is_running());
    assert_eq!(gate.writes.lock().as_slice(), ["a", "b", "c"]);
    // "b" and "c" went through the shutdown drain, which flushes per write.
    assert!(gate.flushes.load(Ordering::Relaxed) >= 2);
}

#[test]
fn test_queue_size_is_advisory_but_bounded() {
    let backend = AsyncBackend::new();
    assert_eq!(backend.queue_size(), 0);

    backend.start(config(8, 256, true)).expect("start failed");
    let sink = Arc::new(SlowSink::new(Duration::from_millis(50)));
    let sink_dyn: Arc<dyn Sink> = Arc::clone(&sink) as Arc<dyn Sink>;

    for i in 0..50 {
        backend.submit(make_item(i.to_string(), &sink_dyn));
    }
    assert!(backend.queue_size() <= 8);

    backend.stop(DEFAULT_SHUTDOWN_TIMEOUT);
    assert_eq!(backend.queue_size(), 0);
}
