//! Asynchronous logging backend.
//!
//! The backend owns a bounded lock-free queue and exactly one worker thread.
//! Loggers materialise a [`LogItem`] (record plus formatter and sink handles)
//! and submit it; the worker pulls items in batches, formats them, and writes
//! to each sink. Producers never touch sink I/O and never wait on the worker's
//! locks.
//!
//! Progress is published through a generation counter that the worker bumps
//! once per non-empty batch, together with a busy flag raised across each
//! batch; [`AsyncBackend::wait_for_drain`] combines queue emptiness with that
//! flag to mean "everything I submitted before this call has been written".

mod queue;

pub use queue::RingQueue;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex, RwLock};

use crate::core::error::{LoggerError, Result};
use crate::core::formatter::Formatter;
use crate::core::record::LogRecord;
use crate::core::sink::Sink;

/// Timeout used when the backend is torn down without an explicit `stop`.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between polls while waiting on the drain condition or the
/// worker's running flag.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the asynchronous backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Requested queue capacity; rounded up to the next power of two.
    pub queue_size: usize,
    /// Longest the worker sleeps before re-checking the queue.
    pub flush_interval: Duration,
    /// Maximum items consumed in one batch before re-entering the loop.
    pub batch_size: usize,
    /// When true, `submit` drops the item on a full queue instead of
    /// spinning until space appears.
    pub discard_on_full: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            queue_size: 8192,
            flush_interval: Duration::from_millis(100),
            batch_size: 256,
            discard_on_full: false,
        }
    }
}

/// One unit of queue traffic: a materialised record together with the
/// formatter and sinks chosen at submission time.
///
/// The handles keep the formatter and sinks alive across the queue hop even
/// if the originating logger is reconfigured or dropped meanwhile.
pub struct LogItem {
    pub record: LogRecord,
    pub formatter: Arc<dyn Formatter>,
    pub sinks: Vec<Arc<dyn Sink>>,
}

impl LogItem {
    pub fn new(record: LogRecord, formatter: Arc<dyn Formatter>, sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self {
            record,
            formatter,
            sinks,
        }
    }
}

/// State shared between the backend handle and its worker thread.
struct BackendShared {
    running: AtomicBool,
    stop_requested: AtomicBool,
    flush_requested: AtomicBool,
    /// True while the worker is inside a batch or the shutdown drain, i.e.
    /// between popping items and completing their writes.
    worker_busy: AtomicBool,
    /// Incremented once per non-empty batch, after its writes complete.
    processed_generation: AtomicU64,
    /// Guards only the condvar predicate check; never held across queue
    /// operations or sink writes.
    wakeup_lock: Mutex<()>,
    wakeup: Condvar,
    queue: RwLock<Option<Arc<RingQueue<LogItem>>>>,
}

impl BackendShared {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            flush_requested: AtomicBool::new(false),
            worker_busy: AtomicBool::new(false),
            processed_generation: AtomicU64::new(0),
            wakeup_lock: Mutex::new(()),
            wakeup: Condvar::new(),
            queue: RwLock::new(None),
        }
    }

    fn notify_worker(&self) {
        let _guard = self.wakeup_lock.lock();
        self.wakeup.notify_all();
    }
}

/// The asynchronous logging backend: one queue, one worker thread.
///
/// The process-wide instance used by [`crate::AsyncLogger`] is reachable via
/// [`AsyncBackend::global`]; independent instances can be constructed for
/// isolated use.
pub struct AsyncBackend {
    shared: Arc<BackendShared>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    config: RwLock<BackendConfig>,
}

static GLOBAL_BACKEND: Lazy<AsyncBackend> = Lazy::new(AsyncBackend::new);

impl AsyncBackend {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(BackendShared::new()),
            worker: Mutex::new(None),
            config: RwLock::new(BackendConfig::default()),
        }
    }

    /// The process-wide backend instance.
    pub fn global() -> &'static AsyncBackend {
        &GLOBAL_BACKEND
    }

    /// Start the worker thread with the given configuration.
    ///
    /// Idempotent: a second `start` while running is a no-op. The only
    /// reported failure is the OS refusing to spawn the worker thread.
    pub fn start(&self, config: BackendConfig) -> Result<()> {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        self.shared.stop_requested.store(false, Ordering::Release);
        self.shared.flush_requested.store(false, Ordering::Release);
        self.shared.worker_busy.store(false, Ordering::Release);
        self.shared.processed_generation.store(0, Ordering::Release);

        let queue = Arc::new(RingQueue::with_capacity(config.queue_size));
        *self.shared.queue.write() = Some(Arc::clone(&queue));
        *self.config.write() = config.clone();

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("logrelay-backend".into())
            .spawn(move || worker_loop(&shared, &queue, &config));

        match spawned {
            Ok(handle) => {
                *self.worker.lock() = Some(handle);
                Ok(())
            }
            Err(source) => {
                *self.shared.queue.write() = None;
                self.shared.running.store(false, Ordering::Release);
                Err(LoggerError::WorkerSpawn(source))
            }
        }
    }

    /// Stop the worker, draining the queue first.
    ///
    /// `timeout` bounds the polling phase that waits for the worker to
    /// acknowledge the stop; the worker thread is always joined afterwards,
    /// so no thread is leaked even when the drain outlives the timeout.
    pub fn stop(&self, timeout: Duration) {
        self.shared.stop_requested.store(true, Ordering::Release);
        self.shared.notify_worker();

        let start = Instant::now();
        while self.shared.running.load(Ordering::Acquire) {
            if start.elapsed() >= timeout {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                eprintln!("[LOGRELAY] backend worker panicked during shutdown");
            }
        }

        self.shared.running.store(false, Ordering::Release);
        *self.shared.queue.write() = None;
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Submit an item for background processing.
    ///
    /// Returns false when the backend is not running, when the queue is full
    /// in discard mode, or when a blocking submit is interrupted by `stop`.
    pub fn submit(&self, item: LogItem) -> bool {
        if !self.is_running() {
            return false;
        }
        let queue = match self.shared.queue.read().clone() {
            Some(queue) => queue,
            None => return false,
        };

        if self.config.read().discard_on_full {
            return queue.try_push(item).is_ok();
        }

        let mut item = item;
        loop {
            match queue.try_push(item) {
                Ok(()) => return true,
                Err(back) => {
                    if self.shared.stop_requested.load(Ordering::Acquire) {
                        return false;
                    }
                    item = back;
                    thread::yield_now();
                }
            }
        }
    }

    /// Ask the worker to process pending items now instead of at the next
    /// `flush_interval` tick. Non-blocking.
    pub fn flush(&self) {
        if !self.is_running() {
            return;
        }
        self.shared.flush_requested.store(true, Ordering::Release);
        self.shared.notify_worker();
    }

    /// Block until every item submitted before this call has been formatted
    /// and written, or until `timeout` elapses.
    ///
    /// The drain condition is "queue empty and no batch in flight": items
    /// only leave the queue inside a worker batch, and the busy flag drops
    /// only after a batch's writes complete, so observing both means every
    /// previously submitted item has reached its sinks. A single generation
    /// target would prove only that one batch finished, which says nothing
    /// under a backlog deeper than `batch_size`.
    pub fn wait_for_drain(&self, timeout: Duration) -> bool {
        if !self.is_running() {
            return true;
        }
        let queue = match self.shared.queue.read().clone() {
            Some(queue) => queue,
            None => return true,
        };

        self.flush();

        let start = Instant::now();
        loop {
            if queue.is_empty() && !self.shared.worker_busy.load(Ordering::Acquire) {
                return true;
            }
            if !self.is_running() {
                // The worker drained the queue on its way out.
                return queue.is_empty();
            }
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Approximate number of items waiting in the queue.
    pub fn queue_size(&self) -> usize {
        self.shared
            .queue
            .read()
            .as_ref()
            .map(|queue| queue.size_approx())
            .unwrap_or(0)
    }
}

impl Default for AsyncBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AsyncBackend {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop(DEFAULT_SHUTDOWN_TIMEOUT);
        }
    }
}

fn worker_loop(shared: &BackendShared, queue: &RingQueue<LogItem>, config: &BackendConfig) {
    while !shared.stop_requested.load(Ordering::Acquire) {
        shared.worker_busy.store(true, Ordering::Release);
        let processed = process_batch(queue, config.batch_size);

        if processed > 0 {
            shared.processed_generation.fetch_add(1, Ordering::Release);
            continue;
        }
        shared.worker_busy.store(false, Ordering::Release);

        let mut guard = shared.wakeup_lock.lock();
        let wake_now = shared.stop_requested.load(Ordering::Acquire)
            || shared.flush_requested.load(Ordering::Acquire)
            || !queue.is_empty();
        if !wake_now {
            let _ = shared.wakeup.wait_for(&mut guard, config.flush_interval);
        }
        drop(guard);

        shared.flush_requested.store(false, Ordering::Release);
    }

    shared.worker_busy.store(true, Ordering::Release);
    drain_queue(queue);
    shared.worker_busy.store(false, Ordering::Release);
    shared.running.store(false, Ordering::Release);
}

/// Pop and write up to `batch_size` items. Returns the count consumed.
fn process_batch(queue: &RingQueue<LogItem>, batch_size: usize) -> usize {
    let mut count = 0;
    while count < batch_size {
        let item = match queue.try_pop() {
            Some(item) => item,
            None => break,
        };
        write_item(&item, false);
        count += 1;
    }
    count
}

/// Exhaustively consume the queue, flushing each sink after its write so the
/// output is durable before shutdown completes.
fn drain_queue(queue: &RingQueue<LogItem>) {
    while let Some(item) = queue.try_pop() {
        write_item(&item, true);
    }
}

/// Format one item and write it to each of its sinks.
///
/// The worker must survive anything user-supplied formatters or sinks throw
/// at it, so both error returns and panics are reported to stderr and
/// swallowed here.
fn write_item(item: &LogItem, flush_sinks: bool) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let formatted = item.formatter.format(&item.record);
        for sink in &item.sinks {
            if let Err(error) = sink.write(&formatted) {
                eprintln!("[LOGRELAY] sink '{}' write failed: {}", sink.name(), error);
            }
            if flush_sinks {
                if let Err(error) = sink.flush() {
                    eprintln!("[LOGRELAY] sink '{}' flush failed: {}", sink.name(), error);
                }
            }
        }
    }));

    if let Err(payload) = outcome {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "unknown panic".to_string()
        };
        eprintln!("[LOGRELAY] formatter or sink panicked: {}; record dropped", message);
    }
}
