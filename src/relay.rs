use crate::error::RelayError;
use crate::sink::{AsyncDeliver, Deliver};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;
use tokio::sync::mpsc;

/// Queue length used by [`AsyncRelay::with_default_capacity`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// Bounded, drop-on-full hand-off between log producers and a single
/// background consumer.
///
/// Producers call [`write`](AsyncRelay::write), which copies the payload
/// into the queue if there is room and otherwise throws it away. Either
/// way it returns immediately. One worker pops payloads in FIFO order and
/// hands them to the delivery callback one at a time, so the callback is
/// never called concurrently with itself.
///
/// Dropping the relay stops it accepting payloads; the detached worker
/// drains what is queued and exits. Use [`close`](AsyncRelay::close) or
/// [`shutdown`](AsyncRelay::shutdown) to wait for that drain.
pub struct AsyncRelay {
    sender: RwLock<Option<Queue>>,
    worker: Mutex<Option<Worker>>,
    counters: Arc<Counters>,
    capacity: usize,
}

/// Producer side of the queue.
enum Queue {
    Bounded(mpsc::Sender<Vec<u8>>),
    /// Zero slots: a send only succeeds while the worker waits in `recv`.
    Rendezvous(std_mpsc::SyncSender<Vec<u8>>),
}

impl Queue {
    fn try_send(&self, payload: Vec<u8>) -> bool {
        match self {
            Queue::Bounded(tx) => tx.try_send(payload).is_ok(),
            Queue::Rendezvous(tx) => tx.try_send(payload).is_ok(),
        }
    }
}

enum Worker {
    Thread(thread::JoinHandle<()>),
    Task(tokio::task::JoinHandle<()>),
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
}

/// Point-in-time view of a relay's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Payloads accepted into the queue.
    pub enqueued: u64,
    /// Payloads discarded because the queue was full or closed.
    pub dropped: u64,
    /// Payloads the delivery callback has returned from.
    pub delivered: u64,
}

impl AsyncRelay {
    /// Start a relay whose consumer is a dedicated OS thread calling
    /// `handle` synchronously.
    ///
    /// With a `capacity` of zero nothing is queued: a write is handed
    /// straight to the worker if it is idle and dropped otherwise.
    pub fn new<D>(capacity: usize, handle: D) -> Result<Self, RelayError>
    where
        D: Deliver + 'static,
    {
        let counters = Arc::new(Counters::default());

        let (queue, worker) = if capacity == 0 {
            let (tx, rx) = std_mpsc::sync_channel::<Vec<u8>>(0);
            let worker = spawn_worker(&counters, capacity, handle, move || rx.recv().ok())?;
            (Queue::Rendezvous(tx), worker)
        } else {
            let (tx, mut rx) = mpsc::channel::<Vec<u8>>(capacity);
            let worker = spawn_worker(&counters, capacity, handle, move || rx.blocking_recv())?;
            (Queue::Bounded(tx), worker)
        };

        Ok(AsyncRelay {
            sender: RwLock::new(Some(queue)),
            worker: Mutex::new(Some(Worker::Thread(worker))),
            counters,
            capacity,
        })
    }

    /// [`AsyncRelay::new`] with [`DEFAULT_CAPACITY`].
    pub fn with_default_capacity<D>(handle: D) -> Result<Self, RelayError>
    where
        D: Deliver + 'static,
    {
        Self::new(DEFAULT_CAPACITY, handle)
    }

    /// Start a relay whose consumer is a task on the current tokio runtime
    /// awaiting `deliver` for each payload.
    ///
    /// A tokio channel always has at least one slot, so a `capacity` of
    /// zero is treated as one.
    pub fn spawn<D>(capacity: usize, deliver: D) -> Result<Self, RelayError>
    where
        D: AsyncDeliver + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RelayError::NoRuntime)?;
        let capacity = capacity.max(1);
        let counters = Arc::new(Counters::default());

        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(capacity);
        let counters_bg = Arc::clone(&counters);

        let task = runtime.spawn(async move {
            tracing::trace!(capacity, "log relay task started");
            while let Some(payload) = rx.recv().await {
                deliver.deliver(payload).await;
                counters_bg.delivered.fetch_add(1, Ordering::Relaxed);
            }
            tracing::trace!("log relay task drained");
        });

        Ok(AsyncRelay {
            sender: RwLock::new(Some(Queue::Bounded(tx))),
            worker: Mutex::new(Some(Worker::Task(task))),
            counters,
            capacity,
        })
    }

    /// Queue an owned copy of `payload`, or drop it if the queue is full
    /// or the relay is closed. Never blocks and never reports failure.
    pub fn write(&self, payload: &[u8]) {
        // try_read only fails while close() holds the write lock.
        let accepted = match self.sender.try_read() {
            Ok(guard) => match guard.as_ref() {
                Some(queue) => queue.try_send(payload.to_vec()),
                None => false,
            },
            Err(_) => false,
        };

        let counter = if accepted {
            &self.counters.enqueued
        } else {
            &self.counters.dropped
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting payloads and let the worker drain the queue.
    ///
    /// For a thread-backed relay this blocks until every queued payload
    /// has been delivered, unless it is called from the worker itself. A
    /// task-backed relay drains in the background; await
    /// [`shutdown`](AsyncRelay::shutdown) to wait for it.
    pub fn close(&self) {
        self.stop_accepting();

        // A tokio task is left in place for `shutdown` to await.
        let handle = {
            let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
            match worker.as_ref() {
                Some(Worker::Thread(h)) if h.thread().id() != thread::current().id() => {}
                _ => return,
            }
            match worker.take() {
                Some(Worker::Thread(h)) => h,
                _ => return,
            }
        };
        let _ = handle.join();
    }

    /// Stop accepting payloads and wait until the worker has drained the
    /// queue, whichever kind of worker it is.
    pub async fn shutdown(&self) {
        self.stop_accepting();
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        match worker {
            Some(Worker::Task(task)) => {
                let _ = task.await;
            }
            Some(Worker::Thread(handle)) => {
                let _ = tokio::task::spawn_blocking(move || handle.join()).await;
            }
            None => {}
        }
    }

    fn stop_accepting(&self) {
        let mut sender = self.sender.write().unwrap_or_else(PoisonError::into_inner);
        if sender.take().is_some() {
            tracing::trace!("log relay closed");
        }
    }
}

/// Start the consumer thread; `next` blocks for the next payload and
/// returns `None` once every producer handle is gone.
fn spawn_worker<D, N>(
    counters: &Arc<Counters>,
    capacity: usize,
    handle: D,
    mut next: N,
) -> io::Result<thread::JoinHandle<()>>
where
    D: Deliver + 'static,
    N: FnMut() -> Option<Vec<u8>> + Send + 'static,
{
    let counters = Arc::clone(counters);
    thread::Builder::new()
        .name("log-relay".to_string())
        .spawn(move || {
            tracing::trace!(capacity, "log relay worker started");
            while let Some(payload) = next() {
                handle.deliver(&payload);
                counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            tracing::trace!("log relay worker drained");
        })
}

impl Deliver for AsyncRelay {
    fn deliver(&self, payload: &[u8]) {
        self.write(payload);
    }
}

impl std::fmt::Debug for AsyncRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncRelay")
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn collector() -> (Arc<Mutex<Vec<Vec<u8>>>>, impl Fn(&[u8]) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |b: &[u8]| sink.lock().unwrap().push(b.to_vec()))
    }

    #[test]
    fn delivers_in_fifo_order_and_drains_on_close() {
        let (seen, handle) = collector();
        let relay = AsyncRelay::new(64, handle).unwrap();

        for i in 0..50u8 {
            relay.write(&[i]);
        }
        relay.close();

        let seen = seen.lock().unwrap();
        let expected: Vec<Vec<u8>> = (0..50u8).map(|i| vec![i]).collect();
        assert_eq!(*seen, expected);
        assert_eq!(relay.stats(), RelayStats { enqueued: 50, dropped: 0, delivered: 50 });
    }

    #[test]
    fn payload_is_copied_at_enqueue() {
        let (seen, handle) = collector();
        let relay = AsyncRelay::new(4, handle).unwrap();

        let mut buf = b"first".to_vec();
        relay.write(&buf);
        buf.copy_from_slice(b"XXXXX");
        relay.close();

        assert_eq!(seen.lock().unwrap()[0], b"first");
    }

    #[test]
    fn writes_after_close_are_dropped() {
        let (seen, handle) = collector();
        let relay = AsyncRelay::new(4, handle).unwrap();
        relay.close();
        assert!(relay.is_closed());

        relay.write(b"late");
        relay.close();

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(relay.stats().dropped, 1);
    }

    #[test]
    fn zero_capacity_hands_off_to_an_idle_worker() {
        let (seen, handle) = collector();
        let relay = AsyncRelay::new(0, handle).unwrap();
        assert_eq!(relay.capacity(), 0);

        thread::sleep(Duration::from_millis(100));
        relay.write(b"a");
        thread::sleep(Duration::from_millis(100));
        relay.write(b"b");
        relay.close();

        assert_eq!(*seen.lock().unwrap(), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(relay.stats(), RelayStats { enqueued: 2, dropped: 0, delivered: 2 });
    }

    #[test]
    fn zero_capacity_drops_while_worker_is_busy() {
        let (release_tx, release_rx) = std_mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let relay = AsyncRelay::new(0, move |_: &[u8]| {
            let _ = release_rx.lock().unwrap().recv();
        })
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        relay.write(b"taken");
        relay.write(b"busy");
        drop(release_tx);
        relay.close();

        assert_eq!(relay.stats(), RelayStats { enqueued: 1, dropped: 1, delivered: 1 });
    }

    #[test]
    fn spawn_outside_runtime_is_an_error() {
        struct Discard;

        #[async_trait::async_trait]
        impl AsyncDeliver for Discard {
            async fn deliver(&self, _payload: Vec<u8>) {}
        }

        assert!(matches!(AsyncRelay::spawn(8, Discard), Err(RelayError::NoRuntime)));
    }
}
