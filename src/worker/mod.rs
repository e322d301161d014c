//! # Worker Boundary
//!
//! Each compute component runs on its own dedicated thread and is reached
//! only through messages:
//!
//! ```text
//!   host task ──(RequestId, Request)──▶ bounded mpsc ──▶ worker thread
//!       ▲                                                     │
//!       └───────────── oneshot (RequestId, Result) ◀──────────┘
//! ```
//!
//! A worker handles one request at a time, in send order, so `push` then
//! `undo` always observe a consistent history. Nothing is shared between
//! workers or between a worker and the host beyond message payloads.
//!
//! Failures never cross the boundary as panics. A panicking request is
//! caught on the worker thread and answered with [`VectraError::Panicked`];
//! a worker whose initialization failed answers every request with
//! [`VectraError::Unavailable`]; a closed queue yields
//! [`VectraError::Disconnected`]. Every call gets a reply.
//!
//! There is no cancellation. A host that no longer cares about a request
//! ignores its reply; [`StaleGuard`] tracks which replies are still wanted.

pub mod services;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use tokio::sync::{mpsc, oneshot};

use crate::config::WorkerConfig;
use crate::VectraError;

/// Correlation id attached to every request and echoed in its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Synchronous request handler living on a worker thread.
pub trait Service: 'static {
    type Request: Send + 'static;
    type Response: Send + 'static;

    /// Short name used for the thread, log spans and error messages.
    const NAME: &'static str;

    fn handle(&mut self, request: Self::Request) -> Result<Self::Response, VectraError>;
}

/// A worker's answer to one request.
#[derive(Debug)]
pub struct Reply<T> {
    pub id: RequestId,
    pub result: Result<T, VectraError>,
}

struct Envelope<S: Service> {
    id: RequestId,
    request: S::Request,
    reply: oneshot::Sender<Reply<S::Response>>,
}

/// A request that has been queued but whose reply has not been awaited.
pub struct Pending<T> {
    id: RequestId,
    worker: &'static str,
    rx: Option<oneshot::Receiver<Reply<T>>>,
}

impl<T> Pending<T> {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Wait for the reply. Always resolves, with `Disconnected` if the
    /// worker went away.
    pub async fn wait(self) -> Reply<T> {
        let disconnected = Reply {
            id: self.id,
            result: Err(VectraError::Disconnected {
                worker: self.worker,
            }),
        };
        match self.rx {
            Some(rx) => rx.await.unwrap_or(disconnected),
            None => disconnected,
        }
    }
}

/// Host-side handle to one worker thread. Dropping it stops the worker
/// once the queued requests are drained.
pub struct WorkerHandle<S: Service> {
    tx: mpsc::Sender<Envelope<S>>,
    next_id: AtomicU64,
}

impl<S: Service> WorkerHandle<S> {
    /// Start the worker thread. `init` runs on that thread; if it fails,
    /// the worker stays up and answers everything with `Unavailable`.
    pub fn spawn<F>(init: F, config: &WorkerConfig) -> Result<Self, VectraError>
    where
        F: FnOnce() -> Result<S, VectraError> + Send + 'static,
    {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        thread::Builder::new()
            .name(format!("vectra-{}", S::NAME))
            .spawn(move || run_worker(init, rx))
            .map_err(|e| VectraError::Unavailable {
                worker: S::NAME,
                reason: format!("failed to start thread: {}", e),
            })?;
        Ok(WorkerHandle {
            tx,
            next_id: AtomicU64::new(1),
        })
    }

    /// Queue a request, waiting for queue capacity if needed.
    pub async fn submit(&self, request: S::Request) -> Pending<S::Response> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply, rx) = oneshot::channel();
        let sent = self
            .tx
            .send(Envelope { id, request, reply })
            .await
            .is_ok();
        Pending {
            id,
            worker: S::NAME,
            rx: sent.then_some(rx),
        }
    }

    /// Queue a request and wait for its reply.
    pub async fn call(&self, request: S::Request) -> Reply<S::Response> {
        self.submit(request).await.wait().await
    }
}

fn run_worker<S, F>(init: F, mut rx: mpsc::Receiver<Envelope<S>>)
where
    S: Service,
    F: FnOnce() -> Result<S, VectraError>,
{
    let span = tracing::debug_span!("worker", name = S::NAME);
    let _enter = span.enter();

    let mut state: Result<S, String> = match panic::catch_unwind(AssertUnwindSafe(init)) {
        Ok(Ok(service)) => {
            tracing::debug!("worker ready");
            Ok(service)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "worker failed to initialize");
            Err(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(error = %message, "worker panicked during initialization");
            Err(message)
        }
    };

    while let Some(envelope) = rx.blocking_recv() {
        let Envelope { id, request, reply } = envelope;
        let result = match &mut state {
            Ok(service) => {
                match panic::catch_unwind(AssertUnwindSafe(|| service.handle(request))) {
                    Ok(result) => result,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::warn!(request = %id, error = %message, "request panicked");
                        Err(VectraError::Panicked {
                            worker: S::NAME,
                            message,
                        })
                    }
                }
            }
            Err(reason) => Err(VectraError::Unavailable {
                worker: S::NAME,
                reason: reason.clone(),
            }),
        };
        if reply.send(Reply { id, result }).is_err() {
            tracing::trace!(request = %id, "reply dropped, host stopped waiting");
        }
    }

    tracing::debug!("worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Remembers the latest request id per key so replies to superseded
/// requests can be discarded.
#[derive(Debug)]
pub struct StaleGuard<K> {
    latest: HashMap<K, RequestId>,
}

impl<K: Eq + Hash> Default for StaleGuard<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> StaleGuard<K> {
    pub fn new() -> Self {
        StaleGuard {
            latest: HashMap::new(),
        }
    }

    /// Record `id` as the request whose reply is wanted for `key`.
    pub fn track(&mut self, key: K, id: RequestId) {
        self.latest.insert(key, id);
    }

    pub fn is_current(&self, key: &K, id: RequestId) -> bool {
        self.latest.get(key) == Some(&id)
    }

    /// True if `id` is the latest request for `key`; the key is then
    /// forgotten so a duplicate reply is rejected.
    pub fn accept(&mut self, key: &K, id: RequestId) -> bool {
        if self.is_current(key, id) {
            self.latest.remove(key);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        total: u64,
    }

    enum CounterRequest {
        Add(u64),
        Boom,
    }

    impl Service for Counter {
        type Request = CounterRequest;
        type Response = u64;
        const NAME: &'static str = "counter";

        fn handle(&mut self, request: CounterRequest) -> Result<u64, VectraError> {
            match request {
                CounterRequest::Add(n) => {
                    self.total += n;
                    Ok(self.total)
                }
                CounterRequest::Boom => panic!("counter exploded"),
            }
        }
    }

    fn counter() -> WorkerHandle<Counter> {
        WorkerHandle::spawn(|| Ok(Counter { total: 0 }), &WorkerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_requests_processed_in_order() {
        let worker = counter();
        let a = worker.submit(CounterRequest::Add(1)).await;
        let b = worker.submit(CounterRequest::Add(10)).await;
        let c = worker.submit(CounterRequest::Add(100)).await;
        assert_eq!(c.wait().await.result.unwrap(), 111);
        assert_eq!(a.wait().await.result.unwrap(), 1);
        assert_eq!(b.wait().await.result.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_reply_echoes_request_id() {
        let worker = counter();
        let pending = worker.submit(CounterRequest::Add(5)).await;
        let id = pending.id();
        assert_eq!(pending.wait().await.id, id);
        let next = worker.call(CounterRequest::Add(1)).await;
        assert!(next.id > id);
    }

    #[tokio::test]
    async fn test_panic_becomes_error_and_worker_survives() {
        let worker = counter();
        worker.call(CounterRequest::Add(2)).await.result.unwrap();
        let reply = worker.call(CounterRequest::Boom).await;
        match reply.result {
            Err(VectraError::Panicked { worker, message }) => {
                assert_eq!(worker, "counter");
                assert!(message.contains("counter exploded"));
            }
            other => panic!("expected panic error, got {:?}", other),
        }
        assert_eq!(worker.call(CounterRequest::Add(3)).await.result.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_failed_init_short_circuits() {
        let worker: WorkerHandle<Counter> = WorkerHandle::spawn(
            || Err(VectraError::InvalidConfig("no module".to_string())),
            &WorkerConfig::default(),
        )
        .unwrap();
        for _ in 0..2 {
            let reply = worker.call(CounterRequest::Add(1)).await;
            assert!(matches!(
                reply.result,
                Err(VectraError::Unavailable { worker: "counter", .. })
            ));
        }
    }

    #[test]
    fn test_spawn_rejects_zero_capacity() {
        let result: Result<WorkerHandle<Counter>, _> = WorkerHandle::spawn(
            || Ok(Counter { total: 0 }),
            &WorkerConfig { queue_capacity: 0 },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_stale_guard_discards_superseded() {
        let mut guard = StaleGuard::new();
        guard.track("button-1", RequestId(1));
        guard.track("button-1", RequestId(2));
        assert!(!guard.accept(&"button-1", RequestId(1)));
        assert!(guard.accept(&"button-1", RequestId(2)));
        assert!(!guard.accept(&"button-1", RequestId(2)));
        assert!(guard.is_empty());
    }
}
