//! Request queue (C7).
//!
//! FIFO admission control: up to `max_in_flight` concurrently running
//! operations, bounded by a `tokio::sync::Semaphore` — tokio grants
//! semaphore permits to waiters in the order they started waiting, which is
//! what gives the admitted-order guarantee — plus a `max_queue_len` cap on
//! submissions still waiting for a permit. Submissions beyond that cap are
//! rejected synchronously. Lifecycle events fan out to observers registered
//! at construction as a best-effort broadcast.

use crate::cancellation::CancellationToken;
use crate::error::EngineError;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Snapshot published on every enqueue/start/finish transition.
#[derive(Debug, Clone)]
pub struct QueueEvent {
    pub in_flight_count: usize,
    pub in_flight_urls: Vec<String>,
    pub max_in_flight: usize,
}

/// Registered at construction; invoked fire-and-forget on every transition.
/// A panicking observer must not stall admission, so calls are wrapped in
/// `catch_unwind` and the panic is swallowed after a log line.
pub trait QueueObserver: Send + Sync {
    fn on_event(&self, event: &QueueEvent);
}

fn notify(observers: &[Arc<dyn QueueObserver>], event: &QueueEvent) {
    for observer in observers {
        if std::panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(event))).is_err() {
            tracing::warn!("queue observer panicked, ignoring");
        }
    }
}

struct Inner {
    semaphore: Arc<Semaphore>,
    waiting: AtomicUsize,
    in_flight: Mutex<Vec<String>>,
    max_in_flight: usize,
    max_queue_len: usize,
    observers: Vec<Arc<dyn QueueObserver>>,
}

impl Inner {
    fn snapshot(&self) -> QueueEvent {
        let in_flight_urls = self.in_flight.lock().expect("queue mutex poisoned").clone();
        QueueEvent {
            in_flight_count: in_flight_urls.len(),
            in_flight_urls,
            max_in_flight: self.max_in_flight,
        }
    }

    fn notify_enqueue(&self) {
        notify(&self.observers, &self.snapshot());
    }

    fn notify_start(&self, url: &str) {
        self.in_flight
            .lock()
            .expect("queue mutex poisoned")
            .push(url.to_string());
        notify(&self.observers, &self.snapshot());
    }

    fn notify_finish(&self, url: &str) {
        {
            let mut guard = self.in_flight.lock().expect("queue mutex poisoned");
            if let Some(pos) = guard.iter().position(|u| u == url) {
                guard.remove(pos);
            }
        }
        notify(&self.observers, &self.snapshot());
    }
}

/// Held by an admitted request for the duration of its run. Dropping it
/// releases the in-flight slot and the waiting semaphore permit, and
/// publishes a "finish" event — this happens regardless of how the holder's
/// future ends (normal return, early `?`, or cancellation), since `Drop`
/// always runs.
pub struct QueuePermit {
    inner: Arc<Inner>,
    url: String,
    _permit: OwnedSemaphorePermit,
}

impl Drop for QueuePermit {
    fn drop(&mut self) {
        self.inner.notify_finish(&self.url);
    }
}

/// FIFO, single-concurrency-by-default admission layer.
pub struct RequestQueue {
    inner: Arc<Inner>,
}

impl RequestQueue {
    #[must_use]
    pub fn new(
        max_in_flight: usize,
        max_queue_len: usize,
        observers: Vec<Arc<dyn QueueObserver>>,
    ) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            inner: Arc::new(Inner {
                semaphore: Arc::new(Semaphore::new(max_in_flight)),
                waiting: AtomicUsize::new(0),
                in_flight: Mutex::new(Vec::new()),
                max_in_flight,
                max_queue_len,
                observers,
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> QueueEvent {
        self.inner.snapshot()
    }

    /// Admits `url`, waiting for a free slot in FIFO order.
    ///
    /// Returns `Err(EngineError::QueueFull)` synchronously if the waiting
    /// backlog is already at `max_queue_len`, or `Err(EngineError::Cancelled)`
    /// if `token` trips before a permit is granted: cancellation by the
    /// submitter while waiting removes the entry from the queue.
    pub async fn admit(
        &self,
        url: &str,
        token: &mut CancellationToken,
    ) -> Result<QueuePermit, EngineError> {
        if token.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let previous = self.inner.waiting.fetch_add(1, Ordering::SeqCst);
        if previous >= self.inner.max_queue_len {
            self.inner.waiting.fetch_sub(1, Ordering::SeqCst);
            return Err(EngineError::QueueFull(format!(
                "queue already has {} submissions waiting",
                self.inner.max_queue_len
            )));
        }
        self.inner.notify_enqueue();

        let semaphore = Arc::clone(&self.inner.semaphore);
        let permit = tokio::select! {
            biased;
            () = token.cancelled() => {
                self.inner.waiting.fetch_sub(1, Ordering::SeqCst);
                return Err(EngineError::Cancelled);
            }
            acquired = semaphore.acquire_owned() => {
                self.inner.waiting.fetch_sub(1, Ordering::SeqCst);
                acquired.expect("semaphore is never closed")
            }
        };

        self.inner.notify_start(url);
        Ok(QueuePermit {
            inner: Arc::clone(&self.inner),
            url: url.to_string(),
            _permit: permit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::cancellation_pair;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingObserver {
        events: StdMutex<Vec<QueueEvent>>,
    }

    impl QueueObserver for RecordingObserver {
        fn on_event(&self, event: &QueueEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    struct PanickingObserver;
    impl QueueObserver for PanickingObserver {
        fn on_event(&self, _event: &QueueEvent) {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn admits_immediately_when_under_capacity() {
        let queue = RequestQueue::new(1, 10, Vec::new());
        let mut token = CancellationToken::none();
        let permit = queue.admit("https://a.example", &mut token).await.unwrap();
        assert_eq!(queue.snapshot().in_flight_count, 1);
        drop(permit);
        assert_eq!(queue.snapshot().in_flight_count, 0);
    }

    #[tokio::test]
    async fn fifo_order_is_preserved_under_single_concurrency() {
        let queue = Arc::new(RequestQueue::new(1, 10, Vec::new()));
        let order = Arc::new(StdMutex::new(Vec::new()));

        let first = queue.admit("a", &mut CancellationToken::none()).await.unwrap();

        let q2 = Arc::clone(&queue);
        let o2 = Arc::clone(&order);
        let second = tokio::spawn(async move {
            let permit = q2.admit("b", &mut CancellationToken::none()).await.unwrap();
            o2.lock().unwrap().push("b");
            permit
        });
        let q3 = Arc::clone(&queue);
        let o3 = Arc::clone(&order);
        let third = tokio::spawn(async move {
            let permit = q3.admit("c", &mut CancellationToken::none()).await.unwrap();
            o3.lock().unwrap().push("c");
            permit
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        order.lock().unwrap().push("a-releases");
        drop(first);

        let _b = second.await.unwrap();
        let _c = third.await.unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec!["a-releases".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn rejects_synchronously_once_waiting_backlog_is_full() {
        let queue = Arc::new(RequestQueue::new(1, 1, Vec::new()));
        let _running = queue.admit("running", &mut CancellationToken::none()).await.unwrap();

        let q2 = Arc::clone(&queue);
        let waiter = tokio::spawn(async move {
            q2.admit("waiting", &mut CancellationToken::none()).await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let rejected = queue.admit("overflow", &mut CancellationToken::none()).await;
        assert!(matches!(rejected, Err(EngineError::QueueFull(_))));

        waiter.abort();
    }

    #[tokio::test]
    async fn cancellation_while_waiting_releases_the_slot() {
        let queue = Arc::new(RequestQueue::new(1, 10, Vec::new()));
        let _running = queue.admit("running", &mut CancellationToken::none()).await.unwrap();

        let (source, mut token) = cancellation_pair();
        let q2 = Arc::clone(&queue);
        let waiter = tokio::spawn(async move { q2.admit("waiting", &mut token).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        source.cancel();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }

    #[tokio::test]
    async fn observer_panic_does_not_stop_admission() {
        let observers: Vec<Arc<dyn QueueObserver>> =
            vec![Arc::new(PanickingObserver), Arc::new(RecordingObserver::default())];
        let queue = RequestQueue::new(1, 10, observers);
        let permit = queue.admit("a", &mut CancellationToken::none()).await.unwrap();
        drop(permit);
    }
}
