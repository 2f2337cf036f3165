//! Result queue between workers and the main-thread pump.
//!
//! Any number of worker threads push finished requests; the pump drains the
//! whole queue once per host tick. Entries come out in the order they were
//! pushed, which is completion order rather than submission order.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::logging::targets;
use crate::sink::QueuedCompletion;

/// Multi-producer, single-consumer handoff of completed requests.
#[derive(Debug, Default)]
pub struct ResultQueue {
    entries: Mutex<Vec<QueuedCompletion>>,
    closed: AtomicBool,
}

impl ResultQueue {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed request.
    ///
    /// Returns `false` if the queue has been closed; the entry is dropped
    /// without invoking its sink.
    pub fn push(&self, entry: QueuedCompletion) -> bool {
        let mut entries = self.entries.lock();
        // Checked under the lock so a push cannot slip in after close() cleared.
        if self.closed.load(Ordering::Acquire) {
            drop(entries);
            tracing::debug!(target: targets::QUEUE, id = %entry.id(), "queue closed; dropping result");
            return false;
        }
        entries.push(entry);
        true
    }

    /// Take every queued entry, in enqueue order, leaving the queue empty.
    ///
    /// Never blocks beyond the lock hold of a concurrent push.
    pub fn drain_all(&self) -> Vec<QueuedCompletion> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Number of entries waiting for delivery.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no entries are waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the queue and discard its contents.
    ///
    /// Discarded sinks are dropped, never invoked. Later pushes are
    /// rejected. Returns the number of discarded entries.
    pub fn close(&self) -> usize {
        let discarded = {
            let mut entries = self.entries.lock();
            self.closed.store(true, Ordering::Release);
            std::mem::take(&mut *entries)
        };
        // Sinks are dropped outside the lock; their captures may run Drop code.
        discarded.len()
    }

    /// Discard queued entries without closing.
    pub fn clear(&self) -> usize {
        let discarded = self.drain_all();
        discarded.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::RequestOutcome;
    use crate::sink::{CompletionSink, RequestId};
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    fn entry(tag: &str, counter: Arc<AtomicUsize>) -> QueuedCompletion {
        QueuedCompletion::new(
            RequestId::next(),
            RequestOutcome {
                success: true,
                status: 200,
                body: tag.to_string(),
                ..Default::default()
            },
            CompletionSink::basic(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn drain_preserves_push_order() {
        let queue = ResultQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for tag in ["a", "b", "c"] {
            assert!(queue.push(entry(tag, counter.clone())));
        }
        assert_eq!(queue.len(), 3);

        let bodies: Vec<_> = queue
            .drain_all()
            .iter()
            .map(|e| e.outcome().body.clone())
            .collect();
        assert_eq!(bodies, ["a", "b", "c"]);
        assert!(queue.is_empty());
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn close_discards_without_invoking() {
        let queue = ResultQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        queue.push(entry("a", counter.clone()));
        queue.push(entry("b", counter.clone()));

        assert_eq!(queue.close(), 2);
        assert!(queue.is_closed());
        assert!(!queue.push(entry("late", counter.clone())));
        assert!(queue.drain_all().is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clear_keeps_queue_open() {
        let queue = ResultQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        queue.push(entry("a", counter.clone()));
        assert_eq!(queue.clear(), 1);
        assert!(queue.push(entry("b", counter)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        for n in [1usize, 10, 1000] {
            let queue = Arc::new(ResultQueue::new());
            let counter = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..n)
                .map(|i| {
                    let queue = queue.clone();
                    let counter = counter.clone();
                    std::thread::spawn(move || {
                        queue.push(entry(&i.to_string(), counter));
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let drained = queue.drain_all();
            assert_eq!(drained.len(), n);
            let mut bodies: Vec<usize> = drained
                .iter()
                .map(|e| e.outcome().body.parse().unwrap())
                .collect();
            bodies.sort_unstable();
            assert_eq!(bodies, (0..n).collect::<Vec<_>>());

            for e in drained {
                e.deliver();
            }
            assert_eq!(counter.load(Ordering::SeqCst), n);
        }
    }
}
