//! Bounded priority queue feeding the worker pool

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

/// A queued item with its priority rank and arrival sequence
struct Entry<T> {
    rank: u8,
    seq: u64,
    item: T,
    /// Held until the entry is popped; frees a queue slot on drop
    _slot: OwnedSemaphorePermit,
}

// Lower rank first, then FIFO within a rank
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .rank
            .cmp(&self.rank)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

struct Inner<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
    closed: bool,
}

/// Priority queue with a depth limit
///
/// `push` waits while the queue is full. After [`RequestQueue::close`] new
/// pushes are refused, but items already queued are still handed out.
pub struct RequestQueue<T> {
    inner: Mutex<Inner<T>>,
    slots: Arc<Semaphore>,
    available: Notify,
}

impl<T> RequestQueue<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                next_seq: 0,
                closed: false,
            }),
            slots: Arc::new(Semaphore::new(limit.max(1))),
            available: Notify::new(),
        }
    }

    /// Enqueues `item`, waiting for a free slot
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The item was queued
    /// * `Err(item)` - The queue is closed
    pub async fn push(&self, rank: u8, item: T) -> Result<(), T> {
        let Ok(slot) = self.slots.clone().acquire_owned().await else {
            return Err(item);
        };

        {
            let mut inner = self.lock();
            if inner.closed {
                return Err(item);
            }
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.heap.push(Entry {
                rank,
                seq,
                item,
                _slot: slot,
            });
        }

        self.available.notify_one();
        Ok(())
    }

    /// Takes the highest-priority item, waiting while the queue is empty
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // Register before checking so a close() in between is not missed
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if let Some(entry) = inner.heap.pop() {
                    return Some(entry.item);
                }
                if inner.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Refuses further pushes and wakes every waiting consumer
    pub fn close(&self) {
        self.lock().closed = true;
        self.slots.close();
        self.available.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<T>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
