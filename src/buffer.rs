//! Bounded, thread-safe ingestion buffer between the MQTT task and the
//! monitor loop.
//!
//! The buffer is the single owner of retained readings. The network side
//! calls [`IngestBuffer::push`] from its delivery task; the consumer calls
//! [`IngestBuffer::snapshot`] on its own schedule and receives an
//! independent copy, so producer-side eviction can never invalidate data a
//! consumer is iterating. When full, pushing evicts the oldest entry first
//! (strict FIFO), which makes the buffer a sliding window over the most
//! recent readings.
//!
//! Alongside the window itself the buffer tracks two pieces of state that
//! must survive eviction: a monotonic count of every reading ever pushed,
//! and the most recent decode failure reported by the network side.

use crate::core::Reading;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Cloneable handle to the shared ingestion buffer.
#[derive(Clone)]
pub struct IngestBuffer {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    readings: VecDeque<Reading>,
    capacity: usize,
    total_pushed: u64,
    last_error: Option<String>,
}

impl IngestBuffer {
    /// Create a buffer holding at most `capacity` readings.
    ///
    /// Capacity is validated as nonzero at configuration time; a zero value
    /// reaching this constructor is clamped to one rather than panicking in
    /// the delivery path.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                readings: VecDeque::with_capacity(capacity),
                capacity,
                total_pushed: 0,
                last_error: None,
            })),
        }
    }

    /// Append a reading, evicting the oldest entry when at capacity.
    ///
    /// O(1) amortized; holds the lock only for the enqueue itself, so the
    /// network delivery task is never blocked beyond that window.
    pub fn push(&self, reading: Reading) {
        let mut inner = self.inner.lock();
        if inner.readings.len() >= inner.capacity {
            inner.readings.pop_front();
        }
        inner.readings.push_back(reading);
        inner.total_pushed += 1;
    }

    /// A consistent, independent copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Reading> {
        let inner = self.inner.lock();
        inner.readings.iter().cloned().collect()
    }

    /// Number of readings currently retained.
    pub fn len(&self) -> usize {
        self.inner.lock().readings.len()
    }

    /// Whether the buffer currently holds no readings.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().readings.is_empty()
    }

    /// Monotonic count of all readings ever pushed, independent of eviction.
    pub fn total_pushed(&self) -> u64 {
        self.inner.lock().total_pushed
    }

    /// Record a non-fatal decode failure from the network side.
    pub fn record_decode_error(&self, error: impl Into<String>) {
        self.inner.lock().last_error = Some(error.into());
    }

    /// The most recent decode failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }
}
