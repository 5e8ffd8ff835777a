//! Data Lock Domain: sample ring plus wake-up channel

use crate::readiness::Readiness;
use parking_lot::Mutex;
use ring_buffer::{RingBuffer, Sample};
use sampler::SamplePublisher;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Ring buffer guarded by the data lock, with a notify channel for waiters
///
/// Producers commit under the lock and notify after releasing it. Waiters
/// must `enable()` the [`Notified`] future from [`DataChannel::notified`]
/// before re-checking their predicate, so a put that lands between the check
/// and the await still wakes them.
#[derive(Debug)]
pub struct DataChannel {
    ring: Mutex<RingBuffer>,
    ready: Notify,
    closed: AtomicBool,
}

impl DataChannel {
    /// Create a channel with room for `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(RingBuffer::new(capacity)),
            ready: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Remove the oldest sample, if any
    pub fn try_take(&self) -> Option<Sample> {
        self.ring.lock().get().ok()
    }

    /// Current readiness, computed in one critical section without consuming
    pub fn readiness(&self) -> Readiness {
        let ring = self.ring.lock();
        let mut readiness = Readiness::empty();

        if let Ok(oldest) = ring.peek() {
            readiness |= Readiness::READABLE;
            if oldest.is_alert() {
                readiness |= Readiness::ALERT;
            }
        }
        readiness
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }

    /// Register for the next wake-up
    pub fn notified(&self) -> Notified<'_> {
        self.ready.notified()
    }

    /// Mark the channel closed and wake every waiter
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.ready.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl SamplePublisher for DataChannel {
    fn publish(&self, sample: Sample) {
        self.ring.lock().put(sample);
        self.ready.notify_waiters();
    }
}
