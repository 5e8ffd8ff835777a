//! Overwrite-Oldest Ring Buffer Implementation

use crate::error::RingError;
use crate::Sample;

/// Default buffer capacity (4 samples)
pub const DEFAULT_CAPACITY: usize = 4;

/// Fixed-capacity circular store of samples
///
/// `head == tail` means empty. One spare slot is allocated so that a full
/// buffer still holds `capacity` samples while keeping the two indices
/// distinct. Not internally synchronized.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// Pre-allocated storage (`capacity + 1` slots)
    storage: Box<[Sample]>,
    /// Next write slot
    head: usize,
    /// Next read slot
    tail: usize,
}

impl RingBuffer {
    /// Create a new ring buffer holding up to `capacity` samples
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let slots = capacity.max(1) + 1;
        Self {
            storage: vec![Sample::default(); slots].into_boxed_slice(),
            head: 0,
            tail: 0,
        }
    }

    /// Create a buffer with default capacity (4 samples)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    fn slots(&self) -> usize {
        self.storage.len()
    }

    /// Store a sample, dropping the oldest one if the buffer is full
    pub fn put(&mut self, sample: Sample) {
        let next_head = (self.head + 1) % self.slots();

        // Full: make room by advancing the read side first
        if next_head == self.tail {
            self.tail = (self.tail + 1) % self.slots();
        }

        self.storage[self.head] = sample;
        self.head = next_head;
    }

    /// Remove and return the oldest undelivered sample
    pub fn get(&mut self) -> Result<Sample, RingError> {
        let sample = self.peek()?;
        self.tail = (self.tail + 1) % self.slots();
        Ok(sample)
    }

    /// Return the oldest undelivered sample without consuming it
    pub fn peek(&self) -> Result<Sample, RingError> {
        if self.is_empty() {
            return Err(RingError::Empty);
        }
        Ok(self.storage[self.tail])
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Get the number of samples currently stored
    pub fn len(&self) -> usize {
        (self.head + self.slots() - self.tail) % self.slots()
    }

    /// Check if the next put will overwrite
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.slots() - 1
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
