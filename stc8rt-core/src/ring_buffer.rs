//! Single-producer/single-consumer byte ring buffer
//!
//! Safe to share between one interrupt handler and foreground code without a
//! lock, as long as each side sticks to its role:
//!
//! - the producer calls [`RingBuffer::push`] and is the only writer of `head`
//! - the consumer calls [`RingBuffer::pop`]/[`RingBuffer::peek`] and is the
//!   only writer of `tail`
//!
//! One slot is always left empty so that `head == tail` means empty and
//! `head + 1 == tail` (mod N) means full. A buffer of `N` slots therefore
//! holds at most `N - 1` bytes.

use portable_atomic::{AtomicU8, AtomicUsize, Ordering};

/// Fixed-capacity circular byte queue
pub struct RingBuffer<const N: usize> {
    slots: [AtomicU8; N],
    /// Next slot the producer writes
    head: AtomicUsize,
    /// Next slot the consumer reads
    tail: AtomicUsize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        assert!(N >= 2, "ring buffer needs at least two slots");
        Self {
            slots: [const { AtomicU8::new(0) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Maximum number of bytes the buffer can hold
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Append a byte (producer side)
    ///
    /// Never blocks. If the buffer is full the byte is handed back and the
    /// buffer is left untouched.
    pub fn push(&self, byte: u8) -> Result<(), u8> {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == self.tail.load(Ordering::Acquire) {
            return Err(byte);
        }
        self.slots[head].store(byte, Ordering::Relaxed);
        self.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Remove the oldest byte (consumer side)
    pub fn pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        let byte = self.slots[tail].load(Ordering::Relaxed);
        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(byte)
    }

    /// Look at the oldest byte without removing it (consumer side)
    pub fn peek(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        Some(self.slots[tail].load(Ordering::Relaxed))
    }

    /// Number of bytes waiting
    pub fn available(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    /// Whether no bytes are waiting
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Whether the next push would be dropped
    pub fn is_full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        (head + 1) % N == self.tail.load(Ordering::Acquire)
    }

    /// Discard everything
    ///
    /// Writes both indices, so the caller must make sure neither the producer
    /// nor the consumer can run (interrupt masked, peripheral stopped).
    pub fn reset(&self) {
        self.tail.store(0, Ordering::Release);
        self.head.store(0, Ordering::Release);
    }
}

impl<const N: usize> core::fmt::Debug for RingBuffer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("slots", &N)
            .field("head", &self.head.load(Ordering::Relaxed))
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .finish()
    }
}
