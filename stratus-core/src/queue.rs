//! Bounded byte queue
//!
//! FIFO buffer between the telemetry producers and the byte-at-a-time
//! consumers (SD logger, RTTY modulator). Capacity is fixed at compile
//! time; producers see back-pressure as a rejected push.

use heapless::Deque;

use crate::traits::PayloadSource;

/// Queue is full; the byte was not enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

/// Bounded FIFO of raw bytes.
#[derive(Debug, Default)]
pub struct ByteQueue<const N: usize> {
    buf: Deque<u8, N>,
}

impl<const N: usize> ByteQueue<N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self { buf: Deque::new() }
    }

    /// Enqueue one byte.
    pub fn push(&mut self, byte: u8) -> Result<(), QueueFull> {
        self.buf.push_back(byte).map_err(|_| QueueFull)
    }

    /// Enqueue a slice; either all bytes fit or nothing is enqueued.
    pub fn push_slice(&mut self, bytes: &[u8]) -> Result<(), QueueFull> {
        if bytes.len() > N - self.buf.len() {
            return Err(QueueFull);
        }
        for &b in bytes {
            // Cannot fail: capacity checked above
            let _ = self.buf.push_back(b);
        }
        Ok(())
    }

    /// Number of queued bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if no bytes are queued.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Total capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> PayloadSource for ByteQueue<N> {
    fn next_byte(&mut self) -> Option<u8> {
        self.buf.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q: ByteQueue<8> = ByteQueue::new();
        q.push_slice(b"abc").unwrap();
        assert_eq!(q.next_byte(), Some(b'a'));
        assert_eq!(q.next_byte(), Some(b'b'));
        assert_eq!(q.next_byte(), Some(b'c'));
        assert_eq!(q.next_byte(), None);
    }

    #[test]
    fn test_push_full() {
        let mut q: ByteQueue<2> = ByteQueue::new();
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.push(3), Err(QueueFull));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_push_slice_all_or_nothing() {
        let mut q: ByteQueue<4> = ByteQueue::new();
        q.push(0xAA).unwrap();
        assert_eq!(q.push_slice(&[1, 2, 3, 4]), Err(QueueFull));
        // The failed push must not have enqueued a partial prefix
        assert_eq!(q.len(), 1);
        q.push_slice(&[1, 2, 3]).unwrap();
        assert_eq!(q.len(), 4);
    }

    #[test]
    fn test_zero_is_ordinary_data() {
        // A zero byte must travel through the queue like any other value;
        // end-of-data is signalled out of band by `None`.
        let mut q: ByteQueue<4> = ByteQueue::new();
        q.push(0x00).unwrap();
        assert_eq!(q.next_byte(), Some(0x00));
        assert_eq!(q.next_byte(), None);
    }
}
