//! Bounded FIFO of chunks awaiting playback
//!
//! Owned by the real-time context and never touched from anywhere else, so
//! it needs no locking. Storage is reserved up front for the high-water mark
//! and `enqueue` never grows it.

use std::collections::VecDeque;

use crate::chunk::Chunk;

/// Outcome of an enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Accepted,
    /// Queue was at its high-water mark; the chunk was discarded
    Dropped,
}

/// FIFO of chunks with a hard depth limit
#[derive(Debug)]
pub struct ChunkQueue {
    chunks: VecDeque<Chunk>,
    max_depth: usize,
}

impl ChunkQueue {
    pub fn new(max_depth: usize) -> Self {
        Self {
            chunks: VecDeque::with_capacity(max_depth),
            max_depth,
        }
    }

    /// Append at the tail unless the queue is full
    pub fn enqueue(&mut self, chunk: Chunk) -> Enqueue {
        if self.chunks.len() >= self.max_depth {
            return Enqueue::Dropped;
        }
        self.chunks.push_back(chunk);
        Enqueue::Accepted
    }

    /// Remove the oldest chunk
    pub fn dequeue_front(&mut self) -> Option<Chunk> {
        self.chunks.pop_front()
    }

    /// Chunks queued and not yet started
    pub fn depth(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Discard everything queued
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Chunk {
        Chunk::mono(vec![n as f32])
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = ChunkQueue::new(60);
        for n in 0..3 {
            assert_eq!(queue.enqueue(numbered(n)), Enqueue::Accepted);
        }
        assert_eq!(queue.depth(), 3);
        for n in 0..3 {
            assert_eq!(queue.dequeue_front(), Some(numbered(n)));
        }
        assert_eq!(queue.dequeue_front(), None);
    }

    #[test]
    fn test_overflow_drops_incoming_chunk() {
        let mut queue = ChunkQueue::new(60);
        for n in 0..60 {
            assert_eq!(queue.enqueue(numbered(n)), Enqueue::Accepted);
        }

        assert_eq!(queue.enqueue(numbered(60)), Enqueue::Dropped);

        // Still the original 60, in original order
        assert_eq!(queue.depth(), 60);
        let kept: Vec<Chunk> = queue.iter().cloned().collect();
        let expected: Vec<Chunk> = (0..60).map(numbered).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_enqueue_does_not_grow_storage() {
        let mut queue = ChunkQueue::new(8);
        let capacity = queue.chunks.capacity();
        for n in 0..20 {
            queue.enqueue(numbered(n));
        }
        assert_eq!(queue.chunks.capacity(), capacity);
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut queue = ChunkQueue::new(4);
        queue.enqueue(numbered(0));
        queue.enqueue(numbered(1));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue_front(), None);
    }
}
