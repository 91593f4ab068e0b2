//! FIFO frame queue.
//!
//! The monitor keeps three independent instances (primary, matched, retry).
//! Frames move between them by value, so a frame is owned by exactly one
//! queue at a time.

use std::collections::VecDeque;

use crate::error::{MonitorError, Result};
use crate::protocol::Frame;

/// Unbounded first-in first-out queue of frames.
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<Frame>,
}

impl FrameQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            frames: VecDeque::new(),
        }
    }

    /// Add a frame at the tail.
    #[inline]
    pub fn enqueue(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    /// Remove the frame at the head.
    ///
    /// # Errors
    ///
    /// Returns `EmptyQueue` if there is nothing to remove. Callers are
    /// expected to check [`is_empty`](Self::is_empty) first.
    pub fn dequeue(&mut self) -> Result<Frame> {
        self.frames.pop_front().ok_or(MonitorError::EmptyQueue)
    }

    /// Head of the queue without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&Frame> {
        self.frames.front()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Move every frame of `other` to the tail, keeping their order.
    pub fn append(&mut self, mut other: FrameQueue) {
        self.frames.append(&mut other.frames);
    }

    /// Borrow frames in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Visit every frame by draining into a staging queue and restoring.
    ///
    /// The visitor may update frame metadata. After the call the queue holds
    /// the same frames in the same order.
    pub fn inspect<T, F>(&mut self, mut visit: F) -> Vec<T>
    where
        F: FnMut(&mut Frame) -> T,
    {
        let mut staged = FrameQueue::new();
        let mut results = Vec::with_capacity(self.len());

        while let Some(mut frame) = self.frames.pop_front() {
            results.push(visit(&mut frame));
            staged.enqueue(frame);
        }

        *self = staged;
        results
    }
}

impl FromIterator<Frame> for FrameQueue {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl Extend<Frame> for FrameQueue {
    fn extend<I: IntoIterator<Item = Frame>>(&mut self, iter: I) {
        self.frames.extend(iter);
    }
}

impl IntoIterator for FrameQueue {
    type Item = Frame;
    type IntoIter = std::collections::vec_deque::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: u64) -> Frame {
        Frame::from_slice(id, &[id as u8; 4]).unwrap()
    }

    fn ids(queue: &FrameQueue) -> Vec<u64> {
        queue.iter().map(Frame::id).collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = FrameQueue::new();
        for id in 1..=3 {
            queue.enqueue(frame(id));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().map(Frame::id), Some(1));
        assert_eq!(queue.dequeue().unwrap().id(), 1);
        assert_eq!(queue.dequeue().unwrap().id(), 2);
        assert_eq!(queue.dequeue().unwrap().id(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_empty_fails() {
        let mut queue = FrameQueue::new();
        assert!(matches!(queue.dequeue(), Err(MonitorError::EmptyQueue)));
        assert!(queue.peek().is_none());
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut queue = FrameQueue::new();
        queue.enqueue(frame(9));

        assert_eq!(queue.peek().map(Frame::id), Some(9));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_duplicates_allowed() {
        let mut queue = FrameQueue::new();
        queue.enqueue(frame(1));
        queue.enqueue(frame(1));
        assert_eq!(ids(&queue), [1, 1]);
    }

    #[test]
    fn test_inspect_preserves_order() {
        let mut queue: FrameQueue = (1..=50).map(frame).collect();

        let seen = queue.inspect(|f| f.id());

        assert_eq!(seen, (1..=50).collect::<Vec<_>>());
        assert_eq!(ids(&queue), (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_inspect_twice_is_stable() {
        let mut queue: FrameQueue = [3, 1, 2].into_iter().map(frame).collect();
        let first = queue.inspect(|f| f.id());
        let second = queue.inspect(|f| f.id());
        assert_eq!(first, [3, 1, 2]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_inspect_empty() {
        let mut queue = FrameQueue::new();
        let seen: Vec<u64> = queue.inspect(|f| f.id());
        assert!(seen.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_append_keeps_order() {
        let mut a: FrameQueue = (1..=2).map(frame).collect();
        let b: FrameQueue = (3..=4).map(frame).collect();

        a.append(b);
        assert_eq!(ids(&a), [1, 2, 3, 4]);
    }

    #[test]
    fn test_extend_and_into_iter() {
        let mut queue = FrameQueue::new();
        queue.extend((1..=3).map(frame));

        let drained: Vec<u64> = queue.into_iter().map(|f| f.id()).collect();
        assert_eq!(drained, [1, 2, 3]);
    }
}
