//! Fixed-capacity queue of recently published excerpts
//!
//! [`RecentExcerpts`] is a ring buffer indexed by `head` and `len`: slots are
//! allocated once at construction, `enqueue` writes at `(head + len) % capacity`
//! and `dequeue` advances `head`. Capacity never changes, so `len <= capacity`
//! holds for the lifetime of the queue.
//!
//! The publish scheduler owns the only instance and uses it to avoid posting
//! the same excerpt twice in a row. It is not persisted across restarts.

use crate::types::Excerpt;

/// Peek on an empty queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("queue is empty")]
pub struct EmptyQueue;

/// Bounded FIFO of excerpts
#[derive(Debug, Clone)]
pub struct RecentExcerpts {
    slots: Vec<Option<Excerpt>>,
    head: usize,
    len: usize,
}

impl RecentExcerpts {
    /// Create an empty queue holding at most `capacity` excerpts
    ///
    /// A capacity of zero is raised to one so the queue can always hold the
    /// latest post.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            head: 0,
            len: 0,
        }
    }

    /// Append at the tail; returns `false` without changing anything when full
    pub fn enqueue(&mut self, excerpt: Excerpt) -> bool {
        if self.is_full() {
            return false;
        }
        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = Some(excerpt);
        self.len += 1;
        true
    }

    /// Remove and return the head, or `None` when empty
    pub fn dequeue(&mut self) -> Option<Excerpt> {
        if self.is_empty() {
            return None;
        }
        let excerpt = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        excerpt
    }

    /// Borrow the head without removing it
    pub fn peek(&self) -> Result<&Excerpt, EmptyQueue> {
        if self.is_empty() {
            return Err(EmptyQueue);
        }
        self.slots[self.head].as_ref().ok_or(EmptyQueue)
    }

    /// Whether the queue holds no excerpts
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the queue is at capacity
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Number of excerpts currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Maximum number of excerpts
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether `excerpt` is the current head
    pub fn is_head(&self, excerpt: &Excerpt) -> bool {
        self.peek().is_ok_and(|head| head == excerpt)
    }

    /// Iterate from head to tail
    pub fn iter(&self) -> impl Iterator<Item = &Excerpt> {
        (0..self.len).filter_map(move |offset| {
            self.slots[(self.head + offset) % self.capacity()].as_ref()
        })
    }
}
