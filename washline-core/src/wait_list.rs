use std::collections::VecDeque;

use crate::types::Request;

/// Strict FIFO of pending requests. Insertion order is promotion order.
#[derive(Debug, Clone, Default)]
pub struct WaitList {
    entries: VecDeque<Request>,
}

impl WaitList {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Appends to the tail. No deduplication and no capacity bound.
    pub fn enqueue(&mut self, request: Request) {
        self.entries.push_back(request);
    }

    /// Removes and returns the earliest-arrived request.
    pub fn dequeue_head(&mut self) -> Option<Request> {
        self.entries.pop_front()
    }

    pub fn peek_head(&self) -> Option<&Request> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-based queue position of the first entry with this id.
    pub fn position_of(&self, requester_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|r| r.requester_id == requester_id)
            .map(|i| i + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.entries.iter()
    }

    /// Current queue contents, head first.
    pub fn to_vec(&self) -> Vec<Request> {
        self.entries.iter().cloned().collect()
    }
}
