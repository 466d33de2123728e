use std::collections::VecDeque;

/// Record of requesters whose assignment ran to completion.
///
/// Append-only unless a capacity is set, in which case the oldest entries are
/// dropped first. Duplicates are kept when an id is reused.
#[derive(Debug, Clone, Default)]
pub struct CompletedSet {
    entries: VecDeque<String>,
    capacity: Option<usize>,
}

impl CompletedSet {
    pub fn with_capacity_limit(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn record(&mut self, requester_id: String) {
        self.entries.push_back(requester_id);
        if let Some(cap) = self.capacity {
            while self.entries.len() > cap {
                self.entries.pop_front();
            }
        }
    }

    pub fn extend(&mut self, requester_ids: impl IntoIterator<Item = String>) {
        for id in requester_ids {
            self.record(id);
        }
    }

    pub fn contains(&self, requester_id: &str) -> bool {
        self.entries.iter().any(|id| id == requester_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
