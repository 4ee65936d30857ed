#![forbid(unsafe_code)]

use std::collections::VecDeque;

use onduty_contracts::ApprovalRequest;
use onduty_storage::SharedApprovalRequest;

/// Mirrors the per-period submission quota enforced elsewhere; the queue
/// itself is descriptive storage, not a policy gate.
pub const DEFAULT_HISTORY_CAPACITY: usize = 8;

/// Fixed-capacity rotating buffer of the most recent requests for one
/// (subject, period) pair, insertion-ordered. Overflow silently evicts the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct BoundedHistoryQueue {
    slots: VecDeque<SharedApprovalRequest>,
    capacity: usize,
}

impl BoundedHistoryQueue {
    /// Capacity is fixed for the queue's lifetime. Zero is clamped to one
    /// slot; a queue that can hold nothing cannot satisfy its contract.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Always succeeds; at capacity the logical head (oldest) is dropped
    /// before the new record takes the tail.
    pub fn enqueue(&mut self, record: SharedApprovalRequest) {
        if self.slots.len() == self.capacity {
            self.slots.pop_front();
        }
        self.slots.push_back(record);
    }

    /// Owned snapshot, oldest first. Does not track later queue or record
    /// mutations; callers serialize it as-is.
    pub fn snapshot(&self) -> Vec<ApprovalRequest> {
        self.slots.iter().map(|record| record.borrow().clone()).collect()
    }
}
