use std::collections::VecDeque;

use serde_json::Value;
use tracing::warn;

#[derive(Debug)]
pub struct QueuedNotification {
    pub sub_ri: String,
    pub targets: Vec<String>,
    pub payload: Value,
}

/// A bounded FIFO queue. Overflow drops the oldest undelivered notification
/// rather than rejecting the newest, so a burst of mutations doesn't starve
/// the subscriptions that were already waiting.
pub struct BoundedQueue {
    items: VecDeque<QueuedNotification>,
    capacity: usize,
}

impl BoundedQueue {
    pub fn new(capacity: usize) -> Self {
        BoundedQueue {
            items: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    pub fn push(&mut self, item: QueuedNotification) {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
            warn!("notification queue full, dropped oldest undelivered notification");
        }
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<QueuedNotification> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
