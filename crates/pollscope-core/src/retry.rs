use crate::RawEvent;
use std::collections::VecDeque;
use tracing::warn;

pub const DEFAULT_RETRY_CAPACITY: usize = 1024;

/// Events that referenced an unregistered task when they arrived. Drained
/// once per update cycle and replayed ahead of the next batch. Bounded: a
/// task id that never registers would otherwise pin its events forever.
#[derive(Debug)]
pub struct RetryQueue {
    events: VecDeque<RawEvent>,
    capacity: usize,
    evicted: u64,
}

impl RetryQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RETRY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    pub fn enqueue(&mut self, event: RawEvent) {
        if self.events.len() >= self.capacity {
            if let Some(dropped) = self.events.pop_front() {
                self.evicted += 1;
                warn!(
                    event = "retry_queue_evict",
                    task_id = dropped.id,
                    kind = dropped.kind.as_str(),
                    capacity = self.capacity
                );
            }
        }
        self.events.push_back(event);
    }

    pub fn drain_all(&mut self) -> Vec<RawEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl Default for RetryQueue {
    fn default() -> Self {
        Self::new()
    }
}
