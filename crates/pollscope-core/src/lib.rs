use serde::{Deserialize, Serialize};

pub mod reconstruct;
pub mod registry;
pub mod retry;
pub mod viewport;

pub use reconstruct::{Diagnostics, Reconstructor, Signal};
pub use registry::{Registry, RegistryError, TaskRecord};
pub use retry::RetryQueue;
pub use viewport::Viewport;

pub type TaskId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Polling,
    PollReady,
    PollPending,
}

impl EventKind {
    pub fn is_begin(self) -> bool {
        matches!(self, EventKind::Polling)
    }

    pub fn is_ready(self) -> bool {
        matches!(self, EventKind::PollReady)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Polling => "POLLING",
            EventKind::PollReady => "POLL_READY",
            EventKind::PollPending => "POLL_PENDING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDecl {
    pub id: TaskId,
    pub name: String,
    pub runner: usize,
}

/// One periodic batch from the feed (`GET /update.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub new_tasks: Vec<TaskDecl>,
    #[serde(default)]
    pub task_events: Vec<RawEvent>,
    #[serde(default)]
    pub current_time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    pub start: u64,
    pub duration: u64,
    pub is_done: bool,
}

impl Poll {
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.duration)
    }
}
