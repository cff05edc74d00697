use pollscope_core::{EventKind, RawEvent, TaskDecl, TaskId, Update};
use std::time::Instant;

const MAX_DEMO_TASKS: usize = 12;

/// Synthetic feed for `--demo`: emits plausible task declarations and
/// begin/end poll pairs on every tick so the viewport can be exercised
/// without a live executor.
pub struct DemoFeed {
    started: Instant,
    rng: Rng,
    next_id: TaskId,
    tasks: Vec<DemoTask>,
}

struct DemoTask {
    id: TaskId,
    open: Option<u64>,
    done: bool,
}

struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        // xorshift64
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn chance(&mut self, one_in: u64) -> bool {
        self.next() % one_in == 0
    }

    fn range(&mut self, low: u64, high: u64) -> u64 {
        low + self.next() % (high - low)
    }
}

impl DemoFeed {
    pub fn new(seed: u64) -> Self {
        Self {
            started: Instant::now(),
            rng: Rng(seed | 1),
            next_id: 0,
            tasks: Vec::new(),
        }
    }

    pub fn next_update(&mut self) -> Update {
        let now = self.started.elapsed().as_micros() as u64;
        self.update_at(now)
    }

    fn update_at(&mut self, now: u64) -> Update {
        let mut new_tasks = Vec::new();
        let mut task_events = Vec::new();

        let live = self.tasks.iter().filter(|task| !task.done).count();
        if live < MAX_DEMO_TASKS && (self.tasks.is_empty() || self.rng.chance(10)) {
            let id = self.next_id;
            self.next_id += 1;
            new_tasks.push(TaskDecl {
                id,
                name: format!("demo-task-{id}"),
                runner: id % 4,
            });
            self.tasks.push(DemoTask {
                id,
                open: None,
                done: false,
            });
        }

        for task in self.tasks.iter_mut().filter(|task| !task.done) {
            match task.open.take() {
                None => {
                    task.open = Some(now);
                    task_events.push(RawEvent {
                        id: task.id,
                        kind: EventKind::Polling,
                        timestamp: now,
                    });
                }
                Some(begin) => {
                    let end = begin + self.rng.range(200, 20_000);
                    let kind = if self.rng.chance(16) {
                        task.done = true;
                        EventKind::PollReady
                    } else {
                        EventKind::PollPending
                    };
                    task_events.push(RawEvent {
                        id: task.id,
                        kind,
                        timestamp: end.min(now),
                    });
                }
            }
        }

        Update {
            new_tasks,
            task_events,
            current_time: now,
        }
    }
}
