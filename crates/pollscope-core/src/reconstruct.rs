use crate::registry::{Registry, RegistryError};
use crate::retry::RetryQueue;
use crate::{Poll, RawEvent, TaskId, Update};
use tracing::warn;

/// Outbound signals consumed by the renderer. The reconstructor itself
/// never draws anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    TaskCreated { id: TaskId, name: String },
    TaskStarted { id: TaskId, at: u64 },
    PollCompleted { id: TaskId, poll: Poll },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub deferred_events: u64,
    pub duplicate_registrations: u64,
    pub protocol_violations: u64,
    pub negative_durations: u64,
}

impl Diagnostics {
    pub fn total(&self) -> u64 {
        self.deferred_events
            + self.duplicate_registrations
            + self.protocol_violations
            + self.negative_durations
    }
}

/// Pairs begin/end instrumentation events per task into completed `Poll`
/// intervals. Events for unknown tasks are parked in the retry queue and
/// replayed ahead of the next batch.
#[derive(Debug, Default)]
pub struct Reconstructor {
    pub diagnostics: Diagnostics,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_update(
        &mut self,
        registry: &mut Registry,
        retries: &mut RetryQueue,
        update: Update,
    ) -> Vec<Signal> {
        let mut signals = Vec::new();

        for decl in &update.new_tasks {
            match registry.register(decl) {
                Ok(()) => signals.push(Signal::TaskCreated {
                    id: decl.id,
                    name: decl.name.clone(),
                }),
                Err(RegistryError::Duplicate(id)) => {
                    self.diagnostics.duplicate_registrations += 1;
                    warn!(
                        event = "duplicate_task_registration",
                        task_id = id,
                        name = %decl.name
                    );
                }
            }
        }

        let retried = retries.drain_all();
        for event in retried.into_iter().chain(update.task_events) {
            self.apply_event(registry, retries, event, &mut signals);
        }

        signals
    }

    fn apply_event(
        &mut self,
        registry: &mut Registry,
        retries: &mut RetryQueue,
        event: RawEvent,
        signals: &mut Vec<Signal>,
    ) {
        let Some(task) = registry.lookup_mut(event.id) else {
            self.diagnostics.deferred_events += 1;
            retries.enqueue(event);
            return;
        };

        // Empty pending slot: this event opens the pair.
        let Some(begin) = task.pending.take() else {
            task.pending = Some(event);
            return;
        };

        if !begin.kind.is_begin() {
            self.diagnostics.protocol_violations += 1;
            warn!(
                event = "unexpected_pending_kind",
                task_id = event.id,
                kind = begin.kind.as_str()
            );
        }

        let duration = match event.timestamp.checked_sub(begin.timestamp) {
            Some(duration) => duration,
            None => {
                self.diagnostics.negative_durations += 1;
                warn!(
                    event = "negative_poll_duration",
                    task_id = event.id,
                    begin = begin.timestamp,
                    end = event.timestamp
                );
                0
            }
        };

        let poll = Poll {
            start: begin.timestamp,
            duration,
            is_done: event.kind.is_ready(),
        };

        if task.polls.is_empty() {
            signals.push(Signal::TaskStarted {
                id: event.id,
                at: poll.start,
            });
        }
        task.polls.push(poll);
        signals.push(Signal::PollCompleted { id: event.id, poll });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventKind, TaskDecl};

    fn decl(id: TaskId, name: &str) -> TaskDecl {
        TaskDecl {
            id,
            name: name.to_string(),
            runner: 0,
        }
    }

    fn event(id: TaskId, kind: EventKind, timestamp: u64) -> RawEvent {
        RawEvent {
            id,
            kind,
            timestamp,
        }
    }

    fn setup() -> (Reconstructor, Registry, RetryQueue) {
        (Reconstructor::new(), Registry::new(), RetryQueue::new())
    }

    #[test]
    fn begin_ready_pair_produces_one_done_poll() {
        let (mut recon, mut registry, mut retries) = setup();
        let update = Update {
            new_tasks: vec![decl(1, "t1")],
            task_events: vec![
                event(1, EventKind::Polling, 100),
                event(1, EventKind::PollReady, 350),
            ],
            current_time: 400,
        };

        let signals = recon.apply_update(&mut registry, &mut retries, update);

        let polls = &registry.lookup(1).expect("registered").polls;
        assert_eq!(polls.len(), 1);
        assert_eq!(
            polls[0],
            Poll {
                start: 100,
                duration: 250,
                is_done: true
            }
        );
        assert_eq!(signals.len(), 3);
        assert!(matches!(signals[0], Signal::TaskCreated { id: 1, .. }));
        assert!(matches!(signals[1], Signal::TaskStarted { id: 1, at: 100 }));
        assert!(matches!(signals[2], Signal::PollCompleted { id: 1, .. }));
    }

    #[test]
    fn lone_begin_event_produces_no_poll() {
        let (mut recon, mut registry, mut retries) = setup();
        let update = Update {
            new_tasks: vec![decl(1, "t1")],
            task_events: vec![event(1, EventKind::Polling, 100)],
            current_time: 200,
        };

        recon.apply_update(&mut registry, &mut retries, update);

        let record = registry.lookup(1).expect("registered");
        assert!(record.polls.is_empty());
        assert_eq!(record.pending, Some(event(1, EventKind::Polling, 100)));
    }

    #[test]
    fn poll_count_matches_complete_pairs() {
        let (mut recon, mut registry, mut retries) = setup();
        let mut events = Vec::new();
        for i in 0..5u64 {
            events.push(event(1, EventKind::Polling, i * 100));
            events.push(event(1, EventKind::PollPending, i * 100 + 40));
        }
        events.push(event(1, EventKind::Polling, 900));

        let update = Update {
            new_tasks: vec![decl(1, "t1")],
            task_events: events,
            current_time: 1000,
        };
        recon.apply_update(&mut registry, &mut retries, update);

        let record = registry.lookup(1).expect("registered");
        assert_eq!(record.polls.len(), 5);
        assert!(record.polls.iter().all(|poll| !poll.is_done));
        assert!(record.pending.is_some());
    }

    #[test]
    fn unregistered_event_round_trips_through_retry_queue() {
        let (mut recon, mut registry, mut retries) = setup();

        let first = Update {
            task_events: vec![event(2, EventKind::Polling, 10)],
            ..Update::default()
        };
        let signals = recon.apply_update(&mut registry, &mut retries, first);
        assert!(signals.is_empty());
        assert_eq!(retries.len(), 1);
        assert_eq!(recon.diagnostics.deferred_events, 1);

        let second = Update {
            new_tasks: vec![decl(2, "t2")],
            task_events: vec![event(2, EventKind::PollPending, 40)],
            ..Update::default()
        };
        recon.apply_update(&mut registry, &mut retries, second);

        assert!(retries.is_empty());
        let polls = &registry.lookup(2).expect("registered").polls;
        assert_eq!(
            polls,
            &vec![Poll {
                start: 10,
                duration: 30,
                is_done: false
            }]
        );
    }

    #[test]
    fn retried_events_run_before_the_new_batch() {
        let (mut recon, mut registry, mut retries) = setup();

        let first = Update {
            task_events: vec![event(4, EventKind::Polling, 100)],
            ..Update::default()
        };
        recon.apply_update(&mut registry, &mut retries, first);

        // The replayed begin must pair with this batch's end event.
        let second = Update {
            new_tasks: vec![decl(4, "t4")],
            task_events: vec![event(4, EventKind::PollReady, 160)],
            ..Update::default()
        };
        recon.apply_update(&mut registry, &mut retries, second);

        let record = registry.lookup(4).expect("registered");
        assert_eq!(record.polls.len(), 1);
        assert_eq!(record.polls[0].start, 100);
        assert_eq!(record.polls[0].duration, 60);
        assert!(record.pending.is_none());
    }

    #[test]
    fn event_for_forever_unknown_task_is_never_lost() {
        let (mut recon, mut registry, mut retries) = setup();
        let orphan = event(99, EventKind::Polling, 5);

        let first = Update {
            task_events: vec![orphan],
            ..Update::default()
        };
        recon.apply_update(&mut registry, &mut retries, first);

        for cycle in 0..4 {
            recon.apply_update(&mut registry, &mut retries, Update::default());
            assert_eq!(retries.len(), 1, "cycle {cycle}");
        }
        assert_eq!(recon.diagnostics.deferred_events, 5);
        assert_eq!(retries.drain_all(), vec![orphan]);
    }

    #[test]
    fn unexpected_pending_kind_is_flagged_but_still_paired() {
        let (mut recon, mut registry, mut retries) = setup();
        let update = Update {
            new_tasks: vec![decl(1, "t1")],
            task_events: vec![
                event(1, EventKind::PollReady, 100),
                event(1, EventKind::PollReady, 140),
            ],
            ..Update::default()
        };

        recon.apply_update(&mut registry, &mut retries, update);

        assert_eq!(recon.diagnostics.protocol_violations, 1);
        let polls = &registry.lookup(1).expect("registered").polls;
        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0].start, 100);
        assert_eq!(polls[0].duration, 40);
    }

    #[test]
    fn negative_duration_clamps_to_zero() {
        let (mut recon, mut registry, mut retries) = setup();
        let update = Update {
            new_tasks: vec![decl(1, "t1")],
            task_events: vec![
                event(1, EventKind::Polling, 500),
                event(1, EventKind::PollReady, 300),
            ],
            ..Update::default()
        };

        recon.apply_update(&mut registry, &mut retries, update);

        assert_eq!(recon.diagnostics.negative_durations, 1);
        let polls = &registry.lookup(1).expect("registered").polls;
        assert_eq!(polls[0].start, 500);
        assert_eq!(polls[0].duration, 0);
        assert!(polls[0].is_done);
    }

    #[test]
    fn duplicate_registration_keeps_existing_history() {
        let (mut recon, mut registry, mut retries) = setup();
        let first = Update {
            new_tasks: vec![decl(1, "t1")],
            task_events: vec![
                event(1, EventKind::Polling, 10),
                event(1, EventKind::PollReady, 20),
            ],
            ..Update::default()
        };
        recon.apply_update(&mut registry, &mut retries, first);

        let second = Update {
            new_tasks: vec![decl(1, "replacement")],
            ..Update::default()
        };
        let signals = recon.apply_update(&mut registry, &mut retries, second);

        assert!(signals.is_empty());
        assert_eq!(recon.diagnostics.duplicate_registrations, 1);
        let record = registry.lookup(1).expect("registered");
        assert_eq!(record.name, "t1");
        assert_eq!(record.polls.len(), 1);
    }
}
