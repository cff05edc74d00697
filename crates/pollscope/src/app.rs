use crate::demo::DemoFeed;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use pollscope_core::viewport::{PAN_STEP_PX, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};
use pollscope_core::{Poll, Reconstructor, Registry, RetryQueue, Signal, Update, Viewport};
use tracing::{info, warn};

pub const TICK_MS: u64 = 100;
pub const LANE_LABEL_WIDTH: u16 = 24;
pub const LANE_HEIGHT: u16 = 2;

/// Retained drawing surface: the renderer repaints these every frame. A
/// full repaint rebuilds the whole list from task history; otherwise the
/// cycle's signals append to it.
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    LaneLabel {
        lane: usize,
        name: String,
    },
    StartTick {
        lane: usize,
        px: f64,
    },
    PollStep {
        lane: usize,
        px: f64,
        span_px: f64,
        is_done: bool,
        duration: u64,
    },
}

#[derive(Debug)]
pub enum FetchOutcome {
    Update(Update),
    Failed(String),
}

pub struct App {
    pub registry: Registry,
    pub retries: RetryQueue,
    pub reconstructor: Reconstructor,
    pub viewport: Viewport,
    pub marks: Vec<Mark>,
    pub demo: Option<DemoFeed>,
    pub feed_addr: String,
    pub fetch_in_flight: bool,
    pub status_note: Option<String>,
    pending_signals: Vec<Signal>,
    should_quit: bool,
}

impl App {
    pub fn new(feed_addr: String, demo: Option<DemoFeed>, scale: Option<f64>) -> Self {
        let mut viewport = Viewport::new(f64::from(LANE_LABEL_WIDTH), 80.0);
        if let Some(scale) = scale {
            viewport.set_scale(scale);
        }
        Self {
            registry: Registry::new(),
            retries: RetryQueue::new(),
            reconstructor: Reconstructor::new(),
            viewport,
            marks: Vec::new(),
            demo,
            feed_addr,
            fetch_in_flight: false,
            status_note: None,
            pending_signals: Vec::new(),
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('p') => {
                if !self.viewport.is_offline() {
                    self.viewport.set_offline();
                    self.status_note = Some("paused; scroll pans, feed stays stopped".to_string());
                    info!(event = "viewport_paused", reason = "user");
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.viewport.queue_zoom(self.center_px(), ZOOM_IN_FACTOR);
            }
            KeyCode::Char('-') => {
                self.viewport.queue_zoom(self.center_px(), ZOOM_OUT_FACTOR);
            }
            KeyCode::Left => {
                if self.viewport.is_offline() {
                    self.viewport.queue_pan(-PAN_STEP_PX);
                }
            }
            KeyCode::Right => {
                if self.viewport.is_offline() {
                    self.viewport.queue_pan(PAN_STEP_PX);
                }
            }
            KeyCode::Char('r') => {
                self.viewport.request_full_repaint();
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        let pan_gesture =
            event.modifiers.contains(KeyModifiers::SHIFT) && self.viewport.is_offline();
        match event.kind {
            MouseEventKind::ScrollUp => {
                if pan_gesture {
                    self.viewport.queue_pan(PAN_STEP_PX);
                } else {
                    self.viewport
                        .queue_zoom(f64::from(event.column), ZOOM_IN_FACTOR);
                }
            }
            MouseEventKind::ScrollDown => {
                if pan_gesture {
                    self.viewport.queue_pan(-PAN_STEP_PX);
                } else {
                    self.viewport
                        .queue_zoom(f64::from(event.column), ZOOM_OUT_FACTOR);
                }
            }
            _ => {}
        }
    }

    pub fn mark_resized(&mut self) {
        self.viewport.request_full_repaint();
    }

    /// One cooperative cycle. Returns true when the caller should start a
    /// network fetch; at most one is ever in flight.
    pub fn on_tick(&mut self) -> bool {
        if let Some(demo) = self.demo.as_mut() {
            let update = demo.next_update();
            self.ingest(update);
            return false;
        }
        if self.viewport.is_offline() || self.fetch_in_flight {
            return false;
        }
        self.fetch_in_flight = true;
        true
    }

    pub fn on_fetch(&mut self, outcome: FetchOutcome) {
        self.fetch_in_flight = false;
        match outcome {
            FetchOutcome::Update(update) => {
                self.ingest(update);
            }
            FetchOutcome::Failed(err) => {
                warn!(event = "feed_fetch_failed", error = %err);
                self.viewport.set_offline();
                self.status_note = Some(format!("feed offline ({err}); timeline paused"));
            }
        }
    }

    pub fn ingest(&mut self, update: Update) {
        let signals =
            self.reconstructor
                .apply_update(&mut self.registry, &mut self.retries, update);
        self.pending_signals.extend(signals);
    }

    /// Called once per draw, before painting: applies coalesced viewport
    /// deltas (zoom before pan), then either rebuilds the mark list from
    /// history or appends marks for this cycle's signals.
    pub fn prepare_frame(&mut self, width: u16) {
        self.viewport.set_width(f64::from(width));
        self.viewport.apply_pending();

        if self.viewport.take_full_repaint() {
            self.pending_signals.clear();
            self.rebuild_marks();
        } else {
            let signals = std::mem::take(&mut self.pending_signals);
            for signal in signals {
                self.push_signal_mark(signal);
            }
        }
    }

    fn rebuild_marks(&mut self) {
        let mut marks = Vec::new();
        for (lane, _id, record) in self.registry.lanes() {
            marks.push(Mark::LaneLabel {
                lane,
                name: record.name.clone(),
            });
            for (index, poll) in record.polls.iter().enumerate() {
                if index == 0 {
                    marks.push(Mark::StartTick {
                        lane,
                        px: self.viewport.time_to_px(poll.start),
                    });
                }
                marks.push(poll_mark(&mut self.viewport, lane, *poll));
            }
        }
        self.marks = marks;
    }

    fn push_signal_mark(&mut self, signal: Signal) {
        match signal {
            Signal::TaskCreated { id, name } => {
                if let Some(lane) = self.registry.lane_of(id) {
                    self.marks.push(Mark::LaneLabel { lane, name });
                }
            }
            Signal::TaskStarted { id, at } => {
                if let Some(lane) = self.registry.lane_of(id) {
                    let px = self.viewport.time_to_px(at);
                    self.marks.push(Mark::StartTick { lane, px });
                }
            }
            Signal::PollCompleted { id, poll } => {
                if let Some(lane) = self.registry.lane_of(id) {
                    let mark = poll_mark(&mut self.viewport, lane, poll);
                    self.marks.push(mark);
                }
            }
        }
    }

    pub fn mode_label(&self) -> &'static str {
        if self.demo.is_some() {
            "demo"
        } else if self.viewport.is_offline() {
            "offline"
        } else {
            "live"
        }
    }

    fn center_px(&self) -> f64 {
        (self.viewport.left_margin() + self.viewport.width()) / 2.0
    }
}

fn poll_mark(viewport: &mut Viewport, lane: usize, poll: Poll) -> Mark {
    Mark::PollStep {
        lane,
        px: viewport.time_to_px(poll.start),
        span_px: viewport.time_span(poll.duration),
        is_done: poll.is_done,
        duration: poll.duration,
    }
}
