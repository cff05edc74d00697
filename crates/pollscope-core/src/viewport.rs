/// Sentinel returned by `time_to_px` for coordinates left of the label
/// margin; callers must not draw it.
pub const OFFSCREEN_PX: f64 = -100.0;

pub const DEFAULT_SCALE: f64 = 10_000.0;
pub const ZOOM_IN_FACTOR: f64 = 3.0 / 4.0;
pub const ZOOM_OUT_FACTOR: f64 = 4.0 / 3.0;
pub const PAN_STEP_PX: f64 = 200.0;

/// Time-axis mapping between feed timestamps (microseconds) and drawable
/// pixel columns. Two modes: live (auto-advances to follow the newest
/// data) and offline (frozen for manual pan/scrub; one-way switch).
#[derive(Debug, Clone)]
pub struct Viewport {
    scale: f64,
    time_offset: f64,
    left_margin: f64,
    width: f64,
    scale_delta: Option<f64>,
    offset_delta: Option<f64>,
    pointer_px: f64,
    full_repaint: bool,
    offline: bool,
}

impl Viewport {
    pub fn new(left_margin: f64, width: f64) -> Self {
        Self {
            scale: DEFAULT_SCALE,
            time_offset: 0.0,
            left_margin,
            width,
            scale_delta: None,
            offset_delta: None,
            pointer_px: 0.0,
            full_repaint: true,
            offline: false,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        if scale > 0.0 {
            self.scale = scale;
            self.full_repaint = true;
        }
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    pub fn left_margin(&self) -> f64 {
        self.left_margin
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_width(&mut self, width: f64) {
        if (width - self.width).abs() > f64::EPSILON {
            self.width = width;
            self.full_repaint = true;
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// One-way: auto-advance and fetching stop for the rest of the session.
    pub fn set_offline(&mut self) {
        self.offline = true;
    }

    /// Pixel width of a duration at the current scale.
    pub fn time_span(&self, duration: u64) -> f64 {
        duration as f64 / self.scale
    }

    /// Maps a timestamp to a pixel column. While live, a result past the
    /// right edge advances the offset by half a screen and flags a full
    /// repaint; the stale value is still returned and callers re-derive
    /// positions on the next repaint.
    pub fn time_to_px(&mut self, timestamp: u64) -> f64 {
        let px = self.left_margin + (timestamp as f64 - self.time_offset) / self.scale;

        if px > self.width && !self.offline {
            self.time_offset += (self.width / 2.0) * self.scale;
            self.full_repaint = true;
        }

        if px < self.left_margin {
            OFFSCREEN_PX
        } else {
            px
        }
    }

    /// Single-slot delta: a burst of wheel events coalesces into one zoom
    /// per draw cycle.
    pub fn queue_zoom(&mut self, pointer_px: f64, factor: f64) {
        self.pointer_px = pointer_px;
        self.scale_delta = Some(factor);
    }

    pub fn queue_pan(&mut self, delta_px: f64) {
        self.offset_delta = Some(delta_px);
    }

    /// Consumes at most one zoom then at most one pan, in that order: zoom
    /// recenters using the pre-pan offset.
    pub fn apply_pending(&mut self) {
        if let Some(factor) = self.scale_delta.take() {
            self.apply_zoom(self.pointer_px, factor);
        }
        if let Some(delta) = self.offset_delta.take() {
            self.apply_pan(delta);
        }
    }

    /// Anchor-preserving zoom: the timestamp under `pointer_px` stays
    /// under `pointer_px` after the scale change.
    pub fn apply_zoom(&mut self, pointer_px: f64, factor: f64) {
        let anchor_time = self.time_offset + (pointer_px - self.left_margin) * self.scale;
        self.scale *= factor;
        self.time_offset = anchor_time - (pointer_px - self.left_margin) * self.scale;
        self.full_repaint = true;
    }

    /// Manual scrub; only meaningful while offline.
    pub fn apply_pan(&mut self, delta_px: f64) {
        if !self.offline {
            return;
        }
        self.time_offset += delta_px * self.scale;
        self.full_repaint = true;
    }

    pub fn request_full_repaint(&mut self) {
        self.full_repaint = true;
    }

    pub fn full_repaint_pending(&self) -> bool {
        self.full_repaint
    }

    pub fn take_full_repaint(&mut self) -> bool {
        std::mem::take(&mut self.full_repaint)
    }
}
