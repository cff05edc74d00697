use crate::app::{App, Mark, LANE_HEIGHT, LANE_LABEL_WIDTH};
use crate::theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    app.prepare_frame(chunks[0].width);

    frame.render_widget(
        TimelinePane {
            marks: &app.marks,
            left_margin: LANE_LABEL_WIDTH,
        },
        chunks[0],
    );
    frame.render_widget(status_line(app, chunks[1].width), chunks[1]);
}

/// Paints the retained mark list: lane labels and rules in the left
/// column, poll steps and start ticks in pixel-column space to the right.
struct TimelinePane<'a> {
    marks: &'a [Mark],
    left_margin: u16,
}

impl TimelinePane<'_> {
    fn put(&self, buf: &mut Buffer, area: Rect, x: u16, y: u16, symbol: &str, style: Style) {
        if x < area.right() && y < area.bottom() {
            buf.get_mut(x, y).set_symbol(symbol).set_style(style);
        }
    }

    fn lane_row(&self, area: Rect, lane: usize) -> Option<u16> {
        let offset = lane as u16 * LANE_HEIGHT;
        let y = area.top().checked_add(offset)?;
        (y + 1 < area.bottom()).then_some(y)
    }

    /// Maps a viewport pixel column to a buffer column; off-screen
    /// sentinels and columns past either edge are not drawn.
    fn pixel_column(&self, area: Rect, px: f64) -> Option<u16> {
        if px < f64::from(self.left_margin) || px > f64::from(area.width) {
            return None;
        }
        let x = area.left() + px as u16;
        (x < area.right()).then_some(x)
    }
}

impl Widget for TimelinePane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let margin_x = area.left() + self.left_margin.min(area.width.saturating_sub(1));
        for y in area.top()..area.bottom() {
            self.put(buf, area, margin_x, y, theme::MARGIN_RULE, theme::MARGIN_STYLE);
        }

        for mark in self.marks {
            match mark {
                Mark::LaneLabel { lane, name } => {
                    let Some(y) = self.lane_row(area, *lane) else {
                        continue;
                    };
                    for x in area.left()..area.right() {
                        self.put(buf, area, x, y + 1, theme::LANE_RULE, theme::LANE_RULE_STYLE);
                    }
                    let label_width = self.left_margin.saturating_sub(2) as usize;
                    let label: String = name.chars().take(label_width).collect();
                    buf.set_string(area.left() + 1, y, label, theme::LANE_NAME_STYLE);
                }
                Mark::StartTick { lane, px } => {
                    let Some(y) = self.lane_row(area, *lane) else {
                        continue;
                    };
                    let Some(x) = self.pixel_column(area, *px) else {
                        continue;
                    };
                    self.put(buf, area, x, y, theme::START_TICK, theme::START_TICK_STYLE);
                    self.put(buf, area, x, y + 1, theme::START_TICK, theme::START_TICK_STYLE);
                }
                Mark::PollStep {
                    lane,
                    px,
                    span_px,
                    is_done,
                    duration,
                } => {
                    let Some(y) = self.lane_row(area, *lane) else {
                        continue;
                    };
                    let Some(x0) = self.pixel_column(area, *px) else {
                        continue;
                    };
                    let style = Style::new().fg(theme::health_color(*duration));
                    let symbol = if *is_done {
                        theme::DONE_STEP
                    } else {
                        theme::PENDING_STEP
                    };
                    let cells = (span_px.ceil() as u16).max(1);
                    for x in x0..x0.saturating_add(cells).min(area.right()) {
                        self.put(buf, area, x, y, symbol, style);
                    }
                }
            }
        }
    }
}

fn status_line(app: &App, width: u16) -> Paragraph<'_> {
    let diag = app.reconstructor.diagnostics;
    let mut fields = vec![
        format!("mode: {}", app.mode_label()),
        format!("tasks: {}", app.registry.len()),
        format!("scale: {:.0}us/col", app.viewport.scale()),
    ];
    if app.retries.len() > 0 || diag.total() > 0 {
        fields.push(format!(
            "deferred: {} queued / {} evicted",
            app.retries.len(),
            app.retries.evicted()
        ));
    }
    if diag.protocol_violations > 0 || diag.negative_durations > 0 {
        fields.push(format!(
            "anomalies: {}",
            diag.protocol_violations + diag.negative_durations
        ));
    }
    if width > 90 {
        fields.push("keys: scroll zoom, shift-scroll pan, p pause, q quit".to_string());
    }

    let mut spans = vec![Span::styled(fields.join(" | "), theme::STATUS_STYLE)];
    if let Some(note) = app.status_note.as_deref() {
        spans.push(Span::styled(
            format!("  {note}"),
            theme::STATUS_WARN_STYLE,
        ));
    }
    Paragraph::new(Line::from(spans))
}
