use ratatui::style::{Color, Modifier, Style};

pub const LANE_NAME_STYLE: Style = Style::new()
    .fg(Color::Rgb(226, 232, 240))
    .add_modifier(Modifier::BOLD);
pub const LANE_RULE_STYLE: Style = Style::new().fg(Color::Rgb(71, 85, 105));
pub const MARGIN_STYLE: Style = Style::new().fg(Color::Rgb(148, 163, 184));
pub const START_TICK_STYLE: Style = Style::new().fg(Color::Rgb(34, 197, 94));
pub const STATUS_STYLE: Style = Style::new().fg(Color::Rgb(148, 163, 184));
pub const STATUS_WARN_STYLE: Style = Style::new().fg(Color::Rgb(245, 158, 11));

pub const DONE_STEP: &str = "█";
pub const PENDING_STEP: &str = "░";
pub const START_TICK: &str = "┃";
pub const LANE_RULE: &str = "─";
pub const MARGIN_RULE: &str = "│";

/// Poll health: fast polls render white, slow ones fade to red. Same ramp
/// as the upstream monitor: 100% at 0µs, 0% from 1ms up.
pub fn health_color(duration_us: u64) -> Color {
    let health = (1_000 - duration_us.min(1_000)) / 10;
    let channel = (health * 255 / 100) as u8;
    Color::Rgb(255, channel, channel)
}
