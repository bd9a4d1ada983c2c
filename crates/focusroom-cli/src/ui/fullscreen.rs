//! Full-screen presentation on the alternate screen.

use focusroom_core::{Controller, Phase};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear, Gauge, Paragraph, Wrap};
use ratatui::Frame;

use super::{accent, format_clock, key_hints, phase_lines, progress, status_line, timer_lines};

pub fn draw(frame: &mut Frame, c: &Controller) {
    let area = frame.area();
    let [header, body, gauge, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(if c.phase() == Phase::Timer { 3 } else { 0 }),
        Constraint::Length(1),
    ])
    .areas(area);

    draw_header(frame, header, c);

    let body_block = Block::bordered().title(c.phase().title());
    let lines = if c.phase() == Phase::Timer && c.timer().overlay.is_open() {
        // The overlay gets a popup; only the status line stays beneath it.
        vec![status_line(c)]
    } else {
        phase_lines(c)
    };
    frame.render_widget(
        Paragraph::new(lines).block(body_block).wrap(Wrap { trim: false }),
        body,
    );

    if let Some(ratio) = progress(c) {
        let label = c
            .snapshot()
            .active
            .as_ref()
            .map(|a| format!("{} elapsed", format_clock(a.elapsed_secs)))
            .unwrap_or_default();
        frame.render_widget(
            Gauge::default()
                .block(Block::bordered())
                .gauge_style(Style::default().fg(accent(c.methodology())))
                .ratio(ratio)
                .label(label),
            gauge,
        );
    }

    frame.render_widget(Paragraph::new(Line::from(key_hints(c).dim())), footer);

    if c.phase() == Phase::Timer && c.timer().overlay.is_open() {
        let popup = centered(body, 60, 10);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(timer_lines(c))
                .block(Block::bordered().title("Session"))
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

fn draw_header(frame: &mut Frame, area: Rect, c: &Controller) {
    let methodology = c.methodology();
    let stats = &c.snapshot().stats;
    let mut title = vec![
        "Focusroom ".bold(),
        methodology.label().fg(accent(methodology)),
    ];
    if c.is_locked() {
        title.push(" (locked)".dim());
    }
    let summary = format!(
        "today: {} sessions, {} min focused, {} breaks",
        stats.work_sessions, stats.work_minutes, stats.break_sessions
    );
    frame.render_widget(
        Paragraph::new(Line::from(summary.dim())).block(Block::bordered().title(Line::from(title))),
        area,
    );
}

/// A `width` x `height` rect centered in `area`, clipped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusroom_core::{ControllerOptions, SessionSnapshot};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn rendered(c: &Controller) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| draw(frame, c)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn welcome_screen_renders() {
        let c = Controller::new(ControllerOptions::default(), SessionSnapshot::default());
        let screen = rendered(&c);
        assert!(screen.contains("Focusroom"));
        assert!(screen.contains("Press Enter to begin."));
        assert!(screen.contains("Enter: start"));
    }

    #[test]
    fn centered_clips_to_area() {
        let area = Rect::new(0, 0, 40, 8);
        let r = centered(area, 60, 10);
        assert_eq!(r, area);

        let r = centered(Rect::new(10, 5, 80, 24), 60, 10);
        assert_eq!(r, Rect::new(20, 12, 60, 10));
    }
}
