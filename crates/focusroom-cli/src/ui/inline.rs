//! Compact presentation in an inline viewport below the prompt.

use focusroom_core::{Controller, Phase};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::Stylize;
use ratatui::text::{Line, Span};
use ratatui::widgets::{LineGauge, Paragraph};
use ratatui::Frame;

use super::{accent, key_hints, phase_lines, progress};

/// Rows reserved for the inline viewport.
pub const HEIGHT: u16 = 8;

pub fn draw(frame: &mut Frame, c: &Controller) {
    let area = frame.area();
    let show_gauge = c.phase() == Phase::Timer && !c.timer().overlay.is_open();
    let [title, body, gauge, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(u16::from(show_gauge)),
        Constraint::Length(1),
    ])
    .areas(area);

    let methodology = c.methodology();
    let heading = Line::from(vec![
        Span::raw("focusroom · "),
        methodology.label().fg(accent(methodology)),
        Span::raw(format!(" · {}", c.phase().title())).dim(),
    ]);
    frame.render_widget(Paragraph::new(heading), title);

    let mut lines = phase_lines(c);
    lines.truncate(usize::from(body.height));
    frame.render_widget(Paragraph::new(lines), body);

    if show_gauge {
        if let Some(ratio) = progress(c) {
            frame.render_widget(
                LineGauge::default()
                    .filled_style(ratatui::style::Style::default().fg(accent(methodology)))
                    .ratio(ratio),
                gauge,
            );
        }
    }

    frame.render_widget(Paragraph::new(Line::from(key_hints(c).dim())), footer);
}
