//! Rendering for the two presentations.
//!
//! Both read the same [`Controller`]; they differ only in layout. The
//! helpers here turn controller state into lines of text.

pub mod fullscreen;
pub mod inline;

use std::io::{self, stdout, Stdout};

use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use focusroom_core::completion::RITUAL_STEPS;
use focusroom_core::controller::{MenuItem, Overlay, LASER_ITEMS};
use focusroom_core::{Controller, Methodology, Phase, SessionStatus, SessionType};
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::{Terminal, TerminalOptions, Viewport};

pub type Term = Terminal<CrosstermBackend<Stdout>>;

/// Which presentation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Fullscreen,
    Inline,
}

pub fn init_terminal(mode: Mode) -> io::Result<Term> {
    enable_raw_mode()?;
    let mut out = stdout();
    match mode {
        Mode::Fullscreen => {
            execute!(out, EnterAlternateScreen)?;
            Terminal::new(CrosstermBackend::new(out))
        }
        Mode::Inline => Terminal::with_options(
            CrosstermBackend::new(out),
            TerminalOptions {
                viewport: Viewport::Inline(inline::HEIGHT),
            },
        ),
    }
}

pub fn restore_terminal(terminal: &mut Term, mode: Mode) -> io::Result<()> {
    disable_raw_mode()?;
    if mode == Mode::Fullscreen {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()
}

pub fn draw(mode: Mode) -> fn(&mut ratatui::Frame, &Controller) {
    match mode {
        Mode::Fullscreen => fullscreen::draw,
        Mode::Inline => inline::draw,
    }
}

// ── Text helpers ─────────────────────────────────────────────────────

/// `MM:SS`, or `H:MM:SS` past an hour.
pub fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

fn accent(methodology: Methodology) -> Color {
    match methodology {
        Methodology::Baseline => Color::Red,
        Methodology::DeepFocus => Color::Blue,
        Methodology::Highlight => Color::Yellow,
    }
}

fn list_line(index: usize, label: String, selected: bool, numbered: bool) -> Line<'static> {
    let marker = if selected { "> " } else { "  " };
    let number = if numbered {
        format!("{}. ", index + 1)
    } else {
        String::new()
    };
    let style = if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(marker),
        Span::styled(format!("{number}{label}"), style),
    ])
}

fn text_field(prompt: &str, text: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(prompt.to_string().bold()),
        Line::from(vec![Span::raw("> "), Span::raw(text.to_string()), "_".dim()]),
    ]
}

/// Body lines for the current phase, without the timer.
pub fn phase_lines(c: &Controller) -> Vec<Line<'static>> {
    let setup = c.setup();
    let descriptor = c.descriptor();
    match c.phase() {
        Phase::Welcome => vec![
            Line::from("Focusroom".bold()),
            Line::from(format!(
                "{}: {}",
                descriptor.methodology.label(),
                descriptor.methodology.tagline()
            )),
            Line::from("Press Enter to begin.".dim()),
        ],
        Phase::MainMenu => MenuItem::ALL
            .iter()
            .enumerate()
            .map(|(i, item)| {
                list_line(i, item.label().to_string(), i == setup.menu_cursor.index(), true)
            })
            .collect(),
        Phase::ModePicker => {
            if let Some(m) = setup.onboarding {
                let mut lines = vec![Line::from(m.label().bold())];
                lines.extend(m.onboarding_lines().iter().map(|l| Line::from(*l)));
                lines.push(Line::from("Any key to continue, Esc to choose again".dim()));
                return lines;
            }
            Methodology::ALL
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let label = format!("{} ({})", m.label(), m.tagline());
                    list_line(i, label, i == setup.mode_cursor.index(), true)
                })
                .collect()
        }
        Phase::DurationPicker => descriptor
            .presets
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let label = format!("{} {}", p.short_label(), p.name);
                list_line(i, label, i == setup.preset_cursor.index(), true)
            })
            .collect(),
        Phase::LaserChecklist => LASER_ITEMS
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let tick = if setup.laser[i] { "[x]" } else { "[ ]" };
                list_line(i, format!("{tick} {item}"), i == setup.laser_cursor.index(), true)
            })
            .collect(),
        Phase::TaskSelect => {
            let mut lines: Vec<Line<'static>> = c
                .task_choices()
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let label = if t.is_highlight && descriptor.capabilities.highlight {
                        format!("{} (yesterday's highlight)", t.title)
                    } else {
                        t.title.clone()
                    };
                    list_line(i, label, i == setup.task_cursor.index(), true)
                })
                .collect();
            lines.push(Line::from("n: new task".dim()));
            lines
        }
        Phase::TaskName => text_field(&descriptor.task_prompt, setup.task_input.text()),
        Phase::OutcomePrompt => {
            text_field(&descriptor.outcome_prompt, setup.outcome_input.text())
        }
        Phase::Timer => timer_lines(c),
    }
}

/// Session status, completion screen or the open overlay.
pub fn timer_lines(c: &Controller) -> Vec<Line<'static>> {
    let timer = c.timer();
    match &timer.overlay {
        Overlay::Distraction(input) => return text_field("Park a distraction:", input.text()),
        Overlay::DistractionCategory(text) => {
            return vec![
                Line::from(format!("\"{text}\"")),
                Line::from("i: internal  e: external  s: skip".dim()),
            ]
        }
        Overlay::Ritual(input) => {
            let ritual = c.completion().ritual();
            let prompt = format!(
                "Shutdown {}/{}: {}",
                ritual.step() + 1,
                RITUAL_STEPS,
                ritual.prompt().unwrap_or_default()
            );
            return text_field(&prompt, input.text());
        }
        Overlay::Accomplishment(input) => return text_field("What did you get done?", input.text()),
        Overlay::Review => {
            let mut lines = vec![Line::from("Distractions this block".bold())];
            lines.extend(
                c.completion()
                    .distractions()
                    .iter()
                    .map(|d| Line::from(format!("- {} [{}]", d.text, d.category.as_str()))),
            );
            lines.push(Line::from("Any key to acknowledge".dim()));
            return lines;
        }
        Overlay::None => {}
    }

    if timer.auto_break > 0 {
        return vec![
            Line::from("Session complete.".bold()),
            Line::from(format!(
                "Break starts in {}... (any key to cancel)",
                timer.auto_break
            )),
        ];
    }

    if let Some(active) = &c.snapshot().active {
        let mut lines = vec![status_line(c)];
        if active.status == SessionStatus::Paused {
            lines.push(Line::from("Paused".yellow()));
        }
        if let Some(outcome) = &active.intended_outcome {
            lines.push(Line::from(format!("Outcome: {outcome}").italic()));
        }
        if timer.confirm_finish {
            lines.push(Line::from("Press f again to finish this session".red()));
        }
        if timer.confirm_break {
            lines.push(Line::from("Press b again to stop and take a break".red()));
        }
        let parked = c.completion().distractions().len();
        if parked > 0 {
            lines.push(Line::from(format!("{parked} distraction(s) parked").dim()));
        }
        return lines;
    }

    if timer.completed {
        return completion_lines(c);
    }
    vec![Line::from("No active session.".dim())]
}

/// Remaining time and label of the active session, or the idle state.
pub fn status_line(c: &Controller) -> Line<'static> {
    let Some(active) = &c.snapshot().active else {
        return if c.timer().completed {
            Line::from("Session complete".bold())
        } else {
            Line::from("No active session.".dim())
        };
    };
    let kind = match active.session_type {
        SessionType::Work => "Focus",
        SessionType::Break => "Break",
    };
    Line::from(vec![
        Span::styled(
            format_clock(active.remaining_secs),
            Style::default().fg(accent(c.methodology())).bold(),
        ),
        Span::raw(format!("  {kind}: {}", active.label)),
    ])
}

fn completion_lines(c: &Controller) -> Vec<Line<'static>> {
    let timer = c.timer();
    let what = match timer.completed_type {
        Some(SessionType::Break) => "Break over",
        _ => "Session complete",
    };
    let mut lines = vec![Line::from(
        format!("{what} ({})", format_clock(timer.completed_elapsed_secs)).bold(),
    )];

    let completion = c.completion();
    if let Some(rating) = completion.focus_rating() {
        lines.push(Line::from(format!("Focus: {rating}/5")));
    }
    if let Some(recharge) = completion.recharge() {
        lines.push(Line::from(format!("Recharge: {recharge}")));
    }

    let outstanding = c.outstanding();
    if outstanding.is_empty() {
        lines.push(Line::from("s: start next session  b: take a break".green()));
    } else {
        lines.push(Line::from("Before the next session:".yellow()));
        lines.extend(outstanding.iter().map(|o| Line::from(format!("  {}", o.hint()))));
    }
    lines
}

/// One-line key legend for the current phase.
pub fn key_hints(c: &Controller) -> &'static str {
    match c.phase() {
        Phase::Welcome => "Enter: start  q: quit",
        Phase::MainMenu | Phase::ModePicker | Phase::DurationPicker | Phase::TaskSelect => {
            "↑/↓ or 1-3: choose  Enter: select  Esc: back"
        }
        Phase::LaserChecklist => "1-3/Space: toggle  Enter: continue  Esc: back",
        Phase::TaskName | Phase::OutcomePrompt => "Enter: confirm  Esc: back",
        Phase::Timer if c.timer().overlay.is_open() => "Enter: confirm  Esc: cancel",
        Phase::Timer if c.snapshot().has_active() => {
            if c.descriptor().capabilities.distraction_log {
                "p: pause  f: finish  b: break  d: distraction  q: quit"
            } else {
                "p: pause  f: finish  b: break  q: quit"
            }
        }
        Phase::Timer => "s: start  b: break  q: quit",
    }
}

/// Progress through the active session, if any.
pub fn progress(c: &Controller) -> Option<f64> {
    c.snapshot()
        .active
        .as_ref()
        .map(|a| a.progress().clamp(0.0, 1.0))
}
