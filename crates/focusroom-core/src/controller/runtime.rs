//! Timer phase: in-session commands, completion screen and its overlays.

use super::{Controller, Effect, InputOutcome, Key, LineInput};
use crate::completion::{DistractionCategory, RechargeActivity};
use crate::session::{CommandKind, SessionType};

/// Ticks between a work completion and the automatic break.
pub const AUTO_BREAK_TICKS: u8 = 3;

/// Modal capture drawn over the timer. While open it receives every key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    None,
    /// Free-text distraction capture.
    Distraction(LineInput),
    /// Category sub-prompt for a captured distraction.
    DistractionCategory(String),
    /// Answer to the current shutdown ritual step.
    Ritual(LineInput),
    Accomplishment(LineInput),
    /// Read-only list of logged distractions.
    Review,
}

impl Overlay {
    pub fn is_open(&self) -> bool {
        !matches!(self, Overlay::None)
    }
}

/// Local state of the Timer phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerView {
    pub confirm_finish: bool,
    pub confirm_break: bool,
    pub completed: bool,
    pub completed_type: Option<SessionType>,
    pub completed_elapsed_secs: u64,
    /// Id of the session behind the last completion edge. A late fetch
    /// still showing it is stale.
    pub completed_id: Option<String>,
    /// Set once the completion notification for the current edge fired.
    pub notified: bool,
    /// Remaining ticks before an automatic break; zero when disarmed.
    pub auto_break: u8,
    pub overlay: Overlay,
}

impl TimerView {
    fn clear_confirmations(&mut self) {
        self.confirm_finish = false;
        self.confirm_break = false;
    }
}

impl Controller {
    /// True on the post-work completion screen where rituals apply.
    pub fn is_completion_screen(&self) -> bool {
        self.timer.completed
            && self.timer.completed_type == Some(SessionType::Work)
            && !self.snapshot.has_active()
    }

    pub(super) fn timer_key(&mut self, key: Key) -> Vec<Effect> {
        if self.timer.auto_break > 0 {
            self.timer.auto_break = 0;
            tracing::debug!("auto-break cancelled");
            return Vec::new();
        }
        if self.timer.overlay.is_open() {
            return self.overlay_key(key);
        }

        let confirm_finish = std::mem::take(&mut self.timer.confirm_finish);
        let confirm_break = std::mem::take(&mut self.timer.confirm_break);

        match key {
            Key::Char('p') => self.toggle_pause(),
            Key::Char('f') => self.finish(confirm_finish),
            Key::Char('b') => self.take_break(confirm_break),
            Key::Char('s') => self.start_next(),
            Key::Char('d') => self.open_distraction(),
            Key::Char('q') => self.quit(None),
            Key::Char(c) if self.is_completion_screen() => self.completion_key(c),
            _ => Vec::new(),
        }
    }

    fn toggle_pause(&mut self) -> Vec<Effect> {
        match &self.snapshot.active {
            Some(active) if active.is_running() => vec![Effect::command(CommandKind::Pause)],
            Some(_) => vec![Effect::command(CommandKind::Resume)],
            None => Vec::new(),
        }
    }

    fn finish(&mut self, confirmed: bool) -> Vec<Effect> {
        if self.timer.completed || !self.snapshot.has_active() {
            return Vec::new();
        }
        if confirmed {
            tracing::debug!("finish confirmed");
            return vec![Effect::command(CommandKind::Stop)];
        }
        self.timer.confirm_finish = true;
        Vec::new()
    }

    fn take_break(&mut self, confirmed: bool) -> Vec<Effect> {
        match self.snapshot.active_type() {
            None => vec![Effect::command(CommandKind::Break)],
            Some(SessionType::Work) if confirmed => vec![
                Effect::command(CommandKind::Stop),
                Effect::command(CommandKind::Break),
            ],
            Some(SessionType::Work) => {
                self.timer.confirm_break = true;
                Vec::new()
            }
            Some(SessionType::Break) => Vec::new(),
        }
    }

    fn start_next(&mut self) -> Vec<Effect> {
        if !self.can_start_new() {
            if self.timer.completed {
                tracing::debug!(outstanding = ?self.outstanding(), "start blocked by prompts");
            }
            return Vec::new();
        }
        self.timer.completed = false;
        self.timer.clear_confirmations();
        vec![Effect::command(CommandKind::Start)]
    }

    fn open_distraction(&mut self) -> Vec<Effect> {
        let working = self.snapshot.is_running()
            && self.snapshot.active_type() == Some(SessionType::Work);
        if self.descriptor.capabilities.distraction_log && working {
            self.timer.overlay = Overlay::Distraction(LineInput::new());
        }
        Vec::new()
    }

    fn completion_key(&mut self, c: char) -> Vec<Effect> {
        let caps = self.descriptor.capabilities;
        match c {
            'r' if caps.shutdown_ritual => {
                if self.completion.ritual_mut().begin() {
                    self.timer.overlay = Overlay::Ritual(LineInput::new());
                }
                Vec::new()
            }
            'a' if caps.shutdown_ritual && !self.completion.accomplishment_saved() => {
                self.timer.overlay = Overlay::Accomplishment(LineInput::new());
                Vec::new()
            }
            'v' if !self.completion.distractions().is_empty() => {
                self.timer.overlay = Overlay::Review;
                Vec::new()
            }
            '1'..='5' if caps.focus_score && self.completion.focus_rating().is_none() => {
                let score = c as u8 - b'0';
                if self.completion.set_focus_rating(score) {
                    vec![Effect::RecordFocusScore { score }]
                } else {
                    Vec::new()
                }
            }
            _ if (caps.focus_score || caps.energize_reminder)
                && self.completion.recharge().is_none() =>
            {
                match RechargeActivity::from_key(c) {
                    Some(activity) => {
                        self.completion.set_recharge(activity);
                        vec![Effect::RecordEnergize { activity }]
                    }
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    fn overlay_key(&mut self, key: Key) -> Vec<Effect> {
        match std::mem::take(&mut self.timer.overlay) {
            Overlay::None => Vec::new(),
            Overlay::Distraction(mut input) => match input.handle(key) {
                InputOutcome::Editing => {
                    self.timer.overlay = Overlay::Distraction(input);
                    Vec::new()
                }
                InputOutcome::Submitted(text) if text.is_empty() => Vec::new(),
                InputOutcome::Submitted(text) if self.descriptor.has_distraction_categories() => {
                    self.timer.overlay = Overlay::DistractionCategory(text);
                    Vec::new()
                }
                InputOutcome::Submitted(text) => {
                    self.log_distraction(&text, DistractionCategory::Uncategorized)
                }
                InputOutcome::Abandoned => Vec::new(),
            },
            Overlay::DistractionCategory(text) => match key {
                Key::Char('i') => self.log_distraction(&text, DistractionCategory::Internal),
                Key::Char('e') => self.log_distraction(&text, DistractionCategory::External),
                Key::Char('s') | Key::Enter => {
                    self.log_distraction(&text, DistractionCategory::Uncategorized)
                }
                Key::Esc => Vec::new(),
                _ => {
                    self.timer.overlay = Overlay::DistractionCategory(text);
                    Vec::new()
                }
            },
            Overlay::Ritual(mut input) => match input.handle(key) {
                InputOutcome::Editing => {
                    self.timer.overlay = Overlay::Ritual(input);
                    Vec::new()
                }
                InputOutcome::Submitted(answer) => {
                    let Some(record) = self.completion.ritual_mut().confirm(&answer) else {
                        self.timer.overlay = Overlay::Ritual(LineInput::new());
                        return Vec::new();
                    };
                    tracing::info!("shutdown ritual complete");
                    if !self.completion.distractions().is_empty()
                        && !self.completion.distractions_reviewed()
                    {
                        self.timer.overlay = Overlay::Review;
                    }
                    vec![Effect::RecordRitual { record }]
                }
                InputOutcome::Abandoned => {
                    self.completion.ritual_mut().abandon();
                    Vec::new()
                }
            },
            Overlay::Accomplishment(mut input) => match input.handle(key) {
                InputOutcome::Editing => {
                    self.timer.overlay = Overlay::Accomplishment(input);
                    Vec::new()
                }
                InputOutcome::Submitted(text) if text.is_empty() => {
                    self.timer.overlay = Overlay::Accomplishment(LineInput::new());
                    Vec::new()
                }
                InputOutcome::Submitted(text) => {
                    self.completion.save_accomplishment();
                    vec![Effect::RecordAccomplishment { text }]
                }
                InputOutcome::Abandoned => Vec::new(),
            },
            // Any key acknowledges the review.
            Overlay::Review => {
                self.completion.mark_reviewed();
                Vec::new()
            }
        }
    }

    fn log_distraction(&mut self, text: &str, category: DistractionCategory) -> Vec<Effect> {
        let distraction = self.completion.log_distraction(text, category);
        tracing::debug!(category = distraction.category.as_str(), "distraction logged");
        vec![Effect::LogDistraction { distraction }]
    }
}
