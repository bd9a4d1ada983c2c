//! Setup flow: every phase before the Timer.

use super::phase::{shortcut_index, MenuItem, Phase, Selection, LASER_ITEMS, MAX_SHORTCUT_ITEMS};
use super::{Controller, Effect, ExitAction, InputOutcome, Key, LineInput};
use crate::methodology::{for_methodology, Methodology};
use crate::session::{StartRequest, Task};

/// Cursors and answers collected while walking the setup phases.
#[derive(Debug, Clone, Default)]
pub struct SetupState {
    pub menu_cursor: Selection,
    pub mode_cursor: Selection,
    pub preset_cursor: Selection,
    pub laser_cursor: Selection,
    pub task_cursor: Selection,
    pub laser: [bool; LASER_ITEMS.len()],
    pub task_input: LineInput,
    pub outcome_input: LineInput,
    pub preset_index: usize,
    pub task_name: String,
    /// Methodology whose onboarding overlay is showing.
    pub onboarding: Option<Methodology>,
}

/// Shared list handling: cursor movement, Enter and numeric shortcuts.
/// Returns the chosen index, if any.
fn pick(cursor: &mut Selection, key: Key, len: usize) -> Option<usize> {
    match key {
        Key::Up | Key::Char('k') => {
            cursor.up(len);
            None
        }
        Key::Down | Key::Tab | Key::Char('j') => {
            cursor.down(len);
            None
        }
        Key::Enter if len > 0 => Some(cursor.index()),
        Key::Char(c) => {
            let index = shortcut_index(c, len)?;
            *cursor = Selection::default();
            for _ in 0..index {
                cursor.down(len);
            }
            Some(index)
        }
        _ => None,
    }
}

impl Controller {
    pub fn setup(&self) -> &SetupState {
        &self.setup
    }

    /// Entries offered by TaskSelect: the carry-over highlight (highlight
    /// methodology only) followed by recent tasks, without duplicates.
    pub fn task_choices(&self) -> Vec<&Task> {
        let mut choices: Vec<&Task> = Vec::with_capacity(MAX_SHORTCUT_ITEMS);
        if self.descriptor.capabilities.highlight {
            if let Some(highlight) = &self.carry_over {
                choices.push(highlight);
            }
        }
        for task in &self.recent_tasks {
            if choices.len() == MAX_SHORTCUT_ITEMS {
                break;
            }
            if !choices.iter().any(|c| c.title == task.title) {
                choices.push(task);
            }
        }
        choices
    }

    pub(super) fn welcome_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Enter | Key::Char(' ') if self.options.locked => self.advance(Phase::DurationPicker),
            Key::Enter | Key::Char(' ') => self.advance(Phase::MainMenu),
            Key::Esc | Key::Char('q') => self.quit(None),
            _ => Vec::new(),
        }
    }

    pub(super) fn menu_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Esc => return self.back(),
            Key::Char('q') => return self.quit(None),
            _ => {}
        }
        let Some(index) = pick(&mut self.setup.menu_cursor, key, MenuItem::ALL.len()) else {
            return Vec::new();
        };
        match MenuItem::ALL[index] {
            MenuItem::StartSession => {
                self.setup.mode_cursor = Selection::default();
                self.advance(Phase::ModePicker)
            }
            MenuItem::ViewStats => self.quit(Some(ExitAction::ViewStats)),
            MenuItem::Reflect => self.quit(Some(ExitAction::Reflect)),
        }
    }

    pub(super) fn mode_key(&mut self, key: Key) -> Vec<Effect> {
        if self.setup.onboarding.take().is_some() {
            return match key {
                Key::Esc => Vec::new(),
                _ => self.advance(Phase::DurationPicker),
            };
        }
        if key == Key::Esc {
            return self.back();
        }
        let Some(index) = pick(&mut self.setup.mode_cursor, key, Methodology::ALL.len()) else {
            return Vec::new();
        };

        let methodology = Methodology::ALL[index];
        tracing::debug!(%methodology, "methodology selected");
        self.descriptor = for_methodology(methodology, Some(&self.options.config));
        self.setup.preset_cursor = Selection::default();
        self.setup.laser = Default::default();
        if self.options.show_onboarding {
            self.setup.onboarding = Some(methodology);
            Vec::new()
        } else {
            self.advance(Phase::DurationPicker)
        }
    }

    pub(super) fn duration_key(&mut self, key: Key) -> Vec<Effect> {
        if key == Key::Esc {
            return self.back();
        }
        let len = self.descriptor.presets.len();
        let Some(index) = pick(&mut self.setup.preset_cursor, key, len) else {
            return Vec::new();
        };
        self.setup.preset_index = index;

        if self.descriptor.requires_laser_checklist() {
            self.setup.laser_cursor = Selection::default();
            self.advance(Phase::LaserChecklist)
        } else {
            let next = self.task_phase();
            self.advance(next)
        }
    }

    pub(super) fn laser_key(&mut self, key: Key) -> Vec<Effect> {
        let len = LASER_ITEMS.len();
        match key {
            Key::Esc => self.back(),
            Key::Enter => {
                let next = self.task_phase();
                self.advance(next)
            }
            Key::Up | Key::Char('k') => {
                self.setup.laser_cursor.up(len);
                Vec::new()
            }
            Key::Down | Key::Tab | Key::Char('j') => {
                self.setup.laser_cursor.down(len);
                Vec::new()
            }
            Key::Char(' ') => {
                let i = self.setup.laser_cursor.index();
                self.setup.laser[i] = !self.setup.laser[i];
                Vec::new()
            }
            Key::Char(c) => {
                if let Some(i) = shortcut_index(c, len) {
                    self.setup.laser[i] = !self.setup.laser[i];
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub(super) fn task_select_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Esc => return self.back(),
            Key::Char('n') => {
                self.setup.task_input.clear();
                return self.advance(Phase::TaskName);
            }
            _ => {}
        }
        let len = self.task_choices().len();
        let Some(index) = pick(&mut self.setup.task_cursor, key, len) else {
            return Vec::new();
        };
        let Some(title) = self.task_choices().get(index).map(|t| t.title.clone()) else {
            return Vec::new();
        };
        self.setup.task_name = title;
        self.after_task()
    }

    pub(super) fn task_name_key(&mut self, key: Key) -> Vec<Effect> {
        match self.setup.task_input.handle(key) {
            InputOutcome::Editing => Vec::new(),
            InputOutcome::Submitted(name) if name.is_empty() => Vec::new(),
            InputOutcome::Submitted(name) => {
                self.setup.task_name = name;
                self.after_task()
            }
            InputOutcome::Abandoned => self.back(),
        }
    }

    pub(super) fn outcome_key(&mut self, key: Key) -> Vec<Effect> {
        match self.setup.outcome_input.handle(key) {
            InputOutcome::Editing => Vec::new(),
            InputOutcome::Submitted(outcome) => {
                let outcome = (!outcome.is_empty()).then_some(outcome);
                self.start_session(outcome)
            }
            InputOutcome::Abandoned => self.back(),
        }
    }

    fn task_phase(&self) -> Phase {
        if self.task_choices().is_empty() {
            Phase::TaskName
        } else {
            Phase::TaskSelect
        }
    }

    fn after_task(&mut self) -> Vec<Effect> {
        if self.descriptor.has_outcome_prompt() {
            self.setup.outcome_input.clear();
            self.advance(Phase::OutcomePrompt)
        } else {
            self.start_session(None)
        }
    }

    /// Hand the collected answers to the session service and move to the
    /// Timer, whether or not the start succeeds.
    fn start_session(&mut self, intended_outcome: Option<String>) -> Vec<Effect> {
        let index = self.setup.preset_index;
        let Some(preset) = self.descriptor.presets.get(index).cloned() else {
            tracing::warn!(index, "preset index out of range");
            return Vec::new();
        };
        let request = StartRequest {
            methodology: self.descriptor.methodology,
            preset_index: index,
            preset,
            task_name: self.setup.task_name.clone(),
            intended_outcome,
        };

        self.timer = Default::default();
        self.completion.reset();
        let mut effects = self.advance(Phase::Timer);
        effects.push(Effect::StartSession { request });
        effects
    }
}
