//! Interactive session controller.
//!
//! A phase-based state machine with no I/O of its own. Hosts feed it
//! [`ControllerEvent`]s through [`Controller::dispatch`] and execute the
//! returned [`Effect`]s. All mutation happens inside `dispatch`, so a
//! single-threaded host loop gives strictly ordered state changes even
//! though snapshot fetches complete asynchronously.
//!
//! ## Event routing
//!
//! - `Key(Cancel)` exits from any phase, ignoring pending confirmations.
//! - Other keys go to the handler of the current phase.
//! - `Tick` drives the auto-break countdown and requests a snapshot fetch.
//! - `SnapshotFetched` replaces the snapshot and detects completion and
//!   restart edges.

mod effect;
mod input;
mod phase;
mod runtime;
mod setup;
mod sync;

pub use effect::{Effect, ExitAction};
pub use input::{ControllerEvent, InputOutcome, Key, LineInput};
pub use phase::{shortcut_index, MenuItem, Phase, Selection, LASER_ITEMS, MAX_SHORTCUT_ITEMS};
pub use runtime::{Overlay, TimerView, AUTO_BREAK_TICKS};
pub use setup::SetupState;

use crate::completion::{CompletionState, Outstanding};
use crate::methodology::{for_methodology, Descriptor, Methodology};
use crate::session::{SessionSnapshot, SessionType, Task};
use crate::storage::Config;

/// Start-up parameters for a controller instance.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub methodology: Methodology,
    /// Skip the main menu and mode picker.
    pub locked: bool,
    pub auto_break: bool,
    pub show_onboarding: bool,
    pub recent_task_limit: usize,
    /// Source of preset overrides for the methodology provider.
    pub config: Config,
}

impl ControllerOptions {
    /// Derive options from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let methodology = config
            .general
            .methodology
            .parse()
            .unwrap_or(Methodology::Baseline);
        Self {
            methodology,
            locked: config.general.lock_methodology,
            auto_break: config.general.auto_break,
            show_onboarding: config.general.show_onboarding,
            recent_task_limit: config.general.recent_task_limit as usize,
            config: config.clone(),
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct Controller {
    phase: Phase,
    /// Phases left by forward edges; Esc pops one.
    history: Vec<Phase>,
    options: ControllerOptions,
    descriptor: Descriptor,
    snapshot: SessionSnapshot,
    completion: CompletionState,
    timer: TimerView,
    setup: SetupState,
    recent_tasks: Vec<Task>,
    carry_over: Option<Task>,
    exited: bool,
    exit_action: Option<ExitAction>,
    size: (u16, u16),
}

impl Controller {
    /// Build a controller around the snapshot fetched at start-up. An
    /// active session sends the user straight to the Timer phase.
    pub fn new(options: ControllerOptions, snapshot: SessionSnapshot) -> Self {
        let descriptor = for_methodology(options.methodology, Some(&options.config));
        let phase = if snapshot.has_active() {
            Phase::Timer
        } else {
            Phase::Welcome
        };
        Self {
            phase,
            history: Vec::new(),
            options,
            descriptor,
            snapshot,
            completion: CompletionState::new(),
            timer: TimerView::default(),
            setup: SetupState::default(),
            recent_tasks: Vec::new(),
            carry_over: None,
            exited: false,
            exit_action: None,
            size: (80, 24),
        }
    }

    /// Effects the host should run once before the first event.
    pub fn bootstrap(&self) -> Vec<Effect> {
        vec![Effect::LoadTasks {
            limit: self.options.recent_task_limit,
        }]
    }

    /// Process one event and return the side effects it calls for.
    pub fn dispatch(&mut self, event: ControllerEvent) -> Vec<Effect> {
        if self.exited {
            return Vec::new();
        }

        match event {
            ControllerEvent::Key(Key::Cancel) => self.quit(None),
            ControllerEvent::Key(key) => self.handle_key(key),
            ControllerEvent::Resize { width, height } => {
                self.size = (width, height);
                Vec::new()
            }
            ControllerEvent::Tick => self.on_tick(),
            ControllerEvent::SnapshotFetched(snapshot) => self.on_snapshot(snapshot),
            ControllerEvent::TasksLoaded { recent, highlight } => {
                self.recent_tasks = recent;
                self.carry_over = highlight;
                let len = self.task_choices().len();
                self.setup.task_cursor.clamp(len);
                Vec::new()
            }
        }
    }

    fn handle_key(&mut self, key: Key) -> Vec<Effect> {
        match self.phase {
            Phase::Welcome => self.welcome_key(key),
            Phase::MainMenu => self.menu_key(key),
            Phase::ModePicker => self.mode_key(key),
            Phase::DurationPicker => self.duration_key(key),
            Phase::LaserChecklist => self.laser_key(key),
            Phase::TaskSelect => self.task_select_key(key),
            Phase::TaskName => self.task_name_key(key),
            Phase::OutcomePrompt => self.outcome_key(key),
            Phase::Timer => self.timer_key(key),
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    fn advance(&mut self, next: Phase) -> Vec<Effect> {
        tracing::debug!(from = ?self.phase, to = ?next, "phase transition");
        self.history.push(self.phase);
        self.phase = next;

        match next {
            Phase::DurationPicker => vec![Effect::LoadTasks {
                limit: self.options.recent_task_limit,
            }],
            Phase::Timer => {
                self.history.clear();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Reverse the forward edge that produced the current phase. With
    /// nowhere to go back to, leave the controller.
    fn back(&mut self) -> Vec<Effect> {
        match self.history.pop() {
            Some(previous) => {
                tracing::debug!(from = ?self.phase, to = ?previous, "phase back");
                self.phase = previous;
                Vec::new()
            }
            None => self.quit(None),
        }
    }

    fn quit(&mut self, action: Option<ExitAction>) -> Vec<Effect> {
        tracing::debug!(phase = ?self.phase, ?action, "controller exit");
        self.exited = true;
        self.exit_action = action;
        vec![Effect::Exit]
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }

    /// Exit action chosen from the main menu, if any.
    pub fn exit_action(&self) -> Option<ExitAction> {
        self.exit_action
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn methodology(&self) -> Methodology {
        self.descriptor.methodology
    }

    pub fn is_locked(&self) -> bool {
        self.options.locked
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn completion(&self) -> &CompletionState {
        &self.completion
    }

    pub fn timer(&self) -> &TimerView {
        &self.timer
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    /// Whether the "start new session" action is currently permitted.
    pub fn can_start_new(&self) -> bool {
        if self.snapshot.has_active() {
            return false;
        }
        match self.completed_type() {
            Some(completed) => self.completion.prompts_done(&self.descriptor, completed),
            None => true,
        }
    }

    /// Prompts blocking the next session after the last completion.
    pub fn outstanding(&self) -> Vec<Outstanding> {
        match self.completed_type() {
            Some(completed) => self.completion.outstanding(&self.descriptor, completed),
            None => Vec::new(),
        }
    }

    fn completed_type(&self) -> Option<SessionType> {
        if self.timer.completed {
            self.timer.completed_type
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ActiveSession, SessionStatus};
    use chrono::Utc;

    pub(crate) fn active(session_type: SessionType, status: SessionStatus) -> ActiveSession {
        ActiveSession {
            id: "s1".into(),
            session_type,
            status,
            label: "Write".into(),
            elapsed_secs: 600,
            remaining_secs: 900,
            started_at: Utc::now(),
            intended_outcome: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn starts_on_welcome_without_active_session() {
        let c = Controller::new(ControllerOptions::default(), SessionSnapshot::default());
        assert_eq!(c.phase(), Phase::Welcome);
        assert_eq!(c.bootstrap(), vec![Effect::LoadTasks { limit: 3 }]);
    }

    #[test]
    fn starts_on_timer_with_active_session() {
        let snapshot = SessionSnapshot {
            active: Some(active(SessionType::Work, SessionStatus::Running)),
            ..SessionSnapshot::default()
        };
        let c = Controller::new(ControllerOptions::default(), snapshot);
        assert_eq!(c.phase(), Phase::Timer);
        assert!(!c.can_start_new());
    }

    #[test]
    fn cancel_exits_from_anywhere() {
        let mut c = Controller::new(ControllerOptions::default(), SessionSnapshot::default());
        c.dispatch(Key::Enter.into());
        assert_eq!(c.phase(), Phase::MainMenu);
        assert_eq!(c.dispatch(Key::Cancel.into()), vec![Effect::Exit]);
        assert!(c.is_exited());
        assert_eq!(c.exit_action(), None);
        assert!(c.dispatch(ControllerEvent::Tick).is_empty());
    }

    #[test]
    fn resize_is_recorded() {
        let mut c = Controller::new(ControllerOptions::default(), SessionSnapshot::default());
        c.dispatch(ControllerEvent::Resize {
            width: 120,
            height: 40,
        });
        assert_eq!(c.size(), (120, 40));
    }

    #[test]
    fn options_follow_config() {
        let mut config = Config::default();
        config.general.methodology = "deep-focus".into();
        config.general.lock_methodology = true;
        let opts = ControllerOptions::from_config(&config);
        assert_eq!(opts.methodology, Methodology::DeepFocus);
        assert!(opts.locked);
    }
}
