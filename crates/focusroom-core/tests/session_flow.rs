//! End-to-end tests driving the controller against the SQLite session
//! service with a fake wall clock.
//!
//! The harness plays the host: it executes every effect synchronously and
//! feeds any resulting event straight back into the controller.

use chrono::{DateTime, Duration, TimeZone, Utc};
use focusroom_core::storage::BreaksConfig;
use focusroom_core::{
    CommandKind, Controller, ControllerEvent, ControllerOptions, Database, Effect, Key,
    LocalSessionService, Methodology, Phase, SessionService, SessionSnapshot, SessionType,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Harness
// ============================================================================

struct Harness {
    controller: Controller,
    service: LocalSessionService,
    now: Arc<Mutex<DateTime<Utc>>>,
    notifications: Vec<SessionType>,
    phases: Vec<Phase>,
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
}

impl Harness {
    fn new(methodology: Methodology) -> Self {
        Self::with_options(methodology, |_| {})
    }

    fn with_options(methodology: Methodology, tweak: impl FnOnce(&mut ControllerOptions)) -> Self {
        let now = Arc::new(Mutex::new(base_time()));
        let clock = Arc::clone(&now);
        let service = LocalSessionService::new(Database::open_memory().unwrap(), BreaksConfig::default())
            .with_clock(move || *clock.lock().unwrap());

        let mut options = ControllerOptions::default();
        options.methodology = methodology;
        options.show_onboarding = false;
        tweak(&mut options);

        let snapshot = service.fetch_snapshot().unwrap();
        let controller = Controller::new(options, snapshot);
        let phases = vec![controller.phase()];
        let mut harness = Self {
            controller,
            service,
            now,
            notifications: Vec::new(),
            phases,
        };
        let boot = harness.controller.bootstrap();
        harness.run(boot);
        harness
    }

    fn run(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            if let Effect::NotifySessionComplete { session_type } = effect {
                self.notifications.push(session_type);
            }
            if let Some(event) = effect.execute(&self.service) {
                queue.extend(self.dispatch_raw(event));
            }
        }
    }

    fn dispatch_raw(&mut self, event: ControllerEvent) -> Vec<Effect> {
        let effects = self.controller.dispatch(event);
        let phase = self.controller.phase();
        if self.phases.last() != Some(&phase) {
            self.phases.push(phase);
        }
        effects
    }

    fn press(&mut self, keys: &[Key]) {
        for key in keys {
            let effects = self.dispatch_raw((*key).into());
            self.run(effects);
        }
    }

    fn type_line(&mut self, text: &str) {
        let keys: Vec<Key> = text.chars().map(Key::Char).chain([Key::Enter]).collect();
        self.press(&keys);
    }

    fn tick(&mut self) {
        let effects = self.dispatch_raw(ControllerEvent::Tick);
        self.run(effects);
    }

    fn advance(&mut self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    fn snapshot(&self) -> &SessionSnapshot {
        self.controller.snapshot()
    }
}

// ============================================================================
// Setup flow
// ============================================================================

#[test]
fn test_ninety_minute_shortcut_goes_through_task_name_and_outcome() {
    let mut h = Harness::with_options(Methodology::DeepFocus, |o| o.locked = true);
    h.press(&[Key::Enter]);
    assert_eq!(h.controller.phase(), Phase::DurationPicker);
    assert_eq!(h.controller.descriptor().presets[0].short_label(), "90m");

    h.phases.clear();
    h.phases.push(Phase::DurationPicker);
    h.press(&[Key::Char('1')]);
    h.type_line("Chapter two");
    h.type_line("First draft exists");

    assert_eq!(
        h.phases,
        vec![
            Phase::DurationPicker,
            Phase::TaskName,
            Phase::OutcomePrompt,
            Phase::Timer
        ]
    );

    h.tick();
    let active = h.snapshot().active.clone().expect("session started");
    assert_eq!(active.session_type, SessionType::Work);
    assert_eq!(active.label, "Chapter two");
    assert_eq!(active.remaining_secs, 90 * 60);
    assert_eq!(active.intended_outcome.as_deref(), Some("First draft exists"));
    assert_eq!(active.tags, vec!["deep-focus".to_string(), "90m".to_string()]);
}

#[test]
fn test_recent_tasks_offer_task_select() {
    let mut h = Harness::new(Methodology::Baseline);
    h.press(&[Key::Enter, Key::Enter, Key::Enter, Key::Enter]);
    h.type_line("Inbox");
    h.tick();
    h.press(&[Key::Char('f'), Key::Char('f')]);
    h.tick();
    assert!(h.controller.timer().completed);

    // A second run of the controller sees the task history.
    let snapshot = h.service.fetch_snapshot().unwrap();
    h.controller = Controller::new(
        ControllerOptions {
            show_onboarding: false,
            ..ControllerOptions::default()
        },
        snapshot,
    );
    let boot = h.controller.bootstrap();
    h.run(boot);
    h.press(&[Key::Enter, Key::Enter, Key::Enter, Key::Enter]);
    assert_eq!(h.controller.phase(), Phase::TaskSelect);
    let titles: Vec<_> = h.controller.task_choices().iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["Inbox".to_string()]);
}

#[test]
fn test_failed_start_still_enters_timer() {
    let mut h = Harness::with_options(Methodology::Baseline, |o| o.locked = true);
    // Something else started a break behind the controller's back.
    h.service.issue_command(CommandKind::Break).unwrap();

    h.press(&[Key::Enter, Key::Char('1')]);
    h.type_line("Report");
    assert_eq!(h.controller.phase(), Phase::Timer);

    h.tick();
    assert_eq!(h.snapshot().active_type(), Some(SessionType::Break));
}

// ============================================================================
// Completion and gating
// ============================================================================

#[test]
fn test_deep_focus_cycle_gates_and_restarts() {
    let mut h = Harness::with_options(Methodology::DeepFocus, |o| o.locked = true);
    h.press(&[Key::Enter, Key::Char('3')]);
    h.type_line("Refactor parser");
    h.type_line("");
    h.tick();
    assert!(h.snapshot().is_running());

    h.press(&[Key::Char('d')]);
    h.type_line("reply to Sam");
    h.press(&[Key::Char('e')]);

    h.advance(Duration::minutes(45));
    h.tick();
    h.tick();
    assert!(h.controller.timer().completed);
    assert_eq!(h.notifications, vec![SessionType::Work]);
    assert_eq!(h.snapshot().stats.work_sessions, 1);
    assert_eq!(h.snapshot().stats.work_minutes, 45);
    assert_eq!(h.snapshot().stats.distractions, 1);

    // Blocked until the ritual (or a note) and the review are done.
    h.press(&[Key::Char('s')]);
    h.tick();
    assert!(!h.snapshot().has_active());

    h.press(&[Key::Char('r')]);
    for answer in ["nothing", "", "tests", "done"] {
        h.type_line(answer);
    }
    assert!(h.controller.completion().shutdown_complete());
    // The review overlay opened by itself; acknowledge it.
    h.press(&[Key::Enter]);
    assert!(h.controller.can_start_new());

    h.press(&[Key::Char('s')]);
    h.tick();
    let active = h.snapshot().active.clone().expect("restarted");
    assert_eq!(active.label, "Refactor parser");
    assert!(!h.controller.timer().completed);
    assert!(h.controller.completion().distractions().is_empty());
    assert_eq!(h.controller.completion().ritual().step(), 0);

    let reflection = h
        .service
        .with_db(|db| Ok(db.reflection_since(base_time() - Duration::hours(1))?))
        .unwrap();
    assert_eq!(reflection.rituals.len(), 1);
    assert_eq!(reflection.rituals[0].tomorrow_plan, "tests");
    assert_eq!(reflection.distractions.len(), 1);
}

#[test]
fn test_highlight_cycle_records_score_and_recharge() {
    let mut h = Harness::with_options(Methodology::Highlight, |o| o.locked = true);
    h.press(&[Key::Enter, Key::Char('2')]);
    assert_eq!(h.controller.phase(), Phase::LaserChecklist);
    h.press(&[Key::Char('1'), Key::Char('2'), Key::Char('3'), Key::Enter]);
    h.type_line("Ship release");
    h.tick();

    h.advance(Duration::minutes(30));
    h.tick();
    assert!(h.controller.is_completion_screen());

    h.press(&[Key::Char('5'), Key::Char('w')]);
    assert!(h.controller.can_start_new());

    let reflection = h
        .service
        .with_db(|db| Ok(db.reflection_since(base_time())?))
        .unwrap();
    assert_eq!(reflection.focus_scores, vec![5]);
    assert_eq!(reflection.recharge, vec!["walk".to_string()]);

    let task = h
        .service
        .with_db(|db| Ok(db.task_by_title("Ship release")?))
        .unwrap()
        .unwrap();
    assert!(task.is_highlight);
}

#[test]
fn test_yesterdays_highlight_is_carried_over() {
    let mut h = Harness::with_options(Methodology::Highlight, |o| o.locked = true);
    h.press(&[Key::Enter, Key::Char('1'), Key::Enter]);
    h.type_line("Launch page");
    h.tick();

    h.advance(Duration::days(1));
    let highlight = h.service.fetch_yesterday_highlight().unwrap().unwrap();
    assert_eq!(highlight.title, "Launch page");

    h.advance(Duration::days(1));
    assert!(h.service.fetch_yesterday_highlight().unwrap().is_none());
}

#[test]
fn test_auto_break_starts_break_session() {
    let mut h = Harness::with_options(Methodology::Baseline, |o| {
        o.locked = true;
        o.auto_break = true;
    });
    h.press(&[Key::Enter, Key::Char('3')]);
    h.type_line("Emails");
    h.tick();

    h.advance(Duration::minutes(15));
    h.tick();
    assert_eq!(h.controller.timer().auto_break, 3);
    h.tick();
    h.tick();
    h.tick();
    // The break command ran before the fetch in the same tick.
    let active = h.snapshot().active.clone().expect("break running");
    assert_eq!(active.session_type, SessionType::Break);
    assert_eq!(active.remaining_secs, 5 * 60);
    assert_eq!(h.notifications, vec![SessionType::Work]);
}

#[test]
fn test_break_twice_during_work_records_partial_session() {
    let mut h = Harness::with_options(Methodology::DeepFocus, |o| o.locked = true);
    h.press(&[Key::Enter, Key::Char('1')]);
    h.type_line("Design doc");
    h.type_line("");
    h.tick();

    h.advance(Duration::minutes(20));
    h.press(&[Key::Char('b'), Key::Char('b')]);
    h.tick();
    let active = h.snapshot().active.clone().expect("break running");
    assert_eq!(active.session_type, SessionType::Break);
    assert_eq!(active.remaining_secs, 15 * 60);

    let sessions = h
        .service
        .with_db(|db| Ok(db.sessions_since(base_time())?))
        .unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(!sessions[0].finished);
    assert_eq!(sessions[0].duration_min, 20);
}
