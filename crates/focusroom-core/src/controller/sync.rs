//! Tick and snapshot handling: the controller half of the sync loop.
//!
//! Every tick requests a fetch; fetches may overlap and land in any order.
//! Each result replaces the local snapshot wholesale and is compared only
//! with the snapshot it replaces.

use super::runtime::AUTO_BREAK_TICKS;
use super::{Controller, Effect, Overlay};
use crate::session::{ActiveSession, CommandKind, SessionSnapshot, SessionType};

impl Controller {
    pub(super) fn on_tick(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.timer.auto_break > 0 {
            self.timer.auto_break -= 1;
            if self.timer.auto_break == 0 {
                tracing::info!("auto-break starting");
                effects.push(Effect::command(CommandKind::Break));
            }
        }
        effects.push(Effect::FetchSnapshot);
        effects
    }

    pub(super) fn on_snapshot(&mut self, next: SessionSnapshot) -> Vec<Effect> {
        let stale = match (&next.active, &self.timer.completed_id) {
            (Some(active), Some(completed)) => &active.id == completed,
            _ => false,
        };
        if stale {
            tracing::debug!("ignoring out-of-date snapshot");
            return Vec::new();
        }

        let previous = std::mem::replace(&mut self.snapshot, next);

        let current = self.snapshot.active.as_ref().map(|s| s.id.clone());

        match (previous.active, current) {
            (Some(ended), None) => self.on_completed(ended),
            (None, Some(_)) => {
                self.on_started();
                Vec::new()
            }
            (Some(before), Some(id)) if before.id != id => {
                self.on_started();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Active session vanished: treat it as completed.
    fn on_completed(&mut self, ended: ActiveSession) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.timer.completed_id = Some(ended.id.clone());
        if self.timer.completed {
            return effects;
        }

        let timer = &mut self.timer;
        timer.completed = true;
        timer.completed_type = Some(ended.session_type);
        timer.completed_elapsed_secs = ended.elapsed_secs;
        timer.confirm_finish = false;
        timer.confirm_break = false;
        if matches!(
            timer.overlay,
            Overlay::Distraction(_) | Overlay::DistractionCategory(_)
        ) {
            timer.overlay = Overlay::None;
        }

        tracing::info!(
            session_type = %ended.session_type,
            elapsed_secs = ended.elapsed_secs,
            "session completed"
        );

        if !timer.notified {
            timer.notified = true;
            effects.push(Effect::NotifySessionComplete {
                session_type: ended.session_type,
            });
        }
        if self.options.auto_break && ended.session_type == SessionType::Work {
            self.timer.auto_break = AUTO_BREAK_TICKS;
        }
        effects
    }

    /// A session appeared: fresh completion state for it.
    fn on_started(&mut self) {
        tracing::debug!("session started");
        self.timer = Default::default();
        self.completion.reset();
    }
}

#[cfg(test)]
mod tests {
    use crate::completion::DistractionCategory;
    use crate::controller::tests::active;
    use crate::controller::{Controller, ControllerEvent, ControllerOptions, Effect, Key};
    use crate::methodology::Methodology;
    use crate::session::{CommandKind, SessionSnapshot, SessionStatus, SessionType};

    fn with_work(auto_break: bool) -> Controller {
        let mut opts = ControllerOptions::default();
        opts.methodology = Methodology::DeepFocus;
        opts.auto_break = auto_break;
        Controller::new(opts, work_snapshot("s1"))
    }

    fn work_snapshot(id: &str) -> SessionSnapshot {
        let mut session = active(SessionType::Work, SessionStatus::Running);
        session.id = id.into();
        SessionSnapshot {
            active: Some(session),
            ..SessionSnapshot::default()
        }
    }

    fn fetched(c: &mut Controller, snapshot: SessionSnapshot) -> Vec<Effect> {
        c.dispatch(ControllerEvent::SnapshotFetched(snapshot))
    }

    #[test]
    fn tick_requests_fetch() {
        let mut c = with_work(false);
        assert_eq!(c.dispatch(ControllerEvent::Tick), vec![Effect::FetchSnapshot]);
    }

    #[test]
    fn completion_edge_captures_type_and_elapsed() {
        let mut c = with_work(false);
        let effects = fetched(&mut c, SessionSnapshot::default());
        assert_eq!(
            effects,
            vec![Effect::NotifySessionComplete {
                session_type: SessionType::Work
            }]
        );
        assert!(c.timer().completed);
        assert_eq!(c.timer().completed_type, Some(SessionType::Work));
        assert_eq!(c.timer().completed_elapsed_secs, 600);
    }

    #[test]
    fn notification_fires_once_per_edge() {
        let mut c = with_work(false);
        let mut notifications = 0;
        for _ in 0..5 {
            let mut effects = c.dispatch(ControllerEvent::Tick);
            effects.extend(fetched(&mut c, SessionSnapshot::default()));
            notifications += effects
                .iter()
                .filter(|e| matches!(e, Effect::NotifySessionComplete { .. }))
                .count();
        }
        assert_eq!(notifications, 1);
    }

    #[test]
    fn restart_resets_completion_state() {
        let mut c = with_work(false);
        c.dispatch(Key::Char('d').into());
        for ch in "slack".chars() {
            c.dispatch(Key::Char(ch).into());
        }
        c.dispatch(Key::Enter.into());
        c.dispatch(Key::Char('i').into());
        fetched(&mut c, SessionSnapshot::default());
        c.dispatch(Key::Char('r').into());
        c.dispatch(Key::Enter.into());
        assert_eq!(c.completion().distractions().len(), 1);
        assert_eq!(c.completion().distractions()[0].category, DistractionCategory::Internal);

        fetched(&mut c, work_snapshot("s2"));
        assert!(!c.timer().completed);
        assert!(!c.timer().notified);
        assert!(c.completion().distractions().is_empty());
        assert_eq!(c.completion().ritual().step(), 0);
        assert_eq!(c.completion().focus_rating(), None);
        assert_eq!(c.completion().recharge(), None);
        assert!(!c.timer().overlay.is_open());

        // The next completion notifies again.
        assert_eq!(fetched(&mut c, SessionSnapshot::default()).len(), 1);
    }

    #[test]
    fn replaced_session_counts_as_restart() {
        let mut c = with_work(false);
        c.dispatch(Key::Char('f').into());
        assert!(c.timer().confirm_finish);
        fetched(&mut c, work_snapshot("s2"));
        assert!(!c.timer().confirm_finish);
    }

    #[test]
    fn late_fetch_of_completed_session_is_ignored() {
        let mut c = with_work(false);
        let mut effects = fetched(&mut c, SessionSnapshot::default());
        c.dispatch(Key::Char('a').into());
        for ch in "outline".chars() {
            c.dispatch(Key::Char(ch).into());
        }
        c.dispatch(Key::Enter.into());
        assert!(c.completion().accomplishment_saved());

        effects.extend(fetched(&mut c, work_snapshot("s1")));
        assert!(c.timer().completed);
        assert!(!c.snapshot().has_active());
        effects.extend(fetched(&mut c, SessionSnapshot::default()));

        let notifications = effects
            .iter()
            .filter(|e| matches!(e, Effect::NotifySessionComplete { .. }))
            .count();
        assert_eq!(notifications, 1);
        assert!(c.completion().accomplishment_saved());
        assert!(c.can_start_new());
    }

    #[test]
    fn next_session_after_completion_still_restarts() {
        let mut c = with_work(false);
        fetched(&mut c, SessionSnapshot::default());
        fetched(&mut c, work_snapshot("s2"));
        assert!(!c.timer().completed);
        assert_eq!(c.timer().completed_id, None);
        assert_eq!(fetched(&mut c, SessionSnapshot::default()).len(), 1);
    }

    #[test]
    fn auto_break_fires_after_three_quiet_ticks() {
        let mut c = with_work(true);
        fetched(&mut c, SessionSnapshot::default());
        assert_eq!(c.timer().auto_break, 3);
        assert_eq!(c.dispatch(ControllerEvent::Tick), vec![Effect::FetchSnapshot]);
        assert_eq!(c.dispatch(ControllerEvent::Tick), vec![Effect::FetchSnapshot]);
        assert_eq!(
            c.dispatch(ControllerEvent::Tick),
            vec![Effect::command(CommandKind::Break), Effect::FetchSnapshot]
        );
        assert_eq!(c.timer().auto_break, 0);
    }

    #[test]
    fn key_press_cancels_auto_break() {
        let mut c = with_work(true);
        fetched(&mut c, SessionSnapshot::default());
        c.dispatch(ControllerEvent::Tick);
        assert!(c.dispatch(Key::Char('x').into()).is_empty());
        assert_eq!(c.timer().auto_break, 0);
        for _ in 0..5 {
            assert_eq!(c.dispatch(ControllerEvent::Tick), vec![Effect::FetchSnapshot]);
        }
    }

    #[test]
    fn auto_break_not_armed_after_break_completion() {
        let mut opts = ControllerOptions::default();
        opts.auto_break = true;
        let snapshot = SessionSnapshot {
            active: Some(active(SessionType::Break, SessionStatus::Running)),
            ..SessionSnapshot::default()
        };
        let mut c = Controller::new(opts, snapshot);
        fetched(&mut c, SessionSnapshot::default());
        assert_eq!(c.timer().auto_break, 0);
    }
}
