use serde::Serialize;

use super::ControllerEvent;
use crate::completion::{Distraction, RechargeActivity, RitualRecord};
use crate::session::{
    best_effort, CommandKind, CompletionRecorder, SessionService, SessionType, StartRequest,
};

/// Outward call requested by the controller. Hosts execute these
/// fire-and-forget and never report results back except through the next
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    FetchSnapshot,
    Command { kind: CommandKind },
    StartSession { request: StartRequest },
    LoadTasks { limit: usize },
    LogDistraction { distraction: Distraction },
    RecordAccomplishment { text: String },
    RecordRitual { record: RitualRecord },
    RecordFocusScore { score: u8 },
    RecordEnergize { activity: RechargeActivity },
    NotifySessionComplete { session_type: SessionType },
    Exit,
}

impl Effect {
    pub fn command(kind: CommandKind) -> Self {
        Effect::Command { kind }
    }

    /// Effects whose relative order matters and must run one after another.
    pub fn is_sequential(&self) -> bool {
        !matches!(
            self,
            Effect::FetchSnapshot | Effect::LoadTasks { .. } | Effect::NotifySessionComplete { .. } | Effect::Exit
        )
    }

    /// Run a service-bound effect synchronously, swallowing failures.
    ///
    /// Returns the event to feed back into the controller for effects that
    /// read data. `NotifySessionComplete` and `Exit` belong to the host and
    /// are ignored here.
    pub fn execute<S>(&self, service: &S) -> Option<ControllerEvent>
    where
        S: SessionService + CompletionRecorder + ?Sized,
    {
        match self {
            Effect::FetchSnapshot => best_effort("fetch_snapshot", service.fetch_snapshot())
                .map(ControllerEvent::SnapshotFetched),
            Effect::LoadTasks { limit } => {
                let recent =
                    best_effort("fetch_recent_tasks", service.fetch_recent_tasks(*limit))
                        .unwrap_or_default();
                let highlight =
                    best_effort("fetch_yesterday_highlight", service.fetch_yesterday_highlight())
                        .flatten();
                Some(ControllerEvent::TasksLoaded { recent, highlight })
            }
            Effect::Command { kind } => {
                best_effort(kind.as_str(), service.issue_command(*kind));
                None
            }
            Effect::StartSession { request } => {
                best_effort("start_session", service.start_session(request));
                None
            }
            Effect::LogDistraction { distraction } => {
                best_effort(
                    "log_distraction",
                    service.log_distraction(&distraction.text, distraction.category),
                );
                None
            }
            Effect::RecordAccomplishment { text } => {
                best_effort("record_accomplishment", service.record_accomplishment(text));
                None
            }
            Effect::RecordRitual { record } => {
                best_effort("record_ritual", service.record_ritual(record));
                None
            }
            Effect::RecordFocusScore { score } => {
                best_effort("record_focus_score", service.record_focus_score(*score));
                None
            }
            Effect::RecordEnergize { activity } => {
                best_effort("record_energize_activity", service.record_energize_activity(*activity));
                None
            }
            Effect::NotifySessionComplete { .. } | Effect::Exit => None,
        }
    }
}

/// What the user asked for when leaving through the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitAction {
    ViewStats,
    Reflect,
}
