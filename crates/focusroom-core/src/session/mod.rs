//! Session domain model shared between the controller and the session
//! service that owns the countdown.
//!
//! The controller only ever *reads* a [`SessionSnapshot`]; every fetch
//! replaces the previous one wholesale.

mod clock;
mod local;
mod service;

pub use clock::{ClockState, SessionClock};
pub use local::LocalSessionService;
pub use service::{best_effort, CompletionRecorder, SessionService};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::methodology::{DurationPreset, Methodology};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Work,
    Break,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::Break => "break",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(SessionType::Work),
            "break" => Some(SessionType::Break),
            _ => None,
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Paused,
}

/// The session currently counting down, as seen by one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: String,
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub label: String,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub intended_outcome: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ActiveSession {
    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// 0.0 .. 1.0 progress through the session.
    pub fn progress(&self) -> f64 {
        let total = self.elapsed_secs + self.remaining_secs;
        if total == 0 {
            return 1.0;
        }
        self.elapsed_secs as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_highlight: bool,
    pub last_used_at: DateTime<Utc>,
}

/// Aggregates for the current day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub work_sessions: u32,
    pub work_minutes: u64,
    pub break_sessions: u32,
    pub distractions: u32,
}

/// Immutable, full-replacement view of externally owned session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub active: Option<ActiveSession>,
    pub task: Option<Task>,
    pub stats: DailyStats,
}

impl SessionSnapshot {
    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(ActiveSession::is_running)
    }

    pub fn active_type(&self) -> Option<SessionType> {
        self.active.as_ref().map(|s| s.session_type)
    }
}

/// Commands the controller can issue to the session service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Start,
    Pause,
    Resume,
    Stop,
    Break,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Start => "start",
            CommandKind::Pause => "pause",
            CommandKind::Resume => "resume",
            CommandKind::Stop => "stop",
            CommandKind::Break => "break",
        }
    }
}

/// Everything the setup flow collected, handed to the service once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub methodology: Methodology,
    pub preset_index: usize,
    pub preset: DurationPreset,
    pub task_name: String,
    #[serde(default)]
    pub intended_outcome: Option<String>,
}
