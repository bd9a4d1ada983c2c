//! Collaborator interfaces consumed by the controller host.
//!
//! Both traits are synchronous. Hosts run them off their event loop and
//! treat every call as fire-and-forget; the visible effect of a command only
//! shows up in the next fetched snapshot.

use crate::completion::{DistractionCategory, RechargeActivity, RitualRecord};
use crate::error::Result;

use super::{CommandKind, SessionSnapshot, StartRequest, Task};

/// Owner of the countdown and of task history.
pub trait SessionService: Send + Sync {
    fn fetch_snapshot(&self) -> Result<SessionSnapshot>;

    fn issue_command(&self, kind: CommandKind) -> Result<()>;

    fn start_session(&self, request: &StartRequest) -> Result<()>;

    /// Most recently used tasks first.
    fn fetch_recent_tasks(&self, limit: usize) -> Result<Vec<Task>>;

    /// Yesterday's highlight, carried over to today.
    fn fetch_yesterday_highlight(&self) -> Result<Option<Task>>;
}

/// Sink for post-completion artifacts.
pub trait CompletionRecorder: Send + Sync {
    fn log_distraction(&self, text: &str, category: DistractionCategory) -> Result<()>;

    fn record_accomplishment(&self, text: &str) -> Result<()>;

    fn record_ritual(&self, record: &RitualRecord) -> Result<()>;

    fn record_focus_score(&self, score: u8) -> Result<()>;

    fn record_energize_activity(&self, activity: RechargeActivity) -> Result<()>;
}

/// Run a collaborator call whose failure must not interrupt the user.
///
/// The error is logged and dropped; the next snapshot fetch is what
/// reconciles displayed state with the backend.
pub fn best_effort<T>(label: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(operation = label, error = %err, "best-effort call failed; ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};

    #[test]
    fn best_effort_passes_values_through() {
        assert_eq!(best_effort("noop", Ok::<_, CoreError>(7)), Some(7));
    }

    #[test]
    fn best_effort_swallows_errors() {
        let failed: Result<()> = Err(ValidationError::InvalidCommand {
            command: "stop".into(),
            reason: "no active session".into(),
        }
        .into());
        assert_eq!(best_effort("stop", failed), None);
    }
}
