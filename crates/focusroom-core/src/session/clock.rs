//! Wall-clock countdown for the active session.
//!
//! Like a stopwatch read on demand: there is no internal thread. Every read
//! goes through [`SessionClock::flush_at`], which subtracts the wall-clock
//! time since the last read from `remaining_ms`.
//!
//! ```text
//! Running <-> Paused
//!    |
//!    +-> finished (remaining_ms == 0)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActiveSession, SessionStatus, SessionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    Running,
    Paused,
}

/// Countdown for one session. Serialized into the kv store between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClock {
    pub id: String,
    pub session_type: SessionType,
    pub label: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub intended_outcome: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub started_at: DateTime<Utc>,
    state: ClockState,
    total_ms: u64,
    remaining_ms: u64,
    /// Timestamp (ms since epoch) of the last flush while running.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
}

impl SessionClock {
    /// Start a running countdown of `duration_secs`.
    pub fn start(
        session_type: SessionType,
        label: impl Into<String>,
        duration_secs: u64,
        now: DateTime<Utc>,
    ) -> Self {
        let total_ms = duration_secs.saturating_mul(1000);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_type,
            label: label.into(),
            task_id: None,
            intended_outcome: None,
            tags: Vec::new(),
            started_at: now,
            state: ClockState::Running,
            total_ms,
            remaining_ms: total_ms,
            last_tick_epoch_ms: Some(epoch_ms(now)),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.total_ms.saturating_sub(self.remaining_ms)
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_ms == 0
    }

    pub fn to_active(&self) -> ActiveSession {
        ActiveSession {
            id: self.id.clone(),
            session_type: self.session_type,
            status: match self.state {
                ClockState::Running => SessionStatus::Running,
                ClockState::Paused => SessionStatus::Paused,
            },
            label: self.label.clone(),
            elapsed_secs: self.elapsed_ms() / 1000,
            remaining_secs: self.remaining_ms.div_ceil(1000),
            started_at: self.started_at,
            intended_outcome: self.intended_outcome.clone(),
            tags: self.tags.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Returns false when not running.
    pub fn pause_at(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Running {
            return false;
        }
        self.flush_at(now);
        self.state = ClockState::Paused;
        self.last_tick_epoch_ms = None;
        true
    }

    /// Returns false when not paused.
    pub fn resume_at(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Paused {
            return false;
        }
        self.state = ClockState::Running;
        self.last_tick_epoch_ms = Some(epoch_ms(now));
        true
    }

    /// Apply the wall-clock delta since the last flush. Returns true once
    /// the countdown has reached zero.
    pub fn flush_at(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_tick_epoch_ms {
            let now_ms = epoch_ms(now);
            let elapsed = now_ms.saturating_sub(last);
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_epoch_ms = Some(now_ms);
        }
        self.is_finished()
    }
}

fn epoch_ms(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn counts_down_on_flush() {
        let t0 = base();
        let mut clock = SessionClock::start(SessionType::Work, "Write", 60, t0);
        assert!(!clock.flush_at(t0 + Duration::seconds(20)));
        assert_eq!(clock.remaining_ms(), 40_000);
        assert_eq!(clock.to_active().elapsed_secs, 20);
        assert!(clock.flush_at(t0 + Duration::seconds(75)));
        assert_eq!(clock.remaining_ms(), 0);
    }

    #[test]
    fn paused_clock_does_not_advance() {
        let t0 = base();
        let mut clock = SessionClock::start(SessionType::Work, "Write", 60, t0);
        assert!(clock.pause_at(t0 + Duration::seconds(10)));
        assert!(!clock.pause_at(t0 + Duration::seconds(11)));
        clock.flush_at(t0 + Duration::seconds(50));
        assert_eq!(clock.remaining_ms(), 50_000);
        assert_eq!(clock.to_active().status, SessionStatus::Paused);

        assert!(clock.resume_at(t0 + Duration::seconds(50)));
        clock.flush_at(t0 + Duration::seconds(55));
        assert_eq!(clock.remaining_ms(), 45_000);
    }

    #[test]
    fn survives_serialization() {
        let clock = SessionClock::start(SessionType::Break, "Break", 300, base());
        let json = serde_json::to_string(&clock).unwrap();
        let back: SessionClock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clock);
    }

    #[test]
    fn zero_length_session_is_finished_immediately() {
        let t0 = base();
        let mut clock = SessionClock::start(SessionType::Work, "x", 0, t0);
        assert!(clock.flush_at(t0));
        assert_eq!(clock.to_active().progress(), 1.0);
    }
}
