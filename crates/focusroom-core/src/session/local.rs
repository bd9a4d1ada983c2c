//! SQLite-backed session service for single-user local use.
//!
//! The active countdown lives in the kv table as a serialized
//! [`SessionClock`], so a session keeps running (in wall-clock terms) across
//! process restarts. A fetch that finds the countdown at zero records the
//! session and clears it, which is what the controller sees as a completion
//! edge.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

use super::clock::SessionClock;
use super::service::{CompletionRecorder, SessionService};
use super::{CommandKind, SessionSnapshot, SessionType, StartRequest, Task};
use crate::completion::{DistractionCategory, RechargeActivity, RitualRecord};
use crate::error::{CoreError, Result, ValidationError};
use crate::methodology::Methodology;
use crate::storage::{start_of_day, BreaksConfig, Database, SessionRecord};

const ACTIVE_KEY: &str = "active_session";
const LAST_REQUEST_KEY: &str = "last_start_request";

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct LocalSessionService {
    db: Mutex<Database>,
    breaks: BreaksConfig,
    now: Clock,
}

impl LocalSessionService {
    pub fn new(db: Database, breaks: BreaksConfig) -> Self {
        Self {
            db: Mutex::new(db),
            breaks,
            now: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, for deterministic tests.
    pub fn with_clock(mut self, now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.now = Arc::new(now);
        self
    }

    /// Run `f` against the database, e.g. for read-only reporting.
    pub fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let db = self.lock()?;
        f(&db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| CoreError::Custom("session database mutex poisoned".into()))
    }

    fn load_clock(db: &Database) -> Result<Option<SessionClock>> {
        let Some(json) = db.kv_get(ACTIVE_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(clock) => Ok(Some(clock)),
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable active session");
                db.kv_delete(ACTIVE_KEY)?;
                Ok(None)
            }
        }
    }

    fn save_clock(db: &Database, clock: &SessionClock) -> Result<()> {
        db.kv_set(ACTIVE_KEY, &serde_json::to_string(clock)?)?;
        Ok(())
    }

    fn finish(db: &Database, clock: &SessionClock, finished: bool, now: DateTime<Utc>) -> Result<()> {
        db.record_session(&SessionRecord {
            id: clock.id.clone(),
            session_type: clock.session_type,
            label: clock.label.clone(),
            task_id: clock.task_id.clone(),
            duration_min: clock.elapsed_ms() / 60_000,
            finished,
            started_at: clock.started_at,
            completed_at: now,
        })?;
        db.kv_delete(ACTIVE_KEY)?;
        tracing::info!(
            session_type = %clock.session_type,
            label = %clock.label,
            finished,
            "session ended"
        );
        Ok(())
    }

    fn last_request(db: &Database) -> Result<Option<StartRequest>> {
        match db.kv_get(LAST_REQUEST_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json).ok()),
            None => Ok(None),
        }
    }

    fn begin_work(db: &Database, request: &StartRequest, now: DateTime<Utc>) -> Result<()> {
        let title = match request.task_name.trim() {
            "" => "Untitled",
            title => title,
        };
        let task = db.touch_task(title, request.methodology == Methodology::Highlight, now)?;

        let mut clock = SessionClock::start(
            SessionType::Work,
            task.title.clone(),
            request.preset.duration_secs(),
            now,
        );
        clock.task_id = Some(task.id);
        clock.intended_outcome = request
            .intended_outcome
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string);
        clock.tags = vec![
            request.methodology.id().to_string(),
            request.preset.short_label(),
        ];

        Self::save_clock(db, &clock)?;
        db.kv_set(LAST_REQUEST_KEY, &serde_json::to_string(request)?)?;
        tracing::info!(task = %task.title, minutes = request.preset.minutes, "work session started");
        Ok(())
    }

    fn invalid(kind: CommandKind, reason: &str) -> CoreError {
        ValidationError::InvalidCommand {
            command: kind.as_str().to_string(),
            reason: reason.to_string(),
        }
        .into()
    }
}

impl SessionService for LocalSessionService {
    fn fetch_snapshot(&self) -> Result<SessionSnapshot> {
        let now = (self.now)();
        let db = self.lock()?;

        let mut snapshot = SessionSnapshot::default();
        if let Some(mut clock) = Self::load_clock(&db)? {
            if clock.flush_at(now) {
                Self::finish(&db, &clock, true, now)?;
            } else {
                Self::save_clock(&db, &clock)?;
                if let Some(task_id) = clock.task_id.as_deref() {
                    snapshot.task = db.task_by_id(task_id)?;
                }
                snapshot.active = Some(clock.to_active());
            }
        }
        snapshot.stats = db.stats_since(start_of_day(now))?;
        Ok(snapshot)
    }

    fn issue_command(&self, kind: CommandKind) -> Result<()> {
        let now = (self.now)();
        let db = self.lock()?;
        let clock = Self::load_clock(&db)?;

        match (kind, clock) {
            (CommandKind::Start, None) => {
                let request = Self::last_request(&db)?
                    .ok_or_else(|| Self::invalid(kind, "no previous session to repeat"))?;
                Self::begin_work(&db, &request, now)
            }
            (CommandKind::Break, None) => {
                let methodology = Self::last_request(&db)?
                    .map(|r| r.methodology)
                    .unwrap_or(Methodology::Baseline);
                let minutes = methodology.break_minutes(&self.breaks);
                let clock =
                    SessionClock::start(SessionType::Break, "Break", u64::from(minutes) * 60, now);
                Self::save_clock(&db, &clock)?;
                tracing::info!(minutes, "break started");
                Ok(())
            }
            (CommandKind::Start | CommandKind::Break, Some(_)) => {
                Err(Self::invalid(kind, "a session is already active"))
            }
            (CommandKind::Pause, Some(mut clock)) => {
                if !clock.pause_at(now) {
                    return Err(Self::invalid(kind, "session is not running"));
                }
                Self::save_clock(&db, &clock)
            }
            (CommandKind::Resume, Some(mut clock)) => {
                if !clock.resume_at(now) {
                    return Err(Self::invalid(kind, "session is not paused"));
                }
                Self::save_clock(&db, &clock)
            }
            (CommandKind::Stop, Some(mut clock)) => {
                let finished = clock.flush_at(now);
                Self::finish(&db, &clock, finished, now)
            }
            (CommandKind::Pause | CommandKind::Resume | CommandKind::Stop, None) => {
                Err(Self::invalid(kind, "no active session"))
            }
        }
    }

    fn start_session(&self, request: &StartRequest) -> Result<()> {
        let now = (self.now)();
        let db = self.lock()?;
        if Self::load_clock(&db)?.is_some() {
            return Err(Self::invalid(CommandKind::Start, "a session is already active"));
        }
        Self::begin_work(&db, request, now)
    }

    fn fetch_recent_tasks(&self, limit: usize) -> Result<Vec<Task>> {
        Ok(self.lock()?.recent_tasks(limit)?)
    }

    fn fetch_yesterday_highlight(&self) -> Result<Option<Task>> {
        let today = start_of_day((self.now)());
        Ok(self
            .lock()?
            .highlight_used_between(today - Duration::days(1), today)?)
    }
}

impl CompletionRecorder for LocalSessionService {
    fn log_distraction(&self, text: &str, category: DistractionCategory) -> Result<()> {
        Ok(self.lock()?.insert_distraction(text, category, (self.now)())?)
    }

    fn record_accomplishment(&self, text: &str) -> Result<()> {
        Ok(self.lock()?.insert_accomplishment(text, (self.now)())?)
    }

    fn record_ritual(&self, record: &RitualRecord) -> Result<()> {
        Ok(self.lock()?.insert_ritual(record, (self.now)())?)
    }

    fn record_focus_score(&self, score: u8) -> Result<()> {
        if !(1..=5).contains(&score) {
            return Err(ValidationError::InvalidValue {
                field: "focus_score".into(),
                message: format!("{score} is outside 1-5"),
            }
            .into());
        }
        Ok(self.lock()?.insert_focus_score(score, (self.now)())?)
    }

    fn record_energize_activity(&self, activity: RechargeActivity) -> Result<()> {
        Ok(self.lock()?.insert_energize(activity.as_str(), (self.now)())?)
    }
}
