//! SQLite-backed storage.
//!
//! Provides persistent storage for:
//! - Finished sessions (work and break) and daily statistics
//! - Tasks, including daily highlights
//! - Post-completion artifacts (distractions, accomplishments, rituals,
//!   focus scores, recharge activities)
//! - Key-value store for the active session clock and last start request

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data_dir;
use crate::completion::{Distraction, DistractionCategory, RitualRecord};
use crate::error::{CoreError, DatabaseError};
use crate::session::{DailyStats, SessionType, Task};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub session_type: SessionType,
    pub label: String,
    pub task_id: Option<String>,
    pub duration_min: u64,
    /// False when the session was stopped before its countdown ran out.
    pub finished: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Everything recorded after completions within a time window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub accomplishments: Vec<String>,
    pub rituals: Vec<RitualRecord>,
    pub focus_scores: Vec<u8>,
    pub recharge: Vec<String>,
    pub distractions: Vec<Distraction>,
}

/// SQLite database for sessions, tasks and completion artifacts.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/focusroom/focusroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        Self::open_at(&data_dir()?.join("focusroom.db"))
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database, mostly for tests.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id           TEXT PRIMARY KEY,
                    session_type TEXT NOT NULL,
                    label        TEXT NOT NULL DEFAULT '',
                    task_id      TEXT,
                    duration_min INTEGER NOT NULL,
                    finished     INTEGER NOT NULL DEFAULT 1,
                    started_at   TEXT NOT NULL,
                    completed_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id           TEXT PRIMARY KEY,
                    title        TEXT NOT NULL UNIQUE,
                    is_highlight INTEGER NOT NULL DEFAULT 0,
                    created_at   TEXT NOT NULL,
                    last_used_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS distractions (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    text       TEXT NOT NULL,
                    category   TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS accomplishments (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    text       TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS rituals (
                    id             INTEGER PRIMARY KEY AUTOINCREMENT,
                    pending_tasks  TEXT NOT NULL,
                    calendar       TEXT NOT NULL,
                    tomorrow_plan  TEXT NOT NULL,
                    closing_phrase TEXT NOT NULL,
                    created_at     TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS focus_scores (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    score      INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS energize (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    activity   TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
                CREATE INDEX IF NOT EXISTS idx_tasks_last_used_at ON tasks(last_used_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn record_session(&self, record: &SessionRecord) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions
                (id, session_type, label, task_id, duration_min, finished, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.session_type.as_str(),
                record.label,
                record.task_id,
                record.duration_min,
                record.finished,
                record.started_at.to_rfc3339(),
                record.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Sessions completed at or after `since`, oldest first.
    pub fn sessions_since(&self, since: DateTime<Utc>) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_type, label, task_id, duration_min, finished, started_at, completed_at
             FROM sessions
             WHERE completed_at >= ?1
             ORDER BY completed_at",
        )?;
        let rows = stmt.query_map(params![since.to_rfc3339()], |row| {
            Ok(SessionRecord {
                id: row.get(0)?,
                session_type: SessionType::parse(&row.get::<_, String>(1)?)
                    .unwrap_or(SessionType::Work),
                label: row.get(2)?,
                task_id: row.get(3)?,
                duration_min: row.get(4)?,
                finished: row.get(5)?,
                started_at: parse_ts(&row.get::<_, String>(6)?),
                completed_at: parse_ts(&row.get::<_, String>(7)?),
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Aggregates for everything completed at or after `since`.
    pub fn stats_since(&self, since: DateTime<Utc>) -> Result<DailyStats, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_type, COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM sessions
             WHERE completed_at >= ?1
             GROUP BY session_type",
        )?;
        let rows = stmt.query_map(params![since.to_rfc3339()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let mut stats = DailyStats::default();
        for row in rows {
            let (session_type, count, minutes) = row?;
            match SessionType::parse(&session_type) {
                Some(SessionType::Work) => {
                    stats.work_sessions += count;
                    stats.work_minutes += minutes;
                }
                Some(SessionType::Break) => stats.break_sessions += count,
                None => {}
            }
        }

        stats.distractions = self.conn.query_row(
            "SELECT COUNT(*) FROM distractions WHERE created_at >= ?1",
            params![since.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(stats)
    }

    pub fn stats_today(&self) -> Result<DailyStats, DatabaseError> {
        self.stats_since(start_of_day(Utc::now()))
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// Insert a task or bump its `last_used_at`. Titles are unique.
    pub fn touch_task(
        &self,
        title: &str,
        is_highlight: bool,
        now: DateTime<Utc>,
    ) -> Result<Task, DatabaseError> {
        let ts = now.to_rfc3339();
        self.conn.execute(
            "INSERT INTO tasks (id, title, is_highlight, created_at, last_used_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(title) DO UPDATE SET
                last_used_at = excluded.last_used_at,
                is_highlight = MAX(tasks.is_highlight, excluded.is_highlight)",
            params![uuid::Uuid::new_v4().to_string(), title, is_highlight, ts],
        )?;
        self.task_by_title(title)?
            .ok_or_else(|| DatabaseError::QueryFailed(format!("task '{title}' vanished after upsert")))
    }

    pub fn task_by_title(&self, title: &str) -> Result<Option<Task>, DatabaseError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, title, is_highlight, last_used_at FROM tasks WHERE title = ?1",
                params![title],
                row_to_task,
            )
            .optional()?)
    }

    pub fn task_by_id(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, title, is_highlight, last_used_at FROM tasks WHERE id = ?1",
                params![id],
                row_to_task,
            )
            .optional()?)
    }

    pub fn recent_tasks(&self, limit: usize) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, is_highlight, last_used_at
             FROM tasks
             ORDER BY last_used_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], row_to_task)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Most recent highlight last used within `[start, end)` whose work
    /// session did not run to completion since `start`.
    pub fn highlight_used_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Task>, DatabaseError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, title, is_highlight, last_used_at
                 FROM tasks
                 WHERE is_highlight = 1 AND last_used_at >= ?1 AND last_used_at < ?2
                   AND NOT EXISTS (
                       SELECT 1 FROM sessions s
                       WHERE s.task_id = tasks.id
                         AND s.session_type = 'work'
                         AND s.finished = 1
                         AND s.completed_at >= ?1
                   )
                 ORDER BY last_used_at DESC
                 LIMIT 1",
                params![start.to_rfc3339(), end.to_rfc3339()],
                row_to_task,
            )
            .optional()?)
    }

    // ── Completion artifacts ─────────────────────────────────────────

    pub fn insert_distraction(
        &self,
        text: &str,
        category: DistractionCategory,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO distractions (text, category, created_at) VALUES (?1, ?2, ?3)",
            params![text, category.as_str(), now.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn insert_accomplishment(&self, text: &str, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO accomplishments (text, created_at) VALUES (?1, ?2)",
            params![text, now.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn insert_ritual(&self, record: &RitualRecord, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO rituals (pending_tasks, calendar, tomorrow_plan, closing_phrase, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.pending_tasks,
                record.calendar,
                record.tomorrow_plan,
                record.closing_phrase,
                now.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn insert_focus_score(&self, score: u8, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO focus_scores (score, created_at) VALUES (?1, ?2)",
            params![score, now.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn insert_energize(&self, activity: &str, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO energize (activity, created_at) VALUES (?1, ?2)",
            params![activity, now.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Collect every artifact recorded at or after `since`.
    pub fn reflection_since(&self, since: DateTime<Utc>) -> Result<Reflection, DatabaseError> {
        let since = since.to_rfc3339();
        let mut reflection = Reflection::default();

        let mut stmt = self
            .conn
            .prepare("SELECT text FROM accomplishments WHERE created_at >= ?1 ORDER BY id")?;
        reflection.accomplishments = stmt
            .query_map(params![since], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT pending_tasks, calendar, tomorrow_plan, closing_phrase
             FROM rituals WHERE created_at >= ?1 ORDER BY id",
        )?;
        reflection.rituals = stmt
            .query_map(params![since], |row| {
                Ok(RitualRecord {
                    pending_tasks: row.get(0)?,
                    calendar: row.get(1)?,
                    tomorrow_plan: row.get(2)?,
                    closing_phrase: row.get(3)?,
                })
            })?
            .collect::<Result<_, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT score FROM focus_scores WHERE created_at >= ?1 ORDER BY id")?;
        reflection.focus_scores = stmt
            .query_map(params![since], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT activity FROM energize WHERE created_at >= ?1 ORDER BY id")?;
        reflection.recharge = stmt
            .query_map(params![since], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT text, category FROM distractions WHERE created_at >= ?1 ORDER BY id")?;
        reflection.distractions = stmt
            .query_map(params![since], |row| {
                Ok(Distraction {
                    text: row.get(0)?,
                    category: DistractionCategory::parse(&row.get::<_, String>(1)?),
                })
            })?
            .collect::<Result<_, _>>()?;

        Ok(reflection)
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Midnight (UTC) of the day containing `at`.
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(at)
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        is_highlight: row.get(2)?,
        last_used_at: parse_ts(&row.get::<_, String>(3)?),
    })
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn record(session_type: SessionType, minutes: u64, at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_type,
            label: "Write".into(),
            task_id: None,
            duration_min: minutes,
            finished: true,
            started_at: at - Duration::minutes(minutes as i64),
            completed_at: at,
        }
    }

    #[test]
    fn record_and_aggregate() {
        let db = Database::open_memory().unwrap();
        let day = ts("2026-03-02T00:00:00Z");
        db.record_session(&record(SessionType::Work, 25, day + Duration::hours(9)))
            .unwrap();
        db.record_session(&record(SessionType::Work, 50, day + Duration::hours(10)))
            .unwrap();
        db.record_session(&record(SessionType::Break, 5, day + Duration::hours(11)))
            .unwrap();
        db.record_session(&record(SessionType::Work, 90, day - Duration::hours(2)))
            .unwrap();
        db.insert_distraction("email", DistractionCategory::External, day + Duration::hours(9))
            .unwrap();

        let stats = db.stats_since(day).unwrap();
        assert_eq!(stats.work_sessions, 2);
        assert_eq!(stats.work_minutes, 75);
        assert_eq!(stats.break_sessions, 1);
        assert_eq!(stats.distractions, 1);
        assert_eq!(db.sessions_since(day).unwrap().len(), 3);
    }

    #[test]
    fn touch_task_is_an_upsert() {
        let db = Database::open_memory().unwrap();
        let first = db.touch_task("Write report", false, ts("2026-03-01T09:00:00Z")).unwrap();
        let again = db.touch_task("Write report", true, ts("2026-03-02T09:00:00Z")).unwrap();
        assert_eq!(first.id, again.id);
        assert!(again.is_highlight);
        assert_eq!(again.last_used_at, ts("2026-03-02T09:00:00Z"));
        assert_eq!(db.task_by_id(&first.id).unwrap().unwrap().title, "Write report");
    }

    #[test]
    fn recent_tasks_newest_first() {
        let db = Database::open_memory().unwrap();
        db.touch_task("a", false, ts("2026-03-01T09:00:00Z")).unwrap();
        db.touch_task("b", false, ts("2026-03-01T10:00:00Z")).unwrap();
        db.touch_task("c", false, ts("2026-03-01T11:00:00Z")).unwrap();
        let titles: Vec<_> = db
            .recent_tasks(2)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["c", "b"]);
    }

    #[test]
    fn highlight_window_lookup() {
        let db = Database::open_memory().unwrap();
        db.touch_task("ship it", true, ts("2026-03-01T15:00:00Z")).unwrap();
        db.touch_task("not a highlight", false, ts("2026-03-01T16:00:00Z")).unwrap();
        let found = db
            .highlight_used_between(ts("2026-03-01T00:00:00Z"), ts("2026-03-02T00:00:00Z"))
            .unwrap()
            .unwrap();
        assert_eq!(found.title, "ship it");
        assert!(db
            .highlight_used_between(ts("2026-03-02T00:00:00Z"), ts("2026-03-03T00:00:00Z"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn finished_highlight_is_not_carried_over() {
        let db = Database::open_memory().unwrap();
        let yesterday = ts("2026-03-01T00:00:00Z");
        let today = ts("2026-03-02T00:00:00Z");
        let task = db.touch_task("ship it", true, ts("2026-03-01T09:00:00Z")).unwrap();

        let mut stopped = record(SessionType::Work, 20, ts("2026-03-01T09:20:00Z"));
        stopped.task_id = Some(task.id.clone());
        stopped.finished = false;
        db.record_session(&stopped).unwrap();
        assert_eq!(
            db.highlight_used_between(yesterday, today).unwrap().map(|t| t.title),
            Some("ship it".to_string())
        );

        let mut done = record(SessionType::Work, 60, ts("2026-03-01T11:00:00Z"));
        done.task_id = Some(task.id);
        db.record_session(&done).unwrap();
        assert!(db.highlight_used_between(yesterday, today).unwrap().is_none());
    }

    #[test]
    fn reflection_collects_artifacts() {
        let db = Database::open_memory().unwrap();
        let now = ts("2026-03-02T12:00:00Z");
        db.insert_accomplishment("drafted intro", now).unwrap();
        db.insert_ritual(
            &RitualRecord {
                closing_phrase: "done".into(),
                ..RitualRecord::default()
            },
            now,
        )
        .unwrap();
        db.insert_focus_score(4, now).unwrap();
        db.insert_energize("walk", now).unwrap();
        db.insert_distraction("twitter", DistractionCategory::Internal, now)
            .unwrap();

        let r = db.reflection_since(start_of_day(now)).unwrap();
        assert_eq!(r.accomplishments, vec!["drafted intro"]);
        assert_eq!(r.rituals[0].closing_phrase, "done");
        assert_eq!(r.focus_scores, vec![4]);
        assert_eq!(r.recharge, vec!["walk"]);
        assert_eq!(r.distractions[0].category, DistractionCategory::Internal);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().as_deref(), Some("hello"));
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn start_of_day_truncates() {
        assert_eq!(
            start_of_day(ts("2026-03-02T17:45:12Z")),
            ts("2026-03-02T00:00:00Z")
        );
    }
}
