//! SQLite task store.
//!
//! Every mutation is a single transaction. The claim runs under an
//! immediate (write-locked) transaction so concurrent claimers on the same
//! database file are serialized and a row is never handed out twice.
//! Resolve operations are guarded on `(id, locked_by, status = running)` and
//! report `false` instead of failing when the guard no longer matches.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::backoff::backoff_delay;
use crate::error::QueueError;
use crate::schema::init_schema;
use crate::task::{NewTask, Task, TaskStatus, TaskSummary};

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

const TASK_COLUMNS: &str = "id, task_type, payload, status, priority, attempt, max_attempts, \
     timeout_s, run_after, locked_by, locked_at, result, error, created_at, updated_at";

const SUMMARY_COLUMNS: &str =
    "id, task_type, status, priority, attempt, max_attempts, run_after, created_at, updated_at, error";

/// Fixed-width UTC timestamp so text order equals time order.
pub(crate) fn format_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn parse_json(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn parse_opt_json(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn parse_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<TaskStatus> {
    let raw: String = row.get(idx)?;
    TaskStatus::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown task status '{}'", raw).into(),
        )
    })
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        task_type: row.get(1)?,
        payload: parse_json(row, 2)?,
        status: parse_status(row, 3)?,
        priority: row.get(4)?,
        attempt: row.get(5)?,
        max_attempts: row.get(6)?,
        timeout_s: row.get(7)?,
        run_after: parse_ts(row, 8)?,
        locked_by: row.get(9)?,
        locked_at: parse_opt_ts(row, 10)?,
        result: parse_opt_json(row, 11)?,
        error: parse_opt_json(row, 12)?,
        created_at: parse_ts(row, 13)?,
        updated_at: parse_ts(row, 14)?,
    })
}

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<TaskSummary> {
    Ok(TaskSummary {
        id: row.get(0)?,
        task_type: row.get(1)?,
        status: parse_status(row, 2)?,
        priority: row.get(3)?,
        attempt: row.get(4)?,
        max_attempts: row.get(5)?,
        run_after: parse_ts(row, 6)?,
        created_at: parse_ts(row, 7)?,
        updated_at: parse_ts(row, 8)?,
        error: parse_opt_json(row, 9)?,
    })
}

fn select_task(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        row_to_task,
    )
    .optional()
}

/// Durable task table backed by a single SQLite file.
pub struct SqliteTaskStore {
    conn: Connection,
}

impl SqliteTaskStore {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| QueueError::Storage(e.to_string()))?;
            }
        }

        let conn = Connection::open(&path).await?;
        conn.call(|conn| Ok(init_schema(conn)?)).await?;

        info!("Task store opened at {:?}", path);
        Ok(Self { conn })
    }

    /// Create a private in-memory database.
    pub async fn in_memory() -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory().await?;
        conn.call(|conn| Ok(init_schema(conn)?)).await?;
        Ok(Self { conn })
    }

    /// Insert a `queued` row. Fails with `DuplicateId` if the id exists.
    pub async fn enqueue(&self, task: NewTask) -> Result<String, QueueError> {
        let now = Utc::now();
        let run_after = format_ts(task.run_after.unwrap_or(now));
        let now = format_ts(now);
        let payload = serde_json::to_string(&task.payload)
            .map_err(|e| QueueError::Storage(e.to_string()))?;
        let id = task.id.clone();

        let inserted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "INSERT INTO tasks (id, task_type, payload, status, priority, attempt,
                         max_attempts, timeout_s, run_after, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?9, ?9)
                     ON CONFLICT(id) DO NOTHING",
                    params![
                        task.id,
                        task.task_type,
                        payload,
                        TaskStatus::Queued.as_str(),
                        task.priority,
                        task.max_attempts,
                        task.timeout_s,
                        run_after,
                        now,
                    ],
                )?;
                Ok(changed == 1)
            })
            .await?;

        if !inserted {
            return Err(QueueError::DuplicateId(id));
        }

        debug!(task_id = %id, "Task enqueued");
        Ok(id)
    }

    /// Claim the next runnable task for `worker_id`.
    pub async fn claim_next(&self, worker_id: &str) -> Result<Option<Task>, QueueError> {
        self.claim_next_at(worker_id, Utc::now()).await
    }

    /// Claim the next task runnable at `now`.
    ///
    /// Among claimable rows with `run_after <= now`, picks the lowest
    /// priority value, then the earliest `created_at`.
    pub async fn claim_next_at(
        &self,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, QueueError> {
        let worker_id = worker_id.to_string();
        let now = format_ts(now);

        let claimed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                let candidate: Option<String> = tx
                    .query_row(
                        "SELECT id FROM tasks
                         WHERE status IN ('queued', 'retry_scheduled')
                           AND run_after <= ?1
                           AND locked_by IS NULL
                         ORDER BY priority ASC, created_at ASC, rowid ASC
                         LIMIT 1",
                        params![now],
                        |row| row.get(0),
                    )
                    .optional()?;

                let Some(id) = candidate else {
                    tx.commit()?;
                    return Ok(None);
                };

                let changed = tx.execute(
                    "UPDATE tasks
                     SET status = 'running', locked_by = ?1, locked_at = ?2, updated_at = ?2
                     WHERE id = ?3 AND locked_by IS NULL",
                    params![worker_id, now, id],
                )?;
                if changed == 0 {
                    tx.commit()?;
                    return Ok(None);
                }

                let task = select_task(&tx, &id)?;
                tx.commit()?;
                Ok(task)
            })
            .await?;

        if let Some(ref task) = claimed {
            debug!(task_id = %task.id, task_type = %task.task_type, "Task claimed");
        }
        Ok(claimed)
    }

    /// Record the start of an attempt.
    ///
    /// Returns the new attempt count, or `None` if `worker_id` no longer
    /// holds the running row.
    pub async fn increment_attempt(
        &self,
        id: &str,
        worker_id: &str,
    ) -> Result<Option<u32>, QueueError> {
        let id = id.to_string();
        let worker_id = worker_id.to_string();
        let now = format_ts(Utc::now());

        let attempt = self
            .conn
            .call(move |conn| {
                let attempt = conn
                    .query_row(
                        "UPDATE tasks SET attempt = attempt + 1, updated_at = ?1
                         WHERE id = ?2 AND locked_by = ?3 AND status = 'running'
                         RETURNING attempt",
                        params![now, id, worker_id],
                        |row| row.get::<_, u32>(0),
                    )
                    .optional()?;
                Ok(attempt)
            })
            .await?;
        Ok(attempt)
    }

    /// Resolve a running task as `success`.
    pub async fn mark_success(
        &self,
        id: &str,
        worker_id: &str,
        result: serde_json::Value,
    ) -> Result<bool, QueueError> {
        let result =
            serde_json::to_string(&result).map_err(|e| QueueError::Storage(e.to_string()))?;
        self.resolve(
            id,
            worker_id,
            "UPDATE tasks
             SET status = 'success', result = ?1, locked_by = NULL, locked_at = NULL, updated_at = ?2
             WHERE id = ?3 AND locked_by = ?4 AND status = 'running'",
            result,
            None,
        )
        .await
    }

    /// Resolve a running task as terminally `failed`.
    pub async fn mark_failed(
        &self,
        id: &str,
        worker_id: &str,
        error: serde_json::Value,
    ) -> Result<bool, QueueError> {
        let error = serde_json::to_string(&error).map_err(|e| QueueError::Storage(e.to_string()))?;
        self.resolve(
            id,
            worker_id,
            "UPDATE tasks
             SET status = 'failed', error = ?1, locked_by = NULL, locked_at = NULL, updated_at = ?2
             WHERE id = ?3 AND locked_by = ?4 AND status = 'running'",
            error,
            None,
        )
        .await
    }

    /// Release a running task for another attempt at `next_run_after`.
    pub async fn schedule_retry(
        &self,
        id: &str,
        worker_id: &str,
        next_run_after: DateTime<Utc>,
        error: serde_json::Value,
    ) -> Result<bool, QueueError> {
        let error = serde_json::to_string(&error).map_err(|e| QueueError::Storage(e.to_string()))?;
        self.resolve(
            id,
            worker_id,
            "UPDATE tasks
             SET status = 'retry_scheduled', error = ?1, locked_by = NULL, locked_at = NULL,
                 updated_at = ?2, run_after = ?5
             WHERE id = ?3 AND locked_by = ?4 AND status = 'running'",
            error,
            Some(format_ts(next_run_after)),
        )
        .await
    }

    async fn resolve(
        &self,
        id: &str,
        worker_id: &str,
        sql: &'static str,
        document: String,
        run_after: Option<String>,
    ) -> Result<bool, QueueError> {
        let id = id.to_string();
        let worker_id = worker_id.to_string();
        let now = format_ts(Utc::now());
        let log_id = id.clone();

        let applied = self
            .conn
            .call(move |conn| {
                let changed = match run_after {
                    Some(run_after) => {
                        conn.execute(sql, params![document, now, id, worker_id, run_after])?
                    }
                    None => conn.execute(sql, params![document, now, id, worker_id])?,
                };
                Ok(changed == 1)
            })
            .await?;

        if !applied {
            debug!(task_id = %log_id, "Resolve ignored, lock no longer held");
        }
        Ok(applied)
    }

    /// Refresh the lock of a running task held by `worker_id`.
    pub async fn touch(&self, id: &str, worker_id: &str) -> Result<bool, QueueError> {
        let id = id.to_string();
        let worker_id = worker_id.to_string();
        let now = format_ts(Utc::now());

        let applied = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE tasks SET locked_at = ?1, updated_at = ?1
                     WHERE id = ?2 AND locked_by = ?3 AND status = 'running'",
                    params![now, id, worker_id],
                )?;
                Ok(changed == 1)
            })
            .await?;
        Ok(applied)
    }

    /// Withdraw a task that has not started yet.
    pub async fn cancel(&self, id: &str) -> Result<bool, QueueError> {
        let id = id.to_string();
        let now = format_ts(Utc::now());

        let applied = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE tasks SET status = 'canceled', updated_at = ?1
                     WHERE id = ?2
                       AND status IN ('queued', 'retry_scheduled')
                       AND locked_by IS NULL",
                    params![now, id],
                )?;
                Ok(changed == 1)
            })
            .await?;
        Ok(applied)
    }

    /// Release running rows whose lock is older than
    /// `max(timeout_s * factor, min_secs)` seconds at `now`.
    ///
    /// Rows with attempts left go back to `retry_scheduled` with the
    /// regular backoff counted from `now`; exhausted rows become `failed`
    /// with a `lock_expired` error. Returns the number of rows released.
    pub async fn reclaim_stale(
        &self,
        now: DateTime<Utc>,
        factor: u32,
        min_secs: u64,
    ) -> Result<u64, QueueError> {
        let now_ts = format_ts(now);

        let reclaimed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                let running: Vec<(String, String, u64, u32, u32, Option<String>)> = {
                    let mut stmt = tx.prepare(
                        "SELECT id, locked_by, timeout_s, attempt, max_attempts, locked_at
                         FROM tasks WHERE status = 'running' AND locked_by IS NOT NULL",
                    )?;
                    let rows = stmt.query_map([], |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                        ))
                    })?;
                    rows.collect::<rusqlite::Result<_>>()?
                };

                let mut count = 0u64;
                for (id, locked_by, timeout_s, attempt, max_attempts, locked_at) in running {
                    let max_age = timeout_s.saturating_mul(u64::from(factor)).max(min_secs);
                    let expired = match locked_at
                        .as_deref()
                        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    {
                        Some(at) => {
                            let age = now.signed_duration_since(at.with_timezone(&Utc));
                            age.num_seconds() >= 0 && age.num_seconds() as u64 > max_age
                        }
                        None => true,
                    };
                    if !expired {
                        continue;
                    }

                    let changed = if attempt >= max_attempts {
                        let error = serde_json::json!({
                            "type": "lock_expired",
                            "message": format!("lock held by {} expired", locked_by),
                        })
                        .to_string();
                        tx.execute(
                            "UPDATE tasks
                             SET status = 'failed', error = ?1, locked_by = NULL,
                                 locked_at = NULL, updated_at = ?2
                             WHERE id = ?3 AND locked_by = ?4 AND status = 'running'",
                            params![error, now_ts, id, locked_by],
                        )?
                    } else {
                        let delay = chrono::Duration::from_std(backoff_delay(attempt))
                            .unwrap_or_else(|_| chrono::Duration::seconds(300));
                        let run_after = format_ts(now + delay);
                        tx.execute(
                            "UPDATE tasks
                             SET status = 'retry_scheduled', locked_by = NULL,
                                 locked_at = NULL, updated_at = ?1, run_after = ?2
                             WHERE id = ?3 AND locked_by = ?4 AND status = 'running'",
                            params![now_ts, run_after, id, locked_by],
                        )?
                    };
                    count += changed as u64;
                }

                tx.commit()?;
                Ok(count)
            })
            .await?;

        if reclaimed > 0 {
            warn!(count = reclaimed, "Reclaimed tasks with stale locks");
        }
        Ok(reclaimed)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Task>, QueueError> {
        let id = id.to_string();
        let task = self
            .conn
            .call(move |conn| Ok(select_task(conn, &id)?))
            .await?;
        Ok(task)
    }

    /// Most recently created tasks first.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<TaskSummary>, QueueError> {
        let limit = limit as i64;
        let tasks = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SUMMARY_COLUMNS} FROM tasks
                     ORDER BY created_at DESC, rowid DESC LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit], row_to_summary)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await?;
        Ok(tasks)
    }

    /// Number of tasks waiting to run (`queued` or `retry_scheduled`).
    pub async fn count_pending(&self) -> Result<u64, QueueError> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM tasks WHERE status IN ('queued', 'retry_scheduled')",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count.max(0) as u64)
    }
}
