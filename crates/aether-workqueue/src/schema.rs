//! Database schema management.

use rusqlite::Connection;
use std::time::Duration;

/// Writers wait this long for the database lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Apply connection pragmas and create the task table.
pub(crate) fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    task_type TEXT NOT NULL,
    payload TEXT NOT NULL,
    status TEXT NOT NULL,
    priority INTEGER NOT NULL,
    attempt INTEGER NOT NULL DEFAULT 0,
    max_attempts INTEGER NOT NULL,
    timeout_s INTEGER NOT NULL,
    run_after TEXT NOT NULL,
    locked_by TEXT,
    locked_at TEXT,
    result TEXT,
    error TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_claim ON tasks(status, run_after, priority);
CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);
"#;
