use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, instrument};

use sched_core::{Task, TaskDraft, TaskId};

use crate::database::Database;
use crate::error::StoreError;

const SELECT_COLUMNS: &str = "SELECT id, date, title, comment, repeat FROM scheduler";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: TaskId::from_raw(row.get(0)?),
        date: row.get(1)?,
        title: row.get(2)?,
        comment: row.get(3)?,
        repeat: row.get(4)?,
    })
}

/// CRUD over the `scheduler` table.
#[derive(Clone)]
pub struct TaskRepo {
    db: Database,
}

impl TaskRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a task and return its new id. Any id on the draft is ignored.
    #[instrument(skip(self, draft), fields(date = %draft.date))]
    pub fn insert(&self, draft: &TaskDraft) -> Result<TaskId, StoreError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO scheduler (date, title, comment, repeat) VALUES (?1, ?2, ?3, ?4)",
                params![draft.date, draft.title, draft.comment, draft.repeat],
            )?;
            let id = TaskId::from_raw(conn.last_insert_rowid());
            debug!(task_id = %id, "task inserted");
            Ok(id)
        })
    }

    #[instrument(skip(self), fields(task_id = %id))]
    pub fn get(&self, id: TaskId) -> Result<Task, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id.get()],
                task_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
        })
    }

    /// Up to `limit` tasks, earliest date first.
    #[instrument(skip(self))]
    pub fn list(&self, limit: usize) -> Result<Vec<Task>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY date ASC, id ASC LIMIT ?1"))?;
            let rows = stmt
                .query_map([limit as i64], task_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Replace every field of an existing task.
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    pub fn update(&self, task: &Task) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE scheduler SET date = ?1, title = ?2, comment = ?3, repeat = ?4 WHERE id = ?5",
                params![task.date, task.title, task.comment, task.repeat, task.id.get()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(task.id.to_string()));
            }
            Ok(())
        })
    }

    /// Move a task to `next`, but only if its date is still `expected`.
    ///
    /// Fails with `NotFound` when the row is gone and `Conflict` when its date
    /// changed since the caller read it.
    #[instrument(skip(self), fields(task_id = %id))]
    pub fn advance_date(&self, id: TaskId, expected: &str, next: &str) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE scheduler SET date = ?1 WHERE id = ?2 AND date = ?3",
                params![next, id.get(), expected],
            )?;
            if changed > 0 {
                return Ok(());
            }
            let exists = conn
                .query_row("SELECT 1 FROM scheduler WHERE id = ?1", [id.get()], |_| Ok(()))
                .optional()?
                .is_some();
            if exists {
                Err(StoreError::Conflict(format!("task {id} no longer dated {expected}")))
            } else {
                Err(StoreError::NotFound(id.to_string()))
            }
        })
    }

    /// Delete a task. Returns whether a row was removed; deleting a missing
    /// id is not an error.
    #[instrument(skip(self), fields(task_id = %id))]
    pub fn delete(&self, id: TaskId) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM scheduler WHERE id = ?1", [id.get()])?;
            Ok(removed > 0)
        })
    }
}
