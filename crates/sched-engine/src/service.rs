//! Task lifecycle: validation, date normalisation, and completion.
//!
//! Every operation that depends on the current date takes `now` explicitly;
//! the HTTP layer passes today's local date.

use chrono::NaiveDate;
use tracing::{debug, info};

use sched_core::dates::{format_date, parse_date};
use sched_core::repeat::{is_well_formed, next_date, RepeatRule};
use sched_core::{Task, TaskDraft, TaskId};
use sched_store::schema::MAX_TITLE_LEN;
use sched_store::{Database, TaskRepo};

use crate::error::ServiceError;

/// Default cap on the number of tasks returned by a listing.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Outcome of marking a task done.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// One-off task removed.
    Deleted,
    /// Recurring task not yet due; its date is kept.
    Unchanged(String),
    /// Recurring task moved to its next occurrence.
    Advanced(String),
}

#[derive(Clone)]
pub struct TaskService {
    repo: TaskRepo,
    list_limit: usize,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        Self {
            repo: TaskRepo::new(db),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Validate and store a new task.
    ///
    /// A blank date means today. Recurring tasks are re-anchored to today
    /// whatever date was supplied; one-off tasks in the past move to today.
    pub fn create(&self, mut draft: TaskDraft, now: NaiveDate) -> Result<TaskId, ServiceError> {
        validate_title(&draft.title)?;

        let today = format_date(now);
        if draft.date.trim().is_empty() {
            draft.date.clone_from(&today);
        }
        let date = parse_date(&draft.date)?;

        if draft.repeat.is_empty() {
            if date < now {
                draft.date = today;
            }
        } else {
            next_date(now, &draft.date, &draft.repeat)?;
            draft.date = next_date(now, &today, &draft.repeat)?;
        }

        let id = self.repo.insert(&draft)?;
        info!(task_id = %id, date = %draft.date, recurring = !draft.repeat.is_empty(), "task created");
        Ok(id)
    }

    pub fn get(&self, id: TaskId) -> Result<Task, ServiceError> {
        Ok(self.repo.get(id)?)
    }

    /// Earliest tasks first, capped at the configured limit.
    pub fn list(&self) -> Result<Vec<Task>, ServiceError> {
        Ok(self.repo.list(self.list_limit)?)
    }

    /// Replace every field of an existing task.
    ///
    /// The repeat rule must pass the structural check and also be one the
    /// evaluator can compute, so `w` and `m` rules are refused here rather
    /// than failing later at completion.
    pub fn update(&self, mut draft: TaskDraft, now: NaiveDate) -> Result<Task, ServiceError> {
        let id = draft
            .id
            .ok_or_else(|| ServiceError::Validation("task id is required".into()))?;
        validate_title(&draft.title)?;

        if draft.date.trim().is_empty() {
            draft.date = format_date(now);
        } else {
            parse_date(&draft.date)?;
        }

        if !draft.repeat.is_empty() {
            if !is_well_formed(&draft.repeat) {
                return Err(ServiceError::Validation(format!(
                    "malformed repeat rule: {:?}",
                    draft.repeat
                )));
            }
            RepeatRule::parse(&draft.repeat)?;
        }

        let task = draft.into_task(id);
        self.repo.update(&task)?;
        info!(task_id = %id, date = %task.date, "task updated");
        Ok(task)
    }

    /// Delete a task; a missing id is reported as `NotFound`.
    pub fn delete(&self, id: TaskId) -> Result<(), ServiceError> {
        if !self.repo.delete(id)? {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Mark a task done.
    ///
    /// One-off tasks are deleted. Recurring tasks dated today or later are
    /// left alone; overdue ones move to their next occurrence. The move is a
    /// conditional write on the date read here, so a concurrent change to the
    /// same task surfaces as `Conflict`.
    pub fn complete(&self, id: TaskId, now: NaiveDate) -> Result<Completion, ServiceError> {
        let task = self.repo.get(id)?;
        let date = parse_date(&task.date).map_err(|_| {
            ServiceError::InvalidState(format!("task {id} has corrupt date {:?}", task.date))
        })?;

        if !task.is_recurring() {
            let removed = self.repo.delete(id)?;
            info!(task_id = %id, removed, "one-off task completed");
            return Ok(Completion::Deleted);
        }

        if date >= now {
            debug!(task_id = %id, date = %task.date, "recurring task not yet due");
            return Ok(Completion::Unchanged(task.date));
        }

        let next = next_date(now, &task.date, &task.repeat).map_err(|e| {
            ServiceError::InvalidState(format!("task {id} has unusable repeat rule: {e}"))
        })?;
        self.repo.advance_date(id, &task.date, &next)?;
        info!(task_id = %id, from = %task.date, to = %next, "recurring task advanced");
        Ok(Completion::Advanced(next))
    }
}

fn validate_title(title: &str) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::Validation(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}
