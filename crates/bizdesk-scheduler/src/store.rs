//! In-memory task store.
//! One `RwLock` guards the whole table: every mutation (including the sweep)
//! takes the write lock, reads take the read lock and return owned snapshots.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use bizdesk_core::{BizDeskError, Result, TaskStatus};

use crate::tasks::{BackgroundTask, NewTask, TaskUpdate, now_millis, schedule_after};

/// Optional `{departmentId, status}` filter; present fields are AND-ed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub department_id: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn department(department_id: &str) -> Self {
        Self {
            department_id: Some(department_id.into()),
            status: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, task: &BackgroundTask) -> bool {
        self.department_id
            .as_deref()
            .is_none_or(|dep| task.department_id == dep)
            && self.status.is_none_or(|status| task.status == status)
    }
}

/// Tasks keyed by insertion sequence, with an id → sequence index.
#[derive(Debug, Default)]
pub(crate) struct TaskTable {
    pub(crate) tasks: BTreeMap<u64, BackgroundTask>,
    index: HashMap<String, u64>,
    next_seq: u64,
}

impl TaskTable {
    fn get(&self, id: &str) -> Option<&BackgroundTask> {
        self.index.get(id).and_then(|seq| self.tasks.get(seq))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut BackgroundTask> {
        let seq = self.index.get(id)?;
        self.tasks.get_mut(seq)
    }

    fn insert(&mut self, task: BackgroundTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(task.id.clone(), seq);
        self.tasks.insert(seq, task);
    }

    fn remove(&mut self, id: &str) -> Option<BackgroundTask> {
        let seq = self.index.remove(id)?;
        self.tasks.remove(&seq)
    }

    /// Fresh id. uuid v4 makes reuse of a deleted id practically impossible;
    /// live ids are checked outright.
    fn fresh_id(&self) -> String {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Thread-safe background task store.
#[derive(Debug)]
pub struct TaskStore {
    pub(crate) table: RwLock<TaskTable>,
    min_interval_minutes: u32,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Minimum recurrence interval enforced when none is configured.
    pub const DEFAULT_MIN_INTERVAL_MINUTES: u32 = 5;

    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_min_interval(Self::DEFAULT_MIN_INTERVAL_MINUTES)
    }

    pub fn with_min_interval(min_interval_minutes: u32) -> Self {
        Self {
            table: RwLock::new(TaskTable::default()),
            min_interval_minutes: min_interval_minutes.max(1),
        }
    }

    pub fn min_interval_minutes(&self) -> u32 {
        self.min_interval_minutes
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, TaskTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, TaskTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a new task.
    pub fn add_task(&self, new: NewTask) -> Result<BackgroundTask> {
        self.add_task_at(new, now_millis())
    }

    /// Add a new task created at `now`. Recurring tasks start their schedule at `now`.
    pub fn add_task_at(&self, new: NewTask, now: DateTime<Utc>) -> Result<BackgroundTask> {
        if new.department_id.trim().is_empty() {
            return Err(BizDeskError::validation("departmentId is required"));
        }
        if new.title.trim().is_empty() {
            return Err(BizDeskError::validation("title is required"));
        }
        let (last_run_at, next_run_at) = match (new.is_recurring, new.interval_minutes) {
            (true, Some(interval)) => {
                self.check_interval(interval)?;
                (Some(now), Some(schedule_after(now, interval)))
            }
            (true, None) => {
                return Err(BizDeskError::validation("recurring task requires intervalMinutes"));
            }
            (false, Some(_)) => {
                return Err(BizDeskError::validation("intervalMinutes is only valid for recurring tasks"));
            }
            (false, None) => (None, None),
        };

        let mut table = self.write();
        let task = BackgroundTask {
            id: table.fresh_id(),
            department_id: new.department_id,
            title: new.title,
            details: new.details,
            status: new.status,
            is_recurring: new.is_recurring,
            interval_minutes: new.interval_minutes,
            last_run_at,
            next_run_at,
            created_at: now,
            updated_at: now,
            payload: new.payload,
        };
        table.insert(task.clone());
        drop(table);

        tracing::info!(
            "📅 Task added: '{}' ({}) [{}] status={}{}",
            task.title,
            task.id,
            task.department_id,
            task.status,
            task.interval_minutes
                .map(|m| format!(" every {m}min"))
                .unwrap_or_default()
        );
        Ok(task)
    }

    /// Snapshot of one task.
    pub fn get_task(&self, id: &str) -> Option<BackgroundTask> {
        self.read().get(id).cloned()
    }

    /// Merge `update` into a task.
    pub fn update_task(&self, id: &str, update: TaskUpdate) -> Result<BackgroundTask> {
        self.update_task_at(id, update, now_millis())
    }

    /// Merge `update` into a task at `now`. The merge is validated on a copy,
    /// so a rejected update leaves the stored task untouched.
    pub fn update_task_at(
        &self,
        id: &str,
        update: TaskUpdate,
        now: DateTime<Utc>,
    ) -> Result<BackgroundTask> {
        let mut table = self.write();
        let current = table
            .get_mut(id)
            .ok_or_else(|| BizDeskError::not_found("task not found"))?;
        let merged = merge_update(current, update, now, self.min_interval_minutes)?;
        *current = merged.clone();
        drop(table);

        tracing::debug!("✏️ Task updated: '{}' ({}) status={}", merged.title, merged.id, merged.status);
        Ok(merged)
    }

    /// Remove a task. Returns `false` if the id is unknown.
    pub fn delete_task(&self, id: &str) -> bool {
        match self.write().remove(id) {
            Some(task) => {
                tracing::info!("🗑️ Task deleted: '{}' ({})", task.title, task.id);
                true
            }
            None => false,
        }
    }

    /// Tasks matching `filter`, in insertion order.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Vec<BackgroundTask> {
        self.read()
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    /// Run a recurring task now: reschedule from `now` without touching status.
    pub fn run_now(&self, id: &str) -> Result<BackgroundTask> {
        self.run_now_at(id, now_millis())
    }

    pub fn run_now_at(&self, id: &str, now: DateTime<Utc>) -> Result<BackgroundTask> {
        let mut table = self.write();
        let task = table
            .get_mut(id)
            .ok_or_else(|| BizDeskError::not_found("task not found"))?;
        if !task.is_recurring {
            return Err(BizDeskError::validation("task is not recurring"));
        }
        task.mark_run(now);
        tracing::info!("▶️ Task run now: '{}' ({})", task.title, task.id);
        Ok(task.clone())
    }

    /// Get task count.
    pub fn len(&self) -> usize {
        self.read().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_interval(&self, interval: u32) -> Result<()> {
        check_interval(interval, self.min_interval_minutes)
    }
}

fn check_interval(interval: u32, min: u32) -> Result<()> {
    if interval < min {
        return Err(BizDeskError::validation(format!(
            "intervalMinutes must be at least {min}"
        )));
    }
    Ok(())
}

fn merge_update(
    current: &BackgroundTask,
    update: TaskUpdate,
    now: DateTime<Utc>,
    min_interval: u32,
) -> Result<BackgroundTask> {
    let mut next = current.clone();
    let touches_schedule = update.touches_schedule();

    if let Some(title) = update.title {
        if title.trim().is_empty() {
            return Err(BizDeskError::validation("title must not be empty"));
        }
        next.title = title;
    }
    if let Some(details) = update.details {
        next.details = details;
    }
    if let Some(status) = update.status {
        next.status = status;
    }
    if let Some(payload) = update.payload {
        next.payload = payload;
    }

    match update.is_recurring {
        Some(false) => {
            next.is_recurring = false;
            next.interval_minutes = None;
            next.last_run_at = None;
            next.next_run_at = None;
        }
        Some(true) => next.is_recurring = true,
        None => {}
    }

    if !next.is_recurring {
        if touches_schedule {
            return Err(BizDeskError::validation(
                "intervalMinutes, lastRunAt and nextRunAt require a recurring task",
            ));
        }
    } else {
        if update.interval_minutes.is_some() {
            next.interval_minutes = update.interval_minutes;
        }
        let interval = next
            .interval_minutes
            .ok_or_else(|| BizDeskError::validation("recurring task requires intervalMinutes"))?;
        check_interval(interval, min_interval)?;

        if update.last_run_at.is_some() {
            next.last_run_at = update.last_run_at;
        }
        if update.next_run_at.is_some() {
            next.next_run_at = update.next_run_at;
        }
        if next.next_run_at.is_none() {
            next.last_run_at = Some(now);
            next.next_run_at = Some(schedule_after(now, interval));
        } else if next.last_run_at.is_none() {
            next.last_run_at = Some(now);
        }
    }

    next.touch(now);
    Ok(next)
}
