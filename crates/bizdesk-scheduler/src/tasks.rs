//! Task definitions: the core data model for background work.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use bizdesk_core::TaskStatus;

/// Opaque key/value data supplied by the invoking tool form or caller.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A tracked background task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundTask {
    /// Unique task ID, never reused.
    pub id: String,
    pub department_id: String,
    pub title: String,
    #[serde(default)]
    pub details: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub is_recurring: bool,
    /// Set iff `is_recurring`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: Payload,
}

impl BackgroundTask {
    /// Check if this recurring task is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_recurring && self.next_run_at.is_some_and(|next| next <= now)
    }

    /// Record a run at `now` and schedule the next one.
    pub(crate) fn mark_run(&mut self, now: DateTime<Utc>) {
        if let Some(interval) = self.interval_minutes {
            self.last_run_at = Some(now);
            self.next_run_at = Some(schedule_after(now, interval));
        }
        self.touch(now);
    }

    /// Refresh `updated_at`, never letting it fall behind `created_at`.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

/// Input for creating a task. The store assigns id and timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub department_id: String,
    pub title: String,
    pub details: String,
    pub status: TaskStatus,
    pub is_recurring: bool,
    pub interval_minutes: Option<u32>,
    pub payload: Payload,
}

impl NewTask {
    pub fn new(department_id: &str, title: &str) -> Self {
        Self {
            department_id: department_id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Make the task recurring every `interval_minutes`.
    pub fn recurring(mut self, interval_minutes: u32) -> Self {
        self.is_recurring = true;
        self.interval_minutes = Some(interval_minutes);
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// Shallow partial update. Every `Some` field overwrites the stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub interval_minutes: Option<u32>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub next_run_at: Option<DateTime<Utc>>,
    /// Replaces the whole payload.
    #[serde(default)]
    pub payload: Option<Payload>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn touches_schedule(&self) -> bool {
        self.interval_minutes.is_some() || self.last_run_at.is_some() || self.next_run_at.is_some()
    }
}

/// Next run time for a task last run at `from`. The only place minutes become a duration.
pub fn schedule_after(from: DateTime<Utc>, interval_minutes: u32) -> DateTime<Utc> {
    from + chrono::Duration::minutes(i64::from(interval_minutes))
}

/// Current time at the millisecond precision tasks are serialized with.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
