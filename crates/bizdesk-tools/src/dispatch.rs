//! Tool invocation dispatch.
//! Each invocation resolves its tool in the registry and performs exactly one
//! task store write, shaped by the tool's `onSubmitBehavior`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use bizdesk_core::{DepartmentDefinition, DepartmentRegistry, Result, SubmitBehavior, TaskStatus, ToolDefinition};
use bizdesk_scheduler::tasks::now_millis;
use bizdesk_scheduler::{BackgroundTask, NewTask, Payload, TaskStore};

/// A task created without going through a tool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectTask {
    pub department_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub payload: Option<Payload>,
}

/// Maps `(department, tool, payload)` onto the task store.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<DepartmentRegistry>,
    tasks: Arc<TaskStore>,
    default_interval_minutes: u32,
}

impl ToolDispatcher {
    /// Interval used when a recurring tool's payload carries none.
    pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;

    pub fn new(registry: Arc<DepartmentRegistry>, tasks: Arc<TaskStore>) -> Self {
        Self {
            registry,
            tasks,
            default_interval_minutes: Self::DEFAULT_INTERVAL_MINUTES,
        }
    }

    pub fn with_default_interval(mut self, minutes: u32) -> Self {
        self.default_interval_minutes = minutes;
        self
    }

    pub fn tasks(&self) -> &Arc<TaskStore> {
        &self.tasks
    }

    /// Invoke a tool.
    pub fn invoke(&self, department_id: &str, tool_id: &str, payload: Payload) -> Result<BackgroundTask> {
        self.invoke_at(department_id, tool_id, payload, now_millis())
    }

    pub fn invoke_at(
        &self,
        department_id: &str,
        tool_id: &str,
        payload: Payload,
        now: DateTime<Utc>,
    ) -> Result<BackgroundTask> {
        let (department, tool) = self.registry.require_tool(department_id, tool_id)?;
        tracing::info!(
            "🔧 Tool invoked: {} › {} ({:?})",
            department.name,
            tool.name,
            tool.on_submit_behavior
        );
        let new = self.plan(department, tool, payload);
        self.tasks.add_task_at(new, now)
    }

    /// Build the task a tool invocation should create.
    fn plan(&self, department: &DepartmentDefinition, tool: &ToolDefinition, payload: Payload) -> NewTask {
        match tool.on_submit_behavior {
            SubmitBehavior::ImmediateAction => {
                let summary = Value::Object(payload.clone()).to_string();
                NewTask::new(&department.id, &format!("{} executed", tool.name))
                    .details(format!("Request accepted with payload: {summary}"))
                    .status(TaskStatus::Completed)
                    .payload(payload)
            }
            SubmitBehavior::CreateTask => {
                let mut new = NewTask::new(&department.id, &tool.name)
                    .details(format!("Submitted via {} › {}", department.name, tool.name))
                    .status(tool.default_task_status.unwrap_or_default());
                if tool.supports_recurrence {
                    new = new.recurring(self.interval_from(&payload));
                }
                new.payload(payload)
            }
            SubmitBehavior::ChatHint => {
                NewTask::new(&department.id, &format!("{} (chat hint)", tool.name))
                    .details(format!("Hint: Use the {} capability. {}", tool.name, tool.description))
                    .status(TaskStatus::AttentionRequired)
                    .payload(payload)
            }
        }
    }

    /// Read `interval` from the payload: numbers and numeric strings are
    /// accepted, anything missing, zero, or unparsable falls back to the
    /// default, and the result is floored to the store's minimum.
    fn interval_from(&self, payload: &Payload) -> u32 {
        let requested = match payload.get("interval") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|m| m.is_finite() && *m != 0.0)
        .map(|m| m.clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(self.default_interval_minutes);

        requested.max(self.tasks.min_interval_minutes())
    }

    /// Create a task directly. No recurrence is applied.
    pub fn create_direct(&self, request: DirectTask) -> Result<BackgroundTask> {
        let department = self.registry.require_department(&request.department_id)?;
        let title = request
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Task".to_string());
        let new = NewTask::new(&department.id, &title)
            .details(request.details.unwrap_or_default())
            .status(request.status.unwrap_or_default())
            .payload(request.payload.unwrap_or_default());
        self.tasks.add_task(new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizdesk_scheduler::TaskFilter;

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(
            Arc::new(DepartmentRegistry::with_defaults()),
            Arc::new(TaskStore::new()),
        )
    }

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_immediate_action_completes() {
        let d = dispatcher();
        let task = d
            .invoke("it", "password-reset", payload(serde_json::json!({"email": "a@b.co"})))
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.title, "Password Reset executed");
        assert!(task.details.contains("a@b.co"));
        assert!(!task.is_recurring);
        assert_eq!(d.tasks().len(), 1);
    }

    #[test]
    fn test_create_task_uses_default_status() {
        let d = dispatcher();
        let task = d.invoke("finance", "expense-report", Payload::new()).unwrap();
        assert_eq!(task.status, TaskStatus::NeedsReview);
        assert_eq!(task.details, "Submitted via Finance › Expense Report");

        let task = d.invoke("hr", "pto-request", Payload::new()).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.is_recurring);
        assert!(task.next_run_at.is_none());
        assert!(task.interval_minutes.is_none());
    }

    #[test]
    fn test_chat_hint_needs_attention() {
        let d = dispatcher();
        let task = d.invoke("it", "vpn-help", Payload::new()).unwrap();
        assert_eq!(task.status, TaskStatus::AttentionRequired);
        assert_eq!(task.title, "VPN Help (chat hint)");
        assert!(task.details.starts_with("Hint: Use the VPN Help capability."));
        assert!(task.details.contains("Troubleshoot VPN connectivity"));
    }

    #[test]
    fn test_daily_checklist_interval_30() {
        let d = dispatcher();
        let task = d
            .invoke("ops", "daily-checklist", payload(serde_json::json!({"interval": 30})))
            .unwrap();
        assert!(task.is_recurring);
        assert_eq!(task.interval_minutes, Some(30));
        assert_eq!(task.last_run_at, Some(task.created_at));
        let delta = task.next_run_at.unwrap() - task.created_at;
        assert_eq!(delta.num_milliseconds(), 30 * 60_000);
        assert_eq!(task.payload["interval"], 30);
    }

    #[test]
    fn test_daily_checklist_interval_floored() {
        let d = dispatcher();
        let task = d
            .invoke("ops", "daily-checklist", payload(serde_json::json!({"interval": 2})))
            .unwrap();
        assert_eq!(task.interval_minutes, Some(5));
    }

    #[test]
    fn test_daily_checklist_interval_variants() {
        let d = dispatcher();
        let cases = [
            (serde_json::json!({}), 60),
            (serde_json::json!({"interval": "45"}), 45),
            (serde_json::json!({"interval": ""}), 60),
            (serde_json::json!({"interval": "soon"}), 60),
            (serde_json::json!({"interval": 0}), 60),
            (serde_json::json!({"interval": -10}), 5),
            (serde_json::json!({"interval": 7.9}), 7),
        ];
        for (body, expected) in cases {
            let task = d.invoke("ops", "daily-checklist", payload(body.clone())).unwrap();
            assert_eq!(task.interval_minutes, Some(expected), "payload {body}");
        }
    }

    #[test]
    fn test_custom_default_interval() {
        let d = dispatcher().with_default_interval(90);
        let task = d.invoke("ops", "daily-checklist", Payload::new()).unwrap();
        assert_eq!(task.interval_minutes, Some(90));
    }

    #[test]
    fn test_unknown_tool_creates_nothing() {
        let d = dispatcher();
        let err = d.invoke("hr", "teleport", Payload::new()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "tool not found");
        assert!(d.tasks().is_empty());
    }

    #[test]
    fn test_unknown_department() {
        let d = dispatcher();
        let err = d.invoke("legal", "nda", Payload::new()).unwrap_err();
        assert_eq!(err.to_string(), "department not found");
        assert!(d.tasks().is_empty());
    }

    #[test]
    fn test_create_direct_defaults() {
        let d = dispatcher();
        let task = d
            .create_direct(DirectTask {
                department_id: "sales".into(),
                ..DirectTask::default()
            })
            .unwrap();
        assert_eq!(task.title, "Task");
        assert_eq!(task.details, "");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.is_recurring);
        assert!(task.payload.is_empty());
    }

    #[test]
    fn test_create_direct_from_json() {
        let d = dispatcher();
        let request: DirectTask = serde_json::from_value(serde_json::json!({
            "departmentId": "ops",
            "title": "Rotate keys",
            "details": "quarterly",
            "status": "in_progress",
            "payload": {"owner": "sam"}
        }))
        .unwrap();
        let task = d.create_direct(request).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.payload["owner"], "sam");
        assert_eq!(d.tasks().list_tasks(&TaskFilter::department("ops")).len(), 1);
    }

    #[test]
    fn test_create_direct_unknown_department() {
        let d = dispatcher();
        let err = d
            .create_direct(DirectTask {
                department_id: "legal".into(),
                ..DirectTask::default()
            })
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
