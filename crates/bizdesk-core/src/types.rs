//! Department and tool catalog types, plus the task status shared across crates.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a background task.
///
/// No transition graph is enforced: any status may be overwritten by any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    AttentionRequired,
    NeedsReview,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::AttentionRequired,
        TaskStatus::NeedsReview,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::AttentionRequired => "attention_required",
            TaskStatus::NeedsReview => "needs_review",
            TaskStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = crate::error::BizDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| crate::error::BizDeskError::validation(format!("unknown task status: {s}")))
    }
}

/// How a tool invocation is turned into task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitBehavior {
    /// Fire-and-forget: recorded as an already completed task.
    ImmediateAction,
    /// Opens a tracked task, optionally recurring.
    CreateTask,
    /// Raises an attention item nudging the user towards chat.
    ChatHint,
}

/// Input widget type of a tool form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Number,
    Email,
    Select,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// One field of a tool's submission form. Rendered by the UI only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl FormField {
    pub fn new(name: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            required: false,
            placeholder: None,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, text: &str) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    pub fn options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(value, label)| SelectOption {
                value: (*value).into(),
                label: (*label).into(),
            })
            .collect();
        self
    }
}

/// A declared capability of a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub on_submit_behavior: SubmitBehavior,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_task_status: Option<TaskStatus>,
    /// Tasks created by this tool repeat on the interval read from the payload.
    #[serde(default)]
    pub supports_recurrence: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Vec<FormField>>,
}

/// An organizational scope owning its own chat, tools, and tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
}

impl DepartmentDefinition {
    pub fn find_tool(&self, tool_id: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.id == tool_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&TaskStatus::AttentionRequired).unwrap();
        assert_eq!(json, "\"attention_required\"");
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_validation_error() {
        let err = "done".parse::<TaskStatus>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_tool_definition_from_json() {
        let tool: ToolDefinition = serde_json::from_value(serde_json::json!({
            "id": "daily-checklist",
            "name": "Daily Checklist",
            "description": "Recurring checklist",
            "onSubmitBehavior": "create_task",
            "supportsRecurrence": true,
            "form": [{"name": "interval", "label": "Interval", "type": "number"}]
        }))
        .unwrap();
        assert_eq!(tool.on_submit_behavior, SubmitBehavior::CreateTask);
        assert!(tool.supports_recurrence);
        assert_eq!(tool.default_task_status, None);
        assert_eq!(tool.form.unwrap()[0].field_type, FieldType::Number);
    }
}
