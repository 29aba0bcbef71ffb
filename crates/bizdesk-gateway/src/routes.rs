//! API route handlers for the gateway.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use bizdesk_core::{BizDeskError, TaskStatus};
use bizdesk_scheduler::{Payload, TaskFilter, TaskUpdate};
use bizdesk_tools::DirectTask;

use super::error::ApiError;
use super::server::AppState;

type ApiResult = Result<Json<serde_json::Value>, ApiError>;

/// Decode a JSON body into `T`, reporting shape errors as validation failures.
fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(body)
        .map_err(|e| ApiError(BizDeskError::validation(format!("invalid request body: {e}"))))
}

/// Treat `?param=` the same as an absent parameter.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "bizdesk",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// List all departments with their tool catalogs.
pub async fn list_departments(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "departments": state.registry.list(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub department_id: Option<String>,
}

/// Conversation of one department, or every message when unfiltered.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
) -> Json<serde_json::Value> {
    let department_id = non_empty(query.department_id);
    let messages = state.messages.get_messages(department_id.as_deref());
    Json(serde_json::json!({
        "ok": true,
        "messages": messages,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    department_id: String,
    #[serde(default)]
    content: String,
}

/// Submit a chat message and return the updated conversation.
pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult {
    let req: ChatRequest = parse_body(body)?;
    let messages = state.chat.submit(&req.department_id, &req.content)?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "messages": messages,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub department_id: Option<String>,
    pub status: Option<String>,
}

/// List tasks, optionally filtered by department and status.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskQuery>,
) -> ApiResult {
    let status = non_empty(query.status)
        .map(|s| s.parse::<TaskStatus>())
        .transpose()?;
    let filter = TaskFilter {
        department_id: non_empty(query.department_id),
        status,
    };

    let tasks = state.tasks.list_tasks(&filter);
    Ok(Json(serde_json::json!({
        "ok": true,
        "count": tasks.len(),
        "tasks": tasks,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolRequest {
    department_id: String,
    tool_id: String,
    #[serde(default)]
    payload: Payload,
}

/// Create a task: `kind: "tool"` routes through the dispatcher, anything
/// else is a direct create.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult {
    let task = if body.get("kind").and_then(|k| k.as_str()) == Some("tool") {
        let req: ToolRequest = parse_body(body)?;
        state
            .dispatcher
            .invoke(&req.department_id, &req.tool_id, req.payload)?
    } else {
        let req: DirectTask = parse_body(body)?;
        state.dispatcher.create_direct(req)?
    };

    Ok(Json(serde_json::json!({
        "ok": true,
        "task": task,
    })))
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    id: String,
    #[serde(default)]
    updates: TaskUpdate,
}

/// Apply a partial update to a task.
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult {
    let req: UpdateRequest = parse_body(body)?;
    let task = state.tasks.update_task(&req.id, req.updates)?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "task": task,
    })))
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    id: String,
}

/// Delete a task. `ok` reports whether anything was removed.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult {
    let req: DeleteRequest = parse_body(body)?;
    let deleted = state.tasks.delete_task(&req.id);
    Ok(Json(serde_json::json!({ "ok": deleted })))
}

/// Run the scheduler sweep once.
pub async fn run_sweep(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let updated = state.tasks.run_sweep();
    Json(serde_json::json!({
        "ok": true,
        "updated": updated,
    }))
}

/// Run one recurring task immediately.
pub async fn run_task_now(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let task = state.tasks.run_now(&id)?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "task": task,
    })))
}
