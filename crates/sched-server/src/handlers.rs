//! HTTP handlers for the task API.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use sched_core::dates::{parse_date, today};
use sched_core::{next_date as evaluate_next_date, Task, TaskDraft, TaskId};

use crate::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    fn task_id(&self) -> ApiResult<TaskId> {
        let raw = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::bad_request("task id is required"))?;
        raw.parse()
            .map_err(|_| ApiError::bad_request(format!("invalid task id: {raw:?}")))
    }
}

/// Extract the `id` query parameter, rendering extractor rejections as JSON.
fn query_task_id(query: Result<Query<IdQuery>, QueryRejection>) -> ApiResult<TaskId> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    query.task_id()
}

#[derive(Debug, Default, Deserialize)]
pub struct NextDateQuery {
    pub now: Option<String>,
    pub date: Option<String>,
    pub repeat: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

fn parse_draft(body: &Bytes) -> ApiResult<TaskDraft> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid JSON: {e}")))
}

/// POST /api/task
pub async fn create_task(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let draft = parse_draft(&body)?;
    let id = state.service.create(draft, today())?;
    Ok(Json(json!({ "id": id.get() })))
}

/// GET /api/task?id=
pub async fn get_task(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Task>> {
    let id = query_task_id(query)?;
    Ok(Json(state.service.get(id)?))
}

/// PUT /api/task
pub async fn update_task(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let draft = parse_draft(&body)?;
    state.service.update(draft, today())?;
    Ok(Json(json!({})))
}

/// DELETE /api/task?id=
pub async fn delete_task(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let id = query_task_id(query)?;
    state.service.delete(id)?;
    Ok(Json(json!({})))
}

/// GET /api/tasks
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<TasksResponse>> {
    let tasks = state.service.list()?;
    Ok(Json(TasksResponse { tasks }))
}

/// POST /api/task/done?id=
pub async fn complete_task(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let id = query_task_id(query)?;
    state.service.complete(id, today())?;
    Ok(Json(json!({})))
}

/// GET /api/nextdate?now=&date=&repeat=
///
/// Answers in plain text, both on success and on failure.
pub async fn next_date(query: Result<Query<NextDateQuery>, QueryRejection>) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return (StatusCode::BAD_REQUEST, e.body_text()).into_response(),
    };
    let now = match query.now.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => today(),
        Some(raw) => match parse_date(raw) {
            Ok(d) => d,
            Err(_) => {
                return (StatusCode::BAD_REQUEST, format!("invalid now parameter: {raw:?}"))
                    .into_response()
            }
        },
    };

    let date = query.date.unwrap_or_default();
    let repeat = query.repeat.unwrap_or_default();
    match evaluate_next_date(now, &date, &repeat) {
        Ok(next) => next.into_response(),
        Err(e) => {
            tracing::debug!(error = %e, kind = e.error_kind(), "nextdate rejected");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Any `/api` route hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        message: "method not allowed".into(),
    }
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
