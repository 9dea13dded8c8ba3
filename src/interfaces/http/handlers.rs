use crate::application::payments::InitializePayment;
use crate::domain::submission::ScreenshotUpload;
use crate::domain::task::{NewTask, TaskPatch};
use crate::domain::Caller;
use crate::error::{Error, ValidationErrors};
use crate::interfaces::http::envelope::{success, ApiError};
use crate::interfaces::http::AppState;
use axum::async_trait;
use axum::extract::{FromRequestParts, Multipart, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde_json::json;

type HandlerResult = Result<Response, ApiError>;

/// The authenticated caller, as resolved by the auth layer in front of this
/// service and forwarded in trusted headers.
#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ApiError(Error::NotFound("authenticated user")))?;
        let email = parts
            .headers
            .get("x-user-email")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(Caller { id, email })
    }
}

pub async fn create_task(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<NewTask>,
) -> HandlerResult {
    let task = state.lifecycle.create(caller.id, input).await?;
    Ok(success(
        StatusCode::CREATED,
        "Task created successfully",
        task,
    ))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    _caller: Caller,
    Json(patch): Json<TaskPatch>,
) -> HandlerResult {
    let task = state.lifecycle.update(id, patch).await?;
    Ok(success(StatusCode::OK, "Task updated successfully", task))
}

pub async fn list_tasks(State(state): State<AppState>, _caller: Caller) -> HandlerResult {
    let tasks = state.lifecycle.list().await?;
    Ok(success(StatusCode::OK, "Task retrieved successfully", tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    _caller: Caller,
) -> HandlerResult {
    let task = state.lifecycle.get(id).await?;
    Ok(success(StatusCode::OK, "Task retrieved successfully", task))
}

/// Multipart intake: a required `screenshot` file plus an optional
/// `social_media_url` text field.
async fn read_submission_form(
    mut multipart: Multipart,
) -> Result<(ScreenshotUpload, Option<String>), Error> {
    let mut screenshot = None;
    let mut social_url = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ValidationErrors::field("screenshot", e.to_string()))?
    {
        match field.name() {
            Some("screenshot") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ValidationErrors::field("screenshot", e.to_string()))?;
                screenshot = Some(ScreenshotUpload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("social_media_url") => {
                social_url = field.text().await.ok().filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }
    let screenshot =
        screenshot.ok_or_else(|| ValidationErrors::field("screenshot", "file is required"))?;
    Ok((screenshot, social_url))
}

pub async fn submit_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    caller: Caller,
    multipart: Multipart,
) -> HandlerResult {
    let (screenshot, social_url) = read_submission_form(multipart).await?;
    let task = state
        .lifecycle
        .submit(caller.id, id, screenshot, social_url)
        .await?;
    Ok(success(
        StatusCode::OK,
        "Task submitted successfully, kindly wait for approval",
        task,
    ))
}

pub async fn approve_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    _caller: Caller,
) -> HandlerResult {
    let task = state.lifecycle.approve(id).await?;
    Ok(success(StatusCode::OK, "Task approved successfully", task))
}

pub async fn approve_completed_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    _caller: Caller,
) -> HandlerResult {
    let settled = state.settlement.approve_submission(id).await?;
    Ok(success(
        StatusCode::OK,
        "Task approved successfully",
        settled,
    ))
}

pub async fn reject_completed_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    _caller: Caller,
) -> HandlerResult {
    let submission = state.settlement.reject_submission(id).await?;
    Ok(success(
        StatusCode::OK,
        "Task rejected successfully",
        submission,
    ))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    _caller: Caller,
) -> HandlerResult {
    let task = state.lifecycle.delete(id).await?;
    Ok(success(StatusCode::OK, "Task deleted successfully", task))
}

pub async fn pending_tasks(State(state): State<AppState>, _caller: Caller) -> HandlerResult {
    let count = state.lifecycle.pending_count().await?;
    Ok(success(StatusCode::OK, "Task retrieved successfully", count))
}

pub async fn completed_tasks(State(state): State<AppState>, _caller: Caller) -> HandlerResult {
    let count = state.lifecycle.completed_count().await?;
    Ok(success(StatusCode::OK, "Task retrieved successfully", count))
}

pub async fn rejected_tasks(State(state): State<AppState>, _caller: Caller) -> HandlerResult {
    let count = state.lifecycle.rejected_count().await?;
    Ok(success(StatusCode::OK, "Task retrieved successfully", count))
}

pub async fn task_history(State(state): State<AppState>, _caller: Caller) -> HandlerResult {
    let history = state.lifecycle.history().await?;
    Ok(success(
        StatusCode::OK,
        "Task retrieved successfully",
        history,
    ))
}

pub async fn initialize_payment(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<InitializePayment>,
) -> HandlerResult {
    let initialized = state.payments.initialize(&caller, input).await?;
    Ok(success(
        StatusCode::OK,
        "Payment initialized successfully!",
        initialized,
    ))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    _caller: Caller,
) -> HandlerResult {
    let outcome = state.payments.verify(&reference).await?;
    Ok(success(
        StatusCode::OK,
        "Payment verified and wallet funded successfully!",
        outcome,
    ))
}

pub async fn get_balance(State(state): State<AppState>, caller: Caller) -> HandlerResult {
    let balance = state.payments.balance(caller.id).await?;
    Ok(success(
        StatusCode::OK,
        "Balance retrieved successfully",
        json!({ "balance": balance }),
    ))
}
