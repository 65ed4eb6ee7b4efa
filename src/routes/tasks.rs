use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{Task, TaskInput, TaskUpdate},
    state::AppState,
    store::bounded,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Loads a task and checks that `user` owns it.
///
/// Missing tasks are 404; tasks owned by someone else are 403.
async fn owned_task(state: &AppState, id: Uuid, user: &CurrentUser) -> Result<Task, AppError> {
    let task = bounded(state.store_timeout, state.tasks.find_task(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    if !task.is_owned_by(user.id()) {
        return Err(AppError::Forbidden("User not authorized".into()));
    }
    Ok(task)
}

/// Creates a new task for the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `422 Unprocessable Entity`: `TaskInput` validation failed.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), user.id());
    let created = bounded(state.store_timeout, state.tasks.create_task(task)).await?;

    Ok(HttpResponse::Created().json(created))
}

/// Lists the authenticated user's tasks, newest first.
///
/// The body is `{ message, data, count }`; an empty list is still a 200.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let tasks = bounded(state.store_timeout, state.tasks.list_tasks(user.id())).await?;

    let message = if tasks.is_empty() {
        "No tasks found"
    } else {
        "Tasks retrieved successfully"
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "count": tasks.len(),
        "data": tasks,
    })))
}

#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = owned_task(&state, task_id.into_inner(), &user).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Applies a partial update to a task the caller owns.
///
/// Only fields present in the body change.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = owned_task(&state, task_id.into_inner(), &user).await?;

    let updated = bounded(
        state.store_timeout,
        state.tasks.update_task(task.id, task_data.into_inner()),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task updated successfully",
        "data": updated,
    })))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = owned_task(&state, task_id.into_inner(), &user).await?;

    if !bounded(state.store_timeout, state.tasks.delete_task(task.id)).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Task removed" })))
}
