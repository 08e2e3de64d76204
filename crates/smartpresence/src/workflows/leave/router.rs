use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{LeaveId, LeaveSubmission};
use super::repository::{LeaveRepository, RepositoryError};
use super::service::{LeaveService, LeaveServiceError};
use crate::workflows::roles::Role;

/// Router builder exposing HTTP endpoints for intake and resolution.
pub fn leave_router<R>(service: Arc<LeaveService<R>>) -> Router
where
    R: LeaveRepository + 'static,
{
    Router::new()
        .route("/api/v1/leave/applications", post(submit_handler::<R>))
        .route("/api/v1/leave/applications", get(index_handler::<R>))
        .route(
            "/api/v1/leave/applications/role/:role",
            get(role_handler::<R>),
        )
        .route(
            "/api/v1/leave/applications/:id/approve",
            post(approve_handler::<R>),
        )
        .route(
            "/api/v1/leave/applications/:id/reject",
            post(reject_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<LeaveService<R>>>,
    axum::Json(submission): axum::Json<LeaveSubmission>,
) -> Response
where
    R: LeaveRepository + 'static,
{
    match service.submit(submission) {
        Ok(application) => (StatusCode::ACCEPTED, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn index_handler<R>(State(service): State<Arc<LeaveService<R>>>) -> Response
where
    R: LeaveRepository + 'static,
{
    match service.applications() {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn role_handler<R>(
    State(service): State<Arc<LeaveService<R>>>,
    Path(role): Path<String>,
) -> Response
where
    R: LeaveRepository + 'static,
{
    let role = match role.parse::<Role>() {
        Ok(role) => role,
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    match service.for_role(role) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<R>(
    State(service): State<Arc<LeaveService<R>>>,
    Path(id): Path<String>,
) -> Response
where
    R: LeaveRepository + 'static,
{
    match service.approve(&LeaveId(id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectRequest {
    #[serde(default)]
    reason: String,
}

pub(crate) async fn reject_handler<R>(
    State(service): State<Arc<LeaveService<R>>>,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<RejectRequest>,
) -> Response
where
    R: LeaveRepository + 'static,
{
    match service.reject(&LeaveId(id), &request.reason) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: LeaveServiceError) -> Response {
    let status = match &error {
        LeaveServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LeaveServiceError::Conflict { .. } => StatusCode::CONFLICT,
        LeaveServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        LeaveServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        LeaveServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
