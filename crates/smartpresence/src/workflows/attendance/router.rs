use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::capture::{CameraSource, CapabilityError, LocationSource};
use super::domain::{CaptureMode, ClassMode};
use super::qr::QrDetector;
use super::service::{AttendanceError, AttendanceService};

/// Router builder exposing the attendance control surface.
pub fn attendance_router<C, L, D>(service: Arc<AttendanceService<C, L, D>>) -> Router
where
    C: CameraSource + 'static,
    L: LocationSource + 'static,
    D: QrDetector + 'static,
{
    Router::new()
        .route("/api/v1/attendance/mode", get(mode_handler::<C, L, D>))
        .route("/api/v1/attendance/mode", put(set_mode_handler::<C, L, D>))
        .route(
            "/api/v1/attendance/sessions",
            post(arm_handler::<C, L, D>),
        )
        .route(
            "/api/v1/attendance/sessions/disarm",
            post(disarm_handler::<C, L, D>),
        )
        .route(
            "/api/v1/attendance/sessions/active",
            get(active_session_handler::<C, L, D>),
        )
        .route("/api/v1/attendance/marks", post(mark_handler::<C, L, D>))
        .with_state(service)
}

async fn mode_handler<C, L, D>(State(service): State<Arc<AttendanceService<C, L, D>>>) -> Response
where
    C: CameraSource + 'static,
    L: LocationSource + 'static,
    D: QrDetector + 'static,
{
    let mode = service.control().class_mode();
    (StatusCode::OK, axum::Json(json!({ "mode": mode }))).into_response()
}

#[derive(Debug, Deserialize)]
struct SetModeRequest {
    mode: String,
}

async fn set_mode_handler<C, L, D>(
    State(service): State<Arc<AttendanceService<C, L, D>>>,
    axum::Json(request): axum::Json<SetModeRequest>,
) -> Response
where
    C: CameraSource + 'static,
    L: LocationSource + 'static,
    D: QrDetector + 'static,
{
    match request.mode.parse::<ClassMode>() {
        Ok(mode) => {
            service.set_class_mode(mode);
            (StatusCode::OK, axum::Json(json!({ "mode": mode }))).into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArmRequest {
    teacher_id: String,
    mode: CaptureMode,
    subject: String,
    class_id: String,
}

async fn arm_handler<C, L, D>(
    State(service): State<Arc<AttendanceService<C, L, D>>>,
    axum::Json(request): axum::Json<ArmRequest>,
) -> Response
where
    C: CameraSource + 'static,
    L: LocationSource + 'static,
    D: QrDetector + 'static,
{
    let session = service.arm_session(
        &request.teacher_id,
        request.mode,
        &request.subject,
        &request.class_id,
    );
    (StatusCode::CREATED, axum::Json(session)).into_response()
}

#[derive(Debug, Deserialize)]
struct DisarmRequest {
    teacher_id: String,
}

async fn disarm_handler<C, L, D>(
    State(service): State<Arc<AttendanceService<C, L, D>>>,
    axum::Json(request): axum::Json<DisarmRequest>,
) -> Response
where
    C: CameraSource + 'static,
    L: LocationSource + 'static,
    D: QrDetector + 'static,
{
    match service.disarm_session(&request.teacher_id) {
        Some(session) => (StatusCode::OK, axum::Json(session)).into_response(),
        None => {
            let payload = json!({ "error": "no active session armed by this teacher" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

async fn active_session_handler<C, L, D>(
    State(service): State<Arc<AttendanceService<C, L, D>>>,
) -> Response
where
    C: CameraSource + 'static,
    L: LocationSource + 'static,
    D: QrDetector + 'static,
{
    match service.control().active_session() {
        Some(session) => (StatusCode::OK, axum::Json(session)).into_response(),
        None => {
            let payload = json!({ "error": "no active attendance session" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct MarkRequest {
    user_id: String,
    method: CaptureMode,
}

async fn mark_handler<C, L, D>(
    State(service): State<Arc<AttendanceService<C, L, D>>>,
    axum::Json(request): axum::Json<MarkRequest>,
) -> Response
where
    C: CameraSource + 'static,
    L: LocationSource + 'static,
    D: QrDetector + 'static,
{
    match service.mark_attendance(&request.user_id, request.method).await {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AttendanceError) -> Response {
    let status = match &error {
        AttendanceError::AlreadyMarked { .. } => StatusCode::CONFLICT,
        AttendanceError::MethodDisabled { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AttendanceError::Capability(CapabilityError::Denied { .. }) => StatusCode::FORBIDDEN,
        AttendanceError::Capability(CapabilityError::Timeout { .. }) => {
            StatusCode::REQUEST_TIMEOUT
        }
        AttendanceError::Capability(CapabilityError::Unavailable { .. }) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AttendanceError::InvalidCoordinates { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AttendanceError::OutOfRange { .. } => StatusCode::FORBIDDEN,
        AttendanceError::ScanFailed { .. } => StatusCode::REQUEST_TIMEOUT,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
