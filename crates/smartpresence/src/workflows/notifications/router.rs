use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::inbox::NotificationHub;
use crate::store::ContextId;
use crate::workflows::roles::Role;

/// Router state: the shared hub plus this surface's own context identity.
pub struct NotificationGateway {
    hub: Arc<NotificationHub>,
    context: ContextId,
}

impl NotificationGateway {
    pub fn new(hub: Arc<NotificationHub>) -> Self {
        Self {
            hub,
            context: ContextId::next(),
        }
    }
}

/// Router builder exposing the role inboxes over HTTP.
pub fn notification_router(hub: Arc<NotificationHub>) -> Router {
    Router::new()
        .route("/api/v1/notifications/:role", get(inbox_handler))
        .route("/api/v1/notifications/:role/read", post(mark_read_handler))
        .with_state(Arc::new(NotificationGateway::new(hub)))
}

async fn inbox_handler(
    State(gateway): State<Arc<NotificationGateway>>,
    Path(role): Path<String>,
) -> Response {
    match role.parse::<Role>() {
        Ok(role) => {
            let inbox = gateway.hub.notifications(role);
            (StatusCode::OK, axum::Json(inbox)).into_response()
        }
        Err(err) => unknown_role(err),
    }
}

async fn mark_read_handler(
    State(gateway): State<Arc<NotificationGateway>>,
    Path(role): Path<String>,
) -> Response {
    match role.parse::<Role>() {
        Ok(role) => {
            gateway.hub.mark_as_read(gateway.context, role);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => unknown_role(err),
    }
}

fn unknown_role(err: crate::workflows::roles::UnknownRole) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}
