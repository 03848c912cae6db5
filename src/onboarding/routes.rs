//! REST endpoints for onboarding sessions.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::AuthEvent;
use super::manager::OnboardingManager;
use super::model::FormField;
use super::params::NavigationParams;
use super::session::{OnboardingView, SubmitOutcome};

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub manager: Arc<OnboardingManager>,
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: Uuid,
    view: OnboardingView,
}

#[derive(Debug, Deserialize)]
struct FieldUpdate {
    field: String,
    #[serde(default)]
    value: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn session_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Unknown onboarding session")
}

/// POST /api/onboarding/sessions
///
/// Opens a session from the page's navigation parameters.
async fn create_session(
    State(state): State<OnboardingRouteState>,
    Json(params): Json<NavigationParams>,
) -> Response {
    let (session_id, session) = state.manager.create(params).await;
    let view = session.view().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id, view })).into_response()
}

/// GET /api/onboarding/sessions/{id}
async fn get_view(State(state): State<OnboardingRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.manager.get(id).await {
        Some(session) => Json(session.view().await).into_response(),
        None => session_not_found(),
    }
}

/// PUT /api/onboarding/sessions/{id}/fields
async fn update_field(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<Uuid>,
    Json(update): Json<FieldUpdate>,
) -> Response {
    let Some(session) = state.manager.get(id).await else {
        return session_not_found();
    };
    let field: FormField = match update.field.parse() {
        Ok(field) => field,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, e),
    };
    if let Err(e) = session.set_field(field, update.value).await {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
    }
    Json(session.view().await).into_response()
}

/// POST /api/onboarding/sessions/{id}/auth
///
/// Feeds one auth-state change into the session's identity gate.
async fn push_auth(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<Uuid>,
    Json(event): Json<AuthEvent>,
) -> Response {
    match state.manager.push_auth_event(id, event).await {
        Some(snapshot) => (StatusCode::ACCEPTED, Json(snapshot)).into_response(),
        None => session_not_found(),
    }
}

/// POST /api/onboarding/sessions/{id}/submit
///
/// 200 with a navigation on success, 422 with a notification otherwise.
/// A navigation leaves the page, so the session is closed with it.
async fn submit(State(state): State<OnboardingRouteState>, Path(id): Path<Uuid>) -> Response {
    let Some(session) = state.manager.get(id).await else {
        return session_not_found();
    };
    let outcome = session.submit_and_notify().await;
    let status = match outcome {
        SubmitOutcome::Navigate { .. } => {
            state.manager.remove(id).await;
            StatusCode::OK
        }
        SubmitOutcome::Notification(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(outcome)).into_response()
}

/// DELETE /api/onboarding/sessions/{id}
///
/// Closes a page that is left without submitting.
async fn close_session(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    if state.manager.remove(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found()
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "onboarding-form"
    }))
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/onboarding/sessions", post(create_session))
        .route(
            "/api/onboarding/sessions/{id}",
            get(get_view).delete(close_session),
        )
        .route("/api/onboarding/sessions/{id}/fields", put(update_field))
        .route("/api/onboarding/sessions/{id}/auth", post(push_auth))
        .route("/api/onboarding/sessions/{id}/submit", post(submit))
        .with_state(state)
}
