//! HTTP API gateway for EduGuardian.
//!
//! Exposes the lesson pipeline over REST: run a lesson on a thread,
//! inspect or drop a thread's checkpoint, and a health check.
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use eduguardian_agent::{LessonPipeline, RunFailure};
use eduguardian_core::{Error, LessonRequest, LessonState, StudentLevel, ThreadId};

/// Request bodies above this size are rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<LessonPipeline>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/lessons", post(lesson_handler))
        .route(
            "/v1/threads/{thread_id}",
            get(get_thread_handler).delete(delete_thread_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: eduguardian_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let pipeline = eduguardian_agent::build_from_config(&config).await?;
    let state = Arc::new(GatewayState {
        pipeline: Arc::new(pipeline),
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
struct LessonBody {
    query: String,
    #[serde(default)]
    student_level: Option<String>,
    #[serde(default)]
    student_profile: Option<String>,
    #[serde(default)]
    thread_id: Option<String>,
}

#[derive(Serialize)]
struct LessonResponse {
    thread_id: String,
    lesson: LessonState,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partial: Option<LessonState>,
}

impl ErrorResponse {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            step: None,
            partial: None,
        }
    }
}

async fn lesson_handler(
    State(state): State<SharedState>,
    Json(body): Json<LessonBody>,
) -> Response {
    let level = match body.student_level.as_deref() {
        Some(raw) => match raw.parse::<StudentLevel>() {
            Ok(level) => level,
            Err(e) => {
                return (StatusCode::BAD_REQUEST, Json(ErrorResponse::message(e.to_string())))
                    .into_response();
            }
        },
        None => StudentLevel::default(),
    };

    let thread_id = match body.thread_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => ThreadId::from(id),
        _ => ThreadId::new(),
    };

    let mut request = LessonRequest::new(body.query, level);
    if let Some(profile) = body.student_profile.filter(|p| !p.trim().is_empty()) {
        request = request.with_profile(profile);
    }

    info!(thread_id = %thread_id, level = %level, "Lesson requested");

    match state.pipeline.invoke(&thread_id, request).await {
        Ok(lesson) => Json(LessonResponse {
            thread_id: thread_id.to_string(),
            lesson,
        })
        .into_response(),
        Err(failure) => failure_response(failure),
    }
}

fn failure_response(failure: RunFailure) -> Response {
    if failure.is_invalid_input() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::message(failure.source.to_string())),
        )
            .into_response();
    }

    warn!(error = %failure, "Lesson run failed");

    let status = match failure.source {
        Error::Provider(_) | Error::Search(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorResponse {
        error: failure.source.to_string(),
        step: failure.step.map(|s| s.as_str().to_string()),
        partial: Some(*failure.state),
    };
    (status, Json(body)).into_response()
}

async fn get_thread_handler(
    State(state): State<SharedState>,
    Path(thread_id): Path<String>,
) -> Response {
    match state.pipeline.checkpointer().get(&ThreadId::from(thread_id.as_str())).await {
        Ok(Some(checkpoint)) => Json(checkpoint).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::message(format!("thread '{thread_id}' not found"))),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::message(e.to_string())),
        )
            .into_response(),
    }
}

async fn delete_thread_handler(
    State(state): State<SharedState>,
    Path(thread_id): Path<String>,
) -> Response {
    match state.pipeline.checkpointer().delete(&ThreadId::from(thread_id.as_str())).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::message(format!("thread '{thread_id}' not found"))),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::message(e.to_string())),
        )
            .into_response(),
    }
}
