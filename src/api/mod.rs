// src/api/mod.rs

//! HTTP management API.
//!
//! Thin CRUD over the [`JobStore`]: create and list jobs, read and change the
//! concurrency ceiling, aggregate counts. It never talks to the scheduler;
//! the scheduler picks up whatever lands in the store on its next tick.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::errors::{JobschedError, Result};
use crate::store::JobStore;
use crate::types::{Job, JobId, NewJob};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn JobStore>,
}

impl ApiState {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
struct CreateJobRequest {
    name: String,
    command: String,
}

#[derive(Debug, Serialize)]
struct CreateJobResponse {
    message: &'static str,
    job: Job,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigBody {
    max_concurrent_jobs: i64,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    queued_count: i64,
    running_count: i64,
    completed_count: i64,
    failed_count: i64,
    total_count: i64,
}

/// Error body returned by every handler: `{"error": "..."}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<JobschedError> for ApiError {
    fn from(err: JobschedError) -> Self {
        let status = match &err {
            JobschedError::JobNotFound(_) => StatusCode::NOT_FOUND,
            JobschedError::InvalidJob(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "management API store error");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the API router over `state`.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/jobs", get(list_jobs_handler).post(create_job_handler))
        .route("/api/jobs/create", post(create_job_handler))
        .route("/api/jobs/{id}", get(get_job_handler))
        .route("/api/config", get(get_config_handler).put(put_config_handler))
        .route("/api/stats", get(stats_handler))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `addr` until `cancel` fires.
pub async fn serve(addr: SocketAddr, state: ApiState, cancel: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "starting management API");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("management API stopped");
    Ok(())
}

async fn list_jobs_handler(State(state): State<ApiState>) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.store.list_jobs().await?))
}

async fn get_job_handler(
    State(state): State<ApiState>,
    Path(id): Path<JobId>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.store.get_job(id).await?))
}

async fn create_job_handler(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<CreateJobRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let new_job = NewJob::new(req.name, req.command);
    if new_job.validate().is_err() {
        return Err(ApiError::bad_request("name and command are required"));
    }

    let job = state.store.create_job(new_job).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            message: "Job created successfully",
            job,
        }),
    ))
}

async fn get_config_handler(State(state): State<ApiState>) -> ApiResult<Json<ConfigBody>> {
    let max_concurrent_jobs = state.store.get_max_concurrent_jobs().await?;
    Ok(Json(ConfigBody { max_concurrent_jobs }))
}

async fn put_config_handler(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<ConfigBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Json(body) = payload?;
    if body.max_concurrent_jobs < 0 {
        return Err(ApiError::bad_request(format!(
            "max_concurrent_jobs must be >= 0 (got {})",
            body.max_concurrent_jobs
        )));
    }

    state
        .store
        .set_max_concurrent_jobs(body.max_concurrent_jobs)
        .await?;

    Ok(Json(json!({
        "message": "Config updated successfully",
        "max_concurrent_jobs": body.max_concurrent_jobs,
    })))
}

async fn stats_handler(State(state): State<ApiState>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.store.job_stats().await?;
    Ok(Json(StatsResponse {
        queued_count: stats.queued,
        running_count: stats.running,
        completed_count: stats.completed,
        failed_count: stats.failed,
        total_count: stats.total,
    }))
}
