use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;
use trendscope_core::SnapshotStats;
use trendscope_pipeline::{JobError, JobStatus};

use crate::middleware::RequestId;

use super::{map_job_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ExportResult {
    path: String,
    stats: SnapshotStats,
}

#[allow(clippy::unused_async)]
pub(super) async fn get_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<JobStatus>> {
    Json(ApiResponse {
        data: state.orchestrator.status(),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Starts a refresh in the background. Never waits for the run.
#[allow(clippy::unused_async)]
pub(super) async fn start_refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<(StatusCode, Json<ApiResponse<JobStatus>>), ApiError> {
    match state.orchestrator.start() {
        Ok(_handle) => {
            tracing::info!(request_id = %req_id.0, "api: refresh accepted");
            Ok((
                StatusCode::ACCEPTED,
                Json(ApiResponse {
                    data: state.orchestrator.status(),
                    meta: ResponseMeta::new(req_id.0),
                }),
            ))
        }
        Err(e @ JobError::AdmissionRejected) => {
            tracing::info!(request_id = %req_id.0, "api: refresh rejected, run in flight");
            Err(map_job_error(req_id.0, &e))
        }
        Err(e) => Err(map_job_error(req_id.0, &e)),
    }
}

/// Runs an export-only pass and waits for it.
pub(super) async fn run_export(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ExportResult>>, ApiError> {
    let snapshot = state
        .orchestrator
        .run_export_only()
        .await
        .map_err(|e| map_job_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ExportResult {
            path: state.config.snapshot_path.display().to_string(),
            stats: snapshot.stats,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
