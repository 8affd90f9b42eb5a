use axum::{extract::State, Extension, Json};
use trendscope_core::Snapshot;
use trendscope_pipeline::JobError;

use crate::middleware::RequestId;

use super::{map_job_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Serves the last exported snapshot straight from disk.
pub(super) async fn get_dashboard_data(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Snapshot>>, ApiError> {
    let snapshot = trendscope_pipeline::read_snapshot(&state.config.snapshot_path)
        .await
        .map_err(|e| map_job_error(req_id.0.clone(), &JobError::from(e)))?;

    Ok(Json(ApiResponse {
        data: snapshot,
        meta: ResponseMeta::new(req_id.0),
    }))
}
