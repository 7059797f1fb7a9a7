//! Stage administration handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use funil_core::{NewStage, PipelineStage, StageError};

use crate::state::AppState;

use super::ErrorBody;

/// Request body for defining a job's stage pipeline
#[derive(Debug, Deserialize)]
pub struct DefineStagesBody {
    pub stages: Vec<NewStage>,
}

/// Request body for reordering a job's stages
#[derive(Debug, Deserialize)]
pub struct ReorderStagesBody {
    pub stage_ids: Vec<String>,
}

/// Response carrying a job's ordered stages
#[derive(Debug, Serialize)]
pub struct StagesResponse {
    pub stages: Vec<PipelineStage>,
}

fn stage_error_response(err: StageError) -> (StatusCode, Json<ErrorBody>) {
    let (status, code) = match &err {
        StageError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        StageError::StageNotFound { .. } => (StatusCode::NOT_FOUND, "stage_not_found"),
        StageError::StageLocked { .. } => (StatusCode::CONFLICT, "stage_locked"),
        StageError::EmptyPipeline { .. } => (StatusCode::BAD_REQUEST, "empty_pipeline"),
        StageError::InvalidOrdering(_) => (StatusCode::BAD_REQUEST, "invalid_ordering"),
        StageError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
    };

    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
            code,
        }),
    )
}

/// Define (or replace) the stage pipeline of a job
pub async fn define_stages(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    Json(body): Json<DefineStagesBody>,
) -> Result<(StatusCode, Json<StagesResponse>), (StatusCode, Json<ErrorBody>)> {
    match state.registry().define_stages(&job_id, body.stages) {
        Ok(stages) => Ok((StatusCode::CREATED, Json(StagesResponse { stages }))),
        Err(e) => Err(stage_error_response(e)),
    }
}

/// List the stages of a job, ordered
pub async fn list_stages(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<StagesResponse>, (StatusCode, Json<ErrorBody>)> {
    match state.registry().list_stages(&job_id) {
        Ok(stages) => Ok(Json(StagesResponse { stages })),
        Err(e) => Err(stage_error_response(e)),
    }
}

/// Reorder the stages of a job
pub async fn reorder_stages(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    Json(body): Json<ReorderStagesBody>,
) -> Result<Json<StagesResponse>, (StatusCode, Json<ErrorBody>)> {
    match state.registry().reorder(&job_id, &body.stage_ids) {
        Ok(stages) => Ok(Json(StagesResponse { stages })),
        Err(e) => Err(stage_error_response(e)),
    }
}
