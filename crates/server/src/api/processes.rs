//! Selection process handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use funil_core::{
    HistoryEntry, ProcessFilter, ProcessOutcome, ProcessStateFilter, SelectionProcess,
    TransitionAction,
};

use crate::state::AppState;

use super::{engine_error_response, ErrorBody};

/// Maximum allowed limit for process queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for process queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for operations that take optional feedback
#[derive(Debug, Deserialize)]
pub struct FeedbackBody {
    pub feedback: Option<String>,
}

/// Body for jumping forward to a later stage
#[derive(Debug, Deserialize)]
pub struct JumpBody {
    pub target_stage_id: String,
    pub feedback: Option<String>,
}

/// Body for reverting to an earlier stage
#[derive(Debug, Deserialize)]
pub struct RevertBody {
    pub target_stage_id: String,
    /// Mandatory; empty or missing feedback is rejected by the engine.
    pub feedback: Option<String>,
}

/// Query parameters for listing processes
#[derive(Debug, Deserialize)]
pub struct ListProcessesParams {
    /// Filter by job posting
    pub job_id: Option<String>,
    /// Filter by lifecycle slice
    pub state: Option<ProcessStateFilter>,
    /// Maximum number of processes to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for process operations
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub id: String,
    pub application_id: String,
    pub job_id: String,
    pub current_stage_id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub outcome: Option<ProcessOutcome>,
    pub version: i64,
    pub updated_at: String,
}

impl From<SelectionProcess> for ProcessResponse {
    fn from(process: SelectionProcess) -> Self {
        Self {
            id: process.id,
            application_id: process.application_id,
            job_id: process.job_id,
            current_stage_id: process.current_stage_id,
            started_at: process.started_at.to_rfc3339(),
            finished_at: process.finished_at.map(|t| t.to_rfc3339()),
            outcome: process.outcome,
            version: process.version,
            updated_at: process.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing processes
#[derive(Debug, Serialize)]
pub struct ListProcessesResponse {
    pub processes: Vec<ProcessResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// One audit trail entry
#[derive(Debug, Serialize)]
pub struct HistoryEntryResponse {
    pub id: i64,
    pub process_id: String,
    pub from_stage_id: Option<String>,
    pub to_stage_id: String,
    pub action: TransitionAction,
    pub feedback: Option<String>,
    pub occurred_at: String,
}

impl From<HistoryEntry> for HistoryEntryResponse {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            id: entry.id,
            process_id: entry.process_id,
            from_stage_id: entry.from_stage_id,
            to_stage_id: entry.to_stage_id,
            action: entry.action,
            feedback: entry.feedback,
            occurred_at: entry.occurred_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List processes with optional filters
pub async fn list_processes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListProcessesParams>,
) -> Result<Json<ListProcessesResponse>, (StatusCode, Json<ErrorBody>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = ProcessFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref job_id) = params.job_id {
        filter = filter.with_job_id(job_id);
    }

    if let Some(state_filter) = params.state {
        filter = filter.with_state(state_filter);
    }

    let processes = state
        .processes()
        .list(&filter)
        .map_err(|e| engine_error_response(e.into()))?;

    // Total count ignores pagination.
    let count_filter = ProcessFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter
    };
    let total = state
        .processes()
        .count(&count_filter)
        .map_err(|e| engine_error_response(e.into()))?;

    Ok(Json(ListProcessesResponse {
        processes: processes.into_iter().map(ProcessResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Get a process by ID
pub async fn get_process(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ErrorBody>)> {
    state
        .engine()
        .get(&id)
        .map(|process| Json(ProcessResponse::from(process)))
        .map_err(engine_error_response)
}

/// Advance a process to the next stage
pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<FeedbackBody>>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ErrorBody>)> {
    let feedback = body.and_then(|b| b.0.feedback);
    state
        .engine()
        .advance_to_next(&id, feedback)
        .map(|process| Json(ProcessResponse::from(process)))
        .map_err(engine_error_response)
}

/// Jump a process forward to a later stage
pub async fn jump(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<JumpBody>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ErrorBody>)> {
    state
        .engine()
        .jump_to_stage(&id, &body.target_stage_id, body.feedback)
        .map(|process| Json(ProcessResponse::from(process)))
        .map_err(engine_error_response)
}

/// Revert a process to an earlier stage
pub async fn revert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RevertBody>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ErrorBody>)> {
    state
        .engine()
        .revert_to_stage(&id, &body.target_stage_id, body.feedback.unwrap_or_default())
        .map(|process| Json(ProcessResponse::from(process)))
        .map_err(engine_error_response)
}

/// Finalize a process with outcome accepted
pub async fn finalize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<FeedbackBody>>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ErrorBody>)> {
    let feedback = body.and_then(|b| b.0.feedback);
    state
        .engine()
        .finalize(&id, feedback)
        .map(|process| Json(ProcessResponse::from(process)))
        .map_err(engine_error_response)
}

/// Reject a process with outcome rejected
pub async fn reject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<FeedbackBody>>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ErrorBody>)> {
    let feedback = body.and_then(|b| b.0.feedback).unwrap_or_default();
    state
        .engine()
        .reject(&id, feedback)
        .map(|process| Json(ProcessResponse::from(process)))
        .map_err(engine_error_response)
}

/// Withdraw a process (candidate-initiated)
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ErrorBody>)> {
    state
        .engine()
        .withdraw(&id)
        .map(|process| Json(ProcessResponse::from(process)))
        .map_err(engine_error_response)
}

/// Get a process's audit trail, oldest entry first
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HistoryEntryResponse>>, (StatusCode, Json<ErrorBody>)> {
    state
        .engine()
        .history(&id)
        .map(|entries| {
            Json(
                entries
                    .into_iter()
                    .map(HistoryEntryResponse::from)
                    .collect(),
            )
        })
        .map_err(engine_error_response)
}
