//! Application (candidature) handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use funil_core::{Application, ApplicationStatus, CreateApplicationRequest};

use crate::state::AppState;

use super::{engine_error_response, processes::ProcessResponse, ErrorBody};

/// Request body for registering a candidature
#[derive(Debug, Deserialize)]
pub struct CreateApplicationBody {
    pub job_id: String,
    pub candidate_id: String,
}

/// Response for application operations
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: String,
    pub job_id: String,
    pub candidate_id: String,
    pub status: ApplicationStatus,
    pub submitted_at: String,
    pub updated_at: String,
}

impl From<Application> for ApplicationResponse {
    fn from(application: Application) -> Self {
        Self {
            id: application.id,
            job_id: application.job_id,
            candidate_id: application.candidate_id,
            status: application.status,
            submitted_at: application.submitted_at.to_rfc3339(),
            updated_at: application.updated_at.to_rfc3339(),
        }
    }
}

/// Empty JSON object response.
#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

/// Register a pending candidature
pub async fn create_application(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateApplicationBody>,
) -> Result<(StatusCode, Json<ApplicationResponse>), (StatusCode, Json<ErrorBody>)> {
    state
        .processes()
        .create_application(CreateApplicationRequest {
            job_id: body.job_id,
            candidate_id: body.candidate_id,
        })
        .map(|application| {
            (
                StatusCode::CREATED,
                Json(ApplicationResponse::from(application)),
            )
        })
        .map_err(|e| engine_error_response(e.into()))
}

/// Get an application by ID
pub async fn get_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, (StatusCode, Json<ErrorBody>)> {
    match state.processes().get_application(&id) {
        Ok(Some(application)) => Ok(Json(ApplicationResponse::from(application))),
        Ok(None) => Err(engine_error_response(
            funil_core::EngineError::ApplicationNotFound(id),
        )),
        Err(e) => Err(engine_error_response(e.into())),
    }
}

/// Accept a pending candidature into a selection process
pub async fn accept_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ProcessResponse>), (StatusCode, Json<ErrorBody>)> {
    state
        .gate()
        .accept(&id)
        .map(|process| (StatusCode::CREATED, Json(ProcessResponse::from(process))))
        .map_err(engine_error_response)
}

/// Reject a pending candidature before any stage is entered
pub async fn reject_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EmptyResponse>, (StatusCode, Json<ErrorBody>)> {
    state
        .gate()
        .reject(&id)
        .map(|_| Json(EmptyResponse {}))
        .map_err(engine_error_response)
}
