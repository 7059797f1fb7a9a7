pub mod applications;
pub mod handlers;
pub mod middleware;
pub mod processes;
pub mod routes;
pub mod stages;

pub use routes::create_router;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use funil_core::EngineError;

/// Error body shared by every API endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Stable machine-readable tag from the engine taxonomy.
    pub code: &'static str,
}

/// Map an engine error to its HTTP representation.
pub(crate) fn engine_error_response(err: EngineError) -> (StatusCode, Json<ErrorBody>) {
    let status = match &err {
        EngineError::ProcessNotFound(_) | EngineError::ApplicationNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        EngineError::ProcessFinalized { .. }
        | EngineError::InvalidState { .. }
        | EngineError::InsufficientStages { .. }
        | EngineError::NoNextStage { .. }
        | EngineError::ConcurrentModification { .. } => StatusCode::CONFLICT,
        EngineError::InvalidTarget { .. } | EngineError::FeedbackRequired => {
            StatusCode::BAD_REQUEST
        }
        EngineError::NoStagesConfigured { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
            code: err.code(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_follows_the_contract() {
        let cases = [
            (
                engine_error_response(EngineError::ProcessFinalized {
                    process_id: "p".to_string(),
                })
                .0,
                StatusCode::CONFLICT,
            ),
            (
                engine_error_response(EngineError::FeedbackRequired).0,
                StatusCode::BAD_REQUEST,
            ),
            (
                engine_error_response(EngineError::InvalidTarget {
                    target_stage_id: "s".to_string(),
                    reason: "nope".to_string(),
                })
                .0,
                StatusCode::BAD_REQUEST,
            ),
            (
                engine_error_response(EngineError::InsufficientStages {
                    job_id: "j".to_string(),
                    count: 1,
                })
                .0,
                StatusCode::CONFLICT,
            ),
            (
                engine_error_response(EngineError::NoStagesConfigured {
                    job_id: "j".to_string(),
                })
                .0,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                engine_error_response(EngineError::ProcessNotFound("p".to_string())).0,
                StatusCode::NOT_FOUND,
            ),
            (
                engine_error_response(EngineError::ConcurrentModification {
                    process_id: "p".to_string(),
                })
                .0,
                StatusCode::CONFLICT,
            ),
        ];

        for (got, want) in cases {
            assert_eq!(got, want);
        }
    }
}
