use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{applications, handlers, middleware::metrics_middleware, processes, stages};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config, metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Stage administration
        .route("/jobs/{job_id}/stages", post(stages::define_stages))
        .route("/jobs/{job_id}/stages", get(stages::list_stages))
        .route("/jobs/{job_id}/stages/order", put(stages::reorder_stages))
        // Applications (the gate)
        .route("/applications", post(applications::create_application))
        .route("/applications/{id}", get(applications::get_application))
        .route("/applications/{id}/accept", post(applications::accept_application))
        .route("/applications/{id}/reject", post(applications::reject_application))
        // Selection processes
        .route("/processes", get(processes::list_processes))
        .route("/processes/{id}", get(processes::get_process))
        .route("/processes/{id}/advance", post(processes::advance))
        .route("/processes/{id}/jump", post(processes::jump))
        .route("/processes/{id}/revert", post(processes::revert))
        .route("/processes/{id}/finalize", post(processes::finalize))
        .route("/processes/{id}/reject", post(processes::reject))
        .route("/processes/{id}/withdraw", post(processes::withdraw))
        .route("/processes/{id}/history", get(processes::history))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
