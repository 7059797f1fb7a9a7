//! Prometheus metrics for the pipeline engine.

use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};

/// Committed transitions by action.
pub static TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("funil_transitions_total", "Committed process transitions"),
        &["action"], // "advance", "jump", "revert", "finalize", "reject", "withdraw"
    )
    .unwrap()
});

/// Rejected transition attempts by reason.
pub static TRANSITION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "funil_transition_failures_total",
            "Transition attempts rejected by the engine",
        ),
        &["reason"], // error taxonomy codes
    )
    .unwrap()
});

/// Gate decisions on pending candidatures.
pub static GATE_DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "funil_gate_decisions_total",
            "Application gate decisions on pending candidatures",
        ),
        &["decision"], // "accepted", "rejected"
    )
    .unwrap()
});

/// Processes reaching a terminal state, by outcome.
pub static PROCESSES_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "funil_processes_finished_total",
            "Selection processes reaching a terminal state",
        ),
        &["outcome"], // "accepted", "rejected", "withdrawn"
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TRANSITIONS_TOTAL.clone()),
        Box::new(TRANSITION_FAILURES.clone()),
        Box::new(GATE_DECISIONS.clone()),
        Box::new(PROCESSES_FINISHED.clone()),
    ]
}
