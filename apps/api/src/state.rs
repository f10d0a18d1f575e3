use sqlx::PgPool;

use crate::interview::orchestrator::Interviewer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Orchestration layer; owns the provider factory and its credentials.
    pub interviewer: Interviewer,
}
