pub mod audit_plans;
pub mod form_options;
pub mod health;

use axum::{Router, routing::get};

use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/form-options", get(form_options::form_options))
        .route(
            "/api/audit-plans",
            get(audit_plans::list_audit_plans).post(audit_plans::create_audit_plan),
        )
        .route("/api/audit-plans/{id}", get(audit_plans::get_audit_plan))
        .route("/api/audit-plans/{id}/pdf", get(audit_plans::download_pdf))
        .route("/api/audit-plans/{id}/text", get(audit_plans::download_text))
        .with_state(state)
}
