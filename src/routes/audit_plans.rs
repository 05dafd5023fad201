use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::AppState;
use crate::audit::{AuditPlanForm, ValidationErrors};
use crate::error::{AppError, AppResult};
use crate::history::{HistoryEntry, HistorySummary};
use crate::pipeline::generate_audit_plan;
use crate::report;
use crate::telemetry::metrics::FORM_VALIDATION_FAILURES;

pub async fn create_audit_plan(
    State(state): State<AppState>,
    body: Result<Json<AuditPlanForm>, JsonRejection>,
) -> AppResult<(StatusCode, Json<HistoryEntry>)> {
    let form = match body {
        Ok(Json(form)) => form,
        Err(rejection) => {
            let mut errors = ValidationErrors::default();
            errors.push("body", rejection.body_text());
            return Err(rejected(errors));
        }
    };

    let request = form.validate().map_err(rejected)?;

    let entry = generate_audit_plan(&state, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

fn rejected(errors: ValidationErrors) -> AppError {
    FORM_VALIDATION_FAILURES.add(1, &[]);
    AppError::Validation(errors)
}

pub async fn list_audit_plans(State(state): State<AppState>) -> Json<Vec<HistorySummary>> {
    Json(state.history.list().await)
}

pub async fn get_audit_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<HistoryEntry>> {
    find(&state, id).await.map(Json)
}

/// Serves the stored PDF. If the file has been removed from disk since it was
/// generated, the report is rendered again from the history entry.
pub async fn download_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let entry = find(&state, id).await?;

    let bytes = match tokio::fs::read(&entry.pdf_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                audit.id = %id,
                path = %entry.pdf_path.display(),
                "PDF missing on disk, re-rendering"
            );
            report::render_plan(&entry.request, &entry.plan, entry.timestamp.date_naive()).await?
        }
        Err(e) => return Err(e.into()),
    };

    let file_name = entry
        .pdf_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            report::pdf_file_name(entry.request.company_name(), entry.timestamp, entry.id)
        });

    attachment("application/pdf", &file_name, bytes)
}

pub async fn download_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let entry = find(&state, id).await?;
    let body = report::plain_text(&entry);
    attachment(
        "text/plain; charset=utf-8",
        &report::text_file_name(&entry),
        body.into_bytes(),
    )
}

async fn find(state: &AppState, id: Uuid) -> AppResult<HistoryEntry> {
    state
        .history
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Audit plan {id} not found")))
}

fn attachment(content_type: &'static str, file_name: &str, body: Vec<u8>) -> AppResult<Response> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| AppError::Internal(format!("invalid file name header: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((headers, body).into_response())
}
