use std::time::Instant;

use chrono::Utc;
use opentelemetry::KeyValue;
use uuid::Uuid;

use crate::AppState;
use crate::audit::{AuditRequest, Choice};
use crate::error::{AppError, AppResult};
use crate::history::HistoryEntry;
use crate::report;
use crate::telemetry::metrics::{
    AUDIT_PLAN_FAILURES, AUDIT_PLAN_GENERATION_DURATION, AUDIT_PLAN_PDF_SIZE,
    AUDIT_PLANS_GENERATED,
};

use super::{analyze, generate};

/// Runs one generation cycle for a validated request: optional risk research
/// and analysis, the plan itself, the PDF, and finally the history entry.
/// History is only touched once the PDF is on disk.
#[tracing::instrument(
    name = "pipeline audit_plan",
    skip(state, request),
    fields(
        audit.company = %request.company_name(),
        audit.sector = %request.sector().label(),
        audit.standards = %request.standards().label(),
        audit.team_size = request.team().len(),
        audit.id,
        audit.duration_ms,
    )
)]
pub async fn generate_audit_plan(state: &AppState, request: AuditRequest) -> AppResult<HistoryEntry> {
    let start = Instant::now();
    let standards = KeyValue::new("audit.standards", request.standards().label());

    match run(state, request).await {
        Ok(entry) => {
            let duration = start.elapsed();
            AUDIT_PLANS_GENERATED.add(1, &[standards.clone()]);
            AUDIT_PLAN_GENERATION_DURATION.record(duration.as_secs_f64(), &[standards]);

            let span = tracing::Span::current();
            span.record("audit.id", entry.id.to_string());
            span.record("audit.duration_ms", duration.as_millis() as i64);

            tracing::info!(
                audit.id = %entry.id,
                pdf_path = %entry.pdf_path.display(),
                "Audit plan generated"
            );
            Ok(entry)
        }
        Err(e) => {
            AUDIT_PLAN_FAILURES.add(1, &[standards, KeyValue::new("error.type", error_type(&e))]);
            Err(e)
        }
    }
}

async fn run(state: &AppState, request: AuditRequest) -> AppResult<HistoryEntry> {
    let config = &state.config;

    // Stage 1-2: risk research and analysis (best effort)
    let risk_analysis = if config.risk_analysis_enabled {
        let risks = state
            .researcher
            .research(request.company_name(), request.sector().label())
            .await;
        analyze::analyze_risks(&state.llm_client, config, &request, &risks).await
    } else {
        None
    };

    // Stage 3: the plan
    let plan = generate::generate_plan(
        &state.llm_client,
        config,
        &request,
        risk_analysis.as_deref(),
    )
    .await?;

    // Stage 4: render and write the PDF
    let id = Uuid::new_v4();
    let timestamp = Utc::now();
    let bytes = report::render_plan(&request, &plan, timestamp.date_naive()).await?;
    AUDIT_PLAN_PDF_SIZE.record(bytes.len() as f64, &[]);

    let file_name = report::pdf_file_name(request.company_name(), timestamp, id);
    let pdf_path = report::write_pdf(&config.report_output_dir, &file_name, &bytes).await?;

    // Stage 5: record
    let entry = HistoryEntry {
        id,
        timestamp,
        request,
        plan,
        risk_analysis,
        pdf_path,
    };
    state.history.append(entry.clone()).await;

    Ok(entry)
}

fn error_type(error: &AppError) -> &'static str {
    match error {
        AppError::Validation(_) => "validation",
        AppError::NotFound(_) => "not_found",
        AppError::Llm(_) => "llm",
        AppError::EmptyResponse => "empty_response",
        AppError::Render(_) => "render",
        AppError::Io(_) => "io",
        AppError::Internal(_) => "internal",
    }
}
