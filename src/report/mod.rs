pub mod document;
pub mod pdf;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::audit::{AuditPlanText, AuditRequest, Choice};
use crate::error::{AppError, AppResult};
use crate::history::HistoryEntry;

pub use document::{Block, ReportDocument, build_document};
pub use pdf::render_pdf;

/// Builds and renders the PDF for a plan. CPU-bound, so it runs on the
/// blocking pool.
pub async fn render_plan(
    request: &AuditRequest,
    plan: &AuditPlanText,
    generated_on: NaiveDate,
) -> AppResult<Vec<u8>> {
    let document = build_document(request, plan, generated_on);
    tokio::task::spawn_blocking(move || render_pdf(&document))
        .await
        .map_err(|e| AppError::Internal(format!("PDF render task failed: {e}")))?
}

/// `audit_plan_<company-slug>_<YYYYmmdd_HHMMSS>_<id8>.pdf`
pub fn pdf_file_name(company: &str, timestamp: DateTime<Utc>, id: Uuid) -> String {
    let id = id.simple().to_string();
    format!(
        "audit_plan_{}_{}_{}.pdf",
        slug(company),
        timestamp.format("%Y%m%d_%H%M%S"),
        &id[..8]
    )
}

#[tracing::instrument(
    name = "report.write_pdf",
    skip(bytes),
    fields(report.dir = %dir.display(), report.size_bytes = bytes.len())
)]
pub async fn write_pdf(dir: &Path, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    tracing::info!(path = %path.display(), "PDF report written");
    Ok(path)
}

/// Body of the plain-text download.
pub fn plain_text(entry: &HistoryEntry) -> String {
    let request = &entry.request;
    let mut out = format!(
        "Financial Audit Plan for {}\nGenerated on: {}\nSector: {}\nAccounting Standards: {}\n",
        request.company_name(),
        entry.timestamp.format("%B %d, %Y"),
        request.sector().label(),
        request.standards().label(),
    );
    if let Some(period) = request.audit_period() {
        out.push_str(&format!("Audit Period: {}\n", period.describe()));
    }
    out.push('\n');
    out.push_str(entry.plan.as_str().trim());
    out.push('\n');
    out
}

pub fn text_file_name(entry: &HistoryEntry) -> String {
    pdf_file_name(entry.request.company_name(), entry.timestamp, entry.id).replace(".pdf", ".txt")
}

/// Lowercase ASCII alphanumerics joined by single underscores.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "company".to_string()
    } else {
        trimmed.to_string()
    }
}
