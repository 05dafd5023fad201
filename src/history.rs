use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::audit::{AuditPlanText, AuditRequest, Choice};

/// Record of one completed generation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub request: AuditRequest,
    pub plan: AuditPlanText,
    pub risk_analysis: Option<String>,
    pub pdf_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub company_name: String,
    pub sector: String,
    pub standards: String,
    pub team_size: usize,
    pub pdf_path: PathBuf,
}

impl From<&HistoryEntry> for HistorySummary {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id,
            timestamp: entry.timestamp,
            company_name: entry.request.company_name().to_string(),
            sector: entry.request.sector().label().to_string(),
            standards: entry.request.standards().label().to_string(),
            team_size: entry.request.team().len(),
            pdf_path: entry.pdf_path.clone(),
        }
    }
}

/// Append-only log of generated plans, kept for the lifetime of the process.
#[derive(Debug, Default)]
pub struct History {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, entry: HistoryEntry) {
        let mut entries = self.entries.write().await;
        tracing::info!(
            history.id = %entry.id,
            history.len = entries.len() + 1,
            "Audit plan recorded in history"
        );
        entries.push(entry);
    }

    /// Newest first.
    pub async fn list(&self) -> Vec<HistorySummary> {
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .map(HistorySummary::from)
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Option<HistoryEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditPlanForm;

    fn entry(company: &str) -> HistoryEntry {
        let form: AuditPlanForm = serde_json::from_value(serde_json::json!({
            "company_name": company,
            "sector": "Retail",
            "standards": "IFRS",
            "team": ["Alice", "Bob"],
        }))
        .unwrap();

        HistoryEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            request: form.validate().unwrap(),
            plan: AuditPlanText::new("Plan: ...").unwrap(),
            risk_analysis: None,
            pdf_path: PathBuf::from(format!("reports/{company}.pdf")),
        }
    }

    #[tokio::test]
    async fn test_append_and_get() {
        let history = History::new();
        assert!(history.is_empty().await);

        let first = entry("Acme Co");
        let id = first.id;
        history.append(first).await;

        assert_eq!(history.len().await, 1);
        let found = history.get(id).await.unwrap();
        assert_eq!(found.request.company_name(), "Acme Co");
        assert!(history.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let history = History::new();
        history.append(entry("First")).await;
        history.append(entry("Second")).await;
        history.append(entry("Third")).await;

        let names: Vec<_> = history
            .list()
            .await
            .into_iter()
            .map(|s| s.company_name)
            .collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);
    }

    #[tokio::test]
    async fn test_summary_fields() {
        let history = History::new();
        history.append(entry("Acme Co")).await;

        let summary = history.list().await.remove(0);
        assert_eq!(summary.sector, "Retail");
        assert_eq!(summary.standards, "IFRS");
        assert_eq!(summary.team_size, 2);
        assert_eq!(summary.pdf_path, PathBuf::from("reports/Acme Co.pdf"));
    }
}
