use crate::audit::{AuditRequest, prompt};
use crate::config::Config;
use crate::llm::{GenerateRequest, LlmClient};

use super::research::RiskProfile;

/// Asks the model to assess the researched risks. A failure here does not
/// stop the plan; the plan prompt then says no analysis is available.
#[tracing::instrument(
    name = "pipeline_stage analyze",
    skip(llm_client, config, request, risks),
    fields(
        pipeline.stage = "analyze",
        analysis.industry_risks = risks.industry.len(),
        analysis.company_risks = risks.company_specific.len(),
        analysis.chars,
    )
)]
pub async fn analyze_risks(
    llm_client: &LlmClient,
    config: &Config,
    request: &AuditRequest,
    risks: &RiskProfile,
) -> Option<String> {
    let req = GenerateRequest {
        model: config.llm_model.clone(),
        system: prompt::RISK_SYSTEM_PROMPT.to_string(),
        prompt: prompt::build_risk_prompt(request, &risks.industry, &risks.company_specific),
        temperature: config.llm_temperature,
        max_tokens: config.risk_analysis_max_tokens,
        stage: "analyze".to_string(),
    };

    match llm_client.generate(&req).await {
        Ok(resp) if !resp.content.trim().is_empty() => {
            let analysis = resp.content.trim().to_string();
            tracing::Span::current().record("analysis.chars", analysis.len());
            Some(analysis)
        }
        Ok(_) => {
            tracing::warn!("Risk analysis came back empty, continuing without it");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Risk analysis failed, continuing without it");
            None
        }
    }
}
