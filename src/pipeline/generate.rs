use crate::audit::{AuditPlanText, AuditRequest, prompt};
use crate::config::Config;
use crate::error::AppError;
use crate::llm::{GenerateRequest, LlmClient};

#[tracing::instrument(
    name = "pipeline_stage generate",
    skip(llm_client, config, request, risk_analysis),
    fields(
        pipeline.stage = "generate",
        plan.has_risk_analysis = risk_analysis.is_some(),
        plan.chars,
        plan.finish_reason,
    )
)]
pub async fn generate_plan(
    llm_client: &LlmClient,
    config: &Config,
    request: &AuditRequest,
    risk_analysis: Option<&str>,
) -> Result<AuditPlanText, AppError> {
    let req = GenerateRequest {
        model: config.llm_model.clone(),
        system: prompt::PLAN_SYSTEM_PROMPT.to_string(),
        prompt: prompt::build_plan_prompt(request, risk_analysis),
        temperature: config.llm_temperature,
        max_tokens: config.plan_max_tokens,
        stage: "generate".to_string(),
    };

    let resp = llm_client
        .generate(&req)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let span = tracing::Span::current();
    span.record("plan.finish_reason", resp.finish_reason.as_str());
    span.record("plan.chars", resp.content.len());

    AuditPlanText::new(resp.content).ok_or(AppError::EmptyResponse)
}
