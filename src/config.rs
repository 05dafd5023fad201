use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub plan_max_tokens: u32,
    pub risk_analysis_max_tokens: u32,
    pub risk_analysis_enabled: bool,
    pub risk_search_enabled: bool,
    pub risk_search_url: String,
    pub report_output_dir: PathBuf,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .context("OPENAI_API_KEY must be set (environment or .env file)")?;

        Ok(Self {
            port: parse_var("APP_PORT", 8080)?,
            environment: env::var("APP_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            openai_api_key,
            openai_base_url: env::var("OPENAI_BASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            llm_temperature: parse_var("LLM_TEMPERATURE", 0.7)?,
            plan_max_tokens: parse_var("PLAN_MAX_TOKENS", 2000)?,
            risk_analysis_max_tokens: parse_var("RISK_ANALYSIS_MAX_TOKENS", 1000)?,
            risk_analysis_enabled: parse_var("RISK_ANALYSIS_ENABLED", true)?,
            risk_search_enabled: parse_var("RISK_SEARCH_ENABLED", false)?,
            risk_search_url: env::var("RISK_SEARCH_URL")
                .unwrap_or_else(|_| "https://www.google.com/search".to_string()),
            report_output_dir: env::var("REPORT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("reports")),
            otel_service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "audit-plan-generator".to_string()),
            otel_exporter_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}
