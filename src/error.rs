use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::audit::ValidationErrors;

const GENERATION_FAILED: &str =
    "The audit plan could not be generated. Check the language model configuration and resubmit.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "Please correct the highlighted fields and resubmit".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Llm(_) => (StatusCode::BAD_GATEWAY, GENERATION_FAILED.to_string()),
            AppError::EmptyResponse => (
                StatusCode::BAD_GATEWAY,
                "The language model returned an empty plan. Please resubmit.".to_string(),
            ),
            AppError::Render(_) | AppError::Io(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }

    fn log(&self) {
        match self {
            AppError::Validation(errors) => {
                tracing::info!(errors = %errors, "Form rejected")
            }
            AppError::NotFound(_) => {}
            AppError::Llm(msg) => tracing::error!(error = %msg, "LLM error"),
            AppError::EmptyResponse => tracing::error!("LLM returned an empty response"),
            AppError::Render(msg) => tracing::error!(error = %msg, "Render error"),
            AppError::Io(e) => tracing::error!(error = %e, "I/O error"),
            AppError::Internal(msg) => tracing::error!(error = %msg, "Internal error"),
        }
    }
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let (status, error_message) = self.status_and_message();

        let mut body = json!({
            "error": error_message,
            "status": status.as_u16(),
        });

        if let AppError::Validation(errors) = &self {
            body["fields"] = json!(errors);
        }

        if let Some(trace_id) = get_trace_id() {
            body["trace_id"] = json!(trace_id);
        }

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
