use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use audit_plan_generator::{
    AppState, Config,
    llm::{GenerateRequest, GenerateResponse, LlmClient, Provider},
    routes::create_router,
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt;

enum Reply {
    Text(&'static str),
    Blank,
    Fail,
}

struct MockProvider {
    reply: Reply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(req.prompt.clone());

        let content = match self.reply {
            Reply::Text(text) => text.to_string(),
            Reply::Blank => "   \n ".to_string(),
            Reply::Fail => anyhow::bail!("401 Unauthorized: invalid api key"),
        };

        Ok(GenerateResponse {
            content,
            model: req.model.clone(),
            input_tokens: 100,
            output_tokens: 50,
            finish_reason: "stop".to_string(),
            provider: "mock".to_string(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn test_config(report_dir: &Path, risk_analysis_enabled: bool) -> Config {
    Config {
        port: 0,
        environment: "test".to_string(),
        openai_api_key: "test-key".to_string(),
        openai_base_url: None,
        llm_model: "gpt-3.5-turbo".to_string(),
        llm_temperature: 0.7,
        plan_max_tokens: 2000,
        risk_analysis_max_tokens: 1000,
        risk_analysis_enabled,
        risk_search_enabled: false,
        risk_search_url: "http://127.0.0.1:9/search".to_string(),
        report_output_dir: report_dir.to_path_buf(),
        otel_service_name: "audit-plan-generator-test".to_string(),
        otel_exporter_endpoint: "http://localhost:4317".to_string(),
    }
}

fn setup(provider: Arc<MockProvider>, report_dir: &Path, risk_analysis: bool) -> (Router, AppState) {
    let client = LlmClient::new(provider, None);
    let state = AppState::new(test_config(report_dir, risk_analysis), client);
    (create_router(state.clone()), state)
}

fn acme_form() -> Value {
    json!({
        "company_name": "Acme Co",
        "sector": "Retail",
        "standards": "IFRS",
        "team": ["Alice"],
    })
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn pdf_count(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "pdf"))
            .count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup(MockProvider::new(Reply::Text("Plan: ...")), dir.path(), false);

    let response = get(&app, "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "audit-plan-generator");
}

#[tokio::test]
async fn test_form_options() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup(MockProvider::new(Reply::Text("Plan: ...")), dir.path(), false);

    let body = body_json(get(&app, "/api/form-options").await).await;
    assert_eq!(body["standards"], json!(["IFRS", "US GAAP"]));
    assert!(body["sectors"].as_array().unwrap().contains(&json!("Retail")));
    assert!(body["roles"].as_array().unwrap().contains(&json!("Lead Auditor")));
    assert_eq!(body["default_role"], "Senior Auditor");
}

#[tokio::test]
async fn test_create_audit_plan_writes_pdf_and_records_history() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new(Reply::Text("Plan: ..."));
    let (app, state) = setup(provider.clone(), dir.path(), false);

    let response = post_json(&app, "/api/audit-plans", acme_form()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["plan"], "Plan: ...");
    assert_eq!(body["request"]["company_name"], "Acme Co");

    let pdf_path = body["pdf_path"].as_str().unwrap();
    assert!(!pdf_path.is_empty());
    assert!(Path::new(pdf_path).exists());
    assert!(std::fs::read(pdf_path).unwrap().starts_with(b"%PDF"));

    assert_eq!(state.history.len().await, 1);
    assert_eq!(pdf_count(dir.path()), 1);

    assert_eq!(provider.calls(), 1);
    let prompt = &provider.prompts()[0];
    for expected in ["Acme Co", "Retail", "IFRS", "- Alice (Senior Auditor)"] {
        assert!(prompt.contains(expected), "prompt missing {expected}");
    }
}

#[tokio::test]
async fn test_empty_team_rejected_before_model_call() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new(Reply::Text("Plan: ..."));
    let (app, state) = setup(provider.clone(), dir.path(), true);

    let mut form = acme_form();
    form["team"] = json!([]);

    let response = post_json(&app, "/api/audit-plans", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["status"], 400);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["team"]);

    assert_eq!(provider.calls(), 0);
    assert!(state.history.is_empty().await);
    assert_eq!(pdf_count(dir.path()), 0);
}

#[tokio::test]
async fn test_all_field_errors_reported_together() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new(Reply::Text("Plan: ..."));
    let (app, _) = setup(provider.clone(), dir.path(), false);

    let response = post_json(
        &app,
        "/api/audit-plans",
        json!({"company_name": " ", "sector": "Mining", "standards": "GAAP", "team": ["Alice"]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["company_name", "sector", "standards"]);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_wrongly_typed_form_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new(Reply::Text("Plan: ..."));
    let (app, state) = setup(provider.clone(), dir.path(), false);

    for team in [json!("Alice"), json!([123])] {
        let mut form = acme_form();
        form["team"] = team;

        let response = post_json(&app, "/api/audit-plans", form).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["status"], 400);
        let fields = body["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0]["field"], "body");
        assert!(!fields[0]["message"].as_str().unwrap().is_empty());
    }

    assert_eq!(provider.calls(), 0);
    assert!(state.history.is_empty().await);
}

#[tokio::test]
async fn test_model_failure_leaves_history_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new(Reply::Fail);
    let (app, state) = setup(provider.clone(), dir.path(), true);

    let response = post_json(&app, "/api/audit-plans", acme_form()).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["status"], 502);
    assert!(!body["error"].as_str().unwrap().contains("invalid api key"));

    // risk analysis attempt plus the plan attempt, no retries
    assert_eq!(provider.calls(), 2);
    assert!(state.history.is_empty().await);
    assert_eq!(pdf_count(dir.path()), 0);
}

#[tokio::test]
async fn test_blank_model_response_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new(Reply::Blank);
    let (app, state) = setup(provider.clone(), dir.path(), false);

    let response = post_json(&app, "/api/audit-plans", acme_form()).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(state.history.is_empty().await);
    assert_eq!(pdf_count(dir.path()), 0);
}

#[tokio::test]
async fn test_risk_analysis_feeds_plan_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new(Reply::Text("Severity is moderate overall."));
    let (app, _) = setup(provider.clone(), dir.path(), true);

    let response = post_json(&app, "/api/audit-plans", acme_form()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["risk_analysis"], "Severity is moderate overall.");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Market volatility in the sector"));
    assert!(prompts[1].contains("Severity is moderate overall."));
}

#[tokio::test]
async fn test_list_and_get_audit_plans() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup(MockProvider::new(Reply::Text("Plan: ...")), dir.path(), false);

    let mut second = acme_form();
    second["company_name"] = json!("Globex");
    second["team"] = json!([{"name": "Bob", "role": "Lead Auditor"}]);

    post_json(&app, "/api/audit-plans", acme_form()).await;
    let created = body_json(post_json(&app, "/api/audit-plans", second).await).await;

    let list = body_json(get(&app, "/api/audit-plans").await).await;
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["company_name"].as_str())
        .collect();
    assert_eq!(names, vec!["Globex", "Acme Co"]);

    let id = created["id"].as_str().unwrap();
    let response = get(&app, &format!("/api/audit-plans/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let entry = body_json(response).await;
    assert_eq!(entry["request"]["team"][0]["role"], "Lead Auditor");
}

#[tokio::test]
async fn test_unknown_audit_plan_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup(MockProvider::new(Reply::Text("Plan: ...")), dir.path(), false);

    let id = uuid::Uuid::new_v4();
    for uri in [
        format!("/api/audit-plans/{id}"),
        format!("/api/audit-plans/{id}/pdf"),
        format!("/api/audit-plans/{id}/text"),
    ] {
        let response = get(&app, &uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_downloads() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup(MockProvider::new(Reply::Text("Plan: ...")), dir.path(), false);

    let created = body_json(post_json(&app, "/api/audit-plans", acme_form()).await).await;
    let id = created["id"].as_str().unwrap();
    let pdf_path = created["pdf_path"].as_str().unwrap().to_string();

    let response = get(&app, &format!("/api/audit-plans/{id}/pdf")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"audit_plan_acme_co_"));
    assert!(body_bytes(response).await.starts_with(b"%PDF"));

    // a removed file is rendered again
    std::fs::remove_file(&pdf_path).unwrap();
    let response = get(&app, &format!("/api/audit-plans/{id}/pdf")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.starts_with(b"%PDF"));

    let response = get(&app, &format!("/api/audit-plans/{id}/text")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.starts_with("Financial Audit Plan for Acme Co"));
    assert!(text.contains("Plan: ..."));
}
