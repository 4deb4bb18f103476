use crate::application::use_cases::evaluation::evaluate_test_cases;
use crate::application::use_cases::history_stats::aggregate_history;
use crate::application::use_cases::session::SessionContext;
use crate::application::use_cases::test_generation::{GenerationOutcome, GenerationRequest};
use crate::domain::error::AppError;
use crate::domain::llm_config::LLMProvider;
use crate::domain::test_case::TestCase;
use crate::interfaces::state::AppState;
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

const MAX_LOG_ENTRIES: usize = 100;
const MAX_SESSIONS: usize = 64;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

/// Generated batches per session id, for follow-up comparisons. Once full,
/// recording a new session evicts the least recently generated one.
pub struct SessionStore {
    capacity: usize,
    sessions: HashMap<String, SessionContext>,
    order: VecDeque<String>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sessions: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn record(&mut self, session_id: &str, test_cases: Vec<TestCase>, requirement_text: String) {
        self.order.retain(|id| id != session_id);
        self.order.push_back(session_id.to_string());
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .record_generation(test_cases, requirement_text);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.sessions.remove(&oldest);
            }
        }
    }

    pub fn get(&self, session_id: &str) -> Option<&SessionContext> {
        self.sessions.get(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

pub struct HttpState {
    pub app: Arc<AppState>,
    pub sessions: Mutex<SessionStore>,
    pub logs: Mutex<VecDeque<LogEntry>>,
}

impl HttpState {
    pub fn new(app: Arc<AppState>) -> Self {
        Self::with_session_capacity(app, MAX_SESSIONS)
    }

    pub fn with_session_capacity(app: Arc<AppState>, capacity: usize) -> Self {
        Self {
            app,
            sessions: Mutex::new(SessionStore::new(capacity)),
            logs: Mutex::new(VecDeque::new()),
        }
    }
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub file_name: String,
    pub content_base64: String,
    #[serde(default)]
    pub provider: Option<LLMProvider>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub session_id: String,
    pub outcome: GenerationOutcome,
}

#[derive(Deserialize)]
pub struct CompareRequest {
    pub session_id: String,
    pub manual: Vec<TestCase>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ModelsRequest {
    #[serde(default)]
    pub provider: Option<LLMProvider>,
}

fn error_status(err: &AppError) -> StatusCode {
    match err {
        AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::ExtractionError(_) | AppError::ResponseParseError { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::LLMError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &AppError) -> HttpResponse {
    HttpResponse::build(error_status(err)).json(json!({
        "error": err.to_string(),
        "detail": err,
    }))
}

#[post("/generate")]
async fn generate(data: web::Data<HttpState>, req: web::Json<GenerateRequest>) -> impl Responder {
    let req = req.into_inner();
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Generating test cases from {}", req.file_name),
    );

    let bytes = match BASE64.decode(req.content_base64.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = AppError::ValidationError(format!("content_base64 is not valid base64: {}", e));
            add_log(&data.logs, "ERROR", "HttpApi", &err.to_string());
            return error_response(&err);
        }
    };

    let request = GenerationRequest {
        file_name: req.file_name,
        bytes,
        config: data.app.llm_config(req.provider, req.model),
        language: data.app.language_or_default(req.language),
        save_metrics: data.app.config.save_metrics,
    };

    match data.app.test_generation_use_case.execute(request).await {
        Ok(outcome) => {
            let session_id = req
                .session_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            match data.sessions.lock() {
                Ok(mut sessions) => sessions.record(
                    &session_id,
                    outcome.test_cases.clone(),
                    outcome.requirement_text.clone(),
                ),
                Err(_) => {
                    return error_response(&AppError::Internal(
                        "session store lock poisoned".to_string(),
                    ))
                }
            }

            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!(
                    "Generated {} test cases (session={})",
                    outcome.test_cases.len(),
                    session_id
                ),
            );
            HttpResponse::Ok().json(GenerateResponse {
                session_id,
                outcome,
            })
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Generation failed: {}", e),
            );
            error_response(&e)
        }
    }
}

#[post("/evaluate")]
async fn evaluate(req: web::Json<Vec<TestCase>>) -> impl Responder {
    HttpResponse::Ok().json(evaluate_test_cases(&req))
}

#[post("/compare")]
async fn compare(data: web::Data<HttpState>, req: web::Json<CompareRequest>) -> impl Responder {
    let req = req.into_inner();
    let session = match data.sessions.lock() {
        Ok(sessions) => sessions.get(&req.session_id).cloned(),
        Err(_) => {
            return error_response(&AppError::Internal(
                "session store lock poisoned".to_string(),
            ))
        }
    };

    let Some(session) = session else {
        return error_response(&AppError::NotFound(format!(
            "Unknown session: {}",
            req.session_id
        )));
    };

    match data
        .app
        .comparison_use_case
        .compare_with_session(&session, &req.manual, req.name, true)
    {
        Ok(record) => {
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!("Saved comparison {}", record.comparison_name),
            );
            HttpResponse::Ok().json(record)
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Comparison failed: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/metrics")]
async fn metrics(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.app.run_history())
}

#[get("/metrics/summary")]
async fn metrics_summary(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(aggregate_history(&data.app.run_history()))
}

#[get("/comparisons")]
async fn comparisons(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.app.comparison_use_case.history())
}

#[post("/models")]
async fn list_models(data: web::Data<HttpState>, req: web::Json<ModelsRequest>) -> impl Responder {
    let config = data.app.llm_config(req.provider, None);
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Fetching models (provider={} base_url={})",
            config.provider, config.base_url
        ),
    );

    match data.app.llm_client.list_models(&config).await {
        Ok(models) => HttpResponse::Ok().json(models),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Failed to list models: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs: Vec<LogEntry> = match data.logs.lock() {
        Ok(logs) => logs.iter().cloned().collect(),
        Err(_) => Vec::new(),
    };
    HttpResponse::Ok().json(logs)
}

pub fn add_log(logs: &Mutex<VecDeque<LogEntry>>, level: &str, source: &str, message: &str) {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };

    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }

    if let Ok(mut logs) = logs.lock() {
        logs.push_back(entry);
        while logs.len() > MAX_LOG_ENTRIES {
            logs.pop_front();
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(generate)
            .service(evaluate)
            .service(compare)
            .service(metrics)
            .service(metrics_summary)
            .service(comparisons)
            .service(list_models)
            .service(get_logs),
    );
}

pub fn start_server(app: Arc<AppState>, host: &str, port: u16) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState::new(app));

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(32 * 1024 * 1024))
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    tracing::info!(host, port, "HTTP API listening");
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Result;
    use crate::domain::llm_config::LLMConfig;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::llm_clients::LLMClient;
    use actix_web::test as actix_test;
    use async_trait::async_trait;

    struct CannedClient;

    #[async_trait]
    impl LLMClient for CannedClient {
        async fn generate(&self, _config: &LLMConfig, _system: &str, _user: &str) -> Result<String> {
            Ok(r#"[{"id": "TC001", "title": "Login", "precondition": "Account exists", "steps": "Submit form", "expected_result": "Signed in"},
                   {"id": "TC002", "title": "Lockout", "precondition": "", "steps": "Fail 3 times", "expected_result": "Locked"}]"#
                .to_string())
        }

        async fn list_models(&self, _config: &LLMConfig) -> Result<Vec<String>> {
            Ok(vec!["models/canned".to_string()])
        }
    }

    fn app_state(dir: &tempfile::TempDir) -> Arc<AppState> {
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        Arc::new(AppState::with_client(config, Arc::new(CannedClient)))
    }

    fn state(dir: &tempfile::TempDir) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(app_state(dir)))
    }

    fn generate_request() -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "file_name": "login.txt",
                "content_base64": BASE64.encode("Users sign in with email and password."),
            }))
    }

    fn compare_request(session_id: &str) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/api/compare")
            .set_json(json!({
                "session_id": session_id,
                "manual": [{"id": "M1", "title": "Login", "precondition": "p", "steps": "s", "expected_result": "r"}],
            }))
    }

    #[actix_web::test]
    async fn test_generate_then_compare_in_session() {
        let dir = tempfile::tempdir().unwrap();
        let data = state(&dir);
        let app = actix_test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "file_name": "login.txt",
                "content_base64": BASE64.encode("Users sign in with email and password."),
            }))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(body["outcome"]["test_cases"].as_array().unwrap().len(), 2);
        assert_eq!(body["outcome"]["metrics"]["success"], true);

        let req = actix_test::TestRequest::post()
            .uri("/api/compare")
            .set_json(json!({
                "session_id": session_id,
                "manual": [{"id": "M1", "title": "Login", "precondition": "p", "steps": "s", "expected_result": "r"}],
                "name": "login-review",
            }))
            .to_request();
        let record: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(record["comparison_name"], "login-review");
        assert_eq!(record["differences"]["count_difference"], 1);

        let req = actix_test::TestRequest::get().uri("/api/comparisons").to_request();
        let saved: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(saved.as_array().unwrap().len(), 1);

        let req = actix_test::TestRequest::get().uri("/api/metrics/summary").to_request();
        let summary: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary["successful_runs"], 1);
        assert_eq!(summary["total_test_cases_generated"], 2);
    }

    #[actix_web::test]
    async fn test_compare_unknown_session_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(App::new().app_data(state(&dir)).configure(configure)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/compare")
            .set_json(json!({"session_id": "missing", "manual": []}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_unsupported_upload_is_422() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(App::new().app_data(state(&dir)).configure(configure)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "file_name": "budget.xlsx",
                "content_base64": BASE64.encode("cells"),
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = actix_test::TestRequest::get().uri("/api/metrics").to_request();
        let history: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(history[0]["success"], false);
    }

    #[actix_web::test]
    async fn test_evaluate_and_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(App::new().app_data(state(&dir)).configure(configure)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/evaluate")
            .set_json(json!([{"id": "TC001", "title": "t", "precondition": "p", "steps": "s", "expected_result": "r"}]))
            .to_request();
        let report: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["valid_structure"], 1);
        assert_eq!(report["coverage_score"], 100.0);

        let req = actix_test::TestRequest::get().uri("/api/metrics/summary").to_request();
        let summary: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert!(summary.is_null());
    }

    #[actix_web::test]
    async fn test_oldest_session_is_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let data = web::Data::new(HttpState::with_session_capacity(app_state(&dir), 2));
        let app =
            actix_test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let mut session_ids = Vec::new();
        for _ in 0..3 {
            let body: serde_json::Value =
                actix_test::call_and_read_body_json(&app, generate_request().to_request()).await;
            session_ids.push(body["session_id"].as_str().unwrap().to_string());
        }
        assert_eq!(data.sessions.lock().unwrap().len(), 2);

        let resp = actix_test::call_service(&app, compare_request(&session_ids[0]).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = actix_test::call_service(&app, compare_request(&session_ids[2]).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_regenerating_a_session_refreshes_it() {
        let mut store = SessionStore::new(2);
        store.record("a", Vec::new(), "first".to_string());
        store.record("b", Vec::new(), String::new());
        store.record("a", Vec::new(), "second".to_string());
        store.record("c", Vec::new(), String::new());

        assert!(store.get("b").is_none());
        assert_eq!(store.get("a").unwrap().requirement_text(), "second");
        assert!(store.get("c").is_some());
    }

    #[test]
    fn test_log_ring_is_bounded() {
        let logs = Mutex::new(VecDeque::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs.front().unwrap().message, "entry 5");
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&AppError::ValidationError("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&AppError::ResponseParseError {
                message: "x".into(),
                raw_response: "y".into()
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            error_status(&AppError::IoError("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
