use serde_json::json;
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-token";

/// Mock chatbot backend for exercising the API client
pub struct BackendMockServer {
    server: MockServer,
}

impl BackendMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn received_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }

    /// Mock successful login
    pub async fn mock_login_success(&self, username: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_partial_json(json!({ "username": username })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TEST_TOKEN,
                "token_type": "bearer"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock rejected login
    pub async fn mock_login_rejected(&self, detail: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": detail })))
            .mount(&self.server)
            .await;
    }

    /// Mock the chat stream with a raw SSE body
    pub async fn mock_chat_stream(&self, body: &str) {
        Mock::given(method("GET"))
            .and(path("/chat"))
            .and(query_param("token", TEST_TOKEN))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_suggestions(&self, suggestions: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/suggestions"))
            .and(query_param("token", TEST_TOKEN))
            .and(query_param("count", "4"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "suggestions": suggestions })),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_transcription(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": text })))
            .mount(&self.server)
            .await;
    }

    /// Mock the three dashboard endpoints; insights fail with 500
    pub async fn mock_dashboard_with_failing_insights(&self, events: usize, tasks: usize) {
        Mock::given(method("GET"))
            .and(path("/api/events"))
            .and(query_param("token", TEST_TOKEN))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": vec![json!({}); events] })),
            )
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .and(query_param("limit", "10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": vec![json!({}); tasks] })),
            )
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/ai-insights"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "LLM down" })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_insights(&self, summary: &str) {
        Mock::given(method("GET"))
            .and(path("/api/ai-insights"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": { "summary": summary } })),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_task_created(&self, title: &str) {
        Mock::given(method("POST"))
            .and(path("/api/tasks/create"))
            .and(query_param("token", TEST_TOKEN))
            .and(body_json(json!({
                "title": title,
                "due_date": null,
                "description": null
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": { "id": 42 } })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_task_rejected(&self, message: &str) {
        Mock::given(method("POST"))
            .and(path("/api/tasks/create"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "result": { "message": message } })),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_url_validation(&self, url: &str, valid: bool, detail: Option<&str>) {
        Mock::given(method("POST"))
            .and(path("/validate/egroupware-url"))
            .and(body_json(json!({ "url": url })))
            .respond_with(
                ResponseTemplate::new(if valid { 200 } else { 400 })
                    .set_body_json(json!({ "valid": valid, "detail": detail })),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_ai_key_validation(&self, api_key: &str, valid: bool, detail: Option<&str>) {
        Mock::given(method("POST"))
            .and(path("/validate/ai-key"))
            .and(body_partial_json(json!({ "api_key": api_key })))
            .respond_with(
                ResponseTemplate::new(if valid { 200 } else { 400 })
                    .set_body_json(json!({ "valid": valid, "detail": detail })),
            )
            .mount(&self.server)
            .await;
    }
}

/// SSE body for a turn streaming `parts` and then ending
pub fn sse_turn(parts: &[&str]) -> String {
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({ "type": "token", "content": part })
        ));
    }
    body.push_str("event: end\ndata: {}\n\n");
    body
}
