use egwchat_core::dashboard::{insight_summary, result_count};
use egwchat_core::tasks::{task_failure_message, TASK_CREATED};
use egwchat_core::voice::{AUDIO_FILENAME, AUDIO_MIME};
use egwchat_core::{ClientError, DashboardSnapshot, DateRange, Endpoints, Result, TaskDraft};
use egwchat_logging::{log_request, log_response, log_response_to_file};
use egwchat_types::{
    AiKeyValidationRequest, ErrorDetail, LoginRequest, ResultEnvelope, SuggestionsResponse,
    TokenResponse, TranscriptionResponse, UrlValidationRequest, ValidationResponse,
    DASHBOARD_TASK_LIMIT,
};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

const LOGIN_FAILED: &str = "Login failed.";

/// Request fields never echoed to the console
const SECRET_FIELDS: [&str; 3] = ["password", "ai_key", "api_key"];

fn redacted<B: Serialize>(payload: &B, what: &'static str) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(payload).map_err(|e| ClientError::decode(what, e))?;
    if let Some(object) = value.as_object_mut() {
        for field in SECRET_FIELDS {
            if let Some(secret) = object.get_mut(field) {
                *secret = serde_json::Value::String("***".to_string());
            }
        }
    }
    Ok(value)
}

/// HTTP client for the chatbot backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) client: reqwest::Client,
    pub(crate) endpoints: Endpoints,
    pub(crate) verbose: bool,
}

impl ApiClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
            verbose: false,
        }
    }

    /// Print request, response and stream diagnostics to the console
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send a request and read the whole body, whatever the status
    async fn execute(
        &self,
        method: &str,
        url: &str,
        body: Option<serde_json::Value>,
        request: RequestBuilder,
    ) -> Result<(StatusCode, String)> {
        log_request(method, url, body.as_ref(), self.verbose);

        let response = request.send().await.map_err(ClientError::transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(ClientError::transport)?;

        log_response(&status, &headers, &text, self.verbose);
        if self.verbose && !status.is_success() {
            if let Ok(path) = log_response_to_file(method, url, &status, &headers, &text) {
                log::info!("Response logged to {}", path.display());
            }
        }

        Ok((status, text))
    }

    fn status_error(status: StatusCode, body: &str) -> ClientError {
        let message = serde_json::from_str::<ErrorDetail>(body)
            .ok()
            .and_then(|detail| detail.message())
            .unwrap_or_else(|| body.to_string());
        ClientError::Status {
            status: status.as_u16(),
            message,
        }
    }

    fn parse<T: DeserializeOwned>(what: &'static str, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| ClientError::decode(what, e))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String, what: &'static str) -> Result<T> {
        let (status, body) = self
            .execute("GET", &url, None, self.client.get(&url))
            .await?;
        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }
        Self::parse(what, &body)
    }

    /// POST to a `/validate/*` endpoint. The verdict is read from the body whatever the
    /// status, so a rejection carries its `detail`.
    async fn post_verdict<B: Serialize>(
        &self,
        url: String,
        payload: &B,
        what: &'static str,
    ) -> Result<ValidationResponse> {
        let body = redacted(payload, what)?;
        let (_, text) = self
            .execute("POST", &url, Some(body), self.client.post(&url).json(payload))
            .await?;
        Self::parse(what, &text)
    }

    /// Exchange credentials for a session token
    pub async fn login(&self, request: &LoginRequest) -> Result<String> {
        let url = self.endpoints.token();
        let logged = redacted(request, "login")?;

        let (status, body) = self
            .execute("POST", &url, Some(logged), self.client.post(&url).json(request))
            .await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorDetail>(&body)
                .ok()
                .and_then(|detail| detail.message())
                .unwrap_or_else(|| LOGIN_FAILED.to_string());
            return Err(ClientError::Authentication(message));
        }

        let token: TokenResponse = Self::parse("token response", &body)?;
        log::info!("Logged in as {}", request.username);
        Ok(token.access_token)
    }

    pub async fn suggestions(&self, token: &str, count: usize) -> Result<Vec<String>> {
        let response: SuggestionsResponse = self
            .get_json(self.endpoints.suggestions(token, count), "suggestions")
            .await?;
        Ok(response.suggestions)
    }

    /// Upload a recorded clip and return its transcription, if any
    pub async fn transcribe(&self, token: &str, audio: Vec<u8>) -> Result<Option<String>> {
        let url = self.endpoints.transcribe();
        let size = audio.len();

        let audio = reqwest::multipart::Part::bytes(audio)
            .file_name(AUDIO_FILENAME)
            .mime_str(AUDIO_MIME)
            .map_err(ClientError::transport)?;
        let form = reqwest::multipart::Form::new()
            .text("token", token.to_string())
            .part("audio", audio);

        let summary = serde_json::json!({ "token": "***", "audio": format!("<{} bytes>", size) });
        let (status, body) = self
            .execute("POST", &url, Some(summary), self.client.post(&url).multipart(form))
            .await?;
        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        let response: TranscriptionResponse = Self::parse("transcription", &body)?;
        Ok(response.text.filter(|text| !text.is_empty()))
    }

    pub async fn events_count(&self, range: &DateRange, token: &str) -> Result<usize> {
        let envelope: ResultEnvelope = self
            .get_json(self.endpoints.events(range, token), "events")
            .await?;
        Ok(result_count(&envelope))
    }

    pub async fn tasks_count(&self, token: &str) -> Result<usize> {
        let envelope: ResultEnvelope = self
            .get_json(self.endpoints.tasks(token, DASHBOARD_TASK_LIMIT), "tasks")
            .await?;
        Ok(result_count(&envelope))
    }

    pub async fn ai_insight(&self, token: &str) -> Result<String> {
        let envelope: ResultEnvelope = self
            .get_json(self.endpoints.ai_insights(token), "insights")
            .await?;
        Ok(insight_summary(&envelope))
    }

    /// Fetch all dashboard widgets. A failing widget is left empty and never
    /// affects the others.
    pub async fn load_dashboard(&self, token: &str, range: &DateRange) -> DashboardSnapshot {
        let (events, tasks, insight) = futures::join!(
            self.events_count(range, token),
            self.tasks_count(token),
            self.ai_insight(token),
        );

        DashboardSnapshot {
            events_today: events
                .inspect_err(|e| log::warn!("Failed to load events: {}", e))
                .ok(),
            open_tasks: tasks
                .inspect_err(|e| log::warn!("Failed to load tasks: {}", e))
                .ok(),
            insight: insight
                .inspect_err(|e| log::warn!("Failed to load insights: {}", e))
                .ok(),
        }
    }

    /// Create a task and return the confirmation text
    pub async fn create_task(&self, token: &str, draft: TaskDraft) -> Result<&'static str> {
        let request = draft.into_request()?;
        let url = self.endpoints.create_task(token);
        let body = serde_json::to_value(&request).map_err(|e| ClientError::decode("task", e))?;

        let (status, text) = self
            .execute("POST", &url, Some(body), self.client.post(&url).json(&request))
            .await?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: task_failure_message(&body),
            });
        }

        Ok(TASK_CREATED)
    }

    pub async fn validate_egroupware_url(&self, url: &str) -> Result<ValidationResponse> {
        let request = UrlValidationRequest {
            url: url.to_string(),
        };
        self.post_verdict(self.endpoints.validate_egroupware_url(), &request, "url validation")
            .await
    }

    pub async fn validate_ai_key(
        &self,
        api_key: &str,
        ionos_base_url: Option<&str>,
    ) -> Result<ValidationResponse> {
        let request = AiKeyValidationRequest {
            api_key: api_key.to_string(),
            ionos_base_url: ionos_base_url.map(str::to_string),
        };
        self.post_verdict(self.endpoints.validate_ai_key(), &request, "key validation")
            .await
    }
}
