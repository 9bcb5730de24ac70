//! Backend calls made from the browser with `gloo-net`.

use egwchat_core::dashboard::{insight_summary, result_count};
use egwchat_core::tasks::{task_failure_message, TASK_CREATED};
use egwchat_core::voice::AUDIO_FILENAME;
use egwchat_core::{ClientError, DashboardSnapshot, DateRange, Endpoints, Result};
use egwchat_types::{
    ErrorDetail, LoginRequest, NewTaskRequest, ResultEnvelope, SuggestionsResponse, TokenResponse,
    TranscriptionResponse, UrlValidationRequest, ValidationResponse, DASHBOARD_TASK_LIMIT,
};
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use web_sys::{Blob, FormData};

/// Relative-URL client for the backend the page was served from
#[derive(Debug, Clone)]
pub struct Backend {
    endpoints: Endpoints,
}

async fn parse<T: DeserializeOwned>(response: &Response, what: &'static str) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::decode(what, e))
}

async fn get_json<T: DeserializeOwned>(url: &str, what: &'static str) -> Result<T> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(ClientError::transport)?;
    if !response.ok() {
        return Err(ClientError::Status {
            status: response.status(),
            message: response.status_text(),
        });
    }
    parse(&response, what).await
}

impl Backend {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// `POST /token`; returns the session token
    pub async fn login(&self, request: &LoginRequest) -> Result<String> {
        let response = Request::post(&self.endpoints.token())
            .json(request)
            .map_err(|e| ClientError::decode("login request", e))?
            .send()
            .await
            .map_err(ClientError::transport)?;

        if !response.ok() {
            let detail = response
                .json::<ErrorDetail>()
                .await
                .ok()
                .and_then(|body| body.message());
            return Err(ClientError::Authentication(
                detail.unwrap_or_else(|| "Login failed.".to_string()),
            ));
        }

        let body: TokenResponse = parse(&response, "login response").await?;
        Ok(body.access_token)
    }

    /// `POST /validate/egroupware-url`. The verdict is read from the body whatever the status.
    pub async fn validate_egroupware_url(&self, url: &str) -> Result<ValidationResponse> {
        let body = UrlValidationRequest {
            url: url.to_string(),
        };
        let response = Request::post(&self.endpoints.validate_egroupware_url())
            .json(&body)
            .map_err(|e| ClientError::decode("validation request", e))?
            .send()
            .await
            .map_err(ClientError::transport)?;
        parse(&response, "validation response").await
    }

    pub async fn suggestions(&self, token: &str, count: usize) -> Result<Vec<String>> {
        let body: SuggestionsResponse =
            get_json(&self.endpoints.suggestions(token, count), "suggestions").await?;
        Ok(body.suggestions)
    }

    /// `POST /transcribe` with the recorded clip
    pub async fn transcribe(&self, token: &str, audio: &Blob) -> Result<Option<String>> {
        let form = FormData::new().map_err(|e| ClientError::transport(format!("{:?}", e)))?;
        form.append_with_str("token", token)
            .and_then(|_| form.append_with_blob_and_filename("audio", audio, AUDIO_FILENAME))
            .map_err(|e| ClientError::transport(format!("{:?}", e)))?;

        let response = Request::post(&self.endpoints.transcribe())
            .body(form)
            .map_err(ClientError::transport)?
            .send()
            .await
            .map_err(ClientError::transport)?;
        if !response.ok() {
            return Err(ClientError::Status {
                status: response.status(),
                message: "Transcription failed".to_string(),
            });
        }

        let body: TranscriptionResponse = parse(&response, "transcription").await?;
        Ok(body.text.filter(|text| !text.is_empty()))
    }

    pub async fn events_count(&self, range: &DateRange, token: &str) -> Result<usize> {
        let body: ResultEnvelope = get_json(&self.endpoints.events(range, token), "events").await?;
        Ok(result_count(&body))
    }

    pub async fn tasks_count(&self, token: &str) -> Result<usize> {
        let body: ResultEnvelope =
            get_json(&self.endpoints.tasks(token, DASHBOARD_TASK_LIMIT), "tasks").await?;
        Ok(result_count(&body))
    }

    pub async fn ai_insight(&self, token: &str) -> Result<String> {
        let body: ResultEnvelope =
            get_json(&self.endpoints.ai_insights(token), "ai insights").await?;
        Ok(insight_summary(&body))
    }

    /// Fetch every dashboard widget concurrently; each failure only blanks its own widget
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

    /// `POST /api/tasks/create`; returns the confirmation to show
    pub async fn create_task(&self, token: &str, task: &NewTaskRequest) -> Result<&'static str> {
        let response = Request::post(&self.endpoints.create_task(token))
            .json(task)
            .map_err(|e| ClientError::decode("task request", e))?
            .send()
            .await
            .map_err(ClientError::transport)?;

        if !response.ok() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(ClientError::Status {
                status: response.status(),
                message: task_failure_message(&body),
            });
        }
        Ok(TASK_CREATED)
    }
}
