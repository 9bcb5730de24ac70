//! Core types and structures for egwchat
//!
//! This crate provides the wire shapes exchanged with the assistant backend and the
//! static provider table shared by every egwchat crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Storage key holding the session token
pub const TOKEN_STORAGE_KEY: &str = "accessToken";

/// Number of quick replies requested after each turn
pub const DEFAULT_SUGGESTION_COUNT: usize = 4;

/// Task list cap used by the dashboard counter
pub const DASHBOARD_TASK_LIMIT: usize = 10;

/// Delay after the last keystroke before the EGroupware URL is checked remotely
pub const URL_CHECK_DEBOUNCE_MS: u32 = 500;

/// Delay before the task dialog closes after a successful creation
pub const TASK_DIALOG_CLOSE_DELAY_MS: u32 = 800;

/// Path prefix used when the backend is mounted below the site root
pub const MOUNT_PREFIX: &str = "/chatbot";

/// Login page path (relative to the mount prefix)
pub const LOGIN_PATH: &str = "/";

/// Chat page path (relative to the mount prefix)
pub const CHAT_PATH: &str = "/chat-ui";

// ============================================================================
// Providers
// ============================================================================

/// AI providers selectable on the login form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Ionos,
    Github,
    OpenRouter,
    Anthropic,
    Azure,
}

/// Shape a provider credential must have before the form accepts it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// Any non-empty value
    NonEmpty,
    /// Must start with one of the listed prefixes
    Prefixed(&'static [&'static str]),
}

impl KeyFormat {
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            KeyFormat::NonEmpty => !key.is_empty(),
            KeyFormat::Prefixed(prefixes) => prefixes.iter().any(|p| key.starts_with(p)),
        }
    }
}

/// Static per-provider settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderConfig {
    pub requires_endpoint_url: bool,
    pub key_format: KeyFormat,
    pub default_endpoint_url: Option<&'static str>,
    pub key_hint: &'static str,
    pub endpoint_hint: Option<&'static str>,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::OpenAi,
        Provider::Ionos,
        Provider::Github,
        Provider::OpenRouter,
        Provider::Anthropic,
        Provider::Azure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Ionos => "ionos",
            Provider::Github => "github",
            Provider::OpenRouter => "openrouter",
            Provider::Anthropic => "anthropic",
            Provider::Azure => "azure",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "ionos" => Some(Provider::Ionos),
            "github" => Some(Provider::Github),
            "openrouter" => Some(Provider::OpenRouter),
            "anthropic" => Some(Provider::Anthropic),
            "azure" => Some(Provider::Azure),
            _ => None,
        }
    }

    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::OpenAi => ProviderConfig {
                requires_endpoint_url: false,
                key_format: KeyFormat::Prefixed(&["sk-"]),
                default_endpoint_url: None,
                key_hint: "Enter your OpenAI API key (starts with sk-)",
                endpoint_hint: None,
            },
            Provider::Ionos => ProviderConfig {
                requires_endpoint_url: true,
                key_format: KeyFormat::NonEmpty,
                default_endpoint_url: Some("https://openai.inference.de-txl.ionos.com/v1"),
                key_hint: "Enter your IONOS API key",
                endpoint_hint: Some("IONOS API endpoint"),
            },
            Provider::Github => ProviderConfig {
                requires_endpoint_url: true,
                key_format: KeyFormat::Prefixed(&["ghp_", "github_pat_"]),
                default_endpoint_url: Some("https://models.github.ai/inference"),
                key_hint: "Enter your GitHub Personal Access Token",
                endpoint_hint: Some("GitHub AI models endpoint"),
            },
            Provider::OpenRouter => ProviderConfig {
                requires_endpoint_url: true,
                key_format: KeyFormat::NonEmpty,
                default_endpoint_url: Some("https://openrouter.ai/api/v1"),
                key_hint: "Enter your OpenRouter API key",
                endpoint_hint: Some("OpenRouter API endpoint"),
            },
            Provider::Anthropic => ProviderConfig {
                requires_endpoint_url: false,
                key_format: KeyFormat::Prefixed(&["sk-ant-"]),
                default_endpoint_url: None,
                key_hint: "Enter your Anthropic API key",
                endpoint_hint: None,
            },
            Provider::Azure => ProviderConfig {
                requires_endpoint_url: true,
                key_format: KeyFormat::NonEmpty,
                default_endpoint_url: Some("https://your-resource-name.openai.azure.com"),
                key_hint: "Enter your Azure OpenAI API key",
                endpoint_hint: Some("Azure OpenAI endpoint"),
            },
        }
    }

    /// Voice input is only wired up for OpenAI sessions
    pub fn supports_voice(&self) -> bool {
        matches!(self, Provider::OpenAi)
    }
}

impl Default for Provider {
    fn default() -> Self {
        Provider::OpenAi
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Body of `POST /token`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub egw_url: String,
    pub ai_key: String,
    pub provider_type: Provider,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_url: Option<String>,
    pub username: String,
    pub password: String,
}

/// Successful `POST /token` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Error body returned by the backend on non-2xx responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorDetail {
    /// Flatten `detail` into display text; validation errors arrive as arrays
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Claims carried in the JWT payload segment of the session token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

// ============================================================================
// Chat stream
// ============================================================================

/// JSON payload of an unnamed chat stream event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEventPayload {
    Token {
        content: String,
    },
    ToolCall {
        tool_name: String,
    },
    ToolResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
    },
    #[serde(other)]
    Unknown,
}

/// `GET /suggestions` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// `POST /transcribe` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default)]
    pub text: Option<String>,
}

// ============================================================================
// Validation endpoints
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlValidationRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiKeyValidationRequest {
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ionos_base_url: Option<String>,
}

/// Response of both `/validate/*` endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub detail: Option<String>,
}

// ============================================================================
// Dashboard
// ============================================================================

/// `{ "result": ... }` envelope used by every `/api/*` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub detail: Option<Value>,
}

/// Body of `POST /api/tasks/create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTaskRequest {
    pub title: String,
    pub due_date: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_provider_round_trip_names() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(Provider::from_str(" OpenAI "), Some(Provider::OpenAi));
        assert_eq!(Provider::from_str("mistral"), None);
    }

    #[test]
    fn test_key_formats() {
        assert!(Provider::OpenAi.config().key_format.accepts("sk-abc"));
        assert!(!Provider::OpenAi.config().key_format.accepts("abc"));
        assert!(Provider::Github.config().key_format.accepts("github_pat_1"));
        assert!(Provider::Github.config().key_format.accepts("ghp_1"));
        assert!(!Provider::Github.config().key_format.accepts("gho_1"));
        assert!(Provider::Anthropic.config().key_format.accepts("sk-ant-1"));
        assert!(!Provider::Anthropic.config().key_format.accepts("sk-1"));
        assert!(Provider::Azure.config().key_format.accepts("x"));
        assert!(!Provider::Azure.config().key_format.accepts(""));
    }

    #[test]
    fn test_endpoint_required_providers_have_defaults() {
        for provider in Provider::ALL {
            let config = provider.config();
            assert_eq!(config.requires_endpoint_url, config.default_endpoint_url.is_some());
        }
    }

    #[test]
    fn test_login_request_omits_base_url_when_absent() {
        let request = LoginRequest {
            egw_url: "https://egw.example.org/egroupware".to_string(),
            ai_key: "sk-test".to_string(),
            provider_type: Provider::OpenAi,
            base_url: None,
            username: "demo".to_string(),
            password: "secret".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["provider_type"], json!("openai"));
        assert!(value.get("base_url").is_none());
    }

    #[test]
    fn test_chat_event_payloads() {
        let token: ChatEventPayload =
            serde_json::from_value(json!({"type": "token", "content": "Hi"})).unwrap();
        assert_eq!(token, ChatEventPayload::Token { content: "Hi".to_string() });

        let call: ChatEventPayload =
            serde_json::from_value(json!({"type": "tool_call", "tool_name": "list_events"})).unwrap();
        assert_eq!(call, ChatEventPayload::ToolCall { tool_name: "list_events".to_string() });

        let result: ChatEventPayload =
            serde_json::from_value(json!({"type": "tool_result"})).unwrap();
        assert_eq!(result, ChatEventPayload::ToolResult { result: None });

        let unknown: ChatEventPayload =
            serde_json::from_value(json!({"type": "heartbeat", "at": 1})).unwrap();
        assert_eq!(unknown, ChatEventPayload::Unknown);
    }

    #[test]
    fn test_error_detail_message() {
        let plain: ErrorDetail = serde_json::from_value(json!({"detail": "Invalid"})).unwrap();
        assert_eq!(plain.message().as_deref(), Some("Invalid"));

        let empty: ErrorDetail = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.message(), None);
    }
}
