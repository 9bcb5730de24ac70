use url::form_urlencoded;

use crate::dashboard::DateRange;
use crate::router::{create_url, mount_prefix};

/// Builds every backend URL from one base.
///
/// The base is the mount prefix in the browser (`""` or `"/chatbot"`) and an absolute
/// origin plus prefix on the terminal side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Endpoints relative to the page the browser is on
    pub fn for_pathname(pathname: &str) -> Self {
        Self::new(mount_prefix(pathname))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        create_url(&self.base, path)
    }

    fn with_query(&self, path: &str, params: &[(&str, &str)]) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        format!("{}?{}", self.url(path), query)
    }

    pub fn login_page(&self) -> String {
        self.url(egwchat_types::LOGIN_PATH)
    }

    pub fn chat_page(&self) -> String {
        self.url(egwchat_types::CHAT_PATH)
    }

    pub fn token(&self) -> String {
        self.url("/token")
    }

    pub fn chat(&self, message: &str, token: &str) -> String {
        self.with_query("/chat", &[("message", message), ("token", token)])
    }

    pub fn transcribe(&self) -> String {
        self.url("/transcribe")
    }

    pub fn suggestions(&self, token: &str, count: usize) -> String {
        let count = count.to_string();
        self.with_query("/suggestions", &[("token", token), ("count", count.as_str())])
    }

    pub fn events(&self, range: &DateRange, token: &str) -> String {
        self.with_query(
            "/api/events",
            &[
                ("start_date", range.start.as_str()),
                ("end_date", range.end.as_str()),
                ("token", token),
            ],
        )
    }

    pub fn tasks(&self, token: &str, limit: usize) -> String {
        let limit = limit.to_string();
        self.with_query("/api/tasks", &[("token", token), ("limit", limit.as_str())])
    }

    pub fn ai_insights(&self, token: &str) -> String {
        self.with_query("/api/ai-insights", &[("token", token)])
    }

    pub fn create_task(&self, token: &str) -> String {
        self.with_query("/api/tasks/create", &[("token", token)])
    }

    pub fn validate_egroupware_url(&self) -> String {
        self.url("/validate/egroupware-url")
    }

    pub fn validate_ai_key(&self) -> String {
        self.url("/validate/ai-key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_endpoints() {
        let endpoints = Endpoints::for_pathname("/chatbot/chat-ui");
        assert_eq!(endpoints.token(), "/chatbot/token");
        assert_eq!(endpoints.chat_page(), "/chatbot/chat-ui");
        assert_eq!(endpoints.login_page(), "/chatbot/");

        let root = Endpoints::for_pathname("/chat-ui");
        assert_eq!(root.transcribe(), "/transcribe");
    }

    #[test]
    fn test_query_parameters_are_encoded() {
        let endpoints = Endpoints::new("http://localhost:8000/");
        assert_eq!(
            endpoints.chat("What's on today? & tomorrow", "a.b=c"),
            "http://localhost:8000/chat?message=What%27s+on+today%3F+%26+tomorrow&token=a.b%3Dc"
        );
        assert_eq!(
            endpoints.suggestions("t", 4),
            "http://localhost:8000/suggestions?token=t&count=4"
        );
    }

    #[test]
    fn test_dashboard_endpoints() {
        let endpoints = Endpoints::new("");
        let range = DateRange {
            start: "2026-10-16".to_string(),
            end: "2026-10-16".to_string(),
        };
        assert_eq!(
            endpoints.events(&range, "t"),
            "/api/events?start_date=2026-10-16&end_date=2026-10-16&token=t"
        );
        assert_eq!(endpoints.tasks("t", 10), "/api/tasks?token=t&limit=10");
        assert_eq!(endpoints.ai_insights("t"), "/api/ai-insights?token=t");
        assert_eq!(endpoints.create_task("t"), "/api/tasks/create?token=t");
    }
}
