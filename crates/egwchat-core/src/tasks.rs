use egwchat_types::NewTaskRequest;
use serde_json::Value;

use crate::error::{ClientError, Result};

pub const TASK_TITLE_REQUIRED: &str = "Title is required.";
pub const TASK_CREATING: &str = "Creating task...";
pub const TASK_CREATED: &str = "Task created successfully.";
pub const TASK_SESSION_EXPIRED: &str = "Session expired, please log in again.";
pub const TASK_CREATE_FAILED: &str = "Failed to create task";

/// Raw contents of the new task dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub due_date: String,
    pub description: String,
}

impl TaskDraft {
    pub fn new(
        title: impl Into<String>,
        due_date: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            due_date: due_date.into(),
            description: description.into(),
        }
    }

    /// Trimmed request body; blank optional fields are sent as null
    pub fn into_request(self) -> Result<NewTaskRequest> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ClientError::Validation(TASK_TITLE_REQUIRED.to_string()));
        }

        Ok(NewTaskRequest {
            title,
            due_date: non_blank(self.due_date),
            description: non_blank(self.description),
        })
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Message shown when the create call answered with a non-success status.
/// Prefers `result.message`, then `detail`.
pub fn task_failure_message(body: &Value) -> String {
    body.get("result")
        .and_then(|result| result.get("message"))
        .and_then(Value::as_str)
        .or_else(|| body.get("detail").and_then(Value::as_str))
        .unwrap_or(TASK_CREATE_FAILED)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_title_is_required() {
        let err = TaskDraft::new("   ", "2026-10-20", "").into_request().unwrap_err();
        assert_eq!(err, ClientError::Validation(TASK_TITLE_REQUIRED.to_string()));
    }

    #[test]
    fn test_blank_optional_fields_become_null() {
        let request = TaskDraft::new(" Call Anna ", "", "  ").into_request().unwrap();
        assert_eq!(
            request,
            NewTaskRequest {
                title: "Call Anna".to_string(),
                due_date: None,
                description: None,
            }
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"title": "Call Anna", "due_date": null, "description": null})
        );
    }

    #[test]
    fn test_full_draft() {
        let request = TaskDraft::new("Budget", "2026-10-20", "Q4 numbers")
            .into_request()
            .unwrap();
        assert_eq!(request.due_date.as_deref(), Some("2026-10-20"));
        assert_eq!(request.description.as_deref(), Some("Q4 numbers"));
    }

    #[test]
    fn test_failure_message_precedence() {
        assert_eq!(
            task_failure_message(&json!({"result": {"message": "No tracker"}, "detail": "x"})),
            "No tracker"
        );
        assert_eq!(task_failure_message(&json!({"detail": "Bad date"})), "Bad date");
        assert_eq!(task_failure_message(&json!({})), TASK_CREATE_FAILED);
        assert_eq!(task_failure_message(&Value::Null), TASK_CREATE_FAILED);
    }
}
