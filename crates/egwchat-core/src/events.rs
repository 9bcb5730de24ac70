use egwchat_types::ChatEventPayload;

use crate::error::{ClientError, Result};
use crate::sse::SseFrame;

/// Name of the SSE event that completes a turn
pub const END_EVENT: &str = "end";

/// One event of a chat stream, decoded once at the stream boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Token { content: String },
    ToolCall { tool_name: String },
    ToolResult,
    End,
    /// Anything newer than this client understands
    Unknown,
}

impl StreamEvent {
    /// Decode an event from its SSE name and data.
    ///
    /// `None` and `"message"` are the unnamed default event carrying a JSON payload.
    pub fn decode(event: Option<&str>, data: &str) -> Result<Self> {
        match event {
            Some(END_EVENT) => Ok(StreamEvent::End),
            None | Some("message") => {
                let payload: ChatEventPayload = serde_json::from_str(data)
                    .map_err(|e| ClientError::decode("chat event", e))?;
                Ok(payload.into())
            }
            Some(other) => {
                log::debug!("Ignoring unrecognized stream event: {}", other);
                Ok(StreamEvent::Unknown)
            }
        }
    }

    pub fn from_frame(frame: &SseFrame) -> Result<Self> {
        Self::decode(frame.event.as_deref(), &frame.data)
    }
}

impl From<ChatEventPayload> for StreamEvent {
    fn from(payload: ChatEventPayload) -> Self {
        match payload {
            ChatEventPayload::Token { content } => StreamEvent::Token { content },
            ChatEventPayload::ToolCall { tool_name } => StreamEvent::ToolCall { tool_name },
            ChatEventPayload::ToolResult { .. } => StreamEvent::ToolResult,
            ChatEventPayload::Unknown => StreamEvent::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_default_events() {
        assert_eq!(
            StreamEvent::decode(None, r#"{"type":"token","content":"Hel"}"#).unwrap(),
            StreamEvent::Token { content: "Hel".to_string() }
        );
        assert_eq!(
            StreamEvent::decode(Some("message"), r#"{"type":"tool_call","tool_name":"list_events"}"#)
                .unwrap(),
            StreamEvent::ToolCall { tool_name: "list_events".to_string() }
        );
        assert_eq!(
            StreamEvent::decode(None, r#"{"type":"tool_result","result":"ok"}"#).unwrap(),
            StreamEvent::ToolResult
        );
        assert_eq!(
            StreamEvent::decode(None, r#"{"type":"usage","tokens":3}"#).unwrap(),
            StreamEvent::Unknown
        );
    }

    #[test]
    fn test_tool_result_with_structured_result() {
        assert_eq!(
            StreamEvent::decode(None, r#"{"type":"tool_result","result":{"events":[]}}"#).unwrap(),
            StreamEvent::ToolResult
        );
        assert_eq!(
            StreamEvent::decode(None, r#"{"type":"tool_result","result":[1,2]}"#).unwrap(),
            StreamEvent::ToolResult
        );
        assert_eq!(
            StreamEvent::decode(None, r#"{"type":"tool_result"}"#).unwrap(),
            StreamEvent::ToolResult
        );
    }

    #[test]
    fn test_decode_end_ignores_data() {
        assert_eq!(StreamEvent::decode(Some("end"), "{}").unwrap(), StreamEvent::End);
        assert_eq!(StreamEvent::decode(Some("end"), "").unwrap(), StreamEvent::End);
    }

    #[test]
    fn test_decode_named_unknown_event() {
        assert_eq!(StreamEvent::decode(Some("ping"), "").unwrap(), StreamEvent::Unknown);
    }

    #[test]
    fn test_decode_malformed_payload() {
        let err = StreamEvent::decode(None, "not json").unwrap_err();
        assert!(matches!(err, ClientError::Decode { what: "chat event", .. }));
    }
}
