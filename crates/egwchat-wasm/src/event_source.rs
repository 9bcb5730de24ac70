use egwchat_core::events::END_EVENT;
use egwchat_core::{ClientError, Result, StreamEvent, StreamHandle};
use futures::stream::{self, AbortHandle, Abortable, LocalBoxStream};
use futures::StreamExt;
use gloo_net::eventsource::futures::EventSource;

/// Events of one chat turn, ending when the handle is closed
pub type ChatEvents = Abortable<LocalBoxStream<'static, Result<StreamEvent>>>;

/// Owner of the browser `EventSource` behind a turn
pub struct EventSourceHandle {
    source: Option<EventSource>,
    abort: AbortHandle,
}

impl StreamHandle for EventSourceHandle {
    fn close(&mut self) {
        self.abort.abort();
        if let Some(source) = self.source.take() {
            source.close();
        }
    }
}

/// Map one delivered SSE message onto a stream event.
///
/// Payloads that fail to decode are treated as unknown events so the turn keeps going.
pub fn classify(event_type: &str, data: Option<String>) -> StreamEvent {
    if event_type == END_EVENT {
        return StreamEvent::End;
    }
    let data = data.unwrap_or_default();
    StreamEvent::decode(Some(event_type), &data).unwrap_or_else(|e| {
        log::warn!("Dropping malformed stream event: {}", e);
        StreamEvent::Unknown
    })
}

/// Open `GET /chat` as an `EventSource` listening to default and `end` events
pub fn open_chat(url: &str) -> Result<(ChatEvents, EventSourceHandle)> {
    let mut source = EventSource::new(url).map_err(ClientError::transport)?;
    let messages = source.subscribe("message").map_err(ClientError::transport)?;
    let end = source.subscribe(END_EVENT).map_err(ClientError::transport)?;

    let events = stream::select(messages, end)
        .map(|item| match item {
            Ok((event_type, message)) => Ok(classify(&event_type, message.data().as_string())),
            Err(e) => Err(ClientError::transport(format!("chat stream failed: {:?}", e))),
        })
        .boxed_local();

    let (events, abort) = stream::abortable(events);
    Ok((
        events,
        EventSourceHandle {
            source: Some(source),
            abort,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_messages() {
        assert_eq!(
            classify("message", Some(r#"{"type":"token","content":"Hi"}"#.to_string())),
            StreamEvent::Token {
                content: "Hi".to_string()
            }
        );
        assert_eq!(
            classify("message", Some(r#"{"type":"tool_call","tool_name":"list_events"}"#.to_string())),
            StreamEvent::ToolCall {
                tool_name: "list_events".to_string()
            }
        );
        assert_eq!(classify("end", Some("{}".to_string())), StreamEvent::End);
        assert_eq!(classify("end", None), StreamEvent::End);
    }

    #[test]
    fn test_classify_malformed_payload_is_unknown() {
        assert_eq!(classify("message", Some("not json".to_string())), StreamEvent::Unknown);
        assert_eq!(classify("message", None), StreamEvent::Unknown);
    }
}
