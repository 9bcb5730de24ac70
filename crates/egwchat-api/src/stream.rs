use std::pin::Pin;

use async_stream::stream;
use egwchat_core::{ChatRequest, ClientError, Result, SseDecoder, StreamEvent, StreamHandle};
use egwchat_logging::{log_request, log_stream_event};
use futures::stream::{abortable, AbortHandle, Abortable};
use futures::Stream;
use futures_util::StreamExt;

use crate::client::ApiClient;

/// Decoded events of one chat turn
pub type ChatEventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Closing the handle makes the paired stream end at its next poll
#[derive(Debug, Clone)]
pub struct AbortStream {
    handle: AbortHandle,
}

impl AbortStream {
    pub fn is_closed(&self) -> bool {
        self.handle.is_aborted()
    }
}

impl StreamHandle for AbortStream {
    fn close(&mut self) {
        self.handle.abort();
    }
}

impl ApiClient {
    /// Open the event stream for `request`.
    ///
    /// Nothing is sent until the stream is first polled. Malformed payloads arrive as
    /// [`StreamEvent::Unknown`]. A stream that ends without the `end` event reports a
    /// transport error.
    pub fn open_chat(&self, request: &ChatRequest) -> (Abortable<ChatEventStream>, AbortStream) {
        let client = self.client.clone();
        let url = self.endpoints.chat(&request.message, &request.token);
        let verbose = self.verbose;

        let events = stream! {
            log_request("GET", &url, None, verbose);

            let response = match client
                .get(&url)
                .header("Accept", "text/event-stream")
                .header("Cache-Control", "no-cache")
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    yield Err(ClientError::transport(e));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                yield Err(ClientError::Status { status: status.as_u16(), message });
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            let mut received = 0usize;

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ClientError::transport(e));
                        return;
                    }
                };

                for frame in decoder.feed(&chunk) {
                    received += 1;
                    log_stream_event(received, frame.event.as_deref(), &frame.data, verbose);

                    match StreamEvent::from_frame(&frame) {
                        Ok(StreamEvent::End) => {
                            yield Ok(StreamEvent::End);
                            return;
                        }
                        Ok(event) => yield Ok(event),
                        Err(e) => {
                            log::warn!("Dropping malformed stream event: {}", e);
                            yield Ok(StreamEvent::Unknown);
                        }
                    }
                }
            }

            yield Err(ClientError::Transport("chat stream closed before completion".to_string()));
        };

        let events: ChatEventStream = Box::pin(events);
        let (stream, handle) = abortable(events);
        (stream, AbortStream { handle })
    }
}
