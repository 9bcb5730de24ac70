//! # egwchat-api
//!
//! `reqwest` client for the EGroupware chatbot backend, used by the terminal front end.
//!
//! - **Login**: `POST /token` exchanging EGroupware and AI provider credentials for a token
//! - **Chat stream**: `GET /chat` decoded incrementally from server-sent events
//! - **Follow-ups**: quick-reply suggestions, transcription uploads, dashboard widgets
//! - **Session file**: the stored token, mirroring browser `localStorage`
//!
//! ## Example
//!
//! ```rust,no_run
//! use egwchat_api::ApiClient;
//! use egwchat_core::{ChatRequest, Endpoints, StreamEvent};
//! use futures::StreamExt;
//!
//! # async fn run() -> egwchat_core::Result<()> {
//! let client = ApiClient::new(Endpoints::new("http://localhost:8000"));
//! let request = ChatRequest {
//!     message: "What is on my calendar today?".to_string(),
//!     token: "stored-token".to_string(),
//! };
//!
//! let (mut events, _handle) = client.open_chat(&request);
//! while let Some(event) = events.next().await {
//!     if let StreamEvent::Token { content } = event? {
//!         print!("{}", content);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod session_file;
pub mod stream;

pub use client::ApiClient;
pub use session_file::FileSessionStore;
pub use stream::{AbortStream, ChatEventStream};
