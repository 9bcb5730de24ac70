//! # egwchat-core
//!
//! Platform-independent client logic for the EGroupware assistant front ends.
//!
//! Nothing in this crate touches the network, the DOM or the terminal. The browser
//! front end (`egwchat-wasm`) and the terminal front end (`egwchat`) both drive the same
//! state machines and renderers from here:
//!
//! - **Turn controller**: [`PageSession`] follows one assistant turn from submission
//!   through streaming to quick-reply retrieval
//! - **Form validation**: [`LoginForm`] tracks per-field validity for the login form,
//!   including the debounced remote EGroupware URL check
//! - **Markup**: [`escape_html`] and [`render_markup`] turn untrusted stream text into HTML
//! - **Routing**: [`route`] decides which page to set up for a path and session state
//! - **Dashboard**: insight formatting and counter extraction
//!
//! ## Example
//!
//! ```rust
//! use egwchat_core::{PageSession, StreamEvent, StreamHandle, TurnEffect};
//!
//! struct Noop;
//! impl StreamHandle for Noop {
//!     fn close(&mut self) {}
//! }
//!
//! let mut session: PageSession<Noop> = PageSession::new();
//! session.submit("Hello", Some("token"), |_request| Ok(Noop)).unwrap();
//! session.handle_event(StreamEvent::Token { content: "Hi!".to_string() });
//! let effect = session.handle_event(StreamEvent::End);
//! assert!(matches!(effect, TurnEffect::FetchSuggestions { .. }));
//! ```

pub mod dashboard;
pub mod endpoints;
pub mod error;
pub mod events;
pub mod markup;
pub mod router;
pub mod session;
pub mod sse;
pub mod tasks;
pub mod transcript;
pub mod turn;
pub mod validation;
pub mod voice;

// Re-export commonly used types
pub use dashboard::{DashboardSnapshot, DateRange, InsightBody};
pub use endpoints::Endpoints;
pub use error::{ClientError, Result};
pub use events::StreamEvent;
pub use markup::{escape_html, render_markup, render_plain};
pub use router::{mount_prefix, page_for_path, route, Page, Route};
pub use session::{decode_claims, require_token, MemorySessionStore, SessionStore};
pub use sse::{SseDecoder, SseFrame};
pub use tasks::TaskDraft;
pub use transcript::{ChatEntry, EntryState, Role, Transcript};
pub use turn::{ChatRequest, PageSession, StreamHandle, SubmitOutcome, TurnEffect, TurnId, TurnState};
pub use validation::{validate, Field, FieldState, FieldStatus, LoginFields, LoginForm, UrlCheckTicket, ValidationReport};
pub use voice::{append_transcript, VoiceCapability};

pub use egwchat_types as types;
