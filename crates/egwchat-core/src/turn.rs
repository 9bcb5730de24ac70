//! Lifecycle of assistant turns on the chat page.
//!
//! A [`PageSession`] is built once per page load and handed to every handler. It owns the
//! one open stream handle, the transcript and the quick-reply set, so nothing about a turn
//! lives in free-floating globals.

use egwchat_types::{DEFAULT_SUGGESTION_COUNT, LOGIN_PATH};

use crate::error::{ClientError, Result, STREAM_ERROR_MESSAGE};
use crate::events::StreamEvent;
use crate::session::SessionStore;
use crate::transcript::{ChatEntry, EntryState, Transcript};

/// An open chat stream that can be shut down
pub trait StreamHandle {
    /// Stop delivering events. Only ever called once per handle.
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    /// Stream opened, nothing received yet
    Awaiting,
    Streaming,
    /// Stream ended, quick replies requested
    Finalizing,
    Errored,
}

/// Identifies one turn; results for an older turn are discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnId(u64);

/// Parameters for opening the chat stream of a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened
    Ignored,
    Started(TurnId),
}

/// Follow-up work the caller has to schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEffect {
    None,
    FetchSuggestions { turn: TurnId, count: usize },
}

pub struct PageSession<H: StreamHandle> {
    transcript: Transcript,
    state: TurnState,
    stream: Option<H>,
    first_chunk: bool,
    turn: u64,
    active_entry: Option<usize>,
    quick_replies: Vec<String>,
}

impl<H: StreamHandle> Default for PageSession<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: StreamHandle> PageSession<H> {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            state: TurnState::Idle,
            stream: None,
            first_chunk: false,
            turn: 0,
            active_entry: None,
            quick_replies: Vec::new(),
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn current_turn(&self) -> TurnId {
        TurnId(self.turn)
    }

    /// Index of the assistant bubble of the current turn
    pub fn active_entry_index(&self) -> Option<usize> {
        self.active_entry
    }

    pub fn active_entry(&self) -> Option<&ChatEntry> {
        self.active_entry.and_then(|i| self.transcript.get(i))
    }

    pub fn quick_replies(&self) -> &[String] {
        &self.quick_replies
    }

    pub fn quick_reply(&self, index: usize) -> Option<&str> {
        self.quick_replies.get(index).map(String::as_str)
    }

    pub fn has_open_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Start a turn for `input`.
    ///
    /// Blank input is ignored. Without a token the session has expired. Any stream still
    /// open from an earlier turn is closed before `open` is asked for the new one.
    pub fn submit<F>(&mut self, input: &str, token: Option<&str>, open: F) -> Result<SubmitOutcome>
    where
        F: FnOnce(&ChatRequest) -> Result<H>,
    {
        let message = input.trim();
        if message.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ClientError::SessionExpired)?;

        self.close_stream();
        self.quick_replies.clear();

        self.transcript.push_user(message);
        let index = self.transcript.push_assistant_placeholder();

        self.turn += 1;
        self.first_chunk = true;
        self.active_entry = Some(index);
        self.state = TurnState::Awaiting;

        let request = ChatRequest {
            message: message.to_string(),
            token: token.to_string(),
        };

        log::debug!("Opening chat stream for turn {}", self.turn);
        match open(&request) {
            Ok(handle) => {
                self.stream = Some(handle);
                Ok(SubmitOutcome::Started(TurnId(self.turn)))
            }
            Err(e) => {
                log::error!("Failed to open chat stream: {}", e);
                self.fail_active_entry();
                self.state = TurnState::Errored;
                Err(e)
            }
        }
    }

    /// Apply one event of the current stream
    pub fn handle_event(&mut self, event: StreamEvent) -> TurnEffect {
        if !matches!(self.state, TurnState::Awaiting | TurnState::Streaming) {
            log::debug!("Ignoring stream event outside an active turn: {:?}", event);
            return TurnEffect::None;
        }

        self.clear_placeholder_once();

        match event {
            StreamEvent::Token { content } => {
                if let Some(entry) = self.active_entry_mut() {
                    entry.main_text.push_str(&content);
                }
            }
            StreamEvent::ToolCall { tool_name } => {
                if let Some(entry) = self.active_entry_mut() {
                    entry.status_log.push(format!("Using tool: {}", tool_name));
                }
            }
            StreamEvent::ToolResult => {
                if let Some(entry) = self.active_entry_mut() {
                    entry.status_log.push("Tool finished.".to_string());
                }
            }
            StreamEvent::Unknown => {}
            StreamEvent::End => {
                self.close_stream();
                if let Some(entry) = self.active_entry_mut() {
                    entry.state = EntryState::Complete;
                }
                self.state = TurnState::Finalizing;
                return TurnEffect::FetchSuggestions {
                    turn: TurnId(self.turn),
                    count: DEFAULT_SUGGESTION_COUNT,
                };
            }
        }

        TurnEffect::None
    }

    /// The stream failed while the turn was still in flight.
    ///
    /// Returns whether the failure affected the turn; late errors after completion only
    /// make sure the handle is closed.
    pub fn handle_transport_error(&mut self) -> bool {
        self.close_stream();

        if !matches!(self.state, TurnState::Awaiting | TurnState::Streaming) {
            return false;
        }

        self.first_chunk = false;
        self.fail_active_entry();
        self.state = TurnState::Errored;
        true
    }

    /// Install quick replies fetched for `turn`.
    ///
    /// Returns whether the set changed. An empty list keeps whatever is shown.
    pub fn apply_suggestions(&mut self, turn: TurnId, suggestions: Vec<String>) -> bool {
        if turn != self.current_turn() {
            log::debug!("Discarding suggestions for superseded turn {:?}", turn);
            return false;
        }

        if self.state == TurnState::Finalizing {
            self.state = TurnState::Idle;
        }

        if suggestions.is_empty() {
            return false;
        }

        self.quick_replies = suggestions;
        true
    }

    /// Suggestion fetch for `turn` failed; the turn still ends normally
    pub fn suggestions_failed(&mut self, turn: TurnId) {
        if turn == self.current_turn() && self.state == TurnState::Finalizing {
            self.state = TurnState::Idle;
        }
    }

    /// Close the stream, then drop the stored token.
    ///
    /// Returns the path to navigate to; the caller navigates only after this returns.
    pub fn logout(&mut self, store: &mut dyn SessionStore) -> Result<&'static str> {
        self.close_stream();
        store.clear()?;
        self.state = TurnState::Idle;
        Ok(LOGIN_PATH)
    }

    /// Close the open stream, if any. Safe to call repeatedly.
    pub fn close_stream(&mut self) {
        if let Some(mut handle) = self.stream.take() {
            log::debug!("Closing chat stream of turn {}", self.turn);
            handle.close();
        }
    }

    fn clear_placeholder_once(&mut self) {
        if !self.first_chunk {
            return;
        }
        self.first_chunk = false;
        self.state = TurnState::Streaming;
        if let Some(entry) = self.active_entry_mut() {
            entry.main_text.clear();
            entry.state = EntryState::Streaming;
        }
    }

    fn fail_active_entry(&mut self) {
        if let Some(entry) = self.active_entry_mut() {
            entry.main_text = STREAM_ERROR_MESSAGE.to_string();
            entry.state = EntryState::Failed;
        }
    }

    fn active_entry_mut(&mut self) -> Option<&mut ChatEntry> {
        let index = self.active_entry?;
        self.transcript.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::render_markup;
    use crate::session::MemorySessionStore;
    use crate::transcript::Role;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Stream handle that records every close
    struct RecordingHandle {
        log: Log,
    }

    impl StreamHandle for RecordingHandle {
        fn close(&mut self) {
            self.log.borrow_mut().push("close".to_string());
        }
    }

    /// Store that records when the token gets cleared
    struct RecordingStore {
        inner: MemorySessionStore,
        log: Log,
    }

    impl SessionStore for RecordingStore {
        fn load(&self) -> Option<String> {
            self.inner.load()
        }

        fn save(&mut self, token: &str) -> Result<()> {
            self.inner.save(token)
        }

        fn clear(&mut self) -> Result<()> {
            self.log.borrow_mut().push("clear".to_string());
            self.inner.clear()
        }
    }

    fn new_session() -> (PageSession<RecordingHandle>, Log) {
        (PageSession::new(), Rc::new(RefCell::new(Vec::new())))
    }

    fn start_turn(session: &mut PageSession<RecordingHandle>, log: &Log, text: &str) -> TurnId {
        let log = log.clone();
        match session
            .submit(text, Some("token"), move |_| Ok(RecordingHandle { log }))
            .unwrap()
        {
            SubmitOutcome::Started(turn) => turn,
            SubmitOutcome::Ignored => panic!("turn was not started"),
        }
    }

    fn token(content: &str) -> StreamEvent {
        StreamEvent::Token {
            content: content.to_string(),
        }
    }

    fn closes(log: &Log) -> usize {
        log.borrow().iter().filter(|e| *e == "close").count()
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let (mut session, _log) = new_session();
        let outcome = session
            .submit("   \n", Some("token"), |_| -> Result<RecordingHandle> {
                panic!("no stream for blank input")
            })
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(session.transcript().is_empty());
        assert_eq!(session.state(), TurnState::Idle);
    }

    #[test]
    fn test_submit_without_token_is_session_expired() {
        let (mut session, _log) = new_session();
        let err = session
            .submit("hi", None, |_| -> Result<RecordingHandle> {
                panic!("no stream without a token")
            })
            .unwrap_err();
        assert_eq!(err, ClientError::SessionExpired);
        assert!(!session.has_open_stream());
    }

    #[test]
    fn test_submit_passes_trimmed_message_and_token() {
        let (mut session, log) = new_session();
        let mut seen = None;
        session
            .submit("  What is on today?  ", Some("tok"), |request| {
                seen = Some(request.clone());
                Ok(RecordingHandle { log: log.clone() })
            })
            .unwrap();

        assert_eq!(
            seen,
            Some(ChatRequest {
                message: "What is on today?".to_string(),
                token: "tok".to_string(),
            })
        );
        assert_eq!(session.state(), TurnState::Awaiting);
        let entries = session.transcript().entries();
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].main_text, "What is on today?");
        assert_eq!(entries[1].state, EntryState::Placeholder);
    }

    #[test]
    fn test_tokens_render_then_suggestions_fetched_once() {
        let (mut session, log) = new_session();
        let turn = start_turn(&mut session, &log, "Say hello");

        assert_eq!(session.handle_event(token("Hel")), TurnEffect::None);
        assert_eq!(session.state(), TurnState::Streaming);
        assert_eq!(session.handle_event(token("lo")), TurnEffect::None);

        let effect = session.handle_event(StreamEvent::End);
        assert_eq!(
            effect,
            TurnEffect::FetchSuggestions {
                turn,
                count: DEFAULT_SUGGESTION_COUNT
            }
        );
        assert_eq!(session.state(), TurnState::Finalizing);
        assert_eq!(closes(&log), 1);

        let entry = session.active_entry().unwrap();
        assert_eq!(entry.main_text, "Hello");
        assert_eq!(entry.main_html(), render_markup("Hello"));

        // Anything after the end is ignored and never asks for suggestions again
        assert_eq!(session.handle_event(StreamEvent::End), TurnEffect::None);
        assert_eq!(session.handle_event(token("late")), TurnEffect::None);
        assert_eq!(session.active_entry().unwrap().main_text, "Hello");
    }

    #[test]
    fn test_tool_events_only_touch_status_log() {
        let (mut session, log) = new_session();
        start_turn(&mut session, &log, "Book a meeting");

        session.handle_event(token("Checking"));
        session.handle_event(StreamEvent::ToolCall {
            tool_name: "create_event".to_string(),
        });
        session.handle_event(StreamEvent::ToolResult);
        session.handle_event(StreamEvent::Unknown);

        let entry = session.active_entry().unwrap();
        assert_eq!(entry.main_text, "Checking");
        assert_eq!(
            entry.status_log,
            vec!["Using tool: create_event".to_string(), "Tool finished.".to_string()]
        );
    }

    #[test]
    fn test_placeholder_cleared_once() {
        let (mut session, log) = new_session();
        start_turn(&mut session, &log, "hi");

        // Two events back to back; the second must not wipe what the first appended
        session.handle_event(token("A"));
        session.handle_event(token("B"));
        assert_eq!(session.active_entry().unwrap().main_text, "AB");
        assert_eq!(session.active_entry().unwrap().state, EntryState::Streaming);
    }

    #[test]
    fn test_first_event_can_be_a_tool_call() {
        let (mut session, log) = new_session();
        start_turn(&mut session, &log, "hi");

        session.handle_event(StreamEvent::ToolCall {
            tool_name: "list_events".to_string(),
        });
        let entry = session.active_entry().unwrap();
        assert_eq!(entry.state, EntryState::Streaming);
        assert_eq!(entry.main_text, "");
    }

    #[test]
    fn test_transport_error_while_awaiting() {
        let (mut session, log) = new_session();
        start_turn(&mut session, &log, "hi");

        assert!(session.handle_transport_error());
        assert_eq!(session.state(), TurnState::Errored);
        assert_eq!(closes(&log), 1);

        let entry = session.active_entry().unwrap();
        assert_eq!(entry.state, EntryState::Failed);
        assert_eq!(entry.main_text, STREAM_ERROR_MESSAGE);

        // A second error report is a no-op
        assert!(!session.handle_transport_error());
        session.close_stream();
        assert_eq!(closes(&log), 1);

        // No suggestions for an errored turn
        assert_eq!(session.handle_event(StreamEvent::End), TurnEffect::None);
    }

    #[test]
    fn test_transport_error_while_streaming_replaces_text() {
        let (mut session, log) = new_session();
        start_turn(&mut session, &log, "hi");
        session.handle_event(token("partial"));

        assert!(session.handle_transport_error());
        assert_eq!(session.active_entry().unwrap().main_text, STREAM_ERROR_MESSAGE);
        assert_eq!(closes(&log), 1);
    }

    #[test]
    fn test_new_submission_closes_previous_stream() {
        let (mut session, log) = new_session();
        let first = start_turn(&mut session, &log, "one");
        session.handle_event(token("still going"));

        let second = start_turn(&mut session, &log, "two");
        assert_eq!(closes(&log), 1);
        assert!(second > first);
        assert_eq!(session.transcript().len(), 4);
        assert_eq!(session.state(), TurnState::Awaiting);
    }

    #[test]
    fn test_failed_open_marks_turn_errored() {
        let (mut session, _log) = new_session();
        let err = session
            .submit("hi", Some("token"), |_| -> Result<RecordingHandle> {
                Err(ClientError::Transport("refused".to_string()))
            })
            .unwrap_err();
        assert_eq!(err, ClientError::Transport("refused".to_string()));
        assert_eq!(session.state(), TurnState::Errored);
        assert_eq!(session.active_entry().unwrap().state, EntryState::Failed);
    }

    #[test]
    fn test_suggestions_replace_previous_set() {
        let (mut session, log) = new_session();
        let turn = start_turn(&mut session, &log, "hi");
        session.handle_event(StreamEvent::End);

        assert!(session.apply_suggestions(turn, vec!["a".to_string(), "b".to_string()]));
        assert_eq!(session.state(), TurnState::Idle);
        assert_eq!(session.quick_reply(1), Some("b"));

        // Starting the next turn clears the chips
        let next = start_turn(&mut session, &log, "again");
        assert!(session.quick_replies().is_empty());
        session.handle_event(StreamEvent::End);
        assert!(session.apply_suggestions(next, vec!["c".to_string()]));
        assert_eq!(session.quick_replies(), ["c".to_string()]);
    }

    #[test]
    fn test_stale_suggestions_are_discarded() {
        let (mut session, log) = new_session();
        let first = start_turn(&mut session, &log, "one");
        session.handle_event(StreamEvent::End);
        start_turn(&mut session, &log, "two");

        assert!(!session.apply_suggestions(first, vec!["old".to_string()]));
        assert!(session.quick_replies().is_empty());
        assert_eq!(session.state(), TurnState::Awaiting);
    }

    #[test]
    fn test_empty_or_failed_suggestions_end_the_turn() {
        let (mut session, log) = new_session();
        let turn = start_turn(&mut session, &log, "one");
        session.handle_event(StreamEvent::End);
        assert!(!session.apply_suggestions(turn, Vec::new()));
        assert_eq!(session.state(), TurnState::Idle);

        let turn = start_turn(&mut session, &log, "two");
        session.handle_event(StreamEvent::End);
        session.suggestions_failed(turn);
        assert_eq!(session.state(), TurnState::Idle);
    }

    #[test]
    fn test_initial_suggestions_use_turn_zero() {
        let (mut session, _log) = new_session();
        let turn = session.current_turn();
        assert!(session.apply_suggestions(turn, vec!["What's on my calendar?".to_string()]));
        assert_eq!(session.state(), TurnState::Idle);
    }

    #[test]
    fn test_logout_closes_stream_before_clearing_token() {
        let (mut session, log) = new_session();
        start_turn(&mut session, &log, "hi");
        session.handle_event(token("streaming"));

        let mut store = RecordingStore {
            inner: MemorySessionStore::with_token("token"),
            log: log.clone(),
        };
        let target = session.logout(&mut store).unwrap();
        log.borrow_mut().push(format!("navigate {}", target));

        assert_eq!(
            *log.borrow(),
            vec!["close".to_string(), "clear".to_string(), "navigate /".to_string()]
        );
        assert_eq!(store.load(), None);
        assert!(!session.has_open_stream());
    }

    #[test]
    fn test_logout_without_stream() {
        let (mut session, log) = new_session();
        let mut store = RecordingStore {
            inner: MemorySessionStore::with_token("token"),
            log: log.clone(),
        };
        assert_eq!(session.logout(&mut store).unwrap(), LOGIN_PATH);
        assert_eq!(*log.borrow(), vec!["clear".to_string()]);
    }
}
