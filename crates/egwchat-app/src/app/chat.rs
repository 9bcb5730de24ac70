use anyhow::Result;
use colored::Colorize;
use egwchat_api::{AbortStream, ApiClient};
use egwchat_core::error::STREAM_ERROR_MESSAGE;
use egwchat_core::{PageSession, StreamEvent, SubmitOutcome, TurnEffect, TurnId};
use futures::StreamExt;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Handle of the stream currently being read, shared with the Ctrl-C handler
pub type ActiveStream = Arc<Mutex<Option<AbortStream>>>;

/// Terminal chat page: one page session plus the client that feeds it
pub struct ChatSession {
    pub client: ApiClient,
    pub page: PageSession<AbortStream>,
    pub active: ActiveStream,
}

impl ChatSession {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            page: PageSession::new(),
            active: Arc::new(Mutex::new(None)),
        }
    }

    fn set_active(&self, handle: Option<AbortStream>) {
        if let Ok(mut guard) = self.active.lock() {
            *guard = handle;
        }
    }

    /// Run one turn to completion, printing the answer as it streams in
    pub async fn send(&mut self, input: &str, token: Option<&str>) -> Result<()> {
        let client = self.client.clone();
        let mut pending = None;
        let outcome = self.page.submit(input, token, |request| {
            let (events, handle) = client.open_chat(request);
            pending = Some((events, handle.clone()));
            Ok(handle)
        })?;

        let SubmitOutcome::Started(turn) = outcome else {
            return Ok(());
        };
        let Some((mut events, handle)) = pending else {
            return Ok(());
        };
        self.set_active(Some(handle));

        print!("\n{} ", "Assistant:".bright_blue().bold());
        std::io::stdout().flush().ok();

        let mut follow_up = TurnEffect::None;
        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("Chat stream failed: {}", e);
                    self.page.handle_transport_error();
                    println!("{}", STREAM_ERROR_MESSAGE.red());
                    break;
                }
            };

            match &event {
                StreamEvent::Token { content } => {
                    print!("{}", content);
                    std::io::stdout().flush().ok();
                }
                StreamEvent::ToolCall { tool_name } => {
                    println!("\n{}", format!("  ⚙ Using tool: {}", tool_name).bright_black());
                }
                StreamEvent::ToolResult => {
                    println!("{}", "  ⚙ Tool finished.".bright_black());
                }
                StreamEvent::End | StreamEvent::Unknown => {}
            }

            follow_up = self.page.handle_event(event);
            if follow_up != TurnEffect::None {
                break;
            }
        }
        self.set_active(None);

        // The stream was aborted from the Ctrl-C handler
        if self.page.handle_transport_error() {
            println!("\n{}", "Response interrupted".bright_yellow());
        }
        println!("\n");

        if let TurnEffect::FetchSuggestions { turn, count } = follow_up {
            if let Some(token) = token {
                self.fetch_suggestions(turn, token, count).await;
            }
        }
        Ok(())
    }

    /// Fetch quick replies for `turn`; failures are silent
    pub async fn fetch_suggestions(&mut self, turn: TurnId, token: &str, count: usize) {
        match self.client.suggestions(token, count).await {
            Ok(suggestions) => {
                if self.page.apply_suggestions(turn, suggestions) {
                    self.print_quick_replies();
                }
            }
            Err(e) => {
                log::debug!("Suggestions unavailable: {}", e);
                self.page.suggestions_failed(turn);
            }
        }
    }

    pub fn print_quick_replies(&self) {
        let replies = self.page.quick_replies();
        if replies.is_empty() {
            return;
        }
        println!("{}", "Quick replies:".bright_black());
        for (i, reply) in replies.iter().enumerate() {
            println!("  {} {}", format!("/{}", i + 1).bright_magenta(), reply);
        }
        println!();
    }
}
