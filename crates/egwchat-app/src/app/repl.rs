use anyhow::Result;
use colored::Colorize;
use egwchat_core::dashboard::insight_prompt;
use egwchat_core::error::SESSION_EXPIRED_MESSAGE;
use egwchat_core::{append_transcript, require_token, SessionStore, TaskDraft, VoiceCapability};
use egwchat_types::DEFAULT_SUGGESTION_COUNT;
use std::path::Path;

use crate::app::chat::{ActiveStream, ChatSession};
use crate::app::is_session_expired;
use crate::app::dashboard::{insight_text, show_dashboard};
use crate::app::prompt::Prompter;
use crate::app::setup::AppConfig;
use crate::app::task::run_task_create;
use crate::app::transcribe::transcribe_file;

/// A line typed at the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Help,
    Logout,
    Dashboard,
    /// Prefill the prompt from the first insight line
    UseInsight,
    /// Pick a quick reply by its 1-based number
    QuickReply(usize),
    Task(String),
    Voice(String),
    Message(String),
    Empty,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => return ReplCommand::Empty,
            "exit" | "quit" | "/exit" | "/quit" => return ReplCommand::Exit,
            "/help" => return ReplCommand::Help,
            "/logout" => return ReplCommand::Logout,
            "/dashboard" => return ReplCommand::Dashboard,
            "/insight" => return ReplCommand::UseInsight,
            _ => {}
        }

        if let Some(title) = line.strip_prefix("/task ") {
            return ReplCommand::Task(title.trim().to_string());
        }
        if let Some(file) = line.strip_prefix("/voice ") {
            return ReplCommand::Voice(file.trim().to_string());
        }
        if let Some(n) = line.strip_prefix('/').and_then(|n| n.parse::<usize>().ok()) {
            if (1..=DEFAULT_SUGGESTION_COUNT).contains(&n) {
                return ReplCommand::QuickReply(n);
            }
        }
        ReplCommand::Message(line.to_string())
    }
}

fn print_help(voice: VoiceCapability) {
    println!("{} Commands:", "💡".bright_yellow());
    println!("  /1 … /4           - Send a quick reply");
    println!("  /dashboard        - Show today's events, tasks and insights");
    println!("  /insight          - Start a message from the first insight");
    println!("  /task <title>     - Create a task");
    match voice {
        VoiceCapability::Available => {
            println!("  /voice <file>     - Transcribe an audio clip into the prompt")
        }
        VoiceCapability::Unavailable(reason) => {
            println!("  {}", format!("/voice <file>     - {}", reason).bright_black())
        }
    }
    println!("  /logout           - Log out");
    println!("  exit              - Quit");
    println!();
}

/// Abort the running stream when Ctrl-C arrives while an answer is streaming
fn spawn_interrupt_handler(active: ActiveStream) {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_ok() {
                if let Ok(mut guard) = active.lock() {
                    if let Some(mut handle) = guard.take() {
                        egwchat_core::StreamHandle::close(&mut handle);
                    }
                }
            }
        }
    });
}

/// Send a message with the stored token. Returns false once the session has expired.
async fn send_or_expire(chat: &mut ChatSession, config: &AppConfig, message: &str) -> Result<bool> {
    match chat.send(message, config.store.load().as_deref()).await {
        Ok(()) => Ok(true),
        Err(e) if is_session_expired(&e) => {
            println!("{}", SESSION_EXPIRED_MESSAGE.bright_red());
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Run interactive chat mode
pub async fn run_repl_mode(config: &mut AppConfig) -> Result<()> {
    let token = require_token(&config.store)?;
    let voice = VoiceCapability::for_token(Some(&token));

    println!("{}", "🤖 EGroupware AI Assistant".bright_cyan().bold());
    println!("{}", "Type '/help' for commands, 'exit' to quit\n".bright_black());

    let mut chat = ChatSession::new(config.client.clone());
    spawn_interrupt_handler(chat.active.clone());

    let dashboard = show_dashboard(config).await?;
    let initial_turn = chat.page.current_turn();
    chat.fetch_suggestions(initial_turn, &token, DEFAULT_SUGGESTION_COUNT)
        .await;

    let mut prompter = Prompter::new()?;
    let mut draft = String::new();
    let mut insight = dashboard.insight;

    loop {
        let prompt = format!("{} ", "You:".bright_green().bold());
        let Some(line) = prompter.chat_line(&prompt, &draft)? else {
            println!("{}", "Goodbye!".bright_cyan());
            break;
        };
        draft.clear();

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Exit => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            ReplCommand::Help => print_help(voice),
            ReplCommand::Logout => {
                chat.page.logout(&mut config.store)?;
                println!("{}", "Logged out.".bright_cyan());
                break;
            }
            ReplCommand::Dashboard => {
                insight = show_dashboard(config).await?.insight;
            }
            ReplCommand::UseInsight => {
                let text = insight.as_deref().map(insight_text).unwrap_or_default();
                draft = insight_prompt(&text);
            }
            ReplCommand::QuickReply(n) => {
                let Some(reply) = chat.page.quick_reply(n - 1).map(str::to_string) else {
                    println!("{}", format!("No quick reply /{}", n).bright_black());
                    continue;
                };
                println!("{} {}", "You:".bright_green().bold(), reply);
                if !send_or_expire(&mut chat, config, &reply).await? {
                    break;
                }
            }
            ReplCommand::Task(title) => {
                run_task_create(config, TaskDraft::new(title, "", "")).await?;
            }
            ReplCommand::Voice(file) => {
                if let VoiceCapability::Unavailable(reason) = voice {
                    println!("{}", reason.bright_black());
                    continue;
                }
                match transcribe_file(config, Path::new(&file)).await {
                    Ok(Some(text)) => draft = append_transcript(&draft, &text),
                    Ok(None) => {}
                    Err(e) => eprintln!("{} {}", "Error:".bright_red().bold(), e),
                }
            }
            ReplCommand::Message(message) => {
                if !send_or_expire(&mut chat, config, &message).await? {
                    break;
                }
            }
        }
    }

    chat.page.close_stream();
    Ok(())
}

/// Send one message, print the answer and its quick replies, then exit
pub async fn run_single_message(config: &AppConfig, message: &str) -> Result<()> {
    let token = require_token(&config.store)?;
    let mut chat = ChatSession::new(config.client.clone());
    chat.send(message, Some(&token)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("  "), ReplCommand::Empty);
        assert_eq!(ReplCommand::parse("quit"), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse("/logout"), ReplCommand::Logout);
        assert_eq!(ReplCommand::parse("/2"), ReplCommand::QuickReply(2));
        assert_eq!(
            ReplCommand::parse("/task  Call Anna "),
            ReplCommand::Task("Call Anna".to_string())
        );
        assert_eq!(
            ReplCommand::parse("/voice clip.webm"),
            ReplCommand::Voice("clip.webm".to_string())
        );
    }

    #[test]
    fn test_out_of_range_quick_reply_is_a_message() {
        assert_eq!(ReplCommand::parse("/9"), ReplCommand::Message("/9".to_string()));
        assert_eq!(
            ReplCommand::parse("What's next?"),
            ReplCommand::Message("What's next?".to_string())
        );
    }
}
