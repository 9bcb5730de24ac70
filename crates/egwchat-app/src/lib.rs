//! egwchat terminal application
//!
//! Command-line front end for the EGroupware AI assistant: login, streaming chat,
//! dashboard, task creation and audio transcription against the chatbot backend.

pub mod app;
pub mod cli;

pub use app::{run_login, run_repl_mode, setup_from_cli, AppConfig};
pub use cli::{Cli, Commands, LoginArgs, TaskCommands};
