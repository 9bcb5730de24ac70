pub mod chat;
pub mod dashboard;
pub mod login;
pub mod prompt;
pub mod repl;
pub mod setup;
pub mod task;
pub mod transcribe;

pub use dashboard::show_dashboard;
pub use login::run_login;
pub use repl::{run_repl_mode, run_single_message};
pub use setup::{setup_from_cli, AppConfig};
pub use task::run_task_create;
pub use transcribe::run_transcribe;

use egwchat_core::ClientError;

/// Whether `err` means there is no usable session token
pub fn is_session_expired(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ClientError>(), Some(ClientError::SessionExpired))
}
