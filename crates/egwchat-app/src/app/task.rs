use anyhow::Result;
use colored::Colorize;
use egwchat_core::tasks::{TASK_CREATING, TASK_SESSION_EXPIRED};
use egwchat_core::{ClientError, DateRange, SessionStore, TaskDraft};

use crate::app::setup::AppConfig;

/// Create a task and refresh the dashboard counters on success
pub async fn run_task_create(config: &AppConfig, draft: TaskDraft) -> Result<()> {
    let Some(token) = config.store.load() else {
        println!("{}", TASK_SESSION_EXPIRED.red());
        return Ok(());
    };

    println!("{}", TASK_CREATING.bright_black());
    match config.client.create_task(&token, draft).await {
        Ok(message) => {
            println!("{} {}", "✓".bright_green(), message.green());
            let snapshot = config
                .client
                .load_dashboard(&token, &DateRange::today())
                .await;
            if let Some(open) = snapshot.open_tasks {
                println!("{}", format!("Open tasks: {}", open).bright_black());
            }
        }
        Err(ClientError::Validation(message)) | Err(ClientError::Status { message, .. }) => {
            println!("{} {}", "✗".red(), message.red());
        }
        Err(e) => {
            log::error!("Task creation error: {}", e);
            println!("{} {}", "✗".red(), e.to_string().red());
        }
    }
    Ok(())
}
