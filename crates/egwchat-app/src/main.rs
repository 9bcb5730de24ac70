use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use egwchat_core::error::SESSION_EXPIRED_MESSAGE;
use egwchat_core::{route, Route, TaskDraft};
use egwchat_types::CHAT_PATH;

use egwchat::app::{
    is_session_expired, run_login, run_repl_mode, run_single_message, run_task_create,
    run_transcribe, setup_from_cli, show_dashboard, AppConfig,
};
use egwchat::{Cli, Commands, LoginArgs, TaskCommands};
use egwchat_core::SessionStore;

/// No subcommand: open the chat when a token is stored, log in first otherwise
async fn run_default(config: &mut AppConfig) -> Result<()> {
    let has_token = config.store.load().is_some();
    if let Route::Redirect(_) = route(CHAT_PATH, has_token) {
        run_login(config, LoginArgs::default()).await?;
    }
    run_repl_mode(config).await
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Some(shell) = cli.generate {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "egwchat", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = setup_from_cli(&cli)?;

    let result = match cli.command {
        None => run_default(&mut config).await,
        Some(Commands::Login(args)) => run_login(&mut config, args).await,
        Some(Commands::Logout) => {
            config.store.clear()?;
            println!("{}", "Logged out.".bright_cyan());
            Ok(())
        }
        Some(Commands::Chat { message: Some(message) }) => {
            run_single_message(&config, &message).await
        }
        Some(Commands::Chat { message: None }) => run_repl_mode(&mut config).await,
        Some(Commands::Dashboard) => show_dashboard(&config).await.map(|_| ()),
        Some(Commands::Task {
            command: TaskCommands::Create { title, due, description },
        }) => {
            let draft = TaskDraft::new(title, due.unwrap_or_default(), description.unwrap_or_default());
            run_task_create(&config, draft).await
        }
        Some(Commands::Transcribe { file }) => run_transcribe(&config, &file).await,
    };

    match result {
        Err(e) if is_session_expired(&e) => {
            eprintln!("{}", SESSION_EXPIRED_MESSAGE.bright_red());
            eprintln!("{}", "Run `egwchat login` to start a new session.".bright_black());
            std::process::exit(1);
        }
        other => other,
    }
}
