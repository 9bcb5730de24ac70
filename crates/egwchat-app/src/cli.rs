use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use egwchat_types::Provider;
use std::path::PathBuf;

/// CLI arguments for egwchat
#[derive(Parser, Debug)]
#[command(name = "egwchat")]
#[command(about = "Terminal client for the EGroupware AI assistant")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Origin of the chatbot backend
    #[arg(long, env = "EGWCHAT_SERVER_URL", default_value = "http://localhost:8000")]
    pub server_url: String,

    /// Path prefix the backend is served under (e.g. /chatbot)
    #[arg(long, env = "EGWCHAT_MOUNT_PREFIX", default_value = "")]
    pub mount_prefix: String,

    /// File holding the session token (default: ~/.egwchat/session)
    #[arg(long, env = "EGWCHAT_SESSION_FILE", value_name = "PATH")]
    pub session_file: Option<PathBuf>,

    /// Enable verbose debug output (shows HTTP requests, responses and stream events)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Generate shell completions
    #[arg(long, value_enum)]
    pub generate: Option<Shell>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session token
    Login(LoginArgs),
    /// Forget the stored session token
    Logout,
    /// Chat with the assistant (interactive unless a message is given)
    Chat {
        /// Send this one message, print the answer and exit
        message: Option<String>,
    },
    /// Show today's events, open tasks and AI insights
    Dashboard,
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Transcribe a recorded audio clip (webm) into text
    Transcribe {
        /// Path to the audio file
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
        /// Longer description
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
}

/// Login values; anything missing is prompted for
#[derive(Args, Debug, Default, Clone)]
pub struct LoginArgs {
    /// AI provider (openai, ionos, github, openrouter, anthropic, azure)
    #[arg(long, value_parser = parse_provider)]
    pub provider: Option<Provider>,

    /// EGroupware installation URL
    #[arg(long, env = "EGWCHAT_EGW_URL", value_name = "URL")]
    pub egw_url: Option<String>,

    /// API key for the AI provider
    #[arg(long, env = "EGWCHAT_AI_KEY", hide_env_values = true, value_name = "KEY")]
    pub ai_key: Option<String>,

    /// Provider endpoint, for providers that need one
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// EGroupware username
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// EGroupware password
    #[arg(long, env = "EGWCHAT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

pub fn parse_provider(value: &str) -> Result<Provider, String> {
    Provider::from_str(value.trim()).ok_or_else(|| {
        let known: Vec<&str> = Provider::ALL.iter().map(|p| p.as_str()).collect();
        format!("unknown provider '{}' (expected one of: {})", value, known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["egwchat"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert_eq!(cli.mount_prefix, "");
    }

    #[test]
    fn test_login_flags() {
        let cli = Cli::try_parse_from([
            "egwchat",
            "--mount-prefix",
            "/chatbot",
            "login",
            "--provider",
            "ionos",
            "--username",
            "anna",
        ])
        .unwrap();

        assert_eq!(cli.mount_prefix, "/chatbot");
        match cli.command {
            Some(Commands::Login(args)) => {
                assert_eq!(args.provider, Some(Provider::Ionos));
                assert_eq!(args.username.as_deref(), Some("anna"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["egwchat", "login", "--provider", "groq"]).is_err());
        assert!(parse_provider("groq").unwrap_err().contains("openrouter"));
    }

    #[test]
    fn test_task_create() {
        let cli = Cli::try_parse_from([
            "egwchat", "task", "create", "Call Anna", "--due", "2026-10-20",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Task {
                command: TaskCommands::Create { title, due, description },
            }) => {
                assert_eq!(title, "Call Anna");
                assert_eq!(due.as_deref(), Some("2026-10-20"));
                assert_eq!(description, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
