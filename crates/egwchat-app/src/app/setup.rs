use anyhow::{Context, Result};
use colored::Colorize;
use egwchat_api::{ApiClient, FileSessionStore};
use egwchat_core::router::create_url;
use egwchat_core::Endpoints;

use crate::cli::Cli;

/// Everything a command needs, derived from CLI arguments and environment
pub struct AppConfig {
    pub client: ApiClient,
    pub store: FileSessionStore,
    pub verbose: bool,
}

/// Backend base URL: server origin plus optional mount prefix
pub fn base_url(server_url: &str, mount_prefix: &str) -> String {
    let origin = server_url.trim().trim_end_matches('/');
    let prefix = mount_prefix.trim().trim_end_matches('/');
    if prefix.is_empty() {
        origin.to_string()
    } else {
        create_url(origin, prefix)
    }
}

/// Set up application configuration from CLI arguments
pub fn setup_from_cli(cli: &Cli) -> Result<AppConfig> {
    let endpoints = Endpoints::new(base_url(&cli.server_url, &cli.mount_prefix));
    log::debug!("Using backend at {}", endpoints.base());

    let store = match &cli.session_file {
        Some(path) => FileSessionStore::new(path),
        None => FileSessionStore::default_location().context("Failed to locate session file")?,
    };

    if cli.verbose {
        println!("{}", format!("🔧 Backend: {}", endpoints.base()).bright_black());
        println!("{}", format!("🔧 Session file: {}", store.path().display()).bright_black());
    }

    Ok(AppConfig {
        client: ApiClient::new(endpoints).with_verbose(cli.verbose),
        store,
        verbose: cli.verbose,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use egwchat_core::SessionStore;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("http://localhost:8000/", ""), "http://localhost:8000");
        assert_eq!(
            base_url("https://egw.example.org", "/chatbot/"),
            "https://egw.example.org/chatbot"
        );
        assert_eq!(
            base_url("https://egw.example.org", "chatbot"),
            "https://egw.example.org/chatbot"
        );
    }

    #[test]
    fn test_setup_uses_given_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        let cli = Cli::try_parse_from([
            "egwchat",
            "--server-url",
            "http://backend:9000",
            "--session-file",
            path.to_str().unwrap(),
        ])
        .unwrap();

        let mut config = setup_from_cli(&cli).unwrap();
        assert_eq!(config.store.path(), path.as_path());
        assert_eq!(config.client.endpoints().token(), "http://backend:9000/token");

        config.store.save("abc").unwrap();
        assert_eq!(config.store.load().as_deref(), Some("abc"));
    }
}
