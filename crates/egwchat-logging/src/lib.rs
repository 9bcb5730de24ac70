// Request and stream logging for the terminal client
pub mod request_logger;

use anyhow::{Context, Result};
use std::path::PathBuf;

pub use request_logger::{
    log_request,
    log_response,
    log_response_to_file,
    log_stream_event,
    mask_token,
};

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = max_chars.saturating_sub(3);
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Get or create the base egwchat directory (~/.egwchat)
/// Holds the session file and the logs directory
pub fn get_egwchat_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Failed to get home directory")?;

    let egwchat_dir = PathBuf::from(home_dir).join(".egwchat");

    if !egwchat_dir.exists() {
        std::fs::create_dir_all(&egwchat_dir)
            .context("Failed to create egwchat directory")?;
    }

    Ok(egwchat_dir)
}

/// Get or create the logs directory (~/.egwchat/logs)
pub fn get_logs_dir() -> Result<PathBuf> {
    let logs_dir = get_egwchat_dir()?.join("logs");

    if !logs_dir.exists() {
        std::fs::create_dir_all(&logs_dir)
            .context("Failed to create logs directory")?;
    }

    Ok(logs_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_safe_truncate() {
        assert_eq!(safe_truncate("short", 10), "short");
        assert_eq!(safe_truncate("abcdefghij", 6), "abc...");
        assert_eq!(safe_truncate("äöüäöü", 5), "äö...");
        assert_eq!(safe_truncate("abcdef", 2), "...");
    }

    #[test]
    #[serial]
    fn test_logs_dir_is_created_under_home() {
        let home = tempfile::tempdir().unwrap();
        let previous = std::env::var("HOME").ok();
        std::env::set_var("HOME", home.path());

        let logs = get_logs_dir().unwrap();
        assert_eq!(logs, home.path().join(".egwchat").join("logs"));
        assert!(logs.is_dir());

        match previous {
            Some(value) => std::env::set_var("HOME", value),
            None => std::env::remove_var("HOME"),
        }
    }
}
