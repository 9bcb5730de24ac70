use anyhow::{bail, Context, Result};
use colored::Colorize;
use egwchat_core::{require_token, VoiceCapability};
use std::path::Path;

use crate::app::setup::AppConfig;

/// Upload an audio file and return the recognized text, if any
pub async fn transcribe_file(config: &AppConfig, path: &Path) -> Result<Option<String>> {
    let token = require_token(&config.store)?;

    if let VoiceCapability::Unavailable(reason) = VoiceCapability::for_token(Some(&token)) {
        bail!("{}", reason);
    }

    let audio = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read audio file {}", path.display()))?;
    if audio.is_empty() {
        log::debug!("Skipping upload of empty recording {}", path.display());
        return Ok(None);
    }
    println!("{}", format!("🎙 Transcribing {}...", path.display()).bright_black());

    Ok(config.client.transcribe(&token, audio).await?)
}

pub async fn run_transcribe(config: &AppConfig, path: &Path) -> Result<()> {
    match transcribe_file(config, path).await? {
        Some(text) => println!("{}", text),
        None => println!("{}", "(nothing recognized)".bright_black()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use egwchat_api::{ApiClient, FileSessionStore};
    use egwchat_core::{Endpoints, SessionStore};

    #[tokio::test]
    async fn test_empty_recording_is_not_uploaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSessionStore::new(dir.path().join("session"));
        store.save("opaque-token").unwrap();

        // Nothing listens here; an upload attempt would fail with a transport error
        let config = AppConfig {
            client: ApiClient::new(Endpoints::new("http://127.0.0.1:9")),
            store,
            verbose: false,
        };

        let audio = dir.path().join("empty.webm");
        std::fs::write(&audio, b"").unwrap();

        assert_eq!(transcribe_file(&config, &audio).await.unwrap(), None);
    }
}
