use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use egwchat_types::TokenClaims;

use crate::error::{ClientError, Result};

/// Persisted home of the single session token.
///
/// The browser keeps it in `localStorage`, the terminal client in a file; every
/// authenticated call reads it and only login and logout write it.
pub trait SessionStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, token: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Store that lives as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    token: Option<String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn save(&mut self, token: &str) -> Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }
}

/// Token for an authenticated action, or the session-expired error
pub fn require_token(store: &dyn SessionStore) -> Result<String> {
    store
        .load()
        .filter(|token| !token.trim().is_empty())
        .ok_or(ClientError::SessionExpired)
}

/// Read the claims of a JWT without verifying it.
///
/// Only used for presentation decisions; the backend remains the authority.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let payload = parts[1].trim_end_matches('=');
    let bytes = match URL_SAFE_NO_PAD.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Token payload is not base64url: {}", e);
            return None;
        }
    };

    serde_json::from_slice(&bytes)
        .map_err(|e| log::debug!("Token payload is not JSON claims: {}", e))
        .ok()
}
