use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use egwchat_core::{ClientError, Result, SessionStore};

/// Session token kept in a single file, the terminal counterpart of `localStorage`
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.egwchat/session`
    pub fn default_location() -> Result<Self> {
        let dir = egwchat_logging::get_egwchat_dir()
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        Ok(Self::new(dir.join("session")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn save(&mut self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ClientError::Storage(e.to_string()))?;
        }
        let storage_error = |e: std::io::Error| {
            ClientError::Storage(format!("{}: {}", self.path.display(), e))
        };

        // The token embeds credentials, so only the owner may read it
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(storage_error)?;
        #[cfg(unix)]
        {
            // A file left over from an older version keeps its mode on open
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(storage_error)?;
        }
        file.write_all(token.as_bytes()).map_err(storage_error)
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!("{}: {}", self.path.display(), e))),
        }
    }
}
