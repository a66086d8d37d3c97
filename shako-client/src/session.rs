use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use shako_types::Media;

/// The authenticated session: bearer token plus the logged-in
/// profile's identity. Created on login, destroyed on logout, and
/// passed explicitly to whatever needs it; there is no ambient
/// global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<Media>,
}

/// Persists the session as JSON in the user's home directory.
///
/// The file lives at `~/.shako/session.json` with 0600 permissions so
/// only the owner can read the token.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    /// Create a store with the default path `~/.shako/session.json`.
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        let file_path = home_dir.join(".shako").join("session.json");
        Ok(Self { file_path })
    }

    /// Load the stored session.
    ///
    /// Returns `Ok(None)` when no session file exists or its content
    /// is invalid; a malformed file is never a hard error, the user
    /// just has to log in again.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&self.file_path).context("Failed to read session file")?;

        if content.trim().is_empty() {
            log::warn!("Session file is empty, treating as no session");
            return Ok(None);
        }

        match serde_json::from_str::<Session>(&content) {
            Ok(session) if session.access_token.trim().is_empty() => {
                log::warn!("Session file has an empty access token, treating as no session");
                Ok(None)
            }
            Ok(session) => {
                log::debug!("Loaded session for {} from {}", session.name, self.file_path.display());
                Ok(Some(session))
            }
            Err(err) => {
                log::warn!("Session file is corrupted ({err}), treating as no session");
                Ok(None)
            }
        }
    }

    /// Save the session with 0600 permissions.
    ///
    /// Writes to a temporary file and renames it into place so a
    /// crash never leaves a partially written session behind.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).context("Failed to create .shako directory")?;
        }

        let json =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        let temp_path = self.file_path.with_extension("tmp");
        let mut file =
            fs::File::create(&temp_path).context("Failed to create temporary session file")?;
        file.write_all(json.as_bytes())
            .context("Failed to write session")?;
        file.sync_all()
            .context("Failed to sync session file to disk")?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, permissions)
                .context("Failed to set session file permissions")?;
        }

        fs::rename(&temp_path, &self.file_path)
            .context("Failed to rename temporary session file")?;

        log::info!("Saved session to {}", self.file_path.display());
        Ok(())
    }

    /// Delete the session file. Succeeds even if no file exists.
    pub fn delete(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path).context("Failed to delete session file")?;
            log::info!("Deleted session file at {}", self.file_path.display());
        } else {
            log::debug!("Session file does not exist, nothing to delete");
        }
        Ok(())
    }

    /// The path of the session file.
    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store(temp_dir: &TempDir) -> SessionStore {
        let file_path = temp_dir.path().join("session.json");
        SessionStore { file_path }
    }

    fn sample_session() -> Session {
        Session {
            access_token: "token-abcdef-123456".to_string(),
            name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            avatar: None,
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        let session = sample_session();
        store.save(&session).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, Some(session));
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        store.save(&sample_session()).unwrap();
        assert!(store.file_path.exists());

        store.delete().unwrap();
        assert!(!store.file_path.exists());
    }

    #[test]
    fn test_delete_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        // Should not error even if file doesn't exist
        store.delete().unwrap();
    }

    #[test]
    fn test_empty_file_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        fs::write(&store.file_path, "").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_corrupted_file_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        fs::write(&store.file_path, "{not json at all").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_empty_token_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        let json = r#"{"access_token": "  ", "name": "alice", "email": "a@b.c"}"#;
        fs::write(&store.file_path, json).unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        store.save(&sample_session()).unwrap();

        let metadata = fs::metadata(&store.file_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }
}
