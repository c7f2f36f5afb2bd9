//! Persisted local authentication session.
//!
//! The signed-in user and the time of their last activity are kept in a small
//! JSON file so a restarted client can resume without signing in again. Writes
//! go through a temporary file and a rename, like the product store.

use crate::domain::error::{GestlyError, Result};
use crate::domain::User;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Fallback display name when nobody is signed in.
pub const DEFAULT_USER_NAME: &str = "User";

/// On-disk shape of the session file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user: User,
    /// Epoch milliseconds.
    pub last_activity: i64,
}

/// Reads and writes the local session.
#[derive(Debug)]
pub struct SessionManager {
    file_path: Option<PathBuf>,
    record: Mutex<Option<SessionRecord>>,
}

impl SessionManager {
    /// Opens the session file at `file_path`, loading a saved session if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the file
    /// cannot be read. A malformed file is reported as [`GestlyError::Session`].
    pub fn open(file_path: PathBuf) -> Result<Self> {
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let record = if file_path.exists() {
            let contents = std::fs::read_to_string(&file_path)?;
            let record: SessionRecord = serde_json::from_str(&contents)
                .map_err(|e| GestlyError::Session(format!("malformed session file: {e}")))?;
            tracing::debug!(uid = %record.user.uid, "restored saved session");
            Some(record)
        } else {
            None
        };

        Ok(Self {
            file_path: Some(file_path),
            record: Mutex::new(record),
        })
    }

    /// A session manager that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            file_path: None,
            record: Mutex::new(None),
        }
    }

    /// Records `user` as signed in and persists the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub fn save_user_session(&self, user: &User) -> Result<()> {
        let _span = tracing::debug_span!("save_user_session", uid = %user.uid).entered();

        let mut record = self.lock()?;
        let next = SessionRecord {
            user: user.clone(),
            last_activity: chrono::Utc::now().timestamp_millis(),
        };
        self.persist(Some(&next))?;
        *record = Some(next);
        Ok(())
    }

    /// Forgets the signed-in user and removes the session file.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file exists but cannot be removed.
    pub fn clear_user_session(&self) -> Result<()> {
        let mut record = self.lock()?;
        self.persist(None)?;
        *record = None;
        tracing::debug!("session cleared");
        Ok(())
    }

    /// The signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Session`] if the session lock is poisoned.
    pub fn current_user(&self) -> Result<Option<User>> {
        Ok(self.lock()?.as_ref().map(|r| r.user.clone()))
    }

    /// # Errors
    ///
    /// Returns [`GestlyError::Session`] if the session lock is poisoned.
    pub fn is_logged_in(&self) -> Result<bool> {
        Ok(self.lock()?.is_some())
    }

    /// # Errors
    ///
    /// Returns [`GestlyError::Session`] if the session lock is poisoned.
    pub fn current_user_id(&self) -> Result<Option<String>> {
        Ok(self.lock()?.as_ref().map(|r| r.user.uid.clone()))
    }

    /// Display name of the signed-in user, or [`DEFAULT_USER_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Session`] if the session lock is poisoned.
    pub fn current_user_name(&self) -> Result<String> {
        Ok(self
            .lock()?
            .as_ref()
            .map(|r| r.user.full_name.clone())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()))
    }

    /// Last recorded activity, epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Session`] if the session lock is poisoned.
    pub fn last_activity(&self) -> Result<Option<i64>> {
        Ok(self.lock()?.as_ref().map(|r| r.last_activity))
    }

    /// Stamps the session with the current time. No-op when signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub fn update_last_activity(&self) -> Result<()> {
        let mut record = self.lock()?;
        let Some(current) = record.as_ref() else {
            return Ok(());
        };

        let next = SessionRecord {
            last_activity: chrono::Utc::now().timestamp_millis(),
            ..current.clone()
        };
        self.persist(Some(&next))?;
        *record = Some(next);
        Ok(())
    }

    /// Replaces the stored user data, keeping the last activity time.
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Session`] when nobody is signed in or `user` is a
    /// different account, and an I/O error if the file cannot be written.
    pub fn update_user_data(&self, user: &User) -> Result<()> {
        let mut record = self.lock()?;
        let current = record
            .as_ref()
            .ok_or_else(|| GestlyError::Session("no user is signed in".to_string()))?;
        if current.user.uid != user.uid {
            return Err(GestlyError::Session(format!(
                "cannot update user {} while {} is signed in",
                user.uid, current.user.uid
            )));
        }

        let next = SessionRecord {
            user: user.clone(),
            last_activity: current.last_activity,
        };
        self.persist(Some(&next))?;
        *record = Some(next);
        Ok(())
    }

    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<SessionRecord>>> {
        self.record
            .lock()
            .map_err(|e| GestlyError::Session(format!("session lock poisoned: {e}")))
    }

    fn persist(&self, record: Option<&SessionRecord>) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        match record {
            Some(record) => {
                let json = serde_json::to_string_pretty(record)?;
                let tmp_path = path.with_extension("tmp");
                std::fs::write(&tmp_path, json)?;
                std::fs::rename(&tmp_path, path)?;
            }
            None if path.exists() => std::fs::remove_file(path)?,
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user() -> User {
        User::new("u-1", "Ana Ruiz", "ana@example.com")
    }

    #[test]
    fn signed_out_defaults() {
        let sessions = SessionManager::in_memory();
        assert!(!sessions.is_logged_in().unwrap());
        assert_eq!(sessions.current_user_id().unwrap(), None);
        assert_eq!(sessions.current_user_name().unwrap(), "User");
        sessions.update_last_activity().unwrap();
        assert_eq!(sessions.last_activity().unwrap(), None);
    }

    #[test]
    fn session_survives_reopen_and_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let ana = user();
        let sessions = SessionManager::open(path.clone()).unwrap();
        sessions.save_user_session(&ana).unwrap();
        assert!(path.exists());

        let reopened = SessionManager::open(path.clone()).unwrap();
        assert!(reopened.is_logged_in().unwrap());
        assert_eq!(reopened.current_user().unwrap(), Some(ana));
        assert_eq!(reopened.current_user_name().unwrap(), "Ana Ruiz");

        reopened.clear_user_session().unwrap();
        assert!(!path.exists());
        assert!(!SessionManager::open(path).unwrap().is_logged_in().unwrap());
    }

    #[test]
    fn update_user_data_requires_same_account() {
        let sessions = SessionManager::in_memory();
        assert!(matches!(sessions.update_user_data(&user()), Err(GestlyError::Session(_))));

        let ana = user();
        sessions.save_user_session(&ana).unwrap();
        let renamed = User {
            full_name: "Ana María Ruiz".into(),
            ..ana
        };
        sessions.update_user_data(&renamed).unwrap();
        assert_eq!(sessions.current_user_name().unwrap(), "Ana María Ruiz");

        let other = User::new("u-2", "Luis", "luis@example.com");
        assert!(matches!(sessions.update_user_data(&other), Err(GestlyError::Session(_))));
    }

    #[test]
    fn malformed_file_is_a_session_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(SessionManager::open(path), Err(GestlyError::Session(_))));
    }
}
