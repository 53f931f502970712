//! Session persistence for Amber Monitor
//!
//! Three independent string slots (API key, site id, auth token) are kept
//! between runs. [`FileSessionStore`] writes them to a small JSON document;
//! [`MemorySessionStore`] keeps them in memory for tests and embedding.

use crate::error::{MonitorError, Result};
use crate::logging::get_logger;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stored session values; each slot is independently present or absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Amber API key used as the bearer credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Active site discovered at login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,

    /// Token marking a completed login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Session {
    /// API key, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    /// Site id, only meaningful while an auth token is present
    pub fn site_id(&self) -> Option<&str> {
        self.auth_token()?;
        non_blank(self.site_id.as_deref())
    }

    /// Auth token, ignoring blank values
    pub fn auth_token(&self) -> Option<&str> {
        non_blank(self.auth_token.as_deref())
    }

    /// Site id or the local precondition failure
    pub fn require_site_id(&self) -> Result<&str> {
        self.site_id().ok_or(MonitorError::NoSiteId)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Storage backend for the session slots
pub trait SessionStore: Send + Sync {
    /// Read the current session; a missing store yields an empty session
    fn load(&self) -> Result<Session>;

    /// Replace the stored session
    fn save(&self, session: &Session) -> Result<()>;

    /// Remove all three values
    fn clear(&self) -> Result<()>;

    /// Apply a change to the stored session
    fn update(&self, change: &mut dyn FnMut(&mut Session)) -> Result<Session> {
        let mut session = self.load()?;
        change(&mut session);
        self.save(&session)?;
        Ok(session)
    }
}

/// JSON file backed store
pub struct FileSessionStore {
    file_path: PathBuf,
    logger: crate::logging::StructuredLogger,
}

impl FileSessionStore {
    /// Create a store for the given file
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            logger: get_logger("store"),
        }
    }

    /// Location of the session file
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Session> {
        if !self.file_path.exists() {
            self.logger.debug("No session file found, using empty session");
            return Ok(Session::default());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        if contents.trim().is_empty() {
            return Ok(Session::default());
        }
        let session = serde_json::from_str(&contents)?;
        self.logger.debug("Loaded session from disk");
        Ok(session)
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.file_path, contents)?;
        self.logger.debug("Saved session to disk");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.file_path) {
            Ok(()) => {
                self.logger.debug("Removed session file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Session>,
}

impl MemorySessionStore {
    /// Create a store pre-filled with a session
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Session> {
        self.session
            .lock()
            .map(|s| s.clone())
            .map_err(|_| MonitorError::io("session lock poisoned"))
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| MonitorError::io("session lock poisoned"))?;
        *guard = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.save(&Session::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_id_requires_auth_token() {
        let session = Session {
            api_key: Some("psk_abc".into()),
            site_id: Some("site-1".into()),
            auth_token: None,
        };
        assert_eq!(session.site_id(), None);
        assert!(matches!(
            session.require_site_id(),
            Err(MonitorError::NoSiteId)
        ));

        let session = Session {
            auth_token: Some("token".into()),
            ..session
        };
        assert_eq!(session.site_id(), Some("site-1"));
    }

    #[test]
    fn blank_values_count_as_absent() {
        let session = Session {
            api_key: Some("   ".into()),
            site_id: None,
            auth_token: Some(String::new()),
        };
        assert_eq!(session.api_key(), None);
        assert_eq!(session.auth_token(), None);
    }

    #[test]
    fn memory_store_update_and_clear() {
        let store = MemorySessionStore::default();
        store
            .update(&mut |s: &mut Session| s.api_key = Some("psk_1".into()))
            .unwrap();
        assert_eq!(store.load().unwrap().api_key(), Some("psk_1"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), Session::default());
    }
}
