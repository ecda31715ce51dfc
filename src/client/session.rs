//! Session Store: the single source of truth for "who is logged in".
//!
//! Reads are pure. Redirecting to login when there is no session is a separate,
//! explicit step (`SessionContext::require_session_or_redirect`).

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tracing::{debug, warn};

use crate::client::error::ClientError;
use crate::client::navigation::{Navigator, Page};
use crate::domain::Student;

pub trait SessionStore: Send + Sync {
    fn try_get(&self) -> Option<Student>;
    /// Overwrites any previous session.
    fn set(&self, student: &Student) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// Session kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    cell: Mutex<Option<Student>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn try_get(&self) -> Option<Student> {
        self.cell.lock().ok().and_then(|c| c.clone())
    }

    fn set(&self, student: &Student) -> Result<(), ClientError> {
        let mut cell = self.cell.lock().map_err(|_| io::Error::new(io::ErrorKind::Other, "session lock poisoned"))?;
        *cell = Some(student.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        let mut cell = self.cell.lock().map_err(|_| io::Error::new(io::ErrorKind::Other, "session lock poisoned"))?;
        *cell = None;
        Ok(())
    }
}

/// Durable session: one JSON file holding the serialized student.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn try_get(&self) -> Option<Student> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(target: "edusmart", path = %self.path.display(), error = %e, "Unreadable session file");
                return None;
            }
        };
        match serde_json::from_str::<Student>(&raw) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(target: "edusmart", path = %self.path.display(), error = %e, "Corrupt session file ignored");
                None
            }
        }
    }

    /// Write to a sibling temp file, then rename over the old one.
    fn set(&self, student: &Student) -> Result<(), ClientError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(serde_json::to_string(student)?.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(target: "edusmart", path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session context handed to every feature at construction.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub fn try_get(&self) -> Option<Student> {
        self.store.try_get()
    }

    pub fn set(&self, student: &Student) -> Result<(), ClientError> {
        self.store.set(student)
    }

    pub fn clear(&self) -> Result<(), ClientError> {
        self.store.clear()
    }

    pub fn navigate(&self, page: Page) {
        self.navigator.navigate(page);
    }

    /// The cached student, or a redirect to login plus `NoSession`.
    pub fn require_session_or_redirect(&self) -> Result<Student, ClientError> {
        match self.store.try_get() {
            Some(s) => Ok(s),
            None => {
                debug!(target: "progress", "No session; redirecting to login");
                self.navigator.navigate(Page::Login);
                Err(ClientError::NoSession)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::navigation::RecordingNavigator;

    fn student() -> Student {
        Student {
            id: "user_qa".into(),
            name: "QA Bot".into(),
            course: "2do".into(),
            username: Some("qa".into()),
        }
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("session.json");
        let store = FileSessionStore::new(&path);
        assert!(store.try_get().is_none());
        store.set(&student()).expect("set");

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.try_get(), Some(student()));

        reopened.clear().expect("clear");
        assert!(store.try_get().is_none());
        // Clearing twice is fine.
        reopened.clear().expect("clear again");
    }

    #[test]
    fn file_store_overwrites_previous_student() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.set(&student()).expect("set");
        let other = Student { id: "user_zoe".into(), name: "Zoe".into(), course: "1ro".into(), username: None };
        store.set(&other).expect("set");
        assert_eq!(store.try_get(), Some(other));
    }

    #[test]
    fn corrupt_file_reads_as_no_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(FileSessionStore::new(&path).try_get().is_none());
    }

    #[test]
    fn try_get_never_navigates() {
        let nav = Arc::new(RecordingNavigator::new());
        let ctx = SessionContext::new(Arc::new(MemorySessionStore::new()), nav.clone());
        assert!(ctx.try_get().is_none());
        assert!(nav.history().is_empty());
    }

    #[test]
    fn require_session_redirects_when_empty() {
        let nav = Arc::new(RecordingNavigator::new());
        let ctx = SessionContext::new(Arc::new(MemorySessionStore::new()), nav.clone());
        let err = ctx.require_session_or_redirect().unwrap_err();
        assert!(matches!(err, ClientError::NoSession));
        assert_eq!(nav.current(), Some(Page::Login));

        ctx.set(&student()).expect("set");
        assert_eq!(ctx.require_session_or_redirect().expect("session"), student());
        assert_eq!(nav.history().len(), 1);
    }
}
