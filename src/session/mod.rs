//! Persisted session state.
//!
//! The session is a file-backed pair of keys mirroring what the original
//! browser front end kept in local storage: an opaque `token` and a JSON
//! `user` snapshot taken at login. The pair is written at login, removed
//! at logout, and never mutated in place; a role change on the server
//! only takes effect at the next login.
//!
//! The store is always passed explicitly to the guard and the workflows.
//! Nothing in this crate reads session state ambiently.

pub mod guard;

use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::models::User;
use crate::Result;

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Client-held proof of authentication plus the cached user snapshot.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// File-backed two-key session store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_KEY)
    }

    fn user_path(&self) -> PathBuf {
        self.dir.join(USER_KEY)
    }

    /// Persist a freshly authenticated session. Both keys are written
    /// together; a half-written pair reads back as "not logged in".
    pub fn init(&self, token: &str, user: &User) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.token_path(), token)?;
        fs::write(self.user_path(), serde_json::to_vec(user)?)?;
        debug!(user_id = %user.user_id, "session persisted");
        Ok(())
    }

    /// Remove both keys. Missing files are fine.
    pub fn clear(&self) {
        let _ = fs::remove_file(self.token_path());
        let _ = fs::remove_file(self.user_path());
    }

    /// The persisted token, if any. Presence implies "authenticated" as
    /// far as this client is concerned; the backend still re-validates it
    /// on every request.
    pub fn token(&self) -> Option<String> {
        fs::read_to_string(self.token_path())
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    fn user_blob(&self) -> Option<String> {
        fs::read_to_string(self.user_path()).ok()
    }

    /// Load the persisted session, if any.
    ///
    /// A user blob that no longer parses is corrupt local state: both
    /// keys are cleared so the next login starts clean instead of the
    /// caller being wedged in a reject loop.
    pub fn load(&self) -> Option<Session> {
        let token = self.token()?;
        let blob = self.user_blob()?;
        match serde_json::from_str::<User>(&blob) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                warn!(error = %e, "persisted user blob is corrupt, clearing session");
                self.clear();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn technician() -> User {
        User {
            user_id: "tech7".into(),
            first_name: "Ama".into(),
            last_name: "Mensah".into(),
            email: "ama@example.com".into(),
            role: Role::LabTechnician,
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.init("tok-abc", &technician()).unwrap();

        let session = store.load().unwrap();
        assert_eq!(session.token, "tok-abc");
        assert_eq!(session.user.user_id, "tech7");
        assert_eq!(session.user.role, Role::LabTechnician);
    }

    #[test]
    fn test_missing_session_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_token_without_user_is_not_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        fs::write(dir.path().join(TOKEN_KEY), "tok-abc").unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_user_blob_clears_both_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        fs::write(dir.path().join(TOKEN_KEY), "tok-abc").unwrap();
        fs::write(dir.path().join(USER_KEY), "{not json").unwrap();

        assert!(store.load().is_none());
        assert!(!dir.path().join(TOKEN_KEY).exists());
        assert!(!dir.path().join(USER_KEY).exists());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.clear();
        store.init("tok", &technician()).unwrap();
        store.clear();
        store.clear();
        assert!(store.load().is_none());
    }
}
