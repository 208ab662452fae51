//! Role gate for the protected surfaces.
//!
//! Each evaluation is a pure synchronous read of the persisted session:
//! it starts unchecked and lands on exactly one of two terminal outcomes,
//! with no retry and no async suspension. Rejection never raises an
//! error; redirecting the caller to login is its only effect, and no
//! protected content is observable first.
//!
//! The gate is UX-layer convenience only. The backend re-validates the
//! token and role on every request; nothing stops a user from forging the
//! locally stored blob, so this check must never be treated as a security
//! boundary.

use crate::models::Role;
use crate::session::{Session, SessionStore};

/// Terminal outcome of one guard evaluation.
#[derive(Debug, Clone)]
pub enum GuardOutcome {
    /// Render the requested surface with this session.
    Admitted(Session),
    /// Send the caller back to the login screen.
    RedirectToLogin,
}

impl GuardOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GuardOutcome::Admitted(_))
    }
}

/// Admit or reject entry to a surface requiring `required`.
///
/// Token or user blob absent: reject. User blob fails to deserialize:
/// the store clears both keys (self-heal) and we reject. Role mismatch:
/// reject. Otherwise admit with the loaded session.
pub fn check(store: &SessionStore, required: Role) -> GuardOutcome {
    let Some(session) = store.load() else {
        return GuardOutcome::RedirectToLogin;
    };

    if session.user.role != required {
        return GuardOutcome::RedirectToLogin;
    }

    GuardOutcome::Admitted(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use std::fs;

    fn store_with(token: Option<&str>, user_blob: Option<&str>) -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        if let Some(token) = token {
            fs::write(dir.path().join("token"), token).unwrap();
        }
        if let Some(blob) = user_blob {
            fs::write(dir.path().join("user"), blob).unwrap();
        }
        let store = SessionStore::new(dir.path());
        (dir, store)
    }

    fn manager_blob() -> String {
        serde_json::to_string(&User {
            user_id: "mgr1".into(),
            first_name: "Kofi".into(),
            last_name: "Owusu".into(),
            email: "kofi@example.com".into(),
            role: Role::Manager,
        })
        .unwrap()
    }

    #[test]
    fn test_missing_token_redirects() {
        let (_dir, store) = store_with(None, Some(&manager_blob()));
        assert!(!check(&store, Role::Manager).is_admitted());
    }

    #[test]
    fn test_missing_user_redirects() {
        let (_dir, store) = store_with(Some("tok"), None);
        assert!(!check(&store, Role::Manager).is_admitted());
    }

    #[test]
    fn test_corrupt_user_redirects_and_clears_storage() {
        let (dir, store) = store_with(Some("tok"), Some("{broken"));
        assert!(!check(&store, Role::Manager).is_admitted());
        // Self-heal: both keys gone afterwards.
        assert!(!dir.path().join("token").exists());
        assert!(!dir.path().join("user").exists());
    }

    #[test]
    fn test_wrong_role_redirects_without_clearing() {
        let (dir, store) = store_with(Some("tok"), Some(&manager_blob()));
        assert!(!check(&store, Role::LabTechnician).is_admitted());
        // The session is intact; only the corrupt-blob case clears it.
        assert!(dir.path().join("token").exists());
        assert!(dir.path().join("user").exists());
    }

    #[test]
    fn test_matching_role_admits() {
        let (_dir, store) = store_with(Some("tok"), Some(&manager_blob()));
        match check(&store, Role::Manager) {
            GuardOutcome::Admitted(session) => {
                assert_eq!(session.token, "tok");
                assert_eq!(session.user.user_id, "mgr1");
            }
            GuardOutcome::RedirectToLogin => panic!("manager should be admitted"),
        }
    }

    #[test]
    fn test_manager_login_gates_surfaces_as_expected() {
        // Login as a manager: the manager surface admits, the technician
        // surface rejects, and the next check still admits (role is fixed
        // for the session).
        let (_dir, store) = store_with(Some("tok"), Some(&manager_blob()));
        assert!(check(&store, Role::Manager).is_admitted());
        assert!(!check(&store, Role::LabTechnician).is_admitted());
        assert!(check(&store, Role::Manager).is_admitted());
    }

    #[test]
    fn test_unknown_role_string_is_treated_as_corrupt() {
        let blob = r#"{"user_id":"x","first_name":"A","last_name":"B","email":"a@b.c","role":"superuser"}"#;
        let (dir, store) = store_with(Some("tok"), Some(blob));
        assert!(!check(&store, Role::Manager).is_admitted());
        assert!(!dir.path().join("user").exists());
    }
}
