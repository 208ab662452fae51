//! Sample lifecycle and reference-data workflows.
//!
//! These services sit between the CLI surfaces and the API client and
//! enforce the rules that must hold no matter which surface performs a
//! mutation: samples are born pending, duplicate codes never leave the
//! client, result updates are full replacements, status transitions obey
//! the lifecycle, and destructive calls require explicit confirmation.
//!
//! A failed call leaves no partially applied local state behind and is
//! never retried automatically; the operator is free to retry.

mod refresh;

pub use refresh::RefreshGuard;

use chrono::Datelike;
use tracing::info;

use crate::api::ApiClient;
use crate::error::Error;
use crate::models::{
    NewProductionLine, NewSample, NewSampleType, NewUser, ProductionLine, Sample, SampleResult,
    SampleStatus, SampleType, User, UserUpdate,
};
use crate::session::{Session, SessionStore};
use crate::Result;

/// Which samples a list call should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every sample in the system (manager surface).
    All,
    /// Only samples registered by this user (technician surface).
    Mine(String),
}

impl Scope {
    /// The scope a session's role entitles it to.
    pub fn for_session(session: &Session) -> Scope {
        match session.user.role {
            crate::models::Role::Manager => Scope::All,
            crate::models::Role::LabTechnician => Scope::Mine(session.user.user_id.clone()),
        }
    }
}

/// Explicit acknowledgement for destructive operations. [`SampleService::delete`]
/// refuses to issue the call without `Confirmed`; the CLI obtains it by
/// prompting the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// How a caller names an existing sample.
#[derive(Debug, Clone)]
pub enum SampleSelector {
    Id(i64),
    Code(String),
}

/// Intake form for a new sample. Leaving `sample_code` empty asks for the
/// next code in the `SAMP-<year>-NNN` series.
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub sample_code: Option<String>,
    pub production_id: i64,
    pub sample_type_id: i64,
    pub storage_location: Option<String>,
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

pub struct AuthService<'a> {
    api: &'a ApiClient,
    store: &'a SessionStore,
}

impl<'a> AuthService<'a> {
    pub fn new(api: &'a ApiClient, store: &'a SessionStore) -> Self {
        Self { api, store }
    }

    /// Authenticate and persist the session. On failure the message is
    /// surfaced inline and whatever session was stored before stays as it
    /// was.
    pub async fn login(&self, user_id: &str, password: &str) -> Result<Session> {
        let response = self.api.login(user_id, password).await?;
        self.store.init(&response.token, &response.user)?;
        info!(user_id = %response.user.user_id, role = %response.user.role, "logged in");
        Ok(Session {
            token: response.token,
            user: response.user,
        })
    }

    /// Tear the session down. Always succeeds, even with nothing stored.
    pub fn logout(&self) {
        self.store.clear();
        info!("logged out");
    }
}

// ---------------------------------------------------------------------------
// Sample lifecycle
// ---------------------------------------------------------------------------

pub struct SampleService<'a> {
    api: &'a ApiClient,
}

impl<'a> SampleService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Register a new sample for `session`'s user. The sample is created
    /// pending with every measurement field null.
    ///
    /// Duplicates are blocked here, before any mutation reaches the
    /// network. The check is advisory: two clients can race past it, so
    /// true uniqueness stays the backend's job.
    pub async fn register(&self, session: &Session, request: RegisterRequest) -> Result<NewSample> {
        if request.production_id <= 0 {
            return Err(Error::Validation("a production line is required".into()));
        }
        if request.sample_type_id <= 0 {
            return Err(Error::Validation("a sample type is required".into()));
        }

        let existing = self.api.samples().await?;
        let codes: Vec<&str> = existing.iter().map(|s| s.sample_code.as_str()).collect();
        let code = resolve_code(
            request.sample_code.as_deref(),
            &codes,
            chrono::Utc::now().year(),
        )?;

        let sample = NewSample {
            sample_code: code,
            production_id: request.production_id,
            sample_type_id: request.sample_type_id,
            status: SampleStatus::Pending,
            created_by: session.user.user_id.clone(),
            storage_location: request.storage_location,
            note: request.note,
        };
        self.api.create_sample(&sample).await?;
        info!(code = %sample.sample_code, "registered sample");
        Ok(sample)
    }

    /// Look a sample up by numeric id or by its code.
    pub async fn resolve(&self, selector: &SampleSelector) -> Result<Sample> {
        match selector {
            SampleSelector::Id(id) => self.api.sample(*id).await,
            SampleSelector::Code(code) => self.api.sample_by_code(code).await,
        }
    }

    /// Record a test result, transitioning the sample's status.
    ///
    /// The update is a full replacement: measurement fields absent from
    /// `result` are stored as null, not left at their previous values.
    /// Returns the sample as the backend now holds it.
    pub async fn record_result(
        &self,
        selector: &SampleSelector,
        result: SampleResult,
    ) -> Result<Sample> {
        let sample = self.resolve(selector).await?;
        if !sample.status.can_transition_to(result.status) {
            return Err(Error::InvalidTransition {
                from: sample.status,
                to: result.status,
            });
        }

        self.api.update_sample(sample.sample_id, &result).await?;
        info!(sample_id = sample.sample_id, status = %result.status, "recorded result");
        self.api.sample(sample.sample_id).await
    }

    /// Delete a sample. No undo. Refused without explicit confirmation;
    /// deleting an already-deleted sample surfaces the backend's
    /// not-found error rather than silently succeeding.
    pub async fn delete(&self, sample_id: i64, confirmation: Confirmation) -> Result<()> {
        if confirmation != Confirmation::Confirmed {
            return Err(Error::Validation("delete aborted: not confirmed".into()));
        }
        self.api.delete_sample(sample_id).await?;
        info!(sample_id, "deleted sample");
        Ok(())
    }

    /// List samples for a scope. The backend returns the full list; the
    /// technician filter is applied client-side, which preserves the
    /// observable result a server-side filter would give: a technician
    /// never sees another technician's samples.
    pub async fn list(&self, scope: &Scope) -> Result<Vec<Sample>> {
        let samples = self.api.samples().await?;
        Ok(filter_scope(samples, scope))
    }

    /// Date-filtered report of a user's samples.
    pub async fn report(
        &self,
        user_id: &str,
        start: &str,
        end: Option<&str>,
    ) -> Result<Vec<Sample>> {
        if start.trim().is_empty() {
            return Err(Error::Validation("a start date is required".into()));
        }
        self.api.report(user_id, start, end).await
    }
}

/// Apply a list scope. Split out of [`SampleService::list`] so the filter
/// itself is testable without a backend.
pub fn filter_scope(samples: Vec<Sample>, scope: &Scope) -> Vec<Sample> {
    match scope {
        Scope::All => samples,
        Scope::Mine(user_id) => samples
            .into_iter()
            .filter(|sample| sample.created_by == *user_id)
            .collect(),
    }
}

/// Validate a requested code against the codes already on the server, or
/// generate the next one in the `SAMP-<year>-NNN` series when none was
/// requested.
fn resolve_code(requested: Option<&str>, existing: &[&str], year: i32) -> Result<String> {
    let code = match requested {
        Some(code) => {
            let code = code.trim();
            if code.is_empty() {
                return Err(Error::Validation("sample code must not be empty".into()));
            }
            code.to_string()
        }
        None => next_sample_code(existing, year),
    };

    if existing.contains(&code.as_str()) {
        return Err(Error::Validation(format!(
            "sample code {code:?} already exists"
        )));
    }
    Ok(code)
}

/// Next free code in the `SAMP-<year>-NNN` series. Codes outside the
/// current year's series are ignored.
pub fn next_sample_code(existing: &[&str], year: i32) -> String {
    let prefix = format!("SAMP-{year}-");
    let max = existing
        .iter()
        .filter_map(|code| code.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}{:03}", max + 1)
}

// ---------------------------------------------------------------------------
// Reference data and user administration (manager surface)
// ---------------------------------------------------------------------------

pub struct ReferenceService<'a> {
    api: &'a ApiClient,
}

impl<'a> ReferenceService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn production_lines(&self) -> Result<Vec<ProductionLine>> {
        self.api.production_lines().await
    }

    pub async fn add_production_line(&self, line: NewProductionLine) -> Result<()> {
        if line.line_code.trim().is_empty() || line.line_name.trim().is_empty() {
            return Err(Error::Validation(
                "line code and line name are required".into(),
            ));
        }
        self.api.create_production_line(&line).await?;
        info!(code = %line.line_code, "added production line");
        Ok(())
    }

    /// Deleting a line still referenced by samples is rejected by the
    /// backend; the rejection reaches the caller as a normal API error.
    pub async fn remove_production_line(&self, production_id: i64) -> Result<()> {
        self.api.delete_production_line(production_id).await?;
        info!(production_id, "removed production line");
        Ok(())
    }

    pub async fn sample_types(&self) -> Result<Vec<SampleType>> {
        self.api.sample_types().await
    }

    pub async fn add_sample_type(&self, sample_type: NewSampleType) -> Result<()> {
        if sample_type.name.trim().is_empty() {
            return Err(Error::Validation("a type name is required".into()));
        }
        self.api.create_sample_type(&sample_type).await?;
        info!(name = %sample_type.name, "added sample type");
        Ok(())
    }

    pub async fn remove_sample_type(&self, sample_type_id: i64) -> Result<()> {
        self.api.delete_sample_type(sample_type_id).await?;
        info!(sample_type_id, "removed sample type");
        Ok(())
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        self.api.users().await
    }

    pub async fn add_user(&self, user: NewUser) -> Result<()> {
        if user.user_id.trim().is_empty() {
            return Err(Error::Validation("a user id is required".into()));
        }
        if user.password.is_empty() {
            return Err(Error::Validation("a password is required".into()));
        }
        if !user.email.contains('@') {
            return Err(Error::Validation(format!(
                "{:?} is not a valid email address",
                user.email
            )));
        }
        self.api.create_user(&user).await?;
        info!(user_id = %user.user_id, "added user");
        Ok(())
    }

    pub async fn update_user(&self, user_id: &str, update: UserUpdate) -> Result<()> {
        self.api.update_user(user_id, &update).await?;
        info!(user_id, "updated user");
        Ok(())
    }

    pub async fn remove_user(&self, user_id: &str) -> Result<()> {
        self.api.delete_user(user_id).await?;
        info!(user_id, "removed user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::time::Duration;

    fn sample(id: i64, code: &str, created_by: &str) -> Sample {
        serde_json::from_value(serde_json::json!({
            "sample_id": id,
            "sample_code": code,
            "production_id": 1,
            "sample_type_id": 1,
            "status": "pending",
            "created_by": created_by,
        }))
        .unwrap()
    }

    #[test]
    fn test_next_code_starts_series_at_one() {
        assert_eq!(next_sample_code(&[], 2025), "SAMP-2025-001");
    }

    #[test]
    fn test_next_code_increments_highest() {
        let codes = ["SAMP-2025-001", "SAMP-2025-007", "SAMP-2025-003"];
        assert_eq!(next_sample_code(&codes, 2025), "SAMP-2025-008");
    }

    #[test]
    fn test_next_code_ignores_other_series() {
        let codes = ["SAMP-2024-099", "TILE-2025-500", "freeform"];
        assert_eq!(next_sample_code(&codes, 2025), "SAMP-2025-001");
    }

    #[test]
    fn test_next_code_pads_and_grows() {
        assert_eq!(next_sample_code(&["SAMP-2025-009"], 2025), "SAMP-2025-010");
        assert_eq!(next_sample_code(&["SAMP-2025-999"], 2025), "SAMP-2025-1000");
    }

    #[test]
    fn test_duplicate_code_is_blocked() {
        let existing = ["SAMP-2025-001"];
        let err = resolve_code(Some("SAMP-2025-001"), &existing, 2025).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_blank_code_is_rejected() {
        let err = resolve_code(Some("   "), &[], 2025).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_omitted_code_is_generated() {
        let existing = ["SAMP-2025-004"];
        let code = resolve_code(None, &existing, 2025).unwrap();
        assert_eq!(code, "SAMP-2025-005");
    }

    #[test]
    fn test_scope_mine_hides_other_creators() {
        let samples = vec![
            sample(1, "SAMP-2025-001", "tech7"),
            sample(2, "SAMP-2025-002", "tech9"),
            sample(3, "SAMP-2025-003", "tech7"),
        ];

        let mine = filter_scope(samples, &Scope::Mine("tech7".into()));
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|s| s.created_by == "tech7"));
    }

    #[test]
    fn test_scope_all_keeps_everything() {
        let samples = vec![
            sample(1, "SAMP-2025-001", "tech7"),
            sample(2, "SAMP-2025-002", "tech9"),
        ];
        assert_eq!(filter_scope(samples, &Scope::All).len(), 2);
    }

    #[test]
    fn test_scope_follows_role() {
        let manager = Session {
            token: "t".into(),
            user: User {
                user_id: "mgr1".into(),
                first_name: "K".into(),
                last_name: "O".into(),
                email: "k@o.c".into(),
                role: Role::Manager,
            },
        };
        assert_eq!(Scope::for_session(&manager), Scope::All);

        let tech = Session {
            token: "t".into(),
            user: User {
                user_id: "tech7".into(),
                first_name: "A".into(),
                last_name: "M".into(),
                email: "a@m.c".into(),
                role: Role::LabTechnician,
            },
        };
        assert_eq!(Scope::for_session(&tech), Scope::Mine("tech7".into()));
    }

    #[tokio::test]
    async fn test_unconfirmed_delete_never_reaches_the_network() {
        // The client points at a closed port; a declined confirmation
        // must fail before any request is attempted.
        let api = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let service = SampleService::new(&api);

        let err = service.delete(12, Confirmation::Declined).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
