use crate::activity;
use crate::backend::JobBoardBackend;
use crate::cache::CacheCodec;
use crate::chat;
use crate::errors::{AppError, AppResult};
use crate::identity::{require_identity, IdentityProvider};
use crate::models::{
    AddInvoicePayload, AddWebhookPayload, ApiKey, Application, ChatMessage, Identity, Integrations,
    IntegrationConnection, IntegrationKind, Interview, InterviewStatus, Invoice, InvoiceStatus,
    InviteTeamMemberPayload, Job, NewPosting, ResumePatch, ResumeState, Role,
    ScheduleInterviewPayload, Severity, TeamMember, WebhookEndpoint, WorkspaceRecord,
};
use crate::sync;
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

#[derive(Debug)]
struct StoreState {
    record: WorkspaceRecord,
    revision: u64,
}

pub struct WorkspaceStore<B: JobBoardBackend> {
    identity: Identity,
    codec: Arc<CacheCodec>,
    backend: Arc<B>,
    state: Mutex<StoreState>,
}

impl<B: JobBoardBackend> WorkspaceStore<B> {
    pub fn initialize(
        provider: &dyn IdentityProvider,
        codec: Arc<CacheCodec>,
        backend: Arc<B>,
    ) -> AppResult<Self> {
        let identity = require_identity(provider)?;
        let record = codec.load(&identity);
        tracing::info!(identity = %identity.id, role = identity.role.as_str(), "workspace initialized");

        Ok(Self {
            identity,
            codec,
            backend,
            state: Mutex::new(StoreState { record, revision: 0 }),
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn snapshot(&self) -> AppResult<WorkspaceRecord> {
        Ok(self.lock_state()?.record.clone())
    }

    pub fn revision(&self) -> AppResult<u64> {
        Ok(self.lock_state()?.revision)
    }

    fn lock_state(&self) -> AppResult<std::sync::MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("workspace state mutex poisoned".to_string()))
    }

    // Atomic snapshot replacement: the transform runs on a copy, and only a
    // fully successful transform becomes the new record. Persistence is
    // best-effort and never fails the mutation.
    fn mutate<T>(&self, transform: impl FnOnce(&mut WorkspaceRecord) -> AppResult<T>) -> AppResult<T> {
        let mut state = self.lock_state()?;
        let mut next = state.record.clone();
        let outcome = transform(&mut next)?;
        state.record = next;
        state.revision += 1;
        self.codec.store(&self.identity, &state.record);
        Ok(outcome)
    }

    pub async fn synchronize(&self) -> AppResult<()> {
        let projection = match sync::run(self.backend.as_ref(), &self.identity).await {
            Ok(projection) => projection,
            Err(error) => {
                tracing::warn!(error = %error, identity = %self.identity.id, "remote sync failed");
                return Err(error);
            }
        };

        self.mutate(|record| {
            projection.apply(record)?;
            activity::record(record, "sync", "Workspace synchronized with job board", Severity::Info);
            Ok(())
        })
    }

    // ─── Jobs & applications ────────────────────────────────────────────────

    pub fn toggle_saved_job(&self, job_id: &str) -> AppResult<bool> {
        require_text(job_id, "job id")?;
        self.mutate(|record| {
            if let Some(index) = record.saved_jobs.iter().position(|id| id == job_id) {
                record.saved_jobs.remove(index);
                activity::record(record, "jobs", &format!("Removed saved job {}", job_id), Severity::Info);
                return Ok(false);
            }
            if !record.jobs.iter().any(|job| job.id == job_id) {
                return Err(AppError::NotFound(format!("no job {}", job_id)));
            }
            record.saved_jobs.push(job_id.to_string());
            activity::record(record, "jobs", &format!("Saved job {}", job_id), Severity::Info);
            Ok(true)
        })
    }

    pub async fn apply_to_job(&self, job_id: &str, cover_letter: &str) -> AppResult<Application> {
        require_text(cover_letter, "cover letter")?;
        {
            let state = self.lock_state()?;
            if state.record.applied_job_ids.iter().any(|id| id == job_id) {
                return Err(AppError::Validation(format!("already applied to job {}", job_id)));
            }
        }

        let created = self
            .backend
            .create_application(&self.identity, job_id, cover_letter)
            .await?;

        let application = Application {
            id: created.id,
            job_id: created.posting_id,
            position: created.position,
            company: created.company,
            stage: created.status,
            updated_at: created.updated_at,
        };

        self.mutate(|record| {
            if !record.applied_job_ids.iter().any(|id| id == job_id) {
                record.applied_job_ids.push(job_id.to_string());
            }
            record.applications.push(application.clone());
            activity::record(
                record,
                "applications",
                &format!("Applied for {} at {}", application.position, application.company),
                Severity::Success,
            );
            Ok(application.clone())
        })
    }

    // ─── Resume & integrations ──────────────────────────────────────────────

    pub fn update_resume(&self, patch: ResumePatch) -> AppResult<ResumeState> {
        if let Some(full_name) = &patch.full_name {
            require_text(full_name, "full name")?;
        }
        self.mutate(|record| {
            if let Some(full_name) = patch.full_name {
                record.resume.full_name = full_name;
            }
            if let Some(headline) = patch.headline {
                record.resume.headline = headline;
            }
            if let Some(summary) = patch.summary {
                record.resume.summary = summary;
            }
            if let Some(skills) = patch.skills {
                record.resume.skills = skills;
            }
            activity::record(record, "resume", "Updated resume", Severity::Info);
            Ok(record.resume.clone())
        })
    }

    pub fn connect_integration(&self, kind: IntegrationKind, account: &str) -> AppResult<()> {
        require_text(account, "account")?;
        self.mutate(|record| {
            let connection = integration_slot(&mut record.integrations, kind);
            *connection = IntegrationConnection {
                connected: true,
                account: Some(account.to_string()),
                connected_at: Some(Utc::now()),
            };
            activity::record(
                record,
                "integrations",
                &format!("Connected {} as {}", integration_name(kind), account),
                Severity::Success,
            );
            Ok(())
        })
    }

    pub fn disconnect_integration(&self, kind: IntegrationKind) -> AppResult<()> {
        self.mutate(|record| {
            *integration_slot(&mut record.integrations, kind) = IntegrationConnection::default();
            activity::record(
                record,
                "integrations",
                &format!("Disconnected {}", integration_name(kind)),
                Severity::Info,
            );
            Ok(())
        })
    }

    // ─── Interviews ─────────────────────────────────────────────────────────

    pub fn schedule_interview(&self, payload: ScheduleInterviewPayload) -> AppResult<Interview> {
        require_text(&payload.counterpart, "counterpart")?;
        require_text(&payload.position, "position")?;
        let scheduled_at = parse_schedule_time(&payload.scheduled_at)?;

        self.mutate(|record| {
            let interview = Interview {
                id: Uuid::new_v4().to_string(),
                counterpart: payload.counterpart.clone(),
                position: payload.position.clone(),
                scheduled_at,
                status: InterviewStatus::Scheduled,
            };
            record.interviews.push(interview.clone());
            activity::record(
                record,
                "interviews",
                &format!("Scheduled interview with {}", interview.counterpart),
                Severity::Info,
            );
            Ok(interview)
        })
    }

    pub fn set_interview_status(&self, interview_id: &str, status: InterviewStatus) -> AppResult<()> {
        self.mutate(|record| {
            let Some(interview) = record
                .interviews
                .iter_mut()
                .find(|interview| interview.id == interview_id)
            else {
                return Err(AppError::NotFound(format!("no interview {}", interview_id)));
            };
            interview.status = status;
            let counterpart = interview.counterpart.clone();
            activity::record(
                record,
                "interviews",
                &format!("Updated interview with {}", counterpart),
                Severity::Info,
            );
            Ok(())
        })
    }

    // ─── Team ───────────────────────────────────────────────────────────────

    pub fn invite_team_member(&self, payload: InviteTeamMemberPayload) -> AppResult<TeamMember> {
        require_text(&payload.name, "name")?;
        require_text(&payload.role_title, "role title")?;
        if !EMAIL_PATTERN.is_match(payload.email.trim()) {
            return Err(AppError::Validation(format!("invalid email address: {}", payload.email)));
        }

        self.mutate(|record| {
            if record
                .team_members
                .iter()
                .any(|member| member.email.eq_ignore_ascii_case(payload.email.trim()))
            {
                return Err(AppError::Validation(format!("{} is already on the team", payload.email)));
            }
            let member = TeamMember {
                id: Uuid::new_v4().to_string(),
                name: payload.name.clone(),
                email: payload.email.trim().to_string(),
                role_title: payload.role_title.clone(),
                invited_at: Utc::now(),
            };
            record.team_members.push(member.clone());
            activity::record(record, "team", &format!("Invited {}", member.email), Severity::Success);
            Ok(member)
        })
    }

    pub fn remove_team_member(&self, member_id: &str) -> AppResult<()> {
        self.mutate(|record| {
            let before = record.team_members.len();
            record.team_members.retain(|member| member.id != member_id);
            if record.team_members.len() == before {
                return Err(AppError::NotFound(format!("no team member {}", member_id)));
            }
            activity::record(record, "team", "Removed a team member", Severity::Info);
            Ok(())
        })
    }

    // ─── Billing ────────────────────────────────────────────────────────────

    pub fn add_invoice(&self, payload: AddInvoicePayload) -> AppResult<Invoice> {
        require_text(&payload.number, "invoice number")?;
        if payload.amount_cents <= 0 {
            return Err(AppError::Validation("invoice amount must be positive".to_string()));
        }

        self.mutate(|record| {
            let invoice = Invoice {
                id: Uuid::new_v4().to_string(),
                number: payload.number.clone(),
                amount_cents: payload.amount_cents,
                issued_at: Utc::now(),
                status: InvoiceStatus::Due,
            };
            record.invoices.push(invoice.clone());
            activity::record(record, "billing", &format!("Issued invoice {}", invoice.number), Severity::Info);
            Ok(invoice)
        })
    }

    // ─── API keys & webhooks ────────────────────────────────────────────────

    pub fn create_api_key(&self, label: &str) -> AppResult<ApiKey> {
        require_text(label, "label")?;
        self.mutate(|record| {
            let key = ApiKey {
                id: Uuid::new_v4().to_string(),
                label: label.to_string(),
                token: generate_token(),
                created_at: Utc::now(),
                last_rotated_at: None,
            };
            record.api_keys.push(key.clone());
            activity::record(record, "api", &format!("Created API key {}", key.label), Severity::Info);
            Ok(key)
        })
    }

    pub fn rotate_api_key(&self, key_id: &str) -> AppResult<ApiKey> {
        self.mutate(|record| {
            let Some(key) = record.api_keys.iter_mut().find(|key| key.id == key_id) else {
                return Err(AppError::NotFound(format!("no api key {}", key_id)));
            };
            key.token = generate_token();
            key.last_rotated_at = Some(Utc::now());
            let rotated = key.clone();
            activity::record(record, "api", &format!("Rotated API key {}", rotated.label), Severity::Warning);
            Ok(rotated)
        })
    }

    pub fn revoke_api_key(&self, key_id: &str) -> AppResult<()> {
        self.mutate(|record| {
            let before = record.api_keys.len();
            record.api_keys.retain(|key| key.id != key_id);
            if record.api_keys.len() == before {
                return Err(AppError::NotFound(format!("no api key {}", key_id)));
            }
            activity::record(record, "api", "Revoked an API key", Severity::Warning);
            Ok(())
        })
    }

    pub fn add_webhook(&self, payload: AddWebhookPayload) -> AppResult<WebhookEndpoint> {
        let url = payload.url.trim();
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(AppError::Validation(format!("webhook url must be http(s): {}", payload.url)));
        }
        if payload.events.is_empty() {
            return Err(AppError::Validation("webhook needs at least one event".to_string()));
        }

        self.mutate(|record| {
            let endpoint = WebhookEndpoint {
                id: Uuid::new_v4().to_string(),
                url: url.to_string(),
                events: payload.events.clone(),
                active: true,
                created_at: Utc::now(),
            };
            record.webhooks.push(endpoint.clone());
            activity::record(record, "webhooks", &format!("Added webhook {}", endpoint.url), Severity::Info);
            Ok(endpoint)
        })
    }

    pub fn toggle_webhook(&self, webhook_id: &str) -> AppResult<bool> {
        self.mutate(|record| {
            let Some(endpoint) = record.webhooks.iter_mut().find(|hook| hook.id == webhook_id) else {
                return Err(AppError::NotFound(format!("no webhook {}", webhook_id)));
            };
            endpoint.active = !endpoint.active;
            let (active, url) = (endpoint.active, endpoint.url.clone());
            let verb = if active { "Enabled" } else { "Disabled" };
            activity::record(record, "webhooks", &format!("{} webhook {}", verb, url), Severity::Info);
            Ok(active)
        })
    }

    // ─── Notifications & chat ───────────────────────────────────────────────

    pub fn mark_notification_read(&self, notification_id: &str) -> AppResult<()> {
        self.mutate(|record| {
            activity::mark_read(record, notification_id)?;
            activity::record(record, "notifications", "Marked a notification read", Severity::Info);
            Ok(())
        })
    }

    pub fn mark_all_notifications_read(&self) -> AppResult<()> {
        self.mutate(|record| {
            activity::mark_all_read(record);
            activity::record(record, "notifications", "Marked all notifications read", Severity::Info);
            Ok(())
        })
    }

    pub fn send_chat_message(&self, participant_id: &str, body: &str) -> AppResult<ChatMessage> {
        require_text(participant_id, "participant id")?;
        require_text(body, "message body")?;
        self.mutate(|record| {
            let message = chat::send(record, &self.identity, participant_id, body.trim());
            activity::record(record, "chat", &format!("Messaged {}", participant_id), Severity::Info);
            Ok(message)
        })
    }

    pub fn chat_with(&self, participant_id: &str) -> AppResult<Vec<ChatMessage>> {
        let state = self.lock_state()?;
        Ok(chat::messages_with(&state.record, participant_id).to_vec())
    }

    // ─── Employer postings ──────────────────────────────────────────────────

    pub async fn create_posting(&self, fields: NewPosting) -> AppResult<Job> {
        self.require_role(Role::Employer)?;
        require_text(&fields.title, "title")?;
        require_text(&fields.description, "description")?;

        let posting = self.backend.create_posting(&self.identity, fields).await?;
        let job = Job {
            id: posting.id,
            title: posting.title,
            company: posting.company,
            location: posting.location,
            employment_type: posting.employment_type,
            salary_range: posting.salary_range,
            description: posting.description,
            posted_at: posting.posted_at,
        };

        self.mutate(|record| {
            record.jobs.push(job.clone());
            activity::record(record, "postings", &format!("Published posting {}", job.title), Severity::Success);
            Ok(job.clone())
        })
    }

    pub async fn delete_posting(&self, posting_id: &str) -> AppResult<()> {
        self.require_role(Role::Employer)?;
        self.backend.delete_posting(posting_id).await?;
        self.mutate(|record| {
            record.jobs.retain(|job| job.id != posting_id);
            activity::record(record, "postings", "Removed a posting", Severity::Info);
            Ok(())
        })
    }

    fn require_role(&self, role: Role) -> AppResult<()> {
        if self.identity.role != role {
            return Err(AppError::Validation(format!(
                "action requires the {} role",
                role.as_str()
            )));
        }
        Ok(())
    }
}

fn require_text(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn integration_slot(integrations: &mut Integrations, kind: IntegrationKind) -> &mut IntegrationConnection {
    match kind {
        IntegrationKind::Github => &mut integrations.github,
        IntegrationKind::Linkedin => &mut integrations.linkedin,
    }
}

fn integration_name(kind: IntegrationKind) -> &'static str {
    match kind {
        IntegrationKind::Github => "GitHub",
        IntegrationKind::Linkedin => "LinkedIn",
    }
}

fn generate_token() -> String {
    format!("jk_{}", Uuid::new_v4().simple())
}

fn parse_schedule_time(raw: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(parsed.and_utc());
    }
    Err(AppError::Validation(format!("unparsable interview time: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::cache::CacheCodec;
    use crate::db::CacheDb;
    use crate::identity::{employer, job_seeker, StaticIdentityProvider};
    use crate::models::EmploymentType;

    fn codec(dir: &tempfile::TempDir) -> Arc<CacheCodec> {
        let db = Arc::new(CacheDb::new(&dir.path().join("cache.db")).expect("db"));
        Arc::new(CacheCodec::new(db, "workspaceRecords").expect("codec"))
    }

    fn seeker_provider() -> StaticIdentityProvider {
        StaticIdentityProvider::signed_in(job_seeker("user-1", "ada@example.com", "Ada"))
    }

    async fn seeded_backend() -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::new());
        let owner = employer("emp-1", "jobs@acme.com", "Acme");
        backend
            .create_posting(
                &owner,
                NewPosting {
                    title: "Rust Engineer".to_string(),
                    location: "Remote".to_string(),
                    employment_type: EmploymentType::FullTime,
                    salary_range: Some("$140k".to_string()),
                    description: "Write Rust".to_string(),
                },
            )
            .await
            .expect("posting");
        backend
    }

    #[tokio::test]
    async fn cold_start_job_seeker_has_empty_remote_fields_and_seeded_resume() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorkspaceStore::initialize(&seeker_provider(), codec(&dir), seeded_backend().await)
            .expect("store");

        let snapshot = store.snapshot().expect("snapshot");
        assert!(snapshot.jobs.is_empty());
        assert!(snapshot.applications.is_empty());
        assert!(snapshot.candidates.is_empty());
        assert!(snapshot.activity.is_empty());
        assert_eq!(snapshot.resume.full_name, "Ada");
        assert_eq!(snapshot.resume.email, "ada@example.com");
    }

    #[tokio::test]
    async fn toggle_saved_job_round_trips_to_original_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorkspaceStore::initialize(&seeker_provider(), codec(&dir), seeded_backend().await)
            .expect("store");
        store.synchronize().await.expect("sync");

        let job_id = store.snapshot().expect("snapshot").jobs[0].id.clone();
        assert!(store.toggle_saved_job(&job_id).expect("save"));
        assert_eq!(store.snapshot().expect("snapshot").saved_jobs, vec![job_id.clone()]);
        assert!(!store.toggle_saved_job(&job_id).expect("unsave"));
        assert!(store.snapshot().expect("snapshot").saved_jobs.is_empty());
    }

    #[tokio::test]
    async fn saving_an_unknown_job_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorkspaceStore::initialize(&seeker_provider(), codec(&dir), seeded_backend().await)
            .expect("store");
        let error = store.toggle_saved_job("ghost-job").expect_err("must fail");
        assert!(error.to_string().contains("NOT_FOUND"));
    }

    #[tokio::test]
    async fn sync_preserves_locally_owned_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorkspaceStore::initialize(&seeker_provider(), codec(&dir), seeded_backend().await)
            .expect("store");
        store.synchronize().await.expect("sync");

        let job_id = store.snapshot().expect("snapshot").jobs[0].id.clone();
        store.toggle_saved_job(&job_id).expect("save");
        store
            .update_resume(ResumePatch {
                headline: Some("Senior Rustacean".to_string()),
                ..ResumePatch::default()
            })
            .expect("resume");

        store.synchronize().await.expect("second sync");

        let snapshot = store.snapshot().expect("snapshot");
        assert_eq!(snapshot.saved_jobs, vec![job_id]);
        assert_eq!(snapshot.resume.headline, "Senior Rustacean");
        assert_eq!(snapshot.jobs.len(), 1);
    }

    #[tokio::test]
    async fn apply_to_job_records_application_and_activity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorkspaceStore::initialize(&seeker_provider(), codec(&dir), seeded_backend().await)
            .expect("store");
        store.synchronize().await.expect("sync");
        let job_id = store.snapshot().expect("snapshot").jobs[0].id.clone();

        let application = store.apply_to_job(&job_id, "Please hire me").await.expect("apply");
        assert_eq!(application.position, "Rust Engineer");

        let snapshot = store.snapshot().expect("snapshot");
        assert_eq!(snapshot.applied_job_ids, vec![job_id.clone()]);
        assert_eq!(snapshot.applications.len(), 1);
        assert!(snapshot.activity[0].message.contains("Applied for"));

        let error = store.apply_to_job(&job_id, "again").await.expect_err("must fail");
        assert!(error.to_string().contains("VALIDATION_FAILED"));
    }

    #[tokio::test]
    async fn invalid_input_never_partially_applies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorkspaceStore::initialize(
            &StaticIdentityProvider::signed_in(employer("emp-1", "jobs@acme.com", "Acme")),
            codec(&dir),
            seeded_backend().await,
        )
        .expect("store");
        let revision = store.revision().expect("revision");

        let error = store
            .invite_team_member(InviteTeamMemberPayload {
                name: "Bea".to_string(),
                email: "not-an-email".to_string(),
                role_title: "Recruiter".to_string(),
            })
            .expect_err("must fail");
        assert!(error.to_string().contains("VALIDATION_FAILED"));

        let error = store
            .schedule_interview(ScheduleInterviewPayload {
                counterpart: "Ada".to_string(),
                position: "Rust Engineer".to_string(),
                scheduled_at: "next tuesday-ish".to_string(),
            })
            .expect_err("must fail");
        assert!(error.to_string().contains("unparsable interview time"));

        let snapshot = store.snapshot().expect("snapshot");
        assert!(snapshot.team_members.is_empty());
        assert!(snapshot.interviews.is_empty());
        assert!(snapshot.activity.is_empty());
        assert_eq!(store.revision().expect("revision"), revision);
    }

    #[tokio::test]
    async fn interview_times_accept_both_supported_formats() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorkspaceStore::initialize(
            &StaticIdentityProvider::signed_in(employer("emp-1", "jobs@acme.com", "Acme")),
            codec(&dir),
            seeded_backend().await,
        )
        .expect("store");

        store
            .schedule_interview(ScheduleInterviewPayload {
                counterpart: "Ada".to_string(),
                position: "Rust Engineer".to_string(),
                scheduled_at: "2026-09-10T14:30:00Z".to_string(),
            })
            .expect("rfc3339");
        store
            .schedule_interview(ScheduleInterviewPayload {
                counterpart: "Bea".to_string(),
                position: "Rust Engineer".to_string(),
                scheduled_at: "2026-09-11T09:00".to_string(),
            })
            .expect("naive format");

        assert_eq!(store.snapshot().expect("snapshot").interviews.len(), 2);
    }

    #[tokio::test]
    async fn api_key_rotation_replaces_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorkspaceStore::initialize(&seeker_provider(), codec(&dir), seeded_backend().await)
            .expect("store");

        let key = store.create_api_key("ci").expect("create");
        assert!(key.token.starts_with("jk_"));
        let rotated = store.rotate_api_key(&key.id).expect("rotate");
        assert_ne!(rotated.token, key.token);
        assert!(rotated.last_rotated_at.is_some());

        store.revoke_api_key(&key.id).expect("revoke");
        assert!(store.snapshot().expect("snapshot").api_keys.is_empty());
    }

    #[tokio::test]
    async fn remote_failure_leaves_local_functionality_intact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = seeded_backend().await;
        let store =
            WorkspaceStore::initialize(&seeker_provider(), codec(&dir), backend.clone()).expect("store");

        backend.set_offline(true);
        let error = store.synchronize().await.expect_err("must fail");
        assert!(error.to_string().contains("REMOTE_FAILURE"));

        store
            .update_resume(ResumePatch {
                summary: Some("Still works offline".to_string()),
                ..ResumePatch::default()
            })
            .expect("resume");
        store.send_chat_message("peer-1", "hello").expect("chat");

        let snapshot = store.snapshot().expect("snapshot");
        assert_eq!(snapshot.resume.summary, "Still works offline");
        assert_eq!(snapshot.chats.get("peer-1").map(Vec::len), Some(1));
        assert!(snapshot.jobs.is_empty());
    }

    #[tokio::test]
    async fn posting_management_requires_employer_role() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorkspaceStore::initialize(&seeker_provider(), codec(&dir), seeded_backend().await)
            .expect("store");

        let error = store
            .create_posting(NewPosting {
                title: "Imposter".to_string(),
                location: "Nowhere".to_string(),
                employment_type: EmploymentType::Contract,
                salary_range: None,
                description: "nope".to_string(),
            })
            .await
            .expect_err("must fail");
        assert!(error.to_string().contains("requires the employer role"));
    }

    #[tokio::test]
    async fn mutations_bump_revision_and_persist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let codec = codec(&dir);
        let backend = seeded_backend().await;

        let store =
            WorkspaceStore::initialize(&seeker_provider(), codec.clone(), backend.clone()).expect("store");
        store.send_chat_message("peer-1", "persist me").expect("chat");
        assert_eq!(store.revision().expect("revision"), 1);
        drop(store);

        let reopened = WorkspaceStore::initialize(&seeker_provider(), codec, backend).expect("store");
        let snapshot = reopened.snapshot().expect("snapshot");
        assert_eq!(snapshot.chats.get("peer-1").map(Vec::len), Some(1));
        // Activity is a disposable cache: it does not survive a reload.
        assert!(snapshot.activity.is_empty());
    }
}
