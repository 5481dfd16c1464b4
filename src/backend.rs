use crate::errors::{AppError, AppResult};
use crate::models::{
    ApplicationRecord, ApplicationStage, Identity, NewPosting, Posting,
};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingScope {
    Open,
    Employer(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationScope {
    Applicant(String),
    ForPostings(Vec<String>),
}

pub trait JobBoardBackend: Send + Sync {
    fn list_postings(&self, scope: PostingScope) -> impl std::future::Future<Output = AppResult<Vec<Posting>>> + Send;
    fn list_applications(
        &self,
        scope: ApplicationScope,
    ) -> impl std::future::Future<Output = AppResult<Vec<ApplicationRecord>>> + Send;
    fn create_posting(
        &self,
        identity: &Identity,
        fields: NewPosting,
    ) -> impl std::future::Future<Output = AppResult<Posting>> + Send;
    fn delete_posting(&self, posting_id: &str) -> impl std::future::Future<Output = AppResult<()>> + Send;
    fn create_application(
        &self,
        identity: &Identity,
        posting_id: &str,
        cover_letter: &str,
    ) -> impl std::future::Future<Output = AppResult<ApplicationRecord>> + Send;
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    postings: Mutex<Vec<Posting>>,
    applications: Mutex<Vec<ApplicationRecord>>,
    offline: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    // Stage changes happen on the employer's side of the backing store; this
    // stands in for that flow when seeding fixtures.
    pub fn advance_application(&self, application_id: &str, stage: ApplicationStage) -> AppResult<()> {
        let mut applications = self.lock_applications()?;
        let Some(record) = applications.iter_mut().find(|record| record.id == application_id) else {
            return Err(AppError::NotFound(format!("no application {}", application_id)));
        };
        record.status = stage;
        record.updated_at = Utc::now();
        Ok(())
    }

    fn check_reachable(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Remote("job board unreachable".to_string()));
        }
        Ok(())
    }

    fn lock_postings(&self) -> AppResult<std::sync::MutexGuard<'_, Vec<Posting>>> {
        self.postings
            .lock()
            .map_err(|_| AppError::Internal("backend postings mutex poisoned".to_string()))
    }

    fn lock_applications(&self) -> AppResult<std::sync::MutexGuard<'_, Vec<ApplicationRecord>>> {
        self.applications
            .lock()
            .map_err(|_| AppError::Internal("backend applications mutex poisoned".to_string()))
    }
}

impl JobBoardBackend for InMemoryBackend {
    async fn list_postings(&self, scope: PostingScope) -> AppResult<Vec<Posting>> {
        self.check_reachable()?;
        let postings = self.lock_postings()?;
        Ok(postings
            .iter()
            .filter(|posting| match &scope {
                PostingScope::Open => posting.open,
                PostingScope::Employer(id) => posting.employer_id == *id,
            })
            .cloned()
            .collect())
    }

    async fn list_applications(&self, scope: ApplicationScope) -> AppResult<Vec<ApplicationRecord>> {
        self.check_reachable()?;
        let applications = self.lock_applications()?;
        Ok(applications
            .iter()
            .filter(|application| match &scope {
                ApplicationScope::Applicant(id) => application.applicant_id == *id,
                ApplicationScope::ForPostings(ids) => ids.contains(&application.posting_id),
            })
            .cloned()
            .collect())
    }

    async fn create_posting(&self, identity: &Identity, fields: NewPosting) -> AppResult<Posting> {
        self.check_reachable()?;
        let posting = Posting {
            id: Uuid::new_v4().to_string(),
            employer_id: identity.id.clone(),
            title: fields.title,
            company: identity.display_name.clone(),
            location: fields.location,
            employment_type: fields.employment_type,
            salary_range: fields.salary_range,
            description: fields.description,
            open: true,
            posted_at: Utc::now(),
        };
        self.lock_postings()?.push(posting.clone());
        Ok(posting)
    }

    async fn delete_posting(&self, posting_id: &str) -> AppResult<()> {
        self.check_reachable()?;
        let mut postings = self.lock_postings()?;
        let before = postings.len();
        postings.retain(|posting| posting.id != posting_id);
        if postings.len() == before {
            return Err(AppError::NotFound(format!("no posting {}", posting_id)));
        }
        Ok(())
    }

    async fn create_application(
        &self,
        identity: &Identity,
        posting_id: &str,
        cover_letter: &str,
    ) -> AppResult<ApplicationRecord> {
        self.check_reachable()?;
        let posting = {
            let postings = self.lock_postings()?;
            postings
                .iter()
                .find(|posting| posting.id == posting_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("no posting {}", posting_id)))?
        };

        let now = Utc::now();
        let application = ApplicationRecord {
            id: Uuid::new_v4().to_string(),
            posting_id: posting.id,
            applicant_id: identity.id.clone(),
            applicant_name: identity.display_name.clone(),
            applicant_email: identity.email.clone(),
            position: posting.title,
            company: posting.company,
            status: ApplicationStage::Applied,
            cover_letter: cover_letter.to_string(),
            submitted_at: now,
            updated_at: now,
        };
        self.lock_applications()?.push(application.clone());
        Ok(application)
    }
}
