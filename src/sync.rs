use crate::backend::{ApplicationScope, JobBoardBackend, PostingScope};
use crate::cache;
use crate::errors::{AppError, AppResult};
use crate::models::{
    AnalyticsPoint, Application, ApplicationRecord, ApplicationStage, Candidate, CandidateStatus,
    Identity, Job, MessageItem, NotificationItem, Posting, Role, Severity, WorkspaceRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProjection {
    pub jobs: Vec<Job>,
    pub applications: Vec<Application>,
    pub candidates: Vec<Candidate>,
    pub messages: Vec<MessageItem>,
    pub notifications: Vec<NotificationItem>,
    pub analytics: Vec<AnalyticsPoint>,
}

impl SyncProjection {
    // Merge through the serialized form so every touched field passes the
    // ownership table; an unclassified or locally-owned key is a bug here,
    // not a recoverable condition for the caller's data.
    pub fn apply(self, workspace: &mut WorkspaceRecord) -> AppResult<()> {
        let base = serde_json::to_value(&*workspace)?;
        let Value::Object(mut base) = base else {
            return Err(AppError::Internal("workspace record did not serialize to an object".to_string()));
        };
        let patch = serde_json::to_value(&self)?;
        let Value::Object(patch) = patch else {
            return Err(AppError::Internal("sync projection did not serialize to an object".to_string()));
        };

        for (key, value) in patch {
            let Some(spec) = cache::field_spec(&key) else {
                return Err(AppError::Internal(format!("sync projection carries unclassified field {}", key)));
            };
            if !spec.sync_owned {
                return Err(AppError::Internal(format!(
                    "sync projection must not overwrite locally-owned field {}",
                    key
                )));
            }
            base.insert(key, value);
        }

        *workspace = serde_json::from_value(Value::Object(base))?;
        Ok(())
    }
}

pub async fn run<B: JobBoardBackend>(backend: &B, identity: &Identity) -> AppResult<SyncProjection> {
    match identity.role {
        Role::JobSeeker => project_job_seeker(backend, identity).await,
        Role::Employer => project_employer(backend, identity).await,
    }
}

async fn project_job_seeker<B: JobBoardBackend>(
    backend: &B,
    identity: &Identity,
) -> AppResult<SyncProjection> {
    let postings = backend.list_postings(PostingScope::Open).await?;
    let records = backend
        .list_applications(ApplicationScope::Applicant(identity.id.clone()))
        .await?;

    let applications: Vec<Application> = records
        .iter()
        .map(|record| Application {
            id: record.id.clone(),
            job_id: record.posting_id.clone(),
            position: record.position.clone(),
            company: record.company.clone(),
            stage: record.status,
            updated_at: record.updated_at,
        })
        .collect();

    let messages = records
        .iter()
        .map(|record| MessageItem {
            id: Uuid::new_v4().to_string(),
            from: record.company.clone(),
            subject: format!("Application received: {}", record.position),
            preview: format!("Your application for {} was sent to {}", record.position, record.company),
            sent_at: record.submitted_at,
            read: false,
        })
        .collect();

    let notifications = records
        .iter()
        .filter(|record| record.status != ApplicationStage::Applied)
        .map(|record| NotificationItem {
            id: Uuid::new_v4().to_string(),
            title: "Application update".to_string(),
            body: format!(
                "{} at {} moved to {}",
                record.position,
                record.company,
                record.status.as_str()
            ),
            severity: stage_severity(record.status),
            created_at: record.updated_at,
            read: false,
        })
        .collect();

    Ok(SyncProjection {
        jobs: postings.into_iter().map(posting_to_job).collect(),
        analytics: count_by_stage(&records),
        applications,
        candidates: Vec::new(),
        messages,
        notifications,
    })
}

async fn project_employer<B: JobBoardBackend>(
    backend: &B,
    identity: &Identity,
) -> AppResult<SyncProjection> {
    let postings = backend
        .list_postings(PostingScope::Employer(identity.id.clone()))
        .await?;
    let posting_ids: Vec<String> = postings.iter().map(|posting| posting.id.clone()).collect();
    let records = backend
        .list_applications(ApplicationScope::ForPostings(posting_ids))
        .await?;

    let candidates: Vec<Candidate> = records
        .iter()
        .map(|record| Candidate {
            id: record.id.clone(),
            name: record.applicant_name.clone(),
            email: record.applicant_email.clone(),
            position: record.position.clone(),
            job_id: record.posting_id.clone(),
            status: CandidateStatus::from_stage(record.status),
            applied_at: record.submitted_at,
        })
        .collect();

    let messages = records
        .iter()
        .map(|record| MessageItem {
            id: Uuid::new_v4().to_string(),
            from: record.applicant_name.clone(),
            subject: format!("Application for {}", record.position),
            preview: truncate_preview(&record.cover_letter),
            sent_at: record.submitted_at,
            read: false,
        })
        .collect();

    let notifications = records
        .iter()
        .filter(|record| record.status == ApplicationStage::Applied)
        .map(|record| NotificationItem {
            id: Uuid::new_v4().to_string(),
            title: "New applicant".to_string(),
            body: format!("{} applied for {}", record.applicant_name, record.position),
            severity: Severity::Info,
            created_at: record.submitted_at,
            read: false,
        })
        .collect();

    Ok(SyncProjection {
        jobs: postings.into_iter().map(posting_to_job).collect(),
        analytics: count_by_stage(&records),
        applications: Vec::new(),
        candidates,
        messages,
        notifications,
    })
}

fn posting_to_job(posting: Posting) -> Job {
    Job {
        id: posting.id,
        title: posting.title,
        company: posting.company,
        location: posting.location,
        employment_type: posting.employment_type,
        salary_range: posting.salary_range,
        description: posting.description,
        posted_at: posting.posted_at,
    }
}

fn stage_severity(stage: ApplicationStage) -> Severity {
    match stage {
        ApplicationStage::Offer => Severity::Success,
        ApplicationStage::Rejected => Severity::Warning,
        _ => Severity::Info,
    }
}

fn truncate_preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 80;
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}

fn count_by_stage(records: &[ApplicationRecord]) -> Vec<AnalyticsPoint> {
    let count = |stage: ApplicationStage| -> i64 {
        records.iter().filter(|record| record.status == stage).count() as i64
    };
    vec![
        AnalyticsPoint {
            label: "applications".to_string(),
            value: records.len() as i64,
        },
        AnalyticsPoint {
            label: "interviews".to_string(),
            value: count(ApplicationStage::Interview),
        },
        AnalyticsPoint {
            label: "offers".to_string(),
            value: count(ApplicationStage::Offer),
        },
        AnalyticsPoint {
            label: "rejected".to_string(),
            value: count(ApplicationStage::Rejected),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::identity::{employer, job_seeker};
    use crate::models::{EmploymentType, NewPosting};

    async fn backend_with_applications() -> (InMemoryBackend, Identity) {
        let backend = InMemoryBackend::new();
        let owner = employer("emp-1", "jobs@acme.com", "Acme");
        let posting = backend
            .create_posting(
                &owner,
                NewPosting {
                    title: "Rust Engineer".to_string(),
                    location: "Remote".to_string(),
                    employment_type: EmploymentType::FullTime,
                    salary_range: None,
                    description: "Write Rust".to_string(),
                },
            )
            .await
            .expect("posting");

        let ada = job_seeker("user-1", "ada@example.com", "Ada");
        backend
            .create_application(&ada, &posting.id, "Hire me")
            .await
            .expect("application");
        let bea = job_seeker("user-2", "bea@example.com", "Bea");
        let second = backend
            .create_application(&bea, &posting.id, "Me too")
            .await
            .expect("application");

        backend
            .advance_application(&second.id, ApplicationStage::Interview)
            .expect("advance");

        (backend, owner)
    }

    #[tokio::test]
    async fn employer_projection_counts_stages() {
        let (backend, owner) = backend_with_applications().await;
        let projection = run(&backend, &owner).await.expect("projection");

        assert_eq!(projection.candidates.len(), 2);
        assert_eq!(projection.messages.len(), 2);
        let value = |label: &str| {
            projection
                .analytics
                .iter()
                .find(|point| point.label == label)
                .map(|point| point.value)
        };
        assert_eq!(value("applications"), Some(2));
        assert_eq!(value("interviews"), Some(1));
        assert_eq!(value("offers"), Some(0));
    }

    #[tokio::test]
    async fn job_seeker_projection_builds_applications_and_confirmations() {
        let (backend, _) = backend_with_applications().await;
        let ada = job_seeker("user-1", "ada@example.com", "Ada");
        let projection = run(&backend, &ada).await.expect("projection");

        assert_eq!(projection.jobs.len(), 1);
        assert_eq!(projection.applications.len(), 1);
        assert_eq!(projection.applications[0].stage, ApplicationStage::Applied);
        assert_eq!(projection.messages.len(), 1);
        assert!(projection.messages[0].subject.starts_with("Application received"));
        assert!(projection.candidates.is_empty());
    }

    #[tokio::test]
    async fn apply_overwrites_only_sync_owned_fields() {
        let (backend, owner) = backend_with_applications().await;
        let projection = run(&backend, &owner).await.expect("projection");

        let mut workspace = WorkspaceRecord::default();
        workspace.saved_jobs = vec!["job-x".to_string()];
        workspace.resume.full_name = "Keep Me".to_string();
        crate::activity::record(&mut workspace, "test", "local event", Severity::Info);

        projection.apply(&mut workspace).expect("apply");

        assert_eq!(workspace.saved_jobs, vec!["job-x".to_string()]);
        assert_eq!(workspace.resume.full_name, "Keep Me");
        assert_eq!(workspace.activity.len(), 1);
        assert_eq!(workspace.jobs.len(), 1);
        assert_eq!(workspace.candidates.len(), 2);
    }
}
