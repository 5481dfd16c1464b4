use crate::models::{
    Candidate, EmploymentType, Interview, InterviewStatus, Job, MessageItem, NotificationItem,
    Severity, WorkspaceRecord,
};
use serde::{Deserialize, Serialize};

fn matches(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

pub fn search_jobs<'a>(
    workspace: &'a WorkspaceRecord,
    query: &str,
    employment_type: Option<EmploymentType>,
) -> Vec<&'a Job> {
    let needle = query.trim().to_lowercase();
    workspace
        .jobs
        .iter()
        .filter(|job| employment_type.map_or(true, |wanted| job.employment_type == wanted))
        .filter(|job| {
            needle.is_empty()
                || matches(&job.title, &needle)
                || matches(&job.company, &needle)
                || matches(&job.location, &needle)
                || matches(&job.description, &needle)
        })
        .collect()
}

pub fn search_candidates<'a>(workspace: &'a WorkspaceRecord, query: &str) -> Vec<&'a Candidate> {
    let needle = query.trim().to_lowercase();
    workspace
        .candidates
        .iter()
        .filter(|candidate| {
            needle.is_empty()
                || matches(&candidate.name, &needle)
                || matches(&candidate.email, &needle)
                || matches(&candidate.position, &needle)
        })
        .collect()
}

pub fn search_messages<'a>(workspace: &'a WorkspaceRecord, query: &str) -> Vec<&'a MessageItem> {
    let needle = query.trim().to_lowercase();
    workspace
        .messages
        .iter()
        .filter(|message| {
            needle.is_empty()
                || matches(&message.from, &needle)
                || matches(&message.subject, &needle)
                || matches(&message.preview, &needle)
        })
        .collect()
}

pub fn notifications_by_severity<'a>(
    workspace: &'a WorkspaceRecord,
    severity: Option<Severity>,
) -> Vec<&'a NotificationItem> {
    workspace
        .notifications
        .iter()
        .filter(|item| severity.map_or(true, |wanted| item.severity == wanted))
        .collect()
}

pub fn interviews_by_status<'a>(
    workspace: &'a WorkspaceRecord,
    status: Option<InterviewStatus>,
) -> Vec<&'a Interview> {
    workspace
        .interviews
        .iter()
        .filter(|interview| status.map_or(true, |wanted| interview.status == wanted))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub applications: i64,
    pub interviews: i64,
    pub offers: i64,
    pub rejected: i64,
    pub interview_rate: f64,
    pub offer_rate: f64,
}

pub fn analytics_summary(workspace: &WorkspaceRecord) -> AnalyticsSummary {
    let value = |label: &str| -> i64 {
        workspace
            .analytics
            .iter()
            .find(|point| point.label == label)
            .map(|point| point.value)
            .unwrap_or(0)
    };
    let applications = value("applications");
    let interviews = value("interviews");
    let offers = value("offers");
    let rate = |part: i64| -> f64 {
        if applications == 0 {
            0.0
        } else {
            part as f64 / applications as f64
        }
    };

    AnalyticsSummary {
        applications,
        interviews,
        offers,
        rejected: value("rejected"),
        interview_rate: rate(interviews),
        offer_rate: rate(offers),
    }
}

pub fn unread_notification_count(workspace: &WorkspaceRecord) -> usize {
    workspace.notifications.iter().filter(|item| !item.read).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalyticsPoint;
    use chrono::Utc;

    fn job(id: &str, title: &str, employment_type: EmploymentType) -> Job {
        Job {
            id: id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            employment_type,
            salary_range: None,
            description: "desc".to_string(),
            posted_at: Utc::now(),
        }
    }

    #[test]
    fn job_search_combines_text_and_employment_filters() {
        let mut workspace = WorkspaceRecord::default();
        workspace.jobs = vec![
            job("j1", "Rust Engineer", EmploymentType::FullTime),
            job("j2", "Rust Intern", EmploymentType::Internship),
            job("j3", "Designer", EmploymentType::FullTime),
        ];

        let hits = search_jobs(&workspace, "rust", Some(EmploymentType::FullTime));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "j1");

        assert_eq!(search_jobs(&workspace, "", None).len(), 3);
        assert_eq!(search_jobs(&workspace, "RUST", None).len(), 2);
    }

    #[test]
    fn notification_and_interview_filters_are_pure_subsets() {
        let mut workspace = WorkspaceRecord::default();
        crate::activity::push_notification(&mut workspace, "a", "b", Severity::Warning);
        crate::activity::push_notification(&mut workspace, "c", "d", Severity::Info);

        assert_eq!(notifications_by_severity(&workspace, Some(Severity::Warning)).len(), 1);
        assert_eq!(notifications_by_severity(&workspace, None).len(), 2);
        assert_eq!(unread_notification_count(&workspace), 2);

        workspace.interviews.push(Interview {
            id: "i1".to_string(),
            counterpart: "Ada".to_string(),
            position: "Engineer".to_string(),
            scheduled_at: Utc::now(),
            status: InterviewStatus::Completed,
        });
        assert!(interviews_by_status(&workspace, Some(InterviewStatus::Scheduled)).is_empty());
        assert_eq!(interviews_by_status(&workspace, Some(InterviewStatus::Completed)).len(), 1);
    }

    #[test]
    fn analytics_summary_computes_rates_from_points() {
        let mut workspace = WorkspaceRecord::default();
        workspace.analytics = vec![
            AnalyticsPoint { label: "applications".to_string(), value: 4 },
            AnalyticsPoint { label: "interviews".to_string(), value: 2 },
            AnalyticsPoint { label: "offers".to_string(), value: 1 },
            AnalyticsPoint { label: "rejected".to_string(), value: 1 },
        ];

        let summary = analytics_summary(&workspace);
        assert_eq!(summary.applications, 4);
        assert!((summary.interview_rate - 0.5).abs() < f64::EPSILON);
        assert!((summary.offer_rate - 0.25).abs() < f64::EPSILON);

        let empty = analytics_summary(&WorkspaceRecord::default());
        assert_eq!(empty.applications, 0);
        assert_eq!(empty.offer_rate, 0.0);
    }
}
