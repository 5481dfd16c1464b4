use crate::errors::{AppError, AppResult};
use crate::models::{ActivityEvent, Severity, WorkspaceRecord};
use chrono::Utc;
use uuid::Uuid;

pub const ACTIVITY_CAP: usize = 30;

pub fn record(workspace: &mut WorkspaceRecord, area: &str, message: &str, severity: Severity) {
    workspace.activity.insert(
        0,
        ActivityEvent {
            id: Uuid::new_v4().to_string(),
            area: area.to_string(),
            message: message.to_string(),
            severity,
            created_at: Utc::now(),
        },
    );
    workspace.activity.truncate(ACTIVITY_CAP);
}

// Production notifications come out of the sync projection; this seeds them
// directly for view and read-flag tests.
#[cfg(test)]
pub fn push_notification(
    workspace: &mut WorkspaceRecord,
    title: &str,
    body: &str,
    severity: Severity,
) {
    workspace.notifications.insert(
        0,
        crate::models::NotificationItem {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            body: body.to_string(),
            severity,
            created_at: Utc::now(),
            read: false,
        },
    );
}

pub fn mark_read(workspace: &mut WorkspaceRecord, notification_id: &str) -> AppResult<()> {
    let Some(notification) = workspace
        .notifications
        .iter_mut()
        .find(|item| item.id == notification_id)
    else {
        return Err(AppError::NotFound(format!("no notification {}", notification_id)));
    };
    notification.read = true;
    Ok(())
}

pub fn mark_all_read(workspace: &mut WorkspaceRecord) {
    for notification in &mut workspace.notifications {
        notification.read = true;
    }
}
