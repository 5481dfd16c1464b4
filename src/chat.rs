use crate::models::{ChatMessage, Identity, Role, WorkspaceRecord};
use chrono::Utc;
use uuid::Uuid;

pub fn send(
    workspace: &mut WorkspaceRecord,
    sender: &Identity,
    participant_id: &str,
    body: &str,
) -> ChatMessage {
    let message = ChatMessage {
        id: Uuid::new_v4().to_string(),
        sender_id: sender.id.clone(),
        sender_name: sender.display_name.clone(),
        body: body.to_string(),
        is_employer: sender.role == Role::Employer,
        sent_at: Utc::now(),
    };
    workspace
        .chats
        .entry(participant_id.to_string())
        .or_default()
        .push(message.clone());
    message
}

pub fn messages_with<'a>(workspace: &'a WorkspaceRecord, participant_id: &str) -> &'a [ChatMessage] {
    workspace
        .chats
        .get(participant_id)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
