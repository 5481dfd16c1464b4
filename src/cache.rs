use crate::db::CacheDb;
use crate::errors::{AppError, AppResult};
use crate::models::{
    ChatMessage, Identity, IntegrationConnection, Integrations, ResumeState, WorkspaceRecord,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

type Sanitizer = fn(&Identity, Option<&Value>) -> Value;

#[derive(Clone, Copy)]
pub enum LoadPolicy {
    Preserve(Sanitizer),
    Reset,
}

pub struct FieldSpec {
    pub name: &'static str,
    pub load: LoadPolicy,
    pub sync_owned: bool,
}

// The single ownership declaration for every WorkspaceRecord field. Reset
// fields are disposable caches repopulated by sync or explicit user action;
// sync-owned fields are the only ones a projection merge may overwrite.
pub const FIELD_TABLE: &[FieldSpec] = &[
    FieldSpec { name: "jobs", load: LoadPolicy::Reset, sync_owned: true },
    FieldSpec { name: "savedJobs", load: LoadPolicy::Preserve(string_set), sync_owned: false },
    FieldSpec { name: "appliedJobIds", load: LoadPolicy::Preserve(string_set), sync_owned: false },
    FieldSpec { name: "applications", load: LoadPolicy::Reset, sync_owned: true },
    FieldSpec { name: "candidates", load: LoadPolicy::Reset, sync_owned: true },
    FieldSpec { name: "messages", load: LoadPolicy::Reset, sync_owned: true },
    FieldSpec { name: "notifications", load: LoadPolicy::Reset, sync_owned: true },
    FieldSpec { name: "interviews", load: LoadPolicy::Reset, sync_owned: false },
    FieldSpec { name: "teamMembers", load: LoadPolicy::Reset, sync_owned: false },
    FieldSpec { name: "invoices", load: LoadPolicy::Reset, sync_owned: false },
    FieldSpec { name: "apiKeys", load: LoadPolicy::Reset, sync_owned: false },
    FieldSpec { name: "webhooks", load: LoadPolicy::Reset, sync_owned: false },
    FieldSpec { name: "activity", load: LoadPolicy::Reset, sync_owned: false },
    FieldSpec { name: "analytics", load: LoadPolicy::Reset, sync_owned: true },
    FieldSpec { name: "resume", load: LoadPolicy::Preserve(resume), sync_owned: false },
    FieldSpec { name: "integrations", load: LoadPolicy::Preserve(integrations), sync_owned: false },
    FieldSpec { name: "chats", load: LoadPolicy::Preserve(chats), sync_owned: false },
];

pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELD_TABLE.iter().find(|spec| spec.name == name)
}

fn string_set(_identity: &Identity, raw: Option<&Value>) -> Value {
    let mut seen = BTreeSet::new();
    let items = match raw {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };
    Value::Array(
        items
            .iter()
            .filter_map(|item| item.as_str())
            .filter(|id| !id.is_empty() && seen.insert(id.to_string()))
            .map(|id| Value::String(id.to_string()))
            .collect(),
    )
}

fn resume(identity: &Identity, raw: Option<&Value>) -> Value {
    let cached = raw.and_then(Value::as_object);
    let text = |key: &str| -> Option<String> {
        cached
            .and_then(|map| map.get(key))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    };

    let state = ResumeState {
        full_name: identity.display_name.clone(),
        email: identity.email.clone(),
        headline: text("headline").unwrap_or_default(),
        summary: text("summary").unwrap_or_default(),
        skills: cached
            .and_then(|map| map.get("skills"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    };
    serde_json::to_value(state).unwrap_or(Value::Null)
}

fn integrations(_identity: &Identity, raw: Option<&Value>) -> Value {
    let cached = raw.and_then(Value::as_object);
    let connection = |key: &str| -> IntegrationConnection {
        cached
            .and_then(|map| map.get(key))
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    };

    let state = Integrations {
        github: connection("github"),
        linkedin: connection("linkedin"),
    };
    serde_json::to_value(state).unwrap_or(Value::Null)
}

fn chats(_identity: &Identity, raw: Option<&Value>) -> Value {
    let mut sanitized = Map::new();
    if let Some(map) = raw.and_then(Value::as_object) {
        for (participant, messages) in map {
            let Some(items) = messages.as_array() else {
                continue;
            };
            let kept: Vec<Value> = items
                .iter()
                .filter(|item| serde_json::from_value::<ChatMessage>((*item).clone()).is_ok())
                .cloned()
                .collect();
            sanitized.insert(participant.clone(), Value::Array(kept));
        }
    }
    Value::Object(sanitized)
}

pub fn sanitize_record(identity: &Identity, raw: &Value) -> WorkspaceRecord {
    if !raw.is_object() {
        return WorkspaceRecord::for_identity(identity);
    }
    let source = raw.as_object().map(Clone::clone).unwrap_or_default();

    let mut fields = Map::new();
    for spec in FIELD_TABLE {
        let value = match spec.load {
            LoadPolicy::Reset => Value::Array(Vec::new()),
            LoadPolicy::Preserve(sanitize) => sanitize(identity, source.get(spec.name)),
        };
        fields.insert(spec.name.to_string(), value);
    }

    match serde_json::from_value(Value::Object(fields)) {
        Ok(record) => record,
        Err(error) => {
            tracing::warn!(error = %error, identity = %identity.id, "sanitized record failed to decode, using defaults");
            WorkspaceRecord::for_identity(identity)
        }
    }
}

pub struct CacheCodec {
    db: Arc<CacheDb>,
    slot_name: String,
}

impl CacheCodec {
    pub fn new(db: Arc<CacheDb>, slot_name: impl Into<String>) -> AppResult<Self> {
        verify_field_classification()?;
        Ok(Self {
            db,
            slot_name: slot_name.into(),
        })
    }

    pub fn load(&self, identity: &Identity) -> WorkspaceRecord {
        let slot = match self.db.read_slot(&self.slot_name) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(error = %error, "cache slot unreadable, starting from defaults");
                None
            }
        };

        match slot.as_ref().and_then(|map| map.get(identity.id.as_str())) {
            Some(raw) => sanitize_record(identity, raw),
            None => WorkspaceRecord::for_identity(identity),
        }
    }

    // Best-effort: a write that cannot complete must never block the caller.
    pub fn store(&self, identity: &Identity, record: &WorkspaceRecord) {
        let payload = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(error = %error, identity = %identity.id, "workspace record not serializable, skipping persist");
                return;
            }
        };

        // An absent or non-object slot starts a fresh map; a read error does
        // not, since writing over it would drop every other identity's slot.
        // The next successful mutation will retry the persist.
        let mut slot = match self.db.read_slot(&self.slot_name) {
            Ok(Some(Value::Object(map))) => map,
            Ok(_) => Map::new(),
            Err(error) => {
                tracing::warn!(error = %error, identity = %identity.id, "cache slot unreadable before persist, skipping write");
                return;
            }
        };
        slot.insert(identity.id.clone(), payload);

        if let Err(error) = self.db.write_slot(&self.slot_name, &Value::Object(slot)) {
            tracing::warn!(error = %error, identity = %identity.id, "workspace persist failed");
        }
    }
}

fn verify_field_classification() -> AppResult<()> {
    let declared: BTreeSet<&str> = FIELD_TABLE.iter().map(|spec| spec.name).collect();
    if declared.len() != FIELD_TABLE.len() {
        return Err(AppError::Internal("duplicate entry in workspace field table".to_string()));
    }

    let serialized = serde_json::to_value(WorkspaceRecord::default())?;
    let Some(map) = serialized.as_object() else {
        return Err(AppError::Internal("workspace record did not serialize to an object".to_string()));
    };
    let actual: BTreeSet<&str> = map.keys().map(String::as_str).collect();

    if declared != actual {
        let missing: Vec<&str> = actual.difference(&declared).copied().collect();
        let stale: Vec<&str> = declared.difference(&actual).copied().collect();
        return Err(AppError::Internal(format!(
            "workspace field table out of date (unclassified: {:?}, stale: {:?})",
            missing, stale
        )));
    }
    Ok(())
}
