//! Snapshot loading and boundary sanitizing.
//!
//! The snapshot is a JSON dump of subjects as the storage layer would hand
//! them over. Everything past this module works on typed core records; bad
//! values are dropped here with a warning instead of failing the whole run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use crm_core::activity::{ActionType, ActivityDetails, ActivityRecord};
use crm_core::calendar::{date_portion, parse_calendar_date};
use crm_core::list_filter::RecordStatus;
use crm_core::todo::{SubjectType, TodoRecord};
use crm_core::types::{EntityId, Timestamp, UserId};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The stored activity log of a subject could not be read as a list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Activity log of subject {subject_id} is not a list")]
pub struct MalformedLog {
    pub subject_id: EntityId,
}

// ---------------------------------------------------------------------------
// Sanitized model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Subject {
    pub id: EntityId,
    pub subject_type: SubjectType,
    pub name: String,
    pub status: Option<RecordStatus>,
    pub relationship_owner_id: Option<UserId>,
    pub tag_ids: Vec<EntityId>,
    pub activities: Result<Vec<ActivityRecord>, MalformedLog>,
    pub todos: Vec<TodoRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub subjects: Vec<Subject>,
}

// ---------------------------------------------------------------------------
// Wire model
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    subjects: Vec<RawSubject>,
}

#[derive(Debug, Deserialize)]
struct RawSubject {
    id: EntityId,
    #[serde(default = "default_subject_type")]
    subject_type: SubjectType,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    relationship_owner_id: Option<serde_json::Value>,
    #[serde(default)]
    tag_ids: Vec<EntityId>,
    /// Kept loose so a non-list value degrades to the fallback status.
    #[serde(default)]
    activities: Option<serde_json::Value>,
    #[serde(default)]
    todos: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawActivity {
    id: EntityId,
    action_type: String,
    occurred_at: String,
    #[serde(default)]
    follow_up_reminder_date: Option<serde_json::Value>,
    #[serde(default)]
    details: ActivityDetails,
}

#[derive(Debug, Deserialize)]
struct RawTodo {
    id: EntityId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    assigned_to: Option<serde_json::Value>,
    #[serde(default)]
    due_date: Option<serde_json::Value>,
    #[serde(default)]
    completed: Option<serde_json::Value>,
    #[serde(default)]
    completed_at: Option<serde_json::Value>,
}

fn default_subject_type() -> SubjectType {
    SubjectType::Person
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read and sanitize a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let snapshot = parse_snapshot(&contents).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        path = %path.display(),
        subjects = snapshot.subjects.len(),
        "Snapshot loaded",
    );

    Ok(snapshot)
}

/// Parse and sanitize snapshot JSON. The document must be an object.
pub fn parse_snapshot(json: &str) -> Result<Snapshot, serde_json::Error> {
    let document: serde_json::Value = serde_json::from_str(json)?;
    if !document.is_object() {
        return Err(serde::de::Error::invalid_type(
            unexpected(&document),
            &"a snapshot object",
        ));
    }
    let raw: RawSnapshot = serde_json::from_value(document)?;
    Ok(Snapshot {
        subjects: raw.subjects.into_iter().map(sanitize_subject).collect(),
    })
}

fn sanitize_subject(raw: RawSubject) -> Subject {
    let subject_id = raw.id;

    let status = raw.status.as_deref().and_then(|value| {
        RecordStatus::from_str_value(value)
            .map_err(|e| tracing::warn!(%subject_id, error = %e, "Ignoring record status"))
            .ok()
    });

    let activities = match raw.activities {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => Ok(items
            .into_iter()
            .filter_map(|item| sanitize_activity(subject_id, item))
            .collect()),
        Some(_) => {
            tracing::warn!(%subject_id, "Activity log is not a list");
            Err(MalformedLog { subject_id })
        }
    };

    let todos = match raw.todos {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| sanitize_todo(raw.subject_type, subject_id, item))
            .collect(),
        Some(_) => {
            tracing::warn!(%subject_id, "Todos field is not a list");
            Vec::new()
        }
    };

    let relationship_owner_id = loose_field(
        raw.relationship_owner_id,
        subject_id,
        "relationship_owner_id",
        |v| uuid::Uuid::parse_str(v).ok(),
    );

    Subject {
        id: subject_id,
        subject_type: raw.subject_type,
        name: raw.name,
        status,
        relationship_owner_id,
        tag_ids: raw.tag_ids,
        activities,
        todos,
    }
}

fn sanitize_activity(subject_id: EntityId, item: serde_json::Value) -> Option<ActivityRecord> {
    let raw: RawActivity = match serde_json::from_value(item) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(%subject_id, error = %e, "Skipping unreadable activity");
            return None;
        }
    };

    let action_type = match ActionType::from_str_value(&raw.action_type) {
        Ok(action_type) => action_type,
        Err(e) => {
            tracing::warn!(%subject_id, activity_id = %raw.id, error = %e, "Skipping activity");
            return None;
        }
    };

    let Some(occurred_at) = parse_timestamp(&raw.occurred_at) else {
        tracing::warn!(
            %subject_id,
            activity_id = %raw.id,
            value = %raw.occurred_at,
            "Skipping activity with unparseable occurred_at",
        );
        return None;
    };

    let follow_up_reminder_date = loose_field(
        raw.follow_up_reminder_date,
        raw.id,
        "follow_up_reminder_date",
        parse_calendar_date,
    );

    Some(ActivityRecord {
        id: raw.id,
        subject_id,
        action_type,
        occurred_at,
        follow_up_reminder_date,
        details: raw.details,
    })
}

fn sanitize_todo(
    subject_type: SubjectType,
    subject_id: EntityId,
    item: serde_json::Value,
) -> Option<TodoRecord> {
    let raw: RawTodo = match serde_json::from_value(item) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(%subject_id, error = %e, "Skipping unreadable todo");
            return None;
        }
    };

    let completed = match raw.completed {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(completed)) => completed,
        Some(other) => {
            tracing::warn!(todo_id = %raw.id, value = %other, "Ignoring malformed completed flag");
            false
        }
    };

    Some(TodoRecord {
        id: raw.id,
        subject_type,
        subject_id,
        title: raw.title,
        assigned_to: loose_field(raw.assigned_to, raw.id, "assigned_to", |v| {
            uuid::Uuid::parse_str(v).ok()
        }),
        due_date: loose_field(raw.due_date, raw.id, "due_date", date_portion),
        completed,
        completed_at: loose_field(raw.completed_at, raw.id, "completed_at", parse_timestamp),
    })
}

/// An optional string field parsed with `parse`.
///
/// Absent, null and blank values are `None`. Anything else that does not
/// parse is logged and also becomes `None`.
fn loose_field<T>(
    value: Option<serde_json::Value>,
    record_id: EntityId,
    field: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) if text.trim().is_empty() => None,
        serde_json::Value::String(text) => {
            let parsed = parse(text.trim());
            if parsed.is_none() {
                tracing::warn!(%record_id, field, value = %text, "Ignoring malformed value");
            }
            parsed
        }
        other => {
            tracing::warn!(%record_id, field, value = %other, "Ignoring non-string value");
            None
        }
    }
}

fn unexpected(value: &serde_json::Value) -> serde::de::Unexpected<'_> {
    use serde::de::Unexpected;
    match value {
        serde_json::Value::Null => Unexpected::Unit,
        serde_json::Value::Bool(b) => Unexpected::Bool(*b),
        serde_json::Value::Number(_) => Unexpected::Other("number"),
        serde_json::Value::String(s) => Unexpected::Str(s),
        serde_json::Value::Array(_) => Unexpected::Seq,
        serde_json::Value::Object(_) => Unexpected::Map,
    }
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.fff]` taken as UTC.
fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    const SUBJECT: &str = "00000000-0000-0000-0000-000000000001";

    fn single(subject_fields: &str) -> Subject {
        let json = format!(r#"{{ "subjects": [ {{ "id": "{SUBJECT}" {subject_fields} }} ] }}"#);
        let mut snapshot = parse_snapshot(&json).unwrap();
        assert_eq!(snapshot.subjects.len(), 1);
        snapshot.subjects.remove(0)
    }

    #[test]
    fn minimal_subject_defaults() {
        let subject = single("");
        assert_eq!(subject.subject_type, SubjectType::Person);
        assert_eq!(subject.name, "");
        assert_eq!(subject.status, None);
        assert_eq!(subject.activities, Ok(Vec::new()));
        assert!(subject.todos.is_empty());
    }

    #[test]
    fn non_list_activities_is_malformed() {
        let subject = single(r#", "activities": { "oops": true }"#);
        assert_matches!(subject.activities, Err(MalformedLog { .. }));

        let subject = single(r#", "activities": "nope""#);
        assert!(subject.activities.is_err());
    }

    #[test]
    fn bad_activities_are_skipped() {
        let subject = single(
            r#", "activities": [
                { "id": "00000000-0000-0000-0000-00000000000a", "action_type": "email_sent",
                  "occurred_at": "2026-01-01T09:00:00Z" },
                { "id": "00000000-0000-0000-0000-00000000000b", "action_type": "fax_sent",
                  "occurred_at": "2026-01-02T09:00:00Z" },
                { "id": "00000000-0000-0000-0000-00000000000c", "action_type": "email_received",
                  "occurred_at": "yesterday" },
                { "action_type": "email_received" }
            ]"#,
        );
        let activities = subject.activities.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].action_type, ActionType::EmailSent);
    }

    #[test]
    fn malformed_reminder_becomes_absent() {
        let subject = single(
            r#", "activities": [
                { "id": "00000000-0000-0000-0000-00000000000a", "action_type": "email_sent",
                  "occurred_at": "2026-01-01T09:00:00", "follow_up_reminder_date": "soon" },
                { "id": "00000000-0000-0000-0000-00000000000b", "action_type": "email_sent",
                  "occurred_at": "2026-01-02T09:00:00Z",
                  "follow_up_reminder_date": "2026-01-08T23:30:00-05:00" },
                { "id": "00000000-0000-0000-0000-00000000000c", "action_type": "email_sent",
                  "occurred_at": "2026-01-03T09:00:00Z", "follow_up_reminder_date": 20260108 }
            ]"#,
        );
        let activities = subject.activities.unwrap();
        assert_eq!(activities[0].follow_up_reminder_date, None);
        assert_eq!(
            activities[1].follow_up_reminder_date,
            NaiveDate::from_ymd_opt(2026, 1, 9)
        );
        assert_eq!(activities.len(), 3);
        assert_eq!(activities[2].follow_up_reminder_date, None);
    }

    #[test]
    fn todos_inherit_subject_and_keep_written_due_day() {
        let subject = single(
            r#", "subject_type": "organization", "todos": [
                { "id": "00000000-0000-0000-0000-0000000000aa", "title": "Call",
                  "due_date": "2026-01-08T23:30:00-05:00" },
                { "id": "00000000-0000-0000-0000-0000000000ab", "due_date": "08/01/2026",
                  "completed": true }
            ]"#,
        );
        assert_eq!(subject.todos.len(), 2);
        assert!(subject
            .todos
            .iter()
            .all(|t| t.subject_type == SubjectType::Organization));
        assert_eq!(subject.todos[0].due_date, NaiveDate::from_ymd_opt(2026, 1, 8));
        assert_eq!(subject.todos[1].due_date, None);
        assert!(subject.todos[1].completed);
    }

    #[test]
    fn unknown_record_status_is_dropped() {
        assert_eq!(single(r#", "status": "Archived""#).status, None);
        assert_eq!(
            single(r#", "status": "Inactive""#).status,
            Some(RecordStatus::Inactive)
        );
    }

    #[test]
    fn invalid_document_is_an_error() {
        assert!(parse_snapshot("[]").is_err());
        assert!(parse_snapshot("42").is_err());
        assert!(parse_snapshot("null").is_err());
        assert!(parse_snapshot(r#"{ "subjects": [ { "name": "no id" } ] }"#).is_err());
    }

    #[test]
    fn malformed_owner_becomes_unassigned() {
        let named = single(r#", "relationship_owner_id": "bob""#);
        assert_eq!(named.relationship_owner_id, None);
        let numeric = single(r#", "relationship_owner_id": 7"#);
        assert_eq!(numeric.relationship_owner_id, None);
        assert_eq!(
            single(r#", "relationship_owner_id": "00000000-0000-0000-0000-0000000000ff""#)
                .relationship_owner_id,
            Some(uuid::Uuid::from_u128(0xff))
        );
    }

    #[test]
    fn malformed_todo_fields_become_absent() {
        let subject = single(
            r#", "todos": [
                { "id": "00000000-0000-0000-0000-0000000000aa", "assigned_to": "bob" },
                { "id": "00000000-0000-0000-0000-0000000000ab", "due_date": 20260308 },
                { "id": "00000000-0000-0000-0000-0000000000ac", "completed": true,
                  "completed_at": "yesterday" },
                { "id": "00000000-0000-0000-0000-0000000000ad", "completed": "yes",
                  "completed_at": "2026-03-08T10:00:00Z" }
            ]"#,
        );
        assert_eq!(subject.todos.len(), 4);
        assert_eq!(subject.todos[0].assigned_to, None);
        assert_eq!(subject.todos[1].due_date, None);
        assert!(subject.todos[2].completed);
        assert_eq!(subject.todos[2].completed_at, None);
        assert!(!subject.todos[3].completed);
        assert_eq!(
            subject.todos[3].completed_at,
            parse_timestamp("2026-03-08T10:00:00Z")
        );
    }

    #[test]
    fn one_bad_todo_does_not_drop_other_subjects() {
        let json = r#"{ "subjects": [
            { "id": "00000000-0000-0000-0000-000000000001", "name": "Valid" },
            { "id": "00000000-0000-0000-0000-000000000002", "name": "Messy",
              "relationship_owner_id": "bob",
              "todos": [
                { "id": "00000000-0000-0000-0000-0000000000aa", "title": "Call",
                  "assigned_to": "bob", "due_date": 20260308, "completed_at": "yesterday" },
                { "title": "no id" }
              ] }
        ] }"#;
        let snapshot = parse_snapshot(json).unwrap();
        assert_eq!(snapshot.subjects.len(), 2);
        assert_eq!(snapshot.subjects[0].name, "Valid");

        let messy = &snapshot.subjects[1];
        assert_eq!(messy.todos.len(), 1);
        assert_eq!(messy.todos[0].title, "Call");
    }

    #[test]
    fn non_list_todos_are_empty() {
        assert!(single(r#", "todos": { "id": 1 }"#).todos.is_empty());
    }
}
