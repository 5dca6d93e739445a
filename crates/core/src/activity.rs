//! Activity log model: the interactions logged between the CRM user and a
//! person.
//!
//! Every action type is either outbound (done by the user) or inbound (done
//! by the person). Outbound actions may carry a follow-up reminder date,
//! which is what the follow-up classifier in [`crate::follow_up`] works from.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{CalendarDate, EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const LINKEDIN_CONNECTION_REQUEST_SENT: &str = "linkedin_connection_request_sent";
pub const LINKEDIN_CONNECTION_REQUEST_RETRACTED: &str = "linkedin_connection_request_retracted";
pub const LINKEDIN_CONNECTION_REQUEST_ACCEPTED: &str = "linkedin_connection_request_accepted";
pub const LINKEDIN_MESSAGE_SENT: &str = "linkedin_message_sent";
pub const LINKEDIN_MESSAGE_RECEIVED: &str = "linkedin_message_received";
pub const EMAIL_SENT: &str = "email_sent";
pub const EMAIL_RECEIVED: &str = "email_received";

/// All valid action type strings, outbound first.
pub const VALID_ACTION_TYPES: &[&str] = &[
    LINKEDIN_CONNECTION_REQUEST_SENT,
    LINKEDIN_CONNECTION_REQUEST_RETRACTED,
    LINKEDIN_MESSAGE_SENT,
    EMAIL_SENT,
    LINKEDIN_CONNECTION_REQUEST_ACCEPTED,
    LINKEDIN_MESSAGE_RECEIVED,
    EMAIL_RECEIVED,
];

/// Maximum length of a logged message or email body.
pub const MAX_DETAIL_LENGTH: u64 = 20_000;

/// Maximum length of an email subject line.
pub const MAX_SUBJECT_LENGTH: u64 = 998;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Who performed an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Performed by the CRM user toward the person.
    Outbound,
    /// Performed by the person toward the CRM user.
    Inbound,
}

/// Closed set of activity types that can be logged against a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    LinkedinConnectionRequestSent,
    LinkedinConnectionRequestRetracted,
    LinkedinMessageSent,
    EmailSent,
    LinkedinConnectionRequestAccepted,
    LinkedinMessageReceived,
    EmailReceived,
}

impl ActionType {
    /// Every variant, outbound first.
    pub const ALL: [ActionType; 7] = [
        Self::LinkedinConnectionRequestSent,
        Self::LinkedinConnectionRequestRetracted,
        Self::LinkedinMessageSent,
        Self::EmailSent,
        Self::LinkedinConnectionRequestAccepted,
        Self::LinkedinMessageReceived,
        Self::EmailReceived,
    ];

    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            LINKEDIN_CONNECTION_REQUEST_SENT => Ok(Self::LinkedinConnectionRequestSent),
            LINKEDIN_CONNECTION_REQUEST_RETRACTED => Ok(Self::LinkedinConnectionRequestRetracted),
            LINKEDIN_MESSAGE_SENT => Ok(Self::LinkedinMessageSent),
            EMAIL_SENT => Ok(Self::EmailSent),
            LINKEDIN_CONNECTION_REQUEST_ACCEPTED => Ok(Self::LinkedinConnectionRequestAccepted),
            LINKEDIN_MESSAGE_RECEIVED => Ok(Self::LinkedinMessageReceived),
            EMAIL_RECEIVED => Ok(Self::EmailReceived),
            _ => Err(CoreError::Validation(format!(
                "Invalid action type '{s}'. Must be one of: {}",
                VALID_ACTION_TYPES.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkedinConnectionRequestSent => LINKEDIN_CONNECTION_REQUEST_SENT,
            Self::LinkedinConnectionRequestRetracted => LINKEDIN_CONNECTION_REQUEST_RETRACTED,
            Self::LinkedinMessageSent => LINKEDIN_MESSAGE_SENT,
            Self::EmailSent => EMAIL_SENT,
            Self::LinkedinConnectionRequestAccepted => LINKEDIN_CONNECTION_REQUEST_ACCEPTED,
            Self::LinkedinMessageReceived => LINKEDIN_MESSAGE_RECEIVED,
            Self::EmailReceived => EMAIL_RECEIVED,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::LinkedinConnectionRequestSent
            | Self::LinkedinConnectionRequestRetracted
            | Self::LinkedinMessageSent
            | Self::EmailSent => Direction::Outbound,
            Self::LinkedinConnectionRequestAccepted
            | Self::LinkedinMessageReceived
            | Self::EmailReceived => Direction::Inbound,
        }
    }

    pub fn is_outbound(&self) -> bool {
        self.direction() == Direction::Outbound
    }

    pub fn is_inbound(&self) -> bool {
        self.direction() == Direction::Inbound
    }

    /// Inbound actions that do not count as the person responding.
    ///
    /// Accepting a connection request is a click, not a reply.
    pub fn is_ignorable_response(&self) -> bool {
        matches!(self, Self::LinkedinConnectionRequestAccepted)
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::LinkedinConnectionRequestSent => "Sent LinkedIn connection request",
            Self::LinkedinConnectionRequestRetracted => "Retracted LinkedIn connection request",
            Self::LinkedinMessageSent => "Sent LinkedIn message",
            Self::EmailSent => "Sent an email",
            Self::LinkedinConnectionRequestAccepted => "Accepted LinkedIn connection request",
            Self::LinkedinMessageReceived => "Received LinkedIn message",
            Self::EmailReceived => "Received an email",
        }
    }

    /// Which detail fields must be filled in when logging this type.
    pub fn required_details(&self) -> &'static [DetailField] {
        match self {
            Self::LinkedinMessageSent | Self::LinkedinMessageReceived => &[DetailField::Message],
            Self::EmailSent | Self::EmailReceived => &[DetailField::Subject, DetailField::Body],
            Self::LinkedinConnectionRequestSent
            | Self::LinkedinConnectionRequestRetracted
            | Self::LinkedinConnectionRequestAccepted => &[],
        }
    }
}

/// A free-form field attached to an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Message,
    Subject,
    Body,
}

impl DetailField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Subject => "subject",
            Self::Body => "body",
        }
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Optional free-form content of an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ActivityDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_DETAIL_LENGTH))]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_SUBJECT_LENGTH))]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_DETAIL_LENGTH))]
    pub body: Option<String>,
}

impl ActivityDetails {
    fn get(&self, field: DetailField) -> Option<&str> {
        match field {
            DetailField::Message => self.message.as_deref(),
            DetailField::Subject => self.subject.as_deref(),
            DetailField::Body => self.body.as_deref(),
        }
    }
}

/// One logged interaction with a person. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: EntityId,
    pub subject_id: EntityId,
    pub action_type: ActionType,
    /// When the interaction happened, not when it was logged.
    pub occurred_at: Timestamp,
    /// Only meaningful on outbound actions.
    pub follow_up_reminder_date: Option<CalendarDate>,
    #[serde(default)]
    pub details: ActivityDetails,
}

/// Input for logging a new activity.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewActivity {
    pub subject_id: EntityId,
    pub action_type: ActionType,
    pub occurred_at: Timestamp,
    pub follow_up_reminder_date: Option<CalendarDate>,
    #[serde(default)]
    #[validate(nested)]
    pub details: ActivityDetails,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a new activity before it is stored.
///
/// Checks field lengths, the per-type required details, and that reminder
/// dates only appear on outbound actions.
pub fn validate_new_activity(input: &NewActivity) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    for field in input.action_type.required_details() {
        let filled = input
            .details
            .get(*field)
            .is_some_and(|v| !v.trim().is_empty());
        if !filled {
            return Err(CoreError::Validation(format!(
                "A {} is required for '{}'",
                field.name(),
                input.action_type.as_str()
            )));
        }
    }

    if input.action_type.is_inbound() && input.follow_up_reminder_date.is_some() {
        return Err(CoreError::Validation(format!(
            "Follow-up reminders can only be set on outbound actions, not '{}'",
            input.action_type.as_str()
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Borrow the records most recent first.
///
/// Equal timestamps are ordered by id, descending, so that the result is the
/// same for a given input whatever order it arrived in.
pub fn sorted_most_recent_first(activities: &[ActivityRecord]) -> Vec<&ActivityRecord> {
    let mut ordered: Vec<&ActivityRecord> = activities.iter().collect();
    ordered.sort_by(|a, b| {
        b.occurred_at
            .cmp(&a.occurred_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    ordered
}
