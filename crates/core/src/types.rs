/// Primary keys for persons, organizations, activities and todos are UUIDs.
pub type EntityId = uuid::Uuid;

/// Identifier of an application user (relationship owner, todo assignee).
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A calendar day with no time-of-day or timezone component.
pub type CalendarDate = chrono::NaiveDate;
