//! Row filters for the person and organization list views.
//!
//! Each column filter is inactive when nothing is selected. A row is shown
//! when every active filter passes. The todo column reuses the shared
//! [`TodoCounter`] so the filter and the badge count can never disagree.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::follow_up::FollowUpReminderStatus;
use crate::todo::{TodoCounter, TodoFilterType, TodoRecord};
use crate::types::{EntityId, UserId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const RECORD_STATUS_ACTIVE: &str = "Active";
pub const RECORD_STATUS_INACTIVE: &str = "Inactive";

/// All valid record status strings.
pub const VALID_RECORD_STATUSES: &[&str] = &[RECORD_STATUS_ACTIVE, RECORD_STATUS_INACTIVE];

/// Owner selection meaning "no relationship owner assigned".
pub const OWNER_SELECTION_NONE: &str = "none";

// ---------------------------------------------------------------------------
// Column filters
// ---------------------------------------------------------------------------

/// Whether a person or organization is still being worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            RECORD_STATUS_ACTIVE => Ok(Self::Active),
            RECORD_STATUS_INACTIVE => Ok(Self::Inactive),
            _ => Err(CoreError::Validation(format!(
                "Invalid record status '{s}'. Must be one of: {}",
                VALID_RECORD_STATUSES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => RECORD_STATUS_ACTIVE,
            Self::Inactive => RECORD_STATUS_INACTIVE,
        }
    }
}

/// Relationship-owner column filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnerFilter {
    #[default]
    Any,
    /// Rows with no relationship owner.
    Unassigned,
    Owner(UserId),
}

impl OwnerFilter {
    /// Parse the owner dropdown selection: nothing, `"none"`, or a user id.
    pub fn from_selection(selection: Option<&str>) -> Result<Self, CoreError> {
        match selection {
            None | Some("") => Ok(Self::Any),
            Some(OWNER_SELECTION_NONE) => Ok(Self::Unassigned),
            Some(raw) => uuid::Uuid::parse_str(raw)
                .map(Self::Owner)
                .map_err(|_| CoreError::InvalidValue {
                    field: "relationship_owner_id",
                    value: raw.to_string(),
                }),
        }
    }

    fn passes(&self, owner: Option<UserId>) -> bool {
        match self {
            Self::Any => true,
            Self::Unassigned => owner.is_none(),
            Self::Owner(id) => owner == Some(*id),
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// The data a list row carries for filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub subject_id: EntityId,
    pub status: Option<RecordStatus>,
    pub relationship_owner_id: Option<UserId>,
    pub tag_ids: Vec<EntityId>,
    /// Only persons carry a follow-up status.
    pub follow_up_status: Option<FollowUpReminderStatus>,
    pub todos: Vec<TodoRecord>,
}

/// The combined column filters of a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub status: Option<RecordStatus>,
    pub owner: OwnerFilter,
    /// A row must carry every selected tag.
    pub tags: Vec<EntityId>,
    pub follow_up: Option<FollowUpReminderStatus>,
    /// `All` leaves the todo column unfiltered.
    pub todo: TodoFilterType,
}

impl ListFilter {
    /// The filter a list view opens with: active records only.
    pub fn default_view() -> Self {
        Self {
            status: Some(RecordStatus::Active),
            ..Self::default()
        }
    }

    pub fn is_inactive(&self) -> bool {
        *self == Self::default()
    }

    pub fn passes(&self, row: &ListRow, counter: &TodoCounter) -> bool {
        if let Some(status) = self.status {
            if row.status != Some(status) {
                return false;
            }
        }

        if !self.owner.passes(row.relationship_owner_id) {
            return false;
        }

        if !self.tags.iter().all(|tag| row.tag_ids.contains(tag)) {
            return false;
        }

        if let Some(wanted) = self.follow_up {
            if row.follow_up_status != Some(wanted) {
                return false;
            }
        }

        self.todo == TodoFilterType::All || counter.passes(&row.todos, self.todo)
    }

    /// Rows that pass, in their original order.
    pub fn apply<'a>(&self, rows: &'a [ListRow], counter: &TodoCounter) -> Vec<&'a ListRow> {
        rows.iter().filter(|row| self.passes(row, counter)).collect()
    }
}
