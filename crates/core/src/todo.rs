//! Todo records and the due-date aggregation used by list views.
//!
//! One counting routine backs both uses: the badge count shown in a row and
//! the pass/fail decision of the list filter (`count > 0`). The reference
//! date and week window are fixed once per [`TodoCounter`] so every todo in
//! a pass is judged against the same day.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::activity::ActivityRecord;
use crate::calendar::{week_bounds, WeekStart};
use crate::error::CoreError;
use crate::types::{CalendarDate, EntityId, Timestamp, UserId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const SUBJECT_PERSON: &str = "person";
pub const SUBJECT_ORGANIZATION: &str = "organization";

/// All valid subject type strings.
pub const VALID_SUBJECT_TYPES: &[&str] = &[SUBJECT_PERSON, SUBJECT_ORGANIZATION];

pub const FILTER_ALL: &str = "all";
pub const FILTER_OUTSTANDING: &str = "outstanding";
pub const FILTER_DUE_TODAY: &str = "due_today";
pub const FILTER_DUE_THIS_WEEK: &str = "due_this_week";
pub const FILTER_OUTSTANDING_FOR_ME: &str = "outstanding_for_me";
pub const FILTER_DUE_TODAY_FOR_ME: &str = "due_today_for_me";

/// All valid todo filter strings.
pub const VALID_TODO_FILTERS: &[&str] = &[
    FILTER_ALL,
    FILTER_OUTSTANDING,
    FILTER_DUE_TODAY,
    FILTER_DUE_THIS_WEEK,
    FILTER_OUTSTANDING_FOR_ME,
    FILTER_DUE_TODAY_FOR_ME,
];

/// Maximum length of a todo title.
pub const MAX_TODO_TITLE_LENGTH: u64 = 500;

/// Prefix of the title given to todos created from a follow-up reminder.
pub const FOLLOW_UP_TODO_PREFIX: &str = "Follow up: ";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of record a todo is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Person,
    Organization,
}

impl SubjectType {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            SUBJECT_PERSON => Ok(Self::Person),
            SUBJECT_ORGANIZATION => Ok(Self::Organization),
            _ => Err(CoreError::Validation(format!(
                "Invalid subject type '{s}'. Must be one of: {}",
                VALID_SUBJECT_TYPES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => SUBJECT_PERSON,
            Self::Organization => SUBJECT_ORGANIZATION,
        }
    }
}

/// Which todos a list view counts or filters on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoFilterType {
    #[default]
    All,
    Outstanding,
    DueToday,
    DueThisWeek,
    OutstandingForMe,
    DueTodayForMe,
}

impl TodoFilterType {
    pub const ALL: [TodoFilterType; 6] = [
        Self::All,
        Self::Outstanding,
        Self::DueToday,
        Self::DueThisWeek,
        Self::OutstandingForMe,
        Self::DueTodayForMe,
    ];

    /// Strict conversion, for validating configuration.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            FILTER_ALL => Ok(Self::All),
            FILTER_OUTSTANDING => Ok(Self::Outstanding),
            FILTER_DUE_TODAY => Ok(Self::DueToday),
            FILTER_DUE_THIS_WEEK => Ok(Self::DueThisWeek),
            FILTER_OUTSTANDING_FOR_ME => Ok(Self::OutstandingForMe),
            FILTER_DUE_TODAY_FOR_ME => Ok(Self::DueTodayForMe),
            _ => Err(CoreError::Validation(format!(
                "Invalid todo filter '{s}'. Must be one of: {}",
                VALID_TODO_FILTERS.join(", ")
            ))),
        }
    }

    /// Lenient conversion for filter models coming from a list view.
    /// Unknown values count everything.
    pub fn parse_or_all(s: &str) -> Self {
        Self::from_str_value(s).unwrap_or(Self::All)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => FILTER_ALL,
            Self::Outstanding => FILTER_OUTSTANDING,
            Self::DueToday => FILTER_DUE_TODAY,
            Self::DueThisWeek => FILTER_DUE_THIS_WEEK,
            Self::OutstandingForMe => FILTER_OUTSTANDING_FOR_ME,
            Self::DueTodayForMe => FILTER_DUE_TODAY_FOR_ME,
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All To-Do Items",
            Self::Outstanding => "Outstanding To-Do Items",
            Self::DueToday => "To-Do Items Due Today",
            Self::DueThisWeek => "To-Do Items Due This Week",
            Self::OutstandingForMe => "Outstanding To-Do Items for Me",
            Self::DueTodayForMe => "To-Do Items Due Today for Me",
        }
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// A task attached to a person or organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    pub id: EntityId,
    pub subject_type: SubjectType,
    pub subject_id: EntityId,
    pub title: String,
    pub assigned_to: Option<UserId>,
    /// Calendar date only; never compared with a time of day.
    pub due_date: Option<CalendarDate>,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

impl TodoRecord {
    /// Flip completion, stamping or clearing `completed_at`.
    pub fn toggle_completed(&mut self, now: Timestamp) {
        self.completed = !self.completed;
        self.completed_at = self.completed.then_some(now);
    }

    fn is_due_on(&self, day: CalendarDate) -> bool {
        self.due_date == Some(day)
    }

    fn is_assigned_to(&self, user: Option<UserId>) -> bool {
        user.is_some() && self.assigned_to == user
    }
}

/// Input for creating or editing a todo.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TodoDraft {
    pub subject_type: SubjectType,
    pub subject_id: EntityId,
    #[validate(
        length(min = 1, max = MAX_TODO_TITLE_LENGTH),
        custom(function = validate_not_blank)
    )]
    pub title: String,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<CalendarDate>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Title is required".into()));
    }
    Ok(())
}

impl TodoDraft {
    /// Validate the draft and return it with a trimmed title.
    pub fn into_validated(mut self) -> Result<Self, CoreError> {
        self.title = self.title.trim().to_string();
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(self)
    }
}

/// The todo created when an outbound activity is logged with a reminder.
///
/// Returns `None` for inbound activities and for activities without a
/// reminder date.
pub fn follow_up_todo(
    activity: &ActivityRecord,
    assigned_to: Option<UserId>,
) -> Option<TodoDraft> {
    if !activity.action_type.is_outbound() {
        return None;
    }
    let due_date = activity.follow_up_reminder_date?;
    Some(TodoDraft {
        subject_type: SubjectType::Person,
        subject_id: activity.subject_id,
        title: format!("{FOLLOW_UP_TODO_PREFIX}{}", activity.action_type.label()),
        assigned_to,
        due_date: Some(due_date),
    })
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Date window and viewer captured once for an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoCounter {
    today: CalendarDate,
    week_start: CalendarDate,
    week_end: CalendarDate,
    current_user: Option<UserId>,
}

impl TodoCounter {
    pub fn new(
        reference_date: CalendarDate,
        week_start: WeekStart,
        current_user: Option<UserId>,
    ) -> Self {
        let (start, end) = week_bounds(reference_date, week_start);
        Self {
            today: reference_date,
            week_start: start,
            week_end: end,
            current_user,
        }
    }

    pub fn today(&self) -> CalendarDate {
        self.today
    }

    /// Inclusive bounds of the "due this week" window.
    pub fn week(&self) -> (CalendarDate, CalendarDate) {
        (self.week_start, self.week_end)
    }

    fn matches(&self, todo: &TodoRecord, filter: TodoFilterType) -> bool {
        match filter {
            TodoFilterType::All => true,
            TodoFilterType::Outstanding => !todo.completed,
            TodoFilterType::DueToday => !todo.completed && todo.is_due_on(self.today),
            TodoFilterType::DueThisWeek => {
                !todo.completed
                    && todo
                        .due_date
                        .is_some_and(|due| self.week_start <= due && due <= self.week_end)
            }
            TodoFilterType::OutstandingForMe => {
                !todo.completed && todo.is_assigned_to(self.current_user)
            }
            TodoFilterType::DueTodayForMe => {
                !todo.completed
                    && todo.is_assigned_to(self.current_user)
                    && todo.is_due_on(self.today)
            }
        }
    }

    /// Number of todos selected by `filter`.
    pub fn count(&self, todos: &[TodoRecord], filter: TodoFilterType) -> usize {
        todos.iter().filter(|t| self.matches(t, filter)).count()
    }

    /// Whether any todo is selected by `filter`.
    pub fn passes(&self, todos: &[TodoRecord], filter: TodoFilterType) -> bool {
        self.count(todos, filter) > 0
    }
}

/// Count a subject's todos for `filter` on `reference_date`.
///
/// Absent todos count as none. Weeks start on Sunday; use [`TodoCounter`]
/// directly for another convention or to reuse the window across subjects.
pub fn count_todos(
    todos: Option<&[TodoRecord]>,
    filter: TodoFilterType,
    current_user: Option<UserId>,
    reference_date: CalendarDate,
) -> usize {
    TodoCounter::new(reference_date, WeekStart::default(), current_user)
        .count(todos.unwrap_or_default(), filter)
}

/// List-filter form of [`count_todos`].
pub fn todo_filter_passes(
    todos: Option<&[TodoRecord]>,
    filter: TodoFilterType,
    current_user: Option<UserId>,
    reference_date: CalendarDate,
) -> bool {
    count_todos(todos, filter, current_user, reference_date) > 0
}
