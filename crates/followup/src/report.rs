//! Per-subject follow-up report.
//!
//! One pass over a sanitized snapshot: the reference date and the todo
//! window are fixed up front and shared by every subject.

use std::fmt;

use crm_core::calendar::WeekStart;
use crm_core::follow_up::{
    assess, reminder_notice, status_or_fallback, summarize, FollowUpReminderStatus,
    FollowUpSummary,
};
use crm_core::list_filter::{ListFilter, ListRow};
use crm_core::todo::{SubjectType, TodoCounter, TodoFilterType};
use crm_core::types::{CalendarDate, EntityId};
use serde::Serialize;

use crate::config::FollowUpConfig;
use crate::snapshot::{load_snapshot, Snapshot, SnapshotError, Subject};

/// One reported subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectReport {
    pub id: EntityId,
    pub name: String,
    pub subject_type: SubjectType,
    /// `None` for organizations.
    pub follow_up_status: Option<FollowUpReminderStatus>,
    pub reminder_date: Option<CalendarDate>,
    /// Negative once the reminder date has passed.
    pub days_until_reminder: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_notice: Option<String>,
    pub todo_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub reference_date: CalendarDate,
    pub week_start: WeekStart,
    pub todo_filter: TodoFilterType,
    pub subjects: Vec<SubjectReport>,
    pub summary: FollowUpSummary,
}

/// Load the configured snapshot and build the report for `today`.
pub fn run(config: &FollowUpConfig, today: CalendarDate) -> Result<Report, SnapshotError> {
    let snapshot = load_snapshot(&config.snapshot_path)?;
    Ok(build_report(&snapshot, config, today))
}

pub fn build_report(snapshot: &Snapshot, config: &FollowUpConfig, today: CalendarDate) -> Report {
    let counter = TodoCounter::new(today, config.week_start, config.current_user);
    let filter = ListFilter {
        follow_up: config.follow_up_filter,
        todo: config.todo_filter,
        ..ListFilter::default()
    };

    let selecting = !filter.is_inactive();

    let mut subjects = Vec::new();
    for subject in &snapshot.subjects {
        let follow_up = evaluate_follow_up(subject, today);

        if selecting {
            let row = ListRow {
                subject_id: subject.id,
                status: subject.status,
                relationship_owner_id: subject.relationship_owner_id,
                tag_ids: subject.tag_ids.clone(),
                follow_up_status: follow_up.status,
                todos: subject.todos.clone(),
            };
            if !filter.passes(&row, &counter) {
                continue;
            }
        }

        subjects.push(SubjectReport {
            id: subject.id,
            name: subject.name.clone(),
            subject_type: subject.subject_type,
            follow_up_status: follow_up.status,
            reminder_date: follow_up.reminder_date,
            days_until_reminder: follow_up.days_until_reminder,
            reminder_notice: follow_up.notice,
            todo_count: counter.count(&subject.todos, config.todo_filter),
        });
    }

    let summary = summarize(subjects.iter().filter_map(|s| s.follow_up_status));

    tracing::info!(
        reference_date = %today,
        reported = subjects.len(),
        action_required = summary.action_required,
        "Follow-up report built",
    );

    Report {
        reference_date: today,
        week_start: config.week_start,
        todo_filter: config.todo_filter,
        subjects,
        summary,
    }
}

#[derive(Debug, Default)]
struct FollowUpOutcome {
    status: Option<FollowUpReminderStatus>,
    reminder_date: Option<CalendarDate>,
    days_until_reminder: Option<i64>,
    notice: Option<String>,
}

fn evaluate_follow_up(subject: &Subject, today: CalendarDate) -> FollowUpOutcome {
    if subject.subject_type != SubjectType::Person {
        return FollowUpOutcome::default();
    }

    let log = match subject.activities.as_deref() {
        Ok(log) => log,
        Err(e) => {
            tracing::warn!(
                subject_id = %subject.id,
                error = %e,
                "Using fallback follow-up status",
            );
            return FollowUpOutcome {
                status: Some(status_or_fallback(subject.activities.as_deref(), today)),
                ..FollowUpOutcome::default()
            };
        }
    };

    let assessment = assess(log, today);
    let notice = assessment
        .anchor_id
        .and_then(|anchor| log.iter().find(|a| a.id == anchor))
        .and_then(|anchor| reminder_notice(anchor, today))
        .map(|notice| notice.message());

    FollowUpOutcome {
        status: Some(assessment.status),
        reminder_date: assessment.reminder_date,
        days_until_reminder: assessment.days_until_reminder,
        notice,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl Report {
    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Follow-up report for {} ({}, weeks start {})",
            self.reference_date,
            self.todo_filter.label(),
            self.week_start.as_str(),
        )?;
        writeln!(f)?;
        writeln!(f, "{:<36}  {:<28}  {:<18}  {:>5}", "ID", "NAME", "FOLLOW-UP", "TODOS")?;

        for subject in &self.subjects {
            let status = subject
                .follow_up_status
                .map(|s| s.short_label())
                .unwrap_or("-");
            writeln!(
                f,
                "{:<36}  {:<28}  {:<18}  {:>5}",
                subject.id, subject.name, status, subject.todo_count,
            )?;
            if let Some(notice) = &subject.reminder_notice {
                writeln!(f, "{:<36}  {notice}", "")?;
            }
        }

        writeln!(f)?;
        write!(
            f,
            "{} people: {} action required, {} awaiting response, {} no follow-up needed",
            self.summary.total,
            self.summary.action_required,
            self.summary.awaiting_response,
            self.summary.no_follow_up_needed,
        )
    }
}
