//! Follow-up reminder status engine.
//!
//! Classifies a person's activity log into one of three statuses. The
//! status is derived, never stored: callers recompute it from the current
//! log and a "today" captured once per evaluation pass.
//!
//! The rule, in short: find the most recent outbound action (the anchor).
//! If it carries a reminder date, check whether the person has genuinely
//! responded since. A response settles the follow-up; otherwise the reminder
//! is either still pending or due.

use serde::{Deserialize, Serialize};

use crate::activity::{sorted_most_recent_first, ActivityRecord};
use crate::calendar::days_between;
use crate::error::CoreError;
use crate::types::{CalendarDate, EntityId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATUS_ACTION_REQUIRED: &str = "action_required";
pub const STATUS_AWAITING_RESPONSE: &str = "awaiting_response";
pub const STATUS_NO_FOLLOW_UP_NEEDED: &str = "no_follow_up_needed";

/// All valid follow-up status strings.
pub const VALID_FOLLOW_UP_STATUSES: &[&str] = &[
    STATUS_ACTION_REQUIRED,
    STATUS_AWAITING_RESPONSE,
    STATUS_NO_FOLLOW_UP_NEEDED,
];

/// Status reported when a subject's activity log could not be produced.
pub const FALLBACK_STATUS: FollowUpReminderStatus = FollowUpReminderStatus::AwaitingResponse;

/// Display format for reminder dates, e.g. `Mar 14, 2026 (Saturday)`.
const REMINDER_DISPLAY_FORMAT: &str = "%b %-d, %Y (%A)";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpReminderStatus {
    /// A reminder is due (today or earlier) and the person has not responded.
    ActionRequired,
    /// A reminder is set for a future date and the person has not responded.
    AwaitingResponse,
    /// No reminder on the latest outbound action, or the person responded.
    NoFollowUpNeeded,
}

impl FollowUpReminderStatus {
    pub const ALL: [FollowUpReminderStatus; 3] = [
        Self::ActionRequired,
        Self::AwaitingResponse,
        Self::NoFollowUpNeeded,
    ];

    /// Convert from a stored or query-string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_ACTION_REQUIRED => Ok(Self::ActionRequired),
            STATUS_AWAITING_RESPONSE => Ok(Self::AwaitingResponse),
            STATUS_NO_FOLLOW_UP_NEEDED => Ok(Self::NoFollowUpNeeded),
            _ => Err(CoreError::Validation(format!(
                "Invalid follow-up status '{s}'. Must be one of: {}",
                VALID_FOLLOW_UP_STATUSES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionRequired => STATUS_ACTION_REQUIRED,
            Self::AwaitingResponse => STATUS_AWAITING_RESPONSE,
            Self::NoFollowUpNeeded => STATUS_NO_FOLLOW_UP_NEEDED,
        }
    }

    /// Banner heading.
    pub fn title(&self) -> &'static str {
        match self {
            Self::ActionRequired => "Action Required",
            Self::AwaitingResponse => "Awaiting Response",
            Self::NoFollowUpNeeded => "No Follow Up Needed",
        }
    }

    /// Banner sub-heading.
    pub fn subtitle(&self) -> &'static str {
        match self {
            Self::ActionRequired => "A follow-up reminder is due",
            Self::AwaitingResponse => "Waiting for response from this person",
            Self::NoFollowUpNeeded => "No follow-up reminder set on latest action",
        }
    }

    /// Compact label for list cells.
    pub fn short_label(&self) -> &'static str {
        match self {
            Self::ActionRequired => "Action Required",
            Self::AwaitingResponse => "Awaiting Response",
            Self::NoFollowUpNeeded => "No Follow-up",
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Everything the classifier looked at, for callers that render details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUpAssessment {
    pub status: FollowUpReminderStatus,
    /// The most recent outbound action, if any.
    pub anchor_id: Option<EntityId>,
    /// The anchor's reminder date, if set.
    pub reminder_date: Option<CalendarDate>,
    /// Whether a non-ignorable inbound action followed the anchor.
    pub has_response: bool,
    /// Days from `today` to the reminder date (negative when overdue).
    pub days_until_reminder: Option<i64>,
}

impl FollowUpAssessment {
    fn settled(anchor_id: Option<EntityId>) -> Self {
        Self {
            status: FollowUpReminderStatus::NoFollowUpNeeded,
            anchor_id,
            reminder_date: None,
            has_response: false,
            days_until_reminder: None,
        }
    }
}

/// Assess a subject's activity log against `today`.
///
/// Input order does not matter; records are ordered most recent first with
/// a deterministic tie-break before the anchor is chosen.
pub fn assess(activities: &[ActivityRecord], today: CalendarDate) -> FollowUpAssessment {
    let ordered = sorted_most_recent_first(activities);

    let Some(anchor_idx) = ordered.iter().position(|a| a.action_type.is_outbound()) else {
        return FollowUpAssessment::settled(None);
    };
    let anchor = ordered[anchor_idx];

    let Some(reminder_date) = anchor.follow_up_reminder_date else {
        return FollowUpAssessment::settled(Some(anchor.id));
    };

    let has_response = ordered[..anchor_idx]
        .iter()
        .filter(|a| a.action_type.is_inbound())
        .any(|a| !a.action_type.is_ignorable_response());

    let status = if has_response {
        FollowUpReminderStatus::NoFollowUpNeeded
    } else if reminder_date > today {
        FollowUpReminderStatus::AwaitingResponse
    } else {
        FollowUpReminderStatus::ActionRequired
    };

    FollowUpAssessment {
        status,
        anchor_id: Some(anchor.id),
        reminder_date: Some(reminder_date),
        has_response,
        days_until_reminder: Some(days_between(today, reminder_date)),
    }
}

/// Classify a subject's activity log against `today`.
pub fn classify(activities: &[ActivityRecord], today: CalendarDate) -> FollowUpReminderStatus {
    assess(activities, today).status
}

/// Classify a log that may have failed to load.
///
/// A load failure yields [`FALLBACK_STATUS`] rather than an error, so a
/// broken record never hides a subject from the follow-up views.
pub fn status_or_fallback<E>(
    activities: Result<&[ActivityRecord], E>,
    today: CalendarDate,
) -> FollowUpReminderStatus {
    match activities {
        Ok(log) => classify(log, today),
        Err(_) => FALLBACK_STATUS,
    }
}

// ---------------------------------------------------------------------------
// Per-activity reminder notice
// ---------------------------------------------------------------------------

/// The reminder line shown next to an outbound activity in its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReminderNotice {
    /// The reminder date has passed.
    Overdue { due: CalendarDate, days_overdue: i64 },
    /// The reminder is today or later.
    Scheduled { due: CalendarDate, days_remaining: i64 },
}

impl ReminderNotice {
    pub fn message(&self) -> String {
        match self {
            Self::Overdue { due, .. } => format!(
                "Follow-up reminder was due on {}",
                due.format(REMINDER_DISPLAY_FORMAT)
            ),
            Self::Scheduled { due, .. } => format!(
                "Follow-up reminder toggled on and should be completed on {}",
                due.format(REMINDER_DISPLAY_FORMAT)
            ),
        }
    }
}

/// Reminder notice for a single activity, if it has one.
pub fn reminder_notice(activity: &ActivityRecord, today: CalendarDate) -> Option<ReminderNotice> {
    if !activity.action_type.is_outbound() {
        return None;
    }
    let due = activity.follow_up_reminder_date?;
    let remaining = days_between(today, due);
    Some(if remaining < 0 {
        ReminderNotice::Overdue {
            due,
            days_overdue: -remaining,
        }
    } else {
        ReminderNotice::Scheduled {
            due,
            days_remaining: remaining,
        }
    })
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Count of subjects in each follow-up status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FollowUpSummary {
    pub total: usize,
    pub action_required: usize,
    pub awaiting_response: usize,
    pub no_follow_up_needed: usize,
}

pub fn summarize<I>(statuses: I) -> FollowUpSummary
where
    I: IntoIterator<Item = FollowUpReminderStatus>,
{
    statuses
        .into_iter()
        .fold(FollowUpSummary::default(), |mut acc, status| {
            acc.total += 1;
            match status {
                FollowUpReminderStatus::ActionRequired => acc.action_required += 1,
                FollowUpReminderStatus::AwaitingResponse => acc.awaiting_response += 1,
                FollowUpReminderStatus::NoFollowUpNeeded => acc.no_follow_up_needed += 1,
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActionType, ActivityDetails};
    use assert_matches::assert_matches;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use FollowUpReminderStatus::*;

    /// Day 0 of every scenario.
    fn day(n: i64) -> CalendarDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + Duration::days(n)
    }

    fn at(id: u128, action_type: ActionType, n: i64, hour: u32) -> ActivityRecord {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap();
        ActivityRecord {
            id: Uuid::from_u128(id),
            subject_id: Uuid::from_u128(999),
            action_type,
            occurred_at: base + Duration::days(n),
            follow_up_reminder_date: None,
            details: ActivityDetails::default(),
        }
    }

    fn act(id: u128, action_type: ActionType, n: i64) -> ActivityRecord {
        at(id, action_type, n, 12)
    }

    fn with_reminder(mut record: ActivityRecord, n: i64) -> ActivityRecord {
        record.follow_up_reminder_date = Some(day(n));
        record
    }

    fn scenario_a() -> Vec<ActivityRecord> {
        vec![with_reminder(act(1, ActionType::EmailSent, 0), 7)]
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn scenario_a_due_today_without_response() {
        assert_eq!(classify(&scenario_a(), day(7)), ActionRequired);
    }

    #[test]
    fn scenario_b_future_reminder_without_response() {
        assert_eq!(classify(&scenario_a(), day(5)), AwaitingResponse);
    }

    #[test]
    fn scenario_c_email_reply_settles_follow_up() {
        let mut log = scenario_a();
        log.push(act(2, ActionType::EmailReceived, 3));
        assert_eq!(classify(&log, day(7)), NoFollowUpNeeded);
    }

    #[test]
    fn scenario_d_connection_acceptance_is_not_a_response() {
        let log = vec![
            with_reminder(act(1, ActionType::LinkedinConnectionRequestSent, 0), 7),
            act(2, ActionType::LinkedinConnectionRequestAccepted, 2),
        ];
        assert_eq!(classify(&log, day(10)), ActionRequired);
    }

    // -----------------------------------------------------------------------
    // Edge cases
    // -----------------------------------------------------------------------

    #[test]
    fn empty_log_needs_no_follow_up() {
        assert_eq!(classify(&[], day(0)), NoFollowUpNeeded);
    }

    #[test]
    fn anchor_without_reminder_needs_no_follow_up() {
        let log = vec![
            with_reminder(act(1, ActionType::EmailSent, 0), 3),
            act(2, ActionType::LinkedinMessageSent, 1),
        ];
        let assessment = assess(&log, day(5));
        assert_eq!(assessment.status, NoFollowUpNeeded);
        assert_eq!(assessment.anchor_id, Some(Uuid::from_u128(2)));
        assert_eq!(assessment.reminder_date, None);
    }

    #[test]
    fn future_reminder_with_response_needs_no_follow_up() {
        let mut log = scenario_a();
        log.push(act(2, ActionType::LinkedinMessageReceived, 1));
        assert_eq!(classify(&log, day(2)), NoFollowUpNeeded);
    }

    #[test]
    fn responses_before_the_anchor_never_count() {
        let log = vec![
            act(1, ActionType::EmailReceived, 4),
            with_reminder(act(2, ActionType::EmailSent, 5), 6),
        ];
        assert_eq!(classify(&log, day(6)), ActionRequired);
    }

    #[test]
    fn unsorted_input_is_ordered_before_classifying() {
        let log = vec![
            act(3, ActionType::EmailReceived, 3),
            with_reminder(act(1, ActionType::EmailSent, 0), 7),
            act(2, ActionType::LinkedinConnectionRequestAccepted, 1),
        ];
        assert_eq!(classify(&log, day(7)), NoFollowUpNeeded);
    }

    #[test]
    fn late_evening_activity_and_same_day_reminder_are_same_day() {
        // Sent at 23:59 on day 7 with a reminder for day 7: due immediately.
        let log = vec![with_reminder(at(1, ActionType::EmailSent, 7, 23), 7)];
        assert_eq!(classify(&log, day(7)), ActionRequired);
    }

    #[test]
    fn reply_in_the_same_instant_still_counts_when_ordered_after() {
        // Equal timestamps: the higher id sorts as more recent.
        let log = vec![
            with_reminder(act(1, ActionType::EmailSent, 0), 7),
            act(2, ActionType::EmailReceived, 0),
        ];
        assert_eq!(classify(&log, day(7)), NoFollowUpNeeded);

        let log = vec![
            act(1, ActionType::EmailReceived, 0),
            with_reminder(act(2, ActionType::EmailSent, 0), 7),
        ];
        assert_eq!(classify(&log, day(7)), ActionRequired);
    }

    #[test]
    fn retraction_becomes_the_new_anchor() {
        let log = vec![
            with_reminder(act(1, ActionType::LinkedinConnectionRequestSent, 0), 7),
            act(2, ActionType::LinkedinConnectionRequestRetracted, 2),
        ];
        assert_eq!(classify(&log, day(10)), NoFollowUpNeeded);
    }

    #[test]
    fn assessment_reports_days_until_reminder() {
        let assessment = assess(&scenario_a(), day(5));
        assert_eq!(assessment.days_until_reminder, Some(2));
        assert_eq!(assessment.anchor_id, Some(Uuid::from_u128(1)));
        assert!(!assessment.has_response);

        let overdue = assess(&scenario_a(), day(9));
        assert_eq!(overdue.days_until_reminder, Some(-2));
    }

    // -----------------------------------------------------------------------
    // Fallback
    // -----------------------------------------------------------------------

    #[test]
    fn load_failure_falls_back_to_awaiting_response() {
        let failed: Result<&[ActivityRecord], &str> = Err("connection reset");
        assert_eq!(status_or_fallback(failed, day(7)), AwaitingResponse);
        assert_eq!(FALLBACK_STATUS, AwaitingResponse);
    }

    #[test]
    fn successful_load_is_classified_normally() {
        let log = scenario_a();
        let loaded: Result<&[ActivityRecord], &str> = Ok(&log);
        assert_eq!(status_or_fallback(loaded, day(7)), ActionRequired);
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    /// Every two-record log built from the action catalogue, at several
    /// reminder offsets.
    fn small_logs() -> Vec<Vec<ActivityRecord>> {
        let mut logs = Vec::new();
        for first in ActionType::ALL {
            for second in ActionType::ALL {
                for reminder in [None, Some(-3), Some(0), Some(4)] {
                    let mut a = act(1, first, 0);
                    let mut b = act(2, second, 2);
                    if let Some(r) = reminder {
                        if first.is_outbound() {
                            a.follow_up_reminder_date = Some(day(r));
                        }
                        if second.is_outbound() {
                            b.follow_up_reminder_date = Some(day(r + 1));
                        }
                    }
                    logs.push(vec![a, b]);
                }
            }
        }
        logs
    }

    #[test]
    fn classification_is_total_and_order_independent() {
        for log in small_logs() {
            let reversed: Vec<_> = log.iter().rev().cloned().collect();
            for today in -5..10 {
                assert_eq!(classify(&log, day(today)), classify(&reversed, day(today)));
            }
        }
    }

    #[test]
    fn inbound_only_logs_never_need_follow_up() {
        let inbound: Vec<_> = ActionType::ALL
            .into_iter()
            .filter(|a| a.is_inbound())
            .collect();
        for (i, first) in inbound.iter().enumerate() {
            for second in &inbound[i..] {
                let log = vec![act(1, *first, 0), act(2, *second, 1)];
                for today in -3..5 {
                    assert_eq!(classify(&log, day(today)), NoFollowUpNeeded);
                }
            }
        }
    }

    #[test]
    fn older_outbound_actions_do_not_change_the_result() {
        for log in small_logs() {
            let mut prefixed = log.clone();
            prefixed.push(with_reminder(act(50, ActionType::EmailSent, -10), -8));
            for today in -5..10 {
                let expected = classify(&log, day(today));
                let anchored = log.iter().any(|a| a.action_type.is_outbound());
                if anchored {
                    assert_eq!(classify(&prefixed, day(today)), expected);
                }
            }
        }
    }

    #[test]
    fn reminder_due_exactly_today_is_due_not_future() {
        for offset in 0..30 {
            let log = vec![with_reminder(
                act(1, ActionType::LinkedinMessageSent, 0),
                offset,
            )];
            assert_eq!(classify(&log, day(offset)), ActionRequired);
            assert_eq!(classify(&log, day(offset - 1)), AwaitingResponse);
        }
    }

    #[test]
    fn connection_acceptance_alone_never_settles_follow_up() {
        for today in -2..12 {
            let base = classify(&scenario_a(), day(today));
            let mut log = scenario_a();
            log.push(act(2, ActionType::LinkedinConnectionRequestAccepted, 1));
            assert_eq!(classify(&log, day(today)), base);
            assert_ne!(base, NoFollowUpNeeded);
        }
    }

    // -----------------------------------------------------------------------
    // Reminder notice
    // -----------------------------------------------------------------------

    #[test]
    fn notice_is_scheduled_until_the_day_passes() {
        let record = scenario_a().remove(0);
        assert_matches!(
            reminder_notice(&record, day(7)),
            Some(ReminderNotice::Scheduled { days_remaining: 0, .. })
        );
        assert_matches!(
            reminder_notice(&record, day(8)),
            Some(ReminderNotice::Overdue { days_overdue: 1, .. })
        );
    }

    #[test]
    fn notice_absent_for_inbound_or_unset() {
        assert_eq!(reminder_notice(&act(1, ActionType::EmailSent, 0), day(0)), None);
        let mut inbound = act(2, ActionType::EmailReceived, 0);
        inbound.follow_up_reminder_date = Some(day(3));
        assert_eq!(reminder_notice(&inbound, day(0)), None);
    }

    #[test]
    fn notice_message_names_the_weekday() {
        // day(13) is 2026-03-14, a Saturday.
        let notice = ReminderNotice::Overdue {
            due: day(13),
            days_overdue: 2,
        };
        assert_eq!(
            notice.message(),
            "Follow-up reminder was due on Mar 14, 2026 (Saturday)"
        );
    }

    // -----------------------------------------------------------------------
    // Status values and summary
    // -----------------------------------------------------------------------

    #[test]
    fn status_strings_round_trip() {
        for status in FollowUpReminderStatus::ALL {
            assert_eq!(
                FollowUpReminderStatus::from_str_value(status.as_str()).unwrap(),
                status
            );
        }
        assert!(FollowUpReminderStatus::from_str_value("overdue").is_err());
    }

    #[test]
    fn status_serializes_as_wire_name() {
        let json = serde_json::to_string(&NoFollowUpNeeded).unwrap();
        assert_eq!(json, "\"no_follow_up_needed\"");
    }

    #[test]
    fn summary_counts_each_status() {
        let summary = summarize([
            ActionRequired,
            NoFollowUpNeeded,
            ActionRequired,
            AwaitingResponse,
        ]);
        assert_eq!(
            summary,
            FollowUpSummary {
                total: 4,
                action_required: 2,
                awaiting_response: 1,
                no_follow_up_needed: 1,
            }
        );
    }

    #[test]
    fn empty_summary_is_zero() {
        assert_eq!(summarize(Vec::new()), FollowUpSummary::default());
    }
}
