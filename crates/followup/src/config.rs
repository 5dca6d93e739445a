use std::path::PathBuf;

use chrono::NaiveDate;
use crm_core::calendar::{WeekStart, DATE_FORMAT};
use crm_core::follow_up::FollowUpReminderStatus;
use crm_core::todo::TodoFilterType;
use crm_core::types::{CalendarDate, UserId};

/// Command-line flag forcing JSON output.
pub const JSON_FLAG: &str = "--json";

/// How the report is written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required (set it in the environment or pass a snapshot path)")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown argument '{0}'")]
    UnknownArgument(String),
}

/// Evaluator configuration loaded from environment variables and arguments.
#[derive(Debug, Clone)]
pub struct FollowUpConfig {
    /// JSON snapshot of subjects to evaluate.
    pub snapshot_path: PathBuf,
    /// First day of the "due this week" window.
    pub week_start: WeekStart,
    /// Viewer for the `*_for_me` todo filters.
    pub current_user: Option<UserId>,
    /// Todo filter applied to counts and rows.
    pub todo_filter: TodoFilterType,
    /// Only report subjects in this follow-up status.
    pub follow_up_filter: Option<FollowUpReminderStatus>,
    /// Overrides "today"; otherwise the clock is read once at startup.
    pub reference_date: Option<CalendarDate>,
    pub output: OutputFormat,
}

impl FollowUpConfig {
    /// Load configuration from the process environment and arguments.
    ///
    /// | Env Var            | Default  |
    /// |--------------------|----------|
    /// | `SNAPSHOT_PATH`    | --       |
    /// | `WEEK_START`       | `sunday` |
    /// | `CURRENT_USER_ID`  | unset    |
    /// | `TODO_FILTER`      | `all`    |
    /// | `FOLLOW_UP_FILTER` | unset    |
    /// | `REFERENCE_DATE`   | today    |
    /// | `OUTPUT`           | `text`   |
    ///
    /// A positional argument overrides `SNAPSHOT_PATH`; `--json` overrides
    /// `OUTPUT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_sources(|key| std::env::var(key).ok(), std::env::args().skip(1))
    }

    /// Load configuration from an arbitrary variable lookup and argument list.
    pub fn from_sources<F, I>(lookup: F, args: I) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        I: IntoIterator<Item = String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut snapshot_path = var("SNAPSHOT_PATH").map(PathBuf::from);

        let week_start = match var("WEEK_START") {
            Some(raw) => WeekStart::from_str_value(&raw).map_err(|e| ConfigError::Invalid {
                var: "WEEK_START",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => WeekStart::default(),
        };

        let current_user = var("CURRENT_USER_ID")
            .map(|raw| {
                uuid::Uuid::parse_str(raw.trim()).map_err(|e| ConfigError::Invalid {
                    var: "CURRENT_USER_ID",
                    value: raw.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let todo_filter = match var("TODO_FILTER") {
            Some(raw) => {
                let parsed = TodoFilterType::parse_or_all(raw.trim());
                if parsed.as_str() != raw.trim() {
                    tracing::warn!(value = %raw, "Unknown TODO_FILTER, counting all todos");
                }
                parsed
            }
            None => TodoFilterType::All,
        };

        let follow_up_filter = var("FOLLOW_UP_FILTER")
            .map(|raw| {
                FollowUpReminderStatus::from_str_value(raw.trim()).map_err(|e| {
                    ConfigError::Invalid {
                        var: "FOLLOW_UP_FILTER",
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .transpose()?;

        let reference_date = var("REFERENCE_DATE")
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
                    ConfigError::Invalid {
                        var: "REFERENCE_DATE",
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .transpose()?;

        let mut output = match var("OUTPUT").as_deref().map(str::trim) {
            None | Some("text") => OutputFormat::Text,
            Some("json") => OutputFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "OUTPUT",
                    value: other.to_string(),
                    reason: "must be 'text' or 'json'".to_string(),
                })
            }
        };

        for arg in args {
            if arg == JSON_FLAG {
                output = OutputFormat::Json;
            } else if arg.starts_with("--") {
                return Err(ConfigError::UnknownArgument(arg));
            } else {
                snapshot_path = Some(PathBuf::from(arg));
            }
        }

        let snapshot_path = snapshot_path.ok_or(ConfigError::Missing("SNAPSHOT_PATH"))?;

        Ok(Self {
            snapshot_path,
            week_start,
            current_user,
            todo_filter,
            follow_up_filter,
            reference_date,
            output,
        })
    }
}
