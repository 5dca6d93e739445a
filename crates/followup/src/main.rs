//! `crm-followup` -- follow-up reminder and todo report.
//!
//! Loads a JSON snapshot of people and organizations, derives each
//! person's follow-up reminder status, counts todos for the selected
//! filter and prints the result to stdout. Logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable           | Required | Default  | Description                                  |
//! |--------------------|----------|----------|----------------------------------------------|
//! | `SNAPSHOT_PATH`    | yes*     | --       | Snapshot file (*or first positional argument) |
//! | `WEEK_START`       | no       | `sunday` | `sunday` or `monday`                         |
//! | `CURRENT_USER_ID`  | no       | --       | Viewer for the `*_for_me` todo filters       |
//! | `TODO_FILTER`      | no       | `all`    | Todo filter mode                             |
//! | `FOLLOW_UP_FILTER` | no       | --       | Only report people in this status            |
//! | `REFERENCE_DATE`   | no       | today    | `YYYY-MM-DD` override of today (UTC)         |
//! | `OUTPUT`           | no       | `text`   | `text` or `json` (`--json` also works)       |

use chrono::Utc;
use crm_core::calendar::utc_date;
use crm_followup::config::{FollowUpConfig, OutputFormat};
use crm_followup::report;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crm_followup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = FollowUpConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(2);
    });

    // Read the clock once; every subject is evaluated against this date.
    let today = config.reference_date.unwrap_or_else(|| utc_date(Utc::now()));

    tracing::info!(
        snapshot = %config.snapshot_path.display(),
        reference_date = %today,
        week_start = config.week_start.as_str(),
        todo_filter = config.todo_filter.as_str(),
        "Starting crm-followup",
    );

    let report = report::run(&config, today).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build report");
        std::process::exit(1);
    });

    match config.output {
        OutputFormat::Text => println!("{report}"),
        OutputFormat::Json => match report.render_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize report");
                std::process::exit(1);
            }
        },
    }
}
