//! Rendering of change events for the terminal.

use chrono::{DateTime, Local};
use colored::Colorize;
use serde::Serialize;
use snapcdc_types::{ChangeEvent, ChangeKind};

use crate::cli::OutputFormat;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize)]
struct EventLine<'a> {
    timestamp: String,
    #[serde(flatten)]
    event: &'a ChangeEvent,
}

/// One plain-text line per event. Absent values render as empty.
pub fn text_line(event: &ChangeEvent, at: DateTime<Local>) -> String {
    format!(
        "[{}] key: {}, field: {}, change: {}, before: {}, after: {}",
        at.format(TIMESTAMP_FORMAT),
        event.entity_key(),
        event.field_name(),
        event.kind(),
        event.value_before().unwrap_or_default(),
        event.value_after().unwrap_or_default(),
    )
}

pub fn json_line(event: &ChangeEvent, at: DateTime<Local>) -> serde_json::Result<String> {
    serde_json::to_string(&EventLine {
        timestamp: at.to_rfc3339(),
        event,
    })
}

/// Print `event` to stdout in the chosen format.
pub fn print_event(event: &ChangeEvent, format: OutputFormat) {
    let now = Local::now();
    match format {
        OutputFormat::Text => {
            let line = text_line(event, now);
            let line = match event.kind() {
                ChangeKind::Create => line.green(),
                ChangeKind::Delete => line.red(),
                ChangeKind::Modify => line.yellow(),
            };
            println!("{line}");
        }
        OutputFormat::Json => match json_line(event, now) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::warn!(error = %err, "failed to encode event"),
        },
    }
}
