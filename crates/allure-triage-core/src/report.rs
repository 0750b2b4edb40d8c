//! The flat text report format: rendering and replay parsing.
//!
//! The format is fixed byte-for-byte — the aggregator can re-parse any
//! previously written report file, so rendering and parsing must stay in
//! lockstep (see the round-trip tests at the bottom).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resolve::FailedTest;

/// First line of every report file.
pub const REPORT_HEADER: &str = "Failed Tests and Reasons:";

/// Record delimiter; also the segment boundary during replay parsing.
pub const RECORD_DELIMITER: &str = "---";

/// Placeholder written when the per-test detail fetch failed.
pub const FETCH_FAILED_PLACEHOLDER: &str = "Failed to fetch test case data.";

/// A resolved failed test together with its fetched setup steps.
/// `steps: None` means the detail fetch failed (distinct from an empty list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportedTest {
    pub test: FailedTest,
    pub steps: Option<Vec<String>>,
}

/// One failed-test segment recovered from a report file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub name: String,
    pub failure_reason: String,
    pub steps: Vec<String>,
}

/// Render the full report body: header plus every record in order.
#[must_use]
pub fn render_report(records: &[ReportedTest]) -> String {
    let mut out = String::new();
    out.push_str(REPORT_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&render_record(record));
    }
    out
}

/// Render a single record, trailing delimiter included.
#[must_use]
pub fn render_record(record: &ReportedTest) -> String {
    let mut out = String::new();
    out.push_str(&format!("Failed Test: {}\n", record.test.name));
    out.push_str(&format!("Test UID: {}\n", record.test.uid));
    out.push_str(&format!("Parent UID: {}\n", record.test.parent_uid));
    out.push_str(&format!("Failure Reason: {}\n", record.test.failure_reason));

    match &record.steps {
        Some(steps) => {
            out.push_str("Steps from beforeStages:\n");
            for (i, step) in steps.iter().enumerate() {
                out.push_str(&format!("{}. {step}\n", i + 1));
            }
        }
        None => {
            out.push_str(FETCH_FAILED_PLACEHOLDER);
            out.push('\n');
        }
    }

    out.push_str(RECORD_DELIMITER);
    out.push('\n');
    out
}

/// Parse a report file back into records.
///
/// Segments are delimited by `---`; a segment only counts when it carries
/// the `Failed Test:` marker, and is silently skipped when the name or
/// reason line is missing. The appended analysis block carries no marker
/// and therefore never parses as a record.
#[must_use]
pub fn parse_report_text(text: &str) -> Vec<ParsedRecord> {
    text.split(RECORD_DELIMITER)
        .filter_map(parse_segment)
        .collect()
}

fn parse_segment(segment: &str) -> Option<ParsedRecord> {
    if !segment.contains("Failed Test:") {
        return None;
    }

    let name = line_value(segment, "Failed Test: ")?;
    let failure_reason = line_value(segment, "Failure Reason: ")?;
    let steps = segment.lines().filter_map(numbered_step).collect();

    Some(ParsedRecord {
        name,
        failure_reason,
        steps,
    })
}

/// First line starting with `prefix`, with the prefix stripped.
fn line_value(segment: &str, prefix: &str) -> Option<String> {
    segment
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .map(str::to_string)
}

/// Match a leading `N. ` numbering pattern and return the step text.
fn numbered_step(line: &str) -> Option<String> {
    let (num, rest) = line.split_once(". ")?;
    if !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()) {
        Some(rest.to_string())
    } else {
        None
    }
}
