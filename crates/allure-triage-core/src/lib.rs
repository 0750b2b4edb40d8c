//! allure-triage-core: Tree traversal, failure resolution, and report
//! categorization for Allure failed-test triage.
//!
//! The Allure categories tree is treated as an opaque `serde_json::Value`;
//! this crate locates failed-test nodes in it, resolves their failure
//! reasons, renders/parses the flat text report format, and aggregates
//! failures into a categorized summary with recommendations.

pub mod category;
pub mod config;
pub mod report;
pub mod resolve;
pub mod summary;
pub mod walker;

pub use category::{FEATURE_KEYWORDS, FailureCategory, attribute_feature, categorize};
pub use config::{Config, ConfigError};
pub use report::{ParsedRecord, ReportedTest, parse_report_text, render_record, render_report};
pub use resolve::{FailedTest, Resolution, UnresolvedPolicy, resolve_failed_tests};
pub use summary::{AggregateReport, analyze_records, analyze_report_text, render_summary};
pub use walker::{find_failed_nodes, find_node_by_uid};
