//! Aggregate failure analysis: category/feature/setup-step tallies, the
//! rendered summary text, and the fixed-rule recommendation list.
//!
//! Two entry points share the tally code so they always agree:
//! [`analyze_records`] works on in-memory records (the primary path) and
//! [`analyze_report_text`] replays a previously written report file.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::category::{FEATURE_KEYWORDS, FailureCategory, attribute_feature, categorize};
use crate::report::{ReportedTest, parse_report_text};

/// Maximum reason length shown in the summary before truncation.
const REASON_PREVIEW_CHARS: usize = 100;

/// How many example tests are listed per category.
const TESTS_PER_CATEGORY: usize = 3;

/// How many setup steps are listed in the summary.
const TOP_STEPS: usize = 5;

/// One failed test as it appears in a category bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TestFailure {
    pub name: String,
    pub reason: String,
}

/// All failures sharing one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryBucket {
    pub category: FailureCategory,
    pub tests: Vec<TestFailure>,
}

/// Failure count attributed to one feature keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureCount {
    pub feature: String,
    pub count: u64,
}

/// Occurrence count of one distinct setup-step text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StepCount {
    pub step: String,
    pub count: u64,
}

/// Derived, read-only summary of one run (or one replayed report file).
///
/// Buckets are ordered by the classification table, features by the keyword
/// list, and steps by count (descending, ties by text), so the same input
/// always yields the same report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateReport {
    /// Non-empty category buckets in table order
    pub categories: Vec<CategoryBucket>,
    /// Non-zero feature counts in keyword-list order
    pub features: Vec<FeatureCount>,
    /// Setup-step occurrence counts, most frequent first
    pub setup_steps: Vec<StepCount>,
    /// Number of failed-test records analyzed
    pub total_tests: u64,
}

impl AggregateReport {
    /// Whether any failure landed in the given category.
    #[must_use]
    pub fn has_category(&self, category: FailureCategory) -> bool {
        self.categories.iter().any(|b| b.category == category)
    }

    /// Setup steps appearing in more than half of all analyzed tests.
    #[must_use]
    pub fn common_setup_steps(&self) -> Vec<&StepCount> {
        self.setup_steps
            .iter()
            .filter(|s| s.count as f64 > self.total_tests as f64 / 2.0)
            .collect()
    }
}

/// Aggregate directly from in-memory records.
#[must_use]
pub fn analyze_records(records: &[ReportedTest]) -> AggregateReport {
    tally(records.iter().map(|r| {
        (
            r.test.name.as_str(),
            r.test.failure_reason.as_str(),
            r.steps.as_deref().unwrap_or(&[]),
        )
    }))
}

/// Aggregate by replaying a previously written report file.
#[must_use]
pub fn analyze_report_text(text: &str) -> AggregateReport {
    let parsed = parse_report_text(text);
    tally(
        parsed
            .iter()
            .map(|r| (r.name.as_str(), r.failure_reason.as_str(), &r.steps[..])),
    )
}

fn tally<'a>(entries: impl Iterator<Item = (&'a str, &'a str, &'a [String])>) -> AggregateReport {
    // FailureCategory's Ord follows the classification table, so the BTreeMap
    // iterates buckets in table order.
    let mut buckets: BTreeMap<FailureCategory, Vec<TestFailure>> = BTreeMap::new();
    let mut feature_counts = vec![0u64; FEATURE_KEYWORDS.len()];
    let mut step_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut total_tests: u64 = 0;

    for (name, reason, steps) in entries {
        total_tests += 1;

        buckets.entry(categorize(reason)).or_default().push(TestFailure {
            name: name.to_string(),
            reason: reason.to_string(),
        });

        if let Some(feature) = attribute_feature(name) {
            let idx = FEATURE_KEYWORDS.iter().position(|&k| k == feature);
            if let Some(idx) = idx {
                feature_counts[idx] += 1;
            }
        }

        for step in steps {
            *step_counts.entry(step.clone()).or_default() += 1;
        }
    }

    let categories = buckets
        .into_iter()
        .map(|(category, tests)| CategoryBucket { category, tests })
        .collect();

    let features = FEATURE_KEYWORDS
        .iter()
        .zip(feature_counts)
        .filter(|&(_, count)| count > 0)
        .map(|(&feature, count)| FeatureCount {
            feature: feature.to_string(),
            count,
        })
        .collect();

    let mut setup_steps: Vec<StepCount> = step_counts
        .into_iter()
        .map(|(step, count)| StepCount { step, count })
        .collect();
    setup_steps.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.step.cmp(&b.step)));

    AggregateReport {
        categories,
        features,
        setup_steps,
        total_tests,
    }
}

/// Render the human-readable summary appended to every report file.
#[must_use]
pub fn render_summary(report: &AggregateReport) -> String {
    let mut out = String::from("Test Failure Summary:\n\n");

    out.push_str("Failure Categories:\n");
    for bucket in &report.categories {
        out.push_str(&format!("{}: {} tests\n", bucket.category, bucket.tests.len()));
        for test in bucket.tests.iter().take(TESTS_PER_CATEGORY) {
            let preview: String = test.reason.chars().take(REASON_PREVIEW_CHARS).collect();
            out.push_str(&format!("  - {}\n    Reason: {preview}...\n", test.name));
        }
        if bucket.tests.len() > TESTS_PER_CATEGORY {
            out.push_str(&format!(
                "  ... and {} more\n",
                bucket.tests.len() - TESTS_PER_CATEGORY
            ));
        }
        out.push('\n');
    }

    out.push_str("Affected Features:\n");
    for feature in &report.features {
        out.push_str(&format!("{}: {} failures\n", feature.feature, feature.count));
    }
    out.push('\n');

    out.push_str("Common Setup Steps in Failed Tests:\n");
    for step in report.setup_steps.iter().take(TOP_STEPS) {
        out.push_str(&format!(
            "{}: appeared in {} failed tests\n",
            step.step, step.count
        ));
    }
    out.push('\n');

    out.push_str("Recommendations:\n");
    out.push_str(&render_recommendations(report));

    out
}

/// Fixed advisory rules, in a fixed order.
fn render_recommendations(report: &AggregateReport) -> String {
    let mut out = String::new();

    if report.has_category(FailureCategory::ElementNotFound) {
        out.push_str(
            "- Review page layouts and element identifiers, especially on frequently accessed pages.\n",
        );
    }

    for step in report.common_setup_steps() {
        out.push_str(&format!(
            "- Investigate the '{}' step as it's involved in many test failures.\n",
            step.step
        ));
    }

    if report.has_category(FailureCategory::Timeout) {
        out.push_str("- Review and potentially increase timeout settings for slow operations.\n");
    }
    if report.has_category(FailureCategory::AssertionError) {
        out.push_str("- Review test assertions and expected outcomes for accuracy.\n");
    }

    out
}

/// The banner block appended after all records in the report file.
#[must_use]
pub fn render_analysis_block(summary: &str) -> String {
    let banner = "=".repeat(50);
    format!("\n\n{banner}\nANALYSIS SUMMARY\n{banner}\n\n{summary}")
}

/// Generate JSON Schema for the aggregate report format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(AggregateReport);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::render_report;
    use crate::resolve::FailedTest;

    fn record(name: &str, reason: &str, steps: &[&str]) -> ReportedTest {
        ReportedTest {
            test: FailedTest {
                name: name.into(),
                uid: "u".into(),
                parent_uid: "p".into(),
                failure_reason: reason.into(),
            },
            steps: Some(steps.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn categorizes_and_attributes_scenario_from_tree() {
        let records = vec![record(
            "Admin Login Test",
            "Element not found: #submit",
            &[],
        )];
        let report = analyze_records(&records);
        assert_eq!(report.total_tests, 1);
        assert_eq!(report.categories.len(), 1);
        assert_eq!(
            report.categories[0].category,
            FailureCategory::ElementNotFound
        );
        assert_eq!(report.features, vec![FeatureCount {
            feature: "Admin".into(),
            count: 1
        }]);
    }

    #[test]
    fn buckets_follow_table_order_regardless_of_input_order() {
        let records = vec![
            record("a", "something else", &[]),
            record("b", "AssertionError: nope", &[]),
            record("c", "Timeout on load", &[]),
            record("d", "Element not found: #x", &[]),
        ];
        let report = analyze_records(&records);
        let order: Vec<_> = report.categories.iter().map(|b| b.category).collect();
        assert_eq!(
            order,
            vec![
                FailureCategory::ElementNotFound,
                FailureCategory::Timeout,
                FailureCategory::AssertionError,
                FailureCategory::Other,
            ]
        );
    }

    #[test]
    fn setup_steps_counted_across_all_records() {
        let records = vec![
            record("a", "Timeout", &["Navigate to dashboard", "Log in"]),
            record("b", "Timeout", &["Navigate to dashboard"]),
        ];
        let report = analyze_records(&records);
        assert_eq!(report.setup_steps[0], StepCount {
            step: "Navigate to dashboard".into(),
            count: 2
        });
        assert_eq!(report.setup_steps[1].count, 1);
    }

    #[test]
    fn failed_detail_fetch_contributes_no_steps() {
        let mut r = record("a", "Timeout", &[]);
        r.steps = None;
        let report = analyze_records(&[r]);
        assert!(report.setup_steps.is_empty());
        assert_eq!(report.total_tests, 1);
    }

    #[test]
    fn common_step_threshold_is_strictly_more_than_half() {
        // 6 of 10 → recommended; 5 of 10 → not.
        let mut records: Vec<ReportedTest> = (0..6)
            .map(|i| record(&format!("t{i}"), "Timeout", &["Navigate to dashboard"]))
            .collect();
        records.extend((6..10).map(|i| record(&format!("t{i}"), "Timeout", &["Other step"])));
        let report = analyze_records(&records);
        let common: Vec<_> = report
            .common_setup_steps()
            .iter()
            .map(|s| s.step.as_str())
            .collect();
        assert_eq!(common, vec!["Navigate to dashboard"]);

        // Exactly half does not qualify.
        let half: Vec<ReportedTest> = (0..10)
            .map(|i| {
                let step = if i < 5 { "A" } else { "B" };
                record(&format!("t{i}"), "Timeout", &[step])
            })
            .collect();
        assert!(analyze_records(&half).common_setup_steps().is_empty());
    }

    #[test]
    fn analyze_is_idempotent_over_report_text() {
        let records = vec![
            record("Admin Login", "Element not found: #x", &["Step one"]),
            record("User Export", "Timeout on export", &["Step one", "Step two"]),
        ];
        let text = render_report(&records);
        let first = analyze_report_text(&text);
        let second = analyze_report_text(&text);
        assert_eq!(first, second);
    }

    #[test]
    fn direct_and_replay_aggregation_agree() {
        let records = vec![
            record("Admin Login", "Element not found: #x", &["Step one"]),
            record("Dashboard Load", "Timeout on load", &["Step one"]),
            record("Misc", "weird failure", &[]),
        ];
        let direct = analyze_records(&records);
        let replayed = analyze_report_text(&render_report(&records));
        assert_eq!(direct, replayed);
    }

    #[test]
    fn summary_lists_at_most_three_tests_per_category() {
        let records: Vec<ReportedTest> = (0..5)
            .map(|i| record(&format!("test {i}"), "Timeout", &[]))
            .collect();
        let summary = render_summary(&analyze_records(&records));
        assert!(summary.contains("Timeout: 5 tests\n"));
        assert!(summary.contains("  ... and 2 more\n"));
        assert!(summary.contains("  - test 2\n"));
        assert!(!summary.contains("  - test 3\n"));
    }

    #[test]
    fn summary_truncates_reason_preview_to_100_chars() {
        let long_reason = format!("Timeout {}", "x".repeat(200));
        let records = vec![record("t", &long_reason, &[])];
        let summary = render_summary(&analyze_records(&records));
        let preview: String = long_reason.chars().take(100).collect();
        assert!(summary.contains(&format!("    Reason: {preview}...\n")));
        assert!(!summary.contains(&long_reason));
    }

    #[test]
    fn summary_lists_top_five_steps_only() {
        let steps: Vec<String> = (0..8).map(|i| format!("step {i}")).collect();
        let step_refs: Vec<&str> = steps.iter().map(String::as_str).collect();
        let records = vec![record("t", "Timeout", &step_refs)];
        let summary = render_summary(&analyze_records(&records));
        let listed = summary
            .lines()
            .filter(|l| l.contains(": appeared in "))
            .count();
        assert_eq!(listed, 5);
    }

    #[test]
    fn recommendations_cover_present_categories_and_common_steps() {
        let records = vec![
            record("a", "Element not found: #x", &["Navigate to dashboard"]),
            record("b", "Timeout on load", &["Navigate to dashboard"]),
            record("c", "AssertionError: boom", &["Navigate to dashboard"]),
        ];
        let summary = render_summary(&analyze_records(&records));
        assert!(summary.contains("- Review page layouts and element identifiers"));
        assert!(summary.contains(
            "- Investigate the 'Navigate to dashboard' step as it's involved in many test failures."
        ));
        assert!(summary.contains("- Review and potentially increase timeout settings"));
        assert!(summary.contains("- Review test assertions and expected outcomes"));
    }

    #[test]
    fn no_recommendations_for_absent_categories() {
        let records = vec![record("t", "connection reset", &[])];
        let summary = render_summary(&analyze_records(&records));
        assert!(summary.contains("Recommendations:\n"));
        assert!(!summary.contains("- Review page layouts"));
        assert!(!summary.contains("- Review and potentially increase timeout"));
    }

    #[test]
    fn analysis_block_has_banner_and_summary() {
        let block = render_analysis_block("Test Failure Summary:\n");
        assert!(block.starts_with("\n\n=================================================="));
        assert!(block.contains("\nANALYSIS SUMMARY\n"));
        assert!(block.ends_with("Test Failure Summary:\n"));
    }

    #[test]
    fn schema_generation_produces_valid_json() {
        let schema = generate_schema();
        let parsed: serde_json::Value = serde_json::from_str(&schema).unwrap();
        assert!(parsed.get("$schema").is_some() || parsed.get("type").is_some());
        assert_eq!(
            parsed.get("title").and_then(|v| v.as_str()),
            Some("AggregateReport")
        );
    }
}
