//! Failure categorization and feature attribution.
//!
//! Both use first-match over a fixed ordered table; table order is the
//! tie-break when a string matches several entries.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed set of failure categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Reason mentions a missing page element
    ElementNotFound,
    /// Reason mentions a timeout
    Timeout,
    /// Reason mentions a failed assertion
    AssertionError,
    /// Anything else
    Other,
}

impl FailureCategory {
    /// All categories in classification order.
    pub const ALL: [Self; 4] = [
        Self::ElementNotFound,
        Self::Timeout,
        Self::AssertionError,
        Self::Other,
    ];

    /// Display label used in summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ElementNotFound => "Element Not Found",
            Self::Timeout => "Timeout",
            Self::AssertionError => "Assertion Error",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered keyword table; earlier entries win ties.
const CATEGORY_KEYWORDS: &[(&str, FailureCategory)] = &[
    ("Element not found", FailureCategory::ElementNotFound),
    ("Timeout", FailureCategory::Timeout),
    ("AssertionError", FailureCategory::AssertionError),
];

/// Ordered feature keyword list; a test name credits only the first match.
pub const FEATURE_KEYWORDS: &[&str] = &["Admin", "Emissions", "User", "Report", "Dashboard"];

/// Classify a failure reason by first-match substring search.
#[must_use]
pub fn categorize(failure_reason: &str) -> FailureCategory {
    for (keyword, category) in CATEGORY_KEYWORDS {
        if failure_reason.contains(keyword) {
            return *category;
        }
    }
    FailureCategory::Other
}

/// Attribute a test name to the first matching feature keyword
/// (case-insensitive), if any.
#[must_use]
pub fn attribute_feature(test_name: &str) -> Option<&'static str> {
    let lowered = test_name.to_lowercase();
    FEATURE_KEYWORDS
        .iter()
        .find(|keyword| lowered.contains(&keyword.to_lowercase()))
        .copied()
}
